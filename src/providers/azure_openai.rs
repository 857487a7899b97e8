//! Azure OpenAI chat-completions provider
//!
//! Calls a deployed model through the Azure OpenAI REST surface:
//!
//! ```text
//! POST {endpoint}/openai/deployments/{deployment}/chat/completions?api-version=...
//! ```
//!
//! With search augmentation, the request carries a `data_sources` entry
//! naming an Azure AI Search endpoint and index so the service grounds
//! the reply against indexed code samples.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::conversation::{Message, Role};

use super::{GenerationClient, GenerationOptions, ProviderError};

/// Azure OpenAI connection settings.
#[derive(Debug, Clone)]
pub struct AzureOpenAIConfig {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`.
    pub endpoint: String,
    /// API key for the resource.
    pub api_key: String,
    /// REST API version.
    pub api_version: String,
    /// Deployed model name.
    pub deployment: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for AzureOpenAIConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            api_version: "2024-08-01-preview".to_string(),
            deployment: "gpt-4".to_string(),
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

impl From<&Message> for ChatMessage {
    fn from(msg: &Message) -> Self {
        Self {
            role: match msg.role {
                Role::System => "system".to_string(),
                Role::User => "user".to_string(),
                Role::Assistant => "assistant".to_string(),
            },
            content: msg.content.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DataSourceParameters {
    endpoint: String,
    index_name: String,
}

#[derive(Debug, Serialize)]
struct DataSource {
    #[serde(rename = "type")]
    source_type: String,
    parameters: DataSourceParameters,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    messages: Vec<ChatMessage>,
    temperature: f64,
    max_tokens: u32,
    top_p: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    data_sources: Option<Vec<DataSource>>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Azure OpenAI API client.
pub struct AzureOpenAIProvider {
    config: AzureOpenAIConfig,
    client: Client,
}

impl AzureOpenAIProvider {
    pub fn new(config: AzureOpenAIConfig) -> Result<Self, ProviderError> {
        if config.endpoint.is_empty() {
            return Err(ProviderError::NotConfigured(
                "AZURE_OPENAI_ENDPOINT is not set".to_string(),
            ));
        }
        if config.api_key.is_empty() {
            return Err(ProviderError::NotConfigured(
                "AZURE_OPENAI_KEY is not set".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.deployment,
            self.config.api_version
        )
    }

    fn build_request(messages: &[Message], options: &GenerationOptions) -> ChatCompletionRequest {
        ChatCompletionRequest {
            messages: messages.iter().map(ChatMessage::from).collect(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            top_p: options.top_p,
            data_sources: options.search.as_ref().map(|search| {
                vec![DataSource {
                    source_type: "azure_search".to_string(),
                    parameters: DataSourceParameters {
                        endpoint: search.endpoint.clone(),
                        index_name: search.index_name.clone(),
                    },
                }]
            }),
        }
    }
}

#[async_trait]
impl GenerationClient for AzureOpenAIProvider {
    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<String, ProviderError> {
        let request = Self::build_request(messages, options);

        let response = self
            .client
            .post(self.completions_url())
            .header("api-key", &self.config.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            if let Ok(error_resp) = serde_json::from_str::<ErrorResponse>(&body) {
                return Err(ProviderError::InvalidResponse(format!(
                    "API error: {}",
                    error_resp.error.message
                )));
            }
            return Err(ProviderError::InvalidResponse(format!(
                "HTTP {status}: {body}"
            )));
        }

        let completion: ChatCompletionResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::InvalidResponse(format!("Failed to parse response: {e} - Body: {body}"))
        })?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("No choices in response".to_string()))?;

        Ok(choice.message.content.unwrap_or_default())
    }
}
