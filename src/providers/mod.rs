//! Hosted model integration

mod azure_openai;

use async_trait::async_trait;
use thiserror::Error;

use crate::conversation::Message;

pub use azure_openai::{AzureOpenAIConfig, AzureOpenAIProvider};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Azure AI Search augmentation parameters for a generation call.
#[derive(Debug, Clone)]
pub struct SearchAugmentation {
    pub endpoint: String,
    pub index_name: String,
}

/// Per-call generation configuration.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    pub temperature: f64,
    pub max_tokens: u32,
    pub top_p: f64,
    /// When set, the call is grounded against the named search index.
    pub search: Option<SearchAugmentation>,
}

impl GenerationOptions {
    /// Options for an ungrounded generation call.
    pub fn plain() -> Self {
        Self {
            temperature: 0.2,
            max_tokens: 3000,
            top_p: 1.0,
            search: None,
        }
    }

    /// Options for a search-augmented generation call.
    pub fn with_search(search: SearchAugmentation) -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 3000,
            top_p: 1.0,
            search: Some(search),
        }
    }
}

/// One generation call: ordered message list in, one assistant reply out.
///
/// The chat engine only depends on this trait, so tests can substitute a
/// scripted client and no network is needed.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<String, ProviderError>;
}
