//! Chat engine
//!
//! The ChatEngine drives one turn of the assistant:
//! 1. Starts a conversation (system prompt + opening user message with
//!    sampled file content) or appends to an existing one
//! 2. Sends the full transcript to the generation client
//! 3. Extracts code blocks from the reply and assembles a document
//! 4. Substitutes placeholders and writes the document artifact
//! 5. Persists the transcript snapshot and returns the turn result
//!
//! A failed generation call leaves the already-appended user message in
//! the transcript but adds no assistant message, writes no snapshot and
//! no artifact.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{Config, TemplateSet};
use crate::conversation::{Conversation, ConversationStore, Message, Role, StoreError};
use crate::core::extract;
use crate::core::sample::sample_data;
use crate::providers::{
    GenerationClient, GenerationOptions, ProviderError, SearchAugmentation,
};

const MAP_GENERATED_TEXT: &str =
    "I've generated a map visualization. You can see it on the right panel.";
const NO_CODE_TEXT: &str = "No code returned";

/// One file attached on the first turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachedFile {
    pub name: String,
    pub content: String,
}

/// Request for one turn: a new conversation when `conversation_id` is
/// absent, a continuation otherwise.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub user_input: String,

    /// Attached data files; only meaningful on the first turn.
    #[serde(default)]
    pub files: Vec<AttachedFile>,

    /// Ground generation calls against the configured search index.
    /// Fixed for the conversation's lifetime.
    #[serde(default)]
    pub use_search: bool,

    #[serde(default)]
    pub conversation_id: Option<Uuid>,
}

/// Result of one turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnResult {
    /// Short status line for the chat panel.
    pub text: String,
    /// The reply's narrative explanation (everything outside the blocks).
    pub additional_text: String,
    /// Suggested follow-up, when the model produced one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub followup: Option<String>,
    /// Fully substituted map document, when the reply contained code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_html: Option<String>,
    pub conversation_id: Uuid,
}

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("conversation not found: {0}")]
    NotFound(Uuid),

    #[error("generation call failed: {0}")]
    Upstream(#[from] ProviderError),

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<StoreError> for ChatError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ChatError::NotFound(id),
            other => ChatError::Storage(other.to_string()),
        }
    }
}

/// The core chat engine.
pub struct ChatEngine {
    config: Config,
    templates: TemplateSet,
    store: Arc<dyn ConversationStore>,
    client: Arc<dyn GenerationClient>,
}

impl ChatEngine {
    pub fn new(
        config: Config,
        templates: TemplateSet,
        store: Arc<dyn ConversationStore>,
        client: Arc<dyn GenerationClient>,
    ) -> Self {
        Self {
            config,
            templates,
            store,
            client,
        }
    }

    /// Process one turn and return its result.
    pub async fn process(&self, request: ChatRequest) -> Result<TurnResult, ChatError> {
        let conversation_id = match request.conversation_id {
            Some(id) => {
                self.store
                    .append(
                        id,
                        Message {
                            role: Role::User,
                            content: request.user_input.clone(),
                        },
                    )
                    .await?;
                id
            }
            None => self.start_conversation(&request).await?,
        };

        let conversation = self.store.get(conversation_id).await?;
        let options = self.generation_options(conversation.use_search);
        let reply = self
            .client
            .complete(&conversation.messages, &options)
            .await?;

        self.store
            .append(
                conversation_id,
                Message {
                    role: Role::Assistant,
                    content: reply.clone(),
                },
            )
            .await?;
        self.store.snapshot(conversation_id).await?;

        let blocks = extract::extract_blocks(&reply, self.config.block_scheme);

        let document = extract::materialize_document(
            &blocks,
            self.config.block_scheme,
            &self.templates.html.content,
            &self.templates.css.content,
        )
        .map(|document| {
            extract::substitute_placeholders(
                &document,
                &self.config.maps_subscription_key,
                &self.config.file_base_url,
                &conversation.file_names,
            )
        });

        let map_html = match document {
            Some(document) => {
                let path = self.write_artifact(conversation_id, &document).await?;
                tracing::debug!(conversation_id = %conversation_id, path = %path.display(), "Wrote map document");
                Some(document)
            }
            None => None,
        };

        Ok(TurnResult {
            text: if map_html.is_some() {
                MAP_GENERATED_TEXT.to_string()
            } else {
                NO_CODE_TEXT.to_string()
            },
            additional_text: blocks.explanation,
            followup: blocks.followup,
            map_html,
            conversation_id,
        })
    }

    async fn start_conversation(&self, request: &ChatRequest) -> Result<Uuid, ChatError> {
        let file_names = request.files.iter().map(|f| f.name.clone()).collect();
        let mut conversation = Conversation::new(file_names, request.use_search)
            .with_system(self.templates.system_prompt_for(request.use_search));
        conversation.add_user(&opening_message(&request.user_input, &request.files));

        let id = conversation.id;
        tracing::info!(conversation_id = %id, use_search = request.use_search, "Starting new conversation");
        self.store.insert(conversation).await?;
        Ok(id)
    }

    fn generation_options(&self, use_search: bool) -> GenerationOptions {
        if use_search {
            if let (Some(endpoint), Some(index_name)) = (
                self.config.azure_search_endpoint.clone(),
                self.config.azure_search_index.clone(),
            ) {
                return GenerationOptions::with_search(SearchAugmentation {
                    endpoint,
                    index_name,
                });
            }
            tracing::warn!("Search augmentation requested but AZURE_AI_SEARCH_* is not configured");
        }
        GenerationOptions::plain()
    }

    async fn write_artifact(&self, id: Uuid, document: &str) -> Result<PathBuf, ChatError> {
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let path = self.config.output_dir.join(format!("map_{id}_{timestamp}.html"));

        tokio::fs::create_dir_all(&self.config.output_dir)
            .await
            .map_err(|e| ChatError::Storage(e.to_string()))?;
        tokio::fs::write(&path, document)
            .await
            .map_err(|e| ChatError::Storage(e.to_string()))?;
        Ok(path)
    }
}

/// Build the opening user message: each attached file's sampled content,
/// then the query.
fn opening_message(user_input: &str, files: &[AttachedFile]) -> String {
    if files.is_empty() {
        return user_input.to_string();
    }

    let mut message = String::new();
    for file in files {
        message.push_str(&format!(
            "File: {}\nContent:\n{}\n\n",
            file.name,
            sample_data(&file.content)
        ));
    }
    message.push_str(&format!("User query: {user_input}"));
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::FileStore;
    use crate::core::extract::BlockScheme;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::path::Path;
    use tokio::sync::Mutex;

    /// Replays a scripted list of replies and records each call; errors
    /// once the script runs out.
    struct ScriptedClient {
        replies: Mutex<VecDeque<String>>,
        calls: Mutex<Vec<(Vec<Message>, GenerationOptions)>>,
    }

    impl ScriptedClient {
        fn new(replies: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
                calls: Mutex::new(Vec::new()),
            })
        }

        async fn call(&self, index: usize) -> (Vec<Message>, GenerationOptions) {
            self.calls.lock().await[index].clone()
        }
    }

    #[async_trait]
    impl GenerationClient for ScriptedClient {
        async fn complete(
            &self,
            messages: &[Message],
            options: &GenerationOptions,
        ) -> Result<String, ProviderError> {
            self.calls
                .lock()
                .await
                .push((messages.to_vec(), options.clone()));
            self.replies
                .lock()
                .await
                .pop_front()
                .ok_or_else(|| ProviderError::InvalidResponse("script exhausted".to_string()))
        }
    }

    fn test_config(dir: &Path) -> Config {
        Config {
            host: "127.0.0.1".to_string(),
            port: 8000,
            azure_openai_endpoint: "https://example.openai.azure.com".to_string(),
            azure_openai_key: "unused".to_string(),
            azure_openai_version: "2024-08-01-preview".to_string(),
            azure_openai_deployment: "gpt-4".to_string(),
            azure_search_endpoint: Some("https://search.example.net".to_string()),
            azure_search_index: Some("azmaps-samples".to_string()),
            maps_subscription_key: "maps-key".to_string(),
            block_scheme: BlockScheme::TagDelimited,
            file_base_url: "http://127.0.0.1:8000/data/data_sample".to_string(),
            data_dir: dir.join("data"),
            static_dir: dir.join("static"),
            output_dir: dir.join("generated_maps"),
            history_dir: dir.join("chat_histories"),
            templates_path: None,
        }
    }

    fn engine_with(
        dir: &Path,
        client: Arc<ScriptedClient>,
    ) -> (ChatEngine, Arc<FileStore>) {
        let config = test_config(dir);
        let store = Arc::new(FileStore::new(config.history_dir.clone()).unwrap());
        let engine = ChatEngine::new(
            config,
            TemplateSet::default(),
            store.clone(),
            client,
        );
        (engine, store)
    }

    fn start_request(user_input: &str) -> ChatRequest {
        ChatRequest {
            user_input: user_input.to_string(),
            files: vec![AttachedFile {
                name: "a.geojson".to_string(),
                content: r#"{"type": "FeatureCollection", "features": []}"#.to_string(),
            }],
            use_search: false,
            conversation_id: None,
        }
    }

    const TAGGED_REPLY: &str = "<sample-title>Pins</sample-title>\n\
        <code-html><div id=\"myMap\"></div></code-html>\n\
        <code-js>atlas.load('USER_FILE_NAME', 'AZURE_MAPS_SUBSCRIPTION_KEY');</code-js>\n\
        <follow-up>Color them by value?</follow-up>\nDone.";

    #[tokio::test]
    async fn test_start_then_continue_transcript_shape() {
        let dir = tempfile::tempdir().unwrap();
        let client = ScriptedClient::new(&[TAGGED_REPLY, "Sure, making them red."]);
        let (engine, store) = engine_with(dir.path(), client.clone());

        let result = engine.process(start_request("show pins")).await.unwrap();
        let id = result.conversation_id;

        // The first generation call saw exactly system + user.
        let (first_prompt, _) = client.call(0).await;
        assert_eq!(first_prompt.len(), 2);
        assert_eq!(first_prompt[0].role, Role::System);
        assert_eq!(first_prompt[1].role, Role::User);
        assert!(first_prompt[1].content.contains("show pins"));
        assert!(first_prompt[1].content.contains("a.geojson"));

        engine
            .process(ChatRequest {
                user_input: "make them red".to_string(),
                files: vec![],
                use_search: false,
                conversation_id: Some(id),
            })
            .await
            .unwrap();

        let (second_prompt, _) = client.call(1).await;
        let roles: Vec<Role> = second_prompt.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant, Role::User]);

        let conversation = store.get(id).await.unwrap();
        assert_eq!(conversation.messages.len(), 5);
        assert_eq!(conversation.messages[4].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_code_reply_produces_substituted_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let client = ScriptedClient::new(&[TAGGED_REPLY]);
        let (engine, store) = engine_with(dir.path(), client);

        let result = engine.process(start_request("show pins")).await.unwrap();

        assert_eq!(result.text, MAP_GENERATED_TEXT);
        assert_eq!(result.followup.as_deref(), Some("Color them by value?"));
        assert_eq!(result.additional_text, "Done.");

        let document = result.map_html.unwrap();
        assert!(document.contains("http://127.0.0.1:8000/data/data_sample/a.geojson"));
        assert!(document.contains("maps-key"));
        assert!(!document.contains("USER_FILE_NAME"));
        assert!(!document.contains("AZURE_MAPS_SUBSCRIPTION_KEY"));
        assert!(document.contains("<title>Pins</title>"));

        let artifacts: Vec<_> = std::fs::read_dir(dir.path().join("generated_maps"))
            .unwrap()
            .collect();
        assert_eq!(artifacts.len(), 1);

        assert!(store.snapshot_file(result.conversation_id).is_some());
    }

    #[tokio::test]
    async fn test_plain_reply_produces_no_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let client = ScriptedClient::new(&["Could you describe the columns in your file?"]);
        let (engine, _) = engine_with(dir.path(), client);

        let result = engine.process(start_request("visualize this")).await.unwrap();

        assert_eq!(result.text, NO_CODE_TEXT);
        assert!(result.map_html.is_none());
        assert_eq!(
            result.additional_text,
            "Could you describe the columns in your file?"
        );
        assert!(!dir.path().join("generated_maps").exists());
    }

    #[tokio::test]
    async fn test_unknown_conversation_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let client = ScriptedClient::new(&[TAGGED_REPLY]);
        let (engine, _) = engine_with(dir.path(), client);

        let result = engine
            .process(ChatRequest {
                user_input: "make them red".to_string(),
                files: vec![],
                use_search: false,
                conversation_id: Some(Uuid::new_v4()),
            })
            .await;

        assert!(matches!(result, Err(ChatError::NotFound(_))));
        assert!(!dir.path().join("generated_maps").exists());
    }

    #[tokio::test]
    async fn test_failed_generation_leaves_user_message_only() {
        let dir = tempfile::tempdir().unwrap();
        // One scripted reply: the second turn's call fails.
        let client = ScriptedClient::new(&[TAGGED_REPLY]);
        let (engine, store) = engine_with(dir.path(), client);

        let result = engine.process(start_request("show pins")).await.unwrap();
        let id = result.conversation_id;

        let failed = engine
            .process(ChatRequest {
                user_input: "make them red".to_string(),
                files: vec![],
                use_search: false,
                conversation_id: Some(id),
            })
            .await;
        assert!(matches!(failed, Err(ChatError::Upstream(_))));

        // The user message stays; no assistant message was added.
        let conversation = store.get(id).await.unwrap();
        let roles: Vec<Role> = conversation.messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant, Role::User]);

        // The snapshot still reflects the last successful turn.
        let snapshot =
            crate::conversation::store::read_snapshot(&store.snapshot_file(id).unwrap()).unwrap();
        assert_eq!(snapshot.messages.len(), 3);
    }

    #[tokio::test]
    async fn test_search_flag_selects_augmented_options() {
        let dir = tempfile::tempdir().unwrap();
        let client = ScriptedClient::new(&["ok", "ok"]);
        let (engine, _) = engine_with(dir.path(), client.clone());

        let mut request = start_request("show pins");
        request.use_search = true;
        engine.process(request).await.unwrap();

        let (_, options) = client.call(0).await;
        assert!(options.search.is_some());
        assert_eq!(options.temperature, 0.3);

        engine.process(start_request("show pins")).await.unwrap();
        let (_, options) = client.call(1).await;
        assert!(options.search.is_none());
        assert_eq!(options.temperature, 0.2);
    }
}
