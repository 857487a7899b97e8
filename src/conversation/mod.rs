//! Conversation types and state management

pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use store::{ConversationStore, FileStore, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One conversation: an append-only transcript plus the metadata fixed
/// at start time (attached file names, search-augmentation flag).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub messages: Vec<Message>,
    /// Names of the files attached on the first turn, in upload order.
    /// Used for placeholder substitution; immutable after start.
    #[serde(default)]
    pub file_names: Vec<String>,
    /// Whether generation calls for this conversation use search
    /// augmentation. Fixed at start.
    #[serde(default)]
    pub use_search: bool,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(file_names: Vec<String>, use_search: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            messages: Vec::new(),
            file_names,
            use_search,
            created_at: Utc::now(),
        }
    }

    pub fn with_system(mut self, prompt: &str) -> Self {
        self.messages.push(Message {
            role: Role::System,
            content: prompt.to_string(),
        });
        self
    }

    pub fn add_user(&mut self, content: &str) {
        self.messages.push(Message {
            role: Role::User,
            content: content.to_string(),
        });
    }

    pub fn add_assistant(&mut self, content: &str) {
        self.messages.push(Message {
            role: Role::Assistant,
            content: content.to_string(),
        });
    }
}
