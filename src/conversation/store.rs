//! Conversation persistence
//!
//! Conversations live in a process-wide map and are snapshotted to disk
//! as one JSON file per conversation, overwritten after every successful
//! turn. Snapshots are for offline analysis; the map is the source of
//! truth while the process runs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Conversation, Message};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("conversation not found: {0}")]
    NotFound(Uuid),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Storage abstraction for conversations.
///
/// Injected into the chat engine so a different backing store can be
/// swapped in without touching extraction or turn logic.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Register a newly started conversation.
    async fn insert(&self, conversation: Conversation) -> Result<(), StoreError>;

    /// Fetch a full conversation by id.
    async fn get(&self, id: Uuid) -> Result<Conversation, StoreError>;

    /// Append exactly one message to an existing conversation.
    async fn append(&self, id: Uuid, message: Message) -> Result<(), StoreError>;

    /// Persist the conversation's current state to disk, replacing any
    /// previous snapshot.
    async fn snapshot(&self, id: Uuid) -> Result<(), StoreError>;
}

/// In-process map with JSON file snapshots.
pub struct FileStore {
    dir: PathBuf,
    conversations: RwLock<HashMap<Uuid, Conversation>>,
}

impl FileStore {
    /// Create a store snapshotting into `dir`, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            conversations: RwLock::new(HashMap::new()),
        })
    }

    fn snapshot_path(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("chat_{id}.json"))
    }

    /// Path of the snapshot file for a conversation, if one was written.
    pub fn snapshot_file(&self, id: Uuid) -> Option<PathBuf> {
        let path = self.snapshot_path(id);
        path.exists().then_some(path)
    }
}

#[async_trait]
impl ConversationStore for FileStore {
    async fn insert(&self, conversation: Conversation) -> Result<(), StoreError> {
        let mut map = self.conversations.write().await;
        map.insert(conversation.id, conversation);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Conversation, StoreError> {
        let map = self.conversations.read().await;
        map.get(&id).cloned().ok_or(StoreError::NotFound(id))
    }

    async fn append(&self, id: Uuid, message: Message) -> Result<(), StoreError> {
        let mut map = self.conversations.write().await;
        let conversation = map.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        conversation.messages.push(message);
        Ok(())
    }

    async fn snapshot(&self, id: Uuid) -> Result<(), StoreError> {
        let json = {
            let map = self.conversations.read().await;
            let conversation = map.get(&id).ok_or(StoreError::NotFound(id))?;
            serde_json::to_vec_pretty(conversation)?
        };
        tokio::fs::write(self.snapshot_path(id), json).await?;
        Ok(())
    }
}

/// Load a snapshot back from disk (used by analysis tooling and tests).
pub fn read_snapshot(path: &Path) -> Result<Conversation, StoreError> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Role;

    fn message(role: Role, content: &str) -> Message {
        Message {
            role,
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_get_append() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        let conversation = Conversation::new(vec![], false).with_system("sys");
        let id = conversation.id;
        store.insert(conversation).await.unwrap();

        store.append(id, message(Role::User, "hello")).await.unwrap();
        store
            .append(id, message(Role::Assistant, "hi there"))
            .await
            .unwrap();

        let loaded = store.get(id).await.unwrap();
        assert_eq!(loaded.messages.len(), 3);
        assert_eq!(loaded.messages[1].content, "hello");
        assert_eq!(loaded.messages[2].content, "hi there");
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        let id = Uuid::new_v4();
        assert!(matches!(store.get(id).await, Err(StoreError::NotFound(_))));
        assert!(matches!(
            store.append(id, message(Role::User, "hello")).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_snapshot_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        let conversation = Conversation::new(vec!["a.geojson".into()], true).with_system("sys");
        let id = conversation.id;
        store.insert(conversation).await.unwrap();

        store.append(id, message(Role::User, "first")).await.unwrap();
        store.snapshot(id).await.unwrap();

        store.append(id, message(Role::User, "second")).await.unwrap();
        store.snapshot(id).await.unwrap();

        let path = store.snapshot_file(id).unwrap();
        let loaded = read_snapshot(&path).unwrap();
        assert_eq!(loaded.messages.len(), 3);
        assert_eq!(loaded.file_names, vec!["a.geojson"]);
        assert!(loaded.use_search);
    }
}
