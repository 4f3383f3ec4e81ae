//! Chat registry: the ordered log of uploaded recordings
//!
//! Ids come from an atomic counter, so concurrent uploads never observe the
//! same id and ids increase in reservation order. An entry only becomes
//! visible through [`ChatRegistry::commit`], which uploads call after the
//! recording is on disk.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use tokio::sync::RwLock;
use voiceboard_common::protocol::Message;

use crate::db::MessageDb;
use crate::storage::StoreError;

/// First id handed out by an empty registry
const FIRST_MESSAGE_ID: u64 = 1;

/// Shared, cloneable handle to the message log
#[derive(Debug, Clone)]
pub struct ChatRegistry {
    messages: Arc<RwLock<Vec<Message>>>,
    next_id: Arc<AtomicU64>,
    db: Option<MessageDb>,
}

impl ChatRegistry {
    /// Create an empty in-memory registry
    pub fn new() -> Self {
        Self {
            messages: Arc::new(RwLock::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(FIRST_MESSAGE_ID)),
            db: None,
        }
    }

    /// Create a registry backed by the database, loading existing messages
    ///
    /// The id counter resumes after the highest stored id.
    pub async fn with_database(db: MessageDb) -> Result<Self, sqlx::Error> {
        let messages = db.get_all_messages().await?;
        let next_id = messages
            .last()
            .map_or(FIRST_MESSAGE_ID, |message| message.id + 1);

        Ok(Self {
            messages: Arc::new(RwLock::new(messages)),
            next_id: Arc::new(AtomicU64::new(next_id)),
            db: Some(db),
        })
    }

    /// Atomically take the next id
    ///
    /// A reserved id that is never committed leaves a gap and is never listed.
    pub fn reserve_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Make a reserved id visible as a message by `author`
    ///
    /// With a database configured the row is written first; if that fails
    /// nothing is appended.
    pub async fn commit(&self, id: u64, author: &str) -> Result<Message, StoreError> {
        let message = Message {
            id,
            author: author.to_string(),
            created_at: Utc::now().to_rfc3339(),
        };

        if let Some(db) = &self.db {
            db.insert_message(&message).await?;
        }

        let mut messages = self.messages.write().await;
        // Commits can finish out of reservation order; keep the log sorted
        let position = messages.partition_point(|existing| existing.id < id);
        messages.insert(position, message.clone());

        Ok(message)
    }

    /// Reserve an id and commit it in one step
    pub async fn append(&self, author: &str) -> Result<Message, StoreError> {
        let id = self.reserve_id();
        self.commit(id, author).await
    }

    /// Snapshot of every message, oldest first
    pub async fn list_all(&self) -> Vec<Message> {
        self.messages.read().await.clone()
    }

    /// Look up a single message
    pub async fn get(&self, id: u64) -> Option<Message> {
        let messages = self.messages.read().await;
        messages
            .binary_search_by_key(&id, |message| message.id)
            .ok()
            .map(|index| messages[index].clone())
    }

    /// Number of committed messages
    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    /// Whether no message has been committed yet
    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }
}

impl Default for ChatRegistry {
    fn default() -> Self {
        Self::new()
    }
}
