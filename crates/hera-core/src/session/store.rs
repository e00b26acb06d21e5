//! Session store trait and the in-memory backend.

use super::SessionState;
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Who authored a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The end user
    User,
    /// The agent
    Agent,
}

impl Sender {
    /// Stable wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Agent => "agent",
        }
    }
}

/// One entry in a session's conversation transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptMessage {
    /// Message author
    pub sender: Sender,
    /// Message text
    pub message: String,
    /// When the message was recorded
    pub created_at: DateTime<Utc>,
}

/// Abstract session persistence.
///
/// State is stored as the serialized field set; `get` rehydrates with merge
/// semantics so blobs written by older field sets still load.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist the state for a session, replacing any previous blob.
    async fn save(&self, session_id: &str, state: &SessionState) -> Result<()>;

    /// Load and rehydrate the state for a session, if it exists.
    async fn get(&self, session_id: &str) -> Result<Option<SessionState>>;

    /// Whether the session exists.
    async fn exists(&self, session_id: &str) -> Result<bool>;

    /// Append one message to the session transcript.
    async fn append_message(&self, session_id: &str, sender: Sender, message: &str) -> Result<()>;

    /// Full transcript in insertion order.
    async fn messages(&self, session_id: &str) -> Result<Vec<TranscriptMessage>>;

    /// Number of stored sessions.
    async fn count(&self) -> Result<usize>;
}

#[derive(Default)]
struct SessionRecord {
    state: Value,
    transcript: Vec<TranscriptMessage>,
}

/// In-memory session store for development and tests.
#[derive(Default)]
pub struct MemorySessionStore {
    inner: RwLock<HashMap<String, SessionRecord>>,
}

impl MemorySessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn save(&self, session_id: &str, state: &SessionState) -> Result<()> {
        let value =
            serde_json::to_value(state).map_err(|e| Error::Serialization(e.to_string()))?;
        let mut inner = self.inner.write().await;
        inner.entry(session_id.to_string()).or_default().state = value;
        Ok(())
    }

    async fn get(&self, session_id: &str) -> Result<Option<SessionState>> {
        let inner = self.inner.read().await;
        match inner.get(session_id) {
            Some(record) => {
                let mut state = SessionState::default();
                state.merge_value(&record.state)?;
                Ok(Some(state))
            }
            None => Ok(None),
        }
    }

    async fn exists(&self, session_id: &str) -> Result<bool> {
        let inner = self.inner.read().await;
        Ok(inner.contains_key(session_id))
    }

    async fn append_message(&self, session_id: &str, sender: Sender, message: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        let record = inner
            .get_mut(session_id)
            .ok_or_else(|| Error::Store(format!("unknown session: {session_id}")))?;
        record.transcript.push(TranscriptMessage {
            sender,
            message: message.to_string(),
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn messages(&self, session_id: &str) -> Result<Vec<TranscriptMessage>> {
        let inner = self.inner.read().await;
        Ok(inner
            .get(session_id)
            .map(|r| r.transcript.clone())
            .unwrap_or_default())
    }

    async fn count(&self) -> Result<usize> {
        let inner = self.inner.read().await;
        Ok(inner.len())
    }
}
