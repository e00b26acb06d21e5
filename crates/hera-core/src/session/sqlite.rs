//! SQLite session store.
//!
//! Session state is persisted as a JSON blob keyed by session id; transcript
//! messages live in a separate append-only table.

use super::store::{Sender, SessionStore, TranscriptMessage};
use super::SessionState;
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// SQLite-backed session store.
pub struct SqliteSessionStore {
    pool: SqlitePool,
}

impl SqliteSessionStore {
    /// Open (or create) the store at the given path.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::Store(format!("failed to create database directory: {e}"))
            })?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
            .map_err(|e| Error::Store(format!("invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| Error::Store(format!("failed to connect to SQLite: {e}")))?;

        let store = Self { pool };
        store.init_schema().await?;

        info!(path = %path.display(), "SQLite session store initialized");
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                session_id TEXT PRIMARY KEY,
                state_json TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Store(format!("failed to create sessions table: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                session_id TEXT NOT NULL,
                sender TEXT NOT NULL,
                message TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Store(format!("failed to create messages table: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_messages_session ON messages(session_id)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Store(format!("failed to create messages index: {e}")))?;

        debug!("SQLite session schema initialized");
        Ok(())
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn save(&self, session_id: &str, state: &SessionState) -> Result<()> {
        let state_json = state.to_json()?;
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO sessions (session_id, state_json, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(session_id) DO UPDATE SET
                state_json = excluded.state_json,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(session_id)
        .bind(&state_json)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Store(format!("failed to save session: {e}")))?;

        debug!(session_id = %session_id, "session state saved");
        Ok(())
    }

    async fn get(&self, session_id: &str) -> Result<Option<SessionState>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT state_json FROM sessions WHERE session_id = ?")
                .bind(session_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| Error::Store(format!("failed to load session: {e}")))?;

        match row {
            Some((state_json,)) => Ok(Some(SessionState::from_json(&state_json)?)),
            None => Ok(None),
        }
    }

    async fn exists(&self, session_id: &str) -> Result<bool> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM sessions WHERE session_id = ?")
                .bind(session_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| Error::Store(format!("failed to check session: {e}")))?;

        Ok(row.is_some())
    }

    async fn append_message(&self, session_id: &str, sender: Sender, message: &str) -> Result<()> {
        if !self.exists(session_id).await? {
            return Err(Error::Store(format!("unknown session: {session_id}")));
        }

        sqlx::query(
            "INSERT INTO messages (session_id, sender, message, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(session_id)
        .bind(sender.as_str())
        .bind(message)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Store(format!("failed to append message: {e}")))?;

        Ok(())
    }

    async fn messages(&self, session_id: &str) -> Result<Vec<TranscriptMessage>> {
        let rows: Vec<(String, String, String)> = sqlx::query_as(
            "SELECT sender, message, created_at FROM messages WHERE session_id = ? ORDER BY id ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::Store(format!("failed to load messages: {e}")))?;

        rows.into_iter()
            .map(|(sender, message, created_at)| {
                let sender = match sender.as_str() {
                    "user" => Sender::User,
                    "agent" => Sender::Agent,
                    other => {
                        return Err(Error::Store(format!("invalid sender: {other}")));
                    }
                };
                let created_at = DateTime::parse_from_rfc3339(&created_at)
                    .map_err(|e| Error::Store(format!("invalid timestamp: {e}")))?
                    .with_timezone(&Utc);
                Ok(TranscriptMessage {
                    sender,
                    message,
                    created_at,
                })
            })
            .collect()
    }

    async fn count(&self) -> Result<usize> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sessions")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| Error::Store(format!("failed to count sessions: {e}")))?;

        Ok(row.0 as usize)
    }
}
