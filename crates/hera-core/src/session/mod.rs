//! Per-session resumable state.
//!
//! `SessionState` is loaded at the start of every turn, mutated by the
//! pipeline stages, and persisted after execution. It persists as a flat
//! JSON field set keyed by session id.
//!
//! Rehydration uses merge semantics, not replace semantics: fields absent
//! from the persisted blob keep their current values instead of being reset
//! to type defaults.

mod sqlite;
mod store;

pub use sqlite::SqliteSessionStore;
pub use store::{MemorySessionStore, Sender, SessionStore, TranscriptMessage};

use crate::action::Action;
use crate::employee::Role;
use crate::error::{Error, Result};
use crate::intent::Intent;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Persistent state for one agent session.
///
/// Identity fields (`authenticated`, `employee_id`, `role`) are set only by
/// a successful login execution and are never touched by planning logic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// Session this state belongs to
    pub session_id: Option<String>,

    /// Raw input of the current turn
    pub user_input: Option<String>,

    /// Agent response of the current turn
    pub response: Option<String>,

    /// Whether the session is bound to an identity
    pub authenticated: bool,
    /// Bound employee id, once authenticated
    pub employee_id: Option<i64>,
    /// Bound role, once authenticated
    pub role: Option<Role>,

    /// Classified intent of the current turn
    pub intent: Option<Intent>,
    /// Planned action, carried across turns until replaced
    pub selected_action: Option<Action>,

    /// Whether the user explicitly confirmed the pending destructive action
    pub confirmed: bool,
    /// Whether the session is waiting on a confirmation reply
    pub awaiting_confirmation: bool,
    /// Name of the action the confirmation applies to
    pub pending_action: Option<String>,

    /// Workflow progression markers
    pub onboarding_complete: bool,
    /// Current workflow step, if any
    pub current_step: Option<String>,
}

impl SessionState {
    /// Fresh state for a new session: unauthenticated, no identity bound.
    #[must_use]
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: Some(session_id.into()),
            ..Self::default()
        }
    }

    /// Reset only plan-related fields.
    ///
    /// Identity and history are preserved; this is intentionally partial.
    pub fn reset_plan(&mut self) {
        self.intent = None;
        self.selected_action = None;
        self.awaiting_confirmation = false;
        self.pending_action = None;
    }

    /// Serialize for persistence.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Rehydrate from a persisted blob, starting from defaults.
    pub fn from_json(data: &str) -> Result<Self> {
        let value: Value =
            serde_json::from_str(data).map_err(|e| Error::Serialization(e.to_string()))?;
        let mut state = Self::default();
        state.merge_value(&value)?;
        Ok(state)
    }

    /// Overlay fields present in `value` onto this state.
    ///
    /// Fields absent from `value` are left untouched; this is what makes
    /// rehydration a merge rather than a replace.
    pub fn merge_value(&mut self, value: &Value) -> Result<()> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::Serialization("session state must be a JSON object".into()))?;

        fn take<T: serde::de::DeserializeOwned>(
            obj: &serde_json::Map<String, Value>,
            key: &str,
            slot: &mut T,
        ) -> Result<()> {
            if let Some(v) = obj.get(key) {
                *slot = serde_json::from_value(v.clone())
                    .map_err(|e| Error::Serialization(format!("field {key}: {e}")))?;
            }
            Ok(())
        }

        take(obj, "session_id", &mut self.session_id)?;
        take(obj, "user_input", &mut self.user_input)?;
        take(obj, "response", &mut self.response)?;
        take(obj, "authenticated", &mut self.authenticated)?;
        take(obj, "employee_id", &mut self.employee_id)?;
        take(obj, "role", &mut self.role)?;
        take(obj, "intent", &mut self.intent)?;
        take(obj, "selected_action", &mut self.selected_action)?;
        take(obj, "confirmed", &mut self.confirmed)?;
        take(obj, "awaiting_confirmation", &mut self.awaiting_confirmation)?;
        take(obj, "pending_action", &mut self.pending_action)?;
        take(obj, "onboarding_complete", &mut self.onboarding_complete)?;
        take(obj, "current_step", &mut self.current_step)?;

        Ok(())
    }
}
