//! The agent pipeline.
//!
//! One turn runs a fixed stage sequence, single pass, no loops:
//!
//! ```text
//! classify -> plan -> authorize -> confirm -> execute
//! ```
//!
//! An authorization denial short-circuits the remaining stages; the denial
//! reason becomes the response. State is persisted after every turn, even a
//! failed one.

mod authorize;
mod confirm;
mod executor;
mod planner;

pub use authorize::{authorize, Decision};
pub use confirm::CONFIRM_PROMPT;
pub use planner::BLOCKED_RESPONSE;

use crate::audit::AuditSink;
use crate::employee::EmployeeStore;
use crate::error::Result;
use crate::intent::IntentClassifier;
use crate::session::{Sender, SessionState, SessionStore};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Response when a turn completes without any stage producing output.
const DONE_RESPONSE: &str = "Done.";
/// Response for an empty message.
const EMPTY_MESSAGE_RESPONSE: &str = "Please enter a message.";
/// Response for an unknown session id.
const INVALID_SESSION_RESPONSE: &str = "Invalid session.";
/// Response when a turn fails internally. Root causes go to the audit
/// stream, never to the user.
const INTERNAL_ERROR_RESPONSE: &str =
    "Sorry, something went wrong while processing your request.";

/// The reply produced by one turn.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TurnReply {
    /// Session the reply belongs to
    pub session_id: String,
    /// User-facing message
    pub message: String,
}

/// The agent pipeline with its collaborators.
pub struct Pipeline {
    classifier: Arc<dyn IntentClassifier>,
    employees: Arc<dyn EmployeeStore>,
    sessions: Arc<dyn SessionStore>,
    audit: Arc<dyn AuditSink>,
}

impl Pipeline {
    /// Wire up a pipeline.
    #[must_use]
    pub fn new(
        classifier: Arc<dyn IntentClassifier>,
        employees: Arc<dyn EmployeeStore>,
        sessions: Arc<dyn SessionStore>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            classifier,
            employees,
            sessions,
            audit,
        }
    }

    /// Create a fresh session and persist its initial state.
    pub async fn create_session(&self) -> Result<String> {
        let session_id = Uuid::new_v4().to_string();
        let state = SessionState::new(session_id.clone());
        self.sessions.save(&session_id, &state).await?;

        self.audit
            .log_event("session_created", Some(&session_id), json!({}));
        info!(session_id = %session_id, "agent session created");
        Ok(session_id)
    }

    /// Run one full turn for a session.
    ///
    /// Never returns `Err` for user-level failures; those become responses.
    /// `Err` here means the session store itself failed.
    #[instrument(skip(self, message), fields(session_id = %session_id))]
    pub async fn handle_turn(&self, session_id: &str, message: &str) -> Result<TurnReply> {
        let message = message.trim();
        if message.is_empty() {
            return Ok(TurnReply {
                session_id: session_id.to_string(),
                message: EMPTY_MESSAGE_RESPONSE.to_string(),
            });
        }

        let Some(mut state) = self.sessions.get(session_id).await? else {
            return Ok(TurnReply {
                session_id: session_id.to_string(),
                message: INVALID_SESSION_RESPONSE.to_string(),
            });
        };

        state.session_id = Some(session_id.to_string());
        state.user_input = Some(message.to_string());
        // Each turn starts with a clean response slot so a stale reply can
        // never leak into this turn
        state.response = None;

        self.sessions
            .append_message(session_id, Sender::User, message)
            .await?;

        match self.run_stages(&mut state).await {
            Ok(()) => {
                if state.response.is_none() {
                    state.response = Some(DONE_RESPONSE.to_string());
                }
            }
            Err(e) => {
                self.audit.log_error(Some(session_id), &e);
                state.response = Some(INTERNAL_ERROR_RESPONSE.to_string());
            }
        }

        // Persist no matter how the stages went
        self.sessions.save(session_id, &state).await?;

        let reply = state
            .response
            .clone()
            .unwrap_or_else(|| DONE_RESPONSE.to_string());
        self.sessions
            .append_message(session_id, Sender::Agent, &reply)
            .await?;

        Ok(TurnReply {
            session_id: session_id.to_string(),
            message: reply,
        })
    }

    async fn run_stages(&self, state: &mut SessionState) -> Result<()> {
        let session_id = state.session_id.clone();
        let input = state.user_input.clone().unwrap_or_default();

        let intent = self.classifier.classify(&input).await;
        state.intent = Some(intent);
        self.audit.log_event(
            &format!("intent_{}", intent.as_str()),
            session_id.as_deref(),
            json!({ "input": input }),
        );

        planner::plan(state, self.employees.as_ref(), self.audit.as_ref()).await?;

        let decision = authorize(state.role, state.authenticated, state.selected_action.as_ref());
        if let Some(action) = &state.selected_action {
            let event = if decision.is_allow() {
                "authorization_allow"
            } else {
                "authorization_deny"
            };
            let mut details = json!({
                "role": state.role.map(|r| r.as_str()),
                "action": action.name(),
            });
            if let Decision::Deny(reason) = &decision {
                details["reason"] = json!(reason);
            }
            self.audit.log_event(event, session_id.as_deref(), details);
        }
        if let Decision::Deny(reason) = decision {
            // Denial is a user-facing outcome, not an error
            state.response = Some(reason);
            return Ok(());
        }

        confirm::apply(state, self.audit.as_ref());

        executor::execute(state, self.employees.as_ref(), self.audit.as_ref()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::RecordingAuditSink;
    use crate::employee::MemoryEmployeeStore;
    use crate::intent::KeywordClassifier;
    use crate::seed::seed_employees;
    use crate::session::MemorySessionStore;

    async fn test_pipeline() -> (Pipeline, Arc<RecordingAuditSink>) {
        let employees = Arc::new(MemoryEmployeeStore::new());
        seed_employees(employees.as_ref()).await.unwrap();
        let audit = Arc::new(RecordingAuditSink::new());
        let pipeline = Pipeline::new(
            Arc::new(KeywordClassifier::new()),
            employees,
            Arc::new(MemorySessionStore::new()),
            audit.clone(),
        );
        (pipeline, audit)
    }

    #[tokio::test]
    async fn test_empty_message_short_circuits() {
        let (pipeline, audit) = test_pipeline().await;
        let session_id = pipeline.create_session().await.unwrap();

        let reply = pipeline.handle_turn(&session_id, "   ").await.unwrap();
        assert_eq!(reply.message, EMPTY_MESSAGE_RESPONSE);
        // Only session creation was audited, nothing ran
        assert!(!audit.has_event("decision_start"));
    }

    #[tokio::test]
    async fn test_unknown_session_is_rejected() {
        let (pipeline, _audit) = test_pipeline().await;
        let reply = pipeline.handle_turn("no-such-session", "hello").await.unwrap();
        assert_eq!(reply.message, INVALID_SESSION_RESPONSE);
    }

    #[tokio::test]
    async fn test_unknown_intent_turn_replies_done() {
        let (pipeline, audit) = test_pipeline().await;
        let session_id = pipeline.create_session().await.unwrap();

        let reply = pipeline.handle_turn(&session_id, "hello there").await.unwrap();
        assert_eq!(reply.message, "Done.");
        assert!(audit.has_event("intent_unknown"));
    }

    #[tokio::test]
    async fn test_denial_short_circuits_execution() {
        let (pipeline, audit) = test_pipeline().await;
        let session_id = pipeline.create_session().await.unwrap();

        // Unauthenticated profile view
        let reply = pipeline
            .handle_turn(&session_id, "show my profile")
            .await
            .unwrap();
        assert_eq!(reply.message, "User not authenticated");
        assert!(audit.has_event("authorization_deny"));
        assert!(!audit.has_event("execution"));
    }

    #[tokio::test]
    async fn test_allowed_action_is_audited() {
        let (pipeline, audit) = test_pipeline().await;
        let session_id = pipeline.create_session().await.unwrap();

        pipeline
            .handle_turn(&session_id, "login with email anita.rao@company.com")
            .await
            .unwrap();

        assert!(audit.has_event("authorization_allow"));
        assert!(!audit.has_event("authorization_deny"));
        let event = audit
            .events()
            .into_iter()
            .find(|e| e.event_type == "authorization_allow")
            .unwrap();
        assert_eq!(event.details["action"], "login");
        // Allow events carry no reason field
        assert!(event.details.get("reason").is_none());
    }

    #[tokio::test]
    async fn test_transcript_records_both_sides() {
        let (pipeline, _audit) = test_pipeline().await;
        let session_id = pipeline.create_session().await.unwrap();

        pipeline
            .handle_turn(&session_id, "login with email anita.rao@company.com")
            .await
            .unwrap();

        let messages = pipeline.sessions.messages(&session_id).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender, Sender::User);
        assert_eq!(messages[1].sender, Sender::Agent);
        assert_eq!(messages[1].message, "Authenticated successfully.");
    }
}
