//! Human-in-the-loop confirmation gate.
//!
//! Only `delete_employee` is gated. The gate never clears the selected
//! action: the pending delete survives in the session state so the next
//! turn's confirmation applies to it.

use crate::action::Action;
use crate::audit::AuditSink;
use crate::session::SessionState;
use serde_json::json;

/// The confirmation prompt shown before a delete proceeds.
pub const CONFIRM_PROMPT: &str =
    "Are you sure you want to delete this employee? Reply 'Yes' to confirm.";

const CONFIRM_WORDS: [&str; 3] = ["yes", "y", "confirm"];

/// Apply the confirmation gate to the current turn.
///
/// Non-destructive actions pass through untouched. For a pending delete:
/// already confirmed passes, a confirmation word confirms, anything else
/// (re-)prompts and blocks execution this turn.
pub fn apply(state: &mut SessionState, audit: &dyn AuditSink) {
    if !matches!(state.selected_action, Some(Action::DeleteEmployee { .. })) {
        return;
    }

    if state.confirmed {
        return;
    }

    let input = state
        .user_input
        .as_deref()
        .unwrap_or_default()
        .trim()
        .to_lowercase();

    if CONFIRM_WORDS.contains(&input.as_str()) {
        state.confirmed = true;
        state.awaiting_confirmation = false;
        audit.log_event(
            "hitl_confirmed",
            state.session_id.as_deref(),
            json!({ "action": "delete_employee" }),
        );
        return;
    }

    state.response = Some(CONFIRM_PROMPT.to_string());
    state.awaiting_confirmation = true;
    state.pending_action = Some("delete_employee".to_string());
    audit.log_event(
        "hitl_prompted",
        state.session_id.as_deref(),
        json!({ "action": "delete_employee" }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::RecordingAuditSink;

    fn delete_state(input: &str) -> SessionState {
        let mut state = SessionState::new("s1");
        state.user_input = Some(input.to_string());
        state.selected_action = Some(Action::DeleteEmployee { employee_id: Some(7) });
        state
    }

    #[test]
    fn test_non_delete_actions_pass_untouched() {
        let audit = RecordingAuditSink::new();
        let mut state = SessionState::new("s1");
        state.selected_action = Some(Action::GetMyProfile);

        apply(&mut state, &audit);

        assert!(!state.awaiting_confirmation);
        assert!(state.response.is_none());
        assert!(audit.events().is_empty());
    }

    #[test]
    fn test_first_delete_attempt_prompts() {
        let audit = RecordingAuditSink::new();
        let mut state = delete_state("delete priya nair");

        apply(&mut state, &audit);

        assert_eq!(state.response.as_deref(), Some(CONFIRM_PROMPT));
        assert!(state.awaiting_confirmation);
        assert!(!state.confirmed);
        assert_eq!(state.pending_action.as_deref(), Some("delete_employee"));
        // The action itself must survive for the next turn
        assert!(state.selected_action.is_some());
        assert!(audit.has_event("hitl_prompted"));
    }

    #[test]
    fn test_confirmation_words_confirm() {
        for word in ["yes", "Y", " Confirm "] {
            let audit = RecordingAuditSink::new();
            let mut state = delete_state(word);
            state.awaiting_confirmation = true;

            apply(&mut state, &audit);

            assert!(state.confirmed, "word {word:?} should confirm");
            assert!(!state.awaiting_confirmation);
            assert!(state.response.is_none());
            assert!(audit.has_event("hitl_confirmed"));
        }
    }

    #[test]
    fn test_non_confirmation_reply_reprompts() {
        let audit = RecordingAuditSink::new();
        let mut state = delete_state("maybe later");
        state.awaiting_confirmation = true;

        apply(&mut state, &audit);

        assert!(!state.confirmed);
        assert!(state.awaiting_confirmation);
        assert_eq!(state.response.as_deref(), Some(CONFIRM_PROMPT));
    }

    #[test]
    fn test_already_confirmed_passes_through() {
        let audit = RecordingAuditSink::new();
        let mut state = delete_state("yes");
        state.confirmed = true;

        apply(&mut state, &audit);

        assert!(state.response.is_none());
        assert!(audit.events().is_empty());
    }
}
