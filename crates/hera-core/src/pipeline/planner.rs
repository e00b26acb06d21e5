//! Action planner.
//!
//! Maps the classified intent plus the raw text to a concrete action with
//! typed arguments. Entity resolution is deliberately naive and
//! deterministic: first name-substring match in ascending id order, and no
//! fallback when nothing matches. An unresolved target stays `None` so the
//! executor can refuse instead of guessing.
//!
//! An unknown intent is a no-op: the previously selected action is left in
//! place, which is what lets a confirmation reply reach a pending delete.

use crate::action::Action;
use crate::audit::AuditSink;
use crate::employee::{Employee, EmployeeStore};
use crate::error::Result;
use crate::intent::Intent;
use crate::session::SessionState;
use crate::text::title_case;
use serde_json::json;
use std::collections::BTreeMap;

/// Response set when the classifier flagged the request as blocked.
pub const BLOCKED_RESPONSE: &str = "Your request was blocked due to policy violations.";

/// Plan the action for the current turn.
pub async fn plan(
    state: &mut SessionState,
    store: &dyn EmployeeStore,
    audit: &dyn AuditSink,
) -> Result<()> {
    let session_id = state.session_id.clone();
    let session_id = session_id.as_deref();
    let user_input = state
        .user_input
        .as_deref()
        .unwrap_or_default()
        .to_lowercase();
    let user_input = user_input.trim();

    audit.log_event(
        "decision_start",
        session_id,
        json!({ "intent": state.intent.map(|i| i.as_str()), "input": state.user_input }),
    );

    match state.intent {
        Some(Intent::Blocked) => {
            state.selected_action = None;
            state.response = Some(BLOCKED_RESPONSE.to_string());
            audit.log_event(
                "decision_blocked",
                session_id,
                json!({ "reason": "guardrail_intervention" }),
            );
        }
        Some(Intent::Authenticate) => {
            state.selected_action = Some(Action::Login);
            audit.log_event(
                "decision_authenticate",
                session_id,
                json!({ "selected_action": "login" }),
            );
        }
        Some(Intent::Onboard) => {
            state.selected_action = Some(Action::OnboardUser);
            audit.log_event(
                "decision_onboard",
                session_id,
                json!({ "selected_action": "onboard_user" }),
            );
        }
        Some(Intent::ViewSelf) => {
            state.selected_action = Some(Action::GetMyProfile);
            audit.log_event(
                "decision_view_self",
                session_id,
                json!({ "selected_action": "get_my_profile" }),
            );
        }
        Some(Intent::ViewEmployee) => {
            let target = resolve_target(store, user_input).await?;
            match &target {
                Some(emp) => audit.log_event(
                    "decision_view_employee",
                    session_id,
                    json!({ "employee_id": emp.id }),
                ),
                None => audit.log_event(
                    "decision_view_employee_failed",
                    session_id,
                    json!({ "reason": "employee not resolved" }),
                ),
            }
            state.selected_action = Some(Action::GetEmployee {
                employee_id: target.map(|e| e.id),
            });
        }
        Some(Intent::UpdateEmployee) => {
            state.selected_action = Some(plan_update(state, store, audit, user_input).await?);
        }
        Some(Intent::DeleteEmployee) => {
            let target = resolve_target(store, user_input).await?;
            match &target {
                Some(emp) => audit.log_event(
                    "decision_delete_employee",
                    session_id,
                    json!({ "employee_id": emp.id }),
                ),
                // No fallback for delete
                None => audit.log_event(
                    "decision_delete_failed",
                    session_id,
                    json!({ "reason": "employee not resolved" }),
                ),
            }
            state.selected_action = Some(Action::DeleteEmployee {
                employee_id: target.map(|e| e.id),
            });
        }
        Some(Intent::Unknown) | None => {
            // No-op: leave any previously selected action in place
            audit.log_event(
                "decision_noop",
                session_id,
                json!({ "reason": "no actionable intent" }),
            );
        }
    }

    Ok(())
}

/// First record whose lowercased name occurs in the lowered input, scanning
/// in ascending id order.
async fn resolve_target(
    store: &dyn EmployeeStore,
    lowered_input: &str,
) -> Result<Option<Employee>> {
    Ok(store
        .list()
        .await?
        .into_iter()
        .find(|emp| lowered_input.contains(&emp.name.to_lowercase())))
}

/// Parse "update <name> <field> to <value>".
///
/// The keyword `to` must appear as its own token: the field is the token
/// immediately before it, the value is everything after it, title-cased.
async fn plan_update(
    state: &SessionState,
    store: &dyn EmployeeStore,
    audit: &dyn AuditSink,
    lowered_input: &str,
) -> Result<Action> {
    let session_id = state.session_id.as_deref();

    let Some(target) = resolve_target(store, lowered_input).await? else {
        audit.log_event(
            "decision_update_failed",
            session_id,
            json!({ "reason": "employee not resolved" }),
        );
        return Ok(Action::UpdateEmployee {
            employee_id: None,
            fields: BTreeMap::new(),
        });
    };

    let tokens: Vec<&str> = lowered_input.split_whitespace().collect();
    let separator = tokens.iter().position(|t| *t == "to");

    let Some(idx) = separator.filter(|&i| i > 0 && i + 1 < tokens.len()) else {
        audit.log_event(
            "decision_update_failed",
            session_id,
            json!({ "reason": "missing value" }),
        );
        return Ok(Action::UpdateEmployee {
            employee_id: None,
            fields: BTreeMap::new(),
        });
    };

    let field = tokens[idx - 1].to_string();
    let value = title_case(&tokens[idx + 1..].join(" "));

    let mut fields = BTreeMap::new();
    fields.insert(field, value);

    audit.log_event(
        "decision_update_employee",
        session_id,
        json!({ "employee_id": target.id, "fields": fields }),
    );

    Ok(Action::UpdateEmployee {
        employee_id: Some(target.id),
        fields,
    })
}
