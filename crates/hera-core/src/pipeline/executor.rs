//! Action executor.
//!
//! The only stage that touches the record store. Every branch sets a
//! user-facing response; expected failures (missing target, bad credentials,
//! blocked fields) are responses, not errors. Only store faults propagate as
//! `Err`.

use super::confirm::CONFIRM_PROMPT;
use crate::action::Action;
use crate::audit::AuditSink;
use crate::employee::{Employee, EmployeeStatus, EmployeeStore, NewEmployee, Role};
use crate::error::Result;
use crate::session::SessionState;
use crate::text::{title_case, token_after};
use serde_json::json;
use std::collections::BTreeMap;

/// Fields that may be written through `update_employee`.
const ALLOWED_UPDATE_FIELDS: [&str; 5] = ["location", "status", "salary", "name", "role"];

/// Execute the selected action against the record store.
pub async fn execute(
    state: &mut SessionState,
    store: &dyn EmployeeStore,
    audit: &dyn AuditSink,
) -> Result<()> {
    let Some(action) = state.selected_action.clone() else {
        // A stage that already produced a response (blocked, denial,
        // confirmation prompt) must not be clobbered here.
        if state.response.is_none() {
            state.response = Some("No action was selected.".to_string());
        }
        return Ok(());
    };

    match action {
        Action::Login => login(state, store, audit).await,
        Action::OnboardUser => onboard(state, store, audit).await,
        Action::GetMyProfile => {
            let profile = match state.employee_id {
                Some(id) => store.get(id).await?,
                None => None,
            };
            state.response = Some(match profile {
                Some(emp) => emp.profile_summary(),
                None => "Profile not found.".to_string(),
            });
            Ok(())
        }
        Action::GetEmployee { employee_id } => {
            let Some(id) = employee_id else {
                state.response = Some("No employee specified.".to_string());
                return Ok(());
            };
            state.response = Some(match store.get(id).await? {
                Some(emp) => emp.profile_summary(),
                None => "Employee not found.".to_string(),
            });
            Ok(())
        }
        Action::UpdateEmployee { employee_id, fields } => {
            update(state, store, audit, employee_id, &fields).await
        }
        Action::DeleteEmployee { employee_id } => delete(state, store, audit, employee_id).await,
    }
}

async fn login(
    state: &mut SessionState,
    store: &dyn EmployeeStore,
    audit: &dyn AuditSink,
) -> Result<()> {
    let session_id = state.session_id.clone();
    let lowered = state
        .user_input
        .as_deref()
        .unwrap_or_default()
        .to_lowercase();

    let Some(email) = token_after(&lowered, "email") else {
        state.response = Some("Could not determine email for login.".to_string());
        audit.log_event(
            "auth_failed",
            session_id.as_deref(),
            json!({ "reason": "email not found" }),
        );
        return Ok(());
    };

    let Some(employee) = store.find_by_email(email).await? else {
        state.response = Some("Invalid credentials.".to_string());
        audit.log_event(
            "auth_failed",
            session_id.as_deref(),
            json!({ "reason": "employee not found", "email": email }),
        );
        return Ok(());
    };

    state.authenticated = true;
    state.employee_id = Some(employee.id);
    state.role = Some(employee.role);
    state.response = Some("Authenticated successfully.".to_string());

    audit.log_event(
        "auth_success",
        session_id.as_deref(),
        json!({ "employee_id": employee.id, "role": employee.role.as_str() }),
    );
    Ok(())
}

async fn onboard(
    state: &mut SessionState,
    store: &dyn EmployeeStore,
    audit: &dyn AuditSink,
) -> Result<()> {
    let session_id = state.session_id.clone();
    let lowered = state
        .user_input
        .as_deref()
        .unwrap_or_default()
        .to_lowercase();

    let Some(email) = lowered.split_whitespace().find(|t| t.contains('@')) else {
        state.response = Some("Email is required for onboarding.".to_string());
        audit.log_event(
            "onboarding_failed",
            session_id.as_deref(),
            json!({ "reason": "email_missing" }),
        );
        return Ok(());
    };

    if store.find_by_email(email).await?.is_some() {
        state.response = Some("User already onboarded.".to_string());
        audit.log_event(
            "onboarding_failed",
            session_id.as_deref(),
            json!({ "reason": "user_exists", "email": email }),
        );
        return Ok(());
    }

    let name = extract_name(&lowered).unwrap_or_else(|| "New Employee".to_string());

    // Role is forced to employee regardless of what the text claims
    let new = NewEmployee {
        name,
        email: email.to_string(),
        role: Role::Employee,
        manager_id: None,
        salary: 0,
        status: EmployeeStatus::Active,
        location: "Unknown".to_string(),
    };

    match store.insert(new).await {
        Ok(emp) => {
            audit.log_event(
                "onboarding_success",
                session_id.as_deref(),
                json!({ "employee_id": emp.id, "email": emp.email }),
            );
            state.response =
                Some("You have been onboarded successfully as an employee.".to_string());
        }
        Err(e) => {
            // A storage fault mid-onboarding is reported, not propagated
            audit.log_event(
                "onboarding_exception",
                session_id.as_deref(),
                json!({ "error": e.to_string() }),
            );
            state.response = Some("Onboarding failed due to a system error.".to_string());
        }
    }
    Ok(())
}

/// The display name following a "name is" marker, cut at the first stop
/// phrase and title-cased.
fn extract_name(lowered: &str) -> Option<String> {
    let after = lowered.split_once("name is")?.1;
    let stop_phrases = [" and", " email", " my email"];
    let cut = stop_phrases
        .iter()
        .find_map(|phrase| after.find(phrase))
        .map_or(after, |pos| &after[..pos]);
    Some(title_case(cut.trim()))
}

async fn update(
    state: &mut SessionState,
    store: &dyn EmployeeStore,
    audit: &dyn AuditSink,
    employee_id: Option<i64>,
    fields: &BTreeMap<String, String>,
) -> Result<()> {
    let session_id = state.session_id.clone();

    let Some(id) = employee_id else {
        state.response = Some("Could not determine which employee to update.".to_string());
        return Ok(());
    };

    let Some(mut emp) = store.get(id).await? else {
        state.response = Some("Employee not found.".to_string());
        return Ok(());
    };

    let mut updated: Vec<&str> = Vec::new();
    for (field, value) in fields {
        if !ALLOWED_UPDATE_FIELDS.contains(&field.as_str())
            || !apply_field(&mut emp, field, value)
        {
            audit.log_event(
                "update_field_blocked",
                session_id.as_deref(),
                json!({ "field": field }),
            );
            continue;
        }
        updated.push(field.as_str());
    }

    if updated.is_empty() {
        state.response = Some("No valid fields to update.".to_string());
        return Ok(());
    }

    if !store.update(&emp).await? {
        state.response = Some("Employee not found.".to_string());
        return Ok(());
    }

    state.response = Some(format!("Updated fields: {}", updated.join(", ")));
    audit.log_execution(
        session_id.as_deref(),
        "update_employee",
        json!({ "employee_id": id, "fields": updated }),
    );
    Ok(())
}

/// Apply one parsed field to the record. Returns false when the value does
/// not parse for a typed field, in which case the field is treated as
/// blocked rather than written with a junk value.
fn apply_field(emp: &mut Employee, field: &str, value: &str) -> bool {
    match field {
        "location" => {
            emp.location = value.to_string();
            true
        }
        "name" => {
            emp.name = value.to_string();
            true
        }
        "status" => match EmployeeStatus::parse(value) {
            Some(status) => {
                emp.status = status;
                true
            }
            None => false,
        },
        "salary" => match value.replace(',', "").parse::<i64>() {
            Ok(salary) if salary >= 0 => {
                emp.salary = salary;
                true
            }
            _ => false,
        },
        // Unrecognized role labels persist as Unknown, which every
        // authorization path denies
        "role" => {
            emp.role = Role::parse(value);
            true
        }
        _ => false,
    }
}

async fn delete(
    state: &mut SessionState,
    store: &dyn EmployeeStore,
    audit: &dyn AuditSink,
    employee_id: Option<i64>,
) -> Result<()> {
    let session_id = state.session_id.clone();

    // The confirmation gate is re-checked here so a bypassed gate still
    // cannot delete
    if !state.confirmed {
        state.response = Some(CONFIRM_PROMPT.to_string());
        audit.log_event(
            "delete_hitl_required",
            session_id.as_deref(),
            json!({ "confirmed": false }),
        );
        return Ok(());
    }

    let Some(id) = employee_id else {
        state.response = Some("Could not determine which employee to delete.".to_string());
        audit.log_event("delete_failed_no_target", session_id.as_deref(), json!({}));
        return Ok(());
    };

    if state.employee_id == Some(id) {
        state.response = Some("You cannot delete your own profile.".to_string());
        audit.log_event(
            "delete_denied_self",
            session_id.as_deref(),
            json!({ "employee_id": id }),
        );
        return Ok(());
    }

    if !store.delete(id).await? {
        state.response = Some("Employee not found.".to_string());
        audit.log_event(
            "delete_failed_not_found",
            session_id.as_deref(),
            json!({ "employee_id": id }),
        );
        return Ok(());
    }

    state.response = Some("Employee deleted successfully.".to_string());
    audit.log_execution(
        session_id.as_deref(),
        "delete_employee",
        json!({ "employee_id": id }),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::RecordingAuditSink;
    use crate::employee::MemoryEmployeeStore;

    async fn seeded_store() -> MemoryEmployeeStore {
        let store = MemoryEmployeeStore::new();
        for (name, email, role) in [
            ("Anita Rao", "anita.rao@company.com", Role::Hr),
            ("Ravi Mehta", "ravi.mehta@company.com", Role::Manager),
            ("Priya Nair", "priya.nair@company.com", Role::Employee),
        ] {
            store
                .insert(NewEmployee {
                    name: name.to_string(),
                    email: email.to_string(),
                    role,
                    manager_id: None,
                    salary: 100_000,
                    status: EmployeeStatus::Active,
                    location: "Bangalore".to_string(),
                })
                .await
                .unwrap();
        }
        store
    }

    fn turn(action: Action, input: &str) -> SessionState {
        let mut state = SessionState::new("s1");
        state.selected_action = Some(action);
        state.user_input = Some(input.to_string());
        state
    }

    #[tokio::test]
    async fn test_login_binds_identity() {
        let store = seeded_store().await;
        let audit = RecordingAuditSink::new();
        let mut state = turn(Action::Login, "login with email anita.rao@company.com");

        execute(&mut state, &store, &audit).await.unwrap();

        assert_eq!(state.response.as_deref(), Some("Authenticated successfully."));
        assert!(state.authenticated);
        assert_eq!(state.employee_id, Some(1));
        assert_eq!(state.role, Some(Role::Hr));
        assert!(audit.has_event("auth_success"));
    }

    #[tokio::test]
    async fn test_login_without_email_keyword_fails() {
        let store = seeded_store().await;
        let audit = RecordingAuditSink::new();
        let mut state = turn(Action::Login, "log me in please");

        execute(&mut state, &store, &audit).await.unwrap();

        assert_eq!(
            state.response.as_deref(),
            Some("Could not determine email for login.")
        );
        assert!(!state.authenticated);
        assert!(audit.has_event("auth_failed"));
    }

    #[tokio::test]
    async fn test_login_unknown_email_is_invalid_credentials() {
        let store = seeded_store().await;
        let audit = RecordingAuditSink::new();
        let mut state = turn(Action::Login, "login with email ghost@company.com");

        execute(&mut state, &store, &audit).await.unwrap();

        assert_eq!(state.response.as_deref(), Some("Invalid credentials."));
        assert!(!state.authenticated);
    }

    #[tokio::test]
    async fn test_onboard_creates_employee_with_forced_role() {
        let store = seeded_store().await;
        let audit = RecordingAuditSink::new();
        let mut state = turn(
            Action::OnboardUser,
            "onboard me, my name is jane doe and my email is jane.doe@company.com",
        );

        execute(&mut state, &store, &audit).await.unwrap();

        assert_eq!(
            state.response.as_deref(),
            Some("You have been onboarded successfully as an employee.")
        );
        let emp = store
            .find_by_email("jane.doe@company.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(emp.name, "Jane Doe");
        assert_eq!(emp.role, Role::Employee);
        assert_eq!(emp.salary, 0);
        assert_eq!(emp.location, "Unknown");
        assert!(audit.has_event("onboarding_success"));
    }

    #[tokio::test]
    async fn test_onboard_is_idempotent_per_email() {
        let store = seeded_store().await;
        let audit = RecordingAuditSink::new();
        let mut state = turn(Action::OnboardUser, "sign up priya.nair@company.com");

        execute(&mut state, &store, &audit).await.unwrap();

        assert_eq!(state.response.as_deref(), Some("User already onboarded."));
        assert_eq!(store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_onboard_requires_email() {
        let store = seeded_store().await;
        let audit = RecordingAuditSink::new();
        let mut state = turn(Action::OnboardUser, "onboard me, my name is jane doe");

        execute(&mut state, &store, &audit).await.unwrap();

        assert_eq!(
            state.response.as_deref(),
            Some("Email is required for onboarding.")
        );
        assert!(audit.has_event("onboarding_failed"));
    }

    #[test]
    fn test_extract_name_stops_at_stop_phrases() {
        assert_eq!(
            extract_name("my name is jane doe and my email is j@x.com").as_deref(),
            Some("Jane Doe")
        );
        assert_eq!(
            extract_name("name is sam smith email s@x.com").as_deref(),
            Some("Sam Smith")
        );
        assert_eq!(extract_name("just onboard me"), None);
    }

    #[tokio::test]
    async fn test_get_my_profile_requires_bound_identity() {
        let store = seeded_store().await;
        let audit = RecordingAuditSink::new();
        let mut state = turn(Action::GetMyProfile, "show my profile");

        execute(&mut state, &store, &audit).await.unwrap();
        assert_eq!(state.response.as_deref(), Some("Profile not found."));

        state.employee_id = Some(3);
        state.response = None;
        execute(&mut state, &store, &audit).await.unwrap();
        assert_eq!(
            state.response.as_deref(),
            Some("Name: Priya Nair Email: priya.nair@company.com Role: employee Location: Bangalore")
        );
    }

    #[tokio::test]
    async fn test_get_employee_without_target_refuses() {
        let store = seeded_store().await;
        let audit = RecordingAuditSink::new();
        let mut state = turn(Action::GetEmployee { employee_id: None }, "show bob");

        execute(&mut state, &store, &audit).await.unwrap();
        assert_eq!(state.response.as_deref(), Some("No employee specified."));
    }

    #[tokio::test]
    async fn test_update_applies_allowed_typed_fields() {
        let store = seeded_store().await;
        let audit = RecordingAuditSink::new();
        let mut state = turn(
            Action::UpdateEmployee {
                employee_id: Some(3),
                fields: [("location".to_string(), "London".to_string())].into(),
            },
            "update priya nair location to london",
        );

        execute(&mut state, &store, &audit).await.unwrap();

        assert_eq!(state.response.as_deref(), Some("Updated fields: location"));
        assert_eq!(store.get(3).await.unwrap().unwrap().location, "London");
        assert!(audit.has_event("execution"));
    }

    #[tokio::test]
    async fn test_update_blocks_disallowed_field() {
        let store = seeded_store().await;
        let audit = RecordingAuditSink::new();
        let mut state = turn(
            Action::UpdateEmployee {
                employee_id: Some(3),
                fields: [("email".to_string(), "Evil@X.Com".to_string())].into(),
            },
            "update priya nair email to evil@x.com",
        );

        execute(&mut state, &store, &audit).await.unwrap();

        assert_eq!(state.response.as_deref(), Some("No valid fields to update."));
        assert!(audit.has_event("update_field_blocked"));
        assert_eq!(
            store.get(3).await.unwrap().unwrap().email,
            "priya.nair@company.com"
        );
    }

    #[tokio::test]
    async fn test_update_rejects_unparseable_typed_value() {
        let store = seeded_store().await;
        let audit = RecordingAuditSink::new();
        let mut state = turn(
            Action::UpdateEmployee {
                employee_id: Some(3),
                fields: [("salary".to_string(), "Lots".to_string())].into(),
            },
            "update priya nair salary to lots",
        );

        execute(&mut state, &store, &audit).await.unwrap();

        assert_eq!(state.response.as_deref(), Some("No valid fields to update."));
        assert_eq!(store.get(3).await.unwrap().unwrap().salary, 100_000);
    }

    #[tokio::test]
    async fn test_update_without_target_reports_it() {
        let store = seeded_store().await;
        let audit = RecordingAuditSink::new();
        let mut state = turn(
            Action::UpdateEmployee {
                employee_id: None,
                fields: BTreeMap::new(),
            },
            "update somebody location to mars",
        );

        execute(&mut state, &store, &audit).await.unwrap();
        assert_eq!(
            state.response.as_deref(),
            Some("Could not determine which employee to update.")
        );
    }

    #[tokio::test]
    async fn test_unconfirmed_delete_reprompts() {
        let store = seeded_store().await;
        let audit = RecordingAuditSink::new();
        let mut state = turn(
            Action::DeleteEmployee { employee_id: Some(3) },
            "delete priya nair",
        );

        execute(&mut state, &store, &audit).await.unwrap();

        assert_eq!(state.response.as_deref(), Some(CONFIRM_PROMPT));
        assert_eq!(store.count().await.unwrap(), 3);
        assert!(audit.has_event("delete_hitl_required"));
    }

    #[tokio::test]
    async fn test_confirmed_delete_removes_record() {
        let store = seeded_store().await;
        let audit = RecordingAuditSink::new();
        let mut state = turn(Action::DeleteEmployee { employee_id: Some(3) }, "yes");
        state.employee_id = Some(1);
        state.confirmed = true;

        execute(&mut state, &store, &audit).await.unwrap();

        assert_eq!(
            state.response.as_deref(),
            Some("Employee deleted successfully.")
        );
        assert!(store.get(3).await.unwrap().is_none());
        assert!(audit.has_event("execution"));
    }

    #[tokio::test]
    async fn test_self_delete_always_forbidden() {
        let store = seeded_store().await;
        let audit = RecordingAuditSink::new();
        let mut state = turn(Action::DeleteEmployee { employee_id: Some(1) }, "yes");
        state.employee_id = Some(1);
        state.confirmed = true;

        execute(&mut state, &store, &audit).await.unwrap();

        assert_eq!(
            state.response.as_deref(),
            Some("You cannot delete your own profile.")
        );
        assert_eq!(store.count().await.unwrap(), 3);
        assert!(audit.has_event("delete_denied_self"));
    }

    #[tokio::test]
    async fn test_confirmed_delete_without_target_refuses() {
        let store = seeded_store().await;
        let audit = RecordingAuditSink::new();
        let mut state = turn(Action::DeleteEmployee { employee_id: None }, "yes");
        state.confirmed = true;

        execute(&mut state, &store, &audit).await.unwrap();

        assert_eq!(
            state.response.as_deref(),
            Some("Could not determine which employee to delete.")
        );
        assert!(audit.has_event("delete_failed_no_target"));
    }

    #[tokio::test]
    async fn test_no_action_sets_response_only_when_unset() {
        let store = seeded_store().await;
        let audit = RecordingAuditSink::new();

        let mut state = SessionState::new("s1");
        execute(&mut state, &store, &audit).await.unwrap();
        assert_eq!(state.response.as_deref(), Some("No action was selected."));

        let mut state = SessionState::new("s1");
        state.response = Some("Your request was blocked due to policy violations.".to_string());
        execute(&mut state, &store, &audit).await.unwrap();
        assert_eq!(
            state.response.as_deref(),
            Some("Your request was blocked due to policy violations.")
        );
    }
}
