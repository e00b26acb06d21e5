//! Backend actions.
//!
//! A closed tagged union replaces string-tagged dispatch: every consuming
//! stage matches exhaustively, so a new action cannot be added without
//! updating the planner, the authorization gate, and the executor.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The concrete backend operation selected to satisfy an intent.
///
/// Argument payloads are typed per variant. A `None` target id means the
/// planner could not resolve one; the executor refuses rather than guessing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Authenticate the session against an employee email
    Login,
    /// Create a new employee record from the raw request text
    OnboardUser,
    /// View the caller's own profile
    GetMyProfile,
    /// View another employee's profile
    GetEmployee {
        /// Resolved target, if any
        #[serde(default)]
        employee_id: Option<i64>,
    },
    /// Update fields on an employee record
    UpdateEmployee {
        /// Resolved target, if any
        #[serde(default)]
        employee_id: Option<i64>,
        /// Field name to new value, as parsed from the request text
        #[serde(default)]
        fields: BTreeMap<String, String>,
    },
    /// Delete an employee record (gated on explicit confirmation)
    DeleteEmployee {
        /// Resolved target, if any
        #[serde(default)]
        employee_id: Option<i64>,
    },
}

impl Action {
    /// Stable wire name, used in audit events and the pre-auth allow set.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::OnboardUser => "onboard_user",
            Self::GetMyProfile => "get_my_profile",
            Self::GetEmployee { .. } => "get_employee",
            Self::UpdateEmployee { .. } => "update_employee",
            Self::DeleteEmployee { .. } => "delete_employee",
        }
    }

    /// Whether this action is allowed before authentication.
    #[must_use]
    pub fn is_pre_auth(&self) -> bool {
        matches!(self, Self::Login | Self::OnboardUser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_tagged_round_trip() {
        let action = Action::DeleteEmployee { employee_id: Some(7) };
        let json = serde_json::to_string(&action).unwrap();
        assert_eq!(json, r#"{"action":"delete_employee","employee_id":7}"#);
        let back: Action = serde_json::from_str(&json).unwrap();
        assert_eq!(back, action);
    }

    #[test]
    fn test_missing_args_default_to_none() {
        let action: Action = serde_json::from_str(r#"{"action":"get_employee"}"#).unwrap();
        assert_eq!(action, Action::GetEmployee { employee_id: None });
    }

    #[test]
    fn test_pre_auth_set() {
        assert!(Action::Login.is_pre_auth());
        assert!(Action::OnboardUser.is_pre_auth());
        assert!(!Action::GetMyProfile.is_pre_auth());
        assert!(!Action::DeleteEmployee { employee_id: None }.is_pre_auth());
    }
}
