//! Authorization gate.
//!
//! A pure function over (role, authenticated, action). Denial is returned as
//! data, never raised: the caller turns a `Deny` into a user-facing response
//! and a short-circuit of the remaining stages.

use crate::action::Action;
use crate::employee::Role;

/// Outcome of the authorization gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The action may proceed.
    Allow,
    /// The action is refused; the reason is shown to the user verbatim.
    Deny(String),
}

impl Decision {
    /// Whether this decision permits the action.
    #[must_use]
    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Authorize `action` for the given identity.
///
/// Rules, in order:
/// 1. No action selected: nothing to authorize, trivially allowed.
/// 2. Login and onboarding are allowed pre-auth.
/// 3. Everything else requires authentication.
/// 4. Employees may only view their own profile.
/// 5. Managers have read-only access to profiles.
/// 6. HR has full access.
/// 7. Any other role is denied. There is no default-allow path.
#[must_use]
pub fn authorize(role: Option<Role>, authenticated: bool, action: Option<&Action>) -> Decision {
    let Some(action) = action else {
        return Decision::Allow;
    };

    if action.is_pre_auth() {
        return Decision::Allow;
    }

    if !authenticated {
        return Decision::Deny("User not authenticated".to_string());
    }

    match role {
        Some(Role::Employee) => match action {
            Action::GetMyProfile => Decision::Allow,
            _ => Decision::Deny("Employees may only view their own profile".to_string()),
        },
        Some(Role::Manager) => match action {
            Action::GetMyProfile | Action::GetEmployee { .. } => Decision::Allow,
            _ => Decision::Deny("Managers have read-only access".to_string()),
        },
        Some(Role::Hr) => Decision::Allow,
        Some(Role::Unknown) | None => Decision::Deny("Unknown role".to_string()),
    }
}
