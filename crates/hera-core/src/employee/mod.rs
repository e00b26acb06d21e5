//! Employee records.
//!
//! The manager relationship is arena-style: a flat table keyed by id with an
//! optional manager id resolved by lookup, never an object reference.

mod sqlite;
mod store;

pub use sqlite::SqliteEmployeeStore;
pub use store::{EmployeeStore, MemoryEmployeeStore};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse RBAC role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular employee: may view only their own profile
    Employee,
    /// Manager: read-only access to employee profiles
    Manager,
    /// HR: full access
    Hr,
    /// Any other persisted value; always denied — no implicit default-allow
    #[serde(other)]
    Unknown,
}

impl Role {
    /// Parse a role label, case-insensitively. Unrecognized values map to
    /// `Unknown`, which every authorization path denies.
    #[must_use]
    pub fn parse(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "employee" => Self::Employee,
            "manager" => Self::Manager,
            "hr" => Self::Hr,
            _ => Self::Unknown,
        }
    }

    /// Stable wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Employee => "employee",
            Self::Manager => "manager",
            Self::Hr => "hr",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Employment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmployeeStatus {
    /// Currently employed
    Active,
    /// No longer employed; the record is retained
    Terminated,
}

impl EmployeeStatus {
    /// Parse a status label, case-insensitively.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "active" => Some(Self::Active),
            "terminated" => Some(Self::Terminated),
            _ => None,
        }
    }

    /// Stable wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Terminated => "terminated",
        }
    }
}

impl fmt::Display for EmployeeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored employee record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique, stable id
    pub id: i64,
    /// Display name
    pub name: String,
    /// Globally unique email
    pub email: String,
    /// RBAC role
    pub role: Role,
    /// Optional back-reference to this employee's manager
    pub manager_id: Option<i64>,
    /// Annual salary, non-negative
    pub salary: i64,
    /// Employment status
    pub status: EmployeeStatus,
    /// Free-text location
    pub location: String,
}

impl Employee {
    /// User-facing profile summary.
    #[must_use]
    pub fn profile_summary(&self) -> String {
        format!(
            "Name: {} Email: {} Role: {} Location: {}",
            self.name, self.email, self.role, self.location
        )
    }
}

/// Fields for creating a new employee record; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewEmployee {
    /// Display name
    pub name: String,
    /// Globally unique email
    pub email: String,
    /// RBAC role
    pub role: Role,
    /// Optional manager back-reference
    pub manager_id: Option<i64>,
    /// Annual salary
    pub salary: i64,
    /// Employment status
    pub status: EmployeeStatus,
    /// Free-text location
    pub location: String,
}
