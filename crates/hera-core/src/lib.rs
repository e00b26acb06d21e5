//! Hera Core - HR Assistant Pipeline
//!
//! This crate provides the decision pipeline for the Hera HR assistant:
//! - Intent: fixed intent vocabulary and pluggable classifiers
//! - Planning: mapping an intent plus raw text to a concrete backend action
//! - Authorization: role-based access control over selected actions
//! - Confirmation: human-in-the-loop gating for destructive actions
//! - Execution: running the selected action against the employee store
//! - Session: persistent, resumable per-session turn state
//! - Audit: fire-and-forget structured audit events

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod action;
pub mod audit;
pub mod employee;
pub mod error;
pub mod intent;
pub mod pipeline;
pub mod seed;
pub mod session;
pub mod text;

pub use action::Action;
pub use audit::{AuditEvent, AuditSink, RecordingAuditSink, TracingAuditSink};
pub use employee::{
    Employee, EmployeeStatus, EmployeeStore, MemoryEmployeeStore, NewEmployee, Role,
    SqliteEmployeeStore,
};
pub use error::{Error, Result};
pub use intent::{Intent, IntentClassifier, KeywordClassifier, OpenAiClassifier};
pub use pipeline::{authorize, Decision, Pipeline, TurnReply};
pub use seed::seed_employees;
pub use session::{
    MemorySessionStore, Sender, SessionState, SessionStore, SqliteSessionStore,
    TranscriptMessage,
};
