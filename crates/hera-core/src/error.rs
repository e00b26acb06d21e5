//! Error types for hera-core
//!
//! Expected outcomes (authorization denials, unresolved targets, validation
//! misses) are modeled as data and user-facing response strings, not errors.
//! This enum covers the unexpected failures that the pipeline controller
//! catches at its boundary.

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Record or session store failure
    #[error("store error: {0}")]
    Store(String),

    /// State could not be serialized or deserialized
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Internal error (anything unanticipated)
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
