//! Keywarden error types.
//!
//! Negative authentication verdicts are not errors; see
//! [`AuthOutcome`](crate::registry::AuthOutcome). Everything here means the
//! request itself could not be carried out.

use crate::registry::KeyStatus;
use thiserror::Error;

/// Errors raised by the registry, its store, and the HTTP layer.
#[derive(Debug, Error)]
pub enum KeywardenError {
    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A required request field was absent or empty.
    #[error("Missing required field: {field}")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },

    /// The request body could not be understood.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Admin shared secret did not match.
    #[error("Incorrect admin password")]
    Unauthorized,

    /// A key with the same string already exists.
    #[error("License key already exists")]
    DuplicateKey {
        /// The rejected key string.
        key: String,
    },

    /// No key exists with the given id.
    #[error("License key {id} not found")]
    KeyNotFound {
        /// The id that was looked up.
        id: i64,
    },

    /// The requested status change is not allowed from the current status.
    #[error("License key is {from}, only active keys can change status")]
    InvalidTransition {
        /// Status the key currently holds.
        from: KeyStatus,
    },

    /// Underlying datastore failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Listener or socket failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
