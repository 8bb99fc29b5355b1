//! Domain error types
//!
//! Local validation failures raised before any network I/O happens:
//! blank sync tokens, invalid page limits, malformed identifiers, and
//! illegal session state transitions.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Sync token is empty or whitespace
    #[error("Invalid sync token: {0}")]
    InvalidSyncToken(String),

    /// Page limit is not a positive integer
    #[error("Invalid page limit: {0}")]
    InvalidMaxPages(String),

    /// Environment identifier is not a usable GUID
    #[error("Invalid environment ID: {0}")]
    InvalidEnvironmentId(String),

    /// Invalid state transition attempt
    #[error("Invalid state transition from {from} to {to}")]
    InvalidState {
        /// The current state
        from: String,
        /// The attempted target state
        to: String,
    },

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}
