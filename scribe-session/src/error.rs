//! Error types for the session engine
//!
//! Transport failures are converted into `SessionError` at the coordinator
//! boundary; nothing below the coordinator ever sees a raw reqwest error.

use thiserror::Error;

use crate::backend::BackendError;

/// Local validation failures; these never reach the backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Contributor email is not a valid address")]
    InvalidEmail,

    #[error("Text needs at least two words (found {found})")]
    TooFewWords { found: usize },
}

/// Session engine errors
#[derive(Debug, Error)]
pub enum SessionError {
    /// Another session holds the unit
    #[error("Someone else is already editing unit {0}")]
    LockUnavailable(String),

    /// Transport or backend failure
    #[error("Network error: {0}")]
    Network(String),

    /// Backend answered with a non-success status
    #[error("Backend rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// No live session for the unit
    #[error("No live session for unit {0}")]
    NoSession(String),

    /// A live session already exists for the unit
    #[error("A session is already active for unit {0}")]
    AlreadyActive(String),

    /// The session was cancelled while its start was still in flight
    #[error("Session for unit {0} was cancelled before it started")]
    Cancelled(String),

    /// A send is already outstanding for the session
    #[error("A submission is already in progress for unit {0}")]
    SendInFlight(String),

    #[error("Page index {index} out of range ({len} pages)")]
    PageOutOfRange { index: usize, len: usize },

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Field {field} expects a {expected} value")]
    FieldType {
        field: &'static str,
        expected: &'static str,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl SessionError {
    /// Convert a backend error for a given unit
    pub fn from_backend(unit_id: &str, err: BackendError) -> Self {
        match err {
            BackendError::Locked => SessionError::LockUnavailable(unit_id.to_string()),
            BackendError::Network(msg) | BackendError::Parse(msg) => SessionError::Network(msg),
            BackendError::Status { status, body } => SessionError::Rejected {
                status,
                message: body,
            },
        }
    }
}

/// Convenience Result type using SessionError
pub type Result<T> = std::result::Result<T, SessionError>;
