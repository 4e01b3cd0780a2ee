//! Backend seam for the session endpoints
//!
//! `SessionBackend` abstracts the HTTP contract so the coordinator and the
//! concurrency indicator can run against the real archive backend
//! (`HttpBackend`) or an in-process double in tests.

mod http;

pub use http::HttpBackend;

use async_trait::async_trait;
use scribe_common::api::{
    CancelRequest, SessionStatusResponse, StartRequest, StartResponse, SubmitRequest,
};
use thiserror::Error;

/// Transport-level errors
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend refused the lock because another session owns it
    #[error("Unit is locked by another session")]
    Locked,

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Session endpoints consumed by the engine
#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// Acquire the exclusive lock on a unit
    async fn start(&self, request: &StartRequest) -> Result<StartResponse, BackendError>;

    /// Release a lock; must be idempotent on the server side
    async fn cancel(&self, request: &CancelRequest) -> Result<(), BackendError>;

    /// Persist one page under a live lock
    async fn submit(&self, request: &SubmitRequest) -> Result<(), BackendError>;

    /// Advisory flag: does anyone hold a session on this resource?
    async fn session_status(&self, unit_id: &str) -> Result<SessionStatusResponse, BackendError>;
}
