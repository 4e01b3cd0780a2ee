//! Session endpoint contract shared by the client engine and the lock server
//!
//! Endpoints:
//! - `POST /session/start` - acquire the exclusive lock on a unit
//! - `POST /session/cancel` - release it (idempotent)
//! - `POST /session/submit` - persist one page under a live lock
//! - `GET /session/status/{unitId}` - advisory "someone else is editing" flag

pub mod types;

pub use types::{
    CancelRequest, ErrorBody, ErrorResponse, HealthResponse, SessionStatusResponse,
    StartRequest, StartResponse, SubmitRequest,
};

/// Path of the start endpoint
pub const START_PATH: &str = "/session/start";
/// Path of the cancel endpoint
pub const CANCEL_PATH: &str = "/session/cancel";
/// Path of the submit endpoint
pub const SUBMIT_PATH: &str = "/session/submit";
/// Path prefix of the advisory status endpoint (`/session/status/{unitId}`)
pub const STATUS_PATH: &str = "/session/status";
