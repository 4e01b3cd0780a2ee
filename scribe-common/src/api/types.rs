//! Request/response bodies for the session endpoints
//!
//! All bodies are JSON with camelCase keys.

use serde::{Deserialize, Serialize};

/// `POST /session/start`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    pub unit_id: String,
}

/// Successful start: the opaque lock token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartResponse {
    pub token: String,
}

/// `POST /session/cancel`
///
/// The token is optional on the wire. When present, the server only releases
/// the lock if it still belongs to that token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequest {
    pub unit_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// `POST /session/submit` - one page's full state under a live lock
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub token: String,
    pub unit_id: String,
    pub page_source: String,
    pub text: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub page_number: String,
    #[serde(default)]
    pub has_phonetic_signs: bool,
    #[serde(default)]
    pub is_unreadable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub informant_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub informant_birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub informant_birth_place: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub informant_information: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributor_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contributor_email: Option<String>,
}

/// `GET /session/status/{unitId}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusResponse {
    pub server_has_ongoing_session: bool,
}

/// Error envelope returned by the lock server
///
/// ```json
/// { "error": { "code": "LOCKED", "message": "unit U1 is locked by another session" } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
}
