//! Session endpoints
//!
//! - `POST /session/start {unitId}` → `{token}`, 409 while another session holds the unit
//! - `POST /session/cancel {unitId, token?}` → 204, always
//! - `POST /session/submit {token, unitId, pageSource, ...}` → 204, 403 without the live token
//! - `GET /session/status/:unit_id` → `{serverHasOngoingSession}`
//! - `GET /units/:unit_id/pages` → pages submitted so far

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use scribe_common::api::{
    self, CancelRequest, SessionStatusResponse, StartRequest, StartResponse, SubmitRequest,
};
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::locks::PageRecord;
use crate::AppState;

fn require_unit_id(unit_id: &str) -> ApiResult<()> {
    if unit_id.trim().is_empty() {
        return Err(ApiError::BadRequest("unitId must not be empty".to_string()));
    }
    Ok(())
}

/// POST /session/start
pub async fn start_session(
    State(state): State<AppState>,
    Json(request): Json<StartRequest>,
) -> ApiResult<Json<StartResponse>> {
    require_unit_id(&request.unit_id)?;

    match state.locks.acquire(&request.unit_id) {
        Ok(token) => {
            info!(unit_id = %request.unit_id, "Lock granted");
            Ok(Json(StartResponse { token }))
        }
        Err(e) => {
            info!(unit_id = %request.unit_id, "Lock refused: already held");
            Err(e.into())
        }
    }
}

/// POST /session/cancel
///
/// Idempotent: cancelling an unlocked unit, or with a stale token, is not an error.
pub async fn cancel_session(
    State(state): State<AppState>,
    Json(request): Json<CancelRequest>,
) -> StatusCode {
    if state
        .locks
        .release(&request.unit_id, request.token.as_deref())
    {
        info!(unit_id = %request.unit_id, forced = request.token.is_none(), "Lock released");
    }
    StatusCode::NO_CONTENT
}

/// POST /session/submit
pub async fn submit_page(
    State(state): State<AppState>,
    Json(request): Json<SubmitRequest>,
) -> ApiResult<StatusCode> {
    require_unit_id(&request.unit_id)?;
    if request.page_source.trim().is_empty() {
        return Err(ApiError::BadRequest("pageSource must not be empty".to_string()));
    }

    match state.locks.record_submission(&request) {
        Ok(record) => {
            info!(
                unit_id = %request.unit_id,
                page = %record.page_source,
                status = %record.transcription_status,
                "Page recorded"
            );
            Ok(StatusCode::NO_CONTENT)
        }
        Err(e) => {
            warn!(unit_id = %request.unit_id, page = %request.page_source, error = %e, "Submit refused");
            Err(e.into())
        }
    }
}

/// GET /session/status/:unit_id
pub async fn session_status(
    State(state): State<AppState>,
    Path(unit_id): Path<String>,
) -> Json<SessionStatusResponse> {
    Json(SessionStatusResponse {
        server_has_ongoing_session: state.locks.is_locked(&unit_id),
    })
}

/// GET /units/:unit_id/pages
pub async fn unit_pages(
    State(state): State<AppState>,
    Path(unit_id): Path<String>,
) -> ApiResult<Json<Vec<PageRecord>>> {
    let pages = state.locks.pages(&unit_id);
    if pages.is_empty() {
        return Err(ApiError::NotFound(format!("no pages submitted for {unit_id}")));
    }
    Ok(Json(pages))
}

/// Build session routes
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route(api::START_PATH, post(start_session))
        .route(api::CANCEL_PATH, post(cancel_session))
        .route(api::SUBMIT_PATH, post(submit_page))
        .route(&format!("{}/:unit_id", api::STATUS_PATH), get(session_status))
        .route("/units/:unit_id/pages", get(unit_pages))
}
