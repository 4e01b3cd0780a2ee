//! scribe-lockd library - reference session backend
//!
//! In-memory implementation of the session endpoints: one exclusive lock per
//! unit, page submissions accepted only under the live token. Used for local
//! development and by the session engine's integration tests.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;
pub mod locks;

use locks::LockTable;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub locks: Arc<LockTable>,
}

impl AppState {
    /// `lock_ttl = None` keeps locks until they are cancelled
    pub fn new(lock_ttl: Option<Duration>) -> Self {
        Self {
            locks: Arc::new(LockTable::new(lock_ttl)),
        }
    }
}

/// Build application router
///
/// CORS is permissive: browser front-ends on other origins call these endpoints.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::session_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
