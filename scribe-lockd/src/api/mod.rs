//! HTTP API handlers for scribe-lockd

pub mod health;
pub mod session;

pub use health::health_routes;
pub use session::session_routes;
