//! # Scribe Common Library
//!
//! Shared code for the transcription session engine and its reference backend:
//! - Wire types for the session endpoints (start / cancel / submit / status)
//! - Transcription status and unit kind enums
//! - Event types (`ScribeEvent`) and the broadcast `EventBus`
//! - Inbound UI signals
//! - Configuration loading
//! - Tracing initialisation

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod model;

pub use error::{Error, Result};
pub use model::{TranscriptionStatus, UnitKind};
