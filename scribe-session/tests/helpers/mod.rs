//! Test helper modules for scribe-session integration tests
//!
//! - MockBackend: scripted in-process backend with call counters, failure
//!   switches and gates that hold a call in flight
//! - fixtures: start-session signals and coordinators wired to a mock

#![allow(dead_code)]

pub mod fixtures;
pub mod mock_backend;

pub use fixtures::{coordinator_with, start_signal, never_confirm, always_confirm};
pub use mock_backend::{Gate, MockBackend};
