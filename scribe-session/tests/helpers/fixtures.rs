//! Signals and wiring shared by the integration tests

use std::sync::Arc;

use scribe_common::events::{EventBus, PagePayload, StartSessionSignal};
use scribe_common::{TranscriptionStatus, UnitKind};
use scribe_session::{SessionBackend, SessionCoordinator};

use super::MockBackend;

/// Coordinator on its own event bus, talking to `backend`
pub fn coordinator_with(backend: &Arc<MockBackend>) -> Arc<SessionCoordinator> {
    let backend: Arc<dyn SessionBackend> = backend.clone();
    Arc::new(SessionCoordinator::new(backend, Arc::new(EventBus::new(64))))
}

/// Start signal for `unit_id` with one page per status, sources `{unit_id}_000N.jpg`
pub fn start_signal(unit_id: &str, statuses: &[TranscriptionStatus]) -> StartSessionSignal {
    let images = statuses
        .iter()
        .enumerate()
        .map(|(i, status)| PagePayload {
            source: format!("{unit_id}_{:04}.jpg", i + 1),
            text: Some(format!("server text {}", i + 1)),
            transcription_status: Some(*status),
            ..PagePayload::default()
        })
        .collect();

    StartSessionSignal {
        id: unit_id.to_string(),
        title: format!("Uppteckning {unit_id}"),
        archive_id: Some(format!("ULMA-{unit_id}")),
        transcription_type: UnitKind::PageBased,
        images,
    }
}

pub fn never_confirm(_unsaved: usize) -> bool {
    false
}

pub fn always_confirm(_unsaved: usize) -> bool {
    true
}
