//! Overlay lifecycle: closed → open → closed
//!
//! Opens on a "start session" signal, asks the coordinator for the lock and
//! hydrates the drafts. Closes on the close button, a hide signal, or a final
//! submission. Every close calls `SessionCoordinator::cancel` exactly once;
//! closing with unsaved drafts first asks for confirmation, and a refusal
//! keeps the overlay (and the session) open.

use std::sync::Arc;

use chrono::Utc;
use scribe_common::events::{CloseReason, EventBus, InboundSignal, ScribeEvent, StartSessionSignal};
use scribe_common::{TranscriptionStatus, UnitKind};
use tracing::{debug, info, warn};

use crate::coordinator::{SessionCoordinator, SubmitPayload};
use crate::drafts::DraftStore;
use crate::error::{SessionError, ValidationError};
use crate::fields::FieldName;
use crate::navigator::PageNavigator;
use crate::validation::validate_submission;

/// Asked before unsaved drafts are thrown away
pub trait DiscardConfirmation: Send + Sync {
    fn confirm_discard(&self, unsaved_pages: usize) -> bool;
}

impl<F> DiscardConfirmation for F
where
    F: Fn(usize) -> bool + Send + Sync,
{
    fn confirm_discard(&self, unsaved_pages: usize) -> bool {
        self(unsaved_pages)
    }
}

/// Whether this client may edit the open unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Editable,
    /// Someone else holds the lock; read-only with a passive message
    LockedElsewhere,
    /// The lock request failed for another reason
    CouldNotBegin(String),
}

/// What the UI renders for one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageControls {
    pub editable: bool,
    /// Status label for read-only pages
    pub notice: Option<&'static str>,
}

/// Why the submit control is disabled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitBlock {
    NotOpen,
    NotEditable,
    SendInFlight,
    Invalid(ValidationError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Saved; `moved_to` is the next open page if navigation advanced
    Accepted { moved_to: Option<usize> },
    /// Backend or transport failure; drafts untouched, retry allowed
    Failed,
    /// Blocked locally; nothing was sent
    Blocked(SubmitBlock),
}

/// Pages sent during the session, for the closing summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub unit_id: String,
    pub title: String,
    pub sent_sources: Vec<String>,
}

/// The unit shown in an open overlay
pub struct OpenUnit {
    pub id: String,
    pub title: String,
    pub archive_id: Option<String>,
    pub kind: UnitKind,
    pub access: Access,
    pub navigator: PageNavigator,
}

impl OpenUnit {
    pub fn page_controls(&self, index: usize) -> Option<PageControls> {
        let page = self.navigator.drafts().page(index)?;
        let editable = self.access == Access::Editable && page.is_editable();
        let notice = (!page.is_editable()).then(|| page.transcription_status.label());
        Some(PageControls { editable, notice })
    }
}

enum OverlayState {
    Closed,
    Open(Box<OpenUnit>),
}

pub struct OverlayLifecycle {
    coordinator: Arc<SessionCoordinator>,
    events: Arc<EventBus>,
    state: OverlayState,
}

impl OverlayLifecycle {
    pub fn new(coordinator: Arc<SessionCoordinator>) -> Self {
        let events = Arc::clone(coordinator.events());
        Self {
            coordinator,
            events,
            state: OverlayState::Closed,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, OverlayState::Open(_))
    }

    pub fn unit(&self) -> Option<&OpenUnit> {
        match &self.state {
            OverlayState::Open(unit) => Some(&**unit),
            OverlayState::Closed => None,
        }
    }

    pub fn unit_mut(&mut self) -> Option<&mut OpenUnit> {
        match &mut self.state {
            OverlayState::Open(unit) => Some(&mut **unit),
            OverlayState::Closed => None,
        }
    }

    pub fn navigator_mut(&mut self) -> Option<&mut PageNavigator> {
        self.unit_mut().map(|u| &mut u.navigator)
    }

    /// Dispatch an inbound UI signal; returns whether the overlay is open afterwards
    pub async fn handle(&mut self, signal: InboundSignal, confirm: &dyn DiscardConfirmation) -> bool {
        match signal {
            InboundSignal::StartSession(start) => {
                self.open(start, confirm).await;
            }
            InboundSignal::Hide => {
                self.close(CloseReason::HideSignal, confirm).await;
            }
        }
        self.is_open()
    }

    /// Open on a "start session" signal
    ///
    /// An already open overlay goes through the close path first; if that close
    /// is declined the new signal is ignored and `false` is returned. A failed
    /// lock request still opens the overlay, read-only.
    pub async fn open(&mut self, signal: StartSessionSignal, confirm: &dyn DiscardConfirmation) -> bool {
        if self.is_open() && !self.close(CloseReason::Replaced, confirm).await {
            debug!(unit_id = %signal.id, "Start signal ignored: current session kept");
            return false;
        }

        let access = match self.coordinator.start(&signal.id).await {
            Ok(_) => Access::Editable,
            Err(SessionError::LockUnavailable(_)) => Access::LockedElsewhere,
            Err(e) => Access::CouldNotBegin(e.to_string()),
        };

        let drafts = DraftStore::from_payloads(signal.id.clone(), &signal.images);
        let mut navigator = PageNavigator::new(drafts, Arc::clone(&self.events));
        navigator.set_read_only(access != Access::Editable);

        info!(
            unit_id = %signal.id,
            pages = navigator.page_count(),
            access = ?access,
            "Overlay opened"
        );
        self.events.emit_lossy(ScribeEvent::OverlayOpened {
            unit_id: signal.id.clone(),
            title: signal.title.clone(),
            timestamp: Utc::now(),
        });

        self.state = OverlayState::Open(Box::new(OpenUnit {
            id: signal.id,
            title: signal.title,
            archive_id: signal.archive_id,
            kind: signal.transcription_type,
            access,
            navigator,
        }));
        true
    }

    /// Close; `false` when the discard confirmation was declined
    ///
    /// Closing a closed overlay is a no-op.
    pub async fn close(&mut self, reason: CloseReason, confirm: &dyn DiscardConfirmation) -> bool {
        let OverlayState::Open(unit) = &mut self.state else {
            return true;
        };

        if let Err(e) = unit.navigator.flush() {
            debug!(error = %e, "Flush before close failed");
        }
        let unsaved = unit.navigator.drafts().unsaved_count();
        if unsaved > 0 && !confirm.confirm_discard(unsaved) {
            debug!(unit_id = %unit.id, unsaved, "Close declined");
            return false;
        }

        let OverlayState::Open(unit) = std::mem::replace(&mut self.state, OverlayState::Closed)
        else {
            return true;
        };

        self.coordinator.cancel(&unit.id).await;

        info!(unit_id = %unit.id, reason = ?reason, sent = unit.navigator.drafts().sent_count(), "Overlay closed");
        self.events.emit_lossy(ScribeEvent::OverlayClosed {
            unit_id: unit.id,
            reason,
            timestamp: Utc::now(),
        });
        true
    }

    /// State of the submit control for the current page
    pub fn can_submit(&self) -> Result<(), SubmitBlock> {
        let unit = self.unit().ok_or(SubmitBlock::NotOpen)?;
        if unit.access != Access::Editable || !unit.navigator.is_current_editable() {
            return Err(SubmitBlock::NotEditable);
        }
        if self.coordinator.is_sending(&unit.id) {
            return Err(SubmitBlock::SendInFlight);
        }

        let fields = unit.navigator.fields();
        validate_submission(
            fields.text(FieldName::Text),
            fields.text(FieldName::ContributorEmail),
        )
        .map_err(SubmitBlock::Invalid)
    }

    /// Submit the current page
    ///
    /// On success the page is marked sent with the optimistic `transcribed`
    /// status and navigation jumps to the next open page, if any. On failure
    /// nothing local changes.
    pub async fn submit_current_page(&mut self) -> SubmitOutcome {
        if let Err(block) = self.can_submit() {
            return SubmitOutcome::Blocked(block);
        }
        let coordinator = Arc::clone(&self.coordinator);
        let Some(unit) = self.unit_mut() else {
            return SubmitOutcome::Blocked(SubmitBlock::NotOpen);
        };

        let navigator = &mut unit.navigator;
        if let Err(e) = navigator.flush() {
            warn!(error = %e, "Flush before submit failed");
            return SubmitOutcome::Failed;
        }

        let index = navigator.current_index();
        let Some(page) = navigator.current_page() else {
            return SubmitOutcome::Blocked(SubmitBlock::NotEditable);
        };
        let payload = SubmitPayload::from_page(
            &unit.id,
            unit.kind,
            page,
            navigator.fields().contributor(),
        );

        if !coordinator.send(&payload).await {
            return SubmitOutcome::Failed;
        }

        if let Err(e) = navigator
            .drafts_mut()
            .mark_sent(index, TranscriptionStatus::Transcribed)
        {
            warn!(error = %e, "Could not mark page as sent");
        }

        let moved_to = navigator
            .go_to_next_transcribable()
            .then(|| navigator.current_index());
        SubmitOutcome::Accepted { moved_to }
    }

    /// Submit the current page and, if accepted, end the session
    pub async fn submit_and_close(&mut self, confirm: &dyn DiscardConfirmation) -> SubmitOutcome {
        let outcome = self.submit_current_page().await;
        if matches!(outcome, SubmitOutcome::Accepted { .. }) {
            self.close(CloseReason::FinalSubmission, confirm).await;
        }
        outcome
    }

    pub fn summary(&self) -> Option<SessionSummary> {
        let unit = self.unit()?;
        Some(SessionSummary {
            unit_id: unit.id.clone(),
            title: unit.title.clone(),
            sent_sources: unit
                .navigator
                .drafts()
                .sent_pages()
                .map(|p| p.source.clone())
                .collect(),
        })
    }
}

impl Drop for OverlayLifecycle {
    /// Unmount path: release the lock without waiting
    fn drop(&mut self) {
        let OverlayState::Open(unit) = std::mem::replace(&mut self.state, OverlayState::Closed) else {
            return;
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let coordinator = Arc::clone(&self.coordinator);
                let unit_id = unit.id.clone();
                handle.spawn(async move {
                    coordinator.cancel(&unit_id).await;
                });
            }
            Err(_) => {
                warn!(unit_id = %unit.id, "No runtime while dropping open overlay; lock not released");
            }
        }

        self.events.emit_lossy(ScribeEvent::OverlayClosed {
            unit_id: unit.id,
            reason: CloseReason::Dropped,
            timestamp: Utc::now(),
        });
    }
}
