//! Session coordinator: the exclusive-lock protocol
//!
//! Owns the session token for each unit this client has locked and the
//! per-session `sending` flag. The server enforces at most one live session
//! per unit; locally the coordinator guarantees:
//! - no second `start` for a unit without an intervening `cancel`
//! - at most one outstanding `send` per session
//! - `cancel` never fails and never repeats a network call
//!
//! Transport errors stop here: callers get `SessionError` (or a plain `bool`
//! from `send`) and a toast on the event bus.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use scribe_common::api::{CancelRequest, StartRequest, SubmitRequest};
use scribe_common::events::{EventBus, NotificationLevel, ScribeEvent};
use scribe_common::{TranscriptionStatus, UnitKind};
use tracing::{debug, info, warn};

use crate::backend::SessionBackend;
use crate::error::{Result, SessionError};
use crate::page::{ContributorInfo, Page, PageFields};
use crate::validation::validate_submission;

/// Handle to a live lock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub unit_id: String,
    token: String,
}

impl Session {
    pub fn token(&self) -> &str {
        &self.token
    }
}

#[derive(Debug)]
enum SessionSlot {
    /// `start` attempt with this id is in flight
    Starting(u64),
    Live { token: String, sending: bool },
}

/// Everything needed to persist one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitPayload {
    pub unit_id: String,
    pub page_source: String,
    pub fields: PageFields,
    pub contributor: ContributorInfo,
}

impl SubmitPayload {
    /// Informant fields are only sent for unit kinds that show them
    pub fn from_page(
        unit_id: &str,
        kind: UnitKind,
        page: &Page,
        contributor: ContributorInfo,
    ) -> Self {
        let mut fields = page.fields.clone();
        if !kind.has_informant_fields() {
            fields.clear_informant();
        }
        Self {
            unit_id: unit_id.to_string(),
            page_source: page.source.clone(),
            fields,
            contributor,
        }
    }

    pub fn validate(&self) -> std::result::Result<(), crate::error::ValidationError> {
        validate_submission(&self.fields.text, &self.contributor.email)
    }

    /// Wire body for `/session/submit`
    pub fn to_request(&self, token: &str) -> SubmitRequest {
        fn optional(value: &str) -> Option<String> {
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        }

        let f = &self.fields;
        SubmitRequest {
            token: token.to_string(),
            unit_id: self.unit_id.clone(),
            page_source: self.page_source.clone(),
            text: f.text.clone(),
            comment: f.comment.clone(),
            page_number: f.page_number.clone(),
            has_phonetic_signs: f.has_phonetic_signs,
            is_unreadable: f.is_unreadable,
            informant_name: optional(&f.informant_name),
            informant_birth_date: optional(&f.informant_birth_date),
            informant_birth_place: optional(&f.informant_birth_place),
            informant_information: optional(&f.informant_information),
            contributor_name: optional(&self.contributor.name),
            contributor_email: optional(&self.contributor.email),
        }
    }
}

pub struct SessionCoordinator {
    backend: Arc<dyn SessionBackend>,
    events: Arc<EventBus>,
    sessions: Mutex<HashMap<String, SessionSlot>>,
    next_attempt: AtomicU64,
}

impl SessionCoordinator {
    pub fn new(backend: Arc<dyn SessionBackend>, events: Arc<EventBus>) -> Self {
        Self {
            backend,
            events,
            sessions: Mutex::new(HashMap::new()),
            next_attempt: AtomicU64::new(0),
        }
    }

    pub fn backend(&self) -> &Arc<dyn SessionBackend> {
        &self.backend
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    // Never held across an await
    fn sessions(&self) -> MutexGuard<'_, HashMap<String, SessionSlot>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Acquire the exclusive lock for `unit_id`
    ///
    /// A `cancel` while the request is in flight wins: the token that comes
    /// back is released and the caller gets `Cancelled`, even if a newer
    /// `start` for the same unit is already waiting.
    pub async fn start(&self, unit_id: &str) -> Result<Session> {
        let attempt = self.next_attempt.fetch_add(1, Ordering::Relaxed);
        {
            let mut sessions = self.sessions();
            if sessions.contains_key(unit_id) {
                return Err(SessionError::AlreadyActive(unit_id.to_string()));
            }
            sessions.insert(unit_id.to_string(), SessionSlot::Starting(attempt));
        }
        let _guard = StartingGuard {
            coordinator: self,
            unit_id,
            attempt,
        };

        let request = StartRequest {
            unit_id: unit_id.to_string(),
        };
        let result = self.backend.start(&request).await;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                self.clear_starting(unit_id, attempt);
                let err = SessionError::from_backend(unit_id, e);
                info!(unit_id, error = %err, "Could not start session");
                self.events.emit_lossy(ScribeEvent::SessionStartFailed {
                    unit_id: unit_id.to_string(),
                    reason: err.to_string(),
                    timestamp: Utc::now(),
                });
                return Err(err);
            }
        };

        let still_wanted = {
            let mut sessions = self.sessions();
            let ours =
                matches!(sessions.get(unit_id), Some(SessionSlot::Starting(id)) if *id == attempt);
            if ours {
                sessions.insert(
                    unit_id.to_string(),
                    SessionSlot::Live {
                        token: response.token.clone(),
                        sending: false,
                    },
                );
            }
            ours
        };

        if !still_wanted {
            // cancel() ran while this attempt was in flight; the slot, if any,
            // belongs to a newer attempt. Give the lock straight back.
            debug!(unit_id, "Session cancelled during start; releasing");
            self.release(unit_id, &response.token).await;
            return Err(SessionError::Cancelled(unit_id.to_string()));
        }

        info!(unit_id, "Session started");
        self.events.emit_lossy(ScribeEvent::SessionStarted {
            unit_id: unit_id.to_string(),
            timestamp: Utc::now(),
        });

        Ok(Session {
            unit_id: unit_id.to_string(),
            token: response.token,
        })
    }

    /// Drop the slot only while it is still this attempt's `Starting`
    fn clear_starting(&self, unit_id: &str, attempt: u64) {
        let mut sessions = self.sessions();
        if matches!(sessions.get(unit_id), Some(SessionSlot::Starting(id)) if *id == attempt) {
            sessions.remove(unit_id);
        }
    }

    /// Best-effort lock release
    ///
    /// Safe without a session and safe to repeat: only the first call for a
    /// live session reaches the backend. Failures are logged and swallowed.
    pub async fn cancel(&self, unit_id: &str) {
        let slot = self.sessions().remove(unit_id);

        match slot {
            None => {
                debug!(unit_id, "cancel: no session");
            }
            Some(SessionSlot::Starting(_)) => {
                debug!(unit_id, "cancel: start still in flight");
            }
            Some(SessionSlot::Live { token, sending }) => {
                if sending {
                    // The in-flight send keeps its own copy of the token; the
                    // race is accepted because the lock is not a commit.
                    debug!(unit_id, "cancel racing an in-flight send");
                }
                self.release(unit_id, &token).await;
            }
        }
    }

    async fn release(&self, unit_id: &str, token: &str) {
        let request = CancelRequest {
            unit_id: unit_id.to_string(),
            token: Some(token.to_string()),
        };
        match self.backend.cancel(&request).await {
            Ok(()) => info!(unit_id, "Session cancelled"),
            Err(e) => warn!(unit_id, error = %e, "Session cancel failed (ignored)"),
        }
        self.events.emit_lossy(ScribeEvent::SessionCancelled {
            unit_id: unit_id.to_string(),
            timestamp: Utc::now(),
        });
    }

    /// Submit one page; `true` only when the backend accepted it
    ///
    /// On failure a toast is emitted and nothing local changes, so the caller
    /// can simply retry.
    pub async fn send(&self, payload: &SubmitPayload) -> bool {
        match self.try_send(payload).await {
            Ok(()) => true,
            Err(e) => {
                warn!(unit_id = %payload.unit_id, page = %payload.page_source, error = %e, "Submit failed");
                self.events
                    .emit_lossy(ScribeEvent::notification(NotificationLevel::Error, e.to_string()));
                false
            }
        }
    }

    /// `send` with the failure reason
    pub async fn try_send(&self, payload: &SubmitPayload) -> Result<()> {
        payload.validate()?;

        let unit_id = payload.unit_id.as_str();
        let token = {
            let mut sessions = self.sessions();
            match sessions.get_mut(unit_id) {
                Some(SessionSlot::Live { sending: true, .. }) => {
                    return Err(SessionError::SendInFlight(unit_id.to_string()));
                }
                Some(SessionSlot::Live { token, sending }) => {
                    *sending = true;
                    token.clone()
                }
                Some(SessionSlot::Starting(_)) | None => {
                    return Err(SessionError::NoSession(unit_id.to_string()));
                }
            }
        };
        let _guard = SendingGuard {
            coordinator: self,
            unit_id,
            token: &token,
        };

        let request = payload.to_request(&token);
        self.backend
            .submit(&request)
            .await
            .map_err(|e| SessionError::from_backend(unit_id, e))?;

        info!(unit_id, page = %payload.page_source, "Page submitted");
        self.events.emit_lossy(ScribeEvent::SubmissionAccepted {
            unit_id: unit_id.to_string(),
            page_source: payload.page_source.clone(),
            status: TranscriptionStatus::Transcribed,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Live, non-cancelled session for the unit
    pub fn session(&self, unit_id: &str) -> Option<Session> {
        match self.sessions().get(unit_id) {
            Some(SessionSlot::Live { token, .. }) => Some(Session {
                unit_id: unit_id.to_string(),
                token: token.clone(),
            }),
            _ => None,
        }
    }

    pub fn is_live(&self, unit_id: &str) -> bool {
        self.session(unit_id).is_some()
    }

    /// The submit control is disabled while this is true
    pub fn is_sending(&self, unit_id: &str) -> bool {
        matches!(
            self.sessions().get(unit_id),
            Some(SessionSlot::Live { sending: true, .. })
        )
    }
}

/// Clears an abandoned `start` attempt's slot when its future is dropped
struct StartingGuard<'a> {
    coordinator: &'a SessionCoordinator,
    unit_id: &'a str,
    attempt: u64,
}

impl Drop for StartingGuard<'_> {
    fn drop(&mut self) {
        self.coordinator.clear_starting(self.unit_id, self.attempt);
    }
}

/// Clears `sending` when a send finishes or its future is dropped
struct SendingGuard<'a> {
    coordinator: &'a SessionCoordinator,
    unit_id: &'a str,
    token: &'a str,
}

impl Drop for SendingGuard<'_> {
    fn drop(&mut self) {
        let mut sessions = self.coordinator.sessions();
        if let Some(SessionSlot::Live { token, sending }) = sessions.get_mut(self.unit_id) {
            // A cancel + restart may have replaced the session meanwhile
            if token == self.token {
                *sending = false;
            }
        }
    }
}
