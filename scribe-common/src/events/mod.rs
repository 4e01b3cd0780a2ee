//! Event types for the transcription session engine
//!
//! Outbound events (`ScribeEvent`) are broadcast via `EventBus` to the UI layer
//! and serialize to tagged JSON. Inbound UI signals live in `signal_types`.

mod signal_types;

pub use signal_types::{InboundSignal, PagePayload, StartSessionSignal};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::model::TranscriptionStatus;

/// Severity of a user-facing notification (toast)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// Why the overlay closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    /// Explicit close button
    CloseButton,
    /// External hide signal
    HideSignal,
    /// The UI ended the session after a successful submission
    FinalSubmission,
    /// A start signal for another unit replaced the open session
    Replaced,
    /// The overlay was dropped while open (unmount)
    Dropped,
}

/// Outbound events
///
/// Every variant carries a timestamp. Subscribers decide what to do with them;
/// in particular `SubmissionAccepted` subscribers own any refetch/backoff policy
/// needed while the backend index catches up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ScribeEvent {
    /// Exclusive lock acquired for a unit
    SessionStarted {
        unit_id: String,
        timestamp: DateTime<Utc>,
    },

    /// Lock could not be acquired (held elsewhere or transport failure)
    SessionStartFailed {
        unit_id: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// Lock released (best effort)
    SessionCancelled {
        unit_id: String,
        timestamp: DateTime<Utc>,
    },

    /// Current page changed; the UI scrolls the matching thumbnail into view
    PageChanged {
        unit_id: String,
        index: usize,
        source: String,
        timestamp: DateTime<Utc>,
    },

    /// A page submission was accepted by the backend
    SubmissionAccepted {
        unit_id: String,
        page_source: String,
        status: TranscriptionStatus,
        timestamp: DateTime<Utc>,
    },

    /// Non-blocking user-facing notification
    Notification {
        level: NotificationLevel,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Overlay shown for a unit
    OverlayOpened {
        unit_id: String,
        title: String,
        timestamp: DateTime<Utc>,
    },

    /// Overlay hidden
    OverlayClosed {
        unit_id: String,
        reason: CloseReason,
        timestamp: DateTime<Utc>,
    },
}

impl ScribeEvent {
    /// Event name (matches the serialized `type` tag)
    pub fn event_type(&self) -> &'static str {
        match self {
            ScribeEvent::SessionStarted { .. } => "SessionStarted",
            ScribeEvent::SessionStartFailed { .. } => "SessionStartFailed",
            ScribeEvent::SessionCancelled { .. } => "SessionCancelled",
            ScribeEvent::PageChanged { .. } => "PageChanged",
            ScribeEvent::SubmissionAccepted { .. } => "SubmissionAccepted",
            ScribeEvent::Notification { .. } => "Notification",
            ScribeEvent::OverlayOpened { .. } => "OverlayOpened",
            ScribeEvent::OverlayClosed { .. } => "OverlayClosed",
        }
    }

    /// Convenience constructor for toasts
    pub fn notification(level: NotificationLevel, message: impl Into<String>) -> Self {
        ScribeEvent::Notification {
            level,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Broadcast bus between the session engine and the UI layer
///
/// Replaces ambient global state: components get an `Arc<EventBus>` handed to
/// them and the UI subscribes to what it needs.
pub struct EventBus {
    tx: broadcast::Sender<ScribeEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// Slow subscribers lose the oldest events once `capacity` is exceeded.
    ///
    /// # Examples
    ///
    /// ```
    /// use scribe_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(256);
    /// assert_eq!(event_bus.capacity(), 256);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<ScribeEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` if nobody is listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: ScribeEvent,
    ) -> Result<usize, broadcast::error::SendError<ScribeEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: ScribeEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
