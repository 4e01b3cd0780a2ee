//! Advisory concurrency indicator
//!
//! For resources this client has not locked (e.g. a sibling audio segment),
//! reads the backend's `serverHasOngoingSession` flag to swap the "start
//! contributing" affordance for a passive notice.
//!
//! This is a hint, not a lock: it grants nothing and prevents nothing. The
//! authoritative check is the backend's refusal at `start`/`send` time.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::backend::SessionBackend;
use crate::coordinator::SessionCoordinator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConcurrencyFlag {
    pub server_has_ongoing_session: bool,
}

/// What the UI should offer for a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affordance {
    /// Nobody is editing: offer "start contributing"
    StartContributing,
    /// Someone else appears to be editing: show a passive notice
    OngoingElsewhere,
    /// This client holds the session
    OwnSession,
}

pub struct ConcurrencyIndicator {
    backend: Arc<dyn SessionBackend>,
    coordinator: Arc<SessionCoordinator>,
}

impl ConcurrencyIndicator {
    pub fn new(coordinator: Arc<SessionCoordinator>) -> Self {
        Self {
            backend: Arc::clone(coordinator.backend()),
            coordinator,
        }
    }

    /// Read the flag; an unreadable flag counts as "no ongoing session"
    pub async fn read(&self, resource_id: &str) -> ConcurrencyFlag {
        match self.backend.session_status(resource_id).await {
            Ok(status) => ConcurrencyFlag {
                server_has_ongoing_session: status.server_has_ongoing_session,
            },
            Err(e) => {
                warn!(resource_id, error = %e, "Could not read session status");
                ConcurrencyFlag::default()
            }
        }
    }

    pub fn affordance(&self, resource_id: &str, flag: ConcurrencyFlag) -> Affordance {
        if self.coordinator.is_live(resource_id) {
            Affordance::OwnSession
        } else if flag.server_has_ongoing_session {
            Affordance::OngoingElsewhere
        } else {
            Affordance::StartContributing
        }
    }

    pub async fn check(&self, resource_id: &str) -> Affordance {
        let flag = self.read(resource_id).await;
        self.affordance(resource_id, flag)
    }

    /// Poll the flag every `interval` until `cancel` fires
    ///
    /// The receiver always holds the latest reading; the first read happens
    /// immediately.
    pub fn watch(
        self: &Arc<Self>,
        resource_id: impl Into<String>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> watch::Receiver<ConcurrencyFlag> {
        let (tx, rx) = watch::channel(ConcurrencyFlag::default());
        let indicator = Arc::clone(self);
        let resource_id = resource_id.into();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let flag = indicator.read(&resource_id).await;
                        tx.send_if_modified(|current| {
                            let changed = *current != flag;
                            *current = flag;
                            changed
                        });
                        if tx.is_closed() {
                            break;
                        }
                    }
                }
            }
            debug!(resource_id = %resource_id, "Stopped watching session status");
        });

        rx
    }
}
