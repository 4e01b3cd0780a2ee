//! Scripted SessionBackend double
//!
//! Lock state lives in a `ServerState` that several mocks can share, so two
//! coordinators (two "browsers") can compete for the same unit while each
//! mock counts only its own calls.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use scribe_common::api::{
    CancelRequest, SessionStatusResponse, StartRequest, StartResponse, SubmitRequest,
};
use scribe_session::{BackendError, SessionBackend};
use tokio::sync::oneshot;

#[derive(Default)]
struct ServerState {
    locks: HashMap<String, String>,
    next_token: usize,
}

/// Holds calls in flight until released
///
/// While holding, every call parks at the gate in arrival order.
/// `arrived(n)` resolves once `n` calls have reached it in total;
/// `release(i)` lets the `i`-th of them continue, `release_all()` stops
/// holding and lets every parked call through.
#[derive(Default)]
pub struct Gate {
    hold: AtomicBool,
    parked: Mutex<Vec<Option<oneshot::Sender<()>>>>,
}

impl Gate {
    pub fn hold(&self) {
        self.hold.store(true, Ordering::SeqCst);
    }

    pub async fn arrived(&self, calls: usize) {
        while self.parked.lock().unwrap().len() < calls {
            tokio::task::yield_now().await;
        }
    }

    pub fn release(&self, call: usize) {
        if let Some(tx) = self.parked.lock().unwrap().get_mut(call).and_then(Option::take) {
            let _ = tx.send(());
        }
    }

    pub fn release_all(&self) {
        self.hold.store(false, Ordering::SeqCst);
        for tx in self.parked.lock().unwrap().iter_mut().filter_map(Option::take) {
            let _ = tx.send(());
        }
    }

    async fn pass(&self) {
        if !self.hold.load(Ordering::SeqCst) {
            return;
        }
        let (tx, rx) = oneshot::channel();
        self.parked.lock().unwrap().push(Some(tx));
        // A dropped sender means the test is done with this call
        let _ = rx.await;
    }
}

#[derive(Default)]
pub struct MockBackend {
    server: Arc<Mutex<ServerState>>,

    start_calls: AtomicUsize,
    cancel_calls: AtomicUsize,
    submit_calls: AtomicUsize,
    status_calls: AtomicUsize,

    fail_start: AtomicBool,
    fail_cancel: AtomicBool,
    fail_submit: AtomicBool,
    fail_status: AtomicBool,

    pub start_gate: Gate,
    pub submit_gate: Gate,

    submissions: Mutex<Vec<SubmitRequest>>,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A second client talking to the same server
    pub fn sharing(other: &MockBackend) -> Arc<Self> {
        Arc::new(Self {
            server: Arc::clone(&other.server),
            ..Self::default()
        })
    }

    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn cancel_calls(&self) -> usize {
        self.cancel_calls.load(Ordering::SeqCst)
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn submissions(&self) -> Vec<SubmitRequest> {
        self.submissions.lock().unwrap().clone()
    }

    pub fn is_locked(&self, unit_id: &str) -> bool {
        self.server.lock().unwrap().locks.contains_key(unit_id)
    }

    pub fn fail_starts(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::SeqCst);
    }

    pub fn fail_cancels(&self, fail: bool) {
        self.fail_cancel.store(fail, Ordering::SeqCst);
    }

    pub fn fail_submits(&self, fail: bool) {
        self.fail_submit.store(fail, Ordering::SeqCst);
    }

    pub fn fail_status_reads(&self, fail: bool) {
        self.fail_status.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SessionBackend for MockBackend {
    async fn start(&self, request: &StartRequest) -> Result<StartResponse, BackendError> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        self.start_gate.pass().await;

        if self.fail_start.load(Ordering::SeqCst) {
            return Err(BackendError::Network("connection refused".to_string()));
        }

        let mut server = self.server.lock().unwrap();
        if server.locks.contains_key(&request.unit_id) {
            return Err(BackendError::Locked);
        }
        server.next_token += 1;
        let token = format!("token-{}", server.next_token);
        server.locks.insert(request.unit_id.clone(), token.clone());
        Ok(StartResponse { token })
    }

    async fn cancel(&self, request: &CancelRequest) -> Result<(), BackendError> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_cancel.load(Ordering::SeqCst) {
            return Err(BackendError::Network("connection reset".to_string()));
        }

        let mut server = self.server.lock().unwrap();
        let owned = match (server.locks.get(&request.unit_id), &request.token) {
            (Some(held), Some(token)) => held == token,
            (Some(_), None) => true,
            (None, _) => false,
        };
        if owned {
            server.locks.remove(&request.unit_id);
        }
        Ok(())
    }

    async fn submit(&self, request: &SubmitRequest) -> Result<(), BackendError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submit_gate.pass().await;

        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(BackendError::Network("timeout".to_string()));
        }

        let holds_lock = self
            .server
            .lock()
            .unwrap()
            .locks
            .get(&request.unit_id)
            .is_some_and(|token| *token == request.token);
        if !holds_lock {
            return Err(BackendError::Status {
                status: 403,
                body: "token does not hold the lock".to_string(),
            });
        }

        self.submissions.lock().unwrap().push(request.clone());
        Ok(())
    }

    async fn session_status(&self, unit_id: &str) -> Result<SessionStatusResponse, BackendError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_status.load(Ordering::SeqCst) {
            return Err(BackendError::Status {
                status: 500,
                body: "index unavailable".to_string(),
            });
        }

        Ok(SessionStatusResponse {
            server_has_ongoing_session: self.is_locked(unit_id),
        })
    }
}
