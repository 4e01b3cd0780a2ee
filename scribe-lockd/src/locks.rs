//! In-memory lock table and page store
//!
//! One lock per unit, identified by an opaque UUID token. With a TTL
//! configured, a lock that has not been touched (acquired or used for a
//! submit) for that long is dropped the next time anyone looks at the unit.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use scribe_common::api::SubmitRequest;
use scribe_common::TranscriptionStatus;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockError {
    #[error("unit {0} is locked by another session")]
    Held(String),

    #[error("unit {0} has no live session")]
    NotLocked(String),

    #[error("token does not hold the lock on unit {0}")]
    TokenMismatch(String),
}

/// Last submitted state of one page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRecord {
    pub page_source: String,
    pub text: String,
    pub comment: String,
    pub page_number: String,
    pub has_phonetic_signs: bool,
    pub is_unreadable: bool,
    pub transcription_status: TranscriptionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contributor_name: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

struct Lock {
    token: String,
    last_seen: Instant,
}

#[derive(Default)]
struct Inner {
    locks: HashMap<String, Lock>,
    pages: HashMap<String, BTreeMap<String, PageRecord>>,
}

impl Inner {
    /// Drop the unit's lock if it outlived the TTL
    fn expire(&mut self, unit_id: &str, ttl: Option<Duration>, now: Instant) {
        let Some(ttl) = ttl else {
            return;
        };
        let expired = self
            .locks
            .get(unit_id)
            .is_some_and(|lock| now.saturating_duration_since(lock.last_seen) >= ttl);
        if expired {
            self.locks.remove(unit_id);
            info!(unit_id, "Lock expired");
        }
    }
}

pub struct LockTable {
    ttl: Option<Duration>,
    inner: Mutex<Inner>,
}

impl LockTable {
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            ttl,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take the lock; returns the new token
    pub fn acquire(&self, unit_id: &str) -> Result<String, LockError> {
        self.acquire_at(unit_id, Instant::now())
    }

    pub fn acquire_at(&self, unit_id: &str, now: Instant) -> Result<String, LockError> {
        let mut inner = self.inner();
        inner.expire(unit_id, self.ttl, now);

        if inner.locks.contains_key(unit_id) {
            return Err(LockError::Held(unit_id.to_string()));
        }

        let token = Uuid::new_v4().to_string();
        inner.locks.insert(
            unit_id.to_string(),
            Lock {
                token: token.clone(),
                last_seen: now,
            },
        );
        Ok(token)
    }

    /// Release the lock; always succeeds
    ///
    /// With a token, only that token's lock is released. Without one the lock
    /// is released unconditionally (operator release). Returns whether a lock
    /// was actually removed.
    pub fn release(&self, unit_id: &str, token: Option<&str>) -> bool {
        let mut inner = self.inner();
        let matches = match (inner.locks.get(unit_id), token) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(lock), Some(token)) => lock.token == token,
        };
        if matches {
            inner.locks.remove(unit_id);
        } else {
            debug!(unit_id, "Release ignored: no matching lock");
        }
        matches
    }

    pub fn is_locked(&self, unit_id: &str) -> bool {
        self.is_locked_at(unit_id, Instant::now())
    }

    pub fn is_locked_at(&self, unit_id: &str, now: Instant) -> bool {
        let mut inner = self.inner();
        inner.expire(unit_id, self.ttl, now);
        inner.locks.contains_key(unit_id)
    }

    /// Store one page under the caller's lock, marking it `transcribed`
    pub fn record_submission(&self, request: &SubmitRequest) -> Result<PageRecord, LockError> {
        self.record_submission_at(request, Instant::now())
    }

    pub fn record_submission_at(
        &self,
        request: &SubmitRequest,
        now: Instant,
    ) -> Result<PageRecord, LockError> {
        let unit_id = request.unit_id.as_str();
        let mut inner = self.inner();
        inner.expire(unit_id, self.ttl, now);

        match inner.locks.get_mut(unit_id) {
            None => return Err(LockError::NotLocked(unit_id.to_string())),
            Some(lock) if lock.token != request.token => {
                return Err(LockError::TokenMismatch(unit_id.to_string()));
            }
            Some(lock) => lock.last_seen = now,
        }

        let record = PageRecord {
            page_source: request.page_source.clone(),
            text: request.text.clone(),
            comment: request.comment.clone(),
            page_number: request.page_number.clone(),
            has_phonetic_signs: request.has_phonetic_signs,
            is_unreadable: request.is_unreadable,
            transcription_status: TranscriptionStatus::Transcribed,
            contributor_name: request.contributor_name.clone(),
            submitted_at: Utc::now(),
        };
        inner
            .pages
            .entry(unit_id.to_string())
            .or_default()
            .insert(record.page_source.clone(), record.clone());
        Ok(record)
    }

    /// Pages submitted for a unit, ordered by source
    pub fn pages(&self, unit_id: &str) -> Vec<PageRecord> {
        self.inner()
            .pages
            .get(unit_id)
            .map(|pages| pages.values().cloned().collect())
            .unwrap_or_default()
    }
}
