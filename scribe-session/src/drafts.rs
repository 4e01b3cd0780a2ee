//! Per-page draft buffers for one editing session
//!
//! Seeded once from the unit's pages. Each page keeps a baseline: the field
//! values last confirmed by hydration or by a successful send. A page is dirty
//! exactly when its buffered fields differ from that baseline.

use scribe_common::events::PagePayload;
use scribe_common::TranscriptionStatus;
use tracing::debug;

use crate::error::{Result, SessionError};
use crate::page::{Page, PageFields, PagePatch};

pub struct DraftStore {
    unit_id: String,
    pages: Vec<Page>,
    baselines: Vec<PageFields>,
}

impl DraftStore {
    /// Hydrate drafts from the unit's page payloads
    pub fn from_payloads(unit_id: impl Into<String>, payloads: &[PagePayload]) -> Self {
        let pages: Vec<Page> = payloads.iter().map(Page::hydrate).collect();
        let baselines = pages.iter().map(|p| p.fields.clone()).collect();
        Self {
            unit_id: unit_id.into(),
            pages,
            baselines,
        }
    }

    pub fn unit_id(&self) -> &str {
        &self.unit_id
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.pages.len() {
            Ok(())
        } else {
            Err(SessionError::PageOutOfRange {
                index,
                len: self.pages.len(),
            })
        }
    }

    /// Merge `patch` into one page and recompute its dirty flag
    ///
    /// Other pages are never touched.
    pub fn update_page(&mut self, index: usize, patch: &PagePatch) -> Result<()> {
        self.check_index(index)?;
        if patch.is_empty() {
            return Ok(());
        }

        let page = &mut self.pages[index];
        patch.apply_to(&mut page.fields);
        page.unsaved_changes = page.fields != self.baselines[index];

        debug!(
            unit_id = %self.unit_id,
            page = index,
            dirty = page.unsaved_changes,
            "Draft updated"
        );
        Ok(())
    }

    /// Record a successful send for one page
    ///
    /// The current fields become the new baseline. A status that would move the
    /// page backwards is ignored.
    pub fn mark_sent(&mut self, index: usize, status_after_send: TranscriptionStatus) -> Result<()> {
        self.check_index(index)?;

        let page = &mut self.pages[index];
        page.is_sent = true;
        page.unsaved_changes = false;
        if page.transcription_status.advances_to(status_after_send) {
            page.transcription_status = status_after_send;
        } else {
            debug!(
                page = index,
                from = %page.transcription_status,
                to = %status_after_send,
                "Ignoring backward status transition"
            );
        }
        self.baselines[index] = page.fields.clone();
        Ok(())
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.pages.iter().any(|p| p.unsaved_changes)
    }

    pub fn unsaved_count(&self) -> usize {
        self.pages.iter().filter(|p| p.unsaved_changes).count()
    }

    /// Pages submitted during this session, in page order
    pub fn sent_pages(&self) -> impl Iterator<Item = &Page> {
        self.pages.iter().filter(|p| p.is_sent)
    }

    pub fn sent_count(&self) -> usize {
        self.sent_pages().count()
    }

    /// First open page strictly after `index`
    pub fn next_transcribable_after(&self, index: usize) -> Option<usize> {
        self.pages
            .iter()
            .enumerate()
            .skip(index + 1)
            .find(|(_, p)| p.transcription_status.is_editable())
            .map(|(i, _)| i)
    }
}
