//! Page navigation state machine
//!
//! Holds the current page index over a unit's pages together with the draft
//! buffers and the live form. Every index change flushes the form into the
//! page being left before the index moves, then re-hydrates the form from the
//! target page.

use std::sync::Arc;

use chrono::Utc;
use scribe_common::events::{EventBus, ScribeEvent};
use tracing::debug;

use crate::drafts::DraftStore;
use crate::error::Result;
use crate::fields::FieldStore;
use crate::page::Page;

pub struct PageNavigator {
    current_page_index: usize,
    /// Set when this client holds no lock on the unit
    read_only: bool,
    drafts: DraftStore,
    fields: FieldStore,
    events: Arc<EventBus>,
}

impl PageNavigator {
    /// Start on the first page
    pub fn new(drafts: DraftStore, events: Arc<EventBus>) -> Self {
        let mut navigator = Self {
            current_page_index: 0,
            read_only: false,
            drafts,
            fields: FieldStore::new(),
            events,
        };
        navigator.hydrate_fields();
        navigator
    }

    pub fn current_index(&self) -> usize {
        self.current_page_index
    }

    pub fn current_page(&self) -> Option<&Page> {
        self.drafts.page(self.current_page_index)
    }

    pub fn page_count(&self) -> usize {
        self.drafts.len()
    }

    pub fn drafts(&self) -> &DraftStore {
        &self.drafts
    }

    pub(crate) fn drafts_mut(&mut self) -> &mut DraftStore {
        &mut self.drafts
    }

    pub fn fields(&self) -> &FieldStore {
        &self.fields
    }

    /// The UI's change handler writes here
    pub fn fields_mut(&mut self) -> &mut FieldStore {
        &mut self.fields
    }

    pub fn is_current_editable(&self) -> bool {
        self.current_page().is_some_and(Page::is_editable)
    }

    /// Lock the whole unit against drafts, whatever the page statuses say
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Write the live form into the current page's draft
    ///
    /// Read-only pages and read-only units never get a draft.
    pub fn flush(&mut self) -> Result<()> {
        if self.read_only || !self.is_current_editable() {
            return Ok(());
        }
        let patch = self.fields.page_patch();
        self.drafts.update_page(self.current_page_index, &patch)
    }

    /// Move to `index`; `false` when out of range or already there
    pub fn go_to(&mut self, index: usize) -> bool {
        if index >= self.drafts.len() || index == self.current_page_index {
            return false;
        }

        // flush happens-before the index change; the index is valid here
        if let Err(e) = self.flush() {
            debug!(error = %e, "Flush before navigation failed");
        }

        debug!(
            unit_id = %self.drafts.unit_id(),
            from = self.current_page_index,
            to = index,
            "Navigating"
        );
        self.current_page_index = index;
        self.hydrate_fields();

        if let Some(page) = self.current_page() {
            self.events.emit_lossy(ScribeEvent::PageChanged {
                unit_id: self.drafts.unit_id().to_string(),
                index,
                source: page.source.clone(),
                timestamp: Utc::now(),
            });
        }
        true
    }

    pub fn go_to_next(&mut self) -> bool {
        self.go_to(self.current_page_index + 1)
    }

    pub fn go_to_previous(&mut self) -> bool {
        match self.current_page_index.checked_sub(1) {
            Some(index) => self.go_to(index),
            None => false,
        }
    }

    /// Jump to the first open page after the current one; no-op if none
    pub fn go_to_next_transcribable(&mut self) -> bool {
        match self.drafts.next_transcribable_after(self.current_page_index) {
            Some(index) => self.go_to(index),
            None => false,
        }
    }

    /// Fresh pages start blank; dirty or sent pages show their retained content
    fn hydrate_fields(&mut self) {
        let Some(page) = self.drafts.page(self.current_page_index) else {
            self.fields.reset_page_fields();
            return;
        };

        if page.is_pristine() {
            let page_number = page.fields.page_number.clone();
            self.fields.reset_page_fields();
            // page number is metadata, not transcription content
            self.fields.set_page_number(page_number);
        } else {
            self.fields.load_page(page);
        }
    }
}
