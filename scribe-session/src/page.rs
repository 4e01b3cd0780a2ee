//! Page model: one contributable sub-unit of an archive unit

use scribe_common::events::PagePayload;
use scribe_common::TranscriptionStatus;

/// Editable attributes of a page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageFields {
    pub text: String,
    pub comment: String,
    pub page_number: String,
    pub informant_name: String,
    pub informant_birth_date: String,
    pub informant_birth_place: String,
    pub informant_information: String,
    pub has_phonetic_signs: bool,
    pub is_unreadable: bool,
}

impl PageFields {
    /// Blank the informant fields
    pub fn clear_informant(&mut self) {
        self.informant_name.clear();
        self.informant_birth_date.clear();
        self.informant_birth_place.clear();
        self.informant_information.clear();
    }
}

/// Partial update for `PageFields`; `None` leaves a field alone
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PagePatch {
    pub text: Option<String>,
    pub comment: Option<String>,
    pub page_number: Option<String>,
    pub informant_name: Option<String>,
    pub informant_birth_date: Option<String>,
    pub informant_birth_place: Option<String>,
    pub informant_information: Option<String>,
    pub has_phonetic_signs: Option<bool>,
    pub is_unreadable: Option<bool>,
}

impl PagePatch {
    pub fn is_empty(&self) -> bool {
        *self == PagePatch::default()
    }

    /// Merge into `fields`
    pub fn apply_to(&self, fields: &mut PageFields) {
        fn merge<T: Clone>(target: &mut T, value: &Option<T>) {
            if let Some(value) = value {
                *target = value.clone();
            }
        }

        merge(&mut fields.text, &self.text);
        merge(&mut fields.comment, &self.comment);
        merge(&mut fields.page_number, &self.page_number);
        merge(&mut fields.informant_name, &self.informant_name);
        merge(&mut fields.informant_birth_date, &self.informant_birth_date);
        merge(&mut fields.informant_birth_place, &self.informant_birth_place);
        merge(&mut fields.informant_information, &self.informant_information);
        merge(&mut fields.has_phonetic_signs, &self.has_phonetic_signs);
        merge(&mut fields.is_unreadable, &self.is_unreadable);
    }
}

/// One page of a unit, as held for the lifetime of an editing session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Stable identity (e.g. image filename or segment id)
    pub source: String,
    pub fields: PageFields,
    pub transcription_status: TranscriptionStatus,
    /// Submitted during this session; never reset without a new hydration
    pub is_sent: bool,
    /// Buffered fields differ from the last confirmed state
    pub unsaved_changes: bool,
}

impl Page {
    /// Build a page from its backend payload
    ///
    /// Missing attributes become empty strings / `false`. A page that is still
    /// open for transcription starts blank: whatever text the payload carries
    /// for it is not shown as a draft.
    pub fn hydrate(payload: &PagePayload) -> Self {
        let status = payload.transcription_status.unwrap_or_default();

        let page_number = payload
            .page_number
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .or_else(|| page_number_from_source(&payload.source))
            .unwrap_or_default();

        let fields = if status.is_editable() {
            PageFields {
                page_number,
                ..PageFields::default()
            }
        } else {
            let text = |v: &Option<String>| v.clone().unwrap_or_default();
            PageFields {
                text: text(&payload.text),
                comment: text(&payload.comment),
                page_number,
                informant_name: text(&payload.informant_name),
                informant_birth_date: text(&payload.informant_birth_date),
                informant_birth_place: text(&payload.informant_birth_place),
                informant_information: text(&payload.informant_information),
                has_phonetic_signs: payload.has_phonetic_signs.unwrap_or(false),
                is_unreadable: payload.is_unreadable.unwrap_or(false),
            }
        };

        Self {
            source: payload.source.clone(),
            fields,
            transcription_status: status,
            is_sent: false,
            unsaved_changes: false,
        }
    }

    /// Editable controls are shown for open pages and for pages sent this session
    pub fn is_editable(&self) -> bool {
        self.transcription_status.is_editable() || self.is_sent
    }

    /// A fresh page: open, untouched and not sent
    pub fn is_pristine(&self) -> bool {
        self.transcription_status.is_editable() && !self.unsaved_changes && !self.is_sent
    }
}

/// Optional, purely descriptive contributor metadata
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContributorInfo {
    pub name: String,
    pub email: String,
}

/// Page number from a filename with a trailing `_NNNN.` suffix, zeros stripped
///
/// `"ULMA1234_0004.jpg"` gives `"4"`; `"scan_0000.tif"` gives `"0"`.
pub fn page_number_from_source(source: &str) -> Option<String> {
    let (_, tail) = source.rsplit_once('_')?;
    let (digits, _) = tail.split_once('.')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let stripped = digits.trim_start_matches('0');
    Some(if stripped.is_empty() { "0" } else { stripped }.to_string())
}
