//! Live form state for the page being edited
//!
//! A flat name/value map driven by the UI's change handler. Page fields are
//! flushed into the `DraftStore` on navigation; contributor name and email
//! belong to the whole session and survive the per-page reset.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SessionError};
use crate::page::{ContributorInfo, Page, PagePatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldName {
    Text,
    Comment,
    PageNumber,
    InformantName,
    InformantBirthDate,
    InformantBirthPlace,
    InformantInformation,
    HasPhoneticSigns,
    IsUnreadable,
    ContributorName,
    ContributorEmail,
}

impl FieldName {
    pub const ALL: [FieldName; 11] = [
        FieldName::Text,
        FieldName::Comment,
        FieldName::PageNumber,
        FieldName::InformantName,
        FieldName::InformantBirthDate,
        FieldName::InformantBirthPlace,
        FieldName::InformantInformation,
        FieldName::HasPhoneticSigns,
        FieldName::IsUnreadable,
        FieldName::ContributorName,
        FieldName::ContributorEmail,
    ];

    /// Input name used by the UI
    pub fn as_str(self) -> &'static str {
        match self {
            FieldName::Text => "text",
            FieldName::Comment => "comment",
            FieldName::PageNumber => "pageNumber",
            FieldName::InformantName => "informantName",
            FieldName::InformantBirthDate => "informantBirthDate",
            FieldName::InformantBirthPlace => "informantBirthPlace",
            FieldName::InformantInformation => "informantInformation",
            FieldName::HasPhoneticSigns => "hasPhoneticSigns",
            FieldName::IsUnreadable => "isUnreadable",
            FieldName::ContributorName => "contributorName",
            FieldName::ContributorEmail => "contributorEmail",
        }
    }

    pub fn is_flag(self) -> bool {
        matches!(self, FieldName::HasPhoneticSigns | FieldName::IsUnreadable)
    }

    pub fn is_contributor(self) -> bool {
        matches!(self, FieldName::ContributorName | FieldName::ContributorEmail)
    }

    fn default_value(self) -> FieldValue {
        if self.is_flag() {
            FieldValue::Flag(false)
        } else {
            FieldValue::Text(String::new())
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldName {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self> {
        FieldName::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| SessionError::UnknownField(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
}

#[derive(Debug, Clone)]
pub struct FieldStore {
    values: BTreeMap<FieldName, FieldValue>,
}

impl Default for FieldStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldStore {
    pub fn new() -> Self {
        let values = FieldName::ALL
            .into_iter()
            .map(|f| (f, f.default_value()))
            .collect();
        Self { values }
    }

    /// Change handler; rejects a value of the wrong kind for the field
    pub fn on_change(&mut self, name: FieldName, value: FieldValue) -> Result<()> {
        match (&value, name.is_flag()) {
            (FieldValue::Flag(_), true) | (FieldValue::Text(_), false) => {
                self.values.insert(name, value);
                Ok(())
            }
            (FieldValue::Flag(_), false) => Err(SessionError::FieldType {
                field: name.as_str(),
                expected: "text",
            }),
            (FieldValue::Text(_), true) => Err(SessionError::FieldType {
                field: name.as_str(),
                expected: "boolean",
            }),
        }
    }

    /// Change handler keyed by the UI input name
    pub fn on_input(&mut self, name: &str, value: FieldValue) -> Result<()> {
        self.on_change(name.parse()?, value)
    }

    pub fn set_text(&mut self, name: FieldName, value: impl Into<String>) -> Result<()> {
        self.on_change(name, FieldValue::Text(value.into()))
    }

    /// Page number is always text, so this cannot fail
    pub fn set_page_number(&mut self, value: impl Into<String>) {
        self.values
            .insert(FieldName::PageNumber, FieldValue::Text(value.into()));
    }

    pub fn set_flag(&mut self, name: FieldName, value: bool) -> Result<()> {
        self.on_change(name, FieldValue::Flag(value))
    }

    pub fn get(&self, name: FieldName) -> &FieldValue {
        // every FieldName is inserted in new() and never removed
        &self.values[&name]
    }

    /// Text value; empty for flag fields
    pub fn text(&self, name: FieldName) -> &str {
        match self.get(name) {
            FieldValue::Text(s) => s,
            FieldValue::Flag(_) => "",
        }
    }

    pub fn flag(&self, name: FieldName) -> bool {
        matches!(self.get(name), FieldValue::Flag(true))
    }

    /// Clear everything, contributor included
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Clear the page fields, keep contributor name/email
    pub fn reset_page_fields(&mut self) {
        for name in FieldName::ALL.into_iter().filter(|f| !f.is_contributor()) {
            self.values.insert(name, name.default_value());
        }
    }

    /// Show a page's retained content
    pub fn load_page(&mut self, page: &Page) {
        let f = &page.fields;
        let texts = [
            (FieldName::Text, &f.text),
            (FieldName::Comment, &f.comment),
            (FieldName::PageNumber, &f.page_number),
            (FieldName::InformantName, &f.informant_name),
            (FieldName::InformantBirthDate, &f.informant_birth_date),
            (FieldName::InformantBirthPlace, &f.informant_birth_place),
            (FieldName::InformantInformation, &f.informant_information),
        ];
        for (name, value) in texts {
            self.values.insert(name, FieldValue::Text(value.clone()));
        }
        self.values
            .insert(FieldName::HasPhoneticSigns, FieldValue::Flag(f.has_phonetic_signs));
        self.values
            .insert(FieldName::IsUnreadable, FieldValue::Flag(f.is_unreadable));
    }

    /// Every page field as a patch (contributor fields excluded)
    pub fn page_patch(&self) -> PagePatch {
        let text = |name| Some(self.text(name).to_string());
        PagePatch {
            text: text(FieldName::Text),
            comment: text(FieldName::Comment),
            page_number: text(FieldName::PageNumber),
            informant_name: text(FieldName::InformantName),
            informant_birth_date: text(FieldName::InformantBirthDate),
            informant_birth_place: text(FieldName::InformantBirthPlace),
            informant_information: text(FieldName::InformantInformation),
            has_phonetic_signs: Some(self.flag(FieldName::HasPhoneticSigns)),
            is_unreadable: Some(self.flag(FieldName::IsUnreadable)),
        }
    }

    pub fn contributor(&self) -> ContributorInfo {
        ContributorInfo {
            name: self.text(FieldName::ContributorName).trim().to_string(),
            email: self.text(FieldName::ContributorEmail).trim().to_string(),
        }
    }
}
