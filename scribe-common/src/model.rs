//! Transcription status state machine and unit kinds
//!
//! Status progression, as seen by a client:
//! READYTOTRANSCRIBE → UNDERTRANSCRIPTION → (TRANSCRIBED | REVIEWING | NEEDSIMPROVEMENT | APPROVED) → PUBLISHED
//!
//! The client only ever assigns `Transcribed` itself (optimistically, after a
//! successful submit). Every other transition is reported by the backend on the
//! next hydration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Per-page transcription status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptionStatus {
    /// Open for contributions; the only locally editable state
    #[default]
    ReadyToTranscribe,
    /// Claimed by another session
    UnderTranscription,
    /// Submitted, waiting for moderation
    Transcribed,
    /// Being reviewed by a moderator
    Reviewing,
    /// Sent back by a moderator
    NeedsImprovement,
    /// Approved, not yet published
    Approved,
    /// Terminal
    Published,
}

/// Coarse stage of a status; stages only move forward from the client's view
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StatusStage {
    Open,
    Claimed,
    Moderation,
    Published,
}

impl TranscriptionStatus {
    pub fn stage(self) -> StatusStage {
        match self {
            TranscriptionStatus::ReadyToTranscribe => StatusStage::Open,
            TranscriptionStatus::UnderTranscription => StatusStage::Claimed,
            TranscriptionStatus::Transcribed
            | TranscriptionStatus::Reviewing
            | TranscriptionStatus::NeedsImprovement
            | TranscriptionStatus::Approved => StatusStage::Moderation,
            TranscriptionStatus::Published => StatusStage::Published,
        }
    }

    /// Only `ReadyToTranscribe` permits local edits
    pub fn is_editable(self) -> bool {
        self == TranscriptionStatus::ReadyToTranscribe
    }

    pub fn is_under_moderation(self) -> bool {
        self.stage() == StatusStage::Moderation
    }

    pub fn is_terminal(self) -> bool {
        self == TranscriptionStatus::Published
    }

    /// Whether a client may move a page from `self` to `next`.
    ///
    /// Moves inside the moderation stage are allowed; moves to an earlier
    /// stage are not.
    pub fn advances_to(self, next: TranscriptionStatus) -> bool {
        next.stage() >= self.stage()
    }

    /// Wire value
    pub fn as_str(self) -> &'static str {
        match self {
            TranscriptionStatus::ReadyToTranscribe => "readytotranscribe",
            TranscriptionStatus::UnderTranscription => "undertranscription",
            TranscriptionStatus::Transcribed => "transcribed",
            TranscriptionStatus::Reviewing => "reviewing",
            TranscriptionStatus::NeedsImprovement => "needsimprovement",
            TranscriptionStatus::Approved => "approved",
            TranscriptionStatus::Published => "published",
        }
    }

    /// Human readable label shown next to read-only pages
    pub fn label(self) -> &'static str {
        match self {
            TranscriptionStatus::ReadyToTranscribe => "Ready to transcribe",
            TranscriptionStatus::UnderTranscription => "Someone else is transcribing this page",
            TranscriptionStatus::Transcribed => "Transcribed, awaiting review",
            TranscriptionStatus::Reviewing => "Under review",
            TranscriptionStatus::NeedsImprovement => "Under review (needs improvement)",
            TranscriptionStatus::Approved => "Approved, awaiting publication",
            TranscriptionStatus::Published => "Published",
        }
    }
}

impl fmt::Display for TranscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TranscriptionStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "readytotranscribe" => Ok(TranscriptionStatus::ReadyToTranscribe),
            "undertranscription" => Ok(TranscriptionStatus::UnderTranscription),
            "transcribed" => Ok(TranscriptionStatus::Transcribed),
            "reviewing" => Ok(TranscriptionStatus::Reviewing),
            "needsimprovement" => Ok(TranscriptionStatus::NeedsImprovement),
            "approved" => Ok(TranscriptionStatus::Approved),
            "published" => Ok(TranscriptionStatus::Published),
            other => Err(crate::Error::InvalidInput(format!(
                "unknown transcription status: {other}"
            ))),
        }
    }
}

/// Kind of archive unit being contributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// Scanned pages transcribed one by one
    #[default]
    PageBased,
    /// A single record transcribed as free text
    FreeText,
    /// A structured questionnaire form with informant fields
    StructuredForm,
    /// Descriptions of timestamped audio segments
    AudioDescription,
}

impl UnitKind {
    /// Structured forms expose the informant fields
    pub fn has_informant_fields(self) -> bool {
        matches!(self, UnitKind::StructuredForm)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UnitKind::PageBased => "page_based",
            UnitKind::FreeText => "free_text",
            UnitKind::StructuredForm => "structured_form",
            UnitKind::AudioDescription => "audio_description",
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
