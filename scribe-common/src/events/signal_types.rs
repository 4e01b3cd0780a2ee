//! Inbound signals from the UI layer

use serde::{Deserialize, Serialize};

use crate::model::{TranscriptionStatus, UnitKind};

/// Signals the UI sends to the overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InboundSignal {
    /// "Start transcribing X"
    StartSession(StartSessionSignal),
    /// Hide the overlay (close path)
    Hide,
}

/// Payload of the "start session" signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionSignal {
    /// Unit id (the lock is taken on this)
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub archive_id: Option<String>,
    #[serde(default)]
    pub transcription_type: UnitKind,
    #[serde(default)]
    pub images: Vec<PagePayload>,
}

/// One page as delivered by the backend; every attribute except `source` may be absent
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagePayload {
    pub source: String,
    #[serde(default)]
    pub page_number: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub informant_name: Option<String>,
    #[serde(default)]
    pub informant_birth_date: Option<String>,
    #[serde(default)]
    pub informant_birth_place: Option<String>,
    #[serde(default)]
    pub informant_information: Option<String>,
    #[serde(default)]
    pub has_phonetic_signs: Option<bool>,
    #[serde(default)]
    pub is_unreadable: Option<bool>,
    #[serde(default)]
    pub transcription_status: Option<TranscriptionStatus>,
}
