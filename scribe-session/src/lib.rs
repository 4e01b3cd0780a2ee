//! scribe-session - collaborative transcription session engine
//!
//! Lets anonymous volunteers edit a shared, server-owned archive unit without
//! overwriting each other's work:
//! - `coordinator`: exclusive-lock protocol against the backend (start / cancel / send)
//! - `drafts` and `fields`: per-page draft buffers and the live form state
//! - `navigator`: page state machine with flush-before-switch
//! - `overlay`: open/close orchestration, discard confirmation, guaranteed cancel
//! - `indicator`: advisory "someone else is editing" flag for sub-resources
//!
//! The engine is cooperative: every component is driven from one task and only
//! the coordinator's network calls suspend.

pub mod backend;
pub mod coordinator;
pub mod drafts;
pub mod error;
pub mod fields;
pub mod indicator;
pub mod navigator;
pub mod overlay;
pub mod page;
pub mod validation;

pub use backend::{BackendError, HttpBackend, SessionBackend};
pub use coordinator::{Session, SessionCoordinator, SubmitPayload};
pub use drafts::DraftStore;
pub use error::{Result, SessionError, ValidationError};
pub use fields::{FieldName, FieldStore, FieldValue};
pub use indicator::{Affordance, ConcurrencyFlag, ConcurrencyIndicator};
pub use navigator::PageNavigator;
pub use overlay::{
    Access, DiscardConfirmation, OpenUnit, OverlayLifecycle, PageControls, SessionSummary,
    SubmitBlock, SubmitOutcome,
};
pub use page::{ContributorInfo, Page, PageFields, PagePatch};
