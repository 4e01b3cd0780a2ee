//! Overlay lifecycle scenarios
//!
//! Drives OverlayLifecycle the way the UI does: signals in, field edits,
//! navigation, submit, close.

mod helpers;

use std::time::Duration;

use helpers::{always_confirm, coordinator_with, never_confirm, start_signal, MockBackend};
use scribe_common::events::{CloseReason, InboundSignal, ScribeEvent};
use scribe_common::TranscriptionStatus::{self, *};
use scribe_common::UnitKind;
use scribe_session::{
    Access, FieldName, OverlayLifecycle, SubmitBlock, SubmitOutcome, ValidationError,
};

async fn open_overlay(
    backend: &std::sync::Arc<MockBackend>,
    unit_id: &str,
    statuses: &[TranscriptionStatus],
) -> OverlayLifecycle {
    let mut overlay = OverlayLifecycle::new(coordinator_with(backend));
    assert!(overlay.open(start_signal(unit_id, statuses), &never_confirm).await);
    overlay
}

fn type_text(overlay: &mut OverlayLifecycle, text: &str) {
    overlay
        .navigator_mut()
        .unwrap()
        .fields_mut()
        .set_text(FieldName::Text, text)
        .unwrap();
}

fn panic_if_asked(_unsaved: usize) -> bool {
    panic!("no confirmation expected")
}

// =============================================================================
// Opening
// =============================================================================

#[tokio::test]
async fn test_read_only_page_gets_no_draft() {
    let backend = MockBackend::new();
    let mut overlay = open_overlay(&backend, "U1", &[ReadyToTranscribe, Published]).await;

    let navigator = overlay.navigator_mut().unwrap();
    assert!(navigator.go_to(1));
    assert!(navigator.go_to(0));

    let unit = overlay.unit().unwrap();
    assert_eq!(unit.access, Access::Editable);

    let first = unit.page_controls(0).unwrap();
    assert!(first.editable);
    assert_eq!(first.notice, None);

    let second = unit.page_controls(1).unwrap();
    assert!(!second.editable);
    assert!(second.notice.is_some());

    assert!(!unit.navigator.drafts().page(1).unwrap().unsaved_changes);
    assert!(!unit.navigator.drafts().has_unsaved_changes());
}

#[tokio::test]
async fn test_locked_unit_opens_read_only() {
    let holder = MockBackend::new();
    coordinator_with(&holder).start("U1").await.unwrap();

    let backend = MockBackend::sharing(&holder);
    let mut overlay = open_overlay(&backend, "U1", &[ReadyToTranscribe]).await;

    let unit = overlay.unit().unwrap();
    assert_eq!(unit.access, Access::LockedElsewhere);
    assert!(!unit.page_controls(0).unwrap().editable);

    type_text(&mut overlay, "En kort text.");
    assert_eq!(overlay.can_submit(), Err(SubmitBlock::NotEditable));
    assert_eq!(
        overlay.submit_current_page().await,
        SubmitOutcome::Blocked(SubmitBlock::NotEditable)
    );
    assert_eq!(backend.submit_calls(), 0);

    // Nothing typed here could ever be sent, so nothing to confirm
    let navigator = &overlay.unit().unwrap().navigator;
    assert!(navigator.is_read_only());
    assert!(!navigator.drafts().has_unsaved_changes());

    // No lock of ours to release
    assert!(overlay.close(CloseReason::CloseButton, &panic_if_asked).await);
    assert_eq!(backend.cancel_calls(), 0);
    assert!(holder.is_locked("U1"));
}

#[tokio::test]
async fn test_start_failure_opens_could_not_begin() {
    let backend = MockBackend::new();
    backend.fail_starts(true);
    let overlay = open_overlay(&backend, "U1", &[ReadyToTranscribe]).await;

    assert!(matches!(
        overlay.unit().unwrap().access,
        Access::CouldNotBegin(_)
    ));
    assert!(overlay.is_open(), "errors never force-close the overlay");
}

#[tokio::test]
async fn test_typing_after_failed_start_closes_without_prompt() {
    let backend = MockBackend::new();
    backend.fail_starts(true);
    let mut overlay = open_overlay(&backend, "U1", &[ReadyToTranscribe, ReadyToTranscribe]).await;

    type_text(&mut overlay, "En kort text.");
    assert!(overlay.navigator_mut().unwrap().go_to(1));
    type_text(&mut overlay, "Ännu en text.");

    assert_eq!(overlay.unit().unwrap().navigator.drafts().unsaved_count(), 0);
    assert!(overlay.close(CloseReason::CloseButton, &panic_if_asked).await);
    assert!(!overlay.is_open());
}

#[tokio::test]
async fn test_claimed_and_moderated_pages_are_read_only() {
    let backend = MockBackend::new();
    let mut overlay =
        open_overlay(&backend, "U1", &[UnderTranscription, Reviewing, ReadyToTranscribe]).await;

    let unit = overlay.unit().unwrap();
    assert_eq!(unit.access, Access::Editable);
    let claimed = unit.page_controls(0).unwrap();
    assert!(!claimed.editable);
    assert_eq!(claimed.notice, Some("Someone else is transcribing this page"));
    let reviewing = unit.page_controls(1).unwrap();
    assert!(!reviewing.editable);
    assert_eq!(reviewing.notice, Some("Under review"));
    let open = unit.page_controls(2).unwrap();
    assert!(open.editable);
    assert_eq!(open.notice, None);

    // Type on both closed pages, then leave them
    assert_eq!(overlay.can_submit(), Err(SubmitBlock::NotEditable));
    type_text(&mut overlay, "Inte min sida.");
    assert!(overlay.navigator_mut().unwrap().go_to(1));
    assert_eq!(overlay.can_submit(), Err(SubmitBlock::NotEditable));
    type_text(&mut overlay, "Inte heller denna.");
    assert!(overlay.navigator_mut().unwrap().go_to(2));

    let drafts = overlay.unit().unwrap().navigator.drafts();
    assert!(!drafts.page(0).unwrap().unsaved_changes);
    assert_eq!(drafts.page(0).unwrap().fields.text, "server text 1");
    assert!(!drafts.page(1).unwrap().unsaved_changes);
    assert_eq!(drafts.page(1).unwrap().fields.text, "server text 2");
    assert!(!drafts.has_unsaved_changes());

    assert!(overlay.close(CloseReason::CloseButton, &panic_if_asked).await);
    assert_eq!(backend.submit_calls(), 0);
}

// =============================================================================
// Submitting
// =============================================================================

#[tokio::test]
async fn test_submit_marks_sent_and_moves_to_next_open_page() {
    let backend = MockBackend::new();
    let mut overlay =
        open_overlay(&backend, "U1", &[ReadyToTranscribe, Published, ReadyToTranscribe]).await;

    type_text(&mut overlay, "En kort text.");
    assert_eq!(overlay.can_submit(), Ok(()));
    assert_eq!(
        overlay.submit_current_page().await,
        SubmitOutcome::Accepted { moved_to: Some(2) }
    );

    let navigator = &overlay.unit().unwrap().navigator;
    let sent = navigator.drafts().page(0).unwrap();
    assert!(sent.is_sent);
    assert!(!sent.unsaved_changes);
    assert_eq!(sent.transcription_status, Transcribed);
    assert_eq!(navigator.current_index(), 2);
    assert_eq!(navigator.fields().text(FieldName::Text), "", "next page starts blank");

    let submissions = backend.submissions();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].text, "En kort text.");
    assert_eq!(submissions[0].page_number, "1");

    // Last open page: submit succeeds, navigation stays put
    type_text(&mut overlay, "Slutet på berättelsen.");
    assert_eq!(
        overlay.submit_current_page().await,
        SubmitOutcome::Accepted { moved_to: None }
    );
    assert_eq!(overlay.unit().unwrap().navigator.current_index(), 2);

    let summary = overlay.summary().unwrap();
    assert_eq!(summary.unit_id, "U1");
    assert_eq!(summary.sent_sources, vec!["U1_0001.jpg", "U1_0003.jpg"]);
}

#[tokio::test]
async fn test_one_word_blocks_submit_without_network() {
    let backend = MockBackend::new();
    let mut overlay = open_overlay(&backend, "U1", &[ReadyToTranscribe]).await;

    type_text(&mut overlay, "Ett");
    assert_eq!(
        overlay.can_submit(),
        Err(SubmitBlock::Invalid(ValidationError::TooFewWords { found: 1 }))
    );
    assert!(matches!(
        overlay.submit_current_page().await,
        SubmitOutcome::Blocked(SubmitBlock::Invalid(_))
    ));
    assert_eq!(backend.submit_calls(), 0);
}

#[tokio::test]
async fn test_failed_submit_keeps_draft() {
    let backend = MockBackend::new();
    backend.fail_submits(true);
    let mut overlay = open_overlay(&backend, "U1", &[ReadyToTranscribe, ReadyToTranscribe]).await;

    type_text(&mut overlay, "En kort text.");
    assert_eq!(overlay.submit_current_page().await, SubmitOutcome::Failed);

    let navigator = &overlay.unit().unwrap().navigator;
    assert_eq!(navigator.current_index(), 0);
    let page = navigator.drafts().page(0).unwrap();
    assert!(!page.is_sent);
    assert!(page.unsaved_changes);
    assert_eq!(page.fields.text, "En kort text.");

    backend.fail_submits(false);
    assert_eq!(overlay.can_submit(), Ok(()));
    assert_eq!(
        overlay.submit_current_page().await,
        SubmitOutcome::Accepted { moved_to: Some(1) }
    );
}

#[tokio::test]
async fn test_contributor_carries_across_pages() {
    let backend = MockBackend::new();
    let mut overlay = open_overlay(&backend, "U1", &[ReadyToTranscribe, ReadyToTranscribe]).await;

    let fields = overlay.navigator_mut().unwrap().fields_mut();
    fields.set_text(FieldName::ContributorName, " Anna ").unwrap();
    fields
        .set_text(FieldName::ContributorEmail, "anna@example.org")
        .unwrap();
    type_text(&mut overlay, "Första sidans text.");
    overlay.submit_current_page().await;

    type_text(&mut overlay, "Andra sidans text.");
    overlay.submit_current_page().await;

    let submissions = backend.submissions();
    assert_eq!(submissions.len(), 2);
    for submission in &submissions {
        assert_eq!(submission.contributor_name.as_deref(), Some("Anna"));
        assert_eq!(
            submission.contributor_email.as_deref(),
            Some("anna@example.org")
        );
    }
}

#[tokio::test]
async fn test_informant_fields_sent_only_for_forms() {
    for (kind, expected) in [
        (UnitKind::StructuredForm, Some("Karin Persson")),
        (UnitKind::PageBased, None),
    ] {
        let backend = MockBackend::new();
        let mut signal = start_signal("U1", &[ReadyToTranscribe]);
        signal.transcription_type = kind;
        let mut overlay = OverlayLifecycle::new(coordinator_with(&backend));
        assert!(overlay.open(signal, &never_confirm).await);

        type_text(&mut overlay, "En kort text.");
        overlay
            .navigator_mut()
            .unwrap()
            .fields_mut()
            .set_text(FieldName::InformantName, "Karin Persson")
            .unwrap();
        assert_eq!(
            overlay.submit_current_page().await,
            SubmitOutcome::Accepted { moved_to: None }
        );

        let submissions = backend.submissions();
        assert_eq!(submissions[0].informant_name.as_deref(), expected, "{kind}");
    }
}

#[tokio::test]
async fn test_submit_and_close_ends_session() {
    let backend = MockBackend::new();
    let mut overlay = open_overlay(&backend, "U1", &[ReadyToTranscribe]).await;

    type_text(&mut overlay, "En kort text.");
    let outcome = overlay.submit_and_close(&panic_if_asked).await;

    assert_eq!(outcome, SubmitOutcome::Accepted { moved_to: None });
    assert!(!overlay.is_open());
    assert_eq!(backend.cancel_calls(), 1);
    assert!(!backend.is_locked("U1"));
}

// =============================================================================
// Closing
// =============================================================================

#[tokio::test]
async fn test_declined_close_keeps_session() {
    let backend = MockBackend::new();
    let mut overlay = open_overlay(&backend, "U1", &[ReadyToTranscribe, ReadyToTranscribe]).await;

    type_text(&mut overlay, "Ett halvfärdigt utkast");
    assert!(!overlay.close(CloseReason::CloseButton, &never_confirm).await);

    assert!(overlay.is_open());
    assert_eq!(backend.cancel_calls(), 0);
    assert!(backend.is_locked("U1"));
    assert_eq!(overlay.unit().unwrap().navigator.drafts().unsaved_count(), 1);

    assert!(overlay.close(CloseReason::CloseButton, &always_confirm).await);
    assert!(!overlay.is_open());
    assert_eq!(backend.cancel_calls(), 1);
    assert!(!backend.is_locked("U1"));
}

#[tokio::test]
async fn test_hide_signal_closes_without_prompt_when_clean() {
    let backend = MockBackend::new();
    let mut overlay = open_overlay(&backend, "U1", &[ReadyToTranscribe]).await;

    assert!(!overlay.handle(InboundSignal::Hide, &panic_if_asked).await);
    assert_eq!(backend.cancel_calls(), 1);

    // Closing again is a no-op
    assert!(overlay.close(CloseReason::HideSignal, &panic_if_asked).await);
    assert_eq!(backend.cancel_calls(), 1);
}

#[tokio::test]
async fn test_start_signal_replaces_open_unit() {
    let backend = MockBackend::new();
    let mut overlay = open_overlay(&backend, "U1", &[ReadyToTranscribe]).await;

    type_text(&mut overlay, "Ett halvfärdigt utkast");
    let replaced = overlay
        .handle(
            InboundSignal::StartSession(start_signal("U2", &[ReadyToTranscribe])),
            &never_confirm,
        )
        .await;
    assert!(replaced, "overlay stays open");
    assert_eq!(overlay.unit().unwrap().id, "U1", "declined: current unit kept");
    assert_eq!(backend.start_calls(), 1);

    overlay
        .handle(
            InboundSignal::StartSession(start_signal("U2", &[ReadyToTranscribe])),
            &always_confirm,
        )
        .await;
    assert_eq!(overlay.unit().unwrap().id, "U2");
    assert!(!backend.is_locked("U1"));
    assert!(backend.is_locked("U2"));
}

#[tokio::test]
async fn test_dropping_open_overlay_releases_lock() {
    let backend = MockBackend::new();
    let coordinator = coordinator_with(&backend);
    let mut events = coordinator.events().subscribe();

    let mut overlay = OverlayLifecycle::new(coordinator);
    overlay
        .open(start_signal("U1", &[ReadyToTranscribe]), &never_confirm)
        .await;
    drop(overlay);

    tokio::time::timeout(Duration::from_secs(2), async {
        while backend.cancel_calls() == 0 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("cancel should run after drop");
    assert!(!backend.is_locked("U1"));

    let mut saw_dropped = false;
    while let Ok(event) = events.try_recv() {
        if let ScribeEvent::OverlayClosed { reason, .. } = event {
            assert_eq!(reason, CloseReason::Dropped);
            saw_dropped = true;
        }
    }
    assert!(saw_dropped);
}
