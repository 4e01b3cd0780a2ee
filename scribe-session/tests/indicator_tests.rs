//! Advisory concurrency indicator tests

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use helpers::{coordinator_with, MockBackend};
use scribe_session::{Affordance, ConcurrencyIndicator};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_affordance_follows_server_flag() {
    let backend = MockBackend::new();
    let other = MockBackend::sharing(&backend);
    let mine = coordinator_with(&backend);
    let theirs = coordinator_with(&other);
    let indicator = ConcurrencyIndicator::new(Arc::clone(&mine));

    assert_eq!(indicator.check("SEG-7").await, Affordance::StartContributing);

    theirs.start("SEG-7").await.unwrap();
    assert_eq!(indicator.check("SEG-7").await, Affordance::OngoingElsewhere);

    theirs.cancel("SEG-7").await;
    mine.start("SEG-7").await.unwrap();
    assert_eq!(indicator.check("SEG-7").await, Affordance::OwnSession);
}

#[tokio::test]
async fn test_unreadable_flag_counts_as_free() {
    let backend = MockBackend::new();
    coordinator_with(&MockBackend::sharing(&backend))
        .start("SEG-7")
        .await
        .unwrap();
    backend.fail_status_reads(true);

    let indicator = ConcurrencyIndicator::new(coordinator_with(&backend));
    let flag = indicator.read("SEG-7").await;
    assert!(!flag.server_has_ongoing_session);
    assert_eq!(indicator.check("SEG-7").await, Affordance::StartContributing);
}

#[tokio::test]
async fn test_flag_is_advisory_only() {
    let backend = MockBackend::new();
    let other = MockBackend::sharing(&backend);
    let coordinator = coordinator_with(&backend);
    let indicator = ConcurrencyIndicator::new(Arc::clone(&coordinator));

    // Reads "free", then someone else wins the race: the start is still refused
    assert_eq!(indicator.check("U1").await, Affordance::StartContributing);
    coordinator_with(&other).start("U1").await.unwrap();
    assert!(coordinator.start("U1").await.is_err());
}

#[tokio::test]
async fn test_watch_publishes_changes_until_cancelled() {
    let backend = MockBackend::new();
    let other = coordinator_with(&MockBackend::sharing(&backend));
    let indicator = Arc::new(ConcurrencyIndicator::new(coordinator_with(&backend)));
    let cancel = CancellationToken::new();

    let mut rx = indicator.watch("SEG-7", Duration::from_millis(10), cancel.clone());
    assert!(!rx.borrow().server_has_ongoing_session);

    other.start("SEG-7").await.unwrap();
    tokio::time::timeout(Duration::from_secs(2), rx.changed())
        .await
        .expect("flag change within timeout")
        .unwrap();
    assert!(rx.borrow_and_update().server_has_ongoing_session);

    other.cancel("SEG-7").await;
    tokio::time::timeout(Duration::from_secs(2), rx.changed())
        .await
        .expect("flag change within timeout")
        .unwrap();
    assert!(!rx.borrow_and_update().server_has_ongoing_session);

    cancel.cancel();
    // The poller drops its sender once it stops
    let closed = tokio::time::timeout(Duration::from_secs(2), async {
        while rx.changed().await.is_ok() {}
    })
    .await;
    assert!(closed.is_ok());
    let calls = backend.status_calls();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(backend.status_calls(), calls, "no reads after cancellation");
}
