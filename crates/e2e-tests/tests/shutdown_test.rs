//! Shutdown E2E tests.
//!
//! Shutdown closes admissions, stops the workers and either drains or
//! discards what is still queued. Discarded documents count as dropped.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;

use e2e_tests::{create_pages, StalledIndex, TestHarness};
use hybrid_search::{LiveIndexConfig, LiveSearchIndex};
use hybrid_types::Settings;

fn harness(grace_ms: u64) -> TestHarness {
    let settings = Settings {
        shutdown_grace_ms: grace_ms,
        ..Settings::default()
    };
    let index = Arc::new(LiveSearchIndex::create_in_ram(LiveIndexConfig::new("nrt")).unwrap());
    let writer = Arc::new(StalledIndex::new(index.clone(), Duration::from_millis(5)));
    TestHarness::with_index(settings, index, writer).unwrap()
}

// Current-thread runtime: workers never get to run between the commit
// and shutdown, so everything is still queued when shutdown starts.
#[tokio::test]
async fn test_shutdown_without_grace_discards_queued() {
    let harness = harness(0);
    let index = harness.index.clone();
    let stats = harness.pipeline.stats().clone();
    let queue = harness.pipeline.queue().clone();

    let outcome = harness.commit(create_pages("late", 5, "late"));
    assert_eq!(outcome.admitted, 5);

    let report = harness.shutdown().await;
    assert_eq!(report.discarded, 5);
    assert_eq!(report.total_applied(), 0);
    assert_eq!(report.worker_errors, 0);

    let snapshot = stats.snapshot();
    assert_eq!(snapshot.admitted, 5);
    assert_eq!(snapshot.dropped, 5);

    assert!(queue.is_closed());
    assert!(queue.is_empty());
    assert_eq!(index.num_docs(), 0);
}

#[tokio::test]
async fn test_shutdown_with_grace_drains_queued() {
    let harness = harness(10_000);
    let index = harness.index.clone();
    let stats = harness.pipeline.stats().clone();

    harness.commit(create_pages("late", 5, "late"));

    let report = harness.shutdown().await;
    assert_eq!(report.discarded, 0);
    assert_eq!(report.drained.applied(), 5);
    assert_eq!(report.total_applied(), 5);

    assert_eq!(stats.snapshot().dropped, 0);
    assert_eq!(index.num_docs(), 5);
}

#[tokio::test]
async fn test_commits_after_shutdown_are_dropped() {
    let harness = harness(0);
    let observer = harness.pipeline.observer();
    let stats = harness.pipeline.stats().clone();

    harness.shutdown().await;

    let info = e2e_tests::commit_info(create_pages("after", 3, "after"));
    let outcome = observer.on_commit(Some(&info));
    assert_eq!(outcome.admitted, 0);
    assert_eq!(outcome.dropped, 3);
    assert_eq!(stats.snapshot().dropped, 3);
}
