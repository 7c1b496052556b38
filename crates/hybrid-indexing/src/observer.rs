//! Commit observer feeding the NRT document queue.
//!
//! Runs on the commit's own thread after the commit completes. It only
//! moves already-built documents into the queue, so the commit never
//! waits on index I/O and never sees an indexing failure.

use std::sync::Arc;

use tracing::{trace, warn};

use hybrid_types::{CommitInfo, RepositoryState};

use crate::queue::DocumentQueue;
use crate::stats::{Counter, StatsSink};

/// Receives a callback for every completed commit.
pub trait Observer: Send + Sync {
    /// `info` is `None` for changes that did not come from a local commit.
    fn content_changed(&self, root: &RepositoryState, info: Option<&CommitInfo>);
}

/// Admit/drop tally for one commit.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CommitOutcome {
    pub admitted: u64,
    pub dropped: u64,
}

impl CommitOutcome {
    pub fn total(&self) -> u64 {
        self.admitted + self.dropped
    }
}

/// Offers the documents attached to each commit to the [`DocumentQueue`].
pub struct CommitObserver {
    queue: Arc<DocumentQueue>,
    stats: Arc<StatsSink>,
}

impl CommitObserver {
    pub fn new(queue: Arc<DocumentQueue>, stats: Arc<StatsSink>) -> Self {
        Self { queue, stats }
    }

    /// Queue the documents of one commit and record the outcome.
    ///
    /// Commits without a context or without attached documents are
    /// ignored and leave the counters untouched.
    pub fn on_commit(&self, info: Option<&CommitInfo>) -> CommitOutcome {
        let Some(info) = info else {
            return CommitOutcome::default();
        };

        // Commits made below the tree API carry no context
        let Some(holder) = info.document_holder() else {
            trace!(session = %info.session_id, "No NRT documents attached to commit");
            return CommitOutcome::default();
        };

        let mut outcome = CommitOutcome::default();
        for doc in holder.nrt_documents() {
            if self.queue.offer(doc.clone()) {
                outcome.admitted += 1;
            } else {
                outcome.dropped += 1;
            }
        }

        self.stats.mark(Counter::Admitted, outcome.admitted);
        self.stats.mark(Counter::Dropped, outcome.dropped);

        if outcome.dropped > 0 {
            let reason = if self.queue.is_closed() {
                "queue closed"
            } else {
                "queue full"
            };
            warn!(
                session = %info.session_id,
                dropped = outcome.dropped,
                admitted = outcome.admitted,
                reason,
                "Dropped docs from NRT indexing"
            );
        }

        outcome
    }

    pub fn queue(&self) -> &Arc<DocumentQueue> {
        &self.queue
    }
}

impl Observer for CommitObserver {
    fn content_changed(&self, _root: &RepositoryState, info: Option<&CommitInfo>) {
        self.on_commit(info);
    }
}

/// Fans one commit notification out to several observers in order.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn Observer>>,
}

impl CompositeObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, observer: Arc<dyn Observer>) {
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl Observer for CompositeObserver {
    fn content_changed(&self, root: &RepositoryState, info: Option<&CommitInfo>) {
        for observer in &self.observers {
            observer.content_changed(root, info);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hybrid_types::{CommitContext, Document, DocumentHolder, Field};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_util::sync::CancellationToken;

    fn setup(capacity: usize) -> (CommitObserver, Arc<DocumentQueue>, Arc<StatsSink>) {
        let queue = Arc::new(DocumentQueue::new(capacity).unwrap());
        let stats = Arc::new(StatsSink::new());
        (
            CommitObserver::new(queue.clone(), stats.clone()),
            queue,
            stats,
        )
    }

    fn commit_with(ids: &[&str]) -> CommitInfo {
        let holder = DocumentHolder::with_documents(
            ids.iter()
                .map(|id| Document::add(*id, vec![Field::text("title", *id)])),
        );
        let mut ctx = CommitContext::new();
        ctx.insert(holder);
        CommitInfo::new("session-1", Some("admin".to_string())).with_context(ctx)
    }

    #[test]
    fn test_missing_commit_info_is_noop() {
        let (observer, queue, stats) = setup(4);

        let outcome = observer.on_commit(None);

        assert_eq!(outcome, CommitOutcome::default());
        assert!(queue.is_empty());
        assert_eq!(stats.snapshot(), Default::default());
    }

    #[test]
    fn test_missing_context_is_noop() {
        let (observer, queue, stats) = setup(4);
        let info = CommitInfo::new("session-1", None);

        observer.on_commit(Some(&info));

        assert!(queue.is_empty());
        assert_eq!(stats.count(Counter::Admitted), 0);
        assert_eq!(stats.count(Counter::Dropped), 0);
    }

    #[test]
    fn test_context_without_holder_is_noop() {
        let (observer, queue, stats) = setup(4);
        let info = CommitInfo::new("session-1", None).with_context(CommitContext::new());

        observer.on_commit(Some(&info));

        assert!(queue.is_empty());
        assert_eq!(stats.count(Counter::Admitted), 0);
    }

    #[test]
    fn test_empty_holder_changes_nothing() {
        let (observer, queue, stats) = setup(4);
        let info = commit_with(&[]);

        let outcome = observer.on_commit(Some(&info));

        assert_eq!(outcome.total(), 0);
        assert!(queue.is_empty());
        assert_eq!(stats.snapshot(), Default::default());
    }

    #[tokio::test]
    async fn test_overflow_is_counted_per_commit() {
        let (observer, queue, stats) = setup(2);
        let info = commit_with(&["A", "B", "C"]);

        let outcome = observer.on_commit(Some(&info));

        assert_eq!(outcome.admitted, 2);
        assert_eq!(outcome.dropped, 1);
        assert_eq!(stats.get("admitted"), Some(2));
        assert_eq!(stats.get("dropped"), Some(1));

        let cancel = CancellationToken::new();
        assert_eq!(queue.take(&cancel).await.unwrap().id(), "A");
        assert_eq!(queue.take(&cancel).await.unwrap().id(), "B");
    }

    #[test]
    fn test_counts_accumulate_across_commits() {
        let (observer, _queue, stats) = setup(3);

        observer.on_commit(Some(&commit_with(&["a", "b"])));
        observer.on_commit(Some(&commit_with(&["c", "d"])));

        assert_eq!(stats.count(Counter::Admitted), 3);
        assert_eq!(stats.count(Counter::Dropped), 1);
    }

    #[test]
    fn test_closed_queue_drops_everything() {
        let (observer, queue, stats) = setup(8);
        queue.close();

        let outcome = observer.on_commit(Some(&commit_with(&["a", "b"])));

        assert_eq!(outcome.dropped, 2);
        assert_eq!(stats.count(Counter::Dropped), 2);
        assert_eq!(stats.count(Counter::Admitted), 0);
    }

    #[test]
    fn test_observer_trait_dispatch() {
        struct CountingObserver(AtomicUsize);

        impl Observer for CountingObserver {
            fn content_changed(&self, _root: &RepositoryState, _info: Option<&CommitInfo>) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let (observer, queue, _stats) = setup(8);
        let counting = Arc::new(CountingObserver(AtomicUsize::new(0)));

        let mut composite = CompositeObserver::new();
        composite.add(Arc::new(observer));
        composite.add(counting.clone());
        assert_eq!(composite.len(), 2);

        let root = RepositoryState::new("r1");
        composite.content_changed(&root, Some(&commit_with(&["x"])));
        composite.content_changed(&root, None);

        assert_eq!(counting.0.load(Ordering::SeqCst), 2);
        assert_eq!(queue.size(), 1);
    }
}
