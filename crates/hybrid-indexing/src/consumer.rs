//! Background consumer applying queued documents to the live index.
//!
//! A fixed pool of tokio tasks drains the [`DocumentQueue`]. Each worker
//! applies its batch in dequeue order on the blocking pool, then asks the
//! index to refresh. A document the engine rejects is logged, counted as
//! `apply-failed` and skipped; the worker keeps going.
//!
//! Shutdown closes the queue (no more admissions), wakes every worker,
//! optionally drains leftovers for a grace period and discards the rest.
//! The batch in flight when the grace period ends stops at the next
//! document and is always awaited, so nothing writes to the index after
//! shutdown returns.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use hybrid_types::{Document, Settings};

use crate::error::IndexingError;
use crate::live_index::{apply_document, ApplyResult, LiveIndex};
use crate::queue::DocumentQueue;
use crate::stats::{Counter, StatsSink};

/// Configuration for the consumer pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumerConfig {
    /// Number of worker tasks (default: 1)
    ///
    /// Documents are applied in dequeue order per worker. With more than
    /// one worker, batches taken by different workers may interleave.
    pub worker_count: usize,

    /// Maximum documents applied per wakeup (default: 100)
    pub batch_size: usize,

    /// Time allowed to drain leftovers on shutdown in ms (default: 0)
    pub shutdown_grace_ms: u64,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            worker_count: 1,
            batch_size: 100,
            shutdown_grace_ms: 0,
        }
    }
}

impl ConsumerConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            worker_count: settings.worker_count,
            batch_size: settings.batch_size,
            shutdown_grace_ms: settings.shutdown_grace_ms,
        }
    }

    pub fn with_worker_count(mut self, count: usize) -> Self {
        self.worker_count = count;
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace_ms = u64::try_from(grace.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    pub fn validate(&self) -> Result<(), IndexingError> {
        if self.worker_count == 0 {
            return Err(IndexingError::Config("worker_count must be > 0".to_string()));
        }
        if self.batch_size == 0 {
            return Err(IndexingError::Config("batch_size must be > 0".to_string()));
        }
        Ok(())
    }
}

/// What happened to queued documents over the consumer's lifetime.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Applied by workers while running
    pub applied: ApplyResult,
    /// Applied during the shutdown grace period
    pub drained: ApplyResult,
    /// Never applied: still queued, or cut off by the grace deadline
    pub discarded: usize,
    /// Workers that ended abnormally
    pub worker_errors: usize,
}

impl ShutdownReport {
    /// All documents that reached the engine successfully.
    pub fn total_applied(&self) -> usize {
        self.applied.applied() + self.drained.applied()
    }

    pub fn total_failed(&self) -> usize {
        self.applied.failed + self.drained.failed
    }
}

/// Owner of the live index write path.
pub struct IndexingConsumer {
    queue: Arc<DocumentQueue>,
    index: Arc<dyn LiveIndex>,
    stats: Arc<StatsSink>,
    config: ConsumerConfig,
}

impl IndexingConsumer {
    /// # Errors
    ///
    /// Returns `IndexingError::Config` for a zero worker count or batch size.
    pub fn new(
        queue: Arc<DocumentQueue>,
        index: Arc<dyn LiveIndex>,
        stats: Arc<StatsSink>,
        config: ConsumerConfig,
    ) -> Result<Self, IndexingError> {
        config.validate()?;
        Ok(Self {
            queue,
            index,
            stats,
            config,
        })
    }

    /// Spawn the worker pool on the current tokio runtime.
    pub fn start(self) -> ConsumerHandle {
        let shutdown = CancellationToken::new();

        let workers = (0..self.config.worker_count)
            .map(|worker| {
                tokio::spawn(run_worker(
                    worker,
                    self.queue.clone(),
                    self.index.clone(),
                    self.stats.clone(),
                    self.config.batch_size,
                    shutdown.clone(),
                ))
            })
            .collect();

        info!(
            index = %self.index.name(),
            workers = self.config.worker_count,
            batch_size = self.config.batch_size,
            "NRT consumer started"
        );

        ConsumerHandle {
            queue: self.queue,
            index: self.index,
            stats: self.stats,
            config: self.config,
            shutdown,
            workers,
        }
    }
}

/// Handle to a running consumer pool.
pub struct ConsumerHandle {
    queue: Arc<DocumentQueue>,
    index: Arc<dyn LiveIndex>,
    stats: Arc<StatsSink>,
    config: ConsumerConfig,
    shutdown: CancellationToken,
    workers: Vec<JoinHandle<ApplyResult>>,
}

impl ConsumerHandle {
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// True once every worker task has exited.
    pub fn is_finished(&self) -> bool {
        self.workers.iter().all(|w| w.is_finished())
    }

    /// Stop the pool.
    ///
    /// Closes the queue, wakes and joins the workers, drains what is left
    /// for up to the configured grace period and discards the remainder
    /// (counted as `dropped`). Every document left at shutdown ends up in
    /// exactly one of `drained` or `discarded`. Never fails; problems are
    /// logged.
    pub async fn shutdown(self) -> ShutdownReport {
        info!(pending = self.queue.size(), "Initiating NRT consumer shutdown");

        self.queue.close();
        self.shutdown.cancel();

        let mut report = ShutdownReport::default();

        for worker in self.workers {
            match worker.await {
                Ok(result) => report.applied.merge(&result),
                Err(e) => {
                    error!(error = %e, "NRT consumer worker ended abnormally");
                    report.worker_errors += 1;
                }
            }
        }

        let grace = self.config.shutdown_grace();
        if !grace.is_zero() && !self.queue.is_empty() {
            let deadline = Instant::now().checked_add(grace);
            let mut drained = ApplyResult::new();
            let mut cut_short = 0;

            while deadline.is_none_or(|d| Instant::now() < d) {
                let batch = self.queue.drain(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }
                let count = batch.len();
                let result =
                    apply_batch(self.index.clone(), self.stats.clone(), batch, deadline).await;
                cut_short += count - result.total();
                drained.merge(&result);
            }

            if cut_short > 0 || !self.queue.is_empty() {
                warn!(
                    grace_ms = self.config.shutdown_grace_ms,
                    "Shutdown grace period elapsed before queue was drained"
                );
            }
            report.drained = drained;
            report.discarded += cut_short;
        }

        report.discarded += self.queue.seal().await.len();
        if report.discarded > 0 {
            self.stats.mark(Counter::Dropped, report.discarded as u64);
            warn!(
                discarded = report.discarded,
                "Discarded queued documents at shutdown"
            );
        }

        info!(
            applied = report.total_applied(),
            failed = report.total_failed(),
            discarded = report.discarded,
            "NRT consumer shutdown complete"
        );

        report
    }
}

async fn run_worker(
    worker: usize,
    queue: Arc<DocumentQueue>,
    index: Arc<dyn LiveIndex>,
    stats: Arc<StatsSink>,
    batch_size: usize,
    shutdown: CancellationToken,
) -> ApplyResult {
    debug!(worker, index = %index.name(), "NRT worker started");

    let mut total = ApplyResult::new();
    loop {
        let batch = queue.take_batch(batch_size, &shutdown).await;
        if batch.is_empty() {
            break;
        }
        let result = apply_batch(index.clone(), stats.clone(), batch, None).await;
        total.merge(&result);
    }

    debug!(
        worker,
        applied = total.applied(),
        failed = total.failed,
        "NRT worker stopped"
    );
    total
}

/// Apply a batch on the blocking pool.
///
/// With a `deadline`, documents not started before it are left out of the
/// result; callers count them from `batch.len() - result.total()`.
async fn apply_batch(
    index: Arc<dyn LiveIndex>,
    stats: Arc<StatsSink>,
    batch: Vec<Arc<Document>>,
    deadline: Option<Instant>,
) -> ApplyResult {
    let count = batch.len();
    let task_stats = stats.clone();

    match tokio::task::spawn_blocking(move || {
        apply_batch_blocking(index.as_ref(), &task_stats, &batch, deadline)
    })
    .await
    {
        Ok(result) => result,
        Err(e) => {
            // Only reachable when the runtime is shutting down
            error!(error = %e, count, "Live index apply task failed");
            stats.mark(Counter::ApplyFailed, count as u64);
            ApplyResult {
                failed: count,
                ..ApplyResult::default()
            }
        }
    }
}

fn apply_batch_blocking(
    index: &dyn LiveIndex,
    stats: &StatsSink,
    batch: &[Arc<Document>],
    deadline: Option<Instant>,
) -> ApplyResult {
    let mut result = ApplyResult::new();

    for doc in batch {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }

        match catch_unwind(AssertUnwindSafe(|| apply_document(index, doc))) {
            Ok(Ok(())) => result.record_success(doc.source()),
            Ok(Err(e)) => {
                warn!(
                    index = %index.name(),
                    id = %doc.id(),
                    source = %doc.source(),
                    transient = e.is_transient(),
                    error = %e,
                    "Failed to apply document to live index"
                );
                result.record_failure();
            }
            Err(payload) => {
                error!(
                    index = %index.name(),
                    id = %doc.id(),
                    source = %doc.source(),
                    panic = %panic_message(payload.as_ref()),
                    "Live index panicked while applying document"
                );
                result.record_failure();
            }
        }
    }

    stats.mark(Counter::ApplyFailed, result.failed as u64);

    if result.has_updates() {
        match catch_unwind(AssertUnwindSafe(|| index.refresh())) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(index = %index.name(), error = %e, "Live index refresh failed");
            }
            Err(payload) => {
                error!(
                    index = %index.name(),
                    panic = %panic_message(payload.as_ref()),
                    "Live index panicked during refresh"
                );
            }
        }
    }

    debug!(
        index = %index.name(),
        upserted = result.upserted,
        deleted = result.deleted,
        failed = result.failed,
        skipped = batch.len() - result.total(),
        "Applied batch"
    );
    result
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        *msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic"
    }
}
