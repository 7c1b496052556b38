//! End-to-end test infrastructure for the hybrid NRT pipeline.
//!
//! Provides a shared TestHarness that wires a real in-memory live index
//! to a running pipeline, plus index wrappers that stall or fail on
//! demand so tests can drive the pipeline into overflow and error paths.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use hybrid_indexing::{CommitOutcome, HybridPipeline, IndexingError, LiveIndex, ShutdownReport};
use hybrid_search::{LiveIndexConfig, LiveSearchIndex};
use hybrid_types::{CommitContext, CommitInfo, Document, DocumentHolder, Field, Settings};

/// How often wait helpers poll the live index.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Shared test harness for E2E tests.
///
/// Owns the live index and the pipeline feeding it. Must be created
/// inside a tokio runtime since starting the pipeline spawns workers.
pub struct TestHarness {
    /// Searchable live index
    pub index: Arc<LiveSearchIndex>,
    /// Running pipeline
    pub pipeline: HybridPipeline,
}

impl TestHarness {
    /// Start a pipeline with default settings over a fresh live index.
    pub fn new() -> anyhow::Result<Self> {
        Self::with_settings(Settings::default())
    }

    pub fn with_settings(settings: Settings) -> anyhow::Result<Self> {
        let index = Arc::new(LiveSearchIndex::create_in_ram(
            LiveIndexConfig::from_settings("e2e", &settings),
        )?);
        Self::with_index(settings, index.clone(), index)
    }

    /// Start a pipeline whose consumer writes through `writer`.
    ///
    /// `writer` usually wraps `index` to inject stalls or failures while
    /// `index` stays reachable for assertions.
    pub fn with_index(
        settings: Settings,
        index: Arc<LiveSearchIndex>,
        writer: Arc<dyn LiveIndex>,
    ) -> anyhow::Result<Self> {
        hybrid_types::init_tracing(&settings.log_level);
        let pipeline = HybridPipeline::start(&settings, writer)?;
        Ok(Self { index, pipeline })
    }

    /// Notify the pipeline of a commit carrying `docs`.
    pub fn commit(&self, docs: Vec<Document>) -> CommitOutcome {
        self.pipeline.observer().on_commit(Some(&commit_info(docs)))
    }

    /// Wait until `check` holds for the live index or `timeout` expires.
    pub async fn wait_until<F>(&self, timeout: Duration, check: F) -> bool
    where
        F: Fn(&LiveSearchIndex) -> bool,
    {
        let deadline = Instant::now() + timeout;
        loop {
            if check(&self.index) {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Wait until the live index shows exactly `expected` documents.
    pub async fn wait_for_docs(&self, expected: u64, timeout: Duration) -> bool {
        self.wait_until(timeout, |index| index.num_docs() == expected)
            .await
    }

    pub async fn shutdown(self) -> ShutdownReport {
        self.pipeline.shutdown().await
    }
}

/// Build commit metadata with `docs` attached to its context.
pub fn commit_info(docs: Vec<Document>) -> CommitInfo {
    let mut context = CommitContext::new();
    context.insert(DocumentHolder::with_documents(docs));
    CommitInfo::new("e2e-session", Some("admin".to_string())).with_context(context)
}

/// An added page with a searchable title.
pub fn page(id: &str, title: &str) -> Document {
    Document::add(id, page_fields(title))
}

pub fn page_fields(title: &str) -> Vec<Field> {
    vec![Field::text("title", title), Field::keyword("type", "page")]
}

/// Create N pages under `/content/<prefix>-<i>` titled with `word`.
pub fn create_pages(prefix: &str, count: usize, word: &str) -> Vec<Document> {
    (0..count)
        .map(|i| page(&format!("/content/{}-{}", prefix, i), &format!("{} {}", word, i)))
        .collect()
}

/// Live index wrapper that sleeps before every write.
pub struct StalledIndex {
    inner: Arc<dyn LiveIndex>,
    delay: Duration,
}

impl StalledIndex {
    pub fn new(inner: Arc<dyn LiveIndex>, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

impl LiveIndex for StalledIndex {
    fn upsert(&self, id: &str, fields: &[Field]) -> Result<(), IndexingError> {
        std::thread::sleep(self.delay);
        self.inner.upsert(id, fields)
    }

    fn delete(&self, id: &str) -> Result<(), IndexingError> {
        std::thread::sleep(self.delay);
        self.inner.delete(id)
    }

    fn refresh(&self) -> Result<(), IndexingError> {
        self.inner.refresh()
    }

    fn name(&self) -> &str {
        "stalled"
    }
}

/// Live index wrapper that rejects writes for chosen ids.
pub struct FailingIndex {
    inner: Arc<dyn LiveIndex>,
    fail_ids: HashSet<String>,
}

impl FailingIndex {
    pub fn new<I, S>(inner: Arc<dyn LiveIndex>, fail_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inner,
            fail_ids: fail_ids.into_iter().map(Into::into).collect(),
        }
    }

    fn check(&self, id: &str) -> Result<(), IndexingError> {
        if self.fail_ids.contains(id) {
            return Err(IndexingError::Index(format!("rejected {}", id)));
        }
        Ok(())
    }
}

impl LiveIndex for FailingIndex {
    fn upsert(&self, id: &str, fields: &[Field]) -> Result<(), IndexingError> {
        self.check(id)?;
        self.inner.upsert(id, fields)
    }

    fn delete(&self, id: &str) -> Result<(), IndexingError> {
        self.check(id)?;
        self.inner.delete(id)
    }

    fn refresh(&self) -> Result<(), IndexingError> {
        self.inner.refresh()
    }

    fn name(&self) -> &str {
        "failing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_info_carries_documents() {
        let info = commit_info(create_pages("a", 3, "alpha"));
        let holder = info.document_holder().unwrap();
        assert_eq!(holder.len(), 3);
        assert_eq!(holder.nrt_documents()[2].id(), "/content/a-2");
    }

    #[tokio::test]
    async fn test_harness_starts_and_stops() {
        let harness = TestHarness::new().unwrap();
        assert_eq!(harness.index.num_docs(), 0);

        let report = harness.shutdown().await;
        assert_eq!(report.total_applied(), 0);
        assert_eq!(report.discarded, 0);
    }
}
