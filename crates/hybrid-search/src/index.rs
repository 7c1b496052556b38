//! In-memory Tantivy index serving as the live NRT index.
//!
//! Writes go through one shared `IndexWriter`. Nothing written becomes
//! visible until [`LiveIndex::refresh`] commits and reloads the reader,
//! which the consumer does after every batch.

use std::sync::{Mutex, MutexGuard};

use tantivy::collector::TopDocs;
use tantivy::query::{QueryParser, TermQuery};
use tantivy::schema::{IndexRecordOption, Value};
use tantivy::{DocAddress, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tracing::{debug, info};

use hybrid_indexing::{IndexingError, LiveIndex};
use hybrid_types::{Field, Settings};

use crate::document::{fields_to_doc, keyword_term, stored_fields};
use crate::error::SearchError;
use crate::schema::{build_live_schema, LiveSchema};

/// Default memory budget for the single writer thread (15MB, Tantivy's minimum)
const DEFAULT_WRITER_MEMORY_MB: usize = 15;

/// Live index configuration
#[derive(Debug, Clone)]
pub struct LiveIndexConfig {
    /// Name used in logs
    pub name: String,
    /// Memory budget for writer in MB
    pub writer_memory_mb: usize,
}

impl Default for LiveIndexConfig {
    fn default() -> Self {
        Self {
            name: "live".to_string(),
            writer_memory_mb: DEFAULT_WRITER_MEMORY_MB,
        }
    }
}

impl LiveIndexConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn from_settings(name: impl Into<String>, settings: &Settings) -> Self {
        Self::new(name).with_memory_mb(settings.writer_memory_mb)
    }

    pub fn with_memory_mb(mut self, mb: usize) -> Self {
        self.writer_memory_mb = mb.max(DEFAULT_WRITER_MEMORY_MB);
        self
    }
}

/// A search hit from the live index.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: String,
    pub score: f32,
}

/// RAM-backed live index.
pub struct LiveSearchIndex {
    index: Index,
    schema: LiveSchema,
    writer: Mutex<IndexWriter>,
    reader: IndexReader,
    config: LiveIndexConfig,
}

impl LiveSearchIndex {
    /// Create an empty index held entirely in memory.
    pub fn create_in_ram(config: LiveIndexConfig) -> Result<Self, SearchError> {
        let schema = build_live_schema();
        let index = Index::create_in_ram(schema.schema().clone());

        let memory_budget = config.writer_memory_mb * 1024 * 1024;
        let writer: IndexWriter = index.writer_with_num_threads(1, memory_budget)?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;

        info!(
            name = %config.name,
            memory_mb = config.writer_memory_mb,
            "Created live index"
        );

        Ok(Self {
            index,
            schema,
            writer: Mutex::new(writer),
            reader,
            config,
        })
    }

    pub fn schema(&self) -> &LiveSchema {
        &self.schema
    }

    fn writer(&self) -> Result<MutexGuard<'_, IndexWriter>, SearchError> {
        self.writer
            .lock()
            .map_err(|e| SearchError::IndexLocked(e.to_string()))
    }

    fn index_upsert(&self, id: &str, fields: &[Field]) -> Result<(), SearchError> {
        let doc = fields_to_doc(&self.schema, id, fields)?;
        let writer = self.writer()?;

        // Replace whatever is indexed under the same id
        writer.delete_term(Term::from_field_text(self.schema.id, id));
        writer.add_document(doc)?;

        debug!(id, fields = fields.len(), "Upserted live document");
        Ok(())
    }

    fn index_delete(&self, id: &str) -> Result<(), SearchError> {
        let writer = self.writer()?;
        writer.delete_term(Term::from_field_text(self.schema.id, id));

        debug!(id, "Deleted live document");
        Ok(())
    }

    /// Commit pending writes and reopen the reader.
    pub fn commit_and_reload(&self) -> Result<u64, SearchError> {
        let opstamp = self.writer()?.commit()?;
        self.reader.reload()?;
        debug!(opstamp, "Refreshed live index");
        Ok(opstamp)
    }

    /// Full-text search over analyzed fields.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, SearchError> {
        if query.trim().is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let parser = QueryParser::for_index(&self.index, vec![self.schema.fulltext]);
        let query = parser.parse_query(query)?;

        let searcher = self.reader.searcher();
        let top_docs = searcher.search(&query, &TopDocs::with_limit(limit))?;

        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            if let Some(id) = self.id_of(&searcher, address)? {
                hits.push(SearchHit { id, score });
            }
        }
        Ok(hits)
    }

    /// Exact match on a verbatim field.
    pub fn find_by_keyword(
        &self,
        name: &str,
        value: &hybrid_types::FieldValue,
        limit: usize,
    ) -> Result<Vec<String>, SearchError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let term = Term::from_field_text(self.schema.keywords, &keyword_term(name, value));
        let query = TermQuery::new(term, IndexRecordOption::Basic);

        let searcher = self.reader.searcher();
        let top_docs = searcher.search(&query, &TopDocs::with_limit(limit))?;

        let mut ids = Vec::with_capacity(top_docs.len());
        for (_score, address) in top_docs {
            if let Some(id) = self.id_of(&searcher, address)? {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    /// Stored fields of the visible entry for `id`.
    pub fn get(&self, id: &str) -> Result<Option<Vec<Field>>, SearchError> {
        let term = Term::from_field_text(self.schema.id, id);
        let query = TermQuery::new(term, IndexRecordOption::Basic);

        let searcher = self.reader.searcher();
        let top_docs = searcher.search(&query, &TopDocs::with_limit(1))?;

        let Some((_score, address)) = top_docs.into_iter().next() else {
            return Ok(None);
        };

        let doc: TantivyDocument = searcher.doc(address)?;
        let payload = doc
            .get_first(self.schema.stored)
            .and_then(|v| v.as_str())
            .unwrap_or("[]");

        Ok(Some(stored_fields(payload)?))
    }

    /// Number of visible documents.
    pub fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }

    fn id_of(
        &self,
        searcher: &tantivy::Searcher,
        address: DocAddress,
    ) -> Result<Option<String>, SearchError> {
        let doc: TantivyDocument = searcher.doc(address)?;
        Ok(doc
            .get_first(self.schema.id)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string()))
    }
}

impl LiveIndex for LiveSearchIndex {
    fn upsert(&self, id: &str, fields: &[Field]) -> Result<(), IndexingError> {
        Ok(self.index_upsert(id, fields)?)
    }

    fn delete(&self, id: &str) -> Result<(), IndexingError> {
        Ok(self.index_delete(id)?)
    }

    fn refresh(&self) -> Result<(), IndexingError> {
        self.commit_and_reload()?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.config.name
    }
}
