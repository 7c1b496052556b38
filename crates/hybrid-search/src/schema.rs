//! Tantivy schema for the live index.
//!
//! Repository documents carry arbitrary field names, so the live index
//! folds them into a fixed schema:
//! - analyzed fields feed one `fulltext` field
//! - verbatim indexed fields become `name:value` terms in `keywords`
//! - stored fields are kept as a JSON payload in `stored`

use tantivy::schema::{Field, Schema, STORED, STRING, TEXT};

/// Schema field handles for efficient access
#[derive(Debug, Clone)]
pub struct LiveSchema {
    schema: Schema,
    /// Primary key: repository item id (STRING | STORED)
    pub id: Field,
    /// Analyzed text of all tokenized fields (TEXT)
    pub fulltext: Field,
    /// `name:value` terms of verbatim fields (STRING)
    pub keywords: Field,
    /// JSON encoded stored fields (STORED)
    pub stored: Field,
}

impl LiveSchema {
    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

/// Build the live index schema.
pub fn build_live_schema() -> LiveSchema {
    let mut builder = Schema::builder();

    let id = builder.add_text_field("id", STRING | STORED);
    let fulltext = builder.add_text_field("fulltext", TEXT);
    let keywords = builder.add_text_field("keywords", STRING);
    let stored = builder.add_text_field("stored", STORED);

    LiveSchema {
        schema: builder.build(),
        id,
        fulltext,
        keywords,
        stored,
    }
}
