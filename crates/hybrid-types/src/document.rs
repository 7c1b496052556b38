//! Document type handed from the commit path to the live index.
//!
//! A document is built once by the commit-time document builder and is
//! never mutated afterwards. It travels through the queue as an
//! `Arc<Document>` so producers and consumers share it without copying.

use serde::{Deserialize, Serialize};

/// How a document affects the live index entry keyed by its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentSource {
    /// A newly created item
    Add,
    /// An existing item whose content changed
    Update,
    /// The item was removed; only the id is meaningful
    Delete,
}

impl DocumentSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentSource::Add => "add",
            DocumentSource::Update => "update",
            DocumentSource::Delete => "delete",
        }
    }

    /// True for sources that replace the entry rather than remove it.
    pub fn is_upsert(&self) -> bool {
        matches!(self, DocumentSource::Add | DocumentSource::Update)
    }
}

impl std::fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed value of a single field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    Long(i64),
    Double(f64),
    Boolean(bool),
}

impl FieldValue {
    /// Render the value as it is fed to a full-text analyzer.
    pub fn to_text(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Long(v) => v.to_string(),
            FieldValue::Double(v) => v.to_string(),
            FieldValue::Boolean(v) => v.to_string(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Indexing options attached to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOptions {
    /// Field takes part in queries
    pub indexed: bool,
    /// Field value can be read back from the index
    pub stored: bool,
    /// Field is run through the analyzer (full text) instead of kept verbatim
    pub tokenized: bool,
}

impl Default for FieldOptions {
    fn default() -> Self {
        Self {
            indexed: true,
            stored: true,
            tokenized: true,
        }
    }
}

impl FieldOptions {
    /// Indexed verbatim, not analyzed (property values, paths).
    pub fn keyword() -> Self {
        Self {
            indexed: true,
            stored: true,
            tokenized: false,
        }
    }

    /// Kept for retrieval only.
    pub fn stored_only() -> Self {
        Self {
            indexed: false,
            stored: true,
            tokenized: false,
        }
    }
}

/// A (name, value, options) triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: FieldValue,
    #[serde(default)]
    pub options: FieldOptions,
}

impl Field {
    pub fn new(name: impl Into<String>, value: FieldValue, options: FieldOptions) -> Self {
        Self {
            name: name.into(),
            value,
            options,
        }
    }

    /// Analyzed full-text field.
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, FieldValue::Text(value.into()), FieldOptions::default())
    }

    /// Verbatim keyword field.
    pub fn keyword(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, FieldValue::Text(value.into()), FieldOptions::keyword())
    }

    pub fn long(name: impl Into<String>, value: i64) -> Self {
        Self::new(name, FieldValue::Long(value), FieldOptions::keyword())
    }
}

/// An indexable record for one repository item.
///
/// Fields are private so a document cannot change once it has been
/// handed to the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    id: String,
    fields: Vec<Field>,
    source: DocumentSource,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Vec<Field>, source: DocumentSource) -> Self {
        Self {
            id: id.into(),
            fields,
            source,
        }
    }

    /// Document for a newly created item.
    pub fn add(id: impl Into<String>, fields: Vec<Field>) -> Self {
        Self::new(id, fields, DocumentSource::Add)
    }

    /// Document replacing the existing entry for `id`.
    pub fn update(id: impl Into<String>, fields: Vec<Field>) -> Self {
        Self::new(id, fields, DocumentSource::Update)
    }

    /// Delete marker for `id`. Carries no fields.
    pub fn delete(id: impl Into<String>) -> Self {
        Self::new(id, Vec::new(), DocumentSource::Delete)
    }

    /// Identifier of the item this document represents or replaces.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn source(&self) -> DocumentSource {
        self.source
    }

    /// First field with the given name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_field_order_is_preserved() {
        let doc = Document::add(
            "/content/a",
            vec![
                Field::text("title", "First"),
                Field::keyword("path", "/content/a"),
                Field::long("size", 42),
            ],
        );

        let names: Vec<&str> = doc.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["title", "path", "size"]);
        assert_eq!(doc.source(), DocumentSource::Add);
    }

    #[test]
    fn test_delete_marker_has_no_fields() {
        let doc = Document::delete("/content/gone");
        assert_eq!(doc.id(), "/content/gone");
        assert!(doc.fields().is_empty());
        assert!(!doc.source().is_upsert());
    }

    #[test]
    fn test_field_lookup() {
        let doc = Document::update("/a", vec![Field::text("title", "hello")]);
        let title = doc.field("title").unwrap();
        assert_eq!(title.value.as_text(), Some("hello"));
        assert!(doc.field("missing").is_none());
    }

    #[test]
    fn test_field_options() {
        let kw = Field::keyword("path", "/a");
        assert!(!kw.options.tokenized);
        assert!(kw.options.indexed);

        let stored = FieldOptions::stored_only();
        assert!(!stored.indexed);
        assert!(stored.stored);
    }

    #[test]
    fn test_value_to_text() {
        assert_eq!(FieldValue::Long(7).to_text(), "7");
        assert_eq!(FieldValue::Boolean(true).to_text(), "true");
        assert_eq!(FieldValue::Text("x".into()).to_text(), "x");
        assert_eq!(FieldValue::Long(7).as_text(), None);
    }

    #[test]
    fn test_shared_across_threads() {
        let doc = Arc::new(Document::add("/shared", vec![Field::text("t", "v")]));
        let clone = doc.clone();
        let handle = std::thread::spawn(move || clone.id().to_string());
        assert_eq!(handle.join().unwrap(), "/shared");
        assert_eq!(Arc::strong_count(&doc), 1);
    }

    #[test]
    fn test_source_display() {
        assert_eq!(DocumentSource::Update.to_string(), "update");
        let json = serde_json::to_string(&DocumentSource::Delete).unwrap();
        assert_eq!(json, "\"delete\"");
    }
}
