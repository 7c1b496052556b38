//! Mapping from repository documents to Tantivy documents.

use tantivy::TantivyDocument;

use hybrid_types::{Field, FieldValue};

use crate::error::SearchError;
use crate::schema::LiveSchema;

/// Term stored in the `keywords` field for a verbatim field.
pub fn keyword_term(name: &str, value: &FieldValue) -> String {
    format!("{}:{}", name, value.to_text())
}

/// Convert the fields of one item into a Tantivy document.
pub fn fields_to_doc(
    schema: &LiveSchema,
    id: &str,
    fields: &[Field],
) -> Result<TantivyDocument, SearchError> {
    let mut doc = TantivyDocument::default();
    doc.add_text(schema.id, id);

    let mut stored = Vec::new();
    for field in fields {
        if field.options.indexed {
            if field.options.tokenized {
                doc.add_text(schema.fulltext, field.value.to_text());
            } else {
                doc.add_text(schema.keywords, keyword_term(&field.name, &field.value));
            }
        }
        if field.options.stored {
            stored.push(field);
        }
    }

    doc.add_text(schema.stored, serde_json::to_string(&stored)?);
    Ok(doc)
}

/// Decode the stored payload back into fields.
pub fn stored_fields(payload: &str) -> Result<Vec<Field>, SearchError> {
    Ok(serde_json::from_str(payload)?)
}
