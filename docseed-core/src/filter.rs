//! Filter and projection building for seed lookups.

use bson::{Bson, Document, doc};

use crate::document::ID_KEY;

/// Builder for lookup filter documents.
///
/// # Example
///
/// ```rust
/// use docseed_core::FilterBuilder;
/// use docseed_core::doc;
///
/// let filter = FilterBuilder::from_doc(doc! { "name": "P" })
///     .not_in("_id", vec![1, 2])
///     .build();
///
/// assert!(filter.contains_key("name"));
/// assert!(filter.get_document("_id").unwrap().contains_key("$nin"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct FilterBuilder {
    doc: Document,
}

impl FilterBuilder {
    /// Create a new empty filter builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a filter builder from an existing document.
    pub fn from_doc(doc: Document) -> Self {
        Self { doc }
    }

    /// Add an equality condition.
    pub fn eq(mut self, field: &str, value: impl Into<Bson>) -> Self {
        self.doc.insert(field, value.into());
        self
    }

    /// Add a "not in" condition on `field`.
    ///
    /// An operator document already on `field` gains the `$nin` unless it
    /// has one. A plain value on `field` takes precedence over the exclusion.
    pub fn not_in(mut self, field: &str, values: Vec<impl Into<Bson>>) -> Self {
        if values.is_empty() {
            return self;
        }
        let values: Vec<Bson> = values.into_iter().map(Into::into).collect();
        match self.doc.get_mut(field) {
            None => {
                self.doc.insert(field, doc! { "$nin": values });
            }
            Some(Bson::Document(operators)) if is_operator_doc(operators) => {
                if !operators.contains_key("$nin") {
                    operators.insert("$nin", values);
                }
            }
            Some(_) => {}
        }
        self
    }

    /// Build the filter document.
    pub fn build(self) -> Document {
        self.doc
    }

    /// Check if the filter is empty.
    pub fn is_empty(&self) -> bool {
        self.doc.is_empty()
    }
}

/// Whether every key of `doc` is a query operator.
pub fn is_operator_doc(doc: &Document) -> bool {
    !doc.is_empty() && doc.keys().all(|k| k.starts_with('$'))
}

/// Create an empty filter (matches all documents).
pub fn all() -> Document {
    doc! {}
}

/// Projection for a dependency lookup: the requested fields plus `_id`.
pub fn projection_with_id(select: Option<&Document>) -> Document {
    let mut projection = select.cloned().unwrap_or_default();
    projection.insert(ID_KEY, 1);
    projection
}
