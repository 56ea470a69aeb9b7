//! Dependency (`populate`) resolution.
//!
//! A seed may reference documents of other collections through its reserved
//! `populate` key:
//!
//! ```text
//! {
//!   name: "Child",
//!   populate: {
//!     parent: { model: "Parent", match: { name: "P" } },
//!     siblings: {
//!       model: "Child",
//!       match: { family: "F" },
//!       array: true,
//!       ignore: { match: { name: "Child" } },
//!     },
//!   },
//! }
//! ```
//!
//! Each entry is looked up in the named model's collection and the result is
//! written onto the seed field of the same name: the matching `_id` (or the
//! projected document when `select` is given). Single lookups that find
//! nothing remove the field; array lookups always produce an array.

use std::sync::Arc;

use bson::{Bson, Document, doc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::collection::{Collection, ModelRegistry};
use crate::document::{DocumentExt, ID_KEY, POPULATE_KEY};
use crate::error::{SeedError, SeedResult};
use crate::fanout::join_ordered;
use crate::filter::{FilterBuilder, projection_with_id};

/// A reference from a seed field to documents of another model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    /// Model name, looked up in the registry.
    pub model: String,
    /// Lookup criteria.
    #[serde(rename = "match")]
    pub filter: Document,
    /// Fields to project; when set, the projected document is stored instead
    /// of the `_id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<Document>,
    /// Resolve to every match instead of the first one.
    #[serde(default)]
    pub array: bool,
    /// Documents to exclude from the lookup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore: Option<IgnoreClause>,
}

/// Exclusion sub-query of a [`Dependency`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IgnoreClause {
    /// Model to query; defaults to the dependency's model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Criteria selecting the documents to exclude.
    #[serde(rename = "match")]
    pub filter: Document,
    /// Path the excluded ids are matched against; defaults to `_id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Accepted for symmetry with [`Dependency`]; exclusions only fetch `_id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<Document>,
}

impl Dependency {
    /// Reference the first document of `model` matching `filter`.
    pub fn new(model: impl Into<String>, filter: Document) -> Self {
        Self {
            model: model.into(),
            filter,
            select: None,
            array: false,
            ignore: None,
        }
    }

    /// Reference every document of `model` matching `filter`.
    pub fn many(model: impl Into<String>, filter: Document) -> Self {
        Self::new(model, filter).array(true)
    }

    /// Store projected documents instead of ids.
    pub fn select(mut self, select: Document) -> Self {
        self.select = Some(select);
        self
    }

    /// Resolve to an array of matches.
    pub fn array(mut self, array: bool) -> Self {
        self.array = array;
        self
    }

    /// Exclude documents from the lookup.
    pub fn ignore(mut self, ignore: IgnoreClause) -> Self {
        self.ignore = Some(ignore);
        self
    }

    /// Parse the `populate` entry declared for `field`.
    pub fn from_bson(field: &str, value: &Bson) -> SeedResult<Self> {
        let invalid = || SeedError::invalid_populate(field);
        let Bson::Document(spec) = value else {
            return Err(invalid());
        };

        let model = match spec.get("model") {
            Some(Bson::String(model)) => model.clone(),
            _ => return Err(invalid()),
        };
        let filter = match spec.get("match") {
            Some(Bson::Document(filter)) => filter.clone(),
            _ => return Err(invalid()),
        };
        let select = spec.get_document("select").ok().cloned();
        let array = matches!(spec.get("array"), Some(Bson::Boolean(true)));
        let ignore = match spec.get("ignore") {
            Some(Bson::Document(ignore)) if !ignore.is_empty() => {
                Some(IgnoreClause::from_document(field, ignore)?)
            }
            _ => None,
        };

        Ok(Self {
            model,
            filter,
            select,
            array,
            ignore,
        })
    }

    /// Whether a projected document (rather than the id) is stored.
    pub fn stores_documents(&self) -> bool {
        self.select.as_ref().is_some_and(|s| !s.is_empty())
    }

    /// Document form, as it appears under `populate`.
    pub fn to_document(&self) -> Document {
        let mut spec = doc! { "model": &self.model, "match": self.filter.clone() };
        if let Some(select) = &self.select {
            spec.insert("select", select.clone());
        }
        if self.array {
            spec.insert("array", true);
        }
        if let Some(ignore) = &self.ignore {
            spec.insert("ignore", ignore.to_document());
        }
        spec
    }
}

impl From<Dependency> for Bson {
    fn from(dependency: Dependency) -> Self {
        Bson::Document(dependency.to_document())
    }
}

impl IgnoreClause {
    /// Exclude the documents matching `filter`.
    pub fn new(filter: Document) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    /// Query another model for the exclusions.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Match the excluded ids against `path` instead of `_id`.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Path the excluded ids are matched against.
    pub fn target_path(&self) -> &str {
        self.path.as_deref().unwrap_or(ID_KEY)
    }

    fn from_document(field: &str, spec: &Document) -> SeedResult<Self> {
        let invalid = || SeedError::invalid_populate(field);
        let model = match spec.get("model") {
            None => None,
            Some(Bson::String(model)) => Some(model.clone()),
            Some(_) => return Err(invalid()),
        };
        let filter = match spec.get("match") {
            Some(Bson::Document(filter)) => filter.clone(),
            _ => return Err(invalid()),
        };
        Ok(Self {
            model,
            filter,
            path: spec.get_str("path").ok().map(str::to_string),
            select: spec.get_document("select").ok().cloned(),
        })
    }

    fn to_document(&self) -> Document {
        let mut spec = doc! { "match": self.filter.clone() };
        if let Some(model) = &self.model {
            spec.insert("model", model);
        }
        if let Some(path) = &self.path {
            spec.insert("path", path);
        }
        if let Some(select) = &self.select {
            spec.insert("select", select.clone());
        }
        spec
    }
}

/// Parse every `populate` entry of `seed`, in declaration order.
pub fn dependencies_of(seed: &Document) -> SeedResult<Vec<(String, Dependency)>> {
    match seed.get(POPULATE_KEY) {
        Some(Bson::Document(populate)) => populate
            .iter()
            .map(|(field, spec)| Ok((field.clone(), Dependency::from_bson(field, spec)?)))
            .collect(),
        _ => Ok(Vec::new()),
    }
}

/// Resolves `populate` entries against registered models.
pub struct DependencyResolver<'a> {
    registry: &'a dyn ModelRegistry,
}

impl<'a> DependencyResolver<'a> {
    /// Resolve against `registry`.
    pub fn new(registry: &'a dyn ModelRegistry) -> Self {
        Self { registry }
    }

    /// Write resolved dependency values onto `seed`.
    ///
    /// All entries are looked up concurrently. The `populate` key itself is
    /// left in place.
    pub async fn resolve(&self, mut seed: Document) -> SeedResult<Document> {
        let dependencies = dependencies_of(&seed)?;
        if dependencies.is_empty() {
            return Ok(seed);
        }

        let values = join_ordered(dependencies.iter().map(|(_, dep)| self.fetch(dep))).await?;

        for ((field, _), value) in dependencies.into_iter().zip(values) {
            match value {
                Some(value) => {
                    seed.insert(field, value);
                }
                None => {
                    seed.remove(&field);
                }
            }
        }
        Ok(seed)
    }

    /// Look up one dependency.
    ///
    /// Returns `None` when a single lookup matches nothing.
    pub async fn fetch(&self, dependency: &Dependency) -> SeedResult<Option<Bson>> {
        let filter = self.exclude_ignored(dependency).await?;
        let collection = self.collection(&dependency.model)?;
        let projection = projection_with_id(dependency.select.as_ref());

        debug!(
            model = %dependency.model,
            array = dependency.array,
            "Resolving seed dependency"
        );

        if dependency.array {
            let found = collection.find(filter, Some(projection)).await?;
            let values = found
                .into_iter()
                .filter_map(|doc| resolved_value(dependency, doc))
                .collect();
            Ok(Some(Bson::Array(values)))
        } else {
            let found = collection.find_one(filter, Some(projection)).await?;
            Ok(found.and_then(|doc| resolved_value(dependency, doc)))
        }
    }

    async fn exclude_ignored(&self, dependency: &Dependency) -> SeedResult<Document> {
        let Some(ignore) = &dependency.ignore else {
            return Ok(dependency.filter.clone());
        };

        let model = ignore.model.as_deref().unwrap_or(&dependency.model);
        let collection = self.collection(model)?;
        let ignored = collection
            .find(ignore.filter.clone(), Some(projection_with_id(None)))
            .await?;
        let ids: Vec<Bson> = ignored
            .iter()
            .filter_map(|doc| doc.id_value().cloned())
            .collect();

        debug!(model, excluded = ids.len(), "Excluding ignored dependencies");

        Ok(FilterBuilder::from_doc(dependency.filter.clone())
            .not_in(ignore.target_path(), ids)
            .build())
    }

    fn collection(&self, model: &str) -> SeedResult<Arc<dyn Collection>> {
        self.registry
            .collection(model)
            .ok_or_else(|| SeedError::model_not_found(model))
    }
}

fn resolved_value(dependency: &Dependency, doc: Document) -> Option<Bson> {
    if dependency.stores_documents() {
        Some(Bson::Document(doc))
    } else {
        doc.id_value().cloned()
    }
}
