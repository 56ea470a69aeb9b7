//! Collection handles and the model registry.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bson::Document;
use parking_lot::RwLock;
use smol_str::SmolStr;
use tracing::debug;

use crate::document::{Precedence, merge_seed};
use crate::error::SeedResult;

/// Caller-supplied mapping from a seed to the criteria used to find it.
pub type CriteriaHook = Arc<dyn Fn(&Document) -> Document + Send + Sync>;

/// A handle bound to one logical document collection.
///
/// The seed engine only borrows handles; implementations own the
/// connection to the underlying store.
#[async_trait]
pub trait Collection: Send + Sync {
    /// Name of the underlying collection.
    fn name(&self) -> &str;

    /// Find the first document matching `criteria`.
    async fn find_one(
        &self,
        criteria: Document,
        projection: Option<Document>,
    ) -> SeedResult<Option<Document>>;

    /// Find all documents matching `criteria`.
    async fn find(
        &self,
        criteria: Document,
        projection: Option<Document>,
    ) -> SeedResult<Vec<Document>>;

    /// Insert a new document and return it as stored.
    async fn create(&self, record: Document) -> SeedResult<Document>;

    /// Persist an existing document (matched by `_id`) and return it as stored.
    async fn save(&self, record: Document) -> SeedResult<Document>;

    /// Delete all documents matching `criteria`, returning how many were removed.
    async fn delete_many(&self, criteria: Document) -> SeedResult<u64>;

    /// Map a dependency-resolved seed to its reconciliation criteria.
    fn prepare_seed_criteria(&self, seed: &Document) -> Document {
        seed.clone()
    }

    /// Merge `seed` into the document matching `criteria`, or create it.
    ///
    /// As with [`find_then_save`], `updatedAt` is stamped on merge only.
    /// The default runs a lookup followed by a write, which is not atomic.
    /// Stores that support conditional writes override this.
    async fn merge_upsert(
        &self,
        criteria: Document,
        seed: Document,
        precedence: Precedence,
    ) -> SeedResult<Document> {
        find_then_save(self, criteria, seed, precedence).await
    }
}

/// Look up the document matching `criteria`, then merge-and-save or create.
pub async fn find_then_save<C>(
    collection: &C,
    criteria: Document,
    seed: Document,
    precedence: Precedence,
) -> SeedResult<Document>
where
    C: Collection + ?Sized,
{
    match collection.find_one(criteria, None).await? {
        Some(stored) => {
            debug!(collection = collection.name(), "Merging seed into existing document");
            collection.save(merge_seed(stored, seed, precedence)).await
        }
        None => {
            debug!(collection = collection.name(), "Creating document from seed");
            collection.create(seed).await
        }
    }
}

/// Lookup of collection handles by model name.
pub trait ModelRegistry: Send + Sync {
    /// Get the collection registered for `model`.
    fn collection(&self, model: &str) -> Option<Arc<dyn Collection>>;
}

/// Thread-safe registry of named collection handles.
#[derive(Default)]
pub struct Registry {
    models: RwLock<HashMap<SmolStr, Arc<dyn Collection>>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a collection under a model name, replacing any previous one.
    pub fn register(&self, model: impl Into<SmolStr>, collection: Arc<dyn Collection>) {
        let model = model.into();
        debug!(model = %model, collection = collection.name(), "Registering model");
        self.models.write().insert(model, collection);
    }

    /// Get the collection registered for `model`.
    pub fn get(&self, model: &str) -> Option<Arc<dyn Collection>> {
        self.models.read().get(model).cloned()
    }

    /// Check whether `model` is registered.
    pub fn contains(&self, model: &str) -> bool {
        self.models.read().contains_key(model)
    }

    /// Registered model names, sorted.
    pub fn model_names(&self) -> Vec<SmolStr> {
        let mut names: Vec<SmolStr> = self.models.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl ModelRegistry for Registry {
    fn collection(&self, model: &str) -> Option<Arc<dyn Collection>> {
        self.get(model)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("models", &self.model_names())
            .finish()
    }
}

/// Derive a collection name from a model name.
///
/// The name is lowercased and pluralised with the common English rules:
/// `User` becomes `users`, `Category` becomes `categories`, `Box` becomes
/// `boxes`. Names already ending in `s` are kept.
pub fn collection_name_of(model: &str) -> String {
    let name = model.to_lowercase();
    if name.is_empty() || name.ends_with('s') {
        return name;
    }
    if let Some(stem) = name.strip_suffix('y') {
        let before = stem.chars().last();
        if before.is_some_and(|c| !"aeiou".contains(c)) {
            return format!("{stem}ies");
        }
    }
    if ["x", "z", "ch", "sh"].iter().any(|suffix| name.ends_with(suffix)) {
        return format!("{name}es");
    }
    format!("{name}s")
}
