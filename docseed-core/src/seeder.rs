//! The seed engine.
//!
//! A [`Seeder`] is bound to one collection and reconciles seed records with
//! it: dependencies are resolved, the existing document is looked up, and
//! the seed is merged into it or created.
//!
//! ```rust
//! use std::sync::Arc;
//! use docseed_core::prelude::*;
//!
//! # tokio_test::block_on(async {
//! let registry = Arc::new(Registry::new());
//! let users = Arc::new(MemoryCollection::new("users"));
//! registry.register("User", users.clone());
//!
//! let seeder = Seeder::builder(users.clone(), registry).provider(NoSeeds).build();
//! seeder.seed(doc! { "name": "John Doe" }).await.unwrap();
//! seeder.seed(doc! { "name": "John Doe" }).await.unwrap();
//! assert_eq!(users.len(), 1);
//! # });
//! ```

use std::sync::Arc;

use bson::Document;
use tracing::{debug, info};

use crate::collection::{Collection, ModelRegistry, find_then_save};
use crate::config::{SeedConfig, UpsertStrategy};
use crate::dependency::DependencyResolver;
use crate::document::{POPULATE_KEY, without_populate};
use crate::error::SeedResult;
use crate::fanout::join_ordered;
use crate::filter::all;
use crate::input::{SeedInput, normalize};
use crate::source::{FileSeedProvider, SeedProvider};

/// Seeds one collection.
pub struct Seeder {
    collection: Arc<dyn Collection>,
    registry: Arc<dyn ModelRegistry>,
    provider: Arc<dyn SeedProvider>,
    config: SeedConfig,
}

impl Seeder {
    /// Start building a seeder for `collection`, resolving dependencies
    /// through `registry`.
    pub fn builder(
        collection: Arc<dyn Collection>,
        registry: Arc<dyn ModelRegistry>,
    ) -> SeederBuilder {
        SeederBuilder {
            collection,
            registry,
            provider: None,
            config: None,
        }
    }

    /// The collection being seeded.
    pub fn collection(&self) -> &Arc<dyn Collection> {
        &self.collection
    }

    /// The configuration in effect.
    pub fn config(&self) -> &SeedConfig {
        &self.config
    }

    /// Seed the collection.
    ///
    /// With [`SeedInput::None`] (or no records), seeds come from the
    /// provider. Returns the stored documents in input order, or the first
    /// error encountered.
    pub async fn seed(&self, input: impl Into<SeedInput>) -> SeedResult<Vec<Document>> {
        let records = normalize(input.into(), self.collection.name(), self.provider.as_ref());
        self.seed_all(records).await
    }

    /// Reconcile each record, concurrently.
    ///
    /// Every record runs to completion even if another fails; the first
    /// failure is returned.
    pub async fn seed_all(&self, records: Vec<Document>) -> SeedResult<Vec<Document>> {
        let count = records.len();
        let seeded = join_ordered(records.into_iter().map(|seed| self.upsert(seed))).await?;
        info!(collection = self.collection.name(), count, "Seeded collection");
        Ok(seeded)
    }

    /// Reconcile one record.
    pub async fn upsert(&self, seed: Document) -> SeedResult<Document> {
        let resolved = DependencyResolver::new(self.registry.as_ref())
            .resolve(seed)
            .await?;

        let mut criteria = self.collection.prepare_seed_criteria(&resolved);
        criteria.remove(POPULATE_KEY);
        let seed = without_populate(resolved);
        let precedence = self.config.precedence();

        debug!(
            collection = self.collection.name(),
            ?criteria,
            strategy = ?self.config.strategy,
            "Reconciling seed"
        );

        match self.config.strategy {
            UpsertStrategy::FindThenSave => {
                find_then_save(self.collection.as_ref(), criteria, seed, precedence).await
            }
            UpsertStrategy::Atomic => {
                self.collection
                    .merge_upsert(criteria, seed, precedence)
                    .await
            }
        }
    }

    /// Delete every document of the collection, then seed it.
    ///
    /// Nothing is seeded when the delete fails.
    pub async fn clear_and_seed(&self, input: impl Into<SeedInput>) -> SeedResult<Vec<Document>> {
        let deleted = self.collection.delete_many(all()).await?;
        info!(collection = self.collection.name(), deleted, "Cleared collection");
        self.seed(input).await
    }
}

impl std::fmt::Debug for Seeder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Seeder")
            .field("collection", &self.collection.name())
            .field("config", &self.config)
            .finish()
    }
}

/// Builder for [`Seeder`].
pub struct SeederBuilder {
    collection: Arc<dyn Collection>,
    registry: Arc<dyn ModelRegistry>,
    provider: Option<Arc<dyn SeedProvider>>,
    config: Option<SeedConfig>,
}

impl SeederBuilder {
    /// Use `config` instead of the process environment.
    pub fn config(mut self, config: SeedConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Load seeds from `provider` instead of the seed directory.
    pub fn provider(mut self, provider: impl SeedProvider + 'static) -> Self {
        self.provider = Some(Arc::new(provider));
        self
    }

    /// Share an already boxed provider.
    pub fn shared_provider(mut self, provider: Arc<dyn SeedProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Build the seeder.
    ///
    /// Without an explicit configuration, [`SeedConfig::from_env`] is read
    /// once here.
    pub fn build(self) -> Seeder {
        let config = self.config.unwrap_or_else(SeedConfig::from_env);
        let provider = self
            .provider
            .unwrap_or_else(|| Arc::new(FileSeedProvider::from_config(&config)));
        Seeder {
            collection: self.collection,
            registry: self.registry,
            provider,
            config,
        }
    }
}
