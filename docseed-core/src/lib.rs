//! # docseed-core
//!
//! Declarative seeding and reconciliation for document collections.
//!
//! This crate provides:
//! - A [`Collection`] abstraction over one logical document collection
//! - Seed input normalization (single record, many records, filter/transform bundles)
//! - On-disk seed discovery keyed by collection name
//! - Dependency resolution (`populate`) across collections, with `ignore` exclusions
//! - Idempotent find-and-merge upserts, plus a full clear-and-seed reset
//! - Normalization of duplicate-key write errors into structured validation errors
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use docseed_core::prelude::*;
//!
//! let registry = Arc::new(Registry::new());
//! let parents = Arc::new(MemoryCollection::new("parents"));
//! let children = Arc::new(MemoryCollection::new("children"));
//! registry.register("Parent", parents.clone());
//! registry.register("Child", children.clone());
//!
//! let seeder = Seeder::builder(children, registry).build();
//! let seeded = seeder
//!     .seed(doc! {
//!         "name": "Child",
//!         "populate": { "parent": Dependency::new("Parent", doc! { "name": "P" }) },
//!     })
//!     .await?;
//! ```
//!
//! ## Seed records
//!
//! A seed is a plain BSON [`Document`](bson::Document) describing the desired
//! state of one stored document. The reserved `populate` key declares fields
//! whose values are looked up in other collections before the seed is
//! persisted; it is never written to the store.

pub mod collection;
pub mod config;
pub mod dependency;
pub mod document;
pub mod error;
pub mod fanout;
pub mod filter;
pub mod input;
pub mod logging;
pub mod memory;
pub mod seeder;
pub mod source;
pub mod unique;

pub use bson::oid::ObjectId;
pub use bson::{Bson, Document, doc};
pub use collection::{Collection, CriteriaHook, ModelRegistry, Registry, collection_name_of};
pub use config::{SeedConfig, SeedConfigBuilder, UpsertStrategy};
pub use dependency::{Dependency, DependencyResolver, IgnoreClause};
pub use document::{DocumentExt, Precedence};
pub use error::{SeedError, SeedResult};
pub use filter::FilterBuilder;
pub use input::{SeedBundle, SeedInput};
pub use memory::MemoryCollection;
pub use seeder::{Seeder, SeederBuilder};
pub use source::{FileSeedProvider, NoSeeds, SeedProvider, StaticSeedProvider};
pub use unique::{ValidationError, ValidatorError};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::collection::{
        Collection, CriteriaHook, ModelRegistry, Registry, collection_name_of,
    };
    pub use crate::config::{SeedConfig, UpsertStrategy};
    pub use crate::dependency::{Dependency, IgnoreClause};
    pub use crate::document::{DocumentExt, Precedence};
    pub use crate::error::{SeedError, SeedResult};
    pub use crate::input::{SeedBundle, SeedInput};
    pub use crate::memory::MemoryCollection;
    pub use crate::seeder::Seeder;
    pub use crate::source::{FileSeedProvider, NoSeeds, SeedProvider, StaticSeedProvider};
    pub use crate::unique::{ValidationError, ValidatorError};
    pub use bson::oid::ObjectId;
    pub use bson::{Bson, Document, doc};
}
