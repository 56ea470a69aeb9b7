//! # docseed
//!
//! Declarative, idempotent seeding and reconciliation for document databases.
//!
//! docseed provides:
//! - Seeds as plain BSON documents, from code or from a seed directory
//! - Cross-collection references resolved through a `populate` key
//! - Find-and-merge upserts that are safe to run on every deploy
//! - A full clear-and-seed reset
//! - Duplicate-key errors reported as structured per-path validation errors
//! - A MongoDB backend (feature `mongodb`, enabled by default)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docseed::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = MongoClient::from_env().await?;
//!     client.model("Parent");
//!     client.model("Child");
//!
//!     client.seeder("Parent").build().seed(doc! { "name": "P" }).await?;
//!     client
//!         .seeder("Child")
//!         .build()
//!         .seed(doc! {
//!             "name": "C",
//!             "populate": { "parent": Dependency::new("Parent", doc! { "name": "P" }) },
//!         })
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// The backend-independent seed engine.
pub mod engine {
    pub use docseed_core::*;
}

/// The MongoDB backend.
#[cfg(feature = "mongodb")]
#[cfg_attr(docsrs, doc(cfg(feature = "mongodb")))]
pub mod mongodb {
    pub use docseed_mongodb::*;
}

pub use docseed_core::logging;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use docseed_core::prelude::*;

    #[cfg(feature = "mongodb")]
    pub use docseed_mongodb::{MongoClient, MongoConfig, MongoError, MongoModel};
}

// Re-export key types at the crate root
pub use docseed_core::{
    Collection, Dependency, IgnoreClause, MemoryCollection, Registry, SeedBundle, SeedConfig,
    SeedError, SeedInput, SeedResult, Seeder, UpsertStrategy, ValidationError,
};
