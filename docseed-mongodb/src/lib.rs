//! # docseed-mongodb
//!
//! MongoDB backend for docseed.
//!
//! This crate provides:
//! - Connection management with the official MongoDB driver
//! - A model registry keyed by model name (`User` -> `users`)
//! - [`MongoModel`], a seedable [`Collection`](docseed_core::Collection)
//! - Duplicate-key errors normalized into per-path validation errors
//! - Atomic single-round-trip upserts via an aggregation-pipeline update
//!
//! ## Example
//!
//! ```rust,ignore
//! use docseed_mongodb::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = MongoClient::builder()
//!         .uri("mongodb://localhost:27017")
//!         .database("mydb")
//!         .build()
//!         .await?;
//!
//!     client.model("Parent");
//!     let children = client.seeder("Child").build();
//!
//!     children
//!         .seed(doc! {
//!             "name": "Child",
//!             "populate": { "parent": Dependency::new("Parent", doc! { "name": "P" }) },
//!         })
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod model;

pub use bson::oid::ObjectId;
pub use bson::{Bson, Document, doc};
pub use client::{MongoClient, MongoClientBuilder};
pub use config::{MongoConfig, MongoConfigBuilder};
pub use error::{MongoError, MongoResult};
pub use model::MongoModel;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::client::{MongoClient, MongoClientBuilder};
    pub use crate::config::{MongoConfig, MongoConfigBuilder};
    pub use crate::error::{MongoError, MongoResult};
    pub use crate::model::MongoModel;
    pub use docseed_core::prelude::*;
}
