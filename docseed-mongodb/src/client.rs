//! MongoDB client wrapper owning the model registry.

use std::sync::Arc;

use bson::{Document, doc};
use docseed_core::{
    Collection, ModelRegistry, Registry, Seeder, SeederBuilder, collection_name_of,
};
use mongodb::{Client, Database};
use smol_str::SmolStr;
use tracing::{debug, info};

use crate::config::{MongoConfig, MongoConfigBuilder};
use crate::error::{MongoError, MongoResult};
use crate::model::MongoModel;

/// A MongoDB client with a registry of seedable models.
///
/// The MongoDB driver handles connection pooling internally; cloning the
/// client is cheap and clones share the registry.
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    database: Database,
    config: Arc<MongoConfig>,
    registry: Arc<Registry>,
}

impl MongoClient {
    /// Create a new client from configuration.
    ///
    /// No connection is made until the first operation.
    pub async fn new(config: MongoConfig) -> MongoResult<Self> {
        let options = config.to_client_options().await?;

        let client = Client::with_options(options)
            .map_err(|e| MongoError::connection(format!("failed to create client: {}", e)))?;

        let database = client.database(&config.database);

        info!(
            uri = %config.uri,
            database = %config.database,
            "MongoDB client created"
        );

        Ok(Self {
            client,
            database,
            config: Arc::new(config),
            registry: Arc::new(Registry::new()),
        })
    }

    /// Create a client from `MONGODB_URI` and `MONGODB_DATABASE`.
    pub async fn from_env() -> MongoResult<Self> {
        Self::new(MongoConfig::from_env()?).await
    }

    /// Create a builder for the client.
    pub fn builder() -> MongoClientBuilder {
        MongoClientBuilder::new()
    }

    /// Register `name` against its derived collection (`User` -> `users`).
    pub fn model(&self, name: &str) -> Arc<MongoModel> {
        self.model_with_collection(name, &collection_name_of(name))
    }

    /// Register `name` against an explicit collection.
    pub fn model_with_collection(&self, name: &str, collection: &str) -> Arc<MongoModel> {
        self.register(name, MongoModel::new(self.database.collection(collection)))
    }

    /// Register a configured model under `name`, replacing any previous one.
    pub fn register(&self, name: impl Into<SmolStr>, model: MongoModel) -> Arc<MongoModel> {
        let model = Arc::new(model);
        self.registry
            .register(name, Arc::clone(&model) as Arc<dyn Collection>);
        model
    }

    /// Driver collection for `collection`, to build a [`MongoModel`] from.
    pub fn collection(&self, collection: &str) -> mongodb::Collection<Document> {
        self.database.collection(collection)
    }

    /// The model registry.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Start building a seeder for `model`, registering it first if needed.
    pub fn seeder(&self, model: &str) -> SeederBuilder {
        let collection = match self.registry.collection(model) {
            Some(collection) => collection,
            None => self.model(model) as Arc<dyn Collection>,
        };
        let registry: Arc<dyn ModelRegistry> = self.registry.clone();
        Seeder::builder(collection, registry)
    }

    /// Get the underlying database.
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Get the underlying MongoDB client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Get the configuration.
    pub fn config(&self) -> &MongoConfig {
        &self.config
    }

    /// Check if the client is healthy by pinging the server.
    pub async fn is_healthy(&self) -> bool {
        self.database
            .run_command(doc! { "ping": 1 }, None)
            .await
            .is_ok()
    }

    /// Drop the whole database.
    pub async fn drop_database(&self) -> MongoResult<()> {
        debug!(database = %self.config.database, "Dropping database");
        self.database.drop(None).await?;
        Ok(())
    }
}

impl std::fmt::Debug for MongoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MongoClient")
            .field("database", &self.config.database)
            .field("registry", &self.registry)
            .finish()
    }
}

/// Builder for MongoClient.
///
/// Options not exposed here can be set on a [`MongoConfig`] passed to
/// [`MongoClient::new`].
#[derive(Debug, Default)]
pub struct MongoClientBuilder {
    config: MongoConfigBuilder,
}

impl MongoClientBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the MongoDB URI.
    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.config = self.config.uri(uri);
        self
    }

    /// Set the database name.
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.config = self.config.database(database);
        self
    }

    /// Set the application name.
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.config = self.config.app_name(name);
        self
    }

    /// Build the client.
    pub async fn build(self) -> MongoResult<MongoClient> {
        MongoClient::new(self.config.build()?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docseed_core::SeedConfig;

    async fn offline_client() -> MongoClient {
        MongoClient::builder()
            .uri("mongodb://localhost:27017")
            .database("docseed_test")
            .build()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_client_builder() {
        let client = MongoClientBuilder::new()
            .uri("mongodb://localhost:27017")
            .database("test")
            .app_name("seed-job")
            .build()
            .await
            .unwrap();

        assert_eq!(client.config().database, "test");
        assert_eq!(client.config().app_name.as_deref(), Some("seed-job"));
        assert_eq!(client.database().name(), "test");
    }

    #[tokio::test]
    async fn test_client_builder_requires_database() {
        let result = MongoClientBuilder::new().build().await;
        assert!(matches!(result, Err(MongoError::Config(_))));
    }

    #[tokio::test]
    async fn test_model_registration() {
        let client = offline_client().await;

        let users = client.model("User");
        assert_eq!(users.name(), "users");
        assert!(client.registry().contains("User"));

        let people = client.model_with_collection("Person", "people");
        assert_eq!(people.name(), "people");

        let audited = client.register(
            "Audit",
            MongoModel::new(client.collection("audit_log")).with_timestamps(true),
        );
        assert!(audited.timestamps());
        assert_eq!(client.registry().get("Audit").unwrap().name(), "audit_log");
    }

    #[tokio::test]
    async fn test_seeder_registers_missing_model() {
        let client = offline_client().await;
        let seeder = client
            .seeder("Category")
            .config(SeedConfig::default())
            .build();

        assert_eq!(seeder.collection().name(), "categories");
        assert!(client.registry().contains("Category"));
    }

    #[tokio::test]
    async fn test_clones_share_registry() {
        let client = offline_client().await;
        let clone = client.clone();
        clone.model("Role");
        assert!(client.registry().contains("Role"));
    }
}
