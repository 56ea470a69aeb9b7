//! MongoDB connection configuration.

use std::env;
use std::time::Duration;

use mongodb::options::ClientOptions;

use crate::error::{MongoError, MongoResult};

/// Default connection URI.
pub const DEFAULT_URI: &str = "mongodb://localhost:27017";

/// MongoDB connection configuration.
///
/// Unset options keep whatever the connection URI specifies.
#[derive(Debug, Clone, PartialEq)]
pub struct MongoConfig {
    /// MongoDB connection URI.
    pub uri: String,
    /// Database name.
    pub database: String,
    /// Application name (shown in server logs).
    pub app_name: Option<String>,
    /// Minimum connection pool size.
    pub min_pool_size: Option<u32>,
    /// Maximum connection pool size.
    pub max_pool_size: Option<u32>,
    /// Connection timeout.
    pub connect_timeout: Option<Duration>,
    /// Server selection timeout.
    pub server_selection_timeout: Option<Duration>,
    /// Retry writes.
    pub retry_writes: Option<bool>,
    /// Retry reads.
    pub retry_reads: Option<bool>,
    /// Direct connection (bypass replica set discovery).
    pub direct_connection: Option<bool>,
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_URI.to_string(),
            database: String::new(),
            app_name: Some("docseed".to_string()),
            min_pool_size: None,
            max_pool_size: Some(10),
            connect_timeout: Some(Duration::from_secs(10)),
            server_selection_timeout: Some(Duration::from_secs(30)),
            retry_writes: Some(true),
            retry_reads: None,
            direct_connection: None,
        }
    }
}

impl MongoConfig {
    /// Configuration for `database` at `uri`, with default options.
    pub fn from_uri(uri: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            database: database.into(),
            ..Self::default()
        }
    }

    /// Create a builder for configuration.
    pub fn builder() -> MongoConfigBuilder {
        MongoConfigBuilder::new()
    }

    /// Read `MONGODB_URI` and `MONGODB_DATABASE` from the environment.
    pub fn from_env() -> MongoResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read configuration through a variable lookup function.
    ///
    /// Without `MONGODB_DATABASE`, the database named in the URI path is
    /// used.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> MongoResult<Self> {
        let uri = lookup("MONGODB_URI")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_URI.to_string());
        let mut builder = Self::builder().uri(uri.as_str());
        if let Some(database) = lookup("MONGODB_DATABASE")
            .filter(|v| !v.trim().is_empty())
            .or_else(|| database_from_uri(&uri))
        {
            builder = builder.database(database);
        }
        builder.build()
    }

    /// Driver options: the parsed URI overlaid with the options set here.
    pub async fn to_client_options(&self) -> MongoResult<ClientOptions> {
        let mut options = ClientOptions::parse(&self.uri)
            .await
            .map_err(|e| MongoError::config(format!("failed to parse URI: {}", e)))?;

        options.app_name = self.app_name.clone().or(options.app_name);
        options.min_pool_size = self.min_pool_size.or(options.min_pool_size);
        options.max_pool_size = self.max_pool_size.or(options.max_pool_size);
        options.connect_timeout = self.connect_timeout.or(options.connect_timeout);
        options.server_selection_timeout = self
            .server_selection_timeout
            .or(options.server_selection_timeout);
        options.retry_writes = self.retry_writes.or(options.retry_writes);
        options.retry_reads = self.retry_reads.or(options.retry_reads);
        options.direct_connection = self.direct_connection.or(options.direct_connection);

        Ok(options)
    }
}

/// Database named in the path of a connection URI, if any.
pub fn database_from_uri(uri: &str) -> Option<String> {
    let (_, rest) = uri.split_once("://")?;
    let (_, path) = rest.split_once('/')?;
    let name = path.split('?').next().unwrap_or_default();
    (!name.is_empty()).then(|| name.to_string())
}

/// Builder for MongoDB configuration, starting from the defaults.
#[derive(Debug, Default)]
pub struct MongoConfigBuilder {
    config: MongoConfig,
}

impl MongoConfigBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the MongoDB URI.
    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.config.uri = uri.into();
        self
    }

    /// Set the database name.
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.config.database = database.into();
        self
    }

    /// Set the application name.
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.config.app_name = Some(name.into());
        self
    }

    /// Set the minimum and maximum pool sizes.
    pub fn pool_size(mut self, min: u32, max: u32) -> Self {
        self.config.min_pool_size = Some(min);
        self.config.max_pool_size = Some(max);
        self
    }

    /// Set the maximum pool size.
    pub fn max_pool_size(mut self, size: u32) -> Self {
        self.config.max_pool_size = Some(size);
        self
    }

    /// Set the connection and server selection timeouts.
    pub fn timeouts(mut self, connect: Duration, server_selection: Duration) -> Self {
        self.config.connect_timeout = Some(connect);
        self.config.server_selection_timeout = Some(server_selection);
        self
    }

    /// Enable or disable retryable writes and reads.
    pub fn retries(mut self, writes: bool, reads: bool) -> Self {
        self.config.retry_writes = Some(writes);
        self.config.retry_reads = Some(reads);
        self
    }

    /// Enable direct connection (bypass replica set discovery).
    pub fn direct_connection(mut self, enabled: bool) -> Self {
        self.config.direct_connection = Some(enabled);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> MongoResult<MongoConfig> {
        if self.config.database.trim().is_empty() {
            return Err(MongoError::config("database name is required"));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_config_from_uri() {
        let config = MongoConfig::from_uri("mongodb://localhost:27017", "mydb");
        assert_eq!(config.uri, "mongodb://localhost:27017");
        assert_eq!(config.database, "mydb");
    }

    #[test]
    fn test_config_builder() {
        let config = MongoConfig::builder()
            .uri("mongodb://db:27017")
            .database("mydb")
            .app_name("seed-job")
            .max_pool_size(20)
            .build()
            .unwrap();

        assert_eq!(config.database, "mydb");
        assert_eq!(config.app_name, Some("seed-job".to_string()));
        assert_eq!(config.max_pool_size, Some(20));
        assert_eq!(config.retry_writes, Some(true));
    }

    #[test]
    fn test_config_builder_grouped_options() {
        let config = MongoConfig::builder()
            .database("mydb")
            .pool_size(2, 8)
            .timeouts(Duration::from_secs(1), Duration::from_secs(2))
            .retries(false, true)
            .build()
            .unwrap();

        assert_eq!((config.min_pool_size, config.max_pool_size), (Some(2), Some(8)));
        assert_eq!(config.connect_timeout, Some(Duration::from_secs(1)));
        assert_eq!(config.server_selection_timeout, Some(Duration::from_secs(2)));
        assert_eq!((config.retry_writes, config.retry_reads), (Some(false), Some(true)));
    }

    #[test]
    fn test_config_builder_missing_database() {
        let result = MongoConfig::builder().uri(DEFAULT_URI).build();
        assert!(result.is_err());
        assert!(MongoConfig::builder().database("  ").build().is_err());
    }

    #[test]
    fn test_from_lookup() {
        let config = MongoConfig::from_lookup(lookup(&[
            ("MONGODB_URI", "mongodb://db:27017"),
            ("MONGODB_DATABASE", "app"),
        ]))
        .unwrap();
        assert_eq!(config.uri, "mongodb://db:27017");
        assert_eq!(config.database, "app");
    }

    #[test]
    fn test_from_lookup_database_in_uri() {
        let config =
            MongoConfig::from_lookup(lookup(&[("MONGODB_URI", "mongodb://db:27017/shop?w=1")]))
                .unwrap();
        assert_eq!(config.database, "shop");

        assert!(MongoConfig::from_lookup(lookup(&[])).is_err());
    }

    #[test]
    fn test_database_from_uri() {
        assert_eq!(database_from_uri("mongodb://h/db"), Some("db".to_string()));
        assert_eq!(database_from_uri("mongodb+srv://u:p@h/db?x=1"), Some("db".to_string()));
        assert_eq!(database_from_uri("mongodb://h/"), None);
        assert_eq!(database_from_uri("mongodb://h"), None);
    }

    #[tokio::test]
    async fn test_to_client_options() {
        let config = MongoConfig::builder()
            .database("mydb")
            .direct_connection(true)
            .build()
            .unwrap();
        let options = config.to_client_options().await.unwrap();
        assert_eq!(options.app_name.as_deref(), Some("docseed"));
        assert_eq!(options.direct_connection, Some(true));
    }
}
