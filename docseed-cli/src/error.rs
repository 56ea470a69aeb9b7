//! CLI error types and result alias.

use docseed_core::SeedError;
use docseed_mongodb::MongoError;
use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// CLI error types
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    #[diagnostic(
        code(docseed::config),
        help("set --database or MONGODB_DATABASE, or name the database in the URI")
    )]
    Config(String),

    /// Seed data could not be read
    #[error("Seed data error: {0}")]
    #[diagnostic(code(docseed::data))]
    Data(String),

    /// Seeding failed
    #[error("Seeding {model} failed: {source}")]
    #[diagnostic(code(docseed::seed))]
    Seed {
        /// The model being seeded
        model: String,
        /// The underlying error
        source: SeedError,
    },

    /// Database error
    #[error("Database error: {0}")]
    #[diagnostic(code(docseed::database))]
    Database(#[from] MongoError),
}

impl CliError {
    /// Wrap a seeding error for `model`.
    pub fn seed(model: impl Into<String>, source: SeedError) -> Self {
        Self::Seed {
            model: model.into(),
            source,
        }
    }
}
