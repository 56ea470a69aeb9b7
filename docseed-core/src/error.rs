//! Error types for seeding operations.

use thiserror::Error;

use crate::unique::ValidationError;

/// Result type for seeding operations.
pub type SeedResult<T> = Result<T, SeedError>;

/// Errors that can occur while seeding a collection.
#[derive(Error, Debug)]
pub enum SeedError {
    /// A `populate` entry is missing a model name or a match document.
    #[error("Invalid Populate Options: `{field}`")]
    InvalidPopulateOptions {
        /// The seed field the dependency was declared for.
        field: String,
    },

    /// A dependency names a model that is not registered.
    #[error("model not registered: {0}")]
    ModelNotFound(String),

    /// A structured validation error, e.g. a normalized duplicate-key error.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Store (driver) failure during lookup, write or delete.
    #[error("store error: {0}")]
    Store(String),

    /// BSON serialization error.
    #[error("bson error: {0}")]
    Bson(#[from] bson::ser::Error),

    /// BSON deserialization error.
    #[error("bson deserialization error: {0}")]
    BsonDe(#[from] bson::de::Error),

    /// Extended JSON could not be converted to BSON.
    #[error("extended json error: {0}")]
    ExtJson(#[from] bson::extjson::de::Error),

    /// Seed file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Seed file is not valid JSON.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Seed file is not valid TOML.
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Seed file has an extension no reader handles.
    #[error("unsupported seed file: {0}")]
    UnsupportedSeedFile(String),
}

impl SeedError {
    /// Create an invalid populate options error for a seed field.
    pub fn invalid_populate(field: impl Into<String>) -> Self {
        Self::InvalidPopulateOptions {
            field: field.into(),
        }
    }

    /// Create a model not found error.
    pub fn model_not_found(model: impl Into<String>) -> Self {
        Self::ModelNotFound(model.into())
    }

    /// Create a store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    /// Check if this is an invalid populate options error.
    pub fn is_invalid_populate(&self) -> bool {
        matches!(self, Self::InvalidPopulateOptions { .. })
    }

    /// Check if this is a structured validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Get the structured validation error, if any.
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}
