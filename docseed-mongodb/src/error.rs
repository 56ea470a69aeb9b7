//! Error types for the MongoDB backend.

use bson::Document;
use docseed_core::SeedError;
use docseed_core::unique::{is_duplicate_key, normalize_unique_error};
use mongodb::error::{ErrorKind, WriteFailure};
use thiserror::Error;

/// Result type for MongoDB operations.
pub type MongoResult<T> = Result<T, MongoError>;

/// Errors that can occur during MongoDB operations.
#[derive(Error, Debug)]
pub enum MongoError {
    /// MongoDB driver error.
    #[error("mongodb error: {0}")]
    Driver(#[from] mongodb::error::Error),

    /// BSON serialization error.
    #[error("bson error: {0}")]
    Bson(#[from] bson::ser::Error),

    /// BSON deserialization error.
    #[error("bson deserialization error: {0}")]
    BsonDe(#[from] bson::de::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Connection error.
    #[error("connection error: {0}")]
    Connection(String),
}

impl MongoError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Check if this is a connection error.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Server code and message of a duplicate-key write error.
    pub fn duplicate_key(&self) -> Option<(i32, String)> {
        match self {
            Self::Driver(err) => duplicate_key_of(err),
            _ => None,
        }
    }

    /// Convert into a [`SeedError`], normalizing duplicate-key errors
    /// against the record being written.
    pub fn into_seed_error(self, record: Option<&Document>) -> SeedError {
        let validation = self
            .duplicate_key()
            .and_then(|(code, message)| normalize_unique_error(code, &message, record));
        if let Some(validation) = validation {
            return SeedError::Validation(validation);
        }
        match self {
            Self::Bson(err) => SeedError::Bson(err),
            Self::BsonDe(err) => SeedError::BsonDe(err),
            other => SeedError::store(other.to_string()),
        }
    }
}

impl From<MongoError> for SeedError {
    fn from(err: MongoError) -> Self {
        err.into_seed_error(None)
    }
}

/// Extract the code and message of a duplicate-key error.
///
/// Duplicate keys surface as single write errors (`insert_one`,
/// `replace_one`), command errors (`findAndModify`) or bulk write errors.
pub fn duplicate_key_of(err: &mongodb::error::Error) -> Option<(i32, String)> {
    let (code, message) = match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write)) => (write.code, write.message.clone()),
        ErrorKind::Command(command) => (command.code, command.message.clone()),
        ErrorKind::BulkWrite(bulk) => {
            let first = bulk
                .write_errors
                .as_ref()?
                .iter()
                .find(|e| is_duplicate_key(e.code))?;
            (first.code, first.message.clone())
        }
        _ => return None,
    };
    is_duplicate_key(code).then_some((code, message))
}
