//! Seed sources.
//!
//! When a caller seeds without data, records are loaded by a
//! [`SeedProvider`] keyed by collection name. [`FileSeedProvider`] looks in
//! the seed directory for, in order:
//!
//! - `<dir>/<collection>.json`
//! - `<dir>/<collection>.toml`
//! - `<dir>/<collection>/index.json`
//! - `<dir>/<collection>/index.toml`
//!
//! JSON files are MongoDB extended JSON, so `{"$oid": "..."}` and
//! `{"$date": "..."}` become real BSON values. A file may hold a single
//! document, an array of documents, or a document whose `default` key is an
//! array of documents.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use bson::{Bson, Document};
use tracing::{debug, warn};

use crate::config::SeedConfig;
use crate::error::{SeedError, SeedResult};

/// Key whose array value is used in preference to the rest of the file.
pub const DEFAULT_EXPORT_KEY: &str = "default";

/// Source of seed records for a collection.
pub trait SeedProvider: Send + Sync {
    /// Load the seeds for `collection`.
    ///
    /// Never fails: anything that cannot be loaded yields an empty list.
    fn load(&self, collection: &str) -> Vec<Document>;
}

/// Seeds read from files in a directory.
#[derive(Debug, Clone)]
pub struct FileSeedProvider {
    dir: PathBuf,
}

impl FileSeedProvider {
    /// Read seeds from `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Read seeds from the directory configured in `config`.
    pub fn from_config(config: &SeedConfig) -> Self {
        Self::new(config.seed_dir())
    }

    /// The directory searched.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Candidate files for `collection`, in lookup order.
    pub fn candidates(&self, collection: &str) -> [PathBuf; 4] {
        [
            self.dir.join(format!("{collection}.json")),
            self.dir.join(format!("{collection}.toml")),
            self.dir.join(collection).join("index.json"),
            self.dir.join(collection).join("index.toml"),
        ]
    }

    /// First existing candidate file for `collection`.
    pub fn locate(&self, collection: &str) -> Option<PathBuf> {
        self.candidates(collection)
            .into_iter()
            .find(|path| path.is_file())
    }
}

impl SeedProvider for FileSeedProvider {
    fn load(&self, collection: &str) -> Vec<Document> {
        let Some(path) = self.locate(collection) else {
            debug!(collection, dir = %self.dir.display(), "No seed file found");
            return Vec::new();
        };

        match read_seed_file(&path) {
            Ok(records) => {
                debug!(collection, path = %path.display(), count = records.len(), "Loaded seed file");
                records
            }
            Err(err) => {
                warn!(collection, path = %path.display(), error = %err, "Failed to load seed file");
                Vec::new()
            }
        }
    }
}

/// Read a JSON or TOML seed file into a list of records.
pub fn read_seed_file(path: &Path) -> SeedResult<Vec<Document>> {
    let text = fs::read_to_string(path)?;
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase);

    let value: serde_json::Value = match extension.as_deref() {
        Some("json") => serde_json::from_str(&text)?,
        Some("toml") => toml::from_str(&text)?,
        _ => return Err(SeedError::UnsupportedSeedFile(path.display().to_string())),
    };

    records_from_value(value)
}

/// Convert a parsed extended JSON value into a list of records.
pub fn records_from_value(value: serde_json::Value) -> SeedResult<Vec<Document>> {
    let value = Bson::try_from(value)?;
    Ok(records_from_bson(value))
}

fn records_from_bson(value: Bson) -> Vec<Document> {
    match value {
        Bson::Document(mut doc) => match doc.remove(DEFAULT_EXPORT_KEY) {
            Some(Bson::Array(items)) => documents(items),
            Some(other) => {
                doc.insert(DEFAULT_EXPORT_KEY, other);
                vec![doc]
            }
            None => vec![doc],
        },
        Bson::Array(items) => documents(items),
        _ => Vec::new(),
    }
}

fn documents(items: Vec<Bson>) -> Vec<Document> {
    items
        .into_iter()
        .filter_map(|item| match item {
            Bson::Document(doc) => Some(doc),
            _ => None,
        })
        .collect()
}

/// Seeds held in memory, keyed by collection name.
#[derive(Debug, Clone, Default)]
pub struct StaticSeedProvider {
    seeds: HashMap<String, Vec<Document>>,
}

impl StaticSeedProvider {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add seeds for a collection.
    pub fn with(mut self, collection: impl Into<String>, seeds: Vec<Document>) -> Self {
        self.seeds.insert(collection.into(), seeds);
        self
    }
}

impl SeedProvider for StaticSeedProvider {
    fn load(&self, collection: &str) -> Vec<Document> {
        self.seeds.get(collection).cloned().unwrap_or_default()
    }
}

/// Provider that never has seeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSeeds;

impl SeedProvider for NoSeeds {
    fn load(&self, _collection: &str) -> Vec<Document> {
        Vec::new()
    }
}
