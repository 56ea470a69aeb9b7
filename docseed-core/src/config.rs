//! Seeding configuration.
//!
//! Configuration is read once (usually with [`SeedConfig::from_env`]) and
//! handed to the [`Seeder`](crate::Seeder) at construction.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `BASE_PATH` | current dir | Base directory |
//! | `SEED_PATH` / `SEEDS_PATH` | `BASE_PATH/seeds` | Seed file directory |
//! | `SEED_FRESH` | `false` | Stored values win when merging |
//! | `SEED_ATOMIC` | `false` | Use the store's atomic upsert |

use std::env;
use std::path::{Path, PathBuf};

use crate::document::Precedence;
use crate::logging::is_truthy;

/// Default seed directory name under the base path.
pub const DEFAULT_SEED_DIR: &str = "seeds";

/// How an individual seed is reconciled with the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpsertStrategy {
    /// Look the record up, then `save` the merge or `create` the seed.
    #[default]
    FindThenSave,
    /// Delegate to [`Collection::merge_upsert`](crate::Collection::merge_upsert).
    Atomic,
}

/// Configuration for a seeder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedConfig {
    /// Base directory, used to locate the default seed directory.
    pub base_path: PathBuf,
    /// Explicit seed directory; relative paths resolve against `base_path`.
    pub seed_path: Option<PathBuf>,
    /// When true, stored values win over seed values on merge.
    pub fresh: bool,
    /// Reconciliation strategy.
    pub strategy: UpsertStrategy,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            base_path: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            seed_path: None,
            fresh: false,
            strategy: UpsertStrategy::FindThenSave,
        }
    }
}

impl SeedConfig {
    /// Create a new configuration builder.
    pub fn builder() -> SeedConfigBuilder {
        SeedConfigBuilder::default()
    }

    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read configuration through a variable lookup function.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut config = Self::default();
        if let Some(base) = non_empty("BASE_PATH") {
            config.base_path = PathBuf::from(base);
        }
        config.seed_path = non_empty("SEED_PATH")
            .or_else(|| non_empty("SEEDS_PATH"))
            .map(PathBuf::from);
        config.fresh = non_empty("SEED_FRESH").is_some_and(|v| is_truthy(&v));
        if non_empty("SEED_ATOMIC").is_some_and(|v| is_truthy(&v)) {
            config.strategy = UpsertStrategy::Atomic;
        }
        config
    }

    /// Directory searched for seed files.
    pub fn seed_dir(&self) -> PathBuf {
        match &self.seed_path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => self.base_path.join(path),
            None => self.base_path.join(DEFAULT_SEED_DIR),
        }
    }

    /// Merge precedence implied by `fresh`.
    pub fn precedence(&self) -> Precedence {
        Precedence::from_fresh(self.fresh)
    }
}

/// Builder for [`SeedConfig`].
#[derive(Debug, Default)]
pub struct SeedConfigBuilder {
    base_path: Option<PathBuf>,
    seed_path: Option<PathBuf>,
    fresh: bool,
    strategy: UpsertStrategy,
}

impl SeedConfigBuilder {
    /// Set the base directory.
    pub fn base_path(mut self, path: impl AsRef<Path>) -> Self {
        self.base_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the seed directory.
    pub fn seed_path(mut self, path: impl AsRef<Path>) -> Self {
        self.seed_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Let stored values win over seed values on merge.
    pub fn fresh(mut self, fresh: bool) -> Self {
        self.fresh = fresh;
        self
    }

    /// Set the upsert strategy.
    pub fn strategy(mut self, strategy: UpsertStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> SeedConfig {
        let defaults = SeedConfig::default();
        SeedConfig {
            base_path: self.base_path.unwrap_or(defaults.base_path),
            seed_path: self.seed_path,
            fresh: self.fresh,
            strategy: self.strategy,
        }
    }
}
