//! `docseed seed` and `docseed clear-and-seed`.
//!
//! All listed models are registered before any is seeded, so `populate`
//! entries may reference each other; models are then seeded in the order
//! given.

use std::path::Path;

use docseed_core::source::read_seed_file;
use docseed_core::{Document, SeedConfig, SeedInput, UpsertStrategy};
use docseed_mongodb::config::database_from_uri;
use docseed_mongodb::{MongoClient, MongoConfig};

use crate::cli::{GlobalArgs, SeedArgs};
use crate::error::{CliError, CliResult};
use crate::output;

/// Which operation to run for each model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Upsert only.
    Seed,
    /// Delete everything, then upsert.
    ClearAndSeed,
}

impl Mode {
    fn verb(&self) -> &'static str {
        match self {
            Self::Seed => "Seeding",
            Self::ClearAndSeed => "Clearing and seeding",
        }
    }
}

/// Run the seed command
pub async fn run(global: GlobalArgs, args: SeedArgs, mode: Mode) -> CliResult<()> {
    let mongo = mongo_config(&global)?;
    let config = seed_config(SeedConfig::from_env(), &global, &args);
    let data = match &args.data {
        Some(path) => Some(load_data(path)?),
        None => None,
    };

    output::header(mode.verb());
    output::kv("Database", &mongo.database);
    match &args.data {
        Some(path) => output::kv("Data", &path.display().to_string()),
        None => output::kv("Seeds", &config.seed_dir().display().to_string()),
    }
    if config.fresh {
        output::kv("Merge", "stored values win");
    }
    if config.strategy == UpsertStrategy::Atomic {
        output::kv("Strategy", "atomic");
    }
    output::newline();

    let client = MongoClient::new(mongo).await?;
    for model in &args.models {
        client.model(model);
    }

    let total = args.models.len();
    let mut seeded_total = 0;
    for (index, model) in args.models.iter().enumerate() {
        output::step(index + 1, total, model);

        let seeder = client.seeder(model).config(config.clone()).build();
        let input = data.clone().map(SeedInput::Many).unwrap_or_default();
        let seeded = match mode {
            Mode::Seed => seeder.seed(input).await,
            Mode::ClearAndSeed => seeder.clear_and_seed(input).await,
        }
        .map_err(|e| CliError::seed(model, e))?;

        seeded_total += seeded.len();
        output::seeded(model, seeded.len());
    }

    output::newline();
    output::summary(seeded_total, total);
    Ok(())
}

/// MongoDB configuration from the global options.
pub fn mongo_config(global: &GlobalArgs) -> CliResult<MongoConfig> {
    let mut builder = MongoConfig::builder();
    if let Some(uri) = &global.uri {
        builder = builder.uri(uri);
    }
    let database = global
        .database
        .clone()
        .or_else(|| global.uri.as_deref().and_then(database_from_uri));
    match database {
        Some(database) => builder = builder.database(database),
        None => return Err(CliError::Config("database name is required".into())),
    }
    Ok(builder.build()?)
}

/// Seed configuration: `base` overridden by command-line options.
pub fn seed_config(base: SeedConfig, global: &GlobalArgs, args: &SeedArgs) -> SeedConfig {
    let mut config = base;
    if let Some(base_path) = &global.base_path {
        config.base_path = base_path.clone();
    }
    if let Some(seed_path) = &global.seed_path {
        config.seed_path = Some(seed_path.clone());
    }
    config.fresh |= args.fresh;
    if args.atomic {
        config.strategy = UpsertStrategy::Atomic;
    }
    config
}

fn load_data(path: &Path) -> CliResult<Vec<Document>> {
    read_seed_file(path).map_err(|e| CliError::Data(format!("{}: {}", path.display(), e)))
}
