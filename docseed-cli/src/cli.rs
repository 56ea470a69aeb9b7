//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// docseed - Declarative seeding for MongoDB
#[derive(Parser, Debug)]
#[command(name = "docseed")]
#[command(author = "Pegasus Heavy Industries LLC")]
#[command(version)]
#[command(about = "docseed - Declarative seeding for MongoDB", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Connection and seed location options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// MongoDB connection URI
    #[arg(long, global = true, env = "MONGODB_URI")]
    pub uri: Option<String>,

    /// Database name (defaults to the database in the URI)
    #[arg(long, global = true, env = "MONGODB_DATABASE")]
    pub database: Option<String>,

    /// Base directory for relative seed paths
    #[arg(long, global = true, env = "BASE_PATH")]
    pub base_path: Option<PathBuf>,

    /// Seed file directory (defaults to <BASE_PATH>/seeds)
    #[arg(long, global = true, env = "SEED_PATH")]
    pub seed_path: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Upsert seeds into the given models
    Seed(SeedArgs),

    /// Delete all documents of each model, then seed it
    ClearAndSeed(SeedArgs),

    /// Display version information
    Version,
}

/// Arguments for the `seed` and `clear-and-seed` commands
#[derive(Args, Debug, Clone)]
pub struct SeedArgs {
    /// Models to seed, in order (e.g. Parent Child)
    #[arg(required = true)]
    pub models: Vec<String>,

    /// JSON or TOML file used for every model instead of the seed directory
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// Keep stored values when merging (stored record wins)
    #[arg(long)]
    pub fresh: bool,

    /// Upsert each seed in a single atomic round trip
    #[arg(long)]
    pub atomic: bool,
}
