//! docseed CLI - Command-line seeding runner.
//!
//! Registers the requested models against a MongoDB database and seeds them
//! from the seed directory or an explicit data file.

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;
