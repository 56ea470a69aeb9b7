//! Integration tests for the docseed CLI

use assert_cmd::Command;
use clap::Parser;
use docseed_cli::cli::{Cli, Command as CliCommand};
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Get the docseed binary
#[allow(deprecated)]
fn docseed_cmd() -> Command {
    let mut cmd = Command::cargo_bin("docseed").unwrap();
    cmd.env_remove("MONGODB_URI")
        .env_remove("MONGODB_DATABASE")
        .env_remove("BASE_PATH")
        .env_remove("SEED_PATH");
    cmd
}

#[test]
fn test_help_command() {
    docseed_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Declarative seeding for MongoDB"))
        .stdout(predicate::str::contains("seed"))
        .stdout(predicate::str::contains("clear-and-seed"))
        .stdout(predicate::str::contains("version"));
}

#[test]
fn test_version_command() {
    docseed_cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("Version"))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_seed_help() {
    docseed_cmd()
        .args(["seed", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--data"))
        .stdout(predicate::str::contains("--fresh"))
        .stdout(predicate::str::contains("--atomic"))
        .stdout(predicate::str::contains("--uri"));
}

#[test]
fn test_seed_requires_models() {
    docseed_cmd()
        .arg("seed")
        .assert()
        .failure()
        .stderr(predicate::str::contains("<MODELS>"));
}

#[test]
fn test_seed_without_database_fails() {
    docseed_cmd()
        .args(["seed", "User"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("database name is required"));
}

#[test]
fn test_seed_with_unreadable_data_fails() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("users.json");
    fs::write(&data, "{ not json").unwrap();

    docseed_cmd()
        .args(["seed", "User", "--database", "test", "--data"])
        .arg(&data)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Seed data error"));
}

#[test]
fn test_invalid_command() {
    docseed_cmd()
        .arg("plant")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_parse_seed_arguments() {
    let cli = Cli::try_parse_from([
        "docseed",
        "--uri",
        "mongodb://db:27017",
        "--database",
        "app",
        "seed",
        "Parent",
        "Child",
        "--data",
        "seeds.json",
        "--fresh",
    ])
    .unwrap();

    assert_eq!(cli.global.uri.as_deref(), Some("mongodb://db:27017"));
    assert_eq!(cli.global.database.as_deref(), Some("app"));
    match cli.command {
        CliCommand::Seed(args) => {
            assert_eq!(args.models, vec!["Parent", "Child"]);
            assert_eq!(args.data, Some(PathBuf::from("seeds.json")));
            assert!(args.fresh);
            assert!(!args.atomic);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn test_parse_global_options_after_subcommand() {
    let cli = Cli::try_parse_from([
        "docseed",
        "clear-and-seed",
        "User",
        "--atomic",
        "--seed-path",
        "fixtures",
        "--base-path",
        "/srv/app",
    ])
    .unwrap();

    assert_eq!(cli.global.seed_path, Some(PathBuf::from("fixtures")));
    assert_eq!(cli.global.base_path, Some(PathBuf::from("/srv/app")));
    match cli.command {
        CliCommand::ClearAndSeed(args) => {
            assert_eq!(args.models, vec!["User"]);
            assert!(args.atomic);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}
