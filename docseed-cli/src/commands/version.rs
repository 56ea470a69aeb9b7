//! `docseed version`: version and the seeding environment in effect.

use docseed_core::logging::LogSettings;
use docseed_core::{SeedConfig, UpsertStrategy};

use crate::error::CliResult;
use crate::output::{self, kv};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run the version command
pub async fn run() -> CliResult<()> {
    output::banner(VERSION);
    output::newline();

    kv("Version", VERSION);
    kv("Build", if cfg!(debug_assertions) { "debug" } else { "release" });
    output::newline();

    let config = SeedConfig::from_env();
    output::section("Seeding");
    kv("Seeds", &config.seed_dir().display().to_string());
    kv("Merge", merge_label(config.fresh));
    kv("Strategy", strategy_label(config.strategy));
    output::newline();

    let logging = LogSettings::from_env();
    if logging.enabled {
        kv(
            "Logging",
            &format!("{} ({})", logging.level, logging.format.as_str()),
        );
    } else {
        output::dim("Logging: set DOCSEED_DEBUG=1 or DOCSEED_LOG_LEVEL=info");
    }

    Ok(())
}

fn merge_label(fresh: bool) -> &'static str {
    if fresh {
        "stored values win"
    } else {
        "seed values win"
    }
}

fn strategy_label(strategy: UpsertStrategy) -> &'static str {
    match strategy {
        UpsertStrategy::FindThenSave => "find then save",
        UpsertStrategy::Atomic => "atomic",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(merge_label(false), "seed values win");
        assert_eq!(merge_label(true), "stored values win");
        assert_eq!(strategy_label(UpsertStrategy::Atomic), "atomic");
    }
}
