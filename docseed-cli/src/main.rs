//! docseed CLI - Command-line seeding runner.

use clap::Parser;

use docseed_cli::cli::{Cli, Command};
use docseed_cli::commands;
use docseed_cli::commands::seed::Mode;
use docseed_cli::error::CliResult;
use docseed_cli::output;

#[tokio::main]
async fn main() {
    docseed_core::logging::init();

    if let Err(e) = run().await {
        output::newline();
        output::error("docseed failed");
        eprintln!("{:?}", miette::Report::new(e));
        std::process::exit(1);
    }
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Seed(args) => commands::seed::run(cli.global, args, Mode::Seed).await,
        Command::ClearAndSeed(args) => {
            commands::seed::run(cli.global, args, Mode::ClearAndSeed).await
        }
        Command::Version => commands::version::run().await,
    }
}
