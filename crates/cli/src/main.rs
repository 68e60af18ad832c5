//! `assess` binary.
//!
//! Events go to stdout (or `--output`); logs always go to stderr so the
//! NDJSON stream stays clean.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> color_eyre::Result<ExitCode> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Init { force, minimal } => commands::init(&cli.root, force, minimal).await,
        Commands::Checks { category } => commands::checks(&cli.root, category).await,
        Commands::Run {
            request,
            output,
            plan,
        } => commands::run(&cli.root, &request, output.as_deref(), plan).await,
        Commands::Serve { bind, token } => commands::serve(&cli.root, bind, token).await,
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
