use clap::Parser;
use owo_colors::OwoColorize;
use sieve_core::SieveConfig;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod output;

use cli::{Cli, Commands};
use commands::*;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays pipeable
    let default_filter = match cli.verbose {
        0 => "sieve=info",
        1 => "sieve=debug",
        _ => "debug",
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(&cli).await {
        eprintln!("{}: {}", "Error".red().bold(), e);
        process::exit(1);
    }
}

async fn run(cli: &Cli) -> commands::Result<()> {
    let config = SieveConfig::load(cli.config.as_deref())?;

    match &cli.command {
        Commands::Search { query, engine } => search::run(cli, &config, query, *engine).await,
        Commands::Read {
            urls,
            timeout,
            format,
        } => read::run(cli, &config, urls, *timeout, *format).await,
    }
}
