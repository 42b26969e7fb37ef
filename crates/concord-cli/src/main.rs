//! Concord CLI - consensus builder for multi-annotator curation.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::prelude::*;

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "concord=debug" } else { "concord=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match cli.command {
        Commands::Build {
            target,
            window,
            disagreements_only,
            json,
        } => commands::build::run(target, window, disagreements_only, json),

        Commands::Acquire { target, json } => commands::acquire::run(target, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
