// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! streamsync CLI
//!
//! Replays driver scenarios through the sync engine and validates engine
//! configuration.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod scenario;

#[derive(Parser)]
#[command(name = "streamsync")]
#[command(author, version, about = "Multi-stream sync engine CLI", long_about = None)]
struct Cli {
    /// Log filter (e.g. "debug", "streamsync=trace"). Overrides RUST_LOG.
    #[arg(long, global = true, value_name = "FILTER")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scenario file and print one JSON line per engine output
    Replay {
        /// Scenario file (YAML)
        #[arg(value_name = "SCENARIO")]
        scenario: PathBuf,

        /// Pretty-print each output
        #[arg(long)]
        pretty: bool,

        /// Stop at the first rejected step
        #[arg(long)]
        strict: bool,

        /// Print the final engine snapshot after the last step
        #[arg(long)]
        snapshot: bool,
    },

    /// Validate a scenario file or a directory holding streamsync.yaml
    Validate {
        #[arg(value_name = "SCENARIO|DIR")]
        path: PathBuf,
    },
}

fn init_logging(log_level: Option<&str>) {
    use tracing_subscriber::prelude::*;

    let env_filter = match log_level {
        Some(filter) => tracing_subscriber::EnvFilter::try_new(filter).map_err(|_| ()),
        None => tracing_subscriber::EnvFilter::try_from_default_env().map_err(|_| ()),
    }
    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    // stdout carries the replay output, so logs go to stderr.
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    match cli.command {
        Commands::Replay {
            scenario,
            pretty,
            strict,
            snapshot,
        } => commands::replay::run(
            &scenario,
            commands::replay::ReplayOptions {
                pretty,
                strict,
                snapshot,
            },
        ),
        Commands::Validate { path } => commands::validate::run(&path),
    }
}
