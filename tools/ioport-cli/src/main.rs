//! IoPort CLI - offline tooling for port layouts, configs and playback logs
//!
//! # Commands
//!
//! - `ioport check` - Build a registry from a TOML layout and report errors
//! - `ioport defaults` - Print the builtin binding table
//! - `ioport config` - Parse and validate a configuration document
//! - `ioport log` - Decode a playback log
//!
//! # Usage
//!
//! ```bash
//! # Validate a layout, applying a saved session config on top
//! ioport check layout.toml --config sessions/pacman.toml
//!
//! # Player 2's default bindings
//! ioport defaults --player 2
//!
//! # Dump a log with a host header, 3 reads per frame, as JSON
//! ioport log session.log --header --groups 3 --json
//! ```
//!
//! Set `RUST_LOG=debug` for build and configuration details.

mod check;
mod config;
mod defaults;
mod log;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// IoPort CLI - offline tooling for the control-input port engine
#[derive(Parser)]
#[command(name = "ioport")]
#[command(about = "Inspect port layouts, configuration documents and playback logs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a registry from a TOML layout and report every configuration error
    Check(check::CheckArgs),

    /// Print the builtin binding table
    Defaults(defaults::DefaultsArgs),

    /// Parse and validate a configuration document
    Config(config::ConfigArgs),

    /// Decode a playback log
    Log(log::LogArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check(args) => check::execute(args),
        Commands::Defaults(args) => defaults::execute(args),
        Commands::Config(args) => config::execute(args),
        Commands::Log(args) => log::execute(args),
    }
}
