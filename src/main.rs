//! Binary entry point for monet.
//!
//! This binary manages the platform's database: migrations, their status,
//! content loading and full-text search.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow unnecessary_wraps for consistent command function signatures
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::multiple_crate_versions)]

mod commands;

use clap::{Parser, Subcommand};
use monet::SearchTarget;
use monet::config::MonetConfig;
use monet::io::ContentKind;
use monet::observability::{self, LoggingConfig};
use std::path::PathBuf;
use std::process::ExitCode;

/// Monet - storage tooling for a personal content platform.
#[derive(Parser)]
#[command(name = "monet")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file (default: `$MONET_CONFIG_PATH`).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Apply pending migrations for every app.
    Migrate,

    /// Show the latest applied migration of every app.
    Status {
        /// Print JSON instead of one line per app.
        #[arg(long)]
        json: bool,
    },

    /// Revert the latest migration of one app.
    Downgrade {
        /// App (migration set) name, e.g. `post`.
        name: String,
    },

    /// Full-text search over posts, bookmarks or events.
    Search {
        /// What to search: posts, bookmarks or events.
        target: SearchTarget,

        /// The search query; any input is accepted.
        query: String,

        /// Page number, starting at 1.
        #[arg(short, long, default_value_t = 1)]
        page: u32,

        /// Print JSON.
        #[arg(long)]
        json: bool,
    },

    /// Load archived content from a file of JSON objects.
    Load {
        /// What the file holds: posts, events or pages.
        kind: ContentKind,

        /// Path to the archive file.
        file: PathBuf,
    },

    /// Show version information.
    Version,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match MonetConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    let verbose = cli.verbose || config.debug;
    let logging = match LoggingConfig::from_settings(&config.logging, verbose) {
        Ok(logging) => logging,
        Err(e) => {
            eprintln!("Invalid logging configuration: {e}");
            return ExitCode::FAILURE;
        },
    };
    if let Err(e) = observability::init(logging) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
fn run_command(command: Commands, config: &MonetConfig) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Migrate => commands::cmd_migrate(config),
        Commands::Status { json } => commands::cmd_status(config, json),
        Commands::Downgrade { name } => commands::cmd_downgrade(config, &name),
        Commands::Search {
            target,
            query,
            page,
            json,
        } => commands::cmd_search(config, target, &query, page, json),
        Commands::Load { kind, file } => commands::cmd_load(config, kind, &file),
        Commands::Version => commands::cmd_version(),
    }
}
