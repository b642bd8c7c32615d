//! ysync: pull externally authored documents into a local Markdown tree.
//!
//! # Usage
//!
//! ```text
//! ysync [--workdir <dir>] init [--force] [--output-dir <dir>]
//! ysync [--workdir <dir>] sync [--json] [--verbose] [--clean]
//! ysync [--workdir <dir>] status [--json]
//! ysync [--workdir <dir>] schedule enable [--hour 0-23] [--minute 0-59]
//! ysync [--workdir <dir>] schedule disable
//! ysync [--workdir <dir>] schedule status [--json]
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{
    init::InitArgs, schedule::ScheduleCommand, status::StatusArgs, sync::SyncArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "ysync",
    version,
    about = "Sync Yuque documents into local Markdown and keep a manifest of them",
    long_about = None,
)]
struct Cli {
    /// Workspace root holding elog.config.json and .elog.env (default: current directory).
    #[arg(long, global = true, value_name = "DIR")]
    workdir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write credentials and tool configuration for a workspace.
    Init(InitArgs),

    /// Run the external sync tool, rebuild the index and write a report.
    Sync(SyncArgs),

    /// Show configuration, last sync and schedule without syncing.
    Status(StatusArgs),

    /// Manage the daily launchd job that runs `ysync sync`.
    Schedule {
        #[command(subcommand)]
        command: ScheduleCommand,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();

    let verbose = matches!(&cli.command, Commands::Sync(args) if args.verbose);
    init_tracing(if verbose { "info" } else { "warn" });

    let workspace = commands::workspace_root(cli.workdir)?;
    tracing::debug!("workspace root {}", workspace.display());
    match cli.command {
        Commands::Init(args) => args.run(&workspace),
        Commands::Sync(args) => args.run(&workspace),
        Commands::Status(args) => args.run(&workspace),
        Commands::Schedule { command } => commands::schedule::run(command, &workspace),
    }
}

/// Logs go to stderr so `--json` output stays a single document on stdout.
/// `RUST_LOG` overrides the default level.
fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
