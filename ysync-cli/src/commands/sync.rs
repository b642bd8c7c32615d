//! `ysync sync`: run the external tool, rebuild the index, report changes.

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use ysync_core::{ChangeKind, DocumentChange};
use ysync_sync::pipeline::{self, SyncOptions, SyncOutcome, Workspace};

use super::{display_relative, print_json, runtime};

/// Arguments for `ysync sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Print the sync report as JSON instead of a summary.
    #[arg(long)]
    pub json: bool,

    /// Also print the sync tool's own output and info-level logs.
    #[arg(long)]
    pub verbose: bool,

    /// Clear the sync tool's cache first, forcing a full download.
    #[arg(long)]
    pub clean: bool,
}

impl SyncArgs {
    pub fn run(self, root: &Path) -> Result<()> {
        let workspace = Workspace::load(root).context("failed to load workspace configuration")?;
        let invoker = workspace.invoker();
        let options = SyncOptions { clean: self.clean };

        let outcome = runtime()?
            .block_on(pipeline::run(&workspace, &invoker, options))
            .context("sync aborted")?;

        if self.json {
            print_json(&outcome.report)?;
        } else {
            print_outcome(&workspace, &outcome, self.verbose);
        }

        if !outcome.success() {
            bail!("sync failed");
        }
        Ok(())
    }
}

fn print_outcome(workspace: &Workspace, outcome: &SyncOutcome, verbose: bool) {
    if verbose {
        let tool_stdout = outcome.tool.stdout.trim();
        if !tool_stdout.is_empty() {
            println!("{}", tool_stdout.bright_black());
        }
    }

    let report = &outcome.report;
    if !report.success {
        println!("{} sync failed after {}ms", "✗".red().bold(), report.duration);
        for error in report.errors.iter().flatten() {
            println!("  {} {error}", "•".red());
        }
        return;
    }

    let summary = &report.summary;
    println!(
        "{} synced {} document(s) into {} in {}ms ({} added, {} updated, {} deleted)",
        "✓".green().bold(),
        summary.total,
        display_relative(&workspace.root, &workspace.output_dir),
        report.duration,
        summary.added,
        summary.updated,
        summary.deleted,
    );

    if report.changes.is_empty() {
        println!("  no changes");
    }
    for change in &report.changes {
        println!("  {}", change_line(change));
    }

    if outcome.skipped > 0 {
        println!(
            "{} {} Markdown file(s) could not be read and were left out of the index",
            "!".yellow().bold(),
            outcome.skipped
        );
    }
}

fn change_line(change: &DocumentChange) -> String {
    let marker = match change.kind {
        ChangeKind::Added => "+".green().bold(),
        ChangeKind::Updated => "~".yellow().bold(),
        ChangeKind::Deleted => "-".red().bold(),
    };
    format!("{marker} {} {}", change.title, change.path.bright_black())
}
