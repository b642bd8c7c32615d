//! `ysync status`: read-only view of configuration, last sync and schedule.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use ysync_core::{config, paths::tool_config_path, Settings, SyncState, SyncSummary};
use ysync_schedule::{Launchctl, SchedulePaths, ScheduleStatus, Scheduler};
use ysync_sync::{store, ToolInvoker};

use super::{format_age, print_json, runtime};

const VERSION_TIMEOUT: Duration = Duration::from_secs(10);

/// Arguments for `ysync status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self, root: &Path) -> Result<()> {
        let report = build_report(root)?;
        if self.json {
            return print_json(&report);
        }
        print_table(&report);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusReport {
    workspace: String,
    configured: bool,
    credentials: CredentialsStatus,
    tool_config: bool,
    output_dir: String,
    indexed_documents: Option<usize>,
    last_sync: Option<SyncState>,
    last_sync_age: Option<String>,
    last_report: Option<LastReport>,
    schedule: ScheduleStatus,
    tool: ToolStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CredentialsStatus {
    env_file: String,
    /// `ok`, `missing` or `invalid`.
    state: &'static str,
    login: Option<String>,
    repo: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LastReport {
    timestamp: DateTime<Utc>,
    success: bool,
    duration: u64,
    summary: SyncSummary,
    errors: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolStatus {
    program: String,
    version: Option<String>,
}

#[derive(Tabled)]
struct Row {
    #[tabled(rename = "item")]
    item: &'static str,
    #[tabled(rename = "value")]
    value: String,
}

fn build_report(root: &Path) -> Result<StatusReport> {
    let settings = config::load_at(root).context("failed to load ysync.yaml")?;
    let output_dir =
        config::resolve_output_dir(root).context("failed to resolve output directory")?;
    let credentials = credentials_status(root, &settings);

    let index = store::load_index(&output_dir).context("failed to read index.json")?;
    let last_sync = store::load_state(&output_dir).context("failed to read sync state")?;
    let last_report = store::load_report(&output_dir)
        .context("failed to read sync report")?
        .map(|report| LastReport {
            timestamp: report.timestamp,
            success: report.success,
            duration: report.duration,
            summary: report.summary,
            errors: report.errors.unwrap_or_default(),
        });

    let home = config::home().context("could not determine home directory")?;
    let scheduler = Scheduler::new(
        SchedulePaths::from_settings(&settings.schedule, root, &home),
        Launchctl::new(settings.schedule.launchctl.clone()),
    );
    let schedule = scheduler.status().context("failed to read schedule")?;

    Ok(StatusReport {
        workspace: root.display().to_string(),
        configured: credentials.state == "ok",
        credentials,
        tool_config: tool_config_path(root).exists(),
        output_dir: output_dir.display().to_string(),
        indexed_documents: index.map(|index| index.total_documents),
        last_sync_age: last_sync.as_ref().map(|s| format_age(s.last_sync_at)),
        last_sync,
        last_report,
        schedule,
        tool: tool_status(root, &settings),
    })
}

fn credentials_status(root: &Path, settings: &Settings) -> CredentialsStatus {
    let env_file = settings.env_file_at(root);
    let mut status = CredentialsStatus {
        env_file: env_file.display().to_string(),
        state: "ok",
        login: None,
        repo: None,
        error: None,
    };
    match config::load_credentials(&env_file) {
        Ok(credentials) => {
            status.login = Some(credentials.login);
            status.repo = Some(credentials.repo);
        }
        Err(err) => {
            status.state = if env_file.exists() { "invalid" } else { "missing" };
            status.error = Some(err.to_string());
        }
    }
    status
}

/// First line of `<tool> --version`, or `None` when it cannot be run.
fn tool_status(root: &Path, settings: &Settings) -> ToolStatus {
    let invoker =
        ToolInvoker::from_settings(&settings.tool, root).with_timeout(VERSION_TIMEOUT);
    let version = runtime().ok().and_then(|rt| {
        let output = rt.block_on(invoker.version());
        output
            .success
            .then(|| output.stdout.lines().next().unwrap_or_default().trim().to_string())
            .filter(|v| !v.is_empty())
    });
    ToolStatus {
        program: settings.tool.program.clone(),
        version,
    }
}

fn print_table(report: &StatusReport) {
    println!("ysync v{} | {}", env!("CARGO_PKG_VERSION"), report.workspace);

    let credentials = match (report.credentials.state, &report.credentials.login) {
        ("ok", Some(login)) => format!(
            "{} {login}/{}",
            "ok".green(),
            report.credentials.repo.as_deref().unwrap_or_default()
        ),
        (state, _) => format!(
            "{} {}",
            state.red(),
            report.credentials.error.as_deref().unwrap_or_default()
        ),
    };

    let last_sync = match (&report.last_sync, &report.last_sync_age) {
        (Some(state), Some(age)) => {
            let outcome = if state.last_sync_success {
                "succeeded".green()
            } else {
                "failed".red()
            };
            format!("{outcome} {age} ago ({} documents)", state.total_documents)
        }
        _ => "never".bright_black().to_string(),
    };

    let last_report = match &report.last_report {
        Some(r) => format!(
            "+{} ~{} -{} in {}ms{}",
            r.summary.added,
            r.summary.updated,
            r.summary.deleted,
            r.duration,
            if r.errors.is_empty() {
                String::new()
            } else {
                format!(" ({})", r.errors.join("; "))
            }
        ),
        None => "none".bright_black().to_string(),
    };

    let schedule = if report.schedule.enabled {
        format!(
            "{} daily at {}",
            "enabled".green(),
            report.schedule.time().unwrap_or_else(|| "?".to_string())
        )
    } else {
        "disabled".bright_black().to_string()
    };

    let tool = match &report.tool.version {
        Some(version) => format!("{} {version}", report.tool.program),
        None => format!("{} {}", report.tool.program, "not found".red()),
    };

    let rows = vec![
        Row {
            item: "credentials",
            value: credentials,
        },
        Row {
            item: "tool config",
            value: if report.tool_config {
                "present".to_string()
            } else {
                "default".bright_black().to_string()
            },
        },
        Row {
            item: "output dir",
            value: report.output_dir.clone(),
        },
        Row {
            item: "indexed",
            value: report
                .indexed_documents
                .map(|n| format!("{n} documents"))
                .unwrap_or_else(|| "no index".to_string()),
        },
        Row {
            item: "last sync",
            value: last_sync,
        },
        Row {
            item: "last report",
            value: last_report,
        },
        Row {
            item: "schedule",
            value: schedule,
        },
        Row {
            item: "sync tool",
            value: tool,
        },
    ];

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    if !report.configured {
        println!("Run `ysync init` to configure credentials.");
    }
}
