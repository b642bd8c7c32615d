//! Sync pipeline used by `ysync sync`.
//!
//! Steps run strictly in order:
//! 1. Check credentials; when missing nothing else runs.
//! 2. Load the previous `index.json`.
//! 3. Optionally `clean` the tool's cache.
//! 4. Run `sync --env <env_file>`.
//! 5. On success, rebuild and write the index.
//! 6. Write the report and the state pointer, success or not.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use ysync_core::{config, DocumentMeta, Settings, SyncReport};

use crate::classify::classify_failure;
use crate::error::SyncError;
use crate::index;
use crate::invoker::{ToolInvoker, ToolOutput};
use crate::report::generate_report;
use crate::store;

/// A workspace root with its settings and resolved output directory.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub root: PathBuf,
    pub settings: Settings,
    pub output_dir: PathBuf,
}

impl Workspace {
    pub fn load(root: &Path) -> Result<Self, SyncError> {
        let settings = config::load_at(root)?;
        let output_dir = config::resolve_output_dir(root)?;
        Ok(Self {
            root: root.to_path_buf(),
            settings,
            output_dir,
        })
    }

    pub fn env_file(&self) -> PathBuf {
        self.settings.env_file_at(&self.root)
    }

    pub fn invoker(&self) -> ToolInvoker {
        ToolInvoker::from_settings(&self.settings.tool, &self.root)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Run `<tool> clean` before syncing.
    pub clean: bool,
}

/// Everything a caller needs to render the result of a run.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub report: SyncReport,
    /// Output of the last tool invocation (`clean` if it failed, else `sync`).
    pub tool: ToolOutput,
    /// Markdown files the index builder could not read.
    pub skipped: usize,
}

impl SyncOutcome {
    pub fn success(&self) -> bool {
        self.report.success
    }
}

/// Run the full sync pipeline once.
///
/// Returns `Err` only for missing configuration or when the report itself
/// cannot be written; tool failures come back as an unsuccessful report.
pub async fn run(
    workspace: &Workspace,
    invoker: &ToolInvoker,
    options: SyncOptions,
) -> Result<SyncOutcome, SyncError> {
    let env_file = workspace.env_file();
    config::load_credentials(&env_file)?;

    let started_at = Utc::now();
    let output_dir = workspace.output_dir.as_path();
    let previous = load_previous(output_dir);

    if options.clean {
        tracing::info!("cleaning tool cache");
        let cleaned = invoker.clean().await;
        if !cleaned.success {
            return finish_failed(output_dir, started_at, &previous, cleaned);
        }
    }

    tracing::info!("running {} sync", invoker.program());
    let tool = invoker.sync(&env_file).await;
    if !tool.success {
        return finish_failed(output_dir, started_at, &previous, tool);
    }

    match index::rebuild_index(output_dir) {
        Ok(build) => {
            let report = generate_report(
                output_dir,
                started_at,
                true,
                &previous,
                &build.index.documents,
                None,
            )?;
            Ok(SyncOutcome {
                report,
                tool,
                skipped: build.skipped,
            })
        }
        Err(err) => {
            tracing::warn!("index build failed: {err}");
            let report = generate_report(
                output_dir,
                started_at,
                false,
                &previous,
                &previous,
                Some(vec![format!("index build failed: {err}")]),
            )?;
            Ok(SyncOutcome {
                report,
                tool,
                skipped: 0,
            })
        }
    }
}

fn finish_failed(
    output_dir: &Path,
    started_at: DateTime<Utc>,
    previous: &[DocumentMeta],
    tool: ToolOutput,
) -> Result<SyncOutcome, SyncError> {
    let errors = classify_failure(&tool);
    let report = generate_report(output_dir, started_at, false, previous, previous, Some(errors))?;
    Ok(SyncOutcome {
        report,
        tool,
        skipped: 0,
    })
}

/// Previous manifest's documents; a missing or corrupt index counts as empty.
fn load_previous(output_dir: &Path) -> Vec<DocumentMeta> {
    match store::load_index(output_dir) {
        Ok(Some(index)) => index.documents,
        Ok(None) => Vec::new(),
        Err(err) => {
            tracing::warn!("ignoring unreadable previous index: {err}");
            Vec::new()
        }
    }
}
