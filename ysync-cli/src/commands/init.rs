//! `ysync init`: interactive credential and workspace setup.

use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use ysync_core::config::{self, DEFAULT_HOST};
use ysync_core::paths::{settings_path, tool_config_path, DEFAULT_OUTPUT_DIR};
use ysync_core::{Credentials, Settings};
use ysync_sync::ToolInvoker;

use super::runtime;

/// Arguments for `ysync init`.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing credentials file.
    #[arg(long)]
    pub force: bool,

    /// Directory the sync tool writes Markdown into, relative to the workspace.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<String>,
}

impl InitArgs {
    pub fn run(self, workspace: &Path) -> Result<()> {
        let settings = config::load_at(workspace).context("failed to load ysync.yaml")?;
        let env_file = settings.env_file_at(workspace);
        if env_file.exists() && !self.force {
            bail!(
                "{} already exists; pass --force to overwrite it",
                env_file.display()
            );
        }

        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut stdout = io::stdout();
        let credentials = prompt_credentials(&mut input, &mut stdout)?;

        config::write_credentials(&env_file, &credentials)
            .with_context(|| format!("failed to write {}", env_file.display()))?;
        println!("{} wrote {}", "✓".green(), env_file.display());

        let tool_config = tool_config_path(workspace);
        if !tool_config.exists() {
            scaffold_tool_config(workspace, &settings);
        }
        match self.output_dir.as_deref() {
            Some(dir) => {
                config::set_output_dir_at(workspace, dir)
                    .with_context(|| format!("failed to update {}", tool_config.display()))?;
                println!("{} set output directory to {dir}", "✓".green());
            }
            None if !tool_config.exists() => {
                config::set_output_dir_at(workspace, DEFAULT_OUTPUT_DIR)
                    .with_context(|| format!("failed to write {}", tool_config.display()))?;
                println!("{} wrote {}", "✓".green(), tool_config.display());
            }
            None => {}
        }

        if !settings_path(workspace).exists() {
            config::save_at(workspace, &Settings::default())
                .context("failed to write ysync.yaml")?;
            println!("{} wrote {}", "✓".green(), settings_path(workspace).display());
        }

        let output_dir = config::resolve_output_dir(workspace)
            .context("failed to resolve output directory")?;
        std::fs::create_dir_all(&output_dir)
            .with_context(|| format!("failed to create {}", output_dir.display()))?;
        println!("{} output directory {}", "✓".green(), output_dir.display());
        println!("Run `ysync sync` to fetch documents.");
        Ok(())
    }
}

/// Best effort `<tool> init`; the defaults below cover a tool that is
/// missing or writes nothing.
fn scaffold_tool_config(workspace: &Path, settings: &Settings) {
    let invoker = ToolInvoker::from_settings(&settings.tool, workspace);
    let output = match runtime() {
        Ok(rt) => rt.block_on(invoker.init()),
        Err(err) => {
            tracing::warn!("skipping {} init: {err:#}", invoker.program());
            return;
        }
    };
    if output.success {
        tracing::info!("{} init finished", invoker.program());
    } else {
        tracing::warn!(
            "{} init failed: {}",
            invoker.program(),
            output.stderr.trim()
        );
    }
}

fn prompt_credentials<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<Credentials> {
    let token = prompt(input, out, "Yuque token", None)?;
    let login = prompt(input, out, "Yuque login", None)?;
    let repo = prompt(input, out, "Knowledge base (repo slug)", None)?;
    let host = prompt(input, out, "Host", Some(DEFAULT_HOST))?;
    Ok(Credentials {
        token,
        login,
        repo,
        host: Some(host),
    })
}

/// Read one trimmed line. Empty input takes `default`, or fails without one.
fn prompt<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    label: &str,
    default: Option<&str>,
) -> Result<String> {
    match default {
        Some(default) => write!(out, "{label} [{default}]: ")?,
        None => write!(out, "{label}: ")?,
    }
    out.flush()?;

    let mut line = String::new();
    input
        .read_line(&mut line)
        .with_context(|| format!("failed to read {label}"))?;
    let value = line.trim();
    if !value.is_empty() {
        return Ok(value.to_string());
    }
    match default {
        Some(default) => Ok(default.to_string()),
        None => bail!("{label} is required"),
    }
}
