//! `ysync schedule`: daily launchd job that runs `ysync sync`.

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;

use ysync_core::config;
use ysync_schedule::{JobRequest, Launchctl, SchedulePaths, Scheduler};

use super::print_json;

#[derive(Subcommand, Debug)]
pub enum ScheduleCommand {
    /// Install (or replace) the daily sync job and register it with launchd.
    Enable(EnableArgs),
    /// Unregister and remove the daily sync job.
    Disable,
    /// Show whether the job is installed and when it runs.
    Status(ScheduleStatusArgs),
}

#[derive(Args, Debug)]
pub struct EnableArgs {
    /// Hour of day to run, 0-23.
    #[arg(long, default_value_t = 9, value_parser = clap::value_parser!(u8).range(0..=23))]
    pub hour: u8,

    /// Minute of the hour to run, 0-59.
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=59))]
    pub minute: u8,
}

#[derive(Args, Debug)]
pub struct ScheduleStatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run(command: ScheduleCommand, root: &Path) -> Result<()> {
    let settings = config::load_at(root).context("failed to load ysync.yaml")?;
    let home = config::home().context("could not determine home directory")?;
    let scheduler = Scheduler::new(
        SchedulePaths::from_settings(&settings.schedule, root, &home),
        Launchctl::new(settings.schedule.launchctl.clone()),
    );

    match command {
        ScheduleCommand::Enable(args) => {
            let exe = std::env::current_exe().context("could not locate the ysync binary")?;
            let request = JobRequest {
                program_arguments: vec![
                    exe.display().to_string(),
                    "--workdir".to_string(),
                    root.display().to_string(),
                    "sync".to_string(),
                ],
                working_directory: root.to_path_buf(),
                hour: args.hour,
                minute: args.minute,
            };
            let job = scheduler
                .enable(request)
                .context("failed to enable schedule")?;
            println!(
                "{} daily sync scheduled at {}",
                "✓".green().bold(),
                job.time()
            );
            println!("  job file  {}", scheduler.paths().plist_path().display());
            println!("  logs      {}", job.stdout_path.display());
        }
        ScheduleCommand::Disable => {
            if scheduler.disable().context("failed to disable schedule")? {
                println!("{} daily sync schedule removed", "✓".green().bold());
            } else {
                println!("no schedule installed");
            }
        }
        ScheduleCommand::Status(args) => {
            let status = scheduler.status().context("failed to read schedule")?;
            if args.json {
                return print_json(&status);
            }
            if status.enabled {
                println!(
                    "{} daily at {}",
                    "enabled".green().bold(),
                    status.time().unwrap_or_else(|| "unknown time".to_string())
                );
                println!("  job file  {}", status.plist_path.display());
                if let Some(log) = &status.stdout_path {
                    println!("  logs      {}", log.display());
                }
            } else {
                println!("{}", "disabled".bright_black());
            }
        }
    }
    Ok(())
}
