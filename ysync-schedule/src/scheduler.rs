//! Enable, disable and inspect the daily sync job.
//!
//! Files owned by a [`Scheduler`]:
//!
//! ```text
//! <agents_dir>/<label>.plist     job definition read by launchd
//! <state_dir>/schedule.json      structured copy, trusted while it matches the plist
//! <log_dir>/sync.log             job stdout
//! <log_dir>/sync-error.log       job stderr
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use ysync_core::ScheduleSettings;

use crate::error::{io_err, ScheduleError};
use crate::job::{load_sidecar, read_plist, render_plist, save_sidecar, validate_time, ScheduleConfig};
use crate::launchd::ServiceManager;

const SIDECAR_FILE: &str = "schedule.json";
const STDOUT_LOG: &str = "sync.log";
const STDERR_LOG: &str = "sync-error.log";

/// Every location the scheduler touches, resolved up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulePaths {
    pub label: String,
    pub agents_dir: PathBuf,
    pub log_dir: PathBuf,
    pub state_dir: PathBuf,
}

impl SchedulePaths {
    pub fn from_settings(settings: &ScheduleSettings, workspace: &Path, home: &Path) -> Self {
        Self {
            label: settings.label.clone(),
            agents_dir: settings.agents_dir_at(home),
            log_dir: settings.log_dir_at(workspace),
            state_dir: settings.state_dir_at(workspace),
        }
    }

    pub fn plist_path(&self) -> PathBuf {
        self.agents_dir.join(format!("{}.plist", self.label))
    }

    pub fn sidecar_path(&self) -> PathBuf {
        self.state_dir.join(SIDECAR_FILE)
    }

    pub fn stdout_log(&self) -> PathBuf {
        self.log_dir.join(STDOUT_LOG)
    }

    pub fn stderr_log(&self) -> PathBuf {
        self.log_dir.join(STDERR_LOG)
    }
}

/// What to run and when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    pub program_arguments: Vec<String>,
    pub working_directory: PathBuf,
    pub hour: u8,
    pub minute: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleStatus {
    pub enabled: bool,
    pub label: String,
    pub plist_path: PathBuf,
    pub hour: Option<u8>,
    pub minute: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr_path: Option<PathBuf>,
}

impl ScheduleStatus {
    /// `HH:MM` when both parts are known.
    pub fn time(&self) -> Option<String> {
        Some(format!("{:02}:{:02}", self.hour?, self.minute?))
    }
}

pub struct Scheduler<M> {
    paths: SchedulePaths,
    manager: M,
}

impl<M: ServiceManager> Scheduler<M> {
    pub fn new(paths: SchedulePaths, manager: M) -> Self {
        Self { paths, manager }
    }

    pub fn paths(&self) -> &SchedulePaths {
        &self.paths
    }

    pub fn manager(&self) -> &M {
        &self.manager
    }

    /// Write and register the job, replacing any existing one.
    ///
    /// Nothing is written when the time is out of range. When registration
    /// fails the new plist is removed again.
    pub fn enable(&self, request: JobRequest) -> Result<ScheduleConfig, ScheduleError> {
        validate_time(request.hour, request.minute)?;
        let config = ScheduleConfig {
            label: self.paths.label.clone(),
            program_arguments: request.program_arguments,
            working_directory: request.working_directory,
            hour: request.hour,
            minute: request.minute,
            stdout_path: self.paths.stdout_log(),
            stderr_path: self.paths.stderr_log(),
            run_at_load: false,
        };
        let rendered = render_plist(&config)?;

        let plist = self.paths.plist_path();
        if plist.exists() {
            if let Err(err) = self.manager.unload(&plist) {
                tracing::warn!("ignoring unload failure before re-enable: {err}");
            }
        }

        for dir in [
            &self.paths.agents_dir,
            &self.paths.log_dir,
            &self.paths.state_dir,
        ] {
            fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
        }
        fs::write(&plist, rendered).map_err(|e| io_err(&plist, e))?;

        if let Err(err) = self.manager.load(&plist) {
            if let Err(rm) = fs::remove_file(&plist) {
                tracing::warn!("failed to remove {}: {rm}", plist.display());
            }
            let sidecar = self.paths.sidecar_path();
            if sidecar.exists() {
                if let Err(rm) = fs::remove_file(&sidecar) {
                    tracing::warn!("failed to remove {}: {rm}", sidecar.display());
                }
            }
            return Err(err);
        }

        save_sidecar(&self.paths.sidecar_path(), &config)?;
        tracing::info!(
            "scheduled {} daily at {} ({})",
            config.label,
            config.time(),
            plist.display()
        );
        Ok(config)
    }

    /// Unregister and remove the job. Returns `false` when there was none.
    pub fn disable(&self) -> Result<bool, ScheduleError> {
        let plist = self.paths.plist_path();
        if !plist.exists() {
            return Ok(false);
        }

        if let Err(err) = self.manager.unload(&plist) {
            tracing::warn!("ignoring unload failure: {err}");
        }
        fs::remove_file(&plist).map_err(|e| io_err(&plist, e))?;

        let sidecar = self.paths.sidecar_path();
        if sidecar.exists() {
            fs::remove_file(&sidecar).map_err(|e| io_err(&sidecar, e))?;
        }
        tracing::info!("removed schedule {}", self.paths.label);
        Ok(true)
    }

    /// Read-only view of the job. The plist on disk is authoritative; the
    /// sidecar is used only while it still describes that plist.
    pub fn status(&self) -> Result<ScheduleStatus, ScheduleError> {
        let plist = self.paths.plist_path();
        let mut status = ScheduleStatus {
            enabled: plist.exists(),
            label: self.paths.label.clone(),
            plist_path: plist.clone(),
            hour: None,
            minute: None,
            stdout_path: None,
            stderr_path: None,
        };
        if !status.enabled {
            return Ok(status);
        }

        let summary = read_plist(&plist)?;
        let sidecar = match load_sidecar(&self.paths.sidecar_path()) {
            Ok(sidecar) => sidecar,
            Err(err) => {
                tracing::warn!("ignoring unreadable schedule sidecar: {err}");
                None
            }
        };
        match sidecar {
            Some(config) if summary.matches(&config) => {
                status.hour = Some(config.hour);
                status.minute = Some(config.minute);
                status.stdout_path = Some(config.stdout_path);
                status.stderr_path = Some(config.stderr_path);
            }
            stale => {
                if stale.is_some() {
                    tracing::debug!(
                        "schedule sidecar does not match {}; reading the plist",
                        plist.display()
                    );
                }
                status.hour = summary.hour;
                status.minute = summary.minute;
                status.stdout_path = summary.stdout_path;
                status.stderr_path = summary.stderr_path;
            }
        }
        Ok(status)
    }
}
