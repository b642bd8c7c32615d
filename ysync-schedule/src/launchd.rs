//! Registration of job files with the OS service manager.

use std::path::Path;
use std::process::Command;

use crate::error::{io_err, ScheduleError};

/// Loads and unloads job files. Implemented by [`Launchctl`] in production
/// and by recording doubles in tests.
pub trait ServiceManager {
    fn load(&self, plist: &Path) -> Result<(), ScheduleError>;
    fn unload(&self, plist: &Path) -> Result<(), ScheduleError>;
}

/// `launchctl load -w` / `launchctl unload -w`.
#[derive(Debug, Clone)]
pub struct Launchctl {
    program: String,
}

impl Launchctl {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(&self, action: &'static str, plist: &Path) -> Result<(), ScheduleError> {
        tracing::debug!("{} {action} -w {}", self.program, plist.display());
        let output = Command::new(&self.program)
            .arg(action)
            .arg("-w")
            .arg(plist)
            .output()
            .map_err(|e| io_err(&self.program, e))?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let message = match (stdout.is_empty(), stderr.is_empty()) {
            (true, true) => "no output".to_string(),
            (false, true) => stdout,
            (true, false) => stderr,
            (false, false) => format!("{stdout} {stderr}"),
        };
        Err(ScheduleError::Launchctl {
            program: self.program.clone(),
            action,
            status: output.status.code(),
            message,
        })
    }
}

impl Default for Launchctl {
    fn default() -> Self {
        Self::new("launchctl")
    }
}

impl ServiceManager for Launchctl {
    fn load(&self, plist: &Path) -> Result<(), ScheduleError> {
        self.run("load", plist)
    }

    fn unload(&self, plist: &Path) -> Result<(), ScheduleError> {
        self.run("unload", plist)
    }
}
