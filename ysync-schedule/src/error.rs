use std::path::PathBuf;

use thiserror::Error;

/// Error surface for rendering, registering and reading back the sync job.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error("failed to read job file {path}: {source}")]
    Plist {
        path: PathBuf,
        #[source]
        source: plist::Error,
    },

    /// The service manager rejected a command.
    #[error("{program} {action} failed ({}): {message}", status_text(.status))]
    Launchctl {
        program: String,
        action: &'static str,
        status: Option<i32>,
        message: String,
    },

    #[error("invalid schedule time {hour:02}:{minute:02} (hour 0-23, minute 0-59)")]
    InvalidTime { hour: u8, minute: u8 },
}

impl ScheduleError {
    /// Exit code of the failed service-manager command, if any.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Launchctl { status, .. } => *status,
            _ => None,
        }
    }
}

fn status_text(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit code {code}"),
        None => "terminated by a signal".to_string(),
    }
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ScheduleError {
    ScheduleError::Io {
        path: path.into(),
        source,
    }
}
