//! Error types for ysync-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while loading or writing workspace configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure, with the path that was being accessed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (write/save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// `ysync.yaml` exists but is malformed.
    #[error("failed to parse settings at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The external tool's JSON config exists but is malformed.
    #[error("failed to parse tool config at {path}: {source}")]
    ToolConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// JSON serialization error (write path).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// `dirs::home_dir()` returned `None`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    /// The credentials env file does not exist.
    #[error("env file not found at {path}; run `ysync init` first")]
    EnvFileMissing { path: PathBuf },

    /// The credentials env file could not be parsed.
    #[error("failed to read env file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    /// A required credential is absent or empty in the env file.
    #[error("{key} is not set in {path}; run `ysync init --force`")]
    MissingCredential { key: &'static str, path: PathBuf },
}

impl ConfigError {
    /// Whether the error means the workspace has not been set up yet.
    pub fn is_missing_configuration(&self) -> bool {
        matches!(
            self,
            ConfigError::EnvFileMissing { .. } | ConfigError::MissingCredential { .. }
        )
    }
}

/// Convenience constructor for [`ConfigError::Io`].
pub fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
