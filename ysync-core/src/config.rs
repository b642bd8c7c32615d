//! Workspace configuration.
//!
//! # Storage layout
//!
//! ```text
//! <workspace>/
//!   ysync.yaml         (tool + schedule settings, optional)
//!   elog.config.json   (external tool config; declares the output dir)
//!   .elog.env          (credentials, mode 0600)
//! ```
//!
//! # API pattern
//!
//! Every function takes the workspace root explicitly so tests can point it
//! at a `TempDir`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{io_err, ConfigError};
use crate::paths::{
    launch_agents_dir, settings_path, tool_config_path, DEFAULT_ENV_FILE, DEFAULT_OUTPUT_DIR,
    DEFAULT_SCHEDULE_LABEL, DEFAULT_TOOL_PROGRAM,
};

// ---------------------------------------------------------------------------
// 1. Settings (ysync.yaml)
// ---------------------------------------------------------------------------

/// Root of `ysync.yaml`. Every field has a default, so an absent file is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub tool: ToolSettings,
    pub schedule: ScheduleSettings,
}

/// How to run the external document-sync binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    pub program: String,
    /// Arguments placed before every subcommand, e.g. `["elog"]` with `npx`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// Credentials file handed to the tool via `--env`; relative to the workspace.
    pub env_file: PathBuf,
    pub timeout_secs: u64,
    /// Seconds between SIGTERM and SIGKILL once the timeout fires.
    pub kill_grace_secs: u64,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            program: DEFAULT_TOOL_PROGRAM.to_string(),
            args: Vec::new(),
            env_file: PathBuf::from(DEFAULT_ENV_FILE),
            timeout_secs: 300,
            kill_grace_secs: 5,
        }
    }
}

impl ToolSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn kill_grace(&self) -> Duration {
        Duration::from_secs(self.kill_grace_secs)
    }
}

/// Where the launchd job and its bookkeeping live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSettings {
    pub label: String,
    /// Defaults to `~/Library/LaunchAgents`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agents_dir: Option<PathBuf>,
    pub launchctl: String,
    /// Defaults to `<workspace>/logs`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
    /// Defaults to `<workspace>/.ysync`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            label: DEFAULT_SCHEDULE_LABEL.to_string(),
            agents_dir: None,
            launchctl: "launchctl".to_string(),
            log_dir: None,
            state_dir: None,
        }
    }
}

impl ScheduleSettings {
    pub fn agents_dir_at(&self, home: &Path) -> PathBuf {
        self.agents_dir
            .clone()
            .unwrap_or_else(|| launch_agents_dir(home))
    }

    pub fn log_dir_at(&self, workspace: &Path) -> PathBuf {
        resolve(workspace, self.log_dir.as_deref().unwrap_or(Path::new("logs")))
    }

    pub fn state_dir_at(&self, workspace: &Path) -> PathBuf {
        resolve(
            workspace,
            self.state_dir.as_deref().unwrap_or(Path::new(".ysync")),
        )
    }
}

impl Settings {
    /// Absolute path of the credentials env file.
    pub fn env_file_at(&self, workspace: &Path) -> PathBuf {
        resolve(workspace, &self.tool.env_file)
    }
}

/// Load `<workspace>/ysync.yaml`, falling back to defaults when absent.
///
/// Returns `ConfigError::Parse` (with path) if the file is malformed.
pub fn load_at(workspace: &Path) -> Result<Settings, ConfigError> {
    let path = settings_path(workspace);
    if !path.exists() {
        return Ok(Settings::default());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    if contents.trim().is_empty() {
        return Ok(Settings::default());
    }
    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse { path, source: e })
}

/// Atomically save settings to `<workspace>/ysync.yaml`.
pub fn save_at(workspace: &Path, settings: &Settings) -> Result<(), ConfigError> {
    let path = settings_path(workspace);
    let yaml = serde_yaml::to_string(settings)?;
    write_atomic(&path, yaml.as_bytes())
}

// ---------------------------------------------------------------------------
// 2. Output directory (elog.config.json)
// ---------------------------------------------------------------------------

/// Resolve the output directory declared by the external tool's config.
///
/// Reads `deploy.local.outputDir` from `<workspace>/elog.config.json`. A missing
/// file or key falls back to [`DEFAULT_OUTPUT_DIR`]. Relative paths resolve
/// against the workspace.
pub fn resolve_output_dir(workspace: &Path) -> Result<PathBuf, ConfigError> {
    let path = tool_config_path(workspace);
    if !path.exists() {
        return Ok(workspace.join(DEFAULT_OUTPUT_DIR));
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    let value: Value = serde_json::from_str(&contents)
        .map_err(|e| ConfigError::ToolConfig { path, source: e })?;

    let declared = value
        .pointer("/deploy/local/outputDir")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty());
    Ok(resolve(
        workspace,
        Path::new(declared.unwrap_or(DEFAULT_OUTPUT_DIR)),
    ))
}

/// Write `deploy.local.outputDir` into the tool config, creating the file if
/// needed and preserving every other key.
pub fn set_output_dir_at(workspace: &Path, output_dir: &str) -> Result<(), ConfigError> {
    let path = tool_config_path(workspace);
    let mut value = if path.exists() {
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        serde_json::from_str(&contents).map_err(|e| ConfigError::ToolConfig {
            path: path.clone(),
            source: e,
        })?
    } else {
        default_tool_config()
    };

    insert_path(&mut value, &["deploy", "platform"], Value::from("local"));
    insert_path(&mut value, &["deploy", "local", "outputDir"], Value::from(output_dir));

    let json = serde_json::to_string_pretty(&value)?;
    write_atomic(&path, json.as_bytes())
}

fn default_tool_config() -> Value {
    serde_json::json!({
        "write": { "platform": "yuque" },
        "deploy": { "platform": "local", "local": { "outputDir": DEFAULT_OUTPUT_DIR } },
    })
}

/// Set a nested key, replacing any non-object value found along the way.
fn insert_path(value: &mut Value, keys: &[&str], leaf: Value) {
    let Some((first, rest)) = keys.split_first() else {
        *value = leaf;
        return;
    };
    if !value.is_object() {
        *value = Value::Object(Default::default());
    }
    if let Value::Object(map) = value {
        let child = map.entry(first.to_string()).or_insert(Value::Null);
        insert_path(child, rest, leaf);
    }
}

// ---------------------------------------------------------------------------
// 3. Credentials (.elog.env)
// ---------------------------------------------------------------------------

pub const TOKEN_KEY: &str = "YUQUE_TOKEN";
pub const LOGIN_KEY: &str = "YUQUE_LOGIN";
pub const REPO_KEY: &str = "YUQUE_REPO";
pub const HOST_KEY: &str = "YUQUE_HOST";
pub const DEFAULT_HOST: &str = "https://www.yuque.com";

/// Credentials the external tool reads from its env file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub login: String,
    pub repo: String,
    pub host: Option<String>,
}

impl Credentials {
    /// Render as dotenv lines.
    pub fn to_env(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("{TOKEN_KEY}={}\n", self.token));
        out.push_str(&format!("{LOGIN_KEY}={}\n", self.login));
        out.push_str(&format!("{REPO_KEY}={}\n", self.repo));
        if let Some(host) = &self.host {
            out.push_str(&format!("{HOST_KEY}={host}\n"));
        }
        out
    }
}

/// Load and validate credentials from a dotenv file.
///
/// The process environment is not modified.
pub fn load_credentials(env_file: &Path) -> Result<Credentials, ConfigError> {
    if !env_file.exists() {
        return Err(ConfigError::EnvFileMissing {
            path: env_file.to_path_buf(),
        });
    }
    let env_err = |source| ConfigError::EnvFile {
        path: env_file.to_path_buf(),
        source,
    };

    let mut token = None;
    let mut login = None;
    let mut repo = None;
    let mut host = None;
    for item in dotenvy::from_path_iter(env_file).map_err(env_err)? {
        let (key, value) = item.map_err(env_err)?;
        let value = value.trim().to_string();
        if value.is_empty() {
            continue;
        }
        match key.as_str() {
            TOKEN_KEY => token = Some(value),
            LOGIN_KEY => login = Some(value),
            REPO_KEY => repo = Some(value),
            HOST_KEY => host = Some(value),
            _ => {}
        }
    }

    let require = |value: Option<String>, key: &'static str| {
        value.ok_or_else(|| ConfigError::MissingCredential {
            key,
            path: env_file.to_path_buf(),
        })
    };
    Ok(Credentials {
        token: require(token, TOKEN_KEY)?,
        login: require(login, LOGIN_KEY)?,
        repo: require(repo, REPO_KEY)?,
        host,
    })
}

/// Write credentials to `env_file` with mode `0600`.
pub fn write_credentials(env_file: &Path, credentials: &Credentials) -> Result<(), ConfigError> {
    write_atomic(env_file, credentials.to_env().as_bytes())?;
    set_file_permissions(env_file)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Home directory of the current user.
pub fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

fn resolve(workspace: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        workspace.join(path)
    }
}

/// `.tmp` sibling + rename, so readers never see a half-written file.
fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
    }
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!("{file_name}.tmp"));
    std::fs::write(&tmp, contents).map_err(|e| io_err(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| io_err(path, e))?;
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| io_err(path, e))
}

#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}
