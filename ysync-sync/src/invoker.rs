//! External document-sync tool invocation.
//!
//! [`ToolInvoker::run`] never fails: spawn errors, non-zero exits and timeouts
//! all come back as a [`ToolOutput`] with `success == false`, so callers branch
//! on one field.
//!
//! ## Timeout
//!
//! 1. Wait up to `timeout` for the process to exit and its pipes to close.
//! 2. Send SIGTERM.
//! 3. Wait up to `kill_grace` for the process to exit.
//! 4. Send SIGKILL.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

use ysync_core::ToolSettings;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_KILL_GRACE: Duration = Duration::from_secs(5);

/// Captured result of one tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was killed by a signal or never started.
    pub exit_code: Option<i32>,
    pub timed_out: bool,
}

impl ToolOutput {
    fn failure(stderr: String) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr,
            exit_code: None,
            timed_out: false,
        }
    }
}

/// Runs the external sync binary with an argument vector (no shell).
#[derive(Debug, Clone)]
pub struct ToolInvoker {
    program: String,
    base_args: Vec<String>,
    working_dir: PathBuf,
    timeout: Duration,
    kill_grace: Duration,
}

impl ToolInvoker {
    pub fn new(program: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            base_args: Vec::new(),
            working_dir: working_dir.into(),
            timeout: DEFAULT_TIMEOUT,
            kill_grace: DEFAULT_KILL_GRACE,
        }
    }

    pub fn from_settings(settings: &ToolSettings, workspace: &Path) -> Self {
        Self::new(settings.program.clone(), workspace)
            .with_base_args(settings.args.clone())
            .with_timeout(settings.timeout())
            .with_kill_grace(settings.kill_grace())
    }

    /// Arguments placed before every invocation's own arguments.
    pub fn with_base_args(mut self, base_args: Vec<String>) -> Self {
        self.base_args = base_args;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_kill_grace(mut self, kill_grace: Duration) -> Self {
        self.kill_grace = kill_grace;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// `<tool> sync --env <env_file>`
    pub async fn sync(&self, env_file: &Path) -> ToolOutput {
        self.run([OsStr::new("sync"), OsStr::new("--env"), env_file.as_os_str()])
            .await
    }

    /// `<tool> clean`: drops the tool's local cache so the next sync is full.
    pub async fn clean(&self) -> ToolOutput {
        self.run(["clean"]).await
    }

    /// `<tool> init`: lets the tool scaffold its own config file.
    pub async fn init(&self) -> ToolOutput {
        self.run(["init"]).await
    }

    /// `<tool> --version`
    pub async fn version(&self) -> ToolOutput {
        self.run(["--version"]).await
    }

    /// Spawn the tool once and collect its output.
    pub async fn run<I, S>(&self, args: I) -> ToolOutput
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = Command::new(&self.program);
        command
            .args(&self.base_args)
            .args(args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!("spawning {} in {}", self.program, self.working_dir.display());
        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(err) => {
                tracing::warn!("failed to start {}: {err}", self.program);
                return ToolOutput::failure(format!("failed to start {}: {err}", self.program));
            }
        };

        let mut stdout_task = drain(child.stdout.take());
        let mut stderr_task = drain(child.stderr.take());

        let finished = tokio::time::timeout(self.timeout, async {
            let status = child.wait().await;
            let stdout = (&mut stdout_task).await.unwrap_or_default();
            let stderr = (&mut stderr_task).await.unwrap_or_default();
            (status, stdout, stderr)
        })
        .await;

        match finished {
            Ok((Ok(status), stdout, stderr)) => {
                tracing::debug!("{} exited with {status}", self.program);
                ToolOutput {
                    success: status.success(),
                    stdout,
                    stderr,
                    exit_code: status.code(),
                    timed_out: false,
                }
            }
            Ok((Err(err), stdout, _)) => ToolOutput {
                stdout,
                ..ToolOutput::failure(format!("failed to wait for {}: {err}", self.program))
            },
            Err(_) => {
                stdout_task.abort();
                stderr_task.abort();
                tracing::warn!("{} timed out after {:?}", self.program, self.timeout);
                self.terminate(&mut child).await;
                ToolOutput {
                    timed_out: true,
                    ..ToolOutput::failure(format!(
                        "{} timed out after {:?}",
                        self.program, self.timeout
                    ))
                }
            }
        }
    }

    async fn terminate(&self, child: &mut Child) {
        if let Some(pid) = child.id() {
            if send_sigterm(pid).await
                && tokio::time::timeout(self.kill_grace, child.wait())
                    .await
                    .is_ok()
            {
                return;
            }
        }
        if let Err(err) = child.kill().await {
            tracing::warn!("failed to kill {}: {err}", self.program);
        }
    }
}

fn drain<R>(pipe: Option<R>) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf).await;
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

#[cfg(unix)]
async fn send_sigterm(pid: u32) -> bool {
    Command::new("kill")
        .args(["-TERM", &pid.to_string()])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|status| status.success())
        .unwrap_or(false)
}

#[cfg(not(unix))]
async fn send_sigterm(_pid: u32) -> bool {
    false
}
