pub mod init;
pub mod schedule;
pub mod status;
pub mod sync;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Absolute workspace root: `--workdir` if given, else the current directory.
pub fn workspace_root(workdir: Option<PathBuf>) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("could not determine current directory")?;
    Ok(match workdir {
        Some(dir) if dir.is_absolute() => dir,
        Some(dir) => cwd.join(dir),
        None => cwd,
    })
}

/// Print exactly one pretty JSON document on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("failed to serialize JSON output")?
    );
    Ok(())
}

/// `42s`, `5m`, `3h`, `2d`.
pub fn format_age(timestamp: DateTime<Utc>) -> String {
    let seconds = Utc::now()
        .signed_duration_since(timestamp)
        .num_seconds()
        .max(0) as u64;
    match seconds {
        s if s < 60 => format!("{s}s"),
        s if s < 60 * 60 => format!("{}m", s / 60),
        s if s < 60 * 60 * 24 => format!("{}h", s / (60 * 60)),
        s => format!("{}d", s / (60 * 60 * 24)),
    }
}

pub fn display_relative(workspace: &Path, path: &Path) -> String {
    path.strip_prefix(workspace)
        .map(|rel| rel.display().to_string())
        .unwrap_or_else(|_| path.display().to_string())
}

/// Current-thread runtime for the async sync crate.
pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_buckets() {
        let now = Utc::now();
        assert_eq!(format_age(now), "0s");
        assert_eq!(format_age(now - chrono::Duration::seconds(125)), "2m");
        assert_eq!(format_age(now - chrono::Duration::hours(5)), "5h");
        assert_eq!(format_age(now - chrono::Duration::days(3)), "3d");
    }

    #[test]
    fn future_timestamps_clamp_to_zero() {
        assert_eq!(format_age(Utc::now() + chrono::Duration::hours(1)), "0s");
    }

    #[test]
    fn relative_workdir_is_joined_to_cwd() {
        let root = workspace_root(Some(PathBuf::from("blog"))).unwrap();
        assert!(root.is_absolute());
        assert!(root.ends_with("blog"));
    }
}
