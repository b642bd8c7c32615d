//! Job definition: the structured [`ScheduleConfig`] and its launchd plist.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tera::{Context, Tera};

use crate::error::{io_err, ScheduleError};

const JOB_TEMPLATE_NAME: &str = "launchd/job.plist";
const JOB_TEMPLATE: &str = include_str!("templates/job.plist.tera");

/// One daily sync job. Serialized as the `schedule.json` sidecar and rendered
/// into the plist handed to launchd.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleConfig {
    pub label: String,
    pub program_arguments: Vec<String>,
    pub working_directory: PathBuf,
    pub hour: u8,
    pub minute: u8,
    pub stdout_path: PathBuf,
    pub stderr_path: PathBuf,
    pub run_at_load: bool,
}

impl ScheduleConfig {
    /// `HH:MM`, zero padded.
    pub fn time(&self) -> String {
        format!("{:02}:{:02}", self.hour, self.minute)
    }
}

pub fn validate_time(hour: u8, minute: u8) -> Result<(), ScheduleError> {
    if hour > 23 || minute > 59 {
        return Err(ScheduleError::InvalidTime { hour, minute });
    }
    Ok(())
}

/// Render the launchd property list for `config`.
pub fn render_plist(config: &ScheduleConfig) -> Result<String, ScheduleError> {
    let mut tera = Tera::default();
    tera.add_raw_template(JOB_TEMPLATE_NAME, JOB_TEMPLATE)?;
    let context = Context::from_serialize(config)?;
    Ok(tera.render(JOB_TEMPLATE_NAME, &context)?)
}

/// The fields of a job file on disk that launchd acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlistSummary {
    pub label: Option<String>,
    pub hour: Option<u8>,
    pub minute: Option<u8>,
    pub program_arguments: Vec<String>,
    pub working_directory: Option<PathBuf>,
    pub stdout_path: Option<PathBuf>,
    pub stderr_path: Option<PathBuf>,
}

impl PlistSummary {
    /// Whether `config` still describes this job file. A sidecar left behind by
    /// another workspace sharing the label does not.
    pub fn matches(&self, config: &ScheduleConfig) -> bool {
        self.label.as_deref() == Some(config.label.as_str())
            && self.hour == Some(config.hour)
            && self.minute == Some(config.minute)
            && self.program_arguments == config.program_arguments
            && self.working_directory.as_deref() == Some(config.working_directory.as_path())
    }
}

/// Parse a job file written by [`render_plist`] or by hand.
pub fn read_plist(path: &Path) -> Result<PlistSummary, ScheduleError> {
    let value = plist::Value::from_file(path).map_err(|source| ScheduleError::Plist {
        path: path.to_path_buf(),
        source,
    })?;
    let dict = value.as_dictionary();
    let string = |key: &str| {
        dict.and_then(|d| d.get(key))
            .and_then(plist::Value::as_string)
            .map(str::to_string)
    };

    let interval = dict
        .and_then(|d| d.get("StartCalendarInterval"))
        .and_then(plist::Value::as_dictionary);
    let field = |key: &str| {
        interval
            .and_then(|d| d.get(key))
            .and_then(plist::Value::as_signed_integer)
            .and_then(|n| u8::try_from(n).ok())
    };
    let program_arguments = dict
        .and_then(|d| d.get("ProgramArguments"))
        .and_then(plist::Value::as_array)
        .map(|args| {
            args.iter()
                .filter_map(plist::Value::as_string)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(PlistSummary {
        label: string("Label"),
        hour: field("Hour"),
        minute: field("Minute"),
        program_arguments,
        working_directory: string("WorkingDirectory").map(PathBuf::from),
        stdout_path: string("StandardOutPath").map(PathBuf::from),
        stderr_path: string("StandardErrorPath").map(PathBuf::from),
    })
}

pub(crate) fn load_sidecar(path: &Path) -> Result<Option<ScheduleConfig>, ScheduleError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|source| ScheduleError::Json {
            path: path.to_path_buf(),
            source,
        })
}

pub(crate) fn save_sidecar(path: &Path, config: &ScheduleConfig) -> Result<(), ScheduleError> {
    let json = serde_json::to_string_pretty(config).map_err(|source| ScheduleError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, json).map_err(|e| io_err(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use plist::Value;

    fn config() -> ScheduleConfig {
        ScheduleConfig {
            label: "com.ysync.sync".to_string(),
            program_arguments: vec![
                "/usr/local/bin/ysync".to_string(),
                "--workdir".to_string(),
                "/Users/tester/blog & notes".to_string(),
                "sync".to_string(),
            ],
            working_directory: PathBuf::from("/Users/tester/blog & notes"),
            hour: 9,
            minute: 30,
            stdout_path: PathBuf::from("/Users/tester/blog & notes/logs/sync.log"),
            stderr_path: PathBuf::from("/Users/tester/blog & notes/logs/sync-error.log"),
            run_at_load: false,
        }
    }

    #[test]
    fn rendered_plist_contains_required_launchd_fields() {
        let rendered = render_plist(&config()).expect("render");
        let value = Value::from_reader_xml(rendered.as_bytes()).expect("parse plist");
        let dict = value.as_dictionary().expect("plist root dict");

        assert_eq!(
            dict.get("Label").and_then(Value::as_string),
            Some("com.ysync.sync")
        );
        assert_eq!(
            dict.get("RunAtLoad").and_then(Value::as_boolean),
            Some(false)
        );
        assert_eq!(
            dict.get("WorkingDirectory").and_then(Value::as_string),
            Some("/Users/tester/blog & notes")
        );
        let args: Vec<&str> = dict
            .get("ProgramArguments")
            .and_then(Value::as_array)
            .expect("ProgramArguments array")
            .iter()
            .map(|v| v.as_string().expect("program arg as string"))
            .collect();
        assert_eq!(
            args,
            vec![
                "/usr/local/bin/ysync",
                "--workdir",
                "/Users/tester/blog & notes",
                "sync"
            ]
        );

        let interval = dict
            .get("StartCalendarInterval")
            .and_then(Value::as_dictionary)
            .expect("calendar interval");
        assert_eq!(
            interval.get("Hour").and_then(Value::as_signed_integer),
            Some(9)
        );
        assert_eq!(
            interval.get("Minute").and_then(Value::as_signed_integer),
            Some(30)
        );
    }

    #[test]
    fn special_characters_are_escaped() {
        let rendered = render_plist(&config()).expect("render");
        assert!(rendered.contains("blog &amp; notes"));
        assert!(!rendered.contains("blog & notes"));
    }

    #[test]
    fn read_plist_recovers_time_and_arguments() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("job.plist");
        std::fs::write(&path, render_plist(&config()).unwrap()).unwrap();

        let summary = read_plist(&path).expect("read");
        assert_eq!(summary.label.as_deref(), Some("com.ysync.sync"));
        assert_eq!((summary.hour, summary.minute), (Some(9), Some(30)));
        assert_eq!(summary.program_arguments.len(), 4);
        assert_eq!(
            summary.working_directory.as_deref(),
            Some(Path::new("/Users/tester/blog & notes"))
        );
        assert_eq!(
            summary.stdout_path.as_deref(),
            Some(Path::new("/Users/tester/blog & notes/logs/sync.log"))
        );
        assert!(summary.matches(&config()));
    }

    #[test]
    fn summary_rejects_config_for_another_job() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("job.plist");
        std::fs::write(&path, render_plist(&config()).unwrap()).unwrap();
        let summary = read_plist(&path).unwrap();

        let other_time = ScheduleConfig {
            hour: 18,
            ..config()
        };
        assert!(!summary.matches(&other_time));

        let other_workspace = ScheduleConfig {
            working_directory: PathBuf::from("/Users/tester/other"),
            ..config()
        };
        assert!(!summary.matches(&other_workspace));
    }

    #[test]
    fn out_of_range_time_is_rejected() {
        assert!(validate_time(23, 59).is_ok());
        assert!(matches!(
            validate_time(24, 0),
            Err(ScheduleError::InvalidTime { hour: 24, .. })
        ));
        assert!(validate_time(0, 60).is_err());
    }

    #[test]
    fn sidecar_round_trips() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("schedule.json");
        assert_eq!(load_sidecar(&path).unwrap(), None);

        save_sidecar(&path, &config()).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"programArguments\""));
        assert_eq!(load_sidecar(&path).unwrap(), Some(config()));
    }
}
