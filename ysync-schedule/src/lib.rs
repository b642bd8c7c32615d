//! # ysync-schedule
//!
//! Daily sync job management through launchd.
//!
//! [`Scheduler`] owns the job file, its `schedule.json` sidecar and log
//! locations; registration goes through a [`ServiceManager`] so tests can
//! swap out `launchctl`.

mod error;
pub mod job;
pub mod launchd;
pub mod scheduler;

pub use error::ScheduleError;
pub use job::{render_plist, validate_time, ScheduleConfig};
pub use launchd::{Launchctl, ServiceManager};
pub use scheduler::{JobRequest, SchedulePaths, ScheduleStatus, Scheduler};
