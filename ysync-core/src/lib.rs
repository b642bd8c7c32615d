//! ysync core library: domain types, workspace configuration, errors.
//!
//! - [`types`]: manifest, report and state records
//! - [`config`]: `ysync.yaml`, output-dir resolution, credentials
//! - [`error`]: [`ConfigError`]
//! - [`paths`]: file names shared by every crate

pub mod config;
pub mod error;
pub mod paths;
pub mod types;

pub use config::{Credentials, ScheduleSettings, Settings, ToolSettings};
pub use error::ConfigError;
pub use types::{
    ChangeKind, DocumentChange, DocumentId, DocumentIndex, DocumentMeta, SyncReport, SyncState,
    SyncSummary,
};
