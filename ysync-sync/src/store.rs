//! JSON stores under the output directory.
//!
//! `index.json`, `.sync-report.json` and `.sync-state.json` are each replaced
//! wholesale on write. Writes go to `<path>.tmp` and are renamed into place.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use ysync_core::paths::{index_path, report_path, state_path};
use ysync_core::{DocumentIndex, SyncReport, SyncState};

use crate::error::{io_err, json_err, SyncError};

/// Load a JSON store. Returns `None` if the file does not yet exist.
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, SyncError> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let value = serde_json::from_str(&contents).map_err(|e| json_err(path, e))?;
    Ok(Some(value))
}

/// Save a JSON store atomically, pretty-printed.
pub fn save<T: Serialize>(path: &Path, value: &T) -> Result<(), SyncError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
    }

    let json = serde_json::to_string_pretty(value).map_err(|e| json_err(path, e))?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

pub fn load_index(output_dir: &Path) -> Result<Option<DocumentIndex>, SyncError> {
    load(&index_path(output_dir))
}

pub fn save_index(output_dir: &Path, index: &DocumentIndex) -> Result<(), SyncError> {
    save(&index_path(output_dir), index)
}

pub fn load_report(output_dir: &Path) -> Result<Option<SyncReport>, SyncError> {
    load(&report_path(output_dir))
}

pub fn load_state(output_dir: &Path) -> Result<Option<SyncState>, SyncError> {
    load(&state_path(output_dir))
}
