//! Sync report generation.
//!
//! Diff rules, keyed by [`DocumentId`]:
//! - in current, not in previous → `added`
//! - in both, `updatedAt` differs → `updated`
//! - in previous, not in current → `deleted`
//!
//! Added and updated entries follow current-list order; deleted entries
//! follow, in previous-list order.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};

use ysync_core::paths::{report_path, state_path};
use ysync_core::{
    ChangeKind, DocumentChange, DocumentId, DocumentMeta, SyncReport, SyncState, SyncSummary,
};

use crate::error::SyncError;
use crate::store;

/// Classify every document that differs between `previous` and `current`.
pub fn diff_documents(previous: &[DocumentMeta], current: &[DocumentMeta]) -> Vec<DocumentChange> {
    let before: HashMap<&DocumentId, &DocumentMeta> =
        previous.iter().map(|doc| (&doc.id, doc)).collect();
    let after: HashMap<&DocumentId, &DocumentMeta> =
        current.iter().map(|doc| (&doc.id, doc)).collect();

    let mut changes = Vec::new();
    for doc in current {
        match before.get(&doc.id) {
            None => changes.push(DocumentChange::new(ChangeKind::Added, doc)),
            Some(old) if old.updated_at != doc.updated_at => {
                changes.push(DocumentChange::new(ChangeKind::Updated, doc))
            }
            Some(_) => {}
        }
    }
    for doc in previous {
        if !after.contains_key(&doc.id) {
            changes.push(DocumentChange::new(ChangeKind::Deleted, doc));
        }
    }
    changes
}

/// Build a report without touching disk.
///
/// A failed run records no changes: `previous` stands in for `current`.
pub fn build_report(
    started_at: DateTime<Utc>,
    success: bool,
    previous: &[DocumentMeta],
    current: &[DocumentMeta],
    errors: Option<Vec<String>>,
) -> SyncReport {
    let current = if success { current } else { previous };
    let changes = diff_documents(previous, current);
    let count = |kind: ChangeKind| changes.iter().filter(|c| c.kind == kind).count();

    let now = Utc::now();
    let duration = now
        .signed_duration_since(started_at)
        .num_milliseconds()
        .max(0) as u64;

    SyncReport {
        timestamp: now,
        success,
        duration,
        summary: SyncSummary {
            total: current.len(),
            added: count(ChangeKind::Added),
            updated: count(ChangeKind::Updated),
            deleted: count(ChangeKind::Deleted),
        },
        changes,
        errors: errors.filter(|e| !e.is_empty()),
    }
}

/// Build the report, write `.sync-report.json`, and update `.sync-state.json`.
///
/// The state pointer is written for failed runs too.
pub fn generate_report(
    output_dir: &Path,
    started_at: DateTime<Utc>,
    success: bool,
    previous: &[DocumentMeta],
    current: &[DocumentMeta],
    errors: Option<Vec<String>>,
) -> Result<SyncReport, SyncError> {
    let report = build_report(started_at, success, previous, current, errors);
    store::save(&report_path(output_dir), &report)?;

    let state = SyncState {
        last_sync_at: report.timestamp,
        last_sync_success: success,
        total_documents: report.summary.total,
        output_dir: output_dir.display().to_string(),
    };
    store::save(&state_path(output_dir), &state)?;

    tracing::info!(
        "sync report: success={} added={} updated={} deleted={}",
        report.success,
        report.summary.added,
        report.summary.updated,
        report.summary.deleted
    );
    Ok(report)
}
