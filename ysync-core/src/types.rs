//! Domain types for the document manifest, sync reports and run state.
//!
//! Every struct here is persisted as pretty-printed JSON under the output
//! directory and read by the website, so field names are camelCase on disk.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Stable identifier of a document, derived from its path relative to the
/// output root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub String);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for DocumentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for DocumentId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

/// Metadata extracted from one Markdown file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMeta {
    pub id: DocumentId,
    pub title: String,
    pub slug: String,
    /// `/`-separated path relative to the output root.
    pub path: String,
    pub created_at: String,
    pub updated_at: String,
    pub word_count: usize,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// The manifest written to `index.json`. Replaced wholesale on every build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentIndex {
    pub generated_at: DateTime<Utc>,
    pub total_documents: usize,
    pub documents: Vec<DocumentMeta>,
}

impl DocumentIndex {
    pub fn new(documents: Vec<DocumentMeta>) -> Self {
        Self {
            generated_at: Utc::now(),
            total_documents: documents.len(),
            documents,
        }
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// How a document changed between two manifests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Updated,
    Deleted,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Added => write!(f, "added"),
            ChangeKind::Updated => write!(f, "updated"),
            ChangeKind::Deleted => write!(f, "deleted"),
        }
    }
}

/// One entry of a [`SyncReport`]'s change list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChange {
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    pub title: String,
    pub path: String,
    pub slug: String,
}

impl DocumentChange {
    pub fn new(kind: ChangeKind, doc: &DocumentMeta) -> Self {
        Self {
            kind,
            title: doc.title.clone(),
            path: doc.path.clone(),
            slug: doc.slug.clone(),
        }
    }
}

/// Change counts of a sync run. `total` is the size of the current manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyncSummary {
    pub total: usize,
    pub added: usize,
    pub updated: usize,
    pub deleted: usize,
}

/// Outcome of one `sync` invocation, written to `.sync-report.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    /// Wall-clock duration in milliseconds.
    pub duration: u64,
    pub summary: SyncSummary,
    pub changes: Vec<DocumentChange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

/// Pointer record written after every run, successful or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncState {
    pub last_sync_at: DateTime<Utc>,
    pub last_sync_success: bool,
    pub total_documents: usize,
    pub output_dir: String,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
