//! # ysync-sync
//!
//! External-tool invocation, document indexing and sync reporting.
//!
//! Call [`pipeline::run`] to sync a workspace end to end, or use the pieces
//! directly: [`invoker::ToolInvoker`], [`index::build_index`],
//! [`report::generate_report`].

pub mod classify;
pub mod error;
pub mod frontmatter;
pub mod index;
pub mod invoker;
pub mod pipeline;
pub mod report;
pub mod store;

pub use error::SyncError;
pub use index::{build_index, document_id, rebuild_index, IndexBuild};
pub use invoker::{ToolInvoker, ToolOutput};
pub use pipeline::{SyncOptions, SyncOutcome, Workspace};
pub use report::{diff_documents, generate_report};
