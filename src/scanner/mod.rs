//! Scanner Component
//!
//! Discovers repository roots beneath a directory.
//!
//! ## Core Features
//!
//! - **Depth-first walk**: single-threaded, entries visited in name order
//! - **Repository detection**: ordinary (`.git/`) and bare (`HEAD`, `refs/`, `objects/`)
//! - **No nesting**: a found repository is never descended into
//! - **Cycle safety**: directories de-duplicated by device and inode
//! - **Best effort**: unreadable subdirectories become [`ScanIssue`]s, not failures

pub mod api;
pub mod detect;
pub mod error;
pub mod types;
pub mod walker;

pub use detect::{detect_repository, RepositoryKind};
pub use error::{ScanError, ScanResult};
pub use types::{RepositoryRecord, ScanIssue, ScanIssueKind, ScanOutcome};
pub use walker::scan;

#[cfg(test)]
mod tests;
