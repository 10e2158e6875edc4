//! Scanner API
//!
//! Public surface of the scanner, mirroring the `api` modules of the other
//! components.

pub use crate::scanner::error::{ScanError, ScanResult};
pub use crate::scanner::types::{RepositoryRecord, ScanIssue, ScanIssueKind, ScanOutcome};
pub use crate::scanner::walker::scan;
