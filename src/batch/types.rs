//! Batch Types

use crate::fetch::remote::FetchOutcome;
use crate::scanner::types::RepositoryRecord;
use crate::status::types::StatusSnapshot;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default number of repositories processed at once
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 10;

/// Settings for one batch run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    /// Upper bound on in-flight units; values below 1 are treated as 1
    pub concurrency_limit: usize,
    /// Time budget for each status extraction
    pub status_timeout: Duration,
    /// Fetch `origin` before extracting status
    pub fetch: bool,
    pub fetch_retries: usize,
    /// Time budget for each fetch attempt
    pub fetch_timeout: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            status_timeout: crate::status::extractor::DEFAULT_STATUS_TIMEOUT,
            fetch: false,
            fetch_retries: 3,
            fetch_timeout: crate::fetch::remote::DEFAULT_ATTEMPT_TIMEOUT,
        }
    }
}

/// Fetch counters for one batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FetchSummary {
    pub attempted: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub failed_repositories: Vec<PathBuf>,
}

impl FetchSummary {
    pub fn record(&mut self, repo_path: &Path, outcome: &FetchOutcome) {
        match outcome {
            FetchOutcome::Succeeded { .. } => {
                self.attempted += 1;
                self.succeeded += 1;
            }
            FetchOutcome::Skipped { .. } => self.skipped += 1,
            FetchOutcome::Failed { .. } => {
                self.attempted += 1;
                self.failed += 1;
                self.failed_repositories.push(repo_path.to_path_buf());
            }
        }
    }
}

/// Aggregated result of a batch run
///
/// Every repository handed to the batch has an entry in `statuses`, so
/// `success_count + failure_count` equals the number of repositories.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchOutcome {
    pub statuses: BTreeMap<PathBuf, StatusSnapshot>,
    pub success_count: usize,
    pub failure_count: usize,
    pub failed_repositories: Vec<PathBuf>,
    /// Present only when fetching was enabled
    pub fetch: Option<FetchSummary>,
    pub elapsed: Duration,
}

impl BatchOutcome {
    /// Attach each snapshot to the record with the same path
    pub fn apply_to(&self, records: &mut [RepositoryRecord]) {
        for record in records.iter_mut() {
            if let Some(status) = self.statuses.get(record.path()) {
                record.attach_status(status.clone());
            }
        }
    }

    pub fn timeout_count(&self) -> usize {
        self.statuses.values().filter(|s| s.is_timeout()).count()
    }
}
