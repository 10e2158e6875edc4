//! Status snapshot of a single repository

use crate::core::validation::ValidationError;
use serde::Serialize;

/// Branch value used when HEAD does not name a branch
pub const DETACHED_BRANCH: &str = "DETACHED";
/// Branch value used when HEAD could not be resolved
pub const UNKNOWN_BRANCH: &str = "N/A";
/// `status_error` value of a snapshot whose extraction ran out of time
pub const TIMEOUT_ERROR: &str = "timeout";
/// `status_error` value of a snapshot abandoned because of cancellation
pub const CANCELLED_ERROR: &str = "cancelled";

/// Branches a repository is expected to sit on when it needs no attention
pub const STANDARD_BRANCHES: [&str; 2] = ["main", "master"];

/// Branch, remote synchronisation, stash and working-tree state
///
/// Ahead/behind counts are unsigned, so the non-negative invariant holds by
/// construction; the remaining invariants are checked by [`validate`](Self::validate).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    pub branch: String,
    pub is_detached: bool,
    pub has_remote: bool,
    pub ahead: usize,
    pub behind: usize,
    pub has_stashes: bool,
    pub has_changes: bool,
    pub status_error: Option<String>,
    pub fetch_error: Option<String>,
}

impl StatusSnapshot {
    /// Snapshot on `branch` with nothing else known yet
    pub fn new(branch: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
            is_detached: false,
            has_remote: false,
            ahead: 0,
            behind: 0,
            has_stashes: false,
            has_changes: false,
            status_error: None,
            fetch_error: None,
        }
    }

    pub fn detached() -> Self {
        Self {
            is_detached: true,
            ..Self::new(DETACHED_BRANCH)
        }
    }

    /// Partial snapshot for a repository whose status could not be determined
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            status_error: Some(reason.into()),
            ..Self::new(UNKNOWN_BRANCH)
        }
    }

    pub fn timed_out() -> Self {
        Self::unavailable(TIMEOUT_ERROR)
    }

    pub fn cancelled() -> Self {
        Self::unavailable(CANCELLED_ERROR)
    }

    pub fn is_timeout(&self) -> bool {
        self.status_error.as_deref() == Some(TIMEOUT_ERROR)
    }

    /// Keep the first extraction problem; later ones are only logged
    pub fn record_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        match &self.status_error {
            None => self.status_error = Some(message),
            Some(first) => log::debug!("Additional status error after '{}': {}", first, message),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.branch.is_empty() {
            return Err(ValidationError::new("branch cannot be empty"));
        }
        if self.is_detached && self.branch != DETACHED_BRANCH {
            return Err(ValidationError::new(
                "detached HEAD must have branch = 'DETACHED'",
            ));
        }
        if !self.is_detached && self.branch == DETACHED_BRANCH {
            return Err(ValidationError::new(
                "branch 'DETACHED' is reserved for detached HEAD",
            ));
        }
        if !self.has_remote && (self.ahead != 0 || self.behind != 0) {
            return Err(ValidationError::new(
                "no remote but ahead/behind counts are non-zero",
            ));
        }
        Ok(())
    }

    /// Whether this status needs no attention: on main/master, in sync with a
    /// remote, nothing local pending, and no extraction error.
    pub fn is_standard(&self) -> bool {
        self.status_error.is_none()
            && STANDARD_BRANCHES.contains(&self.branch.as_str())
            && !self.is_detached
            && !self.has_changes
            && !self.has_stashes
            && self.has_remote
            && self.ahead == 0
            && self.behind == 0
    }
}
