//! Scanner Types
//!
//! Records produced by directory discovery and the per-scan summary.

use crate::core::validation::ValidationError;
use crate::status::types::StatusSnapshot;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A repository root found during a scan
///
/// Path, name and bareness are fixed at creation; status fields are filled
/// in later by the batch stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepositoryRecord {
    path: PathBuf,
    name: String,
    is_bare: bool,
    is_symlink: bool,
    pub status: Option<StatusSnapshot>,
    pub error: Option<String>,
    has_timeout: bool,
}

impl RepositoryRecord {
    pub fn new(path: impl Into<PathBuf>, is_bare: bool, is_symlink: bool) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            path,
            name,
            is_bare,
            is_symlink,
            status: None,
            error: None,
            has_timeout: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_bare(&self) -> bool {
        self.is_bare
    }

    /// Whether the repository was reached through a symbolic link
    pub fn is_symlink(&self) -> bool {
        self.is_symlink
    }

    /// Whether the attached snapshot came from a timed-out extraction
    pub fn has_timeout(&self) -> bool {
        self.has_timeout
    }

    /// Attach a computed snapshot, mirroring its timeout flag and status error onto the record
    pub fn attach_status(&mut self, status: StatusSnapshot) {
        self.has_timeout = status.is_timeout();
        self.error = status.status_error.clone();
        self.status = Some(status);
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.path.as_os_str().is_empty() {
            return Err(ValidationError::new("path cannot be empty"));
        }
        if self.name.is_empty() {
            return Err(ValidationError::new("name cannot be empty"));
        }
        if !self.path.is_absolute() {
            return Err(ValidationError::new(format!(
                "path must be absolute: {}",
                self.path.display()
            )));
        }
        if let Some(status) = &self.status {
            if self.is_bare && status.has_changes {
                return Err(ValidationError::new(
                    "bare repository cannot have uncommitted changes",
                ));
            }
        }
        Ok(())
    }
}

/// Category of a non-fatal scan problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanIssueKind {
    PermissionDenied,
    BrokenSymlink,
    Io,
}

/// A subtree that had to be skipped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanIssue {
    pub path: PathBuf,
    pub kind: ScanIssueKind,
    pub message: String,
}

impl std::fmt::Display for ScanIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            ScanIssueKind::PermissionDenied => {
                write!(f, "permission denied: {}", self.path.display())
            }
            ScanIssueKind::BrokenSymlink => {
                write!(f, "broken symlink {}: {}", self.path.display(), self.message)
            }
            ScanIssueKind::Io => write!(f, "error reading {}: {}", self.path.display(), self.message),
        }
    }
}

/// Result of one scanner invocation
#[derive(Debug, Clone, Serialize)]
pub struct ScanOutcome {
    pub root_path: PathBuf,
    pub repositories: Vec<RepositoryRecord>,
    pub total_directories_visited: usize,
    pub total_repositories_found: usize,
    pub errors: Vec<ScanIssue>,
    pub elapsed: Duration,
}

impl ScanOutcome {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Fraction of repositories whose status was determined without error or timeout
    pub fn success_rate(&self) -> f64 {
        if self.repositories.is_empty() {
            return 1.0;
        }
        let ok = self
            .repositories
            .iter()
            .filter(|r| r.error.is_none() && !r.has_timeout())
            .count();
        ok as f64 / self.repositories.len() as f64
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.root_path.as_os_str().is_empty() {
            return Err(ValidationError::new("root path cannot be empty"));
        }
        if !self.root_path.is_absolute() {
            return Err(ValidationError::new("root path must be absolute"));
        }
        if self.total_repositories_found != self.repositories.len() {
            return Err(ValidationError::new(format!(
                "total repos mismatch: counted {}, listed {}",
                self.total_repositories_found,
                self.repositories.len()
            )));
        }
        if self.total_directories_visited < self.total_repositories_found {
            return Err(ValidationError::new(format!(
                "total scanned < total repos: {} < {}",
                self.total_directories_visited, self.total_repositories_found
            )));
        }
        for repo in &self.repositories {
            repo.validate()?;
        }
        Ok(())
    }
}
