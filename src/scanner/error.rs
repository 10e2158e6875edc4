//! Scanner Error Types

use crate::core::error_handling::ContextualError;
use std::path::PathBuf;

/// Fatal scanner errors. Problems below the root are reported as
/// [`ScanIssue`](crate::scanner::types::ScanIssue) instead.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ScanError {
    /// Root path does not exist or cannot be stat'ed
    #[error("{message}")]
    RootNotFound { path: PathBuf, message: String },

    /// Root path exists but is not a directory
    #[error("{message}")]
    NotADirectory { path: PathBuf, message: String },

    /// Root directory exists but its entries cannot be listed
    #[error("{message}")]
    RootUnreadable { path: PathBuf, message: String },

    /// The shutdown signal fired during traversal
    #[error("scan cancelled")]
    Cancelled,
}

impl ScanError {
    pub(crate) fn root_not_found(path: PathBuf, cause: &std::io::Error) -> Self {
        let message = format!("cannot access root path {}: {}", path.display(), cause);
        ScanError::RootNotFound { path, message }
    }

    pub(crate) fn not_a_directory(path: PathBuf) -> Self {
        let message = format!("root path {} is not a directory", path.display());
        ScanError::NotADirectory { path, message }
    }

    pub(crate) fn root_unreadable(path: PathBuf, cause: &std::io::Error) -> Self {
        let message = format!("cannot read root directory {}: {}", path.display(), cause);
        ScanError::RootUnreadable { path, message }
    }
}

impl ContextualError for ScanError {
    fn is_user_actionable(&self) -> bool {
        !matches!(self, ScanError::Cancelled)
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            ScanError::RootNotFound { message, .. }
            | ScanError::NotADirectory { message, .. }
            | ScanError::RootUnreadable { message, .. } => Some(message),
            ScanError::Cancelled => None,
        }
    }
}

pub type ScanResult<T> = Result<T, ScanError>;
