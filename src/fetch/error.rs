//! Fetch Error Types

use crate::core::error_handling::ContextualError;
use std::time::Duration;

/// Why fetching from `origin` failed
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    #[error("failed to open repository: {message}")]
    Open { message: String },

    /// Connecting, negotiating or receiving the pack failed
    #[error("{message}")]
    Remote { message: String },

    /// A single attempt exceeded its time budget
    #[error("fetch timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("fetch cancelled")]
    Cancelled,

    /// The blocking fetch task panicked or was aborted
    #[error("fetch task failed: {message}")]
    Task { message: String },

    #[error("fetch failed after {attempts} attempt(s): {source}")]
    RetriesExhausted {
        attempts: usize,
        #[source]
        source: Box<FetchError>,
    },
}

impl FetchError {
    pub(crate) fn remote(error: impl std::fmt::Display) -> Self {
        FetchError::Remote {
            message: error.to_string(),
        }
    }

    /// Only transport failures are worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Remote { .. })
    }
}

impl ContextualError for FetchError {
    fn is_user_actionable(&self) -> bool {
        false
    }

    fn user_message(&self) -> Option<&str> {
        None
    }
}

/// Why credentials could not be obtained. Never fatal: the fetch proceeds
/// without credentials.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialError {
    #[error("invalid remote URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("git credential fill failed: {message}")]
    Helper { message: String },

    #[error("credential helper timed out after {0:?}")]
    Timeout(Duration),

    #[error("no credentials available")]
    NotFound,
}

pub type FetchResult<T> = Result<T, FetchError>;
