//! Application Error Types

use crate::core::error_handling::ContextualError;
use crate::core::validation::ValidationError;
use crate::scanner::error::ScanError;
use std::path::PathBuf;

/// Errors that end the program with a non-zero exit status
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Config { path: PathBuf, message: String },

    #[error(transparent)]
    InvalidSetting(#[from] ValidationError),

    #[error("failed to scan directory: {0}")]
    Scan(#[from] ScanError),

    #[error("failed to initialise logging: {message}")]
    Logging { message: String },

    #[error("failed to start async runtime: {message}")]
    Runtime { message: String },

    #[error("failed to write report: {message}")]
    Output { message: String },
}

impl AppError {
    pub(crate) fn config(path: &std::path::Path, message: impl std::fmt::Display) -> Self {
        AppError::Config {
            path: path.to_path_buf(),
            message: format!("configuration file {}: {}", path.display(), message),
        }
    }
}

impl ContextualError for AppError {
    fn is_user_actionable(&self) -> bool {
        match self {
            AppError::Config { .. } | AppError::InvalidSetting(_) => true,
            AppError::Scan(e) => e.is_user_actionable(),
            AppError::Logging { .. } | AppError::Runtime { .. } | AppError::Output { .. } => false,
        }
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            AppError::Config { message, .. } => Some(message),
            AppError::InvalidSetting(e) => e.user_message(),
            AppError::Scan(e) => e.user_message(),
            _ => None,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
