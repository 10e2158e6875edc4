//! TOML configuration file loading and settings resolution
//!
//! Precedence, highest first: command line, `NO_COLOR`, configuration file,
//! built-in defaults.

use super::args::Args;
use crate::app::error::{AppError, AppResult};
use crate::batch::types::BatchOptions;
use crate::core::validation::ValidationError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_MAX_CONCURRENT: usize = 50;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_FETCH_RETRIES: usize = 3;

/// Values read from `repotree.toml`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub all: Option<bool>,
    pub fetch: Option<bool>,
    pub max_concurrent: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub fetch_retries: Option<usize>,
    pub color: Option<bool>,
    pub log_level: Option<String>,
    pub log_format: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl FileConfig {
    /// `<config_dir>/repotree/repotree.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("repotree").join("repotree.toml"))
    }

    pub fn parse(path: &Path, contents: &str) -> AppResult<Self> {
        toml::from_str(contents).map_err(|e| AppError::config(path, e))
    }

    /// Load the configuration file.
    ///
    /// An explicitly named file must exist; the default one is optional.
    pub async fn load(explicit: Option<&Path>) -> AppResult<Option<Self>> {
        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(AppError::config(path, "file does not exist"));
                }
                path.to_path_buf()
            }
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(None),
            },
        };

        log::debug!("Loading configuration from {}", path.display());
        let contents = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| AppError::config(&path, e))?;
        Self::parse(&path, &contents).map(Some)
    }
}

/// Environment facts that influence settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Environment {
    /// `NO_COLOR` is set to a non-empty value
    pub no_color: bool,
    pub stdout_is_terminal: bool,
}

impl Environment {
    pub fn detect() -> Self {
        Self {
            no_color: std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty()),
            stdout_is_terminal: std::io::IsTerminal::is_terminal(&std::io::stdout()),
        }
    }

    /// Colour default before any flag or file is consulted
    pub fn color_default(&self) -> bool {
        self.stdout_is_terminal && !self.no_color
    }
}

/// Fully resolved run settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub directory: PathBuf,
    pub show_all: bool,
    pub fetch: bool,
    pub max_concurrent: usize,
    pub timeout: Duration,
    pub fetch_retries: usize,
    pub json: bool,
    pub color: bool,
    pub log_level: String,
    pub log_format: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl Settings {
    pub fn resolve(
        args: Args,
        file: Option<FileConfig>,
        env: Environment,
    ) -> Result<Self, ValidationError> {
        let file = file.unwrap_or_default();

        let max_concurrent = args
            .max_concurrent
            .or(file.max_concurrent)
            .unwrap_or(DEFAULT_MAX_CONCURRENT);
        if max_concurrent == 0 {
            return Err(ValidationError::new("max_concurrent must be at least 1"));
        }

        let timeout_secs = args
            .timeout
            .or(file.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ValidationError::new("timeout_secs must be at least 1"));
        }

        let fetch_retries = args
            .fetch_retries
            .or(file.fetch_retries)
            .unwrap_or(DEFAULT_FETCH_RETRIES);
        if fetch_retries == 0 {
            return Err(ValidationError::new("fetch_retries must be at least 1"));
        }

        let color = if args.no_color {
            false
        } else if args.color {
            true
        } else if env.no_color {
            false
        } else {
            file.color.unwrap_or(env.stdout_is_terminal)
        };

        let log_level = if args.debug {
            "debug".to_string()
        } else {
            args.log_level
                .or(file.log_level)
                .unwrap_or_else(|| "warn".to_string())
        };

        Ok(Self {
            directory: args.directory.unwrap_or_else(|| PathBuf::from(".")),
            show_all: args.all || file.all.unwrap_or(false),
            fetch: !args.no_fetch && file.fetch.unwrap_or(true),
            max_concurrent,
            timeout: Duration::from_secs(timeout_secs),
            fetch_retries,
            json: args.json,
            color,
            log_level,
            log_format: args.log_format.or(file.log_format),
            log_file: args.log_file.or(file.log_file),
        })
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            concurrency_limit: self.max_concurrent,
            status_timeout: self.timeout,
            fetch: self.fetch,
            fetch_retries: self.fetch_retries,
            fetch_timeout: self.timeout,
        }
    }
}
