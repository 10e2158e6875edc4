//! Command-line arguments
//!
//! Every option is optional at this level so the configuration file can fill
//! in what the command line leaves out; defaults are applied when settings are
//! resolved.

use crate::core::styles::palette_to_clap;
use crate::core::validation::{validate_positive_int, validate_seconds};
use clap::{CommandFactory, FromArgMatches, Parser};
use std::ffi::OsString;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
#[command(name = "repotree")]
#[command(about = "Find git repositories below a directory and show the ones that need attention")]
#[command(version)]
pub struct Args {
    /// Directory to scan (default: current directory)
    #[arg(value_name = "DIRECTORY")]
    pub directory: Option<PathBuf>,

    /// Show all repositories, including clean ones
    #[arg(short = 'a', long = "all")]
    pub all: bool,

    /// Do not fetch from origin before reading status
    #[arg(long = "no-fetch")]
    pub no_fetch: bool,

    /// Maximum number of repositories processed at once [default: 50]
    #[arg(short = 'c', long = "max-concurrent", value_name = "N", value_parser = validate_positive_int)]
    pub max_concurrent: Option<usize>,

    /// Per-repository time budget in seconds [default: 10]
    #[arg(long = "timeout", value_name = "SECONDS", value_parser = validate_seconds)]
    pub timeout: Option<u64>,

    /// Fetch attempts per repository [default: 3]
    #[arg(long = "fetch-retries", value_name = "N", value_parser = validate_positive_int)]
    pub fetch_retries: Option<usize>,

    /// Print the report as JSON
    #[arg(long = "json")]
    pub json: bool,

    /// Force coloured output (overrides TTY detection and NO_COLOR)
    #[arg(long = "color", conflicts_with = "no_color")]
    pub color: bool,

    /// Disable coloured output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Configuration file path
    #[arg(long = "config-file", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Log level
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", value_parser = ["trace", "debug", "info", "warn", "error", "off"])]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(long = "log-format", value_name = "FORMAT", value_parser = ["text", "ext", "json"])]
    pub log_format: Option<String>,

    /// Write log records to this file instead of stderr
    #[arg(long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Shorthand for --log-level debug
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,
}

impl Args {
    /// Parse `args`, styling help and errors only when `color` is set
    pub fn try_parse_styled<I, T>(args: I, color: bool) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = Self::command()
            .styles(palette_to_clap(color))
            .try_get_matches_from(args)?;
        Self::from_arg_matches(&matches)
    }
}
