//! Tests for configuration loading and settings resolution

use crate::app::cli::args::Args;
use crate::app::cli::config::*;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

fn terminal() -> Environment {
    Environment {
        no_color: false,
        stdout_is_terminal: true,
    }
}

#[test]
fn test_defaults() {
    let settings = Settings::resolve(Args::default(), None, Environment::default()).unwrap();

    assert_eq!(settings.directory, PathBuf::from("."));
    assert!(!settings.show_all);
    assert!(settings.fetch);
    assert_eq!(settings.max_concurrent, DEFAULT_MAX_CONCURRENT);
    assert_eq!(settings.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    assert_eq!(settings.fetch_retries, DEFAULT_FETCH_RETRIES);
    assert!(!settings.color);
    assert_eq!(settings.log_level, "warn");
}

#[test]
fn test_file_values_fill_gaps_and_flags_win() {
    let file = FileConfig::parse(
        Path::new("repotree.toml"),
        r#"
all = true
fetch = false
max_concurrent = 12
timeout_secs = 20
log_level = "info"
"#,
    )
    .unwrap();
    let args = Args {
        max_concurrent: Some(4),
        ..Args::default()
    };

    let settings = Settings::resolve(args, Some(file), Environment::default()).unwrap();

    assert!(settings.show_all);
    assert!(!settings.fetch);
    assert_eq!(settings.max_concurrent, 4);
    assert_eq!(settings.timeout, Duration::from_secs(20));
    assert_eq!(settings.log_level, "info");

    let options = settings.batch_options();
    assert_eq!(options.concurrency_limit, 4);
    assert_eq!(options.status_timeout, Duration::from_secs(20));
    assert!(!options.fetch);
}

#[test]
fn test_unknown_keys_are_rejected() {
    let err = FileConfig::parse(Path::new("repotree.toml"), "max_concurency = 3\n").unwrap_err();
    assert!(err.to_string().contains("repotree.toml"));
}

#[test]
fn test_zero_values_from_file_are_rejected() {
    let file = FileConfig {
        max_concurrent: Some(0),
        ..FileConfig::default()
    };
    let err = Settings::resolve(Args::default(), Some(file), terminal()).unwrap_err();
    assert_eq!(err.message(), "max_concurrent must be at least 1");
}

#[test]
fn test_color_precedence() {
    let resolve = |args: Args, file: Option<FileConfig>, env: Environment| {
        Settings::resolve(args, file, env).unwrap().color
    };
    let file_off = Some(FileConfig {
        color: Some(false),
        ..FileConfig::default()
    });
    let no_color_env = Environment {
        no_color: true,
        stdout_is_terminal: true,
    };

    assert!(resolve(Args::default(), None, terminal()));
    assert!(!resolve(Args::default(), file_off.clone(), terminal()));
    assert!(!resolve(Args::default(), None, no_color_env));
    assert!(resolve(
        Args {
            color: true,
            ..Args::default()
        },
        file_off,
        no_color_env
    ));
    assert!(!resolve(
        Args {
            no_color: true,
            ..Args::default()
        },
        None,
        terminal()
    ));
}

#[test]
fn test_debug_flag_overrides_log_level() {
    let args = Args {
        debug: true,
        log_level: Some("error".to_string()),
        ..Args::default()
    };
    let settings = Settings::resolve(args, None, Environment::default()).unwrap();
    assert_eq!(settings.log_level, "debug");
}

#[tokio::test]
async fn test_explicit_missing_file_is_an_error() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("nope.toml");

    let err = FileConfig::load(Some(&missing)).await.unwrap_err();
    assert!(err.to_string().contains("does not exist"));
}

#[tokio::test]
async fn test_explicit_file_is_loaded() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("repotree.toml");
    std::fs::write(&path, "fetch_retries = 7\ncolor = true\n").unwrap();

    let file = FileConfig::load(Some(&path)).await.unwrap().unwrap();
    assert_eq!(file.fetch_retries, Some(7));
    assert_eq!(file.color, Some(true));
}

#[test]
#[serial_test::serial]
fn test_detect_reads_no_color() {
    let saved = std::env::var_os("NO_COLOR");

    std::env::set_var("NO_COLOR", "1");
    assert!(Environment::detect().no_color);
    assert!(!Environment::detect().color_default());

    std::env::set_var("NO_COLOR", "");
    assert!(!Environment::detect().no_color);

    match saved {
        Some(value) => std::env::set_var("NO_COLOR", value),
        None => std::env::remove_var("NO_COLOR"),
    }
}
