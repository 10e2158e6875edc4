//! Program entry point
//!
//! Parses arguments, loads configuration, initialises logging, then runs
//! scan → batch → classify → report under a shared shutdown signal.

use crate::app::cli::config::Environment;
use crate::app::cli::{Args, FileConfig, Settings};
use crate::app::error::{AppError, AppResult};
use crate::app::report::{
    render_json, render_list, render_summary, ALL_CLEAN, NO_REPOSITORIES, SHOW_ALL_HINT,
};
use crate::batch::coordinator::BatchCoordinator;
use crate::classify::{filter_repositories, FilterOptions};
use crate::core::error_handling::log_error_with_context;
use crate::core::logging::init_logging;
use crate::core::shutdown::ShutdownSignal;
use crate::core::validation::ValidationError;
use crate::scanner::walker::scan;
use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;

/// Hard limit for a whole run; the shutdown signal fires when it passes
pub const RUN_DEADLINE: Duration = Duration::from_secs(5 * 60);

pub fn startup() -> ExitCode {
    let env = Environment::detect();
    let args = match Args::try_parse_styled(std::env::args_os(), env.color_default()) {
        Ok(args) => args,
        Err(e) => e.exit(),
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!(
                "Error: {}",
                AppError::Runtime {
                    message: e.to_string()
                }
            );
            return ExitCode::FAILURE;
        }
    };

    runtime.block_on(async move {
        let settings = match configure(args, env).await {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        };

        match run(&settings).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                log_error_with_context(&e, "Repository scan failed");
                ExitCode::FAILURE
            }
        }
    })
}

/// Merge arguments with the configuration file and start logging
async fn configure(args: Args, env: Environment) -> AppResult<Settings> {
    let file = FileConfig::load(args.config_file.as_deref()).await?;
    let settings = Settings::resolve(args, file, env)?;

    let log_file = settings
        .log_file
        .as_ref()
        .map(|p| p.to_string_lossy().to_string());
    init_logging(
        Some(&settings.log_level),
        settings.log_format.as_deref(),
        log_file.as_deref(),
        settings.color,
    )
    .map_err(|e| AppError::Logging {
        message: e.to_string(),
    })?;

    log::debug!("Settings: {:?}", settings);
    Ok(settings)
}

/// Run against the real stdout/stderr with OS signal handling and the run deadline
pub async fn run(settings: &Settings) -> AppResult<()> {
    let shutdown = ShutdownSignal::new();
    shutdown.install_os_handlers();
    let deadline = shutdown.trigger_after(RUN_DEADLINE);

    let result =
        scan_and_report(settings, &shutdown, &mut std::io::stdout(), &mut std::io::stderr()).await;

    deadline.abort();
    result
}

/// Scan, process and report, writing the report to `out` and statistics to `err`
pub async fn scan_and_report<W: Write, E: Write>(
    settings: &Settings,
    shutdown: &ShutdownSignal,
    out: &mut W,
    err: &mut E,
) -> AppResult<()> {
    let root = settings.directory.clone();
    let scan_signal = shutdown.clone();
    let mut outcome = tokio::task::spawn_blocking(move || scan(&root, &scan_signal))
        .await
        .map_err(|e| AppError::Runtime {
            message: e.to_string(),
        })??;

    warn_if_invalid("Scan result", outcome.validate());
    for issue in &outcome.errors {
        log::info!("Skipped {}", issue);
    }

    if outcome.repositories.is_empty() {
        if settings.json {
            emit(out, &json_or_error(render_json(&outcome, &[], None))?)?;
        } else {
            emit(out, &format!("{}\n", NO_REPOSITORIES))?;
            emit(err, &render_summary(&outcome, None, settings.color))?;
        }
        return Ok(());
    }

    let batch = BatchCoordinator::new(settings.batch_options(), shutdown.clone())
        .run(&outcome.repositories)
        .await;
    batch.apply_to(&mut outcome.repositories);

    for record in &outcome.repositories {
        warn_if_invalid(
            &format!("Repository {}", record.path().display()),
            record.validate(),
        );
        if let Some(status) = &record.status {
            warn_if_invalid(
                &format!("Status of {}", record.path().display()),
                status.validate(),
            );
        }
    }

    let filter = FilterOptions {
        show_all: settings.show_all,
    };
    let shown = filter_repositories(&outcome.repositories, &filter);

    if settings.json {
        emit(out, &json_or_error(render_json(&outcome, &shown, Some(&batch)))?)?;
        return Ok(());
    }

    if shown.is_empty() {
        emit(out, &format!("{}\n{}\n", ALL_CLEAN, SHOW_ALL_HINT))?;
    } else {
        emit(out, &render_list(&shown, &outcome.root_path, settings.color))?;
    }
    emit(err, &render_summary(&outcome, Some(&batch), settings.color))?;

    Ok(())
}

fn warn_if_invalid(subject: &str, result: Result<(), ValidationError>) {
    if let Err(e) = result {
        log::debug!("{} validation failed: {}", subject, e);
    }
}

fn json_or_error(rendered: Result<String, serde_json::Error>) -> AppResult<String> {
    rendered
        .map(|mut json| {
            json.push('\n');
            json
        })
        .map_err(|e| AppError::Output {
            message: e.to_string(),
        })
}

fn emit<W: Write>(writer: &mut W, text: &str) -> AppResult<()> {
    writer
        .write_all(text.as_bytes())
        .and_then(|_| writer.flush())
        .map_err(|e| AppError::Output {
            message: e.to_string(),
        })
}
