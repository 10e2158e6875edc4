//! Batch Coordinator
//!
//! Runs one unit of work per repository (optional fetch, then status) with at
//! most `concurrency_limit` units in flight. Units report back through their
//! join handles and are aggregated only after every unit has finished, so no
//! shared mutable state is touched while work is running.

use crate::batch::types::{BatchOptions, BatchOutcome, FetchSummary};
use crate::core::shutdown::ShutdownSignal;
use crate::fetch::credentials::{CredentialResolver, GitCredentialHelper};
use crate::fetch::remote::{fetch_origin, FetchOptions, FetchOutcome, SkipReason};
use crate::scanner::types::RepositoryRecord;
use crate::status::extractor::{extract_with, GitStatusProbe, StatusProbe};
use crate::status::types::StatusSnapshot;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Everything a unit needs, shared read-only between units
struct UnitContext {
    options: BatchOptions,
    fetch_options: FetchOptions,
    probe: Arc<dyn StatusProbe>,
    credentials: Arc<dyn CredentialResolver>,
    shutdown: ShutdownSignal,
}

/// What a finished unit hands back
struct UnitReport {
    path: PathBuf,
    fetch: Option<FetchOutcome>,
    status: StatusSnapshot,
}

/// Bounded-concurrency driver for fetch and status work
pub struct BatchCoordinator {
    options: BatchOptions,
    probe: Arc<dyn StatusProbe>,
    credentials: Arc<dyn CredentialResolver>,
    shutdown: ShutdownSignal,
}

impl BatchCoordinator {
    pub fn new(options: BatchOptions, shutdown: ShutdownSignal) -> Self {
        Self {
            options,
            probe: Arc::new(GitStatusProbe),
            credentials: Arc::new(GitCredentialHelper::default()),
            shutdown,
        }
    }

    /// Replace the status source
    pub fn with_probe(mut self, probe: Arc<dyn StatusProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Replace the credential source used for HTTPS fetches
    pub fn with_credentials(mut self, credentials: Arc<dyn CredentialResolver>) -> Self {
        self.credentials = credentials;
        self
    }

    /// Process every repository and aggregate the results.
    ///
    /// Never fails. Timed-out, cancelled and never-admitted repositories get
    /// an error-flagged snapshot and count as failures.
    pub async fn run(&self, repositories: &[RepositoryRecord]) -> BatchOutcome {
        let started = Instant::now();
        let context = Arc::new(UnitContext {
            options: self.options.clone(),
            fetch_options: FetchOptions::new(
                self.options.fetch_retries,
                self.options.fetch_timeout,
            ),
            probe: self.probe.clone(),
            credentials: self.credentials.clone(),
            shutdown: self.shutdown.clone(),
        });
        let limit = context.options.concurrency_limit.max(1);
        let gate = Arc::new(Semaphore::new(limit));

        log::debug!(
            "Starting batch of {} repositories (limit {}, fetch {})",
            repositories.len(),
            limit,
            context.options.fetch
        );

        let mut pending: HashSet<PathBuf> = HashSet::new();
        let mut not_admitted = Vec::new();
        let mut units = JoinSet::new();

        for record in repositories {
            let path = record.path().to_path_buf();

            let permit = tokio::select! {
                biased;
                _ = context.shutdown.triggered() => None,
                permit = gate.clone().acquire_owned() => permit.ok(),
            };
            let Some(permit) = permit else {
                not_admitted.push(path);
                continue;
            };

            pending.insert(path.clone());
            let unit_context = context.clone();
            let is_bare = record.is_bare();
            units.spawn(async move {
                let report = run_unit(&unit_context, path, is_bare).await;
                drop(permit);
                report
            });
        }

        let mut reports = Vec::with_capacity(repositories.len());
        while let Some(joined) = units.join_next().await {
            match joined {
                Ok(report) => {
                    pending.remove(&report.path);
                    reports.push(report);
                }
                Err(e) => log::error!("Repository unit failed: {}", e),
            }
        }

        if !not_admitted.is_empty() {
            log::debug!(
                "{} repositories not started because of cancellation",
                not_admitted.len()
            );
        }
        for path in not_admitted {
            reports.push(UnitReport {
                path,
                fetch: None,
                status: StatusSnapshot::cancelled(),
            });
        }
        for path in pending {
            reports.push(UnitReport {
                path,
                fetch: None,
                status: StatusSnapshot::unavailable("status task failed"),
            });
        }

        let mut outcome = aggregate(reports, context.options.fetch);
        outcome.elapsed = started.elapsed();

        log::debug!(
            "Batch finished in {:?}: {} ok, {} failed",
            outcome.elapsed,
            outcome.success_count,
            outcome.failure_count
        );
        outcome
    }
}

/// Run a batch with the default status probe and credential helper
pub async fn run_batch(
    repositories: &[RepositoryRecord],
    options: BatchOptions,
    shutdown: &ShutdownSignal,
) -> BatchOutcome {
    BatchCoordinator::new(options, shutdown.clone())
        .run(repositories)
        .await
}

async fn run_unit(context: &UnitContext, path: PathBuf, is_bare: bool) -> UnitReport {
    let fetch = if !context.options.fetch {
        None
    } else if is_bare {
        Some(FetchOutcome::Skipped {
            reason: SkipReason::Bare,
        })
    } else {
        Some(
            fetch_origin(
                &path,
                &context.fetch_options,
                context.credentials.as_ref(),
                &context.shutdown,
            )
            .await,
        )
    };

    let mut status = extract_with(
        context.probe.clone(),
        &path,
        context.options.status_timeout,
        &context.shutdown,
    )
    .await;

    if let Some(FetchOutcome::Failed { error }) = &fetch {
        log::debug!("Fetch failed for {}: {}", path.display(), error);
        status.fetch_error = Some(error.to_string());
    }

    UnitReport {
        path,
        fetch,
        status,
    }
}

fn aggregate(reports: Vec<UnitReport>, fetch_enabled: bool) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();
    let mut summary = fetch_enabled.then(FetchSummary::default);

    for report in reports {
        if let (Some(summary), Some(fetch)) = (summary.as_mut(), report.fetch.as_ref()) {
            summary.record(&report.path, fetch);
        }

        if report.status.status_error.is_some() {
            outcome.failure_count += 1;
            outcome.failed_repositories.push(report.path.clone());
        } else {
            outcome.success_count += 1;
        }
        outcome.statuses.insert(report.path, report.status);
    }

    outcome.failed_repositories.sort();
    if let Some(summary) = summary.as_mut() {
        summary.failed_repositories.sort();
    }
    outcome.fetch = summary;
    outcome
}
