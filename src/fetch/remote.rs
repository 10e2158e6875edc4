//! Fetching from `origin`
//!
//! One fetch per repository, retried with exponential backoff on transport
//! errors. Each attempt runs gix on the blocking pool under its own time budget
//! and is interrupted through gix's interrupt flag when that budget or the
//! shutdown signal fires.

use crate::core::retry::{retry_async, RetryError, RetryPolicy};
use crate::core::shutdown::ShutdownSignal;
use crate::fetch::credentials::{credentials_for_url, CredentialResolver, Credentials};
use crate::fetch::error::{FetchError, FetchResult};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// The only remote ever fetched
pub const ORIGIN: &str = "origin";

/// Default time budget for a single fetch attempt
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(10);

/// Reflog identity used when the user has no `user.name`/`user.email`
const COMMITTER_FALLBACK: [&str; 2] = [
    "gitoxide.committer.nameFallback=repotree",
    "gitoxide.committer.emailFallback=repotree@localhost",
];

/// Retry and timeout settings for [`fetch_origin`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    pub retry: RetryPolicy,
    pub attempt_timeout: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }
}

impl FetchOptions {
    pub fn new(retries: usize, attempt_timeout: Duration) -> Self {
        Self {
            retry: RetryPolicy::with_attempts(retries),
            attempt_timeout,
        }
    }
}

/// Why a repository was not fetched at all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Bare,
    NoOrigin,
    NoUrl,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SkipReason::Bare => "bare repository",
            SkipReason::NoOrigin => "no origin remote",
            SkipReason::NoUrl => "origin has no URL",
        })
    }
}

#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// Fetched, or already up to date
    Succeeded { attempts: usize },
    Skipped { reason: SkipReason },
    Failed { error: FetchError },
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Succeeded { .. })
    }
}

enum Origin {
    Skip(SkipReason),
    Url(String),
}

/// Fetch from `origin` for the repository at `repo_path`.
///
/// Missing `origin`, a URL-less `origin` and bare repositories are skipped.
/// Timeouts and cancellation end the retry loop immediately.
pub async fn fetch_origin(
    repo_path: &Path,
    options: &FetchOptions,
    resolver: &dyn CredentialResolver,
    shutdown: &ShutdownSignal,
) -> FetchOutcome {
    if shutdown.is_triggered() {
        return FetchOutcome::Failed {
            error: FetchError::Cancelled,
        };
    }

    let path = repo_path.to_path_buf();
    let origin = tokio::task::spawn_blocking(move || inspect_origin(&path))
        .await
        .map_err(|e| FetchError::Task {
            message: e.to_string(),
        })
        .and_then(|inspected| inspected);

    let url = match origin {
        Ok(Origin::Url(url)) => url,
        Ok(Origin::Skip(reason)) => {
            log::debug!("Skipping fetch for {}: {}", repo_path.display(), reason);
            return FetchOutcome::Skipped { reason };
        }
        Err(error) => return FetchOutcome::Failed { error },
    };

    let credentials = credentials_for_url(resolver, &url).await;
    let operation_name = format!("fetch {}", repo_path.display());

    let attempts = std::sync::atomic::AtomicUsize::new(0);
    let result = retry_async(
        &operation_name,
        &options.retry,
        shutdown,
        FetchError::is_retryable,
        || {
            attempts.fetch_add(1, Ordering::Relaxed);
            fetch_attempt(
                repo_path.to_path_buf(),
                credentials.clone(),
                options.attempt_timeout,
                shutdown,
            )
        },
    )
    .await;

    match result {
        Ok(()) => {
            log::debug!("Fetched origin for {}", repo_path.display());
            FetchOutcome::Succeeded {
                attempts: attempts.load(Ordering::Relaxed),
            }
        }
        Err(RetryError::Cancelled { .. }) => FetchOutcome::Failed {
            error: FetchError::Cancelled,
        },
        Err(RetryError::Aborted { source, .. }) => FetchOutcome::Failed { error: source },
        Err(RetryError::Exhausted { attempts, source }) => {
            log::debug!(
                "Fetch for {} failed after {} attempt(s): {}",
                repo_path.display(),
                attempts,
                source
            );
            FetchOutcome::Failed {
                error: FetchError::RetriesExhausted {
                    attempts,
                    source: Box::new(source),
                },
            }
        }
    }
}

fn inspect_origin(repo_path: &Path) -> FetchResult<Origin> {
    let repo = gix::open(repo_path).map_err(|e| FetchError::Open {
        message: e.to_string(),
    })?;

    if repo.is_bare() {
        return Ok(Origin::Skip(SkipReason::Bare));
    }

    let remote = match repo.try_find_remote(ORIGIN) {
        Some(Ok(remote)) => remote,
        Some(Err(e)) => {
            log::debug!("Invalid origin in {}: {}", repo_path.display(), e);
            return Ok(Origin::Skip(SkipReason::NoUrl));
        }
        None => return Ok(Origin::Skip(SkipReason::NoOrigin)),
    };

    match remote.url(gix::remote::Direction::Fetch) {
        Some(url) => Ok(Origin::Url(url.to_bstring().to_string())),
        None => Ok(Origin::Skip(SkipReason::NoUrl)),
    }
}

/// One bounded fetch attempt on the blocking pool
async fn fetch_attempt(
    repo_path: PathBuf,
    credentials: Option<Credentials>,
    timeout: Duration,
    shutdown: &ShutdownSignal,
) -> FetchResult<()> {
    let interrupt = Arc::new(AtomicBool::new(false));
    let flag = interrupt.clone();
    let task = tokio::task::spawn_blocking(move || fetch_blocking(&repo_path, credentials, &flag));

    tokio::select! {
        joined = tokio::time::timeout(timeout, task) => match joined {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(FetchError::Task { message: e.to_string() }),
            Err(_) => {
                interrupt.store(true, Ordering::Relaxed);
                Err(FetchError::Timeout { timeout })
            }
        },
        _ = shutdown.triggered() => {
            interrupt.store(true, Ordering::Relaxed);
            Err(FetchError::Cancelled)
        }
    }
}

/// Open `repo_path` so ref updates work without a configured identity
pub(crate) fn open_for_fetch(repo_path: &Path) -> FetchResult<gix::Repository> {
    let options = gix::open::Options::default().config_overrides(COMMITTER_FALLBACK);
    gix::open_opts(repo_path, options).map_err(|e| FetchError::Open {
        message: e.to_string(),
    })
}

/// Credential callback for a connection.
///
/// Answers only with the resolved credentials, so gix never runs helpers or
/// prompts itself; `None` means an anonymous fetch.
pub(crate) fn credential_handler(
    credentials: Option<Credentials>,
) -> impl FnMut(gix::credentials::helper::Action) -> gix::credentials::protocol::Result
       + Send
       + Sync
       + 'static {
    move |action| match (action, credentials.as_ref()) {
        (gix::credentials::helper::Action::Get(context), Some(credentials)) => {
            Ok(Some(gix::credentials::protocol::Outcome {
                identity: gix::sec::identity::Account {
                    username: credentials.username.clone(),
                    password: credentials.password().to_string(),
                    oauth_refresh_token: None,
                },
                next: context.into(),
            }))
        }
        _ => Ok(None),
    }
}

fn fetch_blocking(
    repo_path: &Path,
    credentials: Option<Credentials>,
    interrupt: &AtomicBool,
) -> FetchResult<()> {
    let repo = open_for_fetch(repo_path)?;
    let remote = repo.find_remote(ORIGIN).map_err(FetchError::remote)?;

    remote
        .connect(gix::remote::Direction::Fetch)
        .map_err(FetchError::remote)?
        .with_credentials(credential_handler(credentials))
        .prepare_fetch(gix::progress::Discard, Default::default())
        .map_err(FetchError::remote)?
        .receive(gix::progress::Discard, interrupt)
        .map_err(FetchError::remote)?;

    Ok(())
}
