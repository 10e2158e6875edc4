//! Status Extraction
//!
//! Computes a [`StatusSnapshot`] for one repository with gix. Every step is
//! best effort: a failing step records the first error on the snapshot and the
//! remaining steps still run.

use crate::core::shutdown::ShutdownSignal;
use crate::status::types::{StatusSnapshot, UNKNOWN_BRANCH};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default per-repository time budget
pub const DEFAULT_STATUS_TIMEOUT: Duration = Duration::from_secs(10);

/// Extractions slower than this get an extra debug line
const SLOW_EXTRACTION: Duration = Duration::from_millis(100);

/// Paths listed per change category in debug output
const MAX_LISTED_PATHS: usize = 20;

/// Synchronous source of status snapshots
///
/// Runs on the blocking pool; the async wrappers in this module apply the time
/// budget and the shutdown signal around it.
pub trait StatusProbe: Send + Sync + 'static {
    fn probe(&self, repo_path: &Path) -> StatusSnapshot;
}

/// Probe backed by [`extract_blocking`]
#[derive(Debug, Clone, Copy, Default)]
pub struct GitStatusProbe;

impl StatusProbe for GitStatusProbe {
    fn probe(&self, repo_path: &Path) -> StatusSnapshot {
        extract_blocking(repo_path)
    }
}

enum HeadState {
    Branch(String),
    Detached,
}

/// Compute the status of the repository at `repo_path` on the current thread
pub fn extract_blocking(repo_path: &Path) -> StatusSnapshot {
    let started = Instant::now();

    let repo = match gix::open(repo_path) {
        Ok(repo) => repo,
        Err(e) => {
            log::debug!("Failed to open {}: {}", repo_path.display(), e);
            return StatusSnapshot::unavailable(format!("failed to open repository: {}", e));
        }
    };

    let mut status = match resolve_head(&repo) {
        Ok(HeadState::Branch(name)) => StatusSnapshot::new(name),
        Ok(HeadState::Detached) => StatusSnapshot::detached(),
        Err(e) => {
            let mut status = StatusSnapshot::new(UNKNOWN_BRANCH);
            status.record_error(e);
            status
        }
    };

    status.has_remote = !repo.remote_names().is_empty();

    let on_branch = !status.is_detached && status.status_error.is_none();
    if status.has_remote && on_branch {
        match ahead_behind(&repo, &status.branch) {
            Ok(Some((ahead, behind))) => {
                status.ahead = ahead;
                status.behind = behind;
            }
            Ok(None) => log::debug!(
                "{}: no tracking ref origin/{}",
                repo_path.display(),
                status.branch
            ),
            Err(e) => status.record_error(e),
        }
    }

    status.has_stashes = matches!(repo.try_find_reference("refs/stash"), Ok(Some(_)));

    if !repo.is_bare() {
        match working_tree_dirty(&repo, repo_path) {
            Ok(dirty) => status.has_changes = dirty,
            Err(e) => status.record_error(e),
        }
    }

    let elapsed = started.elapsed();
    log::debug!(
        "Status of {}: branch={} detached={} remote={} ahead={} behind={} stash={} changes={} in {:?}",
        repo_path.display(),
        status.branch,
        status.is_detached,
        status.has_remote,
        status.ahead,
        status.behind,
        status.has_stashes,
        status.has_changes,
        elapsed
    );
    if elapsed > SLOW_EXTRACTION {
        log::debug!("Slow status extraction for {}: {:?}", repo_path.display(), elapsed);
    }

    status
}

/// Extract status under a time budget
pub async fn extract(repo_path: &Path, timeout: Duration) -> StatusSnapshot {
    extract_with(
        Arc::new(GitStatusProbe),
        repo_path,
        timeout,
        &ShutdownSignal::new(),
    )
    .await
}

/// Run `probe` on the blocking pool, bounded by `timeout` and `shutdown`.
///
/// Never fails: a timeout yields [`StatusSnapshot::timed_out`] and
/// cancellation yields [`StatusSnapshot::cancelled`]. The blocking work is
/// abandoned in both cases and its result discarded.
pub async fn extract_with(
    probe: Arc<dyn StatusProbe>,
    repo_path: &Path,
    timeout: Duration,
    shutdown: &ShutdownSignal,
) -> StatusSnapshot {
    if shutdown.is_triggered() {
        return StatusSnapshot::cancelled();
    }

    let path: PathBuf = repo_path.to_path_buf();
    let task = tokio::task::spawn_blocking(move || probe.probe(&path));

    tokio::select! {
        joined = tokio::time::timeout(timeout, task) => match joined {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                log::error!("Status task for {} failed: {}", repo_path.display(), e);
                StatusSnapshot::unavailable(format!("status task failed: {}", e))
            }
            Err(_) => {
                log::debug!("Status of {} timed out after {:?}", repo_path.display(), timeout);
                StatusSnapshot::timed_out()
            }
        },
        _ = shutdown.triggered() => {
            log::debug!("Status of {} cancelled", repo_path.display());
            StatusSnapshot::cancelled()
        }
    }
}

fn resolve_head(repo: &gix::Repository) -> Result<HeadState, String> {
    let name = repo
        .head_name()
        .map_err(|e| format!("failed to get HEAD: {}", e))?;

    Ok(match name {
        Some(name) => {
            let full = name.as_bstr().to_string();
            match full.strip_prefix("refs/heads/") {
                Some(short) => HeadState::Branch(short.to_string()),
                None => HeadState::Detached,
            }
        }
        None => HeadState::Detached,
    })
}

/// Commits on HEAD but not on `origin/<branch>`, and the reverse.
///
/// `Ok(None)` when there is no tracking ref.
fn ahead_behind(repo: &gix::Repository, branch: &str) -> Result<Option<(usize, usize)>, String> {
    let tracking_name = format!("refs/remotes/origin/{}", branch);
    let mut tracking = match repo.try_find_reference(tracking_name.as_str()) {
        Ok(Some(reference)) => reference,
        Ok(None) => return Ok(None),
        Err(e) => return Err(format!("failed to find {}: {}", tracking_name, e)),
    };

    let remote_tip = tracking
        .peel_to_id_in_place()
        .map_err(|e| format!("failed to resolve {}: {}", tracking_name, e))?
        .detach();
    let local_tip = repo
        .head_id()
        .map_err(|e| format!("failed to resolve HEAD commit: {}", e))?
        .detach();

    if local_tip == remote_tip {
        return Ok(Some((0, 0)));
    }

    let local_history = reachable_commits(repo, local_tip)?;
    let remote_history = reachable_commits(repo, remote_tip)?;

    let ahead = local_history.difference(&remote_history).count();
    let behind = remote_history.difference(&local_history).count();
    Ok(Some((ahead, behind)))
}

fn reachable_commits(
    repo: &gix::Repository,
    tip: gix::ObjectId,
) -> Result<HashSet<gix::ObjectId>, String> {
    let walk = repo
        .rev_walk([tip])
        .all()
        .map_err(|e| format!("failed to walk history from {}: {}", tip, e))?;

    let mut seen = HashSet::new();
    for info in walk {
        let info = info.map_err(|e| format!("failed to walk history from {}: {}", tip, e))?;
        seen.insert(info.id);
    }
    Ok(seen)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChangeKind {
    Modified,
    Untracked,
    Staged,
    Deleted,
}

/// Category of a status item, `None` for items that are not changes
pub(crate) fn change_kind(item: &gix::status::Item) -> Option<ChangeKind> {
    use gix::status::index_worktree::iter::Summary;

    match item {
        gix::status::Item::TreeIndex(_) => Some(ChangeKind::Staged),
        gix::status::Item::IndexWorktree(change) => match change.summary()? {
            Summary::Removed => Some(ChangeKind::Deleted),
            Summary::Added => Some(ChangeKind::Untracked),
            _ => Some(ChangeKind::Modified),
        },
    }
}

/// Changed paths by category, at most [`MAX_LISTED_PATHS`] kept per category
#[derive(Debug, Default)]
pub(crate) struct ChangedPaths {
    pub(crate) modified: Vec<String>,
    pub(crate) untracked: Vec<String>,
    pub(crate) staged: Vec<String>,
    pub(crate) deleted: Vec<String>,
    pub(crate) total: usize,
}

impl ChangedPaths {
    pub(crate) fn record(&mut self, kind: ChangeKind, path: String) {
        self.total += 1;
        let list = match kind {
            ChangeKind::Modified => &mut self.modified,
            ChangeKind::Untracked => &mut self.untracked,
            ChangeKind::Staged => &mut self.staged,
            ChangeKind::Deleted => &mut self.deleted,
        };
        if list.len() < MAX_LISTED_PATHS {
            list.push(path);
        }
    }

    fn log(&self, repo_path: &Path) {
        let categories = [
            ("Modified", &self.modified),
            ("Untracked", &self.untracked),
            ("Staged", &self.staged),
            ("Deleted", &self.deleted),
        ];
        log::debug!("{}: {} changed paths", repo_path.display(), self.total);
        for (label, paths) in categories {
            if !paths.is_empty() {
                log::debug!("  {} files: {}", label, paths.join(", "));
            }
        }
    }
}

/// Any staged, unstaged or untracked (non-ignored) path counts as a change.
///
/// With debug logging on, every item is read so changed paths can be listed.
fn working_tree_dirty(repo: &gix::Repository, repo_path: &Path) -> Result<bool, String> {
    let changes = repo
        .status(gix::progress::Discard)
        .map_err(|e| format!("failed to get worktree status: {}", e))?
        .into_iter(Vec::<gix::bstr::BString>::new())
        .map_err(|e| format!("failed to get worktree status: {}", e))?;

    let list_paths = log::log_enabled!(log::Level::Debug);
    let mut changed = ChangedPaths::default();

    for item in changes {
        let item = item.map_err(|e| format!("failed to get worktree status: {}", e))?;
        let Some(kind) = change_kind(&item) else {
            continue;
        };
        if !list_paths {
            return Ok(true);
        }
        changed.record(kind, item.location().to_string());
    }

    if changed.total > 0 {
        changed.log(repo_path);
    }
    Ok(changed.total > 0)
}
