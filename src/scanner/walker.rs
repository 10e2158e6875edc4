//! Depth-first repository discovery
//!
//! Walks a directory tree with `walkdir`, records every repository root it
//! meets and never descends into one. Symlinks are followed only when they
//! resolve to a directory inside the scan root, and directories are
//! de-duplicated by filesystem identity so symlink cycles terminate.

use crate::core::shutdown::ShutdownSignal;
use crate::scanner::detect::{detect_repository, RepositoryKind};
use crate::scanner::error::{ScanError, ScanResult};
use crate::scanner::types::{RepositoryRecord, ScanIssue, ScanIssueKind, ScanOutcome};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use walkdir::{DirEntry, WalkDir};

/// Stable identity of a directory on disk
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum DirIdentity {
    #[cfg(unix)]
    Inode { dev: u64, ino: u64 },
    /// Canonical path, used where no inode is available
    #[cfg(not(unix))]
    Canonical(PathBuf),
}

#[cfg(unix)]
fn dir_identity(_path: &Path, metadata: &fs::Metadata) -> io::Result<DirIdentity> {
    use std::os::unix::fs::MetadataExt;
    Ok(DirIdentity::Inode {
        dev: metadata.dev(),
        ino: metadata.ino(),
    })
}

#[cfg(not(unix))]
fn dir_identity(path: &Path, _metadata: &fs::Metadata) -> io::Result<DirIdentity> {
    fs::canonicalize(path).map(DirIdentity::Canonical)
}

/// Scan `root_path` for repositories.
///
/// Fails only if the root is missing, not a directory, unreadable, or the
/// shutdown signal fires mid-walk. Everything below the root is best effort.
pub fn scan(root_path: impl AsRef<Path>, shutdown: &ShutdownSignal) -> ScanResult<ScanOutcome> {
    let started = Instant::now();
    let requested = root_path.as_ref();

    let metadata =
        fs::metadata(requested).map_err(|e| ScanError::root_not_found(requested.into(), &e))?;
    if !metadata.is_dir() {
        return Err(ScanError::not_a_directory(requested.into()));
    }

    let root = std::path::absolute(requested)
        .map_err(|e| ScanError::root_not_found(requested.into(), &e))?;
    let canonical_root =
        fs::canonicalize(&root).map_err(|e| ScanError::root_not_found(root.clone(), &e))?;

    if shutdown.is_triggered() {
        return Err(ScanError::Cancelled);
    }

    let mut walker = Walker {
        root: root.clone(),
        canonical_root,
        shutdown,
        repositories: Vec::new(),
        errors: Vec::new(),
        visited: HashSet::new(),
        dir_count: 0,
    };
    walker.walk()?;

    let total = walker.repositories.len();
    log::debug!(
        "Scan of {} finished: {} directories, {} repositories, {} issues",
        root.display(),
        walker.dir_count,
        total,
        walker.errors.len()
    );

    Ok(ScanOutcome {
        root_path: root,
        repositories: walker.repositories,
        total_directories_visited: walker.dir_count,
        total_repositories_found: total,
        errors: walker.errors,
        elapsed: started.elapsed(),
    })
}

struct Walker<'a> {
    root: PathBuf,
    canonical_root: PathBuf,
    shutdown: &'a ShutdownSignal,
    repositories: Vec<RepositoryRecord>,
    errors: Vec<ScanIssue>,
    visited: HashSet<DirIdentity>,
    dir_count: usize,
}

impl Walker<'_> {
    fn walk(&mut self) -> ScanResult<()> {
        let canonical_root = self.canonical_root.clone();
        let mut entries = WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| should_enter(entry, &canonical_root));

        // Depths of the symlinked directories on the current descent path
        let mut link_depths: Vec<usize> = Vec::new();

        while let Some(next) = entries.next() {
            if self.shutdown.is_triggered() {
                return Err(ScanError::Cancelled);
            }

            let entry = match next {
                Ok(entry) => entry,
                Err(e) => {
                    self.handle_walk_error(e)?;
                    continue;
                }
            };

            let depth = entry.depth();
            while link_depths.last().is_some_and(|&d| d >= depth) {
                link_depths.pop();
            }
            let is_link = depth > 0 && entry.path_is_symlink();
            if is_link {
                link_depths.push(depth);
            }
            let via_symlink = !link_depths.is_empty();

            let path = entry.path();
            log::debug!("Entering directory: {}", path.display());
            self.dir_count += 1;

            // follow_links makes the metadata that of the link target
            let identity = match entry
                .metadata()
                .map_err(io::Error::from)
                .and_then(|m| dir_identity(path, &m))
            {
                Ok(identity) => identity,
                Err(e) if depth == 0 => {
                    return Err(ScanError::root_unreadable(path.into(), &e));
                }
                Err(e) => {
                    self.record_issue(path, &e);
                    entries.skip_current_dir();
                    continue;
                }
            };
            if !self.visited.insert(identity) {
                log::debug!("Skipping {}: already visited (symlink loop)", path.display());
                entries.skip_current_dir();
                continue;
            }

            if let Some(kind) = detect_repository(path) {
                log::debug!(
                    "Found git repository: {} ({})",
                    path.display(),
                    match kind {
                        RepositoryKind::Regular => "regular",
                        RepositoryKind::Bare => "bare",
                    }
                );
                self.repositories.push(RepositoryRecord::new(
                    path,
                    kind == RepositoryKind::Bare,
                    via_symlink,
                ));
                entries.skip_current_dir();
            }
        }

        Ok(())
    }

    /// Unreadable root is fatal; anything below it becomes a [`ScanIssue`]
    fn handle_walk_error(&mut self, error: walkdir::Error) -> ScanResult<()> {
        let is_root = error.depth() == 0 && error.path() == Some(self.root.as_path());
        let path = error
            .path()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.root.clone());

        if let Some(ancestor) = error.loop_ancestor() {
            log::debug!(
                "Skipping {}: symlink loop back to {}",
                path.display(),
                ancestor.display()
            );
            return Ok(());
        }

        let is_broken_link = error
            .io_error()
            .is_some_and(|e| e.kind() == io::ErrorKind::NotFound)
            && fs::symlink_metadata(&path).is_ok_and(|m| m.file_type().is_symlink());

        let io_error = io::Error::from(error);
        if is_root {
            return Err(ScanError::root_unreadable(path, &io_error));
        }

        if is_broken_link {
            log::debug!("Skipping {}: broken symlink ({})", path.display(), io_error);
            self.errors.push(ScanIssue {
                path,
                kind: ScanIssueKind::BrokenSymlink,
                message: io_error.to_string(),
            });
        } else {
            self.record_issue(&path, &io_error);
        }
        Ok(())
    }

    fn record_issue(&mut self, path: &Path, error: &io::Error) {
        let kind = if error.kind() == io::ErrorKind::PermissionDenied {
            ScanIssueKind::PermissionDenied
        } else {
            ScanIssueKind::Io
        };
        log::debug!("Skipping {}: {}", path.display(), error);
        self.errors.push(ScanIssue {
            path: path.to_path_buf(),
            kind,
            message: error.to_string(),
        });
    }
}

/// Directories only; a symlink only if its target is inside the scan root
fn should_enter(entry: &DirEntry, canonical_root: &Path) -> bool {
    if entry.depth() == 0 {
        return true;
    }
    if !entry.file_type().is_dir() {
        return false;
    }
    if !entry.path_is_symlink() {
        return true;
    }

    match fs::canonicalize(entry.path()) {
        Ok(target) if target.starts_with(canonical_root) => true,
        Ok(target) => {
            log::debug!(
                "Skipping {}: symlink target {} is outside the scan root",
                entry.path().display(),
                target.display()
            );
            false
        }
        Err(e) => {
            log::debug!("Skipping {}: {}", entry.path().display(), e);
            false
        }
    }
}
