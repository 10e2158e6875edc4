//! Repository root detection

use std::path::Path;

/// Layout of a detected repository root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryKind {
    /// Working tree with a `.git` directory
    Regular,
    /// `HEAD`, `refs/` and `objects/` directly in the directory
    Bare,
}

/// Classify `path` as a repository root, if it is one.
///
/// A `.git` *file* (worktree or submodule pointer) does not count.
pub fn detect_repository(path: &Path) -> Option<RepositoryKind> {
    if path.join(".git").is_dir() {
        return Some(RepositoryKind::Regular);
    }

    let head = path.join("HEAD").exists();
    let refs = path.join("refs").is_dir();
    let objects = path.join("objects").is_dir();
    if head && refs && objects {
        return Some(RepositoryKind::Bare);
    }

    None
}
