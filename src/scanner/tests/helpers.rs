//! Test helper functions for scanner unit tests
//!
//! The scanner only looks at directory layout, so fixtures fake repository
//! metadata instead of running git.

use std::fs;
use std::path::{Path, PathBuf};

/// Create `root/rel` with an empty `.git/` directory inside
pub fn fake_repo(root: &Path, rel: &str) -> PathBuf {
    let dir = root.join(rel);
    fs::create_dir_all(dir.join(".git")).expect("Failed to create .git");
    dir
}

/// Create `root/rel` laid out like a bare repository
pub fn fake_bare_repo(root: &Path, rel: &str) -> PathBuf {
    let dir = root.join(rel);
    fs::create_dir_all(dir.join("refs/heads")).expect("Failed to create refs");
    fs::create_dir_all(dir.join("objects")).expect("Failed to create objects");
    fs::write(dir.join("HEAD"), "ref: refs/heads/main\n").expect("Failed to write HEAD");
    dir
}

/// Sorted repository paths of an outcome, relative to its root
pub fn relative_repo_paths(outcome: &crate::scanner::ScanOutcome) -> Vec<String> {
    let mut paths: Vec<String> = outcome
        .repositories
        .iter()
        .map(|r| {
            r.path()
                .strip_prefix(&outcome.root_path)
                .unwrap_or(r.path())
                .to_string_lossy()
                .to_string()
        })
        .collect();
    paths.sort();
    paths
}
