//! Git fixtures shared by the status, fetch and batch tests
//!
//! Repositories are built with the git CLI so gix reads exactly what a user's
//! tooling would produce.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Run git in `dir`, panicking with its stderr on failure
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_CONFIG_NOSYSTEM", "1")
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// `git init` on branch `main` with a local identity, no commits
pub fn init_repo(dir: &Path) -> PathBuf {
    fs::create_dir_all(dir).expect("Failed to create repository directory");
    git(dir, &["init", "--quiet"]);
    git(dir, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    git(dir, &["config", "user.name", "Test User"]);
    git(dir, &["config", "user.email", "test@example.com"]);
    git(dir, &["config", "commit.gpgsign", "false"]);
    dir.to_path_buf()
}

/// Repository on `main` with one commit
pub fn init_repo_with_commit(dir: &Path) -> PathBuf {
    init_repo(dir);
    commit_file(dir, "README.md", "initial\n", "Initial commit");
    dir.to_path_buf()
}

/// Bare repository whose HEAD points at `main`
pub fn init_bare_repo(dir: &Path) -> PathBuf {
    fs::create_dir_all(dir).expect("Failed to create repository directory");
    git(dir, &["init", "--bare", "--quiet"]);
    git(dir, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    dir.to_path_buf()
}

/// Write `name` and commit it; returns the new HEAD id
pub fn commit_file(dir: &Path, name: &str, content: &str, message: &str) -> String {
    fs::write(dir.join(name), content).expect("Failed to write file");
    git(dir, &["add", name]);
    git(dir, &["commit", "--quiet", "-m", message]);
    head_id(dir)
}

pub fn head_id(dir: &Path) -> String {
    git(dir, &["rev-parse", "HEAD"])
}

/// Register an `origin` remote and point `origin/main` at `id` without fetching
pub fn fake_origin(dir: &Path, url: &str, id: &str) {
    git(dir, &["remote", "add", "origin", url]);
    git(dir, &["update-ref", "refs/remotes/origin/main", id]);
}

/// Committed repository whose `origin/main` matches HEAD
pub fn init_synced_repo(dir: &Path) -> PathBuf {
    init_repo_with_commit(dir);
    let head = head_id(dir);
    fake_origin(dir, "https://example.invalid/synced.git", &head);
    dir.to_path_buf()
}
