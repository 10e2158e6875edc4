//! Repository fixtures built with the git CLI

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

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

/// Committed repository on `main` with identity configured
pub fn committed_repo(dir: &Path) -> PathBuf {
    fs::create_dir_all(dir).expect("Failed to create repository directory");
    git(dir, &["init", "--quiet"]);
    git(dir, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    git(dir, &["config", "user.name", "Test User"]);
    git(dir, &["config", "user.email", "test@example.com"]);
    git(dir, &["config", "commit.gpgsign", "false"]);
    fs::write(dir.join("README.md"), "initial\n").expect("Failed to write README");
    git(dir, &["add", "README.md"]);
    git(dir, &["commit", "--quiet", "-m", "Initial commit"]);
    dir.to_path_buf()
}

/// Committed repository whose `origin/main` equals HEAD, so it is clean
pub fn clean_repo(dir: &Path) -> PathBuf {
    committed_repo(dir);
    let head = git(dir, &["rev-parse", "HEAD"]);
    git(dir, &["remote", "add", "origin", "https://example.invalid/clean.git"]);
    git(dir, &["update-ref", "refs/remotes/origin/main", &head]);
    dir.to_path_buf()
}

/// Clean repository with an untracked file
pub fn dirty_repo(dir: &Path) -> PathBuf {
    clean_repo(dir);
    fs::write(dir.join("scratch.txt"), "wip\n").expect("Failed to write scratch file");
    dir.to_path_buf()
}

pub fn bare_repo(dir: &Path) -> PathBuf {
    fs::create_dir_all(dir).expect("Failed to create repository directory");
    git(dir, &["init", "--bare", "--quiet"]);
    git(dir, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    dir.to_path_buf()
}
