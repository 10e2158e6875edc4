//! Tests for repository detection

use super::helpers::{fake_bare_repo, fake_repo};
use crate::scanner::detect::{detect_repository, RepositoryKind};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_detects_regular_repository() {
    let temp = TempDir::new().unwrap();
    let repo = fake_repo(temp.path(), "project");

    assert_eq!(detect_repository(&repo), Some(RepositoryKind::Regular));
}

#[test]
fn test_detects_bare_repository() {
    let temp = TempDir::new().unwrap();
    let repo = fake_bare_repo(temp.path(), "project.git");

    assert_eq!(detect_repository(&repo), Some(RepositoryKind::Bare));
}

#[test]
fn test_bare_detection_requires_all_three_entries() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("partial");
    fs::create_dir_all(dir.join("refs")).unwrap();
    fs::write(dir.join("HEAD"), "ref: refs/heads/main\n").unwrap();

    assert_eq!(detect_repository(&dir), None, "objects/ is missing");

    fs::create_dir_all(dir.join("objects")).unwrap();
    assert_eq!(detect_repository(&dir), Some(RepositoryKind::Bare));
}

#[test]
fn test_refs_as_file_is_not_bare() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("odd");
    fs::create_dir_all(dir.join("objects")).unwrap();
    fs::write(dir.join("HEAD"), "x").unwrap();
    fs::write(dir.join("refs"), "not a directory").unwrap();

    assert_eq!(detect_repository(&dir), None);
}

#[test]
fn test_git_file_is_not_a_repository() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("worktree");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(".git"), "gitdir: /elsewhere\n").unwrap();

    assert_eq!(detect_repository(&dir), None);
}

#[test]
fn test_plain_directory_is_not_a_repository() {
    let temp = TempDir::new().unwrap();
    assert_eq!(detect_repository(temp.path()), None);
}
