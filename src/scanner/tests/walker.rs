//! Tests for the depth-first walker

use super::helpers::{fake_bare_repo, fake_repo, relative_repo_paths};
use crate::core::shutdown::ShutdownSignal;
use crate::scanner::error::ScanError;
use crate::scanner::types::ScanIssueKind;
use crate::scanner::walker::scan;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_empty_tree_finds_nothing() {
    let temp = TempDir::new().unwrap();

    let outcome = scan(temp.path(), &ShutdownSignal::new()).unwrap();

    assert_eq!(outcome.total_repositories_found, 0);
    assert!(outcome.repositories.is_empty());
    assert!(!outcome.has_errors());
    assert_eq!(outcome.total_directories_visited, 1);
    assert!(outcome.validate().is_ok());
}

#[test]
fn test_finds_regular_and_bare_repositories() {
    let temp = TempDir::new().unwrap();
    fake_repo(temp.path(), "work/alpha");
    fake_repo(temp.path(), "work/beta");
    fake_bare_repo(temp.path(), "mirrors/gamma.git");
    fs::create_dir_all(temp.path().join("notes/drafts")).unwrap();

    let outcome = scan(temp.path(), &ShutdownSignal::new()).unwrap();

    assert_eq!(
        relative_repo_paths(&outcome),
        vec!["mirrors/gamma.git", "work/alpha", "work/beta"]
    );
    assert_eq!(outcome.total_repositories_found, 3);
    let bare: Vec<_> = outcome
        .repositories
        .iter()
        .filter(|r| r.is_bare())
        .map(|r| r.name().to_string())
        .collect();
    assert_eq!(bare, vec!["gamma.git"]);
    assert!(outcome.validate().is_ok());
}

#[test]
fn test_does_not_descend_into_found_repository() {
    let temp = TempDir::new().unwrap();
    let outer = fake_repo(temp.path(), "outer");
    fake_repo(&outer, "vendor/inner");

    let outcome = scan(temp.path(), &ShutdownSignal::new()).unwrap();

    assert_eq!(relative_repo_paths(&outcome), vec!["outer"]);
    // root + outer; nothing inside outer is entered
    assert_eq!(outcome.total_directories_visited, 2);
}

#[test]
fn test_root_that_is_a_repository_is_reported_alone() {
    let temp = TempDir::new().unwrap();
    let root = fake_repo(temp.path(), "project");
    fake_repo(&root, "nested");

    let outcome = scan(&root, &ShutdownSignal::new()).unwrap();

    assert_eq!(outcome.total_repositories_found, 1);
    assert_eq!(outcome.repositories[0].name(), "project");
}

#[test]
fn test_repository_paths_are_absolute_and_ordered() {
    let temp = TempDir::new().unwrap();
    fake_repo(temp.path(), "b");
    fake_repo(temp.path(), "a");
    fake_repo(temp.path(), "c/d");

    let outcome = scan(temp.path(), &ShutdownSignal::new()).unwrap();

    let names: Vec<_> = outcome.repositories.iter().map(|r| r.name()).collect();
    assert_eq!(names, vec!["a", "b", "d"]);
    assert!(outcome.repositories.iter().all(|r| r.path().is_absolute()));
    assert!(outcome.root_path.is_absolute());
}

#[test]
fn test_rescanning_is_idempotent() {
    let temp = TempDir::new().unwrap();
    fake_repo(temp.path(), "one");
    fake_bare_repo(temp.path(), "two/three.git");

    let first = scan(temp.path(), &ShutdownSignal::new()).unwrap();
    let second = scan(temp.path(), &ShutdownSignal::new()).unwrap();

    assert_eq!(relative_repo_paths(&first), relative_repo_paths(&second));
    assert_eq!(
        first.total_directories_visited,
        second.total_directories_visited
    );
}

#[test]
fn test_missing_root_is_fatal() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("does-not-exist");

    let result = scan(&missing, &ShutdownSignal::new());

    assert!(matches!(result, Err(ScanError::RootNotFound { .. })));
}

#[test]
fn test_file_root_is_fatal() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("plain.txt");
    fs::write(&file, "hello").unwrap();

    let result = scan(&file, &ShutdownSignal::new());

    match result {
        Err(ScanError::NotADirectory { message, .. }) => {
            assert!(message.contains("is not a directory"))
        }
        other => panic!("expected NotADirectory, got {:?}", other),
    }
}

#[test]
fn test_cancelled_signal_aborts_scan() {
    let temp = TempDir::new().unwrap();
    fake_repo(temp.path(), "repo");
    let shutdown = ShutdownSignal::new();
    shutdown.trigger();

    let result = scan(temp.path(), &shutdown);

    assert!(matches!(result, Err(ScanError::Cancelled)));
}

#[cfg(unix)]
mod unix {
    use super::*;
    use std::os::unix::fs::{symlink, PermissionsExt};

    fn running_as_root() -> bool {
        unsafe { libc::geteuid() == 0 }
    }

    #[test]
    fn test_symlink_cycle_terminates() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("a/b")).unwrap();
        symlink(temp.path(), temp.path().join("a/b/loop")).unwrap();
        fake_repo(temp.path(), "a/repo");

        let outcome = scan(temp.path(), &ShutdownSignal::new()).unwrap();

        assert_eq!(relative_repo_paths(&outcome), vec!["a/repo"]);
    }

    #[test]
    fn test_symlinked_repository_inside_tree_is_marked() {
        let temp = TempDir::new().unwrap();
        fake_repo(temp.path(), "z_real/project");
        symlink(
            temp.path().join("z_real/project"),
            temp.path().join("a_link"),
        )
        .unwrap();

        let outcome = scan(temp.path(), &ShutdownSignal::new()).unwrap();

        // The link sorts first, so the repository is reached through it and
        // the real directory is then skipped as already visited.
        assert_eq!(outcome.total_repositories_found, 1);
        let record = &outcome.repositories[0];
        assert!(record.is_symlink());
        assert_eq!(record.name(), "a_link");
    }

    #[test]
    fn test_symlink_outside_tree_is_not_followed() {
        let outside = TempDir::new().unwrap();
        fake_repo(outside.path(), "elsewhere");
        let temp = TempDir::new().unwrap();
        symlink(outside.path(), temp.path().join("external")).unwrap();

        let outcome = scan(temp.path(), &ShutdownSignal::new()).unwrap();

        assert_eq!(outcome.total_repositories_found, 0);
        assert!(!outcome.has_errors());
    }

    #[test]
    fn test_symlink_to_file_is_ignored() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("target.txt"), "x").unwrap();
        symlink(temp.path().join("target.txt"), temp.path().join("link")).unwrap();

        let outcome = scan(temp.path(), &ShutdownSignal::new()).unwrap();

        assert_eq!(outcome.total_repositories_found, 0);
        assert!(!outcome.has_errors());
    }

    #[test]
    fn test_broken_symlink_is_recorded_and_skipped() {
        let temp = TempDir::new().unwrap();
        symlink(temp.path().join("missing"), temp.path().join("dangling")).unwrap();
        fake_repo(temp.path(), "ok");

        let outcome = scan(temp.path(), &ShutdownSignal::new()).unwrap();

        assert_eq!(outcome.total_repositories_found, 1);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].kind, ScanIssueKind::BrokenSymlink);
    }

    #[test]
    fn test_unreadable_subdirectory_is_non_fatal() {
        if running_as_root() {
            return;
        }
        let temp = TempDir::new().unwrap();
        let locked = temp.path().join("locked");
        fake_repo(&locked, "hidden");
        fake_repo(temp.path(), "visible");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let outcome = scan(temp.path(), &ShutdownSignal::new());

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        let outcome = outcome.unwrap();
        assert_eq!(relative_repo_paths(&outcome), vec!["visible"]);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].kind, ScanIssueKind::PermissionDenied);
        assert!(outcome.errors[0].to_string().starts_with("permission denied"));
    }

    #[test]
    fn test_unreadable_root_is_fatal() {
        if running_as_root() {
            return;
        }
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("root");
        fs::create_dir_all(&root).unwrap();
        fs::set_permissions(&root, fs::Permissions::from_mode(0o000)).unwrap();

        let result = scan(&root, &ShutdownSignal::new());

        fs::set_permissions(&root, fs::Permissions::from_mode(0o755)).unwrap();
        assert!(matches!(result, Err(ScanError::RootUnreadable { .. })));
    }

    #[test]
    fn test_repositories_below_symlinked_directory_are_marked() {
        let temp = TempDir::new().unwrap();
        fake_repo(temp.path(), "z_group/one");
        fake_repo(temp.path(), "z_group/two");
        fake_repo(temp.path(), "zz_plain");
        symlink(temp.path().join("z_group"), temp.path().join("a_group")).unwrap();

        let outcome = scan(temp.path(), &ShutdownSignal::new()).unwrap();

        assert_eq!(
            relative_repo_paths(&outcome),
            vec!["a_group/one", "a_group/two", "zz_plain"]
        );
        let linked: Vec<_> = outcome
            .repositories
            .iter()
            .map(|r| (r.name().to_string(), r.is_symlink()))
            .collect();
        assert_eq!(
            linked,
            vec![
                ("one".to_string(), true),
                ("two".to_string(), true),
                ("zz_plain".to_string(), false),
            ]
        );
    }

    #[test]
    fn test_two_links_to_one_directory_yield_one_repository() {
        let temp = TempDir::new().unwrap();
        fake_repo(temp.path(), "shared/project");
        fs::create_dir_all(temp.path().join("left")).unwrap();
        fs::create_dir_all(temp.path().join("right")).unwrap();
        symlink(temp.path().join("shared"), temp.path().join("left/link")).unwrap();
        symlink(temp.path().join("shared"), temp.path().join("right/link")).unwrap();

        let outcome = scan(temp.path(), &ShutdownSignal::new()).unwrap();

        assert_eq!(relative_repo_paths(&outcome), vec!["left/link/project"]);
        assert!(!outcome.has_errors());
    }
}
