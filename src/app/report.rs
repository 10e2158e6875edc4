//! Report rendering
//!
//! One line per repository on stdout, statistics on stderr. Colour is an
//! explicit argument everywhere.

use crate::batch::types::{BatchOutcome, FetchSummary};
use crate::core::styles::StyleRole;
use crate::scanner::types::{RepositoryRecord, ScanIssue, ScanOutcome};
use crate::status::types::{StatusSnapshot, STANDARD_BRANCHES, UNKNOWN_BRANCH};
use serde::Serialize;
use std::path::Path;

pub const NO_REPOSITORIES: &str = "No Git repositories found in this directory.";
pub const ALL_CLEAN: &str =
    "All repositories are in clean state (on main/master, in sync with remote, no changes).";
pub const SHOW_ALL_HINT: &str = "Use --all flag to show all repositories including clean ones.";

/// Path of `repo` relative to the scan root; `.` for the root itself
pub fn display_path(repo: &Path, root: &Path) -> String {
    match repo.strip_prefix(root) {
        Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
        Ok(rel) => rel.display().to_string(),
        Err(_) => repo.display().to_string(),
    }
}

fn status_badges(status: &StatusSnapshot, color: bool) -> Vec<String> {
    let mut badges = Vec::new();

    if status.branch != UNKNOWN_BRANCH {
        let role = if STANDARD_BRANCHES.contains(&status.branch.as_str()) {
            StyleRole::Branch
        } else {
            StyleRole::OffBranch
        };
        badges.push(role.paint(&status.branch, color));
    }
    if status.ahead > 0 {
        badges.push(StyleRole::Ahead.paint(&format!("↑{}", status.ahead), color));
    }
    if status.behind > 0 {
        badges.push(StyleRole::Behind.paint(&format!("↓{}", status.behind), color));
    }
    if status.has_stashes {
        badges.push(StyleRole::Stash.paint("$", color));
    }
    if status.has_changes {
        badges.push(StyleRole::Changes.paint("*", color));
    }
    if !status.has_remote && status.status_error.is_none() {
        badges.push(StyleRole::NoRemote.paint("○", color));
    }

    badges
}

/// `path [branch ↑n ↓n $ * ○]` followed by any error notes
pub fn repository_line(record: &RepositoryRecord, root: &Path, color: bool) -> String {
    let mut line = StyleRole::Path.paint(&display_path(record.path(), root), color);

    if record.is_bare() {
        line.push(' ');
        line.push_str(&StyleRole::Dim.paint("(bare)", color));
    }
    if record.is_symlink() {
        line.push(' ');
        line.push_str(&StyleRole::Dim.paint("(symlink)", color));
    }

    let Some(status) = &record.status else {
        line.push(' ');
        line.push_str(&StyleRole::Dim.paint("[status unknown]", color));
        return line;
    };

    let badges = status_badges(status, color);
    if !badges.is_empty() {
        line.push_str(&format!(" [{}]", badges.join(" ")));
    }

    if status.is_timeout() {
        line.push(' ');
        line.push_str(&StyleRole::Error.paint("timed out", color));
    } else if let Some(error) = &status.status_error {
        line.push(' ');
        line.push_str(&StyleRole::Error.paint(&format!("error: {}", error), color));
    }
    if let Some(error) = &status.fetch_error {
        line.push(' ');
        line.push_str(&StyleRole::Error.paint(&format!("fetch failed: {}", error), color));
    }

    line
}

pub fn render_list(records: &[&RepositoryRecord], root: &Path, color: bool) -> String {
    let mut out = String::new();
    for record in records {
        out.push_str(&repository_line(record, root, color));
        out.push('\n');
    }
    out
}

fn render_fetch_summary(out: &mut String, summary: &FetchSummary) {
    if summary.attempted == 0 && summary.skipped == 0 {
        return;
    }
    out.push_str(&format!(
        "Fetch: {} attempted, {} successful, {} skipped, {} failed\n",
        summary.attempted, summary.succeeded, summary.skipped, summary.failed
    ));
    if summary.failed > 0 {
        out.push_str("\nFetch failures:\n");
        for path in &summary.failed_repositories {
            out.push_str(&format!("  - {}\n", path.display()));
        }
    }
}

/// Statistics block written to stderr after the list
pub fn render_summary(scan: &ScanOutcome, batch: Option<&BatchOutcome>, color: bool) -> String {
    let mut out = String::from("\n");
    out.push_str(&format!("Scanned: {} folders\n", scan.total_directories_visited));
    out.push_str(&format!("Found: {} repositories\n", scan.total_repositories_found));

    if scan.has_errors() {
        out.push_str(&StyleRole::Dim.paint(
            &format!("Skipped: {} unreadable paths", scan.errors.len()),
            color,
        ));
        out.push('\n');
    }

    if let Some(batch) = batch {
        let timeouts = batch.timeout_count();
        if timeouts > 0 {
            out.push_str(&StyleRole::Error.paint(
                &format!("Timed out: {} repositories", timeouts),
                color,
            ));
            out.push('\n');
        }
        if let Some(summary) = &batch.fetch {
            render_fetch_summary(&mut out, summary);
        }
    }

    out
}

#[derive(Serialize)]
struct JsonReport<'a> {
    root: &'a Path,
    repositories: &'a [&'a RepositoryRecord],
    total_directories_visited: usize,
    total_repositories_found: usize,
    scan_errors: &'a [ScanIssue],
    success_count: usize,
    failure_count: usize,
    fetch: Option<&'a FetchSummary>,
}

/// Machine-readable report of the displayed records and run statistics
pub fn render_json(
    scan: &ScanOutcome,
    shown: &[&RepositoryRecord],
    batch: Option<&BatchOutcome>,
) -> Result<String, serde_json::Error> {
    let report = JsonReport {
        root: &scan.root_path,
        repositories: shown,
        total_directories_visited: scan.total_directories_visited,
        total_repositories_found: scan.total_repositories_found,
        scan_errors: &scan.errors,
        success_count: batch.map_or(0, |b| b.success_count),
        failure_count: batch.map_or(0, |b| b.failure_count),
        fetch: batch.and_then(|b| b.fetch.as_ref()),
    };
    serde_json::to_string_pretty(&report)
}
