//! Repository classification
//!
//! Decides which repositories need attention. The default report hides clean
//! ones; `--all` shows everything.

use crate::scanner::types::RepositoryRecord;
use crate::status::types::StatusSnapshot;

/// Display filter settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub show_all: bool,
}

/// A repository is clean when its status is known and standard.
///
/// A missing status is never clean.
pub fn is_clean(record: &RepositoryRecord) -> bool {
    record
        .status
        .as_ref()
        .is_some_and(StatusSnapshot::is_standard)
}

/// Records to display, in their original order
pub fn filter_repositories<'a>(
    records: &'a [RepositoryRecord],
    options: &FilterOptions,
) -> Vec<&'a RepositoryRecord> {
    records
        .iter()
        .filter(|record| options.show_all || !is_clean(record))
        .collect()
}
