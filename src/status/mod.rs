//! Status Component
//!
//! Per-repository status: current branch, ahead/behind counts against
//! `origin/<branch>`, stash presence and working-tree cleanliness.

pub mod api;
pub mod extractor;
pub mod types;

pub use extractor::{
    extract, extract_blocking, extract_with, GitStatusProbe, StatusProbe, DEFAULT_STATUS_TIMEOUT,
};
pub use types::{StatusSnapshot, DETACHED_BRANCH, UNKNOWN_BRANCH};

#[cfg(test)]
pub(crate) mod tests;
