//! Concurrent discovery and status reporting for git repositories.
//!
//! [`scanner`] finds repositories below a directory, [`batch`] fetches and
//! inspects them with bounded concurrency using [`fetch`] and [`status`], and
//! [`classify`] picks the ones that need attention.

pub mod app;
pub mod batch;
pub mod classify;
pub mod core;
pub mod fetch;
pub mod scanner;
pub mod status;
