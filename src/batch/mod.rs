//! Batch Component
//!
//! Fans per-repository fetch and status work out over a bounded number of
//! concurrent units and folds the results into one [`BatchOutcome`].

pub mod api;
pub mod coordinator;
pub mod types;

pub use coordinator::{run_batch, BatchCoordinator};
pub use types::{BatchOptions, BatchOutcome, FetchSummary, DEFAULT_CONCURRENCY_LIMIT};
