//! Batch API

pub use crate::batch::coordinator::{run_batch, BatchCoordinator};
pub use crate::batch::types::{BatchOptions, BatchOutcome, FetchSummary};
