//! Status API

pub use crate::status::extractor::{extract, extract_with, GitStatusProbe, StatusProbe};
pub use crate::status::types::StatusSnapshot;
