//! Fetch API

pub use crate::fetch::credentials::{CredentialResolver, GitCredentialHelper};
pub use crate::fetch::error::{FetchError, FetchResult};
pub use crate::fetch::remote::{fetch_origin, FetchOptions, FetchOutcome, SkipReason};
