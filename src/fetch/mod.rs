//! Fetch Component
//!
//! Optional network refresh of `origin` before status extraction.
//!
//! ## Core Features
//!
//! - **Exponential backoff**: 500ms doubling per retry, capped at 10s
//! - **Per-attempt timeout**: a stuck transfer is interrupted, not waited on
//! - **Credential helpers**: HTTPS remotes get credentials from `git credential fill`
//! - **Skips, not failures**: no `origin`, no URL, or a bare repository

pub mod api;
pub mod credentials;
pub mod error;
pub mod remote;

pub use credentials::{
    credentials_for_url, is_https_url, parse_helper_output, CredentialRequest, CredentialResolver,
    Credentials, GitCredentialHelper, NoCredentials,
};
pub use error::{CredentialError, FetchError, FetchResult};
pub use remote::{fetch_origin, FetchOptions, FetchOutcome, SkipReason, ORIGIN};
