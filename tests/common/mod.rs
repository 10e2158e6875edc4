//! Common test utilities shared by the integration tests

pub mod git_fixtures;
