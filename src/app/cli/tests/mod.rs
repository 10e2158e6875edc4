//! Tests for the CLI module

pub mod config_tests;
