//! Command-line interface: arguments, configuration file and resolved settings

pub mod args;
pub mod config;

pub use args::Args;
pub use config::{FileConfig, Settings};

#[cfg(test)]
mod tests;
