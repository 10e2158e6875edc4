//! Test modules for the scanner

mod detect;
mod helpers;
mod walker;
