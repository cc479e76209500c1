//! fetchkit command-line front end.
//!
//! Library half of the `fetchkit` binary, split out so the argument handling
//! can be tested without spawning a process.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use error::CliError;
