//! Command-line front end: inspect and manage stored drafts, show the
//! configuration, and run a complete submission against in-memory services.

mod commands;
mod demo;
pub mod output;

pub use commands::{run, CliError};
