//! CLI module for the sigstamp binary
//!
//! This module is only available when the "cli" feature is enabled.

mod config;
#[path = "main.rs"]
mod main_impl;

pub use main_impl::{main, run_interactive, Cli, CliLogFormat};
