//! Command-line interface for anime-inspector.
//!
//! This module provides CLI commands for registering titles, inspecting
//! their folders, and viewing or editing the stored results.

mod commands;

pub use commands::{Cli, Commands, run_command};
