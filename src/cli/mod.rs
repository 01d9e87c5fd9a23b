//! Command-line interface for music-inventory.
//!
//! This module provides the `scan` command that runs the inventory pipeline
//! and the `config` command for inspecting and seeding the config file.

mod commands;

pub use commands::{Cli, Commands, run_command};
