//! Music Inventory - catalogue a media collection before deduplication.
//!
//! Walks several source trees in parallel and writes one CSV row per media
//! file with its full-file hash, an audio-only checksum that ignores tag
//! bytes, and the descriptive tags.

pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod hash;
pub mod metadata;
pub mod model;
pub mod pipeline;
pub mod scanner;
pub mod sink;
#[cfg(test)]
pub mod test_utils;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::from_default_env().add_directive("music_inventory=info".parse()?))
        .init();

    cli::run_command(&args)
}
