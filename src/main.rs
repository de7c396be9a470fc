//! Anime Inspector - An anime media library cataloguing tool.
//!
//! Walks a title's folder, probes every episode with ffprobe, pairs episodes
//! with their external subtitles and companion audio, splits cue sheets into
//! tracks and stores the resulting catalogue entry per title.

pub mod cli;
pub mod config;
pub mod cue;
pub mod error;
pub mod inspector;
pub mod library;
pub mod metadata;
pub mod model;
pub mod probe;
pub mod scanner;
#[cfg(test)]
pub mod test_utils;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Logs go to stderr so command output stays pipeable
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("anime_inspector=info".parse()?))
        .init();

    cli::run_command(&args)
}
