//! CLI command definitions and dispatch.
//!
//! Each group of subcommands is implemented in its own submodule:
//! - `titles`: registering, removing, renaming and ordering titles
//! - `inspect`: running an inspection pass over a title's folder
//! - `show`: printing a stored entry
//! - `edit`: section names, episode order and episode overlays

mod edit;
mod inspect;
mod show;
mod titles;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::runtime::Runtime;

use crate::config::{self, Config};
use crate::library::Library;

pub use edit::{cmd_apply_episodes, cmd_reorder, cmd_section_name, cmd_set_episode};
pub use inspect::cmd_inspect;
pub use show::cmd_show;
pub use titles::{cmd_add, cmd_add_all, cmd_list, cmd_move, cmd_remove, cmd_rename, cmd_sort};

/// Anime Inspector CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding the title registry and entry files
    #[arg(long, global = true, env = "ANIME_INSPECTOR_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// ffprobe executable to use instead of the configured one
    #[arg(long, global = true, env = "FFPROBE_PATH")]
    pub ffprobe: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Register a title's folder
    Add {
        /// Folder holding the title's files
        path: PathBuf,
        /// Title of the anime (default: the folder's name)
        #[arg(long)]
        title: Option<String>,
        /// Inspect the folder right away
        #[arg(long)]
        inspect: bool,
        /// Inspect even very large folders
        #[arg(long, requires = "inspect")]
        force: bool,
    },
    /// Register every subfolder of a folder, each under its own name
    AddAll {
        /// Folder containing one subfolder per title
        dir: PathBuf,
    },
    /// List registered titles
    List {
        /// Also print each title's folder
        #[arg(short, long)]
        paths: bool,
    },
    /// Unregister a title
    Remove {
        title: String,
        /// Also delete the stored inspection result
        #[arg(long)]
        delete_data: bool,
    },
    /// Move a title to another position in the list (0-based)
    Move { from: usize, to: usize },
    /// Sort titles by name
    Sort,
    /// Rename a title
    Rename { old: String, new: String },
    /// Inspect a title's folder and store the result
    Inspect {
        title: String,
        /// Inspect even when the folder holds more files than the threshold
        #[arg(long)]
        force: bool,
        /// Rebuild from scratch, dropping episode titles and section names
        #[arg(long)]
        full: bool,
        /// Override the confirmation threshold for this run
        #[arg(long)]
        threshold: Option<usize>,
    },
    /// Print a title's stored inspection result
    Show {
        title: String,
        /// Print the stored JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Set or clear the display name of a video section
    SectionName {
        title: String,
        /// Directory of the section relative to the title's folder ("" = root)
        #[arg(long, default_value = "")]
        dir: String,
        /// New name; omit to clear
        name: Option<String>,
    },
    /// Reorder the episodes of a section
    Reorder {
        title: String,
        #[arg(long, default_value = "")]
        dir: String,
        /// New order as 0-based indices of the current episodes
        #[arg(required = true)]
        order: Vec<usize>,
    },
    /// Set one field of an episode
    SetEpisode {
        title: String,
        /// Full path of the episode's video file
        video: PathBuf,
        /// title, second-title, airdate or description
        field: String,
        value: String,
    },
    /// Apply episode data from a JSON file to a section, in episode order
    ApplyEpisodes {
        title: String,
        #[arg(long, default_value = "")]
        dir: String,
        /// JSON array of {title, secondTitle, airdate, description}
        file: PathBuf,
    },
    /// Show the configuration file location and effective settings
    Config {
        /// Write the effective settings to the configuration file
        #[arg(long)]
        init: bool,
    },
}

/// Run the specified CLI command.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let config = effective_config(cli);

    match &cli.command {
        Commands::Add {
            path,
            title,
            inspect,
            force,
        } => {
            let title = cmd_add(&config, title.as_deref(), path)?;
            if *inspect {
                let rt = Runtime::new()?;
                cmd_inspect(&rt, &config, &title, *force, false, None)?;
            }
        }
        Commands::AddAll { dir } => cmd_add_all(&config, dir)?,
        Commands::List { paths } => cmd_list(&config, *paths)?,
        Commands::Remove { title, delete_data } => cmd_remove(&config, title, *delete_data)?,
        Commands::Move { from, to } => cmd_move(&config, *from, *to)?,
        Commands::Sort => cmd_sort(&config)?,
        Commands::Rename { old, new } => cmd_rename(&config, old, new)?,
        Commands::Inspect {
            title,
            force,
            full,
            threshold,
        } => {
            let rt = Runtime::new()?;
            cmd_inspect(&rt, &config, title, *force, *full, *threshold)?;
        }
        Commands::Show { title, json } => cmd_show(&config, title, *json)?,
        Commands::SectionName { title, dir, name } => {
            cmd_section_name(&config, title, dir, name.clone())?
        }
        Commands::Reorder { title, dir, order } => cmd_reorder(&config, title, dir, order)?,
        Commands::SetEpisode {
            title,
            video,
            field,
            value,
        } => cmd_set_episode(&config, title, video, field, value)?,
        Commands::ApplyEpisodes { title, dir, file } => {
            cmd_apply_episodes(&config, title, dir, file)?
        }
        Commands::Config { init } => cmd_config(&config, *init)?,
    }
    Ok(())
}

// ============================================================================
// Shared helper functions
// ============================================================================

/// Config file settings with command-line overrides applied.
fn effective_config(cli: &Cli) -> Config {
    let mut config = config::load();
    if let Some(dir) = &cli.data_dir {
        config.library.data_dir = Some(dir.clone());
    }
    if let Some(ffprobe) = &cli.ffprobe {
        config.probe.ffprobe_path = ffprobe.clone();
    }
    config
}

/// Open the library in the configured data directory.
pub(crate) fn open_library(config: &Config) -> anyhow::Result<Library> {
    let data_dir = config
        .library
        .resolved_data_dir()
        .context("Could not determine a data directory; pass --data-dir")?;
    Library::open(&data_dir).with_context(|| format!("Opening library in {}", data_dir.display()))
}

fn cmd_config(config: &Config, init: bool) -> anyhow::Result<()> {
    match config::config_path() {
        Some(path) => println!("# {}", path.display()),
        None => println!("# (no config directory on this system)"),
    }
    if let Some(dir) = config.library.resolved_data_dir() {
        println!("# data dir: {}", dir.display());
    }
    print!("{}", toml::to_string_pretty(config)?);

    if init {
        config::save(config)?;
        println!("# saved");
    }
    Ok(())
}
