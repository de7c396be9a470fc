//! Editing a stored entry: section names, episode order, episode data.

use anyhow::Context;
use std::path::Path;

use super::open_library;
use crate::config::Config;
use crate::library::Library;
use crate::model::{EpisodeField, EpisodeOverlay, LibraryEntry};

/// Load `title`, apply `edit`, save it back.
fn edit_entry<T>(
    config: &Config,
    title: &str,
    edit: impl FnOnce(&mut LibraryEntry) -> crate::error::Result<T>,
) -> anyhow::Result<T> {
    let library: Library = open_library(config)?;
    let mut entry = library
        .store
        .load(title)
        .with_context(|| format!("{title:?} has no stored result; run `anime-inspector inspect` first"))?;
    let result = edit(&mut entry)?;
    library.store.save(&entry)?;
    Ok(result)
}

/// Set or clear the display name of a video section
pub fn cmd_section_name(
    config: &Config,
    title: &str,
    dir: &str,
    name: Option<String>,
) -> anyhow::Result<()> {
    let cleared = name.is_none();
    edit_entry(config, title, |entry| entry.set_section_name(dir, name))?;
    if cleared {
        println!("Cleared the name of section {dir:?}");
    } else {
        println!("Renamed section {dir:?}");
    }
    Ok(())
}

/// Reorder the episodes of a section
pub fn cmd_reorder(config: &Config, title: &str, dir: &str, order: &[usize]) -> anyhow::Result<()> {
    let names = edit_entry(config, title, |entry| {
        entry.reorder_episodes(dir, order)?;
        Ok(entry
            .section(dir)
            .map(|s| s.episodes.iter().map(|e| e.basename.clone()).collect::<Vec<_>>())
            .unwrap_or_default())
    })?;
    for (idx, name) in names.iter().enumerate() {
        println!("{idx:>3}  {name}");
    }
    Ok(())
}

/// Set one field of an episode
pub fn cmd_set_episode(
    config: &Config,
    title: &str,
    video: &Path,
    field: &str,
    value: &str,
) -> anyhow::Result<()> {
    let field: EpisodeField = field.parse().map_err(anyhow::Error::msg)?;
    // Stored roots are canonical
    let video = video.canonicalize().unwrap_or_else(|_| video.to_path_buf());
    edit_entry(config, title, |entry| {
        entry.update_episode_field(&video, field, value)
    })?;
    println!("Updated {}", video.display());
    Ok(())
}

/// Apply episode data from a JSON file to a section
pub fn cmd_apply_episodes(config: &Config, title: &str, dir: &str, file: &Path) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Cannot read {}", file.display()))?;
    let data: Vec<EpisodeOverlay> = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a JSON array of episode data", file.display()))?;

    let applied = edit_entry(config, title, |entry| entry.apply_episode_data(dir, &data))?;
    println!("Applied data to {applied} of {} episode(s)", data.len());
    Ok(())
}
