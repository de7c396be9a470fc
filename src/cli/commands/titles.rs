//! Title registry commands.

use anyhow::Context;
use std::path::Path;

use super::open_library;
use crate::config::Config;
use crate::library::{default_title, subfolders};

/// Register a title's folder; returns the title used
pub fn cmd_add(config: &Config, title: Option<&str>, path: &Path) -> anyhow::Result<String> {
    let root = path
        .canonicalize()
        .with_context(|| format!("Cannot open folder {}", path.display()))?;
    anyhow::ensure!(root.is_dir(), "{} is not a folder", root.display());

    let title = match title {
        Some(title) => title.to_string(),
        None => default_title(&root)
            .with_context(|| format!("{} has no folder name; pass --title", root.display()))?,
    };

    let mut library = open_library(config)?;
    library.index.add(&title, &root)?;
    library.index.save()?;
    println!("Added {:?} -> {}", title, root.display());
    Ok(title)
}

/// Register every subfolder of `dir`
pub fn cmd_add_all(config: &Config, dir: &Path) -> anyhow::Result<()> {
    let dir = dir
        .canonicalize()
        .with_context(|| format!("Cannot open folder {}", dir.display()))?;
    let folders = subfolders(&dir)?;

    let mut library = open_library(config)?;
    let summary = library.index.add_all(&folders);
    if !summary.added.is_empty() {
        library.index.save()?;
    }

    for title in &summary.added {
        println!("Added {title:?}");
    }
    println!(
        "{} added, {} skipped (already registered or not a usable title)",
        summary.added.len(),
        summary.skipped.len()
    );
    Ok(())
}

/// List registered titles
pub fn cmd_list(config: &Config, show_paths: bool) -> anyhow::Result<()> {
    let library = open_library(config)?;
    let records = library.index.records();
    if records.is_empty() {
        println!("No titles registered. Add one with: anime-inspector add <path>");
        return Ok(());
    }
    for (idx, record) in records.iter().enumerate() {
        let marker = if library.store.exists(&record.title) {
            ' '
        } else {
            '*'
        };
        if show_paths {
            println!("{idx:>3}{marker} {}  {}", record.title, record.path.display());
        } else {
            println!("{idx:>3}{marker} {}", record.title);
        }
    }
    if records.iter().any(|r| !library.store.exists(&r.title)) {
        println!("\n* not inspected yet");
    }
    Ok(())
}

/// Unregister a title
pub fn cmd_remove(config: &Config, title: &str, delete_data: bool) -> anyhow::Result<()> {
    let mut library = open_library(config)?;
    library.remove(title, delete_data)?;
    if delete_data {
        println!("Removed {title:?} and its stored data");
    } else {
        println!("Removed {title:?}");
    }
    Ok(())
}

/// Move a title within the list
pub fn cmd_move(config: &Config, from: usize, to: usize) -> anyhow::Result<()> {
    let mut library = open_library(config)?;
    library.index.move_entry(from, to)?;
    library.index.save()?;
    print_titles(&library.index.titles());
    Ok(())
}

/// Sort titles by name
pub fn cmd_sort(config: &Config) -> anyhow::Result<()> {
    let mut library = open_library(config)?;
    library.index.sort_by_title();
    library.index.save()?;
    print_titles(&library.index.titles());
    Ok(())
}

/// Rename a title
pub fn cmd_rename(config: &Config, old: &str, new: &str) -> anyhow::Result<()> {
    let mut library = open_library(config)?;
    library.rename(old, new)?;
    println!("Renamed {old:?} to {new:?}");
    Ok(())
}

fn print_titles(titles: &[&str]) {
    for (idx, title) in titles.iter().enumerate() {
        println!("{idx:>3}  {title}");
    }
}
