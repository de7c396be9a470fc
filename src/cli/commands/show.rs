//! Printing a stored entry.

use super::open_library;
use crate::config::Config;
use crate::model::{LibraryEntry, VideoRecord};

/// Heading of the section at the title's root when it has no name.
const ROOT_SECTION_HEADING: &str = "Main";

/// Print a title's stored inspection result
pub fn cmd_show(config: &Config, title: &str, json: bool) -> anyhow::Result<()> {
    let library = open_library(config)?;
    let entry = library.store.load(title)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        print!("{}", render_entry(&entry));
    }
    Ok(())
}

/// Human-readable summary of an entry.
pub fn render_entry(entry: &LibraryEntry) -> String {
    let mut out = format!("{}\n{}\n", entry.title, entry.root_path.display());

    for section in &entry.video_sections {
        out.push_str(&format!(
            "\n== {} ({} episodes) ==\n",
            section.heading(ROOT_SECTION_HEADING),
            section.episodes.len()
        ));
        for (idx, episode) in section.episodes.iter().enumerate() {
            out.push_str(&render_episode(idx, episode));
        }
    }

    for (name, album) in &entry.albums {
        out.push_str(&format!(
            "\n## {name} ({} tracks, {})\n",
            album.tracks.len(),
            format_duration(album.total_duration())
        ));
        for track in &album.tracks {
            let number = track
                .track_number
                .map(|n| format!("{n:02}"))
                .unwrap_or_else(|| "--".to_string());
            let artist = track
                .artist
                .as_deref()
                .map(|a| format!(" / {a}"))
                .unwrap_or_default();
            out.push_str(&format!(
                "  {number}  {}{artist}  [{}]\n",
                track.title,
                format_duration(track.duration_seconds)
            ));
        }
    }
    out
}

fn render_episode(idx: usize, episode: &VideoRecord) -> String {
    let mut out = format!(
        "{idx:>3}  {}  [{} | {} | {}]\n",
        episode.basename,
        format_duration(episode.duration_seconds),
        format_bytes(episode.size_bytes),
        if episode.resolution.is_empty() {
            "?"
        } else {
            episode.resolution.as_str()
        }
    );
    if let Some(title) = &episode.title {
        match &episode.second_title {
            Some(second) => out.push_str(&format!("     {title} / {second}\n")),
            None => out.push_str(&format!("     {title}\n")),
        }
    }
    if let Some(airdate) = &episode.airdate {
        out.push_str(&format!("     aired {airdate}\n"));
    }
    for audio in &episode.audio_tracks {
        out.push_str(&format!("     audio: {audio}\n"));
    }
    if !episode.subtitle_tracks.is_empty() {
        out.push_str(&format!("     subs:  {}\n", episode.subtitle_tracks.join(", ")));
    }
    out
}

/// `m:ss`, or `h:mm:ss` from one hour up.
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    let (hours, minutes, secs) = (total / 3600, total / 60 % 60, total % 60);
    if hours == 0 {
        format!("{minutes}:{secs:02}")
    } else {
        format!("{hours}:{minutes:02}:{secs:02}")
    }
}

/// Size in 1024-based units with at most two decimals, e.g. `1.5 GB`.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["Bytes", "KB", "MB", "GB", "TB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let text = format!("{value:.2}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{text} {}", UNITS[unit])
}
