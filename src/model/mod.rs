//! Core data models for an inspected anime title.
//!
//! A [`LibraryEntry`] is the projection of one title's folder: its video
//! sections (one per directory that holds videos, subtitles or companion
//! audio) and its music albums. The structure is rebuilt by the inspector
//! and can always be re-derived from the filesystem, except for the overlay
//! fields on [`VideoRecord`] which are only ever set through the edit
//! operations defined here.
//!
//! Stored as JSON with camelCase keys.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Album bucket for standalone audio files without an album tag.
pub const UNTAGGED_ALBUM: &str = "Untagged";

/// Display string describing one audio stream of an episode.
///
/// Denormalized for display only, e.g. `MKA:[Japanese] <Commentary> FLAC, 2ch, 48kHz`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AudioTrackDescriptor(String);

impl AudioTrackDescriptor {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AudioTrackDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One episode: a matched video file plus its technical metadata.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    /// File name of the video, unique within its section
    pub basename: String,
    /// Container duration
    pub duration_seconds: f64,
    /// Container size
    pub size_bytes: u64,
    /// `WxH` of the first video stream, empty when there is none
    pub resolution: String,
    /// Embedded streams first, then companion-file streams
    pub audio_tracks: Vec<AudioTrackDescriptor>,
    /// External subtitle suffixes (`.ass`, `.chs.ass`) then embedded tracks
    pub subtitle_tracks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub airdate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl VideoRecord {
    /// The user-supplied fields of this episode.
    pub fn overlay(&self) -> EpisodeOverlay {
        EpisodeOverlay {
            title: self.title.clone(),
            second_title: self.second_title.clone(),
            airdate: self.airdate.clone(),
            description: self.description.clone(),
        }
    }

    /// Replace all overlay fields.
    pub fn apply_overlay(&mut self, overlay: &EpisodeOverlay) {
        self.title = overlay.title.clone();
        self.second_title = overlay.second_title.clone();
        self.airdate = overlay.airdate.clone();
        self.description = overlay.description.clone();
    }

    pub fn has_overlay(&self) -> bool {
        self.title.is_some()
            || self.second_title.is_some()
            || self.airdate.is_some()
            || self.description.is_some()
    }

    /// Set a single overlay field.
    pub fn set_field(&mut self, field: EpisodeField, value: impl Into<String>) {
        let value = Some(value.into());
        match field {
            EpisodeField::Title => self.title = value,
            EpisodeField::SecondTitle => self.second_title = value,
            EpisodeField::Airdate => self.airdate = value,
            EpisodeField::Description => self.description = value,
        }
    }
}

/// Overlay values for one episode, as supplied by a user or metadata fetch.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeOverlay {
    pub title: Option<String>,
    pub second_title: Option<String>,
    pub airdate: Option<String>,
    pub description: Option<String>,
}

/// Editable overlay field of an episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeField {
    Title,
    SecondTitle,
    Airdate,
    Description,
}

impl FromStr for EpisodeField {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "title" => Ok(Self::Title),
            "secondtitle" | "second-title" | "second_title" => Ok(Self::SecondTitle),
            "airdate" => Ok(Self::Airdate),
            "description" | "desc" => Ok(Self::Description),
            other => Err(format!(
                "unknown episode field '{other}' (expected title, second-title, airdate or description)"
            )),
        }
    }
}

/// Episodes found in one directory of the title's folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSection {
    /// Directory relative to the library root; `""` for the root itself.
    directory_key: String,
    /// User override for the section heading
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub episodes: Vec<VideoRecord>,
}

impl VideoSection {
    pub fn new(directory_key: impl Into<String>, episodes: Vec<VideoRecord>) -> Self {
        Self {
            directory_key: directory_key.into(),
            display_name: None,
            episodes,
        }
    }

    pub fn directory_key(&self) -> &str {
        &self.directory_key
    }

    /// Heading to show: the override, else the directory key, else `fallback`.
    pub fn heading<'a>(&'a self, fallback: &'a str) -> &'a str {
        match (&self.display_name, self.directory_key.is_empty()) {
            (Some(name), _) => name.as_str(),
            (None, false) => self.directory_key.as_str(),
            (None, true) => fallback,
        }
    }

    pub fn episode(&self, basename: &str) -> Option<&VideoRecord> {
        self.episodes.iter().find(|e| e.basename == basename)
    }

    /// Reorder episodes so that position `i` holds the episode previously at `order[i]`.
    ///
    /// The order must be a permutation of `0..episodes.len()`.
    pub fn reorder(&mut self, order: &[usize]) -> Result<()> {
        let len = self.episodes.len();
        if order.len() != len {
            return Err(Error::InvalidOrder(format!(
                "expected {} indices, got {}",
                len,
                order.len()
            )));
        }
        let mut seen = HashSet::with_capacity(len);
        for &idx in order {
            if idx >= len {
                return Err(Error::InvalidOrder(format!("index {idx} out of range")));
            }
            if !seen.insert(idx) {
                return Err(Error::InvalidOrder(format!("index {idx} repeated")));
            }
        }

        let mut slots: Vec<Option<VideoRecord>> =
            std::mem::take(&mut self.episodes).into_iter().map(Some).collect();
        self.episodes = order.iter().filter_map(|&idx| slots[idx].take()).collect();
        Ok(())
    }
}

/// One playable track in a music album.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MusicTrack {
    pub title: String,
    pub artist: Option<String>,
    pub track_number: Option<u32>,
    /// Rounded to 0.01s
    pub duration_seconds: f64,
}

/// Ordered tracks sharing an album name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MusicAlbum {
    pub tracks: Vec<MusicTrack>,
}

impl MusicAlbum {
    pub fn total_duration(&self) -> f64 {
        self.tracks.iter().map(|t| t.duration_seconds).sum()
    }
}

/// Everything known about one anime title's folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryEntry {
    pub title: String,
    pub root_path: PathBuf,
    #[serde(default)]
    pub video_sections: Vec<VideoSection>,
    #[serde(default)]
    pub albums: BTreeMap<String, MusicAlbum>,
}

impl LibraryEntry {
    pub fn new(title: impl Into<String>, root_path: impl Into<PathBuf>) -> Self {
        Self {
            title: title.into(),
            root_path: root_path.into(),
            video_sections: Vec::new(),
            albums: BTreeMap::new(),
        }
    }

    pub fn section(&self, directory_key: &str) -> Option<&VideoSection> {
        self.video_sections
            .iter()
            .find(|s| s.directory_key == directory_key)
    }

    fn section_mut(&mut self, directory_key: &str) -> Result<&mut VideoSection> {
        self.video_sections
            .iter_mut()
            .find(|s| s.directory_key == directory_key)
            .ok_or_else(|| Error::SectionNotFound(directory_key.to_string()))
    }

    pub fn episode_count(&self) -> usize {
        self.video_sections.iter().map(|s| s.episodes.len()).sum()
    }

    pub fn track_count(&self) -> usize {
        self.albums.values().map(|a| a.tracks.len()).sum()
    }

    /// Set or clear the heading override of a section.
    pub fn set_section_name(&mut self, directory_key: &str, name: Option<String>) -> Result<()> {
        let section = self.section_mut(directory_key)?;
        section.display_name = name.filter(|n| !n.trim().is_empty());
        Ok(())
    }

    pub fn reorder_episodes(&mut self, directory_key: &str, order: &[usize]) -> Result<()> {
        self.section_mut(directory_key)?.reorder(order)
    }

    /// Apply overlays to a section's episodes in order.
    ///
    /// Pairs up `min(episodes, data)` items; returns how many were applied.
    pub fn apply_episode_data(
        &mut self,
        directory_key: &str,
        data: &[EpisodeOverlay],
    ) -> Result<usize> {
        let section = self.section_mut(directory_key)?;
        let applied = section.episodes.len().min(data.len());
        for (episode, overlay) in section.episodes.iter_mut().zip(data) {
            episode.apply_overlay(overlay);
        }
        Ok(applied)
    }

    /// Update one overlay field of the episode stored at `video_path`.
    pub fn update_episode_field(
        &mut self,
        video_path: &Path,
        field: EpisodeField,
        value: impl Into<String>,
    ) -> Result<()> {
        let root = self.root_path.clone();
        for section in &mut self.video_sections {
            let mut dir = root.clone();
            if !section.directory_key.is_empty() {
                dir.push(&section.directory_key);
            }
            if let Some(episode) = section
                .episodes
                .iter_mut()
                .find(|e| dir.join(&e.basename) == video_path)
            {
                episode.set_field(field, value);
                return Ok(());
            }
        }
        Err(Error::EpisodeNotFound(video_path.display().to_string()))
    }

    /// Carry overlays and section names over from an earlier inspection.
    ///
    /// Episodes are matched by (directory key, basename); sections by key.
    /// Returns the number of episodes that received an overlay.
    pub fn carry_overlays_from(&mut self, previous: &LibraryEntry) -> usize {
        let mut by_key: HashMap<&str, &VideoSection> = HashMap::new();
        for section in &previous.video_sections {
            by_key.insert(section.directory_key.as_str(), section);
        }

        let mut carried = 0;
        for section in &mut self.video_sections {
            let Some(old) = by_key.get(section.directory_key.as_str()) else {
                continue;
            };
            if section.display_name.is_none() {
                section.display_name = old.display_name.clone();
            }
            for episode in &mut section.episodes {
                if let Some(old_episode) = old.episode(&episode.basename)
                    && old_episode.has_overlay()
                {
                    episode.apply_overlay(&old_episode.overlay());
                    carried += 1;
                }
            }
        }
        carried
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn episode(name: &str) -> VideoRecord {
        VideoRecord {
            basename: name.to_string(),
            duration_seconds: 1420.0,
            size_bytes: 350_000_000,
            resolution: "1920x1080".to_string(),
            ..Default::default()
        }
    }

    fn entry() -> LibraryEntry {
        let mut entry = LibraryEntry::new("Mushishi", "/anime/Mushishi");
        entry.video_sections.push(VideoSection::new(
            "",
            vec![episode("ep01.mkv"), episode("ep02.mkv"), episode("ep03.mkv")],
        ));
        entry
            .video_sections
            .push(VideoSection::new("SPs", vec![episode("sp01.mkv")]));
        entry
    }

    #[test]
    fn test_reorder_applies_permutation() {
        let mut entry = entry();
        entry.reorder_episodes("", &[2, 0, 1]).unwrap();
        let names: Vec<_> = entry.video_sections[0]
            .episodes
            .iter()
            .map(|e| e.basename.as_str())
            .collect();
        assert_eq!(names, vec!["ep03.mkv", "ep01.mkv", "ep02.mkv"]);
    }

    #[test]
    fn test_reorder_rejects_non_permutation() {
        let mut entry = entry();
        assert!(matches!(
            entry.reorder_episodes("", &[0, 0, 1]),
            Err(Error::InvalidOrder(_))
        ));
        assert!(matches!(
            entry.reorder_episodes("", &[0, 1]),
            Err(Error::InvalidOrder(_))
        ));
        assert!(matches!(
            entry.reorder_episodes("", &[0, 1, 5]),
            Err(Error::InvalidOrder(_))
        ));
        // Untouched after a rejected reorder
        assert_eq!(entry.video_sections[0].episodes[0].basename, "ep01.mkv");
    }

    #[test]
    fn test_reorder_unknown_section() {
        let mut entry = entry();
        assert!(matches!(
            entry.reorder_episodes("Extras", &[]),
            Err(Error::SectionNotFound(_))
        ));
    }

    #[test]
    fn test_section_name_and_heading() {
        let mut entry = entry();
        entry
            .set_section_name("SPs", Some("Specials".to_string()))
            .unwrap();
        assert_eq!(entry.section("SPs").unwrap().heading("Main"), "Specials");
        assert_eq!(entry.section("").unwrap().heading("Main"), "Main");

        entry.set_section_name("SPs", Some("  ".to_string())).unwrap();
        assert_eq!(entry.section("SPs").unwrap().heading("Main"), "SPs");
    }

    #[test]
    fn test_apply_episode_data_pairs_minimum() {
        let mut entry = entry();
        let data = vec![
            EpisodeOverlay {
                title: Some("The Green Seat".to_string()),
                ..Default::default()
            },
            EpisodeOverlay {
                title: Some("The Light of the Eyelid".to_string()),
                airdate: Some("2005-10-29".to_string()),
                ..Default::default()
            },
        ];
        let applied = entry.apply_episode_data("", &data).unwrap();
        assert_eq!(applied, 2);
        let episodes = &entry.video_sections[0].episodes;
        assert_eq!(episodes[0].title.as_deref(), Some("The Green Seat"));
        assert_eq!(episodes[1].airdate.as_deref(), Some("2005-10-29"));
        assert!(!episodes[2].has_overlay());
    }

    #[test]
    fn test_update_episode_field_by_full_path() {
        let mut entry = entry();
        entry
            .update_episode_field(
                Path::new("/anime/Mushishi/SPs/sp01.mkv"),
                EpisodeField::SecondTitle,
                "Special",
            )
            .unwrap();
        assert_eq!(
            entry.section("SPs").unwrap().episodes[0]
                .second_title
                .as_deref(),
            Some("Special")
        );

        entry
            .update_episode_field(
                Path::new("/anime/Mushishi/ep02.mkv"),
                EpisodeField::Description,
                "Ginko travels.",
            )
            .unwrap();
        assert_eq!(
            entry.section("").unwrap().episodes[1].description.as_deref(),
            Some("Ginko travels.")
        );

        assert!(matches!(
            entry.update_episode_field(
                Path::new("/anime/Mushishi/ep09.mkv"),
                EpisodeField::Title,
                "x"
            ),
            Err(Error::EpisodeNotFound(_))
        ));
    }

    #[test]
    fn test_carry_overlays_matches_by_basename() {
        let mut old = entry();
        old.video_sections[0].episodes[1].title = Some("Kept".to_string());
        old.set_section_name("SPs", Some("Specials".to_string()))
            .unwrap();

        let mut fresh = entry();
        // A reinspection found the episodes in a different order
        fresh.video_sections[0].episodes.reverse();
        let carried = fresh.carry_overlays_from(&old);

        assert_eq!(carried, 1);
        assert_eq!(
            fresh.section("").unwrap().episode("ep02.mkv").unwrap().title.as_deref(),
            Some("Kept")
        );
        assert_eq!(
            fresh.section("SPs").unwrap().display_name.as_deref(),
            Some("Specials")
        );
    }

    #[test]
    fn test_episode_field_from_str() {
        assert_eq!("title".parse::<EpisodeField>(), Ok(EpisodeField::Title));
        assert_eq!(
            "second-title".parse::<EpisodeField>(),
            Ok(EpisodeField::SecondTitle)
        );
        assert_eq!("secondTitle".parse::<EpisodeField>(), Ok(EpisodeField::SecondTitle));
        assert_eq!("desc".parse::<EpisodeField>(), Ok(EpisodeField::Description));
        assert!("rating".parse::<EpisodeField>().is_err());
    }

    #[test]
    fn test_json_shape() {
        let mut entry = entry();
        entry.albums.insert(
            "OST".to_string(),
            MusicAlbum {
                tracks: vec![MusicTrack {
                    title: "Sleeping Bed".to_string(),
                    artist: Some("Ally Kerr".to_string()),
                    track_number: Some(1),
                    duration_seconds: 241.33,
                }],
            },
        );
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["rootPath"], "/anime/Mushishi");
        assert_eq!(json["videoSections"][0]["directoryKey"], "");
        assert_eq!(json["videoSections"][0]["episodes"][0]["sizeBytes"], 350_000_000u64);
        assert!(json["videoSections"][0]["episodes"][0].get("title").is_none());
        assert_eq!(json["albums"]["OST"][0]["durationSeconds"], 241.33);

        let back: LibraryEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }
}
