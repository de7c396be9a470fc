//! Audio tag reading.
//!
//! Uses the lofty crate for format-independent tag access. Only the common
//! fields the music catalog needs are read: title, artist, album, track
//! number and the stream duration from the audio properties.

use async_trait::async_trait;
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::Accessor;
use std::borrow::Cow;
use std::path::Path;

use crate::error::{Error, Result};

/// Common tags plus duration of one audio file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AudioTags {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub track_number: Option<u32>,
    pub duration_seconds: f64,
}

/// Reads common tags and duration from an audio file.
#[async_trait]
pub trait AudioTagReader: Send + Sync {
    async fn read_tags(&self, path: &Path) -> Result<AudioTags>;
}

/// [`AudioTagReader`] backed by lofty.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoftyTagReader;

#[async_trait]
impl AudioTagReader for LoftyTagReader {
    async fn read_tags(&self, path: &Path) -> Result<AudioTags> {
        let owned = path.to_path_buf();
        tokio::task::spawn_blocking(move || read(&owned))
            .await
            .map_err(|e| Error::tag_read(path, format!("tag reader task failed: {e}")))?
    }
}

/// Read tags synchronously.
pub fn read(path: &Path) -> Result<AudioTags> {
    let tagged_file = Probe::open(path)
        .map_err(|e| Error::tag_read(path, format!("failed to open file for probing: {e}")))?
        .read()
        .map_err(|e| Error::tag_read(path, format!("failed to read file metadata: {e}")))?;

    // Primary tag type of the container, else whatever tag is there
    let tag = tagged_file
        .primary_tag()
        .or_else(|| tagged_file.first_tag());

    let title = tag.and_then(|t| non_empty(t.title()));
    let artist = tag.and_then(|t| non_empty(t.artist()));
    let album = tag.and_then(|t| non_empty(t.album()));
    let track_number = tag.and_then(|t| t.track());

    let duration_seconds = tagged_file.properties().duration().as_secs_f64();

    Ok(AudioTags {
        title,
        artist,
        album,
        track_number,
        duration_seconds,
    })
}

fn non_empty(value: Option<Cow<'_, str>>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
