//! Track durations from cue index marks.
//!
//! Each track lasts from its `INDEX 01` to the start of the next track,
//! where the next track starts at its `INDEX 00` (pre-gap) when present and
//! at its `INDEX 01` otherwise. The last track runs to the end of the file.

use super::{CueTime, CueTrack};
use crate::model::MusicTrack;

/// CD audio frames per second.
pub const FRAMES_PER_SECOND: f64 = 75.0;

/// Seconds from the start of the file.
pub fn timestamp_seconds(time: CueTime) -> f64 {
    f64::from(time.minutes) * 60.0 + f64::from(time.seconds) + f64::from(time.frames) / FRAMES_PER_SECOND
}

/// Round to two decimal places.
pub fn round_centis(seconds: f64) -> f64 {
    (seconds * 100.0).round() / 100.0
}

/// A cue track reduced to what segmentation needs.
#[derive(Debug, Clone, PartialEq)]
pub struct CueTrackEntry {
    pub track_number: u32,
    pub title: String,
    pub artist: Option<String>,
    pub index_zero_seconds: Option<f64>,
    pub index_one_seconds: f64,
}

impl CueTrackEntry {
    /// `None` when the track has no `INDEX 01`.
    ///
    /// The sheet-level performer stands in for a missing track performer.
    pub fn from_track(track: &CueTrack, sheet_performer: Option<&str>) -> Option<Self> {
        let index_one_seconds = timestamp_seconds(track.index(1)?);
        Some(Self {
            track_number: track.number,
            title: track
                .title
                .clone()
                .unwrap_or_else(|| format!("Track {:02}", track.number)),
            artist: track
                .performer
                .clone()
                .or_else(|| sheet_performer.map(str::to_string)),
            index_zero_seconds: track.index(0).map(timestamp_seconds),
            index_one_seconds,
        })
    }

    /// Where this track begins when measured from the previous one.
    fn boundary(&self) -> f64 {
        self.index_zero_seconds.unwrap_or(self.index_one_seconds)
    }
}

/// Compute per-track durations against the file's total duration.
///
/// Tracks are ordered by track number (stable for duplicates) and every
/// duration is rounded to 0.01s.
pub fn segment_tracks(mut entries: Vec<CueTrackEntry>, total_seconds: f64) -> Vec<MusicTrack> {
    entries.sort_by_key(|e| e.track_number);

    let ends: Vec<f64> = entries
        .iter()
        .skip(1)
        .map(CueTrackEntry::boundary)
        .chain(std::iter::once(total_seconds))
        .collect();

    entries
        .into_iter()
        .zip(ends)
        .map(|(entry, end)| MusicTrack {
            duration_seconds: round_centis(end - entry.index_one_seconds),
            title: entry.title,
            artist: entry.artist,
            track_number: Some(entry.track_number),
        })
        .collect()
}
