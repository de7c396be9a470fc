//! Filename heuristics pairing a video with its sidecar files.
//!
//! There is no declared link between an episode and its subtitles or
//! companion audio, only naming conventions. [`MatchStrategy`] keeps the
//! heuristic swappable; [`StemMatcher`] is the convention used by release
//! groups:
//!
//! - companion audio: `ep01.mkv` pairs with `ep01.mka` in the same directory
//! - subtitles, tier A: `ep01.ass` (label `.ass`)
//! - subtitles, tier B: `ep01.chs.ass` (label `.chs.ass`)
//!
//! Ambiguous stems are not resolved: a subtitle may be reported for more
//! than one video when their names allow it.

use std::path::{Path, PathBuf};

/// An external subtitle file matched to a video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleMatch {
    pub path: PathBuf,
    /// Suffix shown for the track, e.g. `.ass` or `.chs.ass`
    pub label: String,
}

/// Pairs a video with candidate sidecar files from its directory.
pub trait MatchStrategy: Send + Sync {
    /// The companion audio file of `video`, if any candidate qualifies.
    fn companion<'a>(&self, video: &Path, candidates: &'a [PathBuf]) -> Option<&'a PathBuf>;

    /// Every candidate subtitle belonging to `video`, in candidate order.
    fn subtitles(&self, video: &Path, candidates: &[PathBuf]) -> Vec<SubtitleMatch>;
}

/// Matching by shared file stem.
#[derive(Debug, Clone, Copy, Default)]
pub struct StemMatcher;

impl StemMatcher {
    /// Tier A, then tier B.
    fn subtitle_label(video: &Path, subtitle: &Path) -> Option<String> {
        if subtitle.parent() != video.parent() {
            return None;
        }
        let video_name = video.file_name()?.to_str()?;
        let video_ext = video_name.rfind('.').map_or("", |i| &video_name[i..]);
        let subtitle_name = subtitle.file_name()?.to_str()?;

        let last_dot = subtitle_name.rfind('.')?;
        let stem = &subtitle_name[..last_dot];
        if format!("{stem}{video_ext}") == video_name {
            return Some(subtitle_name[last_dot..].to_string());
        }

        let second_dot = stem.rfind('.')?;
        let stem = &subtitle_name[..second_dot];
        if format!("{stem}{video_ext}") == video_name {
            return Some(subtitle_name[second_dot..].to_string());
        }
        None
    }
}

impl MatchStrategy for StemMatcher {
    fn companion<'a>(&self, video: &Path, candidates: &'a [PathBuf]) -> Option<&'a PathBuf> {
        let expected = video.with_extension("mka");
        candidates.iter().find(|c| {
            c.parent() == expected.parent()
                && c.file_name()
                    .zip(expected.file_name())
                    .is_some_and(|(a, b)| a.eq_ignore_ascii_case(b))
        })
    }

    fn subtitles(&self, video: &Path, candidates: &[PathBuf]) -> Vec<SubtitleMatch> {
        candidates
            .iter()
            .filter_map(|subtitle| {
                Self::subtitle_label(video, subtitle).map(|label| SubtitleMatch {
                    path: subtitle.clone(),
                    label,
                })
            })
            .collect()
    }
}
