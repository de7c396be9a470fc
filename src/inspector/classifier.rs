//! File classification by extension.
//!
//! Video, subtitle and companion-audio files are grouped per directory
//! (relative to the library root). Cue sheets and standalone audio are kept
//! in flat lists because an album may span directories.

use std::path::{Path, PathBuf};

/// What a file is to the inspector, decided by its extension alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Video,
    Subtitle,
    CompanionAudio,
    CueSheet,
    StandaloneAudio,
}

const VIDEO_EXTENSIONS: &[&str] = &["mkv", "mp4", "flv", "avi"];
const SUBTITLE_EXTENSIONS: &[&str] = &["ass", "ssa", "srt", "smi", "sub"];
const COMPANION_AUDIO_EXTENSIONS: &[&str] = &["mka"];
const CUE_EXTENSIONS: &[&str] = &["cue"];
const STANDALONE_AUDIO_EXTENSIONS: &[&str] = &["flac", "ogg", "wav"];

impl FileKind {
    /// Classify a path, or `None` when the inspector ignores it.
    pub fn of(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        let ext = ext.as_str();
        if VIDEO_EXTENSIONS.contains(&ext) {
            Some(Self::Video)
        } else if SUBTITLE_EXTENSIONS.contains(&ext) {
            Some(Self::Subtitle)
        } else if COMPANION_AUDIO_EXTENSIONS.contains(&ext) {
            Some(Self::CompanionAudio)
        } else if CUE_EXTENSIONS.contains(&ext) {
            Some(Self::CueSheet)
        } else if STANDALONE_AUDIO_EXTENSIONS.contains(&ext) {
            Some(Self::StandaloneAudio)
        } else {
            None
        }
    }
}

/// Video-side files of one directory, in listing order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DirectoryBucket {
    /// Directory relative to the root, `/`-separated; `""` for the root
    pub key: String,
    pub videos: Vec<PathBuf>,
    pub companion_audio: Vec<PathBuf>,
    pub subtitles: Vec<PathBuf>,
}

/// Result of classifying one listing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Classification {
    /// In order of the first file seen in each directory
    pub directories: Vec<DirectoryBucket>,
    pub cue_sheets: Vec<PathBuf>,
    pub standalone_audio: Vec<PathBuf>,
}

impl Classification {
    /// Number of files that were assigned a bucket.
    pub fn classified_count(&self) -> usize {
        self.cue_sheets.len()
            + self.standalone_audio.len()
            + self
                .directories
                .iter()
                .map(|d| d.videos.len() + d.companion_audio.len() + d.subtitles.len())
                .sum::<usize>()
    }

    pub fn video_count(&self) -> usize {
        self.directories.iter().map(|d| d.videos.len()).sum()
    }

    fn bucket_mut(&mut self, key: String) -> &mut DirectoryBucket {
        let position = match self.directories.iter().position(|d| d.key == key) {
            Some(position) => position,
            None => {
                self.directories.push(DirectoryBucket {
                    key,
                    ..Default::default()
                });
                self.directories.len() - 1
            }
        };
        &mut self.directories[position]
    }
}

/// Directory key of `path` relative to `root`.
///
/// Components are joined with `/` so keys are stable across platforms.
/// Paths outside the root keep their full parent as key.
pub fn directory_key(root: &Path, path: &Path) -> String {
    let parent = path.parent().unwrap_or(Path::new(""));
    let relative = parent.strip_prefix(root).unwrap_or(parent);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Partition a flat listing into typed buckets.
pub fn classify(root: &Path, files: &[PathBuf]) -> Classification {
    let mut classification = Classification::default();

    for path in files {
        let Some(kind) = FileKind::of(path) else {
            continue;
        };
        match kind {
            FileKind::CueSheet => classification.cue_sheets.push(path.clone()),
            FileKind::StandaloneAudio => classification.standalone_audio.push(path.clone()),
            FileKind::Video | FileKind::Subtitle | FileKind::CompanionAudio => {
                let bucket = classification.bucket_mut(directory_key(root, path));
                let list = match kind {
                    FileKind::Video => &mut bucket.videos,
                    FileKind::Subtitle => &mut bucket.subtitles,
                    _ => &mut bucket.companion_audio,
                };
                list.push(path.clone());
            }
        }
    }

    classification
}
