//! Test utilities and fixtures for anime-inspector tests.
//!
//! This module provides canned implementations of the collaborator traits
//! (walker, prober, tag reader, cue reader) and factories for the records
//! they return, so inspection passes can be tested without media files.
//!
//! # Example
//!
//! ```ignore
//! use anime_inspector::test_utils::{MockProber, MockWalker};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let prober = MockProber::new().with_failure("/anime/ep02.mkv");
//!     // ... test logic
//! }
//! ```

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use crate::cue::CueSheet;
use crate::cue::CueReader;
use crate::error::{Error, Result};
use crate::metadata::{AudioTagReader, AudioTags};
use crate::probe::{MediaProber, ProbeReport, StreamInfo, StreamKind};
use crate::scanner::DirectoryWalker;

/// Creates an audio stream description.
pub fn audio_stream(codec: &str, channels: u32, sample_rate_hz: u32) -> StreamInfo {
    StreamInfo {
        codec_name: Some(codec.to_string()),
        channels: Some(channels),
        sample_rate_hz: Some(sample_rate_hz),
        ..StreamInfo::new(StreamKind::Audio)
    }
}

/// Creates a subtitle stream description.
pub fn subtitle_stream(language: Option<&str>, title: Option<&str>) -> StreamInfo {
    StreamInfo {
        codec_name: Some("ass".to_string()),
        language_tag: language.map(str::to_string),
        title_tag: title.map(str::to_string),
        ..StreamInfo::new(StreamKind::Subtitle)
    }
}

/// Creates a probe report with one video stream and one FLAC stereo stream.
pub fn video_report(duration_seconds: f64, size_bytes: u64, width: u32, height: u32) -> ProbeReport {
    ProbeReport {
        duration_seconds,
        size_bytes,
        streams: vec![
            StreamInfo {
                codec_name: Some("hevc".to_string()),
                width: Some(width),
                height: Some(height),
                ..StreamInfo::new(StreamKind::Video)
            },
            audio_stream("flac", 2, 48_000),
        ],
    }
}

/// Creates a probe report for a companion audio file.
pub fn companion_report() -> ProbeReport {
    let mut commentary = audio_stream("aac", 2, 48_000);
    commentary.language_tag = Some("jpn".to_string());
    commentary.title_tag = Some("Commentary".to_string());
    ProbeReport {
        duration_seconds: 1420.0,
        size_bytes: 30_000_000,
        streams: vec![commentary],
    }
}

/// Creates tags with the given album, title and duration.
pub fn tags(album: Option<&str>, title: Option<&str>, duration_seconds: f64) -> AudioTags {
    AudioTags {
        title: title.map(str::to_string),
        album: album.map(str::to_string),
        duration_seconds,
        ..Default::default()
    }
}

/// Walker returning a fixed listing.
pub struct MockWalker {
    files: Vec<PathBuf>,
    fail: bool,
}

impl MockWalker {
    pub fn new(files: Vec<PathBuf>) -> Self {
        Self { files, fail: false }
    }

    /// A walker that cannot list any root.
    pub fn failing() -> Self {
        Self {
            files: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl DirectoryWalker for MockWalker {
    async fn list_all(&self, root: &Path) -> Result<Vec<PathBuf>> {
        if self.fail {
            return Err(Error::scan(root, "permission denied"));
        }
        Ok(self.files.clone())
    }
}

/// Prober with per-path reports, failures and delays.
///
/// Paths without a configured report get [`video_report`] (or
/// [`companion_report`] for `.mka` files).
#[derive(Default)]
pub struct MockProber {
    reports: HashMap<PathBuf, ProbeReport>,
    failures: HashSet<PathBuf>,
    delays: HashMap<PathBuf, Duration>,
    completed: Mutex<Vec<PathBuf>>,
}

impl MockProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_report(mut self, path: impl Into<PathBuf>, report: ProbeReport) -> Self {
        self.reports.insert(path.into(), report);
        self
    }

    pub fn with_failure(mut self, path: impl Into<PathBuf>) -> Self {
        self.failures.insert(path.into());
        self
    }

    /// Hold the probe of `path` back for `delay`.
    pub fn with_delay(mut self, path: impl Into<PathBuf>, delay: Duration) -> Self {
        self.delays.insert(path.into(), delay);
        self
    }

    /// Paths in the order their probes finished.
    pub fn completion_order(&self) -> Vec<PathBuf> {
        self.completed.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.completed.lock().unwrap().len()
    }
}

#[async_trait]
impl MediaProber for MockProber {
    async fn probe(&self, path: &Path) -> Result<ProbeReport> {
        if let Some(delay) = self.delays.get(path) {
            tokio::time::sleep(*delay).await;
        }
        self.completed.lock().unwrap().push(path.to_path_buf());

        if self.failures.contains(path) {
            return Err(Error::probe(path, "Invalid data found when processing input"));
        }
        if let Some(report) = self.reports.get(path) {
            return Ok(report.clone());
        }
        let is_companion = path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("mka"));
        Ok(if is_companion {
            companion_report()
        } else {
            video_report(1420.0, 350_000_000, 1920, 1080)
        })
    }
}

/// Tag reader with per-path tags; unknown paths fail.
#[derive(Default)]
pub struct MockTagReader {
    tags: HashMap<PathBuf, AudioTags>,
    failures: HashSet<PathBuf>,
    delays: HashMap<PathBuf, Duration>,
}

impl MockTagReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tags(mut self, path: impl Into<PathBuf>, tags: AudioTags) -> Self {
        self.tags.insert(path.into(), tags);
        self
    }

    pub fn with_failure(mut self, path: impl Into<PathBuf>) -> Self {
        self.failures.insert(path.into());
        self
    }

    /// Hold the read of `path` back for `delay`.
    pub fn with_delay(mut self, path: impl Into<PathBuf>, delay: Duration) -> Self {
        self.delays.insert(path.into(), delay);
        self
    }
}

#[async_trait]
impl AudioTagReader for MockTagReader {
    async fn read_tags(&self, path: &Path) -> Result<AudioTags> {
        if let Some(delay) = self.delays.get(path) {
            tokio::time::sleep(*delay).await;
        }
        if self.failures.contains(path) {
            return Err(Error::tag_read(path, "unsupported format"));
        }
        self.tags
            .get(path)
            .cloned()
            .ok_or_else(|| Error::tag_read(path, "no tags configured"))
    }
}

/// Cue reader with per-path sheets; unknown paths fail.
#[derive(Default)]
pub struct MockCueReader {
    sheets: HashMap<PathBuf, CueSheet>,
    failures: HashSet<PathBuf>,
}

impl MockCueReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(mut self, path: impl Into<PathBuf>, sheet: CueSheet) -> Self {
        self.sheets.insert(path.into(), sheet);
        self
    }

    pub fn with_failure(mut self, path: impl Into<PathBuf>) -> Self {
        self.failures.insert(path.into());
        self
    }
}

#[async_trait]
impl CueReader for MockCueReader {
    async fn read_sheet(&self, path: &Path) -> Result<CueSheet> {
        if self.failures.contains(path) {
            return Err(Error::cue(path, "line 3: bad INDEX 'xx'"));
        }
        self.sheets
            .get(path)
            .cloned()
            .ok_or_else(|| Error::cue(path, "No such file or directory"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_prober_defaults() {
        let prober = MockProber::new();
        let video = prober.probe(Path::new("/a/ep01.mkv")).await.unwrap();
        assert_eq!(video.streams.len(), 2);
        let companion = prober.probe(Path::new("/a/ep01.mka")).await.unwrap();
        assert!(companion.streams.iter().all(|s| s.kind == StreamKind::Audio));
        assert_eq!(prober.call_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_prober_failure() {
        let prober = MockProber::new().with_failure("/a/ep02.mkv");
        assert!(prober.probe(Path::new("/a/ep02.mkv")).await.is_err());
        assert!(prober.probe(Path::new("/a/ep01.mkv")).await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_tag_reader_unknown_path_fails() {
        let reader = MockTagReader::new().with_tags("/a/01.flac", tags(Some("OST"), None, 60.0));
        assert_eq!(
            reader.read_tags(Path::new("/a/01.flac")).await.unwrap().album.as_deref(),
            Some("OST")
        );
        assert!(reader.read_tags(Path::new("/a/02.flac")).await.is_err());
    }

    #[tokio::test]
    async fn test_mock_walker() {
        let walker = MockWalker::new(vec![PathBuf::from("/a/ep01.mkv")]);
        assert_eq!(walker.list_all(Path::new("/a")).await.unwrap().len(), 1);
        assert!(MockWalker::failing().list_all(Path::new("/a")).await.is_err());
    }
}
