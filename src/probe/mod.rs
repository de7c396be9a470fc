//! Media probing via ffprobe.
//!
//! The inspector only needs container-level facts (duration, size) and a
//! per-stream summary, so this module shells out to `ffprobe` with JSON
//! output rather than linking FFmpeg. [`MediaProber`] is the seam; tests use
//! a canned prober.
//!
//! Install ffprobe (part of FFmpeg):
//! - Windows: `winget install Gyan.FFmpeg`
//! - macOS: `brew install ffmpeg`
//! - Linux: `apt install ffmpeg` or equivalent

pub mod language;

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::process::Command;

use crate::error::{Error, Result};

/// Kind of an elementary stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Video,
    Audio,
    Subtitle,
    /// Data, attachments (fonts in MKV), anything else
    Other,
}

/// Technical summary of one stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    pub kind: StreamKind,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub codec_name: Option<String>,
    pub channels: Option<u32>,
    pub sample_rate_hz: Option<u32>,
    pub language_tag: Option<String>,
    pub title_tag: Option<String>,
}

impl StreamInfo {
    /// A stream of `kind` with every optional field unset.
    pub fn new(kind: StreamKind) -> Self {
        Self {
            kind,
            width: None,
            height: None,
            codec_name: None,
            channels: None,
            sample_rate_hz: None,
            language_tag: None,
            title_tag: None,
        }
    }
}

/// What a prober reports for one file.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeReport {
    pub duration_seconds: f64,
    pub size_bytes: u64,
    pub streams: Vec<StreamInfo>,
}

/// Extracts stream-level technical metadata from a media container.
#[async_trait]
pub trait MediaProber: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<ProbeReport>;
}

/// [`MediaProber`] running the `ffprobe` executable.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    program: PathBuf,
}

impl FfprobeProber {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Get the ffprobe version line (for diagnostics)
    pub async fn version(&self) -> Option<String> {
        let output = Command::new(&self.program)
            .arg("-version")
            .output()
            .await
            .ok()
            .filter(|o| o.status.success())?;
        String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .map(|line| line.trim().to_string())
    }
}

impl Default for FfprobeProber {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

#[async_trait]
impl MediaProber for FfprobeProber {
    async fn probe(&self, path: &Path) -> Result<ProbeReport> {
        let output = Command::new(&self.program)
            .args(["-v", "error", "-print_format", "json", "-show_format", "-show_streams"])
            .arg(path)
            .output()
            .await
            .map_err(|e| Error::probe(path, format!("failed to run ffprobe: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::probe(path, format!("ffprobe failed: {}", stderr.trim())));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_ffprobe_json(&stdout).map_err(|message| Error::probe(path, message))
    }
}

/// Parse the JSON document printed by `ffprobe -show_format -show_streams`.
pub fn parse_ffprobe_json(json: &str) -> std::result::Result<ProbeReport, String> {
    let parsed: FfprobeOutput =
        serde_json::from_str(json).map_err(|e| format!("failed to parse ffprobe output: {e}"))?;
    let format = parsed
        .format
        .ok_or_else(|| "ffprobe output has no format section".to_string())?;

    let streams = parsed.streams.into_iter().map(StreamInfo::from).collect();

    Ok(ProbeReport {
        duration_seconds: parse_number(format.duration.as_ref()).unwrap_or(0.0),
        size_bytes: parse_number(format.size.as_ref()).map_or(0, |s: f64| s as u64),
        streams,
    })
}

/// ffprobe prints most numbers as strings; accept both.
fn parse_number(value: Option<&serde_json::Value>) -> Option<f64> {
    match value? {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// ffprobe JSON output structure
#[derive(Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: Option<FfprobeFormat>,
}

#[derive(Deserialize)]
struct FfprobeFormat {
    duration: Option<serde_json::Value>,
    size: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    channels: Option<u32>,
    sample_rate: Option<serde_json::Value>,
    #[serde(default)]
    tags: HashMap<String, String>,
}

impl FfprobeStream {
    /// Tag keys differ in case between containers (`language` vs `LANGUAGE`).
    fn tag(&self, key: &str) -> Option<String> {
        self.tags
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

impl From<FfprobeStream> for StreamInfo {
    fn from(stream: FfprobeStream) -> Self {
        let kind = match stream.codec_type.as_deref() {
            Some("video") => StreamKind::Video,
            Some("audio") => StreamKind::Audio,
            Some("subtitle") => StreamKind::Subtitle,
            _ => StreamKind::Other,
        };
        let language_tag = stream.tag("language");
        let title_tag = stream.tag("title");
        let sample_rate_hz = parse_number(stream.sample_rate.as_ref()).map(|r| r as u32);

        StreamInfo {
            kind,
            width: stream.width,
            height: stream.height,
            codec_name: stream.codec_name,
            channels: stream.channels,
            sample_rate_hz,
            language_tag,
            title_tag,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "streams": [
            {
                "index": 0,
                "codec_name": "hevc",
                "codec_type": "video",
                "width": 1920,
                "height": 1080,
                "tags": { "BPS": "4000000" }
            },
            {
                "index": 1,
                "codec_name": "flac",
                "codec_type": "audio",
                "sample_rate": "48000",
                "channels": 2,
                "tags": { "language": "jpn", "title": "Main" }
            },
            {
                "index": 2,
                "codec_name": "ass",
                "codec_type": "subtitle",
                "tags": { "LANGUAGE": "chi", "TITLE": "Simplified" }
            },
            {
                "index": 3,
                "codec_name": "ttf",
                "codec_type": "attachment",
                "tags": { "filename": "font.ttf" }
            }
        ],
        "format": {
            "filename": "ep01.mkv",
            "duration": "1420.138000",
            "size": "351207834"
        }
    }"#;

    #[test]
    fn test_parse_ffprobe_json() {
        let report = parse_ffprobe_json(SAMPLE).unwrap();

        assert!((report.duration_seconds - 1420.138).abs() < 1e-9);
        assert_eq!(report.size_bytes, 351_207_834);
        assert_eq!(report.streams.len(), 4);

        let video = &report.streams[0];
        assert_eq!(video.kind, StreamKind::Video);
        assert_eq!((video.width, video.height), (Some(1920), Some(1080)));

        let audio = &report.streams[1];
        assert_eq!(audio.kind, StreamKind::Audio);
        assert_eq!(audio.sample_rate_hz, Some(48_000));
        assert_eq!(audio.channels, Some(2));
        assert_eq!(audio.language_tag.as_deref(), Some("jpn"));
        assert_eq!(audio.title_tag.as_deref(), Some("Main"));

        let subtitle = &report.streams[2];
        assert_eq!(subtitle.kind, StreamKind::Subtitle);
        assert_eq!(subtitle.language_tag.as_deref(), Some("chi"));
        assert_eq!(subtitle.title_tag.as_deref(), Some("Simplified"));

        assert_eq!(report.streams[3].kind, StreamKind::Other);
    }

    #[test]
    fn test_parse_numeric_fields() {
        let json = r#"{"streams": [], "format": {"duration": 12.5, "size": 1024}}"#;
        let report = parse_ffprobe_json(json).unwrap();
        assert_eq!(report.duration_seconds, 12.5);
        assert_eq!(report.size_bytes, 1024);
        assert!(report.streams.is_empty());
    }

    #[test]
    fn test_parse_missing_format_is_error() {
        assert!(parse_ffprobe_json(r#"{"streams": []}"#).is_err());
        assert!(parse_ffprobe_json("not json").is_err());
    }

    #[tokio::test]
    async fn test_missing_program_is_probe_error() {
        let prober = FfprobeProber::new("/nonexistent/ffprobe-binary");
        let result = prober.probe(Path::new("/anime/ep01.mkv")).await;
        assert!(matches!(result, Err(Error::Probe { .. })));
    }
}
