//! Episode resolution for one directory.
//!
//! Sidecar files are paired with each video first (synchronously, in
//! listing order, so companion claims are deterministic), then every video
//! and its companion audio are probed with bounded concurrency. Results are
//! collected in dispatch order, so probe completion order never reorders
//! episodes.

use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::classifier::DirectoryBucket;
use super::matcher::MatchStrategy;
use super::{Diagnostic, DiagnosticKind};
use crate::error::Result;
use crate::model::{AudioTrackDescriptor, VideoRecord, VideoSection};
use crate::probe::language::language_name;
use crate::probe::{MediaProber, ProbeReport, StreamInfo, StreamKind};

/// Origin marker of streams that come from a companion `.mka` file.
pub const COMPANION_PREFIX: &str = "MKA:";

/// A video with its sidecars, ready to probe.
#[derive(Debug, Clone)]
struct PlannedEpisode {
    video: PathBuf,
    companion: Option<PathBuf>,
    subtitle_labels: Vec<String>,
}

/// Pair every video of the bucket with its sidecars.
///
/// A companion file is claimed by the first video that matches it.
fn plan(bucket: &DirectoryBucket, strategy: &dyn MatchStrategy) -> Vec<PlannedEpisode> {
    let mut unclaimed = bucket.companion_audio.clone();
    bucket
        .videos
        .iter()
        .map(|video| {
            let companion = strategy.companion(video, &unclaimed).cloned();
            if let Some(claimed) = &companion {
                unclaimed.retain(|c| c != claimed);
            }
            let subtitle_labels = strategy
                .subtitles(video, &bucket.subtitles)
                .into_iter()
                .map(|m| m.label)
                .collect();
            PlannedEpisode {
                video: video.clone(),
                companion,
                subtitle_labels,
            }
        })
        .collect()
}

/// Resolve one directory bucket into a video section.
///
/// Videos whose probe fails (or whose companion audio fails to probe) are
/// left out and reported as diagnostics.
pub async fn resolve_directory(
    bucket: &DirectoryBucket,
    prober: &dyn MediaProber,
    strategy: &dyn MatchStrategy,
    concurrency: usize,
) -> (VideoSection, Vec<Diagnostic>) {
    let planned = plan(bucket, strategy);
    debug!(
        target: "inspector::episodes",
        directory = %bucket.key,
        videos = planned.len(),
        "Probing directory"
    );

    let results: Vec<(PlannedEpisode, Result<VideoRecord>)> = stream::iter(planned)
        .map(|episode| async move {
            let record = probe_episode(prober, &episode).await;
            (episode, record)
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let mut episodes = Vec::with_capacity(results.len());
    let mut diagnostics = Vec::new();
    for (episode, result) in results {
        match result {
            Ok(record) => episodes.push(record),
            Err(e) => {
                warn!(
                    target: "inspector::episodes",
                    path = %episode.video.display(),
                    error = %e,
                    "Dropping episode"
                );
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::ProbeFailure,
                    &episode.video,
                    e.to_string(),
                ));
            }
        }
    }

    (VideoSection::new(bucket.key.clone(), episodes), diagnostics)
}

async fn probe_episode(prober: &dyn MediaProber, episode: &PlannedEpisode) -> Result<VideoRecord> {
    let report = prober.probe(&episode.video).await?;
    let companion = match &episode.companion {
        Some(path) => Some(prober.probe(path).await?),
        None => None,
    };
    Ok(build_record(
        &episode.video,
        &report,
        companion.as_ref(),
        episode.subtitle_labels.clone(),
    ))
}

/// Assemble the episode record from probe reports.
///
/// `subtitle_tracks` starts with the external subtitle labels; embedded
/// subtitle streams carrying a language tag are appended after them.
pub fn build_record(
    video: &Path,
    report: &ProbeReport,
    companion: Option<&ProbeReport>,
    mut subtitle_tracks: Vec<String>,
) -> VideoRecord {
    let resolution = report
        .streams
        .iter()
        .find(|s| s.kind == StreamKind::Video)
        .and_then(|s| Some(format!("{}x{}", s.width?, s.height?)))
        .unwrap_or_default();

    subtitle_tracks.extend(
        report
            .streams
            .iter()
            .filter(|s| s.kind == StreamKind::Subtitle)
            .filter_map(embedded_subtitle_label),
    );

    let embedded_audio = report
        .streams
        .iter()
        .filter(|s| s.kind == StreamKind::Audio)
        .map(|s| describe_audio_stream(s, false));
    let companion_audio = companion
        .into_iter()
        .flat_map(|r| r.streams.iter())
        .filter(|s| s.kind == StreamKind::Audio)
        .map(|s| describe_audio_stream(s, true));

    VideoRecord {
        basename: video
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        duration_seconds: report.duration_seconds,
        size_bytes: report.size_bytes,
        resolution,
        audio_tracks: embedded_audio.chain(companion_audio).collect(),
        subtitle_tracks,
        ..Default::default()
    }
}

/// `Language` or `Language(title)`; streams without a language tag are skipped.
pub fn embedded_subtitle_label(stream: &StreamInfo) -> Option<String> {
    let language = language_name(stream.language_tag.as_deref()?);
    Some(match &stream.title_tag {
        Some(title) => format!("{language}({title})"),
        None => language,
    })
}

/// Display string for one audio stream, e.g. `MKA:[Japanese] <Commentary> FLAC, 2ch, 48kHz`.
pub fn describe_audio_stream(stream: &StreamInfo, from_companion: bool) -> AudioTrackDescriptor {
    let mut text = String::new();
    if from_companion {
        text.push_str(COMPANION_PREFIX);
    }
    if let Some(tag) = &stream.language_tag {
        text.push_str(&format!("[{}] ", language_name(tag)));
    }
    if let Some(title) = &stream.title_tag {
        text.push_str(&format!("<{title}> "));
    }

    let mut details = Vec::with_capacity(3);
    if let Some(codec) = &stream.codec_name {
        details.push(codec.to_uppercase());
    }
    if let Some(channels) = stream.channels {
        details.push(format!("{channels}ch"));
    }
    if let Some(rate) = stream.sample_rate_hz {
        details.push(format_sample_rate(rate));
    }
    text.push_str(&details.join(", "));

    AudioTrackDescriptor::new(text)
}

/// Sample rate in the largest unit with a non-zero integer part.
///
/// The MHz step divides by 10^7, so 12 MHz prints as `1MHz`.
pub fn format_sample_rate(rate_hz: u32) -> String {
    let mhz = rate_hz / 10_000_000;
    if mhz > 0 {
        return format!("{mhz}MHz");
    }
    let khz = rate_hz / 1000;
    if khz > 0 {
        return format!("{khz}kHz");
    }
    format!("{rate_hz}Hz")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspector::matcher::StemMatcher;
    use crate::test_utils::{MockProber, audio_stream, subtitle_stream, video_report};
    use std::time::Duration;

    fn bucket(videos: &[&str], audio: &[&str], subtitles: &[&str]) -> DirectoryBucket {
        let paths = |list: &[&str]| list.iter().map(PathBuf::from).collect();
        DirectoryBucket {
            key: String::new(),
            videos: paths(videos),
            companion_audio: paths(audio),
            subtitles: paths(subtitles),
        }
    }

    fn basenames(section: &VideoSection) -> Vec<&str> {
        section.episodes.iter().map(|e| e.basename.as_str()).collect()
    }

    #[test]
    fn test_format_sample_rate() {
        assert_eq!(format_sample_rate(48_000), "48kHz");
        assert_eq!(format_sample_rate(44_100), "44kHz");
        assert_eq!(format_sample_rate(800), "800Hz");
        assert_eq!(format_sample_rate(12_000_000), "1MHz");
        assert_eq!(format_sample_rate(0), "0Hz");
    }

    #[test]
    fn test_describe_audio_stream() {
        let mut stream = audio_stream("flac", 2, 48_000);
        assert_eq!(describe_audio_stream(&stream, false).as_str(), "FLAC, 2ch, 48kHz");

        stream.language_tag = Some("jpn".to_string());
        stream.title_tag = Some("Commentary".to_string());
        assert_eq!(
            describe_audio_stream(&stream, true).as_str(),
            "MKA:[Japanese] <Commentary> FLAC, 2ch, 48kHz"
        );
    }

    #[test]
    fn test_embedded_subtitle_label() {
        assert_eq!(
            embedded_subtitle_label(&subtitle_stream(Some("chi"), Some("Simplified"))),
            Some("Chinese(Simplified)".to_string())
        );
        assert_eq!(
            embedded_subtitle_label(&subtitle_stream(Some("eng"), None)),
            Some("English".to_string())
        );
        assert_eq!(embedded_subtitle_label(&subtitle_stream(None, Some("Signs"))), None);
    }

    #[test]
    fn test_build_record() {
        let mut report = video_report(1420.5, 350_000_000, 1920, 1080);
        report.streams.push(subtitle_stream(Some("eng"), None));
        let mut companion = video_report(1420.5, 40_000_000, 0, 0);
        companion.streams = vec![audio_stream("aac", 6, 48_000)];

        let record = build_record(
            Path::new("/anime/ep01.mkv"),
            &report,
            Some(&companion),
            vec![".chs.ass".to_string()],
        );

        assert_eq!(record.basename, "ep01.mkv");
        assert_eq!(record.resolution, "1920x1080");
        assert_eq!(record.size_bytes, 350_000_000);
        assert_eq!(record.subtitle_tracks, vec![".chs.ass", "English"]);
        let audio: Vec<_> = record.audio_tracks.iter().map(|a| a.as_str()).collect();
        assert_eq!(audio, vec!["FLAC, 2ch, 48kHz", "MKA:AAC, 6ch, 48kHz"]);
        assert!(!record.has_overlay());
    }

    #[test]
    fn test_build_record_without_video_stream() {
        let mut report = video_report(10.0, 1, 0, 0);
        report.streams.retain(|s| s.kind != StreamKind::Video);
        let record = build_record(Path::new("/a/x.mkv"), &report, None, Vec::new());
        assert_eq!(record.resolution, "");
    }

    #[test]
    fn test_first_video_claims_companion() {
        let planned = plan(
            &bucket(&["/a/ep01.mkv", "/a/ep01.mp4"], &["/a/ep01.mka"], &[]),
            &StemMatcher,
        );
        assert_eq!(planned[0].companion, Some(PathBuf::from("/a/ep01.mka")));
        assert_eq!(planned[1].companion, None);
    }

    #[tokio::test]
    async fn test_pairs_subtitles_in_listing_order() {
        let prober = MockProber::new();
        let bucket = bucket(
            &["/a/ep01.mkv", "/a/ep02.mkv"],
            &[],
            &["/a/ep01.chs.ass", "/a/ep02.chs.ass", "/a/ep02.cht.ass"],
        );

        let (section, diagnostics) = resolve_directory(&bucket, &prober, &StemMatcher, 4).await;

        assert!(diagnostics.is_empty());
        assert_eq!(basenames(&section), vec!["ep01.mkv", "ep02.mkv"]);
        assert_eq!(section.episodes[0].subtitle_tracks, vec![".chs.ass"]);
        assert_eq!(section.episodes[1].subtitle_tracks, vec![".chs.ass", ".cht.ass"]);
    }

    #[tokio::test]
    async fn test_out_of_order_completion_keeps_listing_order() {
        let prober = MockProber::new()
            .with_delay("/a/ep01.mkv", Duration::from_millis(60))
            .with_delay("/a/ep02.mkv", Duration::from_millis(30));
        let bucket = bucket(&["/a/ep01.mkv", "/a/ep02.mkv", "/a/ep03.mkv"], &[], &[]);

        let (section, _) = resolve_directory(&bucket, &prober, &StemMatcher, 3).await;

        assert_eq!(basenames(&section), vec!["ep01.mkv", "ep02.mkv", "ep03.mkv"]);
        // ep03 really did finish first
        assert_eq!(prober.completion_order()[0], PathBuf::from("/a/ep03.mkv"));
    }

    #[tokio::test]
    async fn test_failed_probe_drops_only_that_video() {
        let prober = MockProber::new().with_failure("/a/ep02.mkv");
        let bucket = bucket(&["/a/ep01.mkv", "/a/ep02.mkv", "/a/ep03.mkv"], &[], &[]);

        let (section, diagnostics) = resolve_directory(&bucket, &prober, &StemMatcher, 2).await;

        assert_eq!(basenames(&section), vec!["ep01.mkv", "ep03.mkv"]);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::ProbeFailure);
        assert_eq!(diagnostics[0].path, PathBuf::from("/a/ep02.mkv"));
    }

    #[tokio::test]
    async fn test_failed_companion_probe_drops_video() {
        let prober = MockProber::new().with_failure("/a/ep01.mka");
        let bucket = bucket(&["/a/ep01.mkv", "/a/ep02.mkv"], &["/a/ep01.mka"], &[]);

        let (section, diagnostics) = resolve_directory(&bucket, &prober, &StemMatcher, 2).await;

        assert_eq!(basenames(&section), vec!["ep02.mkv"]);
        assert_eq!(diagnostics.len(), 1);
    }
}
