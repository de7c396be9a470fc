//! Music albums from cue sheets and standalone audio files.
//!
//! Cue sheets run first: every audio file a sheet references is taken out
//! of the standalone pool before the pool itself is tagged, so one file
//! never yields both a cue-derived album and a standalone track.

use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::{Diagnostic, DiagnosticKind};
use crate::cue::segment::{CueTrackEntry, round_centis, segment_tracks};
use crate::cue::{CueReader, CueSheet};
use crate::metadata::{AudioTagReader, AudioTags};
use crate::model::{MusicAlbum, MusicTrack, UNTAGGED_ALBUM};

/// One referenced audio file of a cue sheet, ready to measure.
#[derive(Debug, Clone)]
struct CueJob {
    album: String,
    audio_path: PathBuf,
    entries: Vec<CueTrackEntry>,
}

/// Albums under construction; buckets appear only when a track is added.
#[derive(Debug, Default)]
struct AlbumAccumulator {
    albums: BTreeMap<String, MusicAlbum>,
}

impl AlbumAccumulator {
    fn extend(&mut self, album: &str, tracks: Vec<MusicTrack>) {
        if tracks.is_empty() {
            return;
        }
        self.albums
            .entry(album.to_string())
            .or_default()
            .tracks
            .extend(tracks);
    }

    fn into_albums(self) -> BTreeMap<String, MusicAlbum> {
        self.albums
    }
}

/// Build every album from the cue sheets and standalone audio of a title.
///
/// Albums sharing a name are merged in processing order: cue sheets in
/// listing order, then standalone files in listing order.
pub async fn resolve_music(
    cue_sheets: &[PathBuf],
    standalone_audio: &[PathBuf],
    cue_reader: &dyn CueReader,
    tag_reader: &dyn AudioTagReader,
    concurrency: usize,
) -> (BTreeMap<String, MusicAlbum>, Vec<Diagnostic>) {
    let mut pool = standalone_audio.to_vec();
    let mut diagnostics = Vec::new();
    let mut albums = AlbumAccumulator::default();

    let jobs = plan_cue_jobs(cue_sheets, cue_reader, &mut pool, &mut diagnostics).await;
    segment_cue_jobs(jobs, tag_reader, concurrency, &mut albums, &mut diagnostics).await;
    classify_standalone(&pool, tag_reader, concurrency, &mut albums, &mut diagnostics).await;

    let albums = albums.into_albums();
    info!(
        target: "inspector::music",
        albums = albums.len(),
        tracks = albums.values().map(|a| a.tracks.len()).sum::<usize>(),
        "Music resolved"
    );
    (albums, diagnostics)
}

/// Parse every sheet and claim the audio files it references from `pool`.
async fn plan_cue_jobs(
    cue_sheets: &[PathBuf],
    cue_reader: &dyn CueReader,
    pool: &mut Vec<PathBuf>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<CueJob> {
    let mut jobs = Vec::new();

    for cue_path in cue_sheets {
        let sheet = match cue_reader.read_sheet(cue_path).await {
            Ok(sheet) => sheet,
            Err(e) => {
                warn!(target: "inspector::music", path = %cue_path.display(), error = %e, "Skipping cue sheet");
                diagnostics.push(Diagnostic::new(DiagnosticKind::CueFailure, cue_path, e.to_string()));
                continue;
            }
        };
        let album = album_name(cue_path, &sheet);
        let cue_dir = cue_path.parent().unwrap_or(Path::new(""));
        debug!(
            target: "inspector::music",
            path = %cue_path.display(),
            album = %album,
            tracks = sheet.track_count(),
            "Parsed cue sheet"
        );

        for file in &sheet.files {
            let audio_path = cue_dir.join(&file.name);
            let Some(position) = pool.iter().position(|p| *p == audio_path) else {
                let message = format!("referenced file {:?} is not an available audio file", file.name);
                warn!(target: "inspector::music", path = %cue_path.display(), %message, "Unresolved cue reference");
                diagnostics.push(Diagnostic::new(DiagnosticKind::ResolutionFailure, cue_path, message));
                continue;
            };
            pool.remove(position);

            // Claimed even without tracks, so the image is never catalogued on its own
            if file.tracks.is_empty() {
                debug!(target: "inspector::music", path = %audio_path.display(), "Cue file block has no tracks");
                continue;
            }

            let mut entries = Vec::with_capacity(file.tracks.len());
            for track in &file.tracks {
                match CueTrackEntry::from_track(track, sheet.performer.as_deref()) {
                    Some(entry) => entries.push(entry),
                    None => {
                        let message = format!("track {} has no INDEX 01", track.number);
                        warn!(target: "inspector::music", path = %cue_path.display(), %message, "Skipping cue track");
                        diagnostics.push(Diagnostic::new(DiagnosticKind::CueFailure, cue_path, message));
                    }
                }
            }

            jobs.push(CueJob {
                album: album.clone(),
                audio_path,
                entries,
            });
        }
    }

    jobs
}

/// The sheet's `TITLE`, else the cue file's stem.
fn album_name(cue_path: &Path, sheet: &CueSheet) -> String {
    sheet.title.clone().unwrap_or_else(|| {
        cue_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    })
}

/// Measure each referenced file and cut it into tracks.
async fn segment_cue_jobs(
    jobs: Vec<CueJob>,
    tag_reader: &dyn AudioTagReader,
    concurrency: usize,
    albums: &mut AlbumAccumulator,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let measured: Vec<_> = stream::iter(jobs)
        .map(|job| async move {
            let tags = tag_reader.read_tags(&job.audio_path).await;
            (job, tags)
        })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    for (job, tags) in measured {
        match tags {
            Ok(tags) => {
                let tracks = segment_tracks(job.entries, tags.duration_seconds);
                albums.extend(&job.album, tracks);
            }
            Err(e) => {
                warn!(target: "inspector::music", path = %job.audio_path.display(), error = %e, "Cannot measure cue audio");
                diagnostics.push(Diagnostic::new(DiagnosticKind::TagFailure, &job.audio_path, e.to_string()));
            }
        }
    }
}

/// Tag every file left in the pool into its album.
async fn classify_standalone(
    pool: &[PathBuf],
    tag_reader: &dyn AudioTagReader,
    concurrency: usize,
    albums: &mut AlbumAccumulator,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let tagged: Vec<_> = stream::iter(pool)
        .map(|path| async move { (path, tag_reader.read_tags(path).await) })
        .buffered(concurrency.max(1))
        .collect()
        .await;

    for (path, tags) in tagged {
        match tags {
            Ok(tags) => {
                let (album, track) = standalone_track(path, tags);
                albums.extend(&album, vec![track]);
            }
            Err(e) => {
                warn!(target: "inspector::music", path = %path.display(), error = %e, "Skipping audio file");
                diagnostics.push(Diagnostic::new(DiagnosticKind::TagFailure, path, e.to_string()));
            }
        }
    }
}

/// Album name and track for a standalone file.
pub fn standalone_track(path: &Path, tags: AudioTags) -> (String, MusicTrack) {
    let album = tags.album.unwrap_or_else(|| UNTAGGED_ALBUM.to_string());
    let title = tags.title.unwrap_or_else(|| {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    });
    let track = MusicTrack {
        title,
        artist: tags.artist,
        track_number: tags.track_number,
        duration_seconds: round_centis(tags.duration_seconds),
    };
    (album, track)
}
