//! Inspection pass over one anime title's folder.
//!
//! The pass runs in fixed stages:
//!
//! 1. list every file under the root ([`DirectoryWalker`])
//! 2. classify by extension ([`classifier::classify`])
//! 3. resolve episodes per directory ([`episodes::resolve_directory`])
//! 4. resolve cue sheets, then standalone audio ([`music::resolve_music`])
//!
//! Per-file failures never abort the pass; they come back as
//! [`Diagnostic`]s next to the catalog. Only a scan failure or a
//! cancellation ends the pass without a result.

pub mod classifier;
pub mod episodes;
pub mod matcher;
pub mod music;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{Config, InspectorConfig};
use crate::cue::{CueReader, FileCueReader};
use crate::error::{Error, Result};
use crate::metadata::{AudioTagReader, LoftyTagReader};
use crate::model::LibraryEntry;
use crate::probe::{FfprobeProber, MediaProber};
use crate::scanner::{DirectoryWalker, WalkdirWalker};
use matcher::{MatchStrategy, StemMatcher};

/// Why a file is missing from the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A video or its companion audio could not be probed
    ProbeFailure,
    /// A cue sheet references a file that is not an available audio file
    ResolutionFailure,
    /// Tags or duration of an audio file could not be read
    TagFailure,
    /// A cue sheet or one of its tracks could not be used
    CueFailure,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ProbeFailure => "probe",
            Self::ResolutionFailure => "unresolved",
            Self::TagFailure => "tags",
            Self::CueFailure => "cue",
        };
        f.write_str(name)
    }
}

/// A recoverable per-file failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub path: PathBuf,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind, self.path.display(), self.message)
    }
}

/// How a pass relates to an earlier result for the same title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InspectMode {
    /// First inspection of a new entry
    #[default]
    Initial,
    /// Rebuild, keeping overlays and section names from the previous entry
    Incremental,
    /// Rebuild from scratch, dropping overlays
    Full,
}

#[derive(Debug, Clone)]
pub struct InspectOptions {
    pub mode: InspectMode,
    /// Inspect even when the file count exceeds `confirm_threshold`
    pub force: bool,
    pub confirm_threshold: usize,
    /// Maximum probes or tag reads in flight at once
    pub probe_concurrency: usize,
}

impl Default for InspectOptions {
    fn default() -> Self {
        Self::from_config(&InspectorConfig::default())
    }
}

impl InspectOptions {
    pub fn from_config(config: &InspectorConfig) -> Self {
        Self {
            mode: InspectMode::Initial,
            force: false,
            confirm_threshold: config.confirm_threshold,
            probe_concurrency: config.probe_concurrency,
        }
    }

    pub fn mode(mut self, mode: InspectMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }
}

/// A finished pass.
#[derive(Debug, Clone)]
pub struct InspectReport {
    pub entry: LibraryEntry,
    pub diagnostics: Vec<Diagnostic>,
    /// Files listed under the root, classified or not
    pub file_count: usize,
    /// Episodes whose overlays were carried over from the previous entry
    pub carried_overlays: usize,
}

/// Result of [`Inspector::inspect`] when the root could be listed.
#[derive(Debug, Clone)]
pub enum InspectOutcome {
    Complete(InspectReport),
    /// Too many files to inspect without the caller's confirmation
    ConfirmationRequired { file_count: usize, threshold: usize },
}

/// Builds a [`LibraryEntry`] from a folder and the collaborators that read it.
#[derive(Clone)]
pub struct Inspector {
    walker: Arc<dyn DirectoryWalker>,
    prober: Arc<dyn MediaProber>,
    tag_reader: Arc<dyn AudioTagReader>,
    cue_reader: Arc<dyn CueReader>,
    strategy: Arc<dyn MatchStrategy>,
}

impl Inspector {
    pub fn new(
        walker: Arc<dyn DirectoryWalker>,
        prober: Arc<dyn MediaProber>,
        tag_reader: Arc<dyn AudioTagReader>,
        cue_reader: Arc<dyn CueReader>,
    ) -> Self {
        Self {
            walker,
            prober,
            tag_reader,
            cue_reader,
            strategy: Arc::new(StemMatcher),
        }
    }

    /// Filesystem walker, ffprobe, lofty and the file cue reader.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(WalkdirWalker::new()),
            Arc::new(FfprobeProber::new(&config.probe.ffprobe_path)),
            Arc::new(LoftyTagReader),
            Arc::new(FileCueReader),
        )
    }

    /// Replace the sidecar matching heuristic.
    pub fn with_strategy(mut self, strategy: Arc<dyn MatchStrategy>) -> Self {
        self.strategy = strategy;
        self
    }

    /// Run one pass over `root`.
    ///
    /// `previous` supplies the entry's title (the root's folder name is
    /// used without it) and, in [`InspectMode::Incremental`], the overlays
    /// to carry over. Nothing is returned for a cancelled pass.
    pub async fn inspect(
        &self,
        root: &Path,
        options: &InspectOptions,
        previous: Option<&LibraryEntry>,
        cancel: &CancellationToken,
    ) -> Result<InspectOutcome> {
        let files = self.walker.list_all(root).await?;
        check_cancelled(cancel)?;

        if files.is_empty() {
            return Err(Error::scan(root, "no files found"));
        }
        let file_count = files.len();
        if file_count > options.confirm_threshold && !options.force {
            warn!(
                target: "inspector::classify",
                root = %root.display(),
                file_count,
                threshold = options.confirm_threshold,
                "Too many files, confirmation required"
            );
            return Ok(InspectOutcome::ConfirmationRequired {
                file_count,
                threshold: options.confirm_threshold,
            });
        }

        let classification = classifier::classify(root, &files);
        info!(
            target: "inspector::classify",
            root = %root.display(),
            files = file_count,
            classified = classification.classified_count(),
            directories = classification.directories.len(),
            videos = classification.video_count(),
            cue_sheets = classification.cue_sheets.len(),
            audio = classification.standalone_audio.len(),
            "Classified files"
        );

        let title = previous.map(|p| p.title.clone()).unwrap_or_else(|| {
            root.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| root.display().to_string())
        });
        let mut entry = LibraryEntry::new(title, root);
        let mut diagnostics = Vec::new();

        for bucket in &classification.directories {
            let (section, mut found) = episodes::resolve_directory(
                bucket,
                self.prober.as_ref(),
                self.strategy.as_ref(),
                options.probe_concurrency,
            )
            .await;
            check_cancelled(cancel)?;
            debug!(
                target: "inspector::episodes",
                directory = %bucket.key,
                episodes = section.episodes.len(),
                dropped = found.len(),
                "Resolved directory"
            );
            entry.video_sections.push(section);
            diagnostics.append(&mut found);
        }

        let (albums, mut found) = music::resolve_music(
            &classification.cue_sheets,
            &classification.standalone_audio,
            self.cue_reader.as_ref(),
            self.tag_reader.as_ref(),
            options.probe_concurrency,
        )
        .await;
        check_cancelled(cancel)?;
        entry.albums = albums;
        diagnostics.append(&mut found);

        let carried_overlays = match (options.mode, previous) {
            (InspectMode::Incremental, Some(previous)) => entry.carry_overlays_from(previous),
            _ => 0,
        };

        info!(
            target: "inspector::classify",
            title = %entry.title,
            episodes = entry.episode_count(),
            tracks = entry.track_count(),
            diagnostics = diagnostics.len(),
            carried_overlays,
            "Inspection complete"
        );

        Ok(InspectOutcome::Complete(InspectReport {
            entry,
            diagnostics,
            file_count,
            carried_overlays,
        }))
    }
}

fn check_cancelled(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }
    Ok(())
}
