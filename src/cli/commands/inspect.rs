//! Inspection command.

use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::open_library;
use crate::config::Config;
use crate::error::Error;
use crate::inspector::{InspectMode, InspectOptions, InspectOutcome, Inspector};
use crate::model::LibraryEntry;
use crate::probe::FfprobeProber;

/// Inspect a title's folder and store the result
pub fn cmd_inspect(
    rt: &Runtime,
    config: &Config,
    title: &str,
    force: bool,
    full: bool,
    threshold: Option<usize>,
) -> anyhow::Result<()> {
    let library = open_library(config)?;
    let root = library.root_of(title)?;
    let previous = library.store.load_optional(title)?;

    let mode = match (&previous, full) {
        (None, _) => InspectMode::Initial,
        (Some(_), false) => InspectMode::Incremental,
        (Some(_), true) => InspectMode::Full,
    };
    let mut options = InspectOptions::from_config(&config.inspector)
        .mode(mode)
        .force(force);
    if let Some(threshold) = threshold {
        options.confirm_threshold = threshold;
    }
    // The registry title wins over whatever the stored entry carries
    let mut identity = previous.unwrap_or_else(|| LibraryEntry::new(title, &root));
    identity.title = title.to_string();

    let inspector = Inspector::from_config(config);

    let outcome = rt.block_on(async {
        let prober = FfprobeProber::new(&config.probe.ffprobe_path);
        match prober.version().await {
            Some(version) => debug!(target: "inspector::episodes", %version, "Using ffprobe"),
            None => eprintln!(
                "Warning: ffprobe not found at {}; videos will be skipped.\n  Install FFmpeg or pass --ffprobe <path>",
                config.probe.ffprobe_path.display()
            ),
        }

        let cancel = CancellationToken::new();
        let on_interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                on_interrupt.cancel();
            }
        });

        println!("Inspecting {} ...", root.display());
        inspector.inspect(&root, &options, Some(&identity), &cancel).await
    });

    let report = match outcome {
        Ok(InspectOutcome::Complete(report)) => report,
        Ok(InspectOutcome::ConfirmationRequired {
            file_count,
            threshold,
        }) => {
            anyhow::bail!(
                "{} holds {file_count} files (more than {threshold}). \
                 Is this the right folder? Rerun with --force to inspect it anyway.",
                root.display()
            );
        }
        Err(Error::Scan { root, message }) => {
            anyhow::bail!(
                "Cannot inspect {}: {message}.\n  \
                 If the folder was moved or deleted, remove the title with: anime-inspector remove {title:?}",
                root.display()
            );
        }
        Err(Error::Cancelled) => {
            println!("Inspection cancelled; nothing was saved.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    library.store.save(&report.entry)?;
    info!(target: "library::store", title, "Stored inspection result");

    let entry = &report.entry;
    println!(
        "{}: {} episode(s) in {} section(s), {} track(s) in {} album(s)",
        entry.title,
        entry.episode_count(),
        entry.video_sections.len(),
        entry.track_count(),
        entry.albums.len()
    );
    if report.carried_overlays > 0 {
        println!("Kept episode data for {} episode(s)", report.carried_overlays);
    }
    if !report.diagnostics.is_empty() {
        println!("\n{} file(s) skipped:", report.diagnostics.len());
        for diagnostic in &report.diagnostics {
            println!("  {diagnostic}");
        }
    }
    Ok(())
}
