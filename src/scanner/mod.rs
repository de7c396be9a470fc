//! Directory walking for library roots.
//!
//! [`DirectoryWalker`] is the seam the inspector lists files through;
//! [`WalkdirWalker`] is the filesystem implementation. Tests substitute a
//! canned listing.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Lists every file below a root.
#[async_trait]
pub trait DirectoryWalker: Send + Sync {
    /// Return the absolute paths of all regular files under `root`, recursively.
    ///
    /// Fails with [`Error::Scan`] when the root itself cannot be listed.
    async fn list_all(&self, root: &Path) -> Result<Vec<PathBuf>>;
}

/// Recursive walker backed by `walkdir`.
///
/// Entries are yielded sorted by file name within each directory so that a
/// listing of an unchanged tree is stable across runs.
#[derive(Debug, Clone, Default)]
pub struct WalkdirWalker {
    /// Follow symbolic links while descending
    pub follow_links: bool,
}

impl WalkdirWalker {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DirectoryWalker for WalkdirWalker {
    async fn list_all(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let root = root.to_path_buf();
        let follow_links = self.follow_links;
        let task_root = root.clone();

        // walkdir is synchronous; keep it off the async workers
        tokio::task::spawn_blocking(move || walk(&task_root, follow_links))
            .await
            .map_err(|e| Error::scan(root, format!("walker task failed: {e}")))?
    }
}

fn walk(root: &Path, follow_links: bool) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        return Err(Error::scan(root, "directory does not exist"));
    }
    if !root.is_dir() {
        return Err(Error::scan(root, "not a directory"));
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(follow_links)
        .sort_by_file_name();

    for entry in walker {
        match entry {
            Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
            Ok(_) => {}
            Err(e) if e.depth() == 0 => {
                return Err(Error::scan(root, e.to_string()));
            }
            Err(e) => {
                warn!(target: "scanner::walk", error = %e, "Skipping unreadable entry");
            }
        }
    }

    debug!(target: "scanner::walk", root = %root.display(), files = files.len(), "Listed files");
    Ok(files)
}
