//! Persistent library of inspected titles.
//!
//! Two kinds of files live in the data directory:
//!
//! - `titles.json`: the ordered registry of titles and their folders
//!   ([`LibraryIndex`])
//! - `entries/<title>.json`: the last inspection result of each title
//!   ([`EntryStore`])
//!
//! Both are rewritten atomically (temp file, then rename).

mod store;

pub use store::EntryStore;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Error, Result, ResultExt};

/// Registry file name inside the data directory.
pub const INDEX_FILE: &str = "titles.json";

/// Windows recycle bin at the top of a drive; never a title.
const RECYCLE_BIN: &str = "$RECYCLE.BIN";

/// One registered title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleRecord {
    pub title: String,
    pub path: PathBuf,
}

/// Ordered list of registered titles.
#[derive(Debug, Clone)]
pub struct LibraryIndex {
    file: PathBuf,
    records: Vec<TitleRecord>,
}

impl LibraryIndex {
    /// Load the registry at `file`; a missing file is an empty registry.
    pub fn load(file: impl Into<PathBuf>) -> Result<Self> {
        let file = file.into();
        let records: Vec<TitleRecord> = match std::fs::read(&file) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(format!("parsing {}", file.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(Error::Io(e).context(format!("reading {}", file.display()))),
        };
        Ok(Self { file, records })
    }

    pub fn save(&self) -> Result<()> {
        write_json_atomic(&self.file, &self.records)?;
        debug!(target: "library::store", file = %self.file.display(), titles = self.records.len(), "Saved registry");
        Ok(())
    }

    pub fn records(&self) -> &[TitleRecord] {
        &self.records
    }

    pub fn titles(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.title.as_str()).collect()
    }

    pub fn contains(&self, title: &str) -> bool {
        self.position(title).is_some()
    }

    pub fn path_of(&self, title: &str) -> Option<&Path> {
        self.position(title).map(|i| self.records[i].path.as_path())
    }

    fn position(&self, title: &str) -> Option<usize> {
        self.records.iter().position(|r| r.title == title)
    }

    pub fn contains_path(&self, path: &Path) -> bool {
        self.title_at(path).is_some()
    }

    /// Title registered for the folder `path`.
    pub fn title_at(&self, path: &Path) -> Option<&str> {
        self.records
            .iter()
            .find(|r| r.path == path)
            .map(|r| r.title.as_str())
    }

    /// Register a title; titles and folders are both unique.
    pub fn add(&mut self, title: &str, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        validate_title(title)?;
        if self.contains(title) {
            return Err(Error::EntryExists(title.to_string()));
        }
        if let Some(existing) = self.title_at(&path) {
            return Err(Error::PathRegistered {
                path,
                title: existing.to_string(),
            });
        }
        self.records.push(TitleRecord {
            title: title.to_string(),
            path,
        });
        Ok(())
    }

    /// Register every folder under its own name, in the given order.
    ///
    /// Folders whose name or path is already taken, or whose name is not a
    /// usable title, are skipped rather than failing the batch.
    pub fn add_all(&mut self, folders: &[PathBuf]) -> AddAllSummary {
        let mut summary = AddAllSummary::default();
        for folder in folders {
            let Some(title) = default_title(folder) else {
                summary.skipped.push(folder.clone());
                continue;
            };
            match self.add(&title, folder) {
                Ok(()) => summary.added.push(title),
                Err(e) => {
                    debug!(target: "library::store", folder = %folder.display(), error = %e, "Skipping folder");
                    summary.skipped.push(folder.clone());
                }
            }
        }
        summary
    }

    pub fn remove(&mut self, title: &str) -> Result<TitleRecord> {
        let idx = self
            .position(title)
            .ok_or_else(|| Error::EntryNotFound(title.to_string()))?;
        Ok(self.records.remove(idx))
    }

    pub fn rename(&mut self, old: &str, new: &str) -> Result<()> {
        validate_title(new)?;
        if self.contains(new) {
            return Err(Error::EntryExists(new.to_string()));
        }
        let idx = self
            .position(old)
            .ok_or_else(|| Error::EntryNotFound(old.to_string()))?;
        self.records[idx].title = new.to_string();
        Ok(())
    }

    /// Take the title at `from` out and insert it at `to`.
    pub fn move_entry(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.records.len();
        if from >= len || to >= len {
            return Err(Error::InvalidOrder(format!(
                "cannot move {from} to {to} in a list of {len}"
            )));
        }
        let record = self.records.remove(from);
        self.records.insert(to, record);
        Ok(())
    }

    pub fn sort_by_title(&mut self) {
        self.records.sort_by(|a, b| a.title.cmp(&b.title));
    }
}

/// Outcome of [`LibraryIndex::add_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddAllSummary {
    pub added: Vec<String>,
    pub skipped: Vec<PathBuf>,
}

/// A folder's own name, the title it gets unless one is given.
pub fn default_title(folder: &Path) -> Option<String> {
    folder
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
}

/// Direct subfolders of `dir`, sorted by name, without the recycle bin.
pub fn subfolders(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut folders = Vec::new();
    for item in std::fs::read_dir(dir).with_context(format!("reading {}", dir.display()))? {
        let item = item.with_context(format!("reading {}", dir.display()))?;
        if !item.file_type()?.is_dir() {
            continue;
        }
        if item.file_name().eq_ignore_ascii_case(RECYCLE_BIN) {
            continue;
        }
        folders.push(item.path());
    }
    folders.sort();
    Ok(folders)
}

/// Titles double as file names.
fn validate_title(title: &str) -> Result<()> {
    let trimmed = title.trim();
    if trimmed.is_empty()
        || trimmed != title
        || title == "."
        || title == ".."
        || title.contains(['/', '\\', '\0'])
    {
        return Err(Error::InvalidTitle(title.to_string()));
    }
    Ok(())
}

/// Registry and entry files of one data directory.
#[derive(Debug, Clone)]
pub struct Library {
    pub index: LibraryIndex,
    pub store: EntryStore,
}

impl Library {
    pub fn open(data_dir: &Path) -> Result<Self> {
        let index = LibraryIndex::load(data_dir.join(INDEX_FILE))?;
        let store = EntryStore::new(data_dir.join("entries"));
        Ok(Self { index, store })
    }

    /// Registered folder of `title`.
    pub fn root_of(&self, title: &str) -> Result<PathBuf> {
        self.index
            .path_of(title)
            .map(Path::to_path_buf)
            .ok_or_else(|| Error::EntryNotFound(title.to_string()))
    }

    /// Unregister a title, optionally deleting its stored entry.
    pub fn remove(&mut self, title: &str, delete_data: bool) -> Result<()> {
        self.index.remove(title)?;
        if delete_data {
            self.store.delete(title)?;
        }
        self.index.save()?;
        info!(target: "library::store", title, delete_data, "Removed title");
        Ok(())
    }

    /// Rename a title in the registry and its stored entry.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<()> {
        self.index.rename(old, new)?;
        if self.store.exists(old) {
            self.store.rename(old, new)?;
        }
        self.index.save()?;
        info!(target: "library::store", old, new, "Renamed title");
        Ok(())
    }
}

/// Serialize `value` to `path` through a temp file and a rename.
pub(crate) fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).with_context(format!("creating {}", dir.display()))?;
    }
    let json = serde_json::to_vec_pretty(value)?;

    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    let temp = PathBuf::from(temp);
    std::fs::write(&temp, json).with_context(format!("writing {}", temp.display()))?;
    std::fs::rename(&temp, path).with_context(format!("replacing {}", path.display()))?;
    Ok(())
}
