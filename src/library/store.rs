//! One JSON file per inspected title.

use std::path::PathBuf;
use tracing::debug;

use super::write_json_atomic;
use crate::error::{Error, Result, ResultExt};
use crate::model::LibraryEntry;

/// Directory of `<title>.json` entry files.
#[derive(Debug, Clone)]
pub struct EntryStore {
    dir: PathBuf,
}

impl EntryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn entry_path(&self, title: &str) -> PathBuf {
        self.dir.join(format!("{title}.json"))
    }

    pub fn exists(&self, title: &str) -> bool {
        self.entry_path(title).is_file()
    }

    pub fn load(&self, title: &str) -> Result<LibraryEntry> {
        self.load_optional(title)?
            .ok_or_else(|| Error::EntryNotFound(title.to_string()))
    }

    /// `None` when the title was never saved.
    pub fn load_optional(&self, title: &str) -> Result<Option<LibraryEntry>> {
        let path = self.entry_path(title);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::Io(e).context(format!("reading {}", path.display()))),
        };
        let entry: LibraryEntry = serde_json::from_slice(&bytes).with_context(format!("parsing {}", path.display()))?;
        Ok(Some(entry))
    }

    pub fn save(&self, entry: &LibraryEntry) -> Result<()> {
        let path = self.entry_path(&entry.title);
        write_json_atomic(&path, entry)?;
        debug!(
            target: "library::store",
            title = %entry.title,
            file = %path.display(),
            "Saved entry"
        );
        Ok(())
    }

    /// Delete a stored entry; returns whether there was one.
    pub fn delete(&self, title: &str) -> Result<bool> {
        let path = self.entry_path(title);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!(target: "library::store", title, "Deleted entry");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::Io(e).context(format!("deleting {}", path.display()))),
        }
    }

    /// Store the entry of `old` under `new`, retitled.
    pub fn rename(&self, old: &str, new: &str) -> Result<()> {
        let mut entry = self.load(old)?;
        entry.title = new.to_string();
        self.save(&entry)?;
        self.delete(old)?;
        Ok(())
    }
}
