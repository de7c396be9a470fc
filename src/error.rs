//! Application-wide error types.
//!
//! Library modules return [`Error`] through the [`Result`] alias, while the
//! CLI uses `anyhow` for convenient propagation to `main`.
//!
//! Only [`Error::Scan`] and [`Error::Cancelled`] abort an inspection pass.
//! Per-file failures (`Probe`, `TagRead`, `Cue`) are produced by the
//! collaborators, then downgraded by the inspector into diagnostics.

use std::path::PathBuf;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level application error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored entry or registry could not be (de)serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The library root could not be listed, or held no files at all
    #[error("Cannot scan {root}: {message}")]
    Scan { root: PathBuf, message: String },

    /// Media prober failed for one file
    #[error("Probe failed for {path}: {message}")]
    Probe { path: PathBuf, message: String },

    /// Audio tags could not be read for one file
    #[error("Tag read failed for {path}: {message}")]
    TagRead { path: PathBuf, message: String },

    /// Cue sheet could not be read or parsed
    #[error("Cue sheet error in {path}: {message}")]
    Cue { path: PathBuf, message: String },

    /// No library entry with this title
    #[error("No library entry titled {0:?}")]
    EntryNotFound(String),

    /// A library entry with this title already exists
    #[error("Library entry {0:?} already exists")]
    EntryExists(String),

    /// The folder already belongs to a registered title
    #[error("{path} is already registered as {title:?}")]
    PathRegistered { path: PathBuf, title: String },

    /// Title cannot be used as a file name
    #[error("Invalid title {0:?}")]
    InvalidTitle(String),

    /// No video section with this directory key
    #[error("No video section for directory {0:?}")]
    SectionNotFound(String),

    /// No episode at this path
    #[error("No episode at {0}")]
    EpisodeNotFound(String),

    /// A reorder request was not a permutation of the section's episodes
    #[error("Invalid episode order: {0}")]
    InvalidOrder(String),

    /// The pass was aborted by the caller
    #[error("Inspection cancelled")]
    Cancelled,

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a scan failure.
    pub fn scan(root: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Scan {
            root: root.into(),
            message: message.into(),
        }
    }

    /// Create a probe failure.
    pub fn probe(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Probe {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a tag read failure.
    pub fn tag_read(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::TagRead {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a cue sheet error.
    pub fn cue(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Cue {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Io(e).context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, serde_json::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Json(e).context(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_error_display() {
        let err = Error::scan("/anime/Missing", "no such directory");
        let msg = err.to_string();
        assert!(msg.contains("/anime/Missing"));
        assert!(msg.contains("no such directory"));
    }

    #[test]
    fn test_probe_error_display() {
        let err = Error::probe("/anime/ep01.mkv", "invalid data");
        let msg = err.to_string();
        assert!(msg.contains("ep01.mkv"));
        assert!(msg.contains("invalid data"));
    }

    #[test]
    fn test_result_ext() {
        let result: Result<()> = Err(Error::EntryNotFound("Haruhi".to_string()));
        let with_ctx = result.with_context("while renaming");
        let msg = with_ctx.unwrap_err().to_string();
        assert!(msg.contains("while renaming"));
        assert!(msg.contains("Haruhi"));
    }

    #[test]
    fn test_io_result_ext() {
        let result: std::io::Result<()> = Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));
        let err = result.with_context("reading registry").unwrap_err();
        assert!(err.to_string().contains("reading registry"));
    }
}
