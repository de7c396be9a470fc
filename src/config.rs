//! User settings, stored as TOML.
//!
//! The file lives at `<config dir>/anime-inspector/config.toml`, where the
//! config dir is the platform one reported by `dirs` (`~/.config` on Linux,
//! `~/Library/Application Support` on macOS, `%APPDATA%` on Windows).
//!
//! Every table and key may be left out; whatever is missing takes the
//! default shown by `anime-inspector config`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "anime-inspector";
const CONFIG_FILE: &str = "config.toml";

/// All settings, one table per concern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub inspector: InspectorConfig,
    pub probe: ProbeConfig,
    pub library: LibraryConfig,
}

/// `[inspector]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectorConfig {
    /// Folders with more files than this need `--force`
    pub confirm_threshold: usize,

    /// Probes or tag reads in flight at once
    pub probe_concurrency: usize,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            confirm_threshold: 1000,
            probe_concurrency: 8,
        }
    }
}

/// `[probe]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// ffprobe executable, looked up on PATH when not absolute
    pub ffprobe_path: PathBuf,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            ffprobe_path: PathBuf::from("ffprobe"),
        }
    }
}

/// `[library]`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Where the title registry and entry files live (default: OS data dir)
    pub data_dir: Option<PathBuf>,
}

impl LibraryConfig {
    /// Configured data directory, else the OS default.
    pub fn resolved_data_dir(&self) -> Option<PathBuf> {
        self.data_dir.clone().or_else(default_data_dir)
    }
}

// ============================================================================
// Locations
// ============================================================================

/// `<config dir>/anime-inspector`
pub fn config_dir() -> Option<PathBuf> {
    Some(dirs::config_dir()?.join(APP_DIR))
}

/// `<config dir>/anime-inspector/config.toml`
pub fn config_path() -> Option<PathBuf> {
    Some(config_dir()?.join(CONFIG_FILE))
}

/// `<data dir>/anime-inspector`
pub fn default_data_dir() -> Option<PathBuf> {
    Some(dirs::data_dir()?.join(APP_DIR))
}

// ============================================================================
// Reading and writing
// ============================================================================

/// Settings from the user's config file.
///
/// Never fails: a missing, unreadable or malformed file is logged and the
/// defaults are used instead.
pub fn load() -> Config {
    match config_path() {
        Some(path) => load_from(&path),
        None => {
            tracing::warn!(target: "config", "No config directory on this system; using default settings");
            Config::default()
        }
    }
}

/// Settings from `path`, with the same fallbacks as [`load`].
pub fn load_from(path: &Path) -> Config {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(target: "config", path = %path.display(), "No config file; using default settings");
            return Config::default();
        }
        Err(e) => {
            tracing::error!(target: "config", path = %path.display(), error = %e, "Cannot read config file; using default settings");
            return Config::default();
        }
    };

    toml::from_str(&text).unwrap_or_else(|e| {
        tracing::error!(target: "config", path = %path.display(), error = %e, "Malformed config file; using default settings");
        Config::default()
    })
}

/// Write `config` to the user's config file.
pub fn save(config: &Config) -> Result<(), ConfigError> {
    let dir = config_dir().ok_or(ConfigError::NoConfigDir)?;
    save_to(config, &dir)
}

/// Write `config` as `config.toml` inside `dir`, creating `dir` if needed.
///
/// The file is replaced through a temp file and a rename.
pub fn save_to(config: &Config, dir: &Path) -> Result<(), ConfigError> {
    std::fs::create_dir_all(dir).map_err(|e| ConfigError::Io(dir.to_path_buf(), e))?;

    let text = toml::to_string_pretty(config)?;
    let path = dir.join(CONFIG_FILE);
    let staged = dir.join(format!("{CONFIG_FILE}.tmp"));

    std::fs::write(&staged, text).map_err(|e| ConfigError::Io(staged.clone(), e))?;
    std::fs::rename(&staged, &path).map_err(|e| ConfigError::Io(path.clone(), e))?;

    tracing::info!(target: "config", path = %path.display(), "Config saved");
    Ok(())
}

/// Failures while writing the config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("This system has no config directory")]
    NoConfigDir,

    #[error("Cannot encode settings as TOML: {0}")]
    Encode(#[from] toml::ser::Error),

    #[error("Cannot write {}: {}", .0.display(), .1)]
    Io(PathBuf, std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_render_every_table() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        assert!(text.contains("[inspector]"));
        assert!(text.contains("[probe]"));
        assert!(text.contains("confirm_threshold = 1000"));
        assert!(text.contains("ffprobe_path = \"ffprobe\""));
    }

    #[test]
    fn test_missing_keys_take_defaults() {
        let config: Config = toml::from_str("[inspector]\nconfirm_threshold = 5000\n").unwrap();

        assert_eq!(config.inspector.confirm_threshold, 5000);
        assert_eq!(config.inspector.probe_concurrency, 8);
        assert_eq!(config.probe.ffprobe_path, PathBuf::from("ffprobe"));
        assert!(config.library.data_dir.is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.inspector.probe_concurrency = 2;
        config.probe.ffprobe_path = PathBuf::from("/opt/ffmpeg/bin/ffprobe");
        config.library.data_dir = Some(PathBuf::from("/data/anime"));

        save_to(&config, dir.path()).unwrap();
        assert!(!dir.path().join("config.toml.tmp").exists());

        let loaded = load_from(&dir.path().join(CONFIG_FILE));
        assert_eq!(loaded.inspector.probe_concurrency, 2);
        assert_eq!(loaded.probe.ffprobe_path, PathBuf::from("/opt/ffmpeg/bin/ffprobe"));
        assert_eq!(loaded.library.resolved_data_dir(), Some(PathBuf::from("/data/anime")));
    }

    #[test]
    fn test_malformed_or_missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        assert_eq!(load_from(&path).inspector.confirm_threshold, 1000);

        std::fs::write(&path, "[inspector\nconfirm_threshold = ").unwrap();
        assert_eq!(load_from(&path).inspector.confirm_threshold, 1000);
    }

    /// Records the target of every event it sees.
    struct Targets(std::sync::Arc<std::sync::Mutex<Vec<String>>>);

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for Targets {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
            self.0.lock().unwrap().push(event.metadata().target().to_string());
        }
    }

    #[test]
    fn test_log_events_use_config_target() {
        use tracing_subscriber::prelude::*;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "not = [toml").unwrap();

        let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::registry().with(Targets(seen.clone()));
        tracing::subscriber::with_default(subscriber, || {
            load_from(&path);
            save_to(&Config::default(), dir.path()).unwrap();
        });

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|target| target == "config"));
    }
}
