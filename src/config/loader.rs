//! Configuration file loader.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::journal::DEFAULT_PATTERN;

/// Monitor configuration loaded from a TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Directory the game writes its journals to. No default: the location
    /// differs per install and platform.
    pub journal_dir: Option<PathBuf>,
    /// Filename glob for journal files.
    pub file_pattern: String,
    /// How often to re-resolve and drain the journal without a notification.
    pub poll_interval_ms: u64,
    /// Debounce window for filesystem notifications.
    pub debounce_ms: u64,
    /// Append dispatched observations to this CSV file.
    pub csv_output: Option<PathBuf>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            journal_dir: None,
            file_pattern: DEFAULT_PATTERN.to_string(),
            poll_interval_ms: 2000,
            debounce_ms: 100,
            csv_output: None,
        }
    }
}

impl MonitorConfig {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Journal directory with a leading `~` expanded.
    #[must_use]
    pub fn journal_dir(&self) -> Option<PathBuf> {
        self.journal_dir.as_deref().map(expand_home)
    }

    /// CSV output path with a leading `~` expanded.
    #[must_use]
    pub fn csv_output(&self) -> Option<PathBuf> {
        self.csv_output.as_deref().map(expand_home)
    }
}

/// Expand a leading `~` to the home directory.
fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir().map_or_else(|| path.to_path_buf(), |home| home.join(rest)),
        Err(_) => path.to_path_buf(),
    }
}

/// Per-project config file, looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = ".faction-journal.toml";

/// Directory under the platform config dir holding `config.toml`.
const USER_CONFIG_DIR: &str = "faction-journal";

/// Finds and parses the monitor config file.
///
/// The first existing file in the search order wins; files are never merged.
#[derive(Debug)]
pub struct ConfigLoader {
    search_paths: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Search `./.faction-journal.toml`, then
    /// `<config dir>/faction-journal/config.toml`.
    #[must_use]
    pub fn new() -> Self {
        let user = dirs::config_dir().map(|dir| dir.join(USER_CONFIG_DIR).join("config.toml"));
        Self {
            search_paths: std::iter::once(PathBuf::from(LOCAL_CONFIG_FILE))
                .chain(user)
                .collect(),
        }
    }

    /// Only consider `path`.
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            search_paths: vec![path],
        }
    }

    /// Locations checked, in order.
    #[must_use]
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// The config file [`load`](Self::load) would read, if any.
    #[must_use]
    pub fn find_config_file(&self) -> Option<&Path> {
        self.search_paths
            .iter()
            .map(PathBuf::as_path)
            .find(|path| path.is_file())
    }

    /// Parse the first config file found, or fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file found cannot be read or parsed.
    pub fn load(&self) -> Result<MonitorConfig, ConfigError> {
        let Some(path) = self.find_config_file() else {
            tracing::debug!(searched = ?self.search_paths, "No config file found, using defaults");
            return Ok(MonitorConfig::default());
        };

        tracing::debug!(path = %path.display(), "Loading config file");
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}
