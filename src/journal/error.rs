//! Journal error types.

use std::path::PathBuf;

/// Errors from resolving the active journal file.
///
/// Both variants are recoverable: the tailer stays idle and retries on the
/// next notification or poll tick.
#[derive(thiserror::Error, Debug)]
pub enum ResolveError {
    /// Journal directory is missing or cannot be listed.
    #[error("Journal directory unavailable: {path}: {source}")]
    DirectoryUnavailable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Directory exists but holds no file matching the pattern.
    #[error("No journal file matching {pattern} in {dir}")]
    NoCandidateFile { dir: PathBuf, pattern: String },
}

/// Errors from decoding a single journal line.
#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    /// Line is not valid JSON, or a field has the wrong type.
    #[error("Malformed journal line: {0}")]
    Json(#[from] serde_json::Error),

    /// A recognized event is missing a field it cannot do without.
    #[error("{event} event missing required field {field}")]
    MissingField {
        event: &'static str,
        field: &'static str,
    },
}

/// Errors surfaced by the journal tailer.
#[derive(thiserror::Error, Debug)]
pub enum TailError {
    /// Configuration supplied at construction is unusable.
    #[error("Invalid journal configuration: {0}")]
    InvalidConfig(String),

    /// Active file could not be opened for a read pass.
    #[error("Failed to open journal {path}: {source}")]
    FileOpen {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Active file failed mid-read.
    #[error("I/O error reading journal {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Resolving the current file failed.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Notify watcher error.
    #[error("File watcher error: {0}")]
    Notify(#[from] notify::Error),
}

impl TailError {
    /// Whether the error leaves the tailer able to retry on the next event.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, TailError::InvalidConfig(_) | TailError::Notify(_))
    }
}
