//! Read-position bookkeeping for the active journal file.

use std::path::{Path, PathBuf};

/// Tracks how far into the active file has been consumed.
///
/// The offset only moves forward for a given file. Switching to another file
/// resets it to 0.
#[derive(Debug, Default)]
pub struct PositionTracker {
    identity: Option<PathBuf>,
    offset: u64,
}

impl PositionTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// File the offset belongs to, if any.
    #[must_use]
    pub fn identity(&self) -> Option<&Path> {
        self.identity.as_deref()
    }

    #[must_use]
    pub fn current_offset(&self) -> u64 {
        self.offset
    }

    /// Adopt a new file, starting from the beginning.
    pub fn switch_to(&mut self, identity: PathBuf) {
        tracing::debug!(
            from = ?self.identity,
            to = %identity.display(),
            "Position reset for new file"
        );
        self.identity = Some(identity);
        self.offset = 0;
    }

    /// Move the offset forward.
    ///
    /// Returns `false` and leaves the offset untouched if `offset` is behind
    /// the current position.
    pub fn advance_to(&mut self, offset: u64) -> bool {
        if offset < self.offset {
            tracing::warn!(
                current = self.offset,
                requested = offset,
                "Refusing to move read position backwards"
            );
            return false;
        }
        self.offset = offset;
        true
    }

    /// Start the same file over from the beginning (after truncation).
    pub fn rewind(&mut self) {
        self.offset = 0;
    }
}
