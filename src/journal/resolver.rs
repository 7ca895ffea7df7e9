//! Journal file discovery.
//!
//! Lists the journal files in a directory and picks the one the game is
//! currently writing to.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use super::error::{ResolveError, TailError};

/// Filename pattern matching every journal file family.
pub const DEFAULT_PATTERN: &str = "Journal.*.log";

/// A journal file and its last-modified time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    pub path: PathBuf,
    pub modified: SystemTime,
}

impl FileCandidate {
    /// Stat a single file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file metadata cannot be read.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let modified = std::fs::metadata(path)?.modified()?;
        Ok(Self {
            path: path.to_path_buf(),
            modified,
        })
    }

    /// Modification time truncated to whole seconds.
    ///
    /// Journal writers and some filesystems only keep second precision, so
    /// files touched within the same second compare as equal.
    #[must_use]
    pub fn modified_secs(&self) -> u64 {
        self.modified
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs())
    }

    fn file_name(&self) -> &std::ffi::OsStr {
        self.path.file_name().unwrap_or_default()
    }
}

/// Lists journal files in a directory and selects the current one.
#[derive(Debug, Clone)]
pub struct FileSetResolver {
    dir: PathBuf,
    pattern: glob::Pattern,
}

impl FileSetResolver {
    /// Create a resolver for `dir` matching filenames against `pattern`.
    ///
    /// A relative `dir` is anchored at the current working directory, so
    /// paths built from it match the absolute paths filesystem notifications
    /// carry. If `dir` is a symbolic link or junction it is resolved to its
    /// target. The directory does not have to exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`TailError::InvalidConfig`] if `dir` is empty or `pattern` is
    /// not a valid glob.
    pub fn new(dir: impl Into<PathBuf>, pattern: &str) -> Result<Self, TailError> {
        let dir = dir.into();
        if dir.as_os_str().is_empty() {
            return Err(TailError::InvalidConfig(
                "journal directory must not be empty".to_string(),
            ));
        }
        if pattern.trim().is_empty() {
            return Err(TailError::InvalidConfig(
                "journal file pattern must not be empty".to_string(),
            ));
        }
        let pattern = glob::Pattern::new(pattern).map_err(|e| {
            TailError::InvalidConfig(format!("invalid journal file pattern {pattern:?}: {e}"))
        })?;

        let dir = std::path::absolute(&dir).map_err(|e| {
            TailError::InvalidConfig(format!(
                "cannot make journal directory {} absolute: {e}",
                dir.display()
            ))
        })?;

        Ok(Self {
            dir: resolve_link_target(dir),
            pattern,
        })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Whether `path` names a file of the journal family.
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| self.pattern.matches(name))
    }

    /// List matching files, most current first.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::DirectoryUnavailable`] if the directory cannot
    /// be read. An empty result is not an error here.
    pub fn candidates(&self) -> Result<Vec<FileCandidate>, ResolveError> {
        let entries =
            std::fs::read_dir(&self.dir).map_err(|e| ResolveError::DirectoryUnavailable {
                path: self.dir.clone(),
                source: e,
            })?;

        let mut candidates: Vec<FileCandidate> = entries
            .filter_map(Result::ok)
            .filter(|entry| self.matches(&entry.path()))
            .filter_map(|entry| {
                let metadata = entry.metadata().ok()?;
                if !metadata.is_file() {
                    return None;
                }
                Some(FileCandidate {
                    path: entry.path(),
                    modified: metadata.modified().ok()?,
                })
            })
            .collect();

        candidates.sort_by(|a, b| {
            (b.modified_secs(), b.file_name()).cmp(&(a.modified_secs(), a.file_name()))
        });
        Ok(candidates)
    }

    /// Pick the current journal file.
    ///
    /// The newest modification time wins. On a tie the `previous` file is
    /// kept; without one, the lexically greatest name wins, since names embed
    /// the session date and part number.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::DirectoryUnavailable`] or
    /// [`ResolveError::NoCandidateFile`].
    pub fn resolve(&self, previous: Option<&Path>) -> Result<FileCandidate, ResolveError> {
        self.candidates()?
            .into_iter()
            .max_by_key(|c| {
                (
                    c.modified_secs(),
                    previous.is_some_and(|p| c.path.as_path() == p),
                    c.file_name().to_os_string(),
                )
            })
            .ok_or_else(|| ResolveError::NoCandidateFile {
                dir: self.dir.clone(),
                pattern: self.pattern.as_str().to_string(),
            })
    }

    /// Whether `candidate` should replace `current` as the active file.
    ///
    /// Same rule as [`resolve`](Self::resolve): strictly newer wins, ties keep
    /// the current file.
    #[must_use]
    pub fn is_newer(candidate: &FileCandidate, current: Option<&FileCandidate>) -> bool {
        match current {
            None => true,
            Some(current) if same_file(&candidate.path, &current.path) => false,
            Some(current) => candidate.modified_secs() > current.modified_secs(),
        }
    }
}

/// Whether two paths name the same file.
///
/// Falls back to canonical paths when the spellings differ, e.g. one path
/// goes through a symlinked parent.
#[must_use]
pub fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Follow a symlinked or junctioned journal directory to its target.
fn resolve_link_target(dir: PathBuf) -> PathBuf {
    let is_link = std::fs::symlink_metadata(&dir)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false);

    if !is_link {
        tracing::debug!(dir = %dir.display(), "Using direct journal path");
        return dir;
    }

    match std::fs::canonicalize(&dir) {
        Ok(target) => {
            tracing::info!(
                link = %dir.display(),
                target = %target.display(),
                "Journal directory is a symbolic link or junction"
            );
            target
        }
        Err(e) => {
            tracing::error!(
                dir = %dir.display(),
                error = %e,
                "Failed to resolve journal directory link"
            );
            dir
        }
    }
}
