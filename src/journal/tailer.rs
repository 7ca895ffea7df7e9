//! Incremental journal tailer.
//!
//! Follows the newest journal file, reads lines appended since the last read
//! pass, and hands decoded faction observations to registered sinks.

use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};

use super::decoder::{FactionObservation, LineDecoder, LogRecord};
use super::error::TailError;
use super::position::PositionTracker;
use super::resolver::{same_file, FileCandidate, FileSetResolver};
use super::sink::EventSink;
use super::watcher::ChangeEvent;

/// Lifecycle of the tailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailerState {
    /// No journal file known yet.
    Idle,
    /// Following the active file.
    Tailing,
    /// Flushing the old file before adopting a newer one.
    Switching,
}

/// Outcome of one or more read passes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Complete lines consumed.
    pub lines: usize,
    /// Lines decoded into records.
    pub records: usize,
    /// Observations dispatched to sinks.
    pub observations: usize,
    /// Lines skipped because they failed to decode.
    pub decode_errors: usize,
    /// Batches dispatched.
    pub batches: usize,
}

impl PassSummary {
    fn absorb(&mut self, other: PassSummary) {
        self.lines += other.lines;
        self.records += other.records;
        self.observations += other.observations;
        self.decode_errors += other.decode_errors;
        self.batches += other.batches;
    }
}

/// Follows a rotating set of journal files.
///
/// Owns the read position. All entry points take `&mut self`, so read passes
/// are serialized by whoever owns the tailer.
pub struct JournalTailer {
    resolver: FileSetResolver,
    decoder: LineDecoder,
    tracker: PositionTracker,
    state: TailerState,
    sinks: Vec<Box<dyn EventSink>>,
}

impl std::fmt::Debug for JournalTailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JournalTailer")
            .field("resolver", &self.resolver)
            .field("tracker", &self.tracker)
            .field("state", &self.state)
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl JournalTailer {
    #[must_use]
    pub fn new(resolver: FileSetResolver) -> Self {
        Self {
            resolver,
            decoder: LineDecoder::new(),
            tracker: PositionTracker::new(),
            state: TailerState::Idle,
            sinks: Vec::new(),
        }
    }

    /// Register a sink. Sinks receive batches in registration order.
    pub fn add_sink(&mut self, sink: impl EventSink + 'static) {
        self.sinks.push(Box::new(sink));
    }

    #[must_use]
    pub fn state(&self) -> TailerState {
        self.state
    }

    #[must_use]
    pub fn resolver(&self) -> &FileSetResolver {
        &self.resolver
    }

    /// The file currently being followed.
    #[must_use]
    pub fn active_file(&self) -> Option<&Path> {
        self.tracker.identity()
    }

    /// Byte offset consumed so far in the active file.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.tracker.current_offset()
    }

    fn transition(&mut self, new_state: TailerState) {
        if self.state != new_state {
            tracing::debug!(from = ?self.state, to = ?new_state, "Tailer state transition");
            self.state = new_state;
        }
    }

    /// Resolve the current journal and read what it already holds.
    ///
    /// Finding no journal is not an error: the tailer stays idle and waits
    /// for a creation notification or poll.
    ///
    /// # Errors
    ///
    /// Returns an error if the initial read pass of a found file fails.
    pub async fn start(&mut self) -> Result<PassSummary, TailError> {
        match self.resolver.resolve(None) {
            Ok(candidate) => self.switch_to(candidate.path).await,
            Err(e) => {
                tracing::info!(error = %e, "No journal file found initially, waiting");
                Ok(PassSummary::default())
            }
        }
    }

    /// React to one change notification.
    ///
    /// # Errors
    ///
    /// Returns an error if a read pass fails. The tailer stays usable.
    pub async fn handle(&mut self, event: &ChangeEvent) -> Result<PassSummary, TailError> {
        match event {
            ChangeEvent::Created(path) => self.on_created(path).await,
            ChangeEvent::Modified(path) => self.on_modified(path).await,
        }
    }

    /// A new file appeared in the journal directory.
    ///
    /// Switches to it if it is newer than the active file, after flushing
    /// the active file.
    ///
    /// # Errors
    ///
    /// Returns an error if the read pass of the new file fails.
    pub async fn on_created(&mut self, path: &Path) -> Result<PassSummary, TailError> {
        if !self.resolver.matches(path) {
            return Ok(PassSummary::default());
        }

        let candidate = match FileCandidate::from_path(path) {
            Ok(candidate) => candidate,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Created file vanished");
                return Ok(PassSummary::default());
            }
        };
        let current = self
            .tracker
            .identity()
            .and_then(|p| FileCandidate::from_path(p).ok());

        if FileSetResolver::is_newer(&candidate, current.as_ref()) {
            self.switch_to(candidate.path).await
        } else {
            tracing::debug!(path = %path.display(), "Created file is not newer, ignoring");
            Ok(PassSummary::default())
        }
    }

    /// A file in the journal directory was written to.
    ///
    /// Only the active file is read. While idle, any journal write triggers a
    /// fresh resolution attempt.
    ///
    /// # Errors
    ///
    /// Returns an error if the read pass fails.
    pub async fn on_modified(&mut self, path: &Path) -> Result<PassSummary, TailError> {
        match self.tracker.identity() {
            Some(active) if same_file(active, path) => self.read_pass().await,
            Some(_) => {
                tracing::trace!(path = %path.display(), "Ignoring change to inactive file");
                Ok(PassSummary::default())
            }
            None if self.resolver.matches(path) => self.poll().await,
            None => Ok(PassSummary::default()),
        }
    }

    /// Re-resolve the current journal and drain the active file.
    ///
    /// Catches rotations whose creation notification was missed.
    ///
    /// # Errors
    ///
    /// Returns an error if a read pass fails.
    pub async fn poll(&mut self) -> Result<PassSummary, TailError> {
        match self.resolver.resolve(self.tracker.identity()) {
            Ok(candidate) if self.tracker.identity() != Some(candidate.path.as_path()) => {
                self.switch_to(candidate.path).await
            }
            Ok(_) => self.read_pass().await,
            Err(e) if self.state == TailerState::Idle => {
                tracing::debug!(error = %e, "Still no journal file");
                Ok(PassSummary::default())
            }
            Err(e) => {
                tracing::debug!(error = %e, "Journal resolution failed, draining active file");
                self.read_pass().await
            }
        }
    }

    /// Flush the active file, then adopt `path` and read it from the start.
    async fn switch_to(&mut self, path: PathBuf) -> Result<PassSummary, TailError> {
        let mut summary = PassSummary::default();

        if let Some(old) = self.tracker.identity().map(Path::to_path_buf) {
            self.transition(TailerState::Switching);
            match self.read_pass().await {
                Ok(flushed) => summary.absorb(flushed),
                Err(e) => tracing::error!(
                    path = %old.display(),
                    error = %e,
                    "Failed to flush previous journal"
                ),
            }
            tracing::info!(
                from = %old.display(),
                to = %path.display(),
                "Switching to new journal file"
            );
        } else {
            tracing::info!(path = %path.display(), "Monitoring journal");
        }

        self.tracker.switch_to(path);
        self.transition(TailerState::Tailing);
        summary.absorb(self.read_pass().await?);
        Ok(summary)
    }

    /// Drain complete lines appended to the active file since the last pass.
    ///
    /// A trailing line without a newline is left for the next pass. Lines
    /// that fail to decode are logged and skipped. Observations from the
    /// whole pass are dispatched as one batch.
    ///
    /// # Errors
    ///
    /// Returns [`TailError::FileOpen`] if the file cannot be opened, leaving
    /// the offset unchanged. Returns [`TailError::Io`] if reading fails
    /// midway; lines fully read before the failure are still committed and
    /// dispatched.
    pub async fn read_pass(&mut self) -> Result<PassSummary, TailError> {
        let Some(path) = self.tracker.identity().map(Path::to_path_buf) else {
            return Ok(PassSummary::default());
        };

        let mut file = File::open(&path).await.map_err(|e| TailError::FileOpen {
            path: path.clone(),
            source: e,
        })?;
        let io_err = |e: std::io::Error| TailError::Io {
            path: path.clone(),
            source: e,
        };

        let file_len = file.metadata().await.map_err(io_err)?.len();
        if file_len < self.tracker.current_offset() {
            tracing::warn!(
                path = %path.display(),
                old_offset = self.tracker.current_offset(),
                new_len = file_len,
                "Journal truncated, restarting from the beginning"
            );
            self.tracker.rewind();
        }
        let start = self.tracker.current_offset();
        if file_len == start {
            return Ok(PassSummary::default());
        }

        file.seek(std::io::SeekFrom::Start(start))
            .await
            .map_err(io_err)?;
        let mut reader = BufReader::new(file);

        let mut summary = PassSummary::default();
        let mut records = Vec::new();
        let mut consumed = start;
        let mut buf = Vec::new();
        let mut failure = None;

        loop {
            buf.clear();
            let bytes_read = match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            };

            if buf.last() != Some(&b'\n') {
                tracing::trace!(
                    path = %path.display(),
                    offset = consumed,
                    bytes = bytes_read,
                    "Partial line, waiting for the rest"
                );
                break;
            }

            consumed += bytes_read as u64;
            summary.lines += 1;

            let line = String::from_utf8_lossy(&buf);
            match self.decoder.decode(&line) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(e) => {
                    summary.decode_errors += 1;
                    tracing::warn!(
                        path = %path.display(),
                        offset = consumed - bytes_read as u64,
                        error = %e,
                        "Skipping undecodable journal line"
                    );
                }
            }
        }

        self.tracker.advance_to(consumed);
        summary.records = records.len();
        self.dispatch(records, &mut summary);

        match failure {
            Some(e) => Err(io_err(e)),
            None => Ok(summary),
        }
    }

    fn dispatch(&mut self, records: Vec<LogRecord>, summary: &mut PassSummary) {
        let mut batch: Vec<FactionObservation> = Vec::new();
        for record in records {
            tracing::info!(
                event = record.kind.tag(),
                system = %record.system,
                security = %record.security,
                economy = %record.economy,
                time = %record.last_updated(),
                factions = record.factions.len(),
                "System arrival detected"
            );
            batch.extend(record.factions);
        }

        if batch.is_empty() {
            return;
        }
        summary.observations = batch.len();
        summary.batches = 1;

        if let Some((last, rest)) = self.sinks.split_last_mut() {
            for sink in rest {
                sink.deliver(batch.clone());
            }
            last.deliver(batch);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    use crate::journal::resolver::DEFAULT_PATTERN;

    type Batches = Arc<Mutex<Vec<Vec<FactionObservation>>>>;

    fn jump_line(system: &str, factions: &[(&str, f64)]) -> String {
        let factions: Vec<String> = factions
            .iter()
            .map(|(name, influence)| {
                format!(r#"{{"Name":"{name}","FactionState":"None","Influence":{influence}}}"#)
            })
            .collect();
        format!(
            r#"{{"timestamp":"2024-01-01T12:00:00Z","event":"FSDJump","StarSystem":"{system}","Factions":[{}]}}"#,
            factions.join(",")
        )
    }

    fn append(path: &Path, text: &str) {
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .unwrap();
        file.write_all(text.as_bytes()).unwrap();
    }

    fn tailer_with_recorder(dir: &Path) -> (JournalTailer, Batches) {
        let resolver = FileSetResolver::new(dir, DEFAULT_PATTERN).unwrap();
        let mut tailer = JournalTailer::new(resolver);
        let batches: Batches = Arc::default();
        let recorder = Arc::clone(&batches);
        tailer.add_sink(move |batch: Vec<FactionObservation>| recorder.lock().unwrap().push(batch));
        (tailer, batches)
    }

    fn systems(batches: &Batches) -> Vec<String> {
        batches
            .lock()
            .unwrap()
            .iter()
            .flatten()
            .map(|obs| format!("{}/{}", obs.system, obs.faction))
            .collect()
    }

    #[tokio::test]
    async fn test_start_reads_existing_content() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("Journal.2024-01-01T120000.01.log");
        append(&path, &format!("{}\n", jump_line("Sol", &[("A", 0.6), ("B", 0.4)])));

        let (mut tailer, batches) = tailer_with_recorder(temp_dir.path());
        let summary = tailer.start().await.unwrap();

        assert_eq!(tailer.state(), TailerState::Tailing);
        assert_eq!(tailer.active_file(), Some(path.as_path()));
        assert_eq!(summary.observations, 2);
        assert_eq!(summary.batches, 1);
        assert_eq!(systems(&batches), vec!["Sol/A", "Sol/B"]);
    }

    #[tokio::test]
    async fn test_start_without_journal_stays_idle() {
        let temp_dir = TempDir::new().unwrap();
        let (mut tailer, batches) = tailer_with_recorder(temp_dir.path());

        let summary = tailer.start().await.unwrap();
        assert_eq!(summary, PassSummary::default());
        assert_eq!(tailer.state(), TailerState::Idle);
        assert!(tailer.active_file().is_none());
        assert!(batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_start_with_missing_directory_stays_idle() {
        let temp_dir = TempDir::new().unwrap();
        let (mut tailer, _batches) = tailer_with_recorder(&temp_dir.path().join("missing"));

        tailer.start().await.unwrap();
        assert_eq!(tailer.state(), TailerState::Idle);
    }

    #[tokio::test]
    async fn test_offset_tracks_consumed_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("Journal.01.log");
        let first = format!("{}\n", jump_line("Sol", &[("A", 1.0)]));
        append(&path, &first);

        let (mut tailer, batches) = tailer_with_recorder(temp_dir.path());
        tailer.start().await.unwrap();
        assert_eq!(tailer.offset(), first.len() as u64);

        // Nothing new: offset unchanged, nothing dispatched.
        let summary = tailer.read_pass().await.unwrap();
        assert_eq!(summary, PassSummary::default());
        assert_eq!(tailer.offset(), first.len() as u64);

        let second = format!("{}\n", jump_line("Alpha Centauri", &[("C", 0.5)]));
        append(&path, &second);
        tailer.on_modified(&path).await.unwrap();

        assert_eq!(tailer.offset(), (first.len() + second.len()) as u64);
        assert_eq!(systems(&batches), vec!["Sol/A", "Alpha Centauri/C"]);
    }

    #[tokio::test]
    async fn test_partial_line_is_not_consumed() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("Journal.01.log");
        let complete = format!("{}\n", jump_line("Sol", &[("A", 1.0)]));
        let partial = jump_line("Lave", &[("B", 1.0)]);
        let (head, tail) = partial.split_at(40);
        append(&path, &complete);
        append(&path, head);

        let (mut tailer, batches) = tailer_with_recorder(temp_dir.path());
        tailer.start().await.unwrap();
        assert_eq!(tailer.offset(), complete.len() as u64);
        assert_eq!(systems(&batches), vec!["Sol/A"]);

        append(&path, &format!("{tail}\n"));
        let summary = tailer.read_pass().await.unwrap();

        assert_eq!(summary.decode_errors, 0);
        assert_eq!(summary.observations, 1);
        assert_eq!(tailer.offset(), (complete.len() + partial.len() + 1) as u64);
        assert_eq!(systems(&batches), vec!["Sol/A", "Lave/B"]);
    }

    #[tokio::test]
    async fn test_decode_error_skips_line() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("Journal.01.log");
        let content = format!(
            "{}\n{{\"event\":\"FSDJump\",\"StarSys\n{}\n",
            jump_line("Sol", &[("A", 1.0)]),
            jump_line("Lave", &[("B", 1.0)])
        );
        append(&path, &content);

        let (mut tailer, batches) = tailer_with_recorder(temp_dir.path());
        let summary = tailer.start().await.unwrap();

        assert_eq!(summary.lines, 3);
        assert_eq!(summary.decode_errors, 1);
        assert_eq!(summary.records, 2);
        assert_eq!(summary.batches, 1);
        assert_eq!(tailer.offset(), content.len() as u64);
        assert_eq!(systems(&batches), vec!["Sol/A", "Lave/B"]);
    }

    #[tokio::test]
    async fn test_irrelevant_lines_dispatch_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("Journal.01.log");
        let content = concat!(
            r#"{"timestamp":"2024-01-01T12:00:00Z","event":"Fileheader","part":1}"#,
            "\n",
            r#"{"timestamp":"2024-01-01T12:00:01Z","event":"Location","StarSystem":"Sol"}"#,
            "\n"
        );
        append(&path, content);

        let (mut tailer, batches) = tailer_with_recorder(temp_dir.path());
        let summary = tailer.start().await.unwrap();

        assert_eq!(summary.lines, 2);
        assert_eq!(summary.records, 1);
        assert_eq!(summary.batches, 0);
        assert!(batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_failure_keeps_offset() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("Journal.01.log");
        let line = format!("{}\n", jump_line("Sol", &[("A", 1.0)]));
        append(&path, &line);

        let (mut tailer, _batches) = tailer_with_recorder(temp_dir.path());
        tailer.start().await.unwrap();
        std::fs::remove_file(&path).unwrap();

        let result = tailer.read_pass().await;
        assert!(matches!(result, Err(TailError::FileOpen { .. })));
        assert_eq!(tailer.offset(), line.len() as u64);
        assert_eq!(tailer.state(), TailerState::Tailing);
    }

    #[tokio::test]
    async fn test_truncation_restarts_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("Journal.01.log");
        append(
            &path,
            &format!(
                "{}\n{}\n",
                jump_line("Sol", &[("A", 1.0)]),
                jump_line("Lave", &[("B", 1.0)])
            ),
        );

        let (mut tailer, batches) = tailer_with_recorder(temp_dir.path());
        tailer.start().await.unwrap();

        let replacement = format!("{}\n", jump_line("Diso", &[("C", 1.0)]));
        std::fs::write(&path, &replacement).unwrap();
        tailer.read_pass().await.unwrap();

        assert_eq!(tailer.offset(), replacement.len() as u64);
        assert_eq!(systems(&batches), vec!["Sol/A", "Lave/B", "Diso/C"]);
    }

    #[tokio::test]
    async fn test_modified_for_inactive_file_is_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let active = temp_dir.path().join("Journal.02.log");
        let stale = temp_dir.path().join("Journal.01.log");
        append(&stale, &format!("{}\n", jump_line("Old", &[("X", 1.0)])));
        append(&active, "");
        filetime::set_file_mtime(&stale, filetime::FileTime::from_unix_time(1_000, 0)).unwrap();

        let (mut tailer, batches) = tailer_with_recorder(temp_dir.path());
        tailer.start().await.unwrap();
        assert_eq!(tailer.active_file(), Some(active.as_path()));

        let summary = tailer.on_modified(&stale).await.unwrap();
        assert_eq!(summary, PassSummary::default());
        assert!(batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_relative_dir_reads_on_absolute_modified_path() {
        let temp_dir = tempfile::Builder::new()
            .prefix("journals-")
            .tempdir_in(".")
            .unwrap();
        let relative = PathBuf::from(temp_dir.path().file_name().unwrap());
        let name = "Journal.2024-01-01T120000.01.log";
        append(&relative.join(name), "");

        let (mut tailer, batches) = tailer_with_recorder(&relative);
        tailer.start().await.unwrap();

        append(&relative.join(name), &format!("{}\n", jump_line("Sol", &[("A", 1.0)])));
        let reported = std::fs::canonicalize(temp_dir.path().join(name)).unwrap();
        let summary = tailer.on_modified(&reported).await.unwrap();

        assert_eq!(summary.observations, 1);
        assert_eq!(systems(&batches), vec!["Sol/A"]);
    }

    #[tokio::test]
    async fn test_rotation_flushes_old_file_first() {
        let temp_dir = TempDir::new().unwrap();
        let old = temp_dir.path().join("Journal.2024-01-01T120000.01.log");
        append(&old, &format!("{}\n", jump_line("Sol", &[("A", 1.0)])));
        filetime::set_file_mtime(&old, filetime::FileTime::from_unix_time(1_000, 0)).unwrap();

        let (mut tailer, batches) = tailer_with_recorder(temp_dir.path());
        tailer.start().await.unwrap();

        // Unread tail of the old file, then a newer file appears.
        append(&old, &format!("{}\n", jump_line("Lave", &[("B", 1.0)])));
        filetime::set_file_mtime(&old, filetime::FileTime::from_unix_time(1_000, 0)).unwrap();
        let new = temp_dir.path().join("Journal.2024-01-01T130000.01.log");
        append(&new, &format!("{}\n", jump_line("Diso", &[("C", 1.0)])));
        filetime::set_file_mtime(&new, filetime::FileTime::from_unix_time(2_000, 0)).unwrap();

        tailer.on_created(&new).await.unwrap();

        assert_eq!(tailer.state(), TailerState::Tailing);
        assert_eq!(tailer.active_file(), Some(new.as_path()));
        assert_eq!(systems(&batches), vec!["Sol/A", "Lave/B", "Diso/C"]);
    }

    #[tokio::test]
    async fn test_created_older_file_is_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let current = temp_dir.path().join("Journal.02.log");
        append(&current, "");
        filetime::set_file_mtime(&current, filetime::FileTime::from_unix_time(5_000, 0)).unwrap();

        let (mut tailer, _batches) = tailer_with_recorder(temp_dir.path());
        tailer.start().await.unwrap();

        let older = temp_dir.path().join("Journal.01.log");
        append(&older, "");
        filetime::set_file_mtime(&older, filetime::FileTime::from_unix_time(4_000, 0)).unwrap();

        tailer.on_created(&older).await.unwrap();
        assert_eq!(tailer.active_file(), Some(current.as_path()));
    }

    #[tokio::test]
    async fn test_created_non_journal_is_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let (mut tailer, _batches) = tailer_with_recorder(temp_dir.path());
        tailer.start().await.unwrap();

        let status = temp_dir.path().join("Status.json");
        std::fs::write(&status, "{}").unwrap();
        tailer.on_created(&status).await.unwrap();

        assert_eq!(tailer.state(), TailerState::Idle);
    }

    #[tokio::test]
    async fn test_poll_picks_up_missed_rotation() {
        let temp_dir = TempDir::new().unwrap();
        let old = temp_dir.path().join("Journal.01.log");
        append(&old, "");
        filetime::set_file_mtime(&old, filetime::FileTime::from_unix_time(1_000, 0)).unwrap();

        let (mut tailer, batches) = tailer_with_recorder(temp_dir.path());
        tailer.start().await.unwrap();

        let new = temp_dir.path().join("Journal.02.log");
        append(&new, &format!("{}\n", jump_line("Sol", &[("A", 1.0)])));
        filetime::set_file_mtime(&new, filetime::FileTime::from_unix_time(2_000, 0)).unwrap();

        tailer.poll().await.unwrap();
        assert_eq!(tailer.active_file(), Some(new.as_path()));
        assert_eq!(systems(&batches), vec!["Sol/A"]);
    }

    #[tokio::test]
    async fn test_every_sink_receives_batch() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("Journal.01.log");
        append(&path, &format!("{}\n", jump_line("Sol", &[("A", 1.0)])));

        let (mut tailer, first) = tailer_with_recorder(temp_dir.path());
        let second: Batches = Arc::default();
        let recorder = Arc::clone(&second);
        tailer.add_sink(move |batch: Vec<FactionObservation>| recorder.lock().unwrap().push(batch));

        tailer.start().await.unwrap();
        assert_eq!(systems(&first), vec!["Sol/A"]);
        assert_eq!(systems(&second), vec!["Sol/A"]);
    }

    #[tokio::test]
    async fn test_pass_batches_all_records_together() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("Journal.01.log");
        append(
            &path,
            &format!(
                "{}\n{}\n",
                jump_line("Sol", &[("A", 0.5), ("B", 0.5)]),
                jump_line("Lave", &[("C", 1.0)])
            ),
        );

        let (mut tailer, batches) = tailer_with_recorder(temp_dir.path());
        tailer.start().await.unwrap();

        let batches = batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 3);
    }
}
