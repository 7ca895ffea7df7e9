//! Event loop driving a [`JournalTailer`].
//!
//! One task owns the tailer and processes change events and poll ticks one
//! at a time. [`MonitorHandle::stop`] ends the loop from anywhere.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::error::TailError;
use super::resolver::FileSetResolver;
use super::tailer::{JournalTailer, PassSummary};
use super::watcher::{ChangeEvent, JournalWatcher};
use crate::config::MonitorConfig;

/// Where change events come from.
enum ChangeSource {
    /// Watch the journal directory, retrying until it exists.
    Watch { debounce: Duration },
    /// Caller feeds events directly.
    Channel,
}

/// Stops a running [`JournalMonitor`].
#[derive(Debug, Clone)]
pub struct MonitorHandle {
    cancel: CancellationToken,
}

impl MonitorHandle {
    /// Ask the monitor to stop. Idempotent; a read pass in progress finishes
    /// first.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Owns a tailer and feeds it notifications until stopped.
pub struct JournalMonitor {
    tailer: JournalTailer,
    source: ChangeSource,
    watcher: Option<JournalWatcher>,
    events: Option<mpsc::UnboundedReceiver<ChangeEvent>>,
    poll_interval: Duration,
    cancel: CancellationToken,
}

impl JournalMonitor {
    /// Monitor that watches the tailer's journal directory itself.
    #[must_use]
    pub fn new(tailer: JournalTailer, poll_interval: Duration, debounce: Duration) -> Self {
        Self {
            tailer,
            source: ChangeSource::Watch { debounce },
            watcher: None,
            events: None,
            poll_interval,
            cancel: CancellationToken::new(),
        }
    }

    /// Monitor driven by an external change-event channel.
    #[must_use]
    pub fn with_events(
        tailer: JournalTailer,
        events: mpsc::UnboundedReceiver<ChangeEvent>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            tailer,
            source: ChangeSource::Channel,
            watcher: None,
            events: Some(events),
            poll_interval,
            cancel: CancellationToken::new(),
        }
    }

    /// Build a watching monitor from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TailError::InvalidConfig`] if no journal directory is
    /// configured or the file pattern is invalid.
    pub fn from_config(config: &MonitorConfig) -> Result<Self, TailError> {
        let dir = config.journal_dir().ok_or_else(|| {
            TailError::InvalidConfig("no journal directory configured".to_string())
        })?;
        let resolver = FileSetResolver::new(dir, &config.file_pattern)?;
        Ok(Self::new(
            JournalTailer::new(resolver),
            config.poll_interval(),
            config.debounce(),
        ))
    }

    /// Mutable access to the tailer, e.g. to register sinks before running.
    pub fn tailer_mut(&mut self) -> &mut JournalTailer {
        &mut self.tailer
    }

    #[must_use]
    pub fn handle(&self) -> MonitorHandle {
        MonitorHandle {
            cancel: self.cancel.clone(),
        }
    }

    /// Run until stopped. Returns the tailer for inspection.
    pub async fn run(mut self) -> JournalTailer {
        self.ensure_watching();
        log_outcome("start", self.tailer.start().await);

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                event = next_event(&mut self.events) => match event {
                    Some(event) => {
                        tracing::trace!(?event, "Journal change");
                        log_outcome("change", self.tailer.handle(&event).await);
                    }
                    None => {
                        tracing::debug!("Change source closed, polling only");
                        self.events = None;
                    }
                },
                _ = ticker.tick() => {
                    self.ensure_watching();
                    log_outcome("poll", self.tailer.poll().await);
                }
            }
        }

        if let Some(mut watcher) = self.watcher.take() {
            watcher.stop();
        }
        tracing::info!("Journal monitor stopped");
        self.tailer
    }

    /// Start the directory watch if it is not running yet and can be.
    fn ensure_watching(&mut self) {
        let ChangeSource::Watch { debounce } = self.source else {
            return;
        };
        if self.watcher.is_some() || !self.tailer.resolver().dir().is_dir() {
            return;
        }

        match JournalWatcher::new(self.tailer.resolver(), debounce) {
            Ok((watcher, events)) => {
                self.watcher = Some(watcher);
                self.events = Some(events);
            }
            Err(e) => tracing::error!(error = %e, "Failed to watch journal directory, polling only"),
        }
    }
}

impl std::fmt::Debug for JournalMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JournalMonitor")
            .field("tailer", &self.tailer)
            .field("watcher", &self.watcher)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}

async fn next_event(
    events: &mut Option<mpsc::UnboundedReceiver<ChangeEvent>>,
) -> Option<ChangeEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

fn log_outcome(trigger: &'static str, outcome: Result<PassSummary, TailError>) {
    match outcome {
        Ok(summary) if summary.batches > 0 => tracing::info!(
            trigger,
            observations = summary.observations,
            records = summary.records,
            "Factions processed"
        ),
        Ok(summary) if summary.decode_errors > 0 => tracing::debug!(
            trigger,
            decode_errors = summary.decode_errors,
            "Read pass finished with skipped lines"
        ),
        Ok(_) => {}
        Err(e) => tracing::error!(trigger, error = %e, "Error processing journal"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    use crate::journal::decoder::FactionObservation;
    use crate::journal::resolver::DEFAULT_PATTERN;

    #[test]
    fn test_from_config_requires_journal_dir() {
        let result = JournalMonitor::from_config(&MonitorConfig::default());
        assert!(matches!(result, Err(TailError::InvalidConfig(_))));
    }

    #[test]
    fn test_from_config_rejects_bad_pattern() {
        let config = MonitorConfig {
            journal_dir: Some("/tmp".into()),
            file_pattern: "Journal.[.log".to_string(),
            ..MonitorConfig::default()
        };
        assert!(matches!(
            JournalMonitor::from_config(&config),
            Err(TailError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_handle_stop_is_idempotent() {
        let resolver = FileSetResolver::new("/tmp", DEFAULT_PATTERN).unwrap();
        let (_tx, rx) = mpsc::unbounded_channel();
        let monitor =
            JournalMonitor::with_events(JournalTailer::new(resolver), rx, Duration::from_secs(1));

        let handle = monitor.handle();
        assert!(!handle.is_stopped());
        handle.stop();
        handle.stop();
        assert!(handle.is_stopped());
    }

    #[tokio::test]
    async fn test_run_processes_events_until_stopped() {
        let temp_dir = TempDir::new().unwrap();
        let resolver = FileSetResolver::new(temp_dir.path(), DEFAULT_PATTERN).unwrap();
        let mut tailer = JournalTailer::new(resolver);

        let seen: Arc<Mutex<Vec<FactionObservation>>> = Arc::default();
        let recorder = Arc::clone(&seen);
        tailer.add_sink(move |batch: Vec<FactionObservation>| {
            recorder.lock().unwrap().extend(batch);
        });

        let (tx, rx) = mpsc::unbounded_channel();
        let monitor = JournalMonitor::with_events(tailer, rx, Duration::from_secs(3600));
        let handle = monitor.handle();
        let task = tokio::spawn(monitor.run());

        let path = temp_dir.path().join("Journal.2024-01-01T120000.01.log");
        std::fs::write(
            &path,
            "{\"timestamp\":\"2024-01-01T12:00:00Z\",\"event\":\"Location\",\"StarSystem\":\"Sol\",\"Factions\":[{\"Name\":\"A\",\"Influence\":1.0}]}\n",
        )
        .unwrap();
        tx.send(ChangeEvent::Created(path.clone())).unwrap();

        for _ in 0..100 {
            if !seen.lock().unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        handle.stop();
        let tailer = task.await.unwrap();
        assert_eq!(tailer.active_file(), Some(path.as_path()));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }
}
