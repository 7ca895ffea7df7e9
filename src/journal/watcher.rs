//! Journal directory watcher with notify integration.
//!
//! Turns filesystem notifications for journal files into [`ChangeEvent`]s on
//! a tokio channel.

use std::path::{Path, PathBuf};
use std::sync::mpsc as std_mpsc;
use std::thread;
use std::time::Duration;

use notify_debouncer_full::{
    new_debouncer,
    notify::{event::ModifyKind, EventKind, RecursiveMode},
    DebounceEventResult, DebouncedEvent,
};
use tokio::sync::mpsc;

use super::error::TailError;
use super::resolver::FileSetResolver;

/// A change to a journal file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// A journal file appeared.
    Created(PathBuf),
    /// A journal file was written to.
    Modified(PathBuf),
}

impl ChangeEvent {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            ChangeEvent::Created(path) | ChangeEvent::Modified(path) => path,
        }
    }
}

/// Watches a journal directory for created and modified journal files.
///
/// The OS watch lives on a bridge thread until [`stop`](Self::stop) is called
/// or the watcher is dropped.
pub struct JournalWatcher {
    dir: PathBuf,
    stop_tx: std_mpsc::Sender<()>,
    bridge_handle: Option<thread::JoinHandle<()>>,
}

impl JournalWatcher {
    /// Start watching the resolver's directory.
    ///
    /// Returns the watcher and a receiver for change events.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be watched (for example
    /// because it does not exist yet).
    pub fn new(
        resolver: &FileSetResolver,
        debounce: Duration,
    ) -> Result<(Self, mpsc::UnboundedReceiver<ChangeEvent>), TailError> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = std_mpsc::channel();
        let (notify_tx, notify_rx) = std_mpsc::channel();

        let mut debouncer = new_debouncer(debounce, None, move |result| {
            let _ = notify_tx.send(result);
        })?;
        debouncer.watch(resolver.dir(), RecursiveMode::NonRecursive)?;

        let dir = resolver.dir().to_path_buf();
        let filter = resolver.clone();

        let bridge_handle = thread::spawn(move || {
            loop {
                if stop_rx.try_recv().is_ok() {
                    break;
                }

                match notify_rx.recv_timeout(Duration::from_millis(100)) {
                    Ok(result) => {
                        if !Self::forward(result, &filter, &event_tx) {
                            break;
                        }
                    }
                    Err(std_mpsc::RecvTimeoutError::Timeout) => {}
                    Err(std_mpsc::RecvTimeoutError::Disconnected) => break,
                }
            }

            // Dropping the debouncer releases the OS watch.
            drop(debouncer);
            tracing::debug!("Journal watch released");
        });

        tracing::info!(dir = %dir.display(), "Watching journal directory");

        Ok((
            Self {
                dir,
                stop_tx,
                bridge_handle: Some(bridge_handle),
            },
            event_rx,
        ))
    }

    /// Forward one debounce result. Returns `false` once the receiver is gone.
    fn forward(
        result: DebounceEventResult,
        filter: &FileSetResolver,
        event_tx: &mpsc::UnboundedSender<ChangeEvent>,
    ) -> bool {
        match result {
            Ok(events) => {
                for change in events.iter().flat_map(|e| classify(e, filter)) {
                    if event_tx.send(change).is_err() {
                        return false;
                    }
                }
            }
            Err(errors) => {
                for error in errors {
                    tracing::warn!(error = %error, "Journal watcher error");
                }
            }
        }
        true
    }

    /// Directory being watched.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.bridge_handle.is_some()
    }

    /// Release the filesystem watch. Safe to call more than once.
    pub fn stop(&mut self) {
        let Some(handle) = self.bridge_handle.take() else {
            return;
        };
        let _ = self.stop_tx.send(());
        if handle.join().is_err() {
            tracing::error!("Journal watcher thread panicked");
        }
    }
}

impl Drop for JournalWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for JournalWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JournalWatcher")
            .field("dir", &self.dir)
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

/// Map a notify event to change events for matching journal files.
fn classify(event: &DebouncedEvent, filter: &FileSetResolver) -> Vec<ChangeEvent> {
    let make: fn(PathBuf) -> ChangeEvent = match event.kind {
        EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(_)) => ChangeEvent::Created,
        EventKind::Modify(_) => ChangeEvent::Modified,
        _ => return Vec::new(),
    };

    event
        .paths
        .iter()
        .filter(|path| filter.matches(path))
        .map(|path| make(path.clone()))
        .collect()
}
