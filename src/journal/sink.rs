//! Consumers of decoded faction batches.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tokio::sync::mpsc;

use super::decoder::FactionObservation;

/// Receives one batch of observations per read pass that produced any.
///
/// Delivery is fire-and-forget: a sink handles its own failures.
pub trait EventSink: Send {
    /// Take ownership of a batch, in journal order.
    fn deliver(&mut self, batch: Vec<FactionObservation>);
}

impl<F> EventSink for F
where
    F: FnMut(Vec<FactionObservation>) + Send,
{
    fn deliver(&mut self, batch: Vec<FactionObservation>) {
        self(batch);
    }
}

/// Forwards batches to a tokio channel, for consumers on another task.
#[derive(Debug)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Vec<FactionObservation>>,
    closed: bool,
}

impl ChannelSink {
    /// Create a sink and the receiver that drains it.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Vec<FactionObservation>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, closed: false }, rx)
    }
}

impl EventSink for ChannelSink {
    fn deliver(&mut self, batch: Vec<FactionObservation>) {
        if self.tx.send(batch).is_err() && !self.closed {
            tracing::warn!("Batch receiver dropped, discarding further batches");
            self.closed = true;
        }
    }
}

/// Column header written at the top of a new CSV file.
pub const CSV_HEADER: &str =
    "System Name,Faction Name,Influence Percent,State,Player Faction,Native Faction,Last Updated";

/// Appends every observation as a CSV row.
#[derive(Debug)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, batch: &[FactionObservation]) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut out = String::new();
        if file.metadata()?.len() == 0 {
            out.push_str(CSV_HEADER);
            out.push('\n');
        }
        for obs in batch {
            out.push_str(&csv_row(obs));
            out.push('\n');
        }
        file.write_all(out.as_bytes())
    }
}

impl EventSink for CsvSink {
    fn deliver(&mut self, batch: Vec<FactionObservation>) {
        if let Err(e) = self.append(&batch) {
            tracing::error!(
                path = %self.path.display(),
                error = %e,
                rows = batch.len(),
                "Failed to write CSV rows"
            );
        }
    }
}

fn csv_row(obs: &FactionObservation) -> String {
    [
        csv_field(&obs.system),
        csv_field(&obs.faction),
        format!("{:.2}", obs.influence),
        csv_field(&obs.state),
        obs.is_player.to_string(),
        obs.is_native.to_string(),
        obs.last_updated(),
    ]
    .join(",")
}

/// Quote a field if it contains a separator, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
