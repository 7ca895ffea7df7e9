//! Journal tailing for game log files.
//!
//! Discovers the active journal, follows it across rotations, and decodes
//! system arrival events into faction influence observations.

mod decoder;
mod error;
mod monitor;
mod position;
mod resolver;
mod sink;
mod tailer;
mod watcher;

pub use decoder::{
    influence_percent, EventKind, FactionObservation, Field, LineDecoder, LogRecord,
    TIMESTAMP_FORMAT, UNKNOWN,
};
pub use error::{DecodeError, ResolveError, TailError};
pub use monitor::{JournalMonitor, MonitorHandle};
pub use position::PositionTracker;
pub use resolver::{same_file, FileCandidate, FileSetResolver, DEFAULT_PATTERN};
pub use sink::{ChannelSink, CsvSink, EventSink, CSV_HEADER};
pub use tailer::{JournalTailer, PassSummary, TailerState};
pub use watcher::{ChangeEvent, JournalWatcher};
