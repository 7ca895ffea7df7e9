//! Colored CLI display utilities for journal monitor output.
//!
//! This module provides functions for printing colored, formatted output
//! to the terminal while following the game journal.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use owo_colors::OwoColorize;

use crate::journal::{EventSink, FactionObservation, FileCandidate};

/// Get current timestamp in the same format as tracing.
fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Maximum display width for faction names.
const FACTION_WIDTH: usize = 40;

/// Truncate a string to a maximum number of characters, adding ellipsis if
/// truncated.
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        "...".to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    }
}

/// Plain-text line for one observation.
#[must_use]
pub fn format_observation(obs: &FactionObservation) -> String {
    let mut flags = Vec::new();
    if obs.is_player {
        flags.push("player");
    }
    if obs.is_native {
        flags.push("native");
    }
    let flags = if flags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", flags.join(", "))
    };

    format!(
        "{:<width$} {:>6.2}% {}{}",
        truncate(&obs.faction, FACTION_WIDTH),
        obs.influence,
        obs.state,
        flags,
        width = FACTION_WIDTH
    )
}

/// Print monitor start information.
pub fn print_monitor_start(dir: &Path, pattern: &str) {
    println!(
        "{} {} dir={}, pattern={}",
        timestamp().dimmed(),
        "[MONITOR]".blue().bold(),
        dir.display().cyan(),
        pattern.dimmed()
    );
    let _ = io::stdout().flush();
}

/// Print a dispatched batch, grouped by system.
pub fn print_batch(batch: &[FactionObservation]) {
    let ts = timestamp();
    let mut current_system: Option<&str> = None;
    for obs in batch {
        if current_system != Some(obs.system.as_str()) {
            current_system = Some(obs.system.as_str());
            println!(
                "{} {} {} {}",
                ts.dimmed(),
                "[SYSTEM]".magenta().bold(),
                obs.system.bold(),
                obs.last_updated().dimmed()
            );
        }
        let line = format_observation(obs);
        if obs.is_player {
            println!("    {}", line.green());
        } else {
            println!("    {line}");
        }
    }
    let _ = io::stdout().flush();
}

/// Print the candidate journal set, marking the current file.
pub fn print_candidates(candidates: &[FileCandidate], current: Option<&Path>) {
    if candidates.is_empty() {
        println!("{} No journal files found", "[SCAN]".yellow().bold());
    }
    for candidate in candidates {
        let name = candidate.path.display().to_string();
        let modified = chrono::DateTime::<Utc>::from(candidate.modified)
            .format(crate::journal::TIMESTAMP_FORMAT)
            .to_string();
        if current == Some(candidate.path.as_path()) {
            println!(
                "{} {} {}",
                "[CURRENT]".green().bold(),
                name.bold(),
                modified.dimmed()
            );
        } else {
            println!("{} {} {}", "[SCAN]".cyan(), name, modified.dimmed());
        }
    }
    let _ = io::stdout().flush();
}

/// Print which config file is in effect, or where one was looked for.
pub fn print_config_source(found: Option<&Path>, searched: &[PathBuf]) {
    match found {
        Some(path) => println!("{} {}", "[CONFIG]".blue().bold(), path.display()),
        None => {
            let searched: Vec<String> = searched.iter().map(|p| p.display().to_string()).collect();
            println!(
                "{} defaults (searched {})",
                "[CONFIG]".blue().bold(),
                searched.join(", ").dimmed()
            );
        }
    }
    let _ = io::stdout().flush();
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), message);
    let _ = io::stderr().flush();
}

/// Sink that prints batches to stdout, colored or as JSON lines.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    json: bool,
}

impl ConsoleSink {
    #[must_use]
    pub fn new(json: bool) -> Self {
        Self { json }
    }
}

impl EventSink for ConsoleSink {
    fn deliver(&mut self, batch: Vec<FactionObservation>) {
        if !self.json {
            print_batch(&batch);
            return;
        }
        for obs in &batch {
            match serde_json::to_string(obs) {
                Ok(line) => println!("{line}"),
                Err(e) => tracing::error!(error = %e, "Failed to serialize observation"),
            }
        }
        let _ = io::stdout().flush();
    }
}
