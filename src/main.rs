//! Faction Journal - minor faction influence tracking from game journals.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use faction_journal::config::{ConfigLoader, MonitorConfig};
use faction_journal::display::{self, ConsoleSink};
use faction_journal::journal::{CsvSink, FileSetResolver, JournalMonitor};

#[derive(Parser)]
#[command(
    name = "faction-journal",
    about = "Track minor faction influence from game journal files",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file to use instead of the default search path.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Follow the journal and print faction influence on every arrival.
    Watch {
        /// Journal directory.
        #[arg(short = 'd', long)]
        journal_dir: Option<PathBuf>,
        /// Journal filename glob.
        #[arg(short, long)]
        pattern: Option<String>,
        /// Append observations to this CSV file.
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Print observations as JSON lines.
        #[arg(long)]
        json: bool,
    },
    /// List journal files and show which one would be followed.
    Scan {
        /// Journal directory.
        #[arg(short = 'd', long)]
        journal_dir: Option<PathBuf>,
        /// Journal filename glob.
        #[arg(short, long)]
        pattern: Option<String>,
    },
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(loader: &ConfigLoader) -> Result<MonitorConfig, String> {
    if let Some(path) = loader.find_config_file() {
        tracing::info!(path = %path.display(), "Using config file");
    }
    loader.load().map_err(|e| e.to_string())
}

fn apply_overrides(config: &mut MonitorConfig, journal_dir: Option<PathBuf>, pattern: Option<String>) {
    if journal_dir.is_some() {
        config.journal_dir = journal_dir;
    }
    if let Some(pattern) = pattern {
        config.file_pattern = pattern;
    }
}

async fn watch(config: MonitorConfig, json: bool) -> Result<(), String> {
    let mut monitor = JournalMonitor::from_config(&config).map_err(|e| e.to_string())?;

    let tailer = monitor.tailer_mut();
    display::print_monitor_start(tailer.resolver().dir(), tailer.resolver().pattern());
    tailer.add_sink(ConsoleSink::new(json));
    if let Some(csv) = config.csv_output() {
        tracing::info!(path = %csv.display(), "Writing observations to CSV");
        tailer.add_sink(CsvSink::new(csv));
    }

    let handle = monitor.handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, stopping journal monitor");
        }
        handle.stop();
    });

    monitor.run().await;
    Ok(())
}

fn scan(config: &MonitorConfig, loader: &ConfigLoader) -> Result<(), String> {
    display::print_config_source(loader.find_config_file(), loader.search_paths());
    let dir = config
        .journal_dir()
        .ok_or_else(|| "no journal directory configured".to_string())?;
    let resolver = FileSetResolver::new(dir, &config.file_pattern).map_err(|e| e.to_string())?;

    let candidates = resolver.candidates().map_err(|e| e.to_string())?;
    let current = resolver.resolve(None).ok().map(|c| c.path);
    display::print_candidates(&candidates, current.as_deref());
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let loader = cli
        .config
        .map_or_else(ConfigLoader::new, ConfigLoader::with_path);
    let mut config = match load_config(&loader) {
        Ok(config) => config,
        Err(e) => {
            display::print_error(&e);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Watch {
            journal_dir,
            pattern,
            csv,
            json,
        } => {
            apply_overrides(&mut config, journal_dir, pattern);
            if csv.is_some() {
                config.csv_output = csv;
            }
            watch(config, json).await
        }
        Commands::Scan {
            journal_dir,
            pattern,
        } => {
            apply_overrides(&mut config, journal_dir, pattern);
            scan(&config, &loader)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            display::print_error(&e);
            ExitCode::FAILURE
        }
    }
}
