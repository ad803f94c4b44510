//! # Logging Setup
//!
//! Installs the global `tracing` subscriber. Output goes to stderr, or is
//! appended to `<log_dir>/logger_<YYYYMMDD>.log` (UTC date) when a log
//! directory is configured. `RUST_LOG` overrides the `-v` level.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::ValueEnum;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Filter directive for a `-v` count.
pub fn level_for(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// `logger_<YYYYMMDD>.log`.
pub fn log_file_name(date: NaiveDate) -> String {
    format!("logger_{}.log", date.format("%Y%m%d"))
}

/// Open today's log file under `dir` for appending, creating `dir` if needed.
pub fn open_log_file(dir: &Path) -> Result<(PathBuf, File)> {
    fs::create_dir_all(dir)
        .with_context(|| format!("cannot create log directory {}", dir.display()))?;
    let path = dir.join(log_file_name(Utc::now().date_naive()));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("cannot open log file {}", path.display()))?;
    Ok((path, file))
}

/// Install the global subscriber. Returns the log file path when logging to
/// a file.
pub fn init(verbose: u8, format: LogFormat, log_dir: Option<&Path>) -> Result<Option<PathBuf>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_for(verbose)));

    let (writer, log_path) = match log_dir {
        Some(dir) => {
            let (path, file) = open_log_file(dir)?;
            (BoxMakeWriter::new(Mutex::new(file)), Some(path))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(writer);

    let installed = match format {
        LogFormat::Text => builder.with_ansi(log_path.is_none()).try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("cannot install log subscriber: {e}"))?;

    if let Some(path) = &log_path {
        tracing::debug!(path = %path.display(), "logging to file");
    }
    Ok(log_path)
}
