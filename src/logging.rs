//! Log sinks and subscriber setup.
//!
//! The engine never writes log lines itself. It hands [`LogRecord`]s to an
//! injected [`LogSink`]; the binary decides where they end up by installing
//! a `tracing` subscriber with [`init`].

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::prelude::*;

const TIME_FORMAT: &str = "[%Y-%m-%d %H:%M:%S]";

/// Severity of a log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

impl Severity {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Error => "ERROR",
        }
    }
}

/// One human-readable log line emitted by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub severity: Severity,
    pub message: String,
}

impl LogRecord {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    /// The line body as written after the timestamp: `[INFO] message`.
    pub fn line(&self) -> String {
        format!("[{}] {}", self.severity.tag(), self.message)
    }
}

/// Destination for engine log records.
pub trait LogSink: Send + Sync {
    fn record(&self, record: LogRecord);

    fn info(&self, message: String) {
        self.record(LogRecord::info(message));
    }

    fn error(&self, message: String) {
        self.record(LogRecord::error(message));
    }
}

/// Forwards records to the global `tracing` dispatcher.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn record(&self, record: LogRecord) {
        match record.severity {
            Severity::Info => tracing::info!("{}", record.line()),
            Severity::Error => tracing::error!("{}", record.line()),
        }
    }
}

/// Keeps every record in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<LogRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records so far.
    pub fn records(&self) -> Vec<LogRecord> {
        self.lock().clone()
    }

    /// Records of the given severity.
    pub fn with_severity(&self, severity: Severity) -> Vec<LogRecord> {
        self.lock()
            .iter()
            .filter(|r| r.severity == severity)
            .cloned()
            .collect()
    }

    /// Number of records whose message starts with `prefix`.
    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.lock()
            .iter()
            .filter(|r| r.message.starts_with(prefix))
            .count()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<LogRecord>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl LogSink for MemorySink {
    fn record(&self, record: LogRecord) {
        self.lock().push(record);
    }
}

/// Install the process-wide subscriber: console plus an append-mode log file.
///
/// Both outputs write `[timestamp] [LEVEL] message`; the level tag comes from
/// [`TracingSink`], so the formatter's own level column is off.
pub fn init(log_file: &Path) -> Result<()> {
    if let Some(parent) = log_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("Failed to open log file: {}", log_file.display()))?;

    let timer = ChronoLocal::new(TIME_FORMAT.to_string());

    let console = tracing_subscriber::fmt::layer()
        .with_timer(timer.clone())
        .with_target(false)
        .with_level(false)
        .with_writer(std::io::stdout);

    let logfile = tracing_subscriber::fmt::layer()
        .with_timer(timer)
        .with_target(false)
        .with_level(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file));

    tracing_subscriber::registry()
        .with(LevelFilter::INFO)
        .with(console)
        .with(logfile)
        .try_init()
        .context("Failed to install log subscriber")?;

    Ok(())
}
