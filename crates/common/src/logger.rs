//! Leveled append-only file logger
//!
//! Each [`FileLogger`] owns one destination file and a minimum level. Suites
//! that want to share a destination go through a [`LoggerRegistry`] they own
//! rather than a process-wide singleton.

use chrono::{SecondsFormat, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{Error, Result};

/// Default log destination
pub const DEFAULT_LOG_PATH: &str = "logs/app.log";

const MATCHED_ITEM_MARKER: &str = "info: Matched Item: ";

/// Severity, ordered TRACE < DEBUG < INFO < WARN < ERROR
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(Error::InvalidLogLevel(s.to_string())),
        }
    }
}

/// Render one log line, including the trailing newline
pub fn format_line(level: LogLevel, message: &str) -> String {
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    format!("{} [{}]: {}\n", timestamp, level, message)
}

/// Logger appending to a single file
#[derive(Debug)]
pub struct FileLogger {
    path: PathBuf,
    level: LogLevel,
}

impl FileLogger {
    /// Open a logger, creating the parent directory if needed
    pub fn open(path: impl Into<PathBuf>, level: LogLevel) -> Result<Self> {
        let path = path.into();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            if !dir.exists() {
                std::fs::create_dir_all(dir)?;
                tracing::debug!("Log directory created: {}", dir.display());
            }
        }
        tracing::debug!("Logger initialized with path: {} and level: {}", path.display(), level);
        Ok(Self { path, level })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.level
    }

    /// Append a message if `level` meets the configured threshold
    pub fn log(&self, level: LogLevel, message: &str) -> Result<()> {
        if !self.enabled(level) {
            tracing::trace!("Message not logged due to log level: {}", message);
            return Ok(());
        }

        let line = format_line(level, message);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;

        mirror(level, &self.path, message);
        Ok(())
    }

    pub fn trace(&self, message: &str) -> Result<()> {
        self.log(LogLevel::Trace, message)
    }

    pub fn debug(&self, message: &str) -> Result<()> {
        self.log(LogLevel::Debug, message)
    }

    pub fn info(&self, message: &str) -> Result<()> {
        self.log(LogLevel::Info, message)
    }

    pub fn warn(&self, message: &str) -> Result<()> {
        self.log(LogLevel::Warn, message)
    }

    pub fn error(&self, message: &str) -> Result<()> {
        self.log(LogLevel::Error, message)
    }

    /// Log request details at INFO, pretty-printing an embedded
    /// `info: Matched Item: <json>` payload when present.
    pub fn log_request_details(
        &self,
        message: &str,
        pretty: bool,
        additional_text: &str,
    ) -> Result<()> {
        self.info(&render_request_details(message, pretty, additional_text))
    }
}

fn render_request_details(message: &str, pretty: bool, additional_text: &str) -> String {
    let Some((_, json)) = message.split_once(MATCHED_ITEM_MARKER) else {
        return format!("{}\n{}", additional_text, message);
    };

    let rendered = serde_json::from_str::<serde_json::Value>(json).and_then(|value| {
        if pretty {
            serde_json::to_string_pretty(&value)
        } else {
            serde_json::to_string(&value)
        }
    });

    match rendered {
        Ok(body) => format!("{}\n{}", additional_text, body),
        Err(e) => {
            tracing::warn!("Error parsing log message as JSON: {}", e);
            format!(
                "{}\nOriginal Message (Not Valid JSON):\n{}",
                additional_text, message
            )
        }
    }
}

fn mirror(level: LogLevel, path: &Path, message: &str) {
    let file = path.display();
    match level {
        LogLevel::Trace => tracing::trace!(%file, "{}", message),
        LogLevel::Debug => tracing::debug!(%file, "{}", message),
        LogLevel::Info => tracing::info!(%file, "{}", message),
        LogLevel::Warn => tracing::warn!(%file, "{}", message),
        LogLevel::Error => tracing::error!(%file, "{}", message),
    }
}

/// Registry of loggers keyed by destination path.
///
/// The first request for a path decides its level; later requests for the
/// same path get the existing logger.
#[derive(Debug, Default, Clone)]
pub struct LoggerRegistry {
    loggers: Arc<Mutex<HashMap<PathBuf, Arc<FileLogger>>>>,
}

impl LoggerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_open(&self, path: impl AsRef<Path>, level: LogLevel) -> Result<Arc<FileLogger>> {
        let path = path.as_ref();
        let mut loggers = self.loggers.lock();

        if let Some(existing) = loggers.get(path) {
            if existing.level() != level {
                tracing::warn!(
                    "Logger for {} already open at level {}; ignoring requested level {}",
                    path.display(),
                    existing.level(),
                    level
                );
            }
            return Ok(existing.clone());
        }

        let logger = Arc::new(FileLogger::open(path, level)?);
        loggers.insert(path.to_path_buf(), logger.clone());
        Ok(logger)
    }

    pub fn len(&self) -> usize {
        self.loggers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
