// src/adapters/logging.rs

//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! Priority for determining the log level:
//! 1. `--log-level` CLI flag (if provided)
//! 2. `RAS_RUNNER_LOG` environment variable (e.g. "info", "debug")
//! 3. default to `info`
//!
//! Events are written to stdout and, once a run log is attached, mirrored
//! into it.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::MakeWriter;

use crate::ports::{application::LogLevel, filesystem::LogWriter};

pub const LOG_ENV_VAR: &str = "RAS_RUNNER_LOG";

/// Shared log destination: stdout plus an optional attached file
#[derive(Clone, Default)]
pub struct LogSink {
    file: Arc<Mutex<Option<LogWriter>>>,
}

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mirror every subsequent event into `writer`
    pub fn attach(&self, writer: LogWriter) {
        if let Ok(mut file) = self.file.lock() {
            *file = Some(writer);
        }
    }

    /// Stop mirroring, handing back the attached writer
    pub fn detach(&self) -> Option<LogWriter> {
        self.file.lock().ok().and_then(|mut file| file.take())
    }
}

/// Writer handed out per event by [`LogSink`]
pub struct LogSinkWriter {
    file: Arc<Mutex<Option<LogWriter>>>,
}

impl Write for LogSinkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stdout().write_all(buf)?;
        if let Ok(mut file) = self.file.lock() {
            if let Some(file) = file.as_mut() {
                file.write_all(buf)?;
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()?;
        if let Ok(mut file) = self.file.lock() {
            if let Some(file) = file.as_mut() {
                file.flush()?;
            }
        }
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogSink {
    type Writer = LogSinkWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogSinkWriter {
            file: Arc::clone(&self.file),
        }
    }
}

/// Initialise global logging subscriber.
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(cli_level: Option<LogLevel>, sink: LogSink) -> Result<()> {
    let level = match cli_level {
        Some(lvl) => level_from_log_level(lvl),
        None => std::env::var(LOG_ENV_VAR)
            .ok()
            .and_then(|s| parse_level_str(&s))
            .unwrap_or(tracing::Level::INFO),
    };

    fmt()
        .with_max_level(level)
        .with_target(false)
        .with_ansi(false)
        .with_writer(sink)
        .try_init()
        .map_err(|e| anyhow!("failed to install log subscriber: {e}"))
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}
