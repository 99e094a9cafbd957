// src/ports/application.rs
use std::path::PathBuf;

use crate::domain::payload::PayloadFormat;

/// Log verbosity requested on the command line
#[derive(Debug, Copy, Clone, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Settings given on the command line, each overriding file and environment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsOverrides {
    pub bucket: Option<String>,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    pub model_dir: Option<PathBuf>,
    pub script: Option<PathBuf>,
    pub payload_format: Option<PayloadFormat>,
}

#[derive(Debug, Clone)]
pub struct RunArguments {
    /// Payload location as given: key, `s3://` URL or inline JSON
    pub payload: String,
    pub config_path: Option<PathBuf>,
    pub overrides: SettingsOverrides,
    pub log_level: Option<LogLevel>,
    pub progress_bar: bool,
}

pub trait ArgumentParser {
    /// Parse arguments into the application's domain model
    fn parse_arguments() -> RunArguments;
}
