// src/ports/config_loader.rs
use crate::{domain::config::RunnerSettings, ports::application::SettingsOverrides};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigLoadError {
    #[error("Failed to read configuration file: {0}")]
    ReadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl From<config::ConfigError> for ConfigLoadError {
    fn from(value: config::ConfigError) -> Self {
        Self::ParseError(value.to_string())
    }
}

/// Port for assembling runner settings
pub trait ConfigLoader {
    /// Layer defaults, the optional settings file, the environment and the
    /// command-line overrides, then validate the result
    fn load_settings(
        &self,
        config_path: Option<&Path>,
        overrides: &SettingsOverrides,
    ) -> Result<RunnerSettings, ConfigLoadError>;
}
