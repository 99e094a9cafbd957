// src/adapters/config_loader/yaml.rs
use std::collections::HashMap;
use std::path::Path;

use config::{Environment, FileFormat};
use tracing::debug;

use crate::{
    domain::config::RunnerSettings,
    ports::{
        application::SettingsOverrides,
        config_loader::{ConfigLoadError, ConfigLoader},
        filesystem::FileSystem,
    },
};

/// Settings loader: YAML file, then `AWS_*` and `RAS_RUNNER_*` environment
/// variables, then command-line overrides
pub struct Yaml<'a> {
    fs: &'a dyn FileSystem,

    /// Environment snapshot to read instead of the process environment
    env: Option<HashMap<String, String>>,
}

impl<'a> Yaml<'a> {
    pub fn new(fs: &'a dyn FileSystem) -> Self {
        Self { fs, env: None }
    }

    /// Read variables from `env` rather than the process environment
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = Some(env);
        self
    }

    fn read_settings_file(&self, path: &Path) -> Result<String, ConfigLoadError> {
        if !self.fs.path_exists(path) {
            return Err(ConfigLoadError::ReadError(format!(
                "Can't read config file: {}",
                path.display()
            )));
        }

        let bytes = self
            .fs
            .read_file(path)
            .map_err(|e| ConfigLoadError::ReadError(e.to_string()))?;

        String::from_utf8(bytes).map_err(|e| {
            ConfigLoadError::ReadError(format!("{} is not valid UTF-8: {e}", path.display()))
        })
    }
}

impl ConfigLoader for Yaml<'_> {
    fn load_settings(
        &self,
        config_path: Option<&Path>,
        overrides: &SettingsOverrides,
    ) -> Result<RunnerSettings, ConfigLoadError> {
        let mut builder = config::Config::builder();

        if let Some(path) = config_path {
            debug!(path = %path.display(), "loading settings file");
            let contents = self.read_settings_file(path)?;
            builder = builder.add_source(config::File::from_str(&contents, FileFormat::Yaml));
        }

        // AWS_BUCKET -> bucket, RAS_RUNNER_MODEL_DIR -> model_dir
        builder = builder
            .add_source(
                Environment::with_prefix("AWS")
                    .prefix_separator("_")
                    .source(self.env.clone()),
            )
            .add_source(
                Environment::with_prefix("RAS_RUNNER")
                    .prefix_separator("_")
                    .source(self.env.clone()),
            );

        if let Some(bucket) = overrides.bucket.as_ref() {
            builder = builder.set_override("bucket", bucket.clone())?;
        }
        if let Some(region) = overrides.region.as_ref() {
            builder = builder.set_override("region", region.clone())?;
        }
        if let Some(endpoint_url) = overrides.endpoint_url.as_ref() {
            builder = builder.set_override("endpoint_url", endpoint_url.clone())?;
        }
        if let Some(model_dir) = overrides.model_dir.as_ref() {
            builder = builder.set_override("model_dir", model_dir.to_string_lossy().to_string())?;
        }
        if let Some(script) = overrides.script.as_ref() {
            builder = builder.set_override("script", script.to_string_lossy().to_string())?;
        }
        if let Some(format) = overrides.payload_format {
            builder = builder.set_override("payload_format", format.as_str())?;
        }

        let settings: RunnerSettings = builder.build()?.try_deserialize()?;

        settings
            .validate()
            .map_err(|e| ConfigLoadError::ValidationError(e.to_string()))?;

        Ok(settings)
    }
}
