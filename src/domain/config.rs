// src/domain/config.rs

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::domain::payload::{PayloadFormat, PayloadLocation};

pub const MODEL_DIR_DEFAULT: &str = "/sim/model";
pub const SCRIPT_DEFAULT: &str = "/app/run-model.sh";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    #[error("No bucket configured; set AWS_BUCKET, pass --bucket or use an s3:// payload location")]
    MissingBucket,

    #[error("Static credentials need both an access key id and a secret access key")]
    IncompleteCredentials,

    #[error("Empty field: {field}")]
    EmptyField { field: String },

    #[error("{field} must be an absolute path, got {path}")]
    RelativePath { field: String, path: String },
}

/// Static credentials for the object store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Layered runner settings (defaults, config file, environment, CLI)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RunnerSettings {
    #[serde(default)]
    pub bucket: Option<String>,

    #[serde(default)]
    pub region: Option<String>,

    /// Endpoint override, e.g. a local mock object store
    #[serde(default)]
    pub endpoint_url: Option<String>,

    #[serde(default)]
    pub access_key_id: Option<String>,

    #[serde(default)]
    pub secret_access_key: Option<String>,

    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,

    #[serde(default = "default_script")]
    pub script: PathBuf,

    #[serde(default)]
    pub payload_format: PayloadFormat,
}

fn default_model_dir() -> PathBuf {
    PathBuf::from(MODEL_DIR_DEFAULT)
}

fn default_script() -> PathBuf {
    PathBuf::from(SCRIPT_DEFAULT)
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            bucket: None,
            region: None,
            endpoint_url: None,
            access_key_id: None,
            secret_access_key: None,
            model_dir: default_model_dir(),
            script: default_script(),
            payload_format: PayloadFormat::default(),
        }
    }
}

impl RunnerSettings {
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        validate_absolute("model_dir", &self.model_dir)?;

        if self.script.as_os_str().is_empty() {
            return Err(ConfigValidationError::EmptyField {
                field: "script".to_string(),
            });
        }

        self.credentials()?;
        Ok(())
    }

    /// Static credentials, when both halves are configured
    pub fn credentials(&self) -> Result<Option<StaticCredentials>, ConfigValidationError> {
        let non_empty = |v: &Option<String>| v.as_deref().filter(|s| !s.is_empty()).map(str::to_string);

        match (non_empty(&self.access_key_id), non_empty(&self.secret_access_key)) {
            (Some(access_key_id), Some(secret_access_key)) => Ok(Some(StaticCredentials {
                access_key_id,
                secret_access_key,
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigValidationError::IncompleteCredentials),
        }
    }

    /// Bucket used for links that do not name their own: the configured
    /// bucket, else the bucket of the payload location
    pub fn resolve_bucket(&self, location: &PayloadLocation) -> Result<String, ConfigValidationError> {
        self.bucket
            .as_deref()
            .filter(|b| !b.is_empty())
            .or(location.bucket.as_deref())
            .filter(|b| !b.is_empty())
            .map(str::to_string)
            .ok_or(ConfigValidationError::MissingBucket)
    }
}

fn validate_absolute(field: &str, path: &Path) -> Result<(), ConfigValidationError> {
    if path.as_os_str().is_empty() {
        return Err(ConfigValidationError::EmptyField {
            field: field.to_string(),
        });
    }
    if !path.is_absolute() {
        return Err(ConfigValidationError::RelativePath {
            field: field.to_string(),
            path: path.display().to_string(),
        });
    }
    Ok(())
}
