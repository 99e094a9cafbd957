// src/domain/errors.rs
// Error taxonomy for a runner invocation

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::config::ConfigValidationError;

/// Failures while deriving the model name and run IDs from input file names
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NamingError {
    #[error("Payload has no inputs to derive a model name from")]
    NoInputs,

    #[error("Inputs do not all resolve to the same model name ({first} vs {other})")]
    Mismatch { first: String, other: String },

    #[error("Multiple files in payload inputs matched pattern {pattern:?} ({first} vs {other})")]
    MultipleMatches {
        pattern: String,
        first: String,
        other: String,
    },

    #[error("Payload names a {present} file but no file matched pattern {pattern:?}")]
    MissingCounterpart { present: String, pattern: String },
}

/// Top-level runner error. Every variant is terminal.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Failed to retrieve s3://{bucket}/{key}: {message}")]
    Retrieval {
        bucket: String,
        key: String,
        message: String,
    },

    #[error("Failed to parse payload: {0}")]
    Parse(String),

    #[error("Transfer failed for {}: {message}", path.display())]
    Transfer { path: PathBuf, message: String },

    #[error("Model naming error: {0}")]
    Naming(#[from] NamingError),

    #[error("Model run failed: {message}")]
    Run { message: String, stderr: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigValidationError),
}

impl RunnerError {
    pub fn retrieval(bucket: &str, key: &str, message: impl ToString) -> Self {
        Self::Retrieval {
            bucket: bucket.to_string(),
            key: key.to_string(),
            message: message.to_string(),
        }
    }

    pub fn transfer(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Transfer {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Run failure without any captured stderr (spawn or pipe errors)
    pub fn run(message: impl ToString) -> Self {
        Self::Run {
            message: message.to_string(),
            stderr: String::new(),
        }
    }

    /// Captured stderr of a failed model run, if any
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::Run { stderr, .. } if !stderr.is_empty() => Some(stderr),
            _ => None,
        }
    }
}
