// src/adapters/cli/clap_adapter.rs
use std::path::PathBuf;

use clap::Parser;

use crate::{
    domain::payload::PayloadFormat,
    ports::application::{ArgumentParser, LogLevel, RunArguments, SettingsOverrides},
};

/// ras-runner - Stage a hydraulic model from S3, run it and push the results back
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct ClapArguments {
    /// Payload location: an object key, an s3://bucket/key URL, or inline
    /// JSON such as {"s3key":"jobs/payload.json"}
    pub payload: String,

    /// Bucket for input and output keys that do not name one. Takes
    /// precedence over the bucket of an s3:// payload location, which is
    /// still used to fetch the payload itself.
    #[clap(long, short = 'b')]
    pub bucket: Option<String>,

    /// Object store region
    #[clap(long)]
    pub region: Option<String>,

    /// Object store endpoint override, e.g. a local mock server
    #[clap(long)]
    pub endpoint_url: Option<String>,

    /// Directory the model is staged into and run from
    #[clap(long, short = 'd')]
    pub model_dir: Option<PathBuf>,

    /// Wrapper script that launches the model
    #[clap(long, short = 's')]
    pub script: Option<PathBuf>,

    /// Payload document format
    #[clap(long, value_enum)]
    pub payload_format: Option<PayloadFormat>,

    /// YAML settings file
    #[clap(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Log verbosity, overriding RAS_RUNNER_LOG
    #[clap(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Draw a progress bar even when stdout is not a terminal
    #[clap(long)]
    pub progress_bar: bool,
}

impl ArgumentParser for ClapArguments {
    fn parse_arguments() -> RunArguments {
        RunArguments::from(Self::parse())
    }
}

impl From<ClapArguments> for RunArguments {
    fn from(value: ClapArguments) -> Self {
        Self {
            payload: value.payload,
            config_path: value.config,
            overrides: SettingsOverrides {
                bucket: value.bucket,
                region: value.region,
                endpoint_url: value.endpoint_url,
                model_dir: value.model_dir,
                script: value.script,
                payload_format: value.payload_format,
            },
            log_level: value.log_level,
            progress_bar: value.progress_bar,
        }
    }
}
