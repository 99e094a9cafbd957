// src/ports/command.rs
// Model execution port (interface)
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Callback receiving each stdout line of the model process
pub type LineSink<'a> = dyn FnMut(&str) -> io::Result<()> + Send + 'a;

/// A single launch of the model wrapper script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInvocation {
    pub script: PathBuf,
    pub working_dir: PathBuf,
    pub args: Vec<String>,
}

impl ModelInvocation {
    /// Full argument list: working directory first, then the model arguments
    pub fn argv(&self) -> Vec<String> {
        let mut argv = vec![self.working_dir.display().to_string()];
        argv.extend(self.args.iter().cloned());
        argv
    }
}

/// Result of running the model to completion
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunOutput {
    /// Standard error, captured wholesale
    pub stderr: String,

    /// Exit status code, -1 when terminated by a signal
    pub status: i32,

    /// Whether the process exited with status 0
    pub success: bool,

    pub duration: Duration,
}

/// Errors launching or talking to the model process. A non-zero exit is not
/// an error at this level; it is reported through [`RunOutput::success`].
#[derive(Error, Debug, Clone)]
pub enum CommandError {
    #[error("Failed to launch {script}: {message}")]
    SpawnError { script: String, message: String },

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Output handler failed: {0}")]
    SinkError(String),
}

impl From<io::Error> for CommandError {
    fn from(value: io::Error) -> Self {
        Self::IoError(value.to_string())
    }
}

/// Port for running the external model
#[async_trait]
pub trait ModelRunner: Send + Sync {
    /// Run the model, handing every stdout line to `on_line` while it runs
    async fn run(
        &self,
        invocation: &ModelInvocation,
        on_line: &mut LineSink<'_>,
    ) -> Result<RunOutput, CommandError>;
}

pub mod mock {
    use std::sync::Mutex;

    use super::*;

    /// Model runner that replays canned stdout instead of launching a process
    pub struct ScriptedModelRunner {
        stdout: Vec<String>,
        stderr: String,
        status: i32,
        invocations: Mutex<Vec<ModelInvocation>>,
        on_finish: Option<Box<dyn Fn(&ModelInvocation) + Send + Sync>>,
    }

    impl ScriptedModelRunner {
        pub fn succeeding<I, S>(stdout: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            Self {
                stdout: stdout.into_iter().map(Into::into).collect(),
                stderr: String::new(),
                status: 0,
                invocations: Mutex::new(Vec::new()),
                on_finish: None,
            }
        }

        pub fn failing(status: i32, stderr: &str) -> Self {
            Self {
                status,
                stderr: stderr.to_string(),
                ..Self::succeeding(Vec::<String>::new())
            }
        }

        /// Run `f` after the stdout replay, e.g. to create result files
        pub fn on_finish(mut self, f: impl Fn(&ModelInvocation) + Send + Sync + 'static) -> Self {
            self.on_finish = Some(Box::new(f));
            self
        }

        pub fn invocations(&self) -> Vec<ModelInvocation> {
            self.invocations
                .lock()
                .map(|calls| calls.clone())
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl ModelRunner for ScriptedModelRunner {
        async fn run(
            &self,
            invocation: &ModelInvocation,
            on_line: &mut LineSink<'_>,
        ) -> Result<RunOutput, CommandError> {
            if let Ok(mut calls) = self.invocations.lock() {
                calls.push(invocation.clone());
            }

            for line in &self.stdout {
                on_line(line.as_str()).map_err(|e| CommandError::SinkError(e.to_string()))?;
            }

            if let Some(f) = &self.on_finish {
                f(invocation);
            }

            Ok(RunOutput {
                stderr: self.stderr.clone(),
                status: self.status,
                success: self.status == 0,
                duration: Duration::from_millis(10),
            })
        }
    }
}
