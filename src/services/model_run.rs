// src/services/model_run.rs
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{error, info};

use crate::{
    adapters::progress::format_duration,
    domain::{errors::RunnerError, model::ModelIdentity, progress::ProgressWatcher},
    ports::{
        command::{CommandError, ModelInvocation, ModelRunner, RunOutput},
        filesystem::FileSystem,
        progress::ProgressReporter,
    },
};

/// Path of the run log for `model_name`
pub fn log_path(model_dir: &Path, model_name: &str) -> PathBuf {
    model_dir.join(format!("{model_name}.log"))
}

/// Launches the model and watches its stdout
pub struct ModelRun<'a> {
    runner: &'a dyn ModelRunner,
    fs: &'a dyn FileSystem,
    reporter: &'a dyn ProgressReporter,
    script: &'a Path,
    model_dir: &'a Path,
}

impl<'a> ModelRun<'a> {
    pub fn new(
        runner: &'a dyn ModelRunner,
        fs: &'a dyn FileSystem,
        reporter: &'a dyn ProgressReporter,
        script: &'a Path,
        model_dir: &'a Path,
    ) -> Self {
        Self {
            runner,
            fs,
            reporter,
            script,
            model_dir,
        }
    }

    pub fn invocation(&self, identity: &ModelIdentity) -> ModelInvocation {
        ModelInvocation {
            script: self.script.to_path_buf(),
            working_dir: self.model_dir.to_path_buf(),
            args: identity.script_args(),
        }
    }

    /// Run the model to completion. Every stdout line is appended to the run
    /// log and fed to a fresh [`ProgressWatcher`].
    pub async fn execute(&self, identity: &ModelIdentity) -> Result<RunOutput, RunnerError> {
        let log_file = log_path(self.model_dir, &identity.name);
        let mut log = self
            .fs
            .open_append(&log_file)
            .map_err(|e| RunnerError::transfer(&log_file, e))?;

        let invocation = self.invocation(identity);
        let mut watcher = ProgressWatcher::new();
        let reporter = self.reporter;

        reporter.start(&identity.name);
        let result = self
            .runner
            .run(&invocation, &mut |line: &str| -> std::io::Result<()> {
                writeln!(log, "{line}")?;
                if let Some(event) = watcher.feed(line) {
                    reporter.report(event);
                }
                Ok(())
            })
            .await;

        let output = match result {
            Ok(output) => output,
            Err(CommandError::SinkError(message)) => {
                reporter.finish(false);
                return Err(RunnerError::transfer(&log_file, message));
            }
            Err(e) => {
                reporter.finish(false);
                return Err(RunnerError::run(e));
            }
        };

        log.flush().map_err(|e| RunnerError::transfer(&log_file, e))?;
        reporter.finish(output.success);

        if !output.success {
            error!("vvvvv below is stderr from failing command");
            for line in output.stderr.lines() {
                error!("{line}");
            }
            error!("^^^^^ above is stderr from failing command");

            return Err(RunnerError::Run {
                message: format!(
                    "{} exited with status {}",
                    self.script.display(),
                    output.status
                ),
                stderr: output.stderr,
            });
        }

        info!(
            model = %identity.name,
            "model finished in {}",
            format_duration(output.duration)
        );
        Ok(output)
    }
}
