// src/adapters/command/script.rs
// Wrapper-script model runner adapter implementation

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::debug;

use crate::ports::command::{CommandError, LineSink, ModelInvocation, ModelRunner, RunOutput};

/// Runs the model by launching its wrapper script
#[derive(Clone, Default)]
pub struct ScriptModelRunner {
    /// Interpreter to launch the script with; `None` executes it directly
    shell: Option<PathBuf>,

    /// Environment variables to set for the script
    environment: HashMap<String, String>,
}

impl ScriptModelRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Launch scripts through `shell` instead of executing them directly
    pub fn with_shell(mut self, shell: impl Into<PathBuf>) -> Self {
        self.shell = Some(shell.into());
        self
    }

    pub fn with_env_var(mut self, key: &str, value: &str) -> Self {
        self.environment.insert(key.to_string(), value.to_string());
        self
    }
}

fn strip_line_ending(buf: &[u8]) -> &[u8] {
    let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
    buf.strip_suffix(b"\r").unwrap_or(buf)
}

#[async_trait]
impl ModelRunner for ScriptModelRunner {
    async fn run(
        &self,
        invocation: &ModelInvocation,
        on_line: &mut LineSink<'_>,
    ) -> Result<RunOutput, CommandError> {
        let start_time = Instant::now();

        let mut cmd = match &self.shell {
            Some(shell) => {
                let mut c = Command::new(shell);
                c.arg(&invocation.script);
                c
            }
            None => Command::new(&invocation.script),
        };
        cmd.args(invocation.argv())
            .current_dir(&invocation.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        for (key, value) in &self.environment {
            cmd.env(key, value);
        }

        let mut child = cmd.spawn().map_err(|e| CommandError::SpawnError {
            script: invocation.script.display().to_string(),
            message: e.to_string(),
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CommandError::IoError("stdout pipe unavailable".to_string()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| CommandError::IoError("stderr pipe unavailable".to_string()))?;

        // Drain stderr alongside stdout so neither pipe fills up
        let stderr_task = tokio::spawn(async move {
            let mut buf = Vec::new();
            stderr.read_to_end(&mut buf).await.map(|_| buf)
        });

        let mut reader = BufReader::new(stdout);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(strip_line_ending(&buf));
            if let Err(e) = on_line(&*line) {
                let _ = child.kill().await;
                return Err(CommandError::SinkError(e.to_string()));
            }
        }

        let stderr = stderr_task
            .await
            .map_err(|e| CommandError::IoError(e.to_string()))??;
        let status = child.wait().await?;
        let duration = start_time.elapsed();

        debug!(
            script = %invocation.script.display(),
            status = ?status.code(),
            elapsed = ?duration,
            "model process exited"
        );

        Ok(RunOutput {
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            status: status.code().unwrap_or(-1),
            success: status.success(),
            duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::tempdir;

    // These tests run real scripts through /bin/sh
    fn write_script(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("run-model.sh");
        std::fs::write(&path, format!("{body}\n")).unwrap();
        path
    }

    fn sh() -> ScriptModelRunner {
        ScriptModelRunner::new().with_shell("/bin/sh")
    }

    fn discard(_: &str) -> std::io::Result<()> {
        Ok(())
    }

    fn invocation(script: PathBuf, dir: &Path) -> ModelInvocation {
        ModelInvocation {
            script,
            working_dir: dir.to_path_buf(),
            args: vec!["basin".to_string(), "01".to_string(), "02".to_string()],
        }
    }

    #[tokio::test]
    async fn test_streams_stdout_lines() {
        let dir = tempdir().unwrap();
        let script = write_script(
            dir.path(),
            r#"echo "dir=$1 model=$2 geom=$3 unsteady=$4"
printf 'PROGRESS = 0.10\r\n'
printf 'no trailing newline'"#,
        );

        let mut lines = Vec::new();
        let output = sh()
            .run(&invocation(script, dir.path()), &mut |line: &str| -> std::io::Result<()> {
                lines.push(line.to_string());
                Ok(())
            })
            .await
            .unwrap();

        assert!(output.success);
        assert_eq!(output.status, 0);
        assert_eq!(
            lines,
            vec![
                format!("dir={} model=basin geom=01 unsteady=02", dir.path().display()),
                "PROGRESS = 0.10".to_string(),
                "no trailing newline".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_runs_in_working_directory() {
        let dir = tempdir().unwrap();
        let script = write_script(dir.path(), "touch created-here");

        sh()
            .run(&invocation(script, dir.path()), &mut discard)
            .await
            .unwrap();

        assert!(dir.path().join("created-here").exists());
    }

    #[tokio::test]
    async fn test_failure_captures_stderr() {
        let dir = tempdir().unwrap();
        let script = write_script(dir.path(), "echo started\necho 'geometry missing' >&2\nexit 3");

        let output = sh()
            .run(&invocation(script, dir.path()), &mut discard)
            .await
            .unwrap();

        assert!(!output.success);
        assert_eq!(output.status, 3);
        assert_eq!(output.stderr, "geometry missing\n");
    }

    #[tokio::test]
    async fn test_missing_script() {
        let dir = tempdir().unwrap();

        let result = ScriptModelRunner::new()
            .run(
                &invocation(dir.path().join("missing.sh"), dir.path()),
                &mut discard,
            )
            .await;

        assert!(matches!(result, Err(CommandError::SpawnError { .. })));
    }

    #[tokio::test]
    async fn test_sink_error_stops_the_run() {
        let dir = tempdir().unwrap();
        let script = write_script(dir.path(), "echo one\necho two");

        let result = sh()
            .run(&invocation(script, dir.path()), &mut |_: &str| -> std::io::Result<()> {
                Err(std::io::Error::other("disk full"))
            })
            .await;

        assert!(matches!(result, Err(CommandError::SinkError(_))));
    }

    #[tokio::test]
    async fn test_env_vars_are_passed() {
        let dir = tempdir().unwrap();
        let script = write_script(dir.path(), "echo \"$RAS_LIB_PATH\"");

        let mut lines = Vec::new();
        sh()
            .with_env_var("RAS_LIB_PATH", "/ras/libs")
            .run(&invocation(script, dir.path()), &mut |line: &str| -> std::io::Result<()> {
                lines.push(line.to_string());
                Ok(())
            })
            .await
            .unwrap();

        assert_eq!(lines, vec!["/ras/libs"]);
    }
}
