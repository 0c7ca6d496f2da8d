//! Process execution on top of `tokio::process`.

use crate::domain::model::{CommandOutput, CommandSpec};
use crate::domain::ports::CommandRunner;
use crate::utils::error::{HarnessError, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct TokioCommandRunner {
    timeout: Duration,
}

impl TokioCommandRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput> {
        tracing::debug!("Running `{}`", command);

        let mut process = tokio::process::Command::new(&command.program);
        process
            .args(&command.args)
            .envs(&command.envs)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &command.current_dir {
            process.current_dir(dir);
        }

        let child = process.spawn()?;

        // Dropping the child on timeout kills it.
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| HarnessError::CommandTimeout {
                command: command.to_string(),
                seconds: self.timeout.as_secs(),
            })??;

        let result = CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        tracing::debug!(
            "`{}` exited with {:?} ({} bytes stdout, {} bytes stderr)",
            command,
            result.code,
            result.stdout.len(),
            result.stderr.len()
        );
        Ok(result)
    }
}
