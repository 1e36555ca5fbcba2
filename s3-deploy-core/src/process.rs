use async_trait::async_trait;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;

use crate::command::CommandSpec;
use crate::contract::{CommandRunner, PathProbe};
use crate::error::ExecError;

/// Checks paths against the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl PathProbe for LocalFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Runs commands as child processes of this one.
///
/// The child inherits this process's environment, with the command's `envs`
/// layered on top.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }

    fn command(cmd: &CommandSpec) -> Command {
        let mut command = Command::new(&cmd.program);
        command.args(&cmd.args);
        command.envs(cmd.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        command
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run_streaming(&self, cmd: &CommandSpec) -> Result<(), ExecError> {
        tracing::debug!(command = %cmd, "Launching command with inherited stdio");
        let status = Self::command(cmd)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, program = %cmd.program, "Failed to launch process");
                ExecError::Launch {
                    program: cmd.program.clone(),
                    source: e,
                }
            })?;

        if status.success() {
            tracing::info!(command = %cmd, status = ?status, "Command succeeded");
            Ok(())
        } else {
            tracing::error!(command = %cmd, status = ?status, "Command exited with non-zero status");
            Err(exit_error(cmd, status, None))
        }
    }

    async fn run_captured(&self, cmd: &CommandSpec) -> Result<String, ExecError> {
        tracing::debug!(command = %cmd, "Launching command with captured output");
        let output = Self::command(cmd)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, program = %cmd.program, "Failed to launch process");
                ExecError::Launch {
                    program: cmd.program.clone(),
                    source: e,
                }
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.status.success() {
            tracing::info!(command = %cmd, status = ?output.status, "Command succeeded");
            tracing::debug!(stdout = %stdout, "Captured command output");
            Ok(stdout)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::error!(
                command = %cmd,
                status = ?output.status,
                stderr = %stderr,
                "Command exited with non-zero status"
            );
            Err(exit_error(cmd, output.status, Some(stderr)))
        }
    }
}

fn exit_error(cmd: &CommandSpec, status: ExitStatus, stderr: Option<String>) -> ExecError {
    ExecError::Exit {
        command: cmd.to_string(),
        status: status.to_string(),
        stderr: stderr.filter(|s| !s.is_empty()),
    }
}
