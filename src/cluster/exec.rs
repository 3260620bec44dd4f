// ABOUTME: Shared child-process runner with a hard timeout.
// ABOUTME: All external CLIs (kubectl, docker, istioctl) go through here.

use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

/// Why a child process produced no usable output.
#[derive(Debug)]
pub(crate) enum ExecError {
    Timeout(Duration),
    Io(std::io::Error),
}

/// Run a command, killing it if `timeout` elapses. There is no cancellation
/// propagation beyond the kill; a killed external command may leave partial
/// remote state, which the idempotent stages tolerate by re-running.
pub(crate) async fn run(cmd: &mut Command, timeout: Duration) -> Result<Output, ExecError> {
    cmd.kill_on_drop(true);
    tracing::debug!(command = ?cmd.as_std(), "running external command");

    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(ExecError::Io(e)),
        Err(_) => Err(ExecError::Timeout(timeout)),
    }
}

pub(crate) fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

pub(crate) fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}
