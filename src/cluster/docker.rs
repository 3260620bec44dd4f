// ABOUTME: ImageBuildOps implementation driving the docker CLI.
// ABOUTME: Build with proxy/no-cache/squash args, push, and pull.

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;

use super::exec::{self, ExecError};
use super::traits::{BuildError, BuildOptions, ImageBuildOps};
use crate::types::ImageRef;

/// Drives the local `docker` binary (or a compatible drop-in named by the
/// caller, e.g. `podman`).
#[derive(Debug, Clone)]
pub struct DockerCli {
    program: String,
}

impl DockerCli {
    pub fn new() -> Self {
        Self {
            program: "docker".to_string(),
        }
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new()
    }
}

fn map_exec_build(e: ExecError) -> BuildError {
    match e {
        ExecError::Timeout(d) => BuildError::Timeout(d),
        ExecError::Io(e) => BuildError::Io(e),
    }
}

#[async_trait]
impl ImageBuildOps for DockerCli {
    async fn build(
        &self,
        dockerfile: &Path,
        context: &Path,
        image: &ImageRef,
        options: &BuildOptions,
        timeout: Duration,
    ) -> Result<(), BuildError> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("build");
        if options.no_cache {
            cmd.arg("--no-cache");
        }
        if options.squash {
            cmd.arg("--squash");
        }
        if let Some(proxy) = &options.http_proxy {
            cmd.arg("--build-arg").arg(format!("HTTP_PROXY={proxy}"));
        }
        if let Some(proxy) = &options.https_proxy {
            cmd.arg("--build-arg").arg(format!("HTTPS_PROXY={proxy}"));
        }
        cmd.arg("-t")
            .arg(image.to_string())
            .arg("-f")
            .arg(dockerfile)
            .arg(context);

        let output = exec::run(&mut cmd, timeout).await.map_err(map_exec_build)?;
        if !output.status.success() {
            return Err(BuildError::BuildFailed {
                code: output.status.code(),
                stderr: exec::stderr_of(&output),
            });
        }
        Ok(())
    }

    async fn push(&self, image: &ImageRef, timeout: Duration) -> Result<(), BuildError> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("push").arg(image.to_string());

        let output = exec::run(&mut cmd, timeout).await.map_err(map_exec_build)?;
        if !output.status.success() {
            return Err(BuildError::PushFailed {
                code: output.status.code(),
                stderr: exec::stderr_of(&output),
            });
        }
        Ok(())
    }

    async fn pull(&self, image: &ImageRef, timeout: Duration) -> Result<(), BuildError> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("pull").arg(image.to_string());

        let output = exec::run(&mut cmd, timeout).await.map_err(map_exec_build)?;
        if !output.status.success() {
            return Err(BuildError::PullFailed {
                code: output.status.code(),
                stderr: exec::stderr_of(&output),
            });
        }
        Ok(())
    }
}
