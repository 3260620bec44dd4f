// ABOUTME: MeshOps implementation driving istioctl kube-inject.
// ABOUTME: Writes the injected manifest next to the original with an -istio suffix.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

use super::exec::{self, ExecError};
use super::traits::{MeshError, MeshOps};

/// Drives `istioctl kube-inject` on rendered manifests.
#[derive(Debug, Clone, Default)]
pub struct IstioCli;

impl IstioCli {
    pub fn new() -> Self {
        Self
    }
}

fn map_exec_mesh(e: ExecError) -> MeshError {
    match e {
        ExecError::Timeout(d) => MeshError::Timeout(d),
        ExecError::Io(e) => MeshError::Io(e),
    }
}

#[async_trait]
impl MeshOps for IstioCli {
    async fn inject(
        &self,
        manifest: &Path,
        _namespace: &str,
        timeout: Duration,
    ) -> Result<PathBuf, MeshError> {
        let mut cmd = Command::new("istioctl");
        cmd.arg("kube-inject").arg("-f").arg(manifest);

        let output = exec::run(&mut cmd, timeout).await.map_err(map_exec_mesh)?;
        if !output.status.success() {
            return Err(MeshError::InjectFailed {
                code: output.status.code(),
                stderr: exec::stderr_of(&output),
            });
        }

        // `{manifest}-istio`, beside the original, so it is regenerable and
        // disposable the same way the un-injected artifact is.
        let mut injected = manifest.as_os_str().to_os_string();
        injected.push("-istio");
        let injected = PathBuf::from(injected);
        std::fs::write(&injected, &output.stdout)?;

        tracing::debug!(manifest = %manifest.display(), injected = %injected.display(), "sidecar injected");
        Ok(injected)
    }
}
