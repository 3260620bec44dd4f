// ABOUTME: Service-mesh sidecar injection trait.
// ABOUTME: Takes a rendered manifest, returns a sidecar-injected manifest path.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    #[error("sidecar injection failed (exit {code:?}): {stderr}")]
    InjectFailed { code: Option<i32>, stderr: String },

    #[error("sidecar injection timed out after {0:?}")]
    Timeout(Duration),

    #[error("I/O error during sidecar injection: {0}")]
    Io(#[from] std::io::Error),
}

/// Sidecar-injection step applied to rendered manifests before they reach
/// the control plane.
#[async_trait]
pub trait MeshOps: Send + Sync {
    /// Inject the mesh sidecar into `manifest` and return the path of the
    /// injected manifest file (the caller applies it afterwards).
    async fn inject(
        &self,
        manifest: &Path,
        namespace: &str,
        timeout: Duration,
    ) -> Result<PathBuf, MeshError>;
}
