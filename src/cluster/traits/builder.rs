// ABOUTME: Image builder and registry operations trait.
// ABOUTME: Build a model-server image, push it, pull it back down.

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use crate::types::ImageRef;

/// Knobs forwarded to the underlying image build.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    pub no_cache: bool,
    pub squash: bool,
    pub http_proxy: Option<String>,
    pub https_proxy: Option<String>,
}

/// Errors from image build/push/pull, preserving the exit code.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("image build failed (exit {code:?}): {stderr}")]
    BuildFailed { code: Option<i32>, stderr: String },

    #[error("image push failed (exit {code:?}): {stderr}")]
    PushFailed { code: Option<i32>, stderr: String },

    #[error("image pull failed (exit {code:?}): {stderr}")]
    PullFailed { code: Option<i32>, stderr: String },

    #[error("image operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("I/O error running image tool: {0}")]
    Io(#[from] std::io::Error),
}

/// Image builder/registry operations.
#[async_trait]
pub trait ImageBuildOps: Send + Sync {
    /// Build `image` from `dockerfile` with `context` as the build context.
    async fn build(
        &self,
        dockerfile: &Path,
        context: &Path,
        image: &ImageRef,
        options: &BuildOptions,
        timeout: Duration,
    ) -> Result<(), BuildError>;

    async fn push(&self, image: &ImageRef, timeout: Duration) -> Result<(), BuildError>;

    async fn pull(&self, image: &ImageRef, timeout: Duration) -> Result<(), BuildError>;
}
