// ABOUTME: Deployment pipeline sequencing init, build, register, deploy, route.
// ABOUTME: Stages are independently idempotent; no local stage ledger is kept.

mod artifacts;
mod error;
mod lock;
mod stages;

pub use artifacts::GENERATED_PREFIX;
pub use error::PipelineError;
pub use lock::{DeployLock, LockError, LockInfo};
pub use stages::{BuildOutcome, DeployOutcome, InitOutcome, RouteOutcome, StreamOutcome};

use std::fmt;
use std::path::PathBuf;

use crate::cluster::{ClusterOps, ImageBuildOps, MeshOps};
use crate::config::ProcessDefaults;
use crate::templates::TemplateCatalog;

/// The pipeline stage a request targets; every failure names its stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    Build,
    Register,
    Pull,
    Deploy,
    Route,
    Scale,
    Autoscale,
    Rollback,
    Stop,
    StreamDeploy,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Init => "init",
            Stage::Build => "build",
            Stage::Register => "register",
            Stage::Pull => "pull",
            Stage::Deploy => "deploy",
            Stage::Route => "route",
            Stage::Scale => "scale",
            Stage::Autoscale => "autoscale",
            Stage::Rollback => "rollback",
            Stage::Stop => "stop",
            Stage::StreamDeploy => "stream-deploy",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Non-fatal completion status for idempotent stages. Pre-existing state
/// that already satisfies the caller's intent is reported, not failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageStatus {
    Complete,
    /// The target already exists; nothing was written.
    AlreadyExists(PathBuf),
    /// No matching deployment is running; nothing to act on.
    NotRunning(String),
}

/// Orchestrates the external collaborators through one stage at a time.
///
/// Holds no mutable state: the current stage of a variant is inferred by
/// querying the cluster, never from a local ledger, so any stage can be
/// re-run safely after a failure.
pub struct DeploymentPipeline<'a, C, B, M>
where
    C: ClusterOps + ?Sized,
    B: ImageBuildOps + ?Sized,
    M: MeshOps + ?Sized,
{
    catalog: &'a TemplateCatalog,
    defaults: &'a ProcessDefaults,
    cluster: &'a C,
    builder: &'a B,
    mesh: &'a M,
    /// Anchor for normalizing relative paths (normally the working dir).
    base_dir: PathBuf,
    /// Where deploy-lock files live.
    state_dir: PathBuf,
}

impl<'a, C, B, M> DeploymentPipeline<'a, C, B, M>
where
    C: ClusterOps + ?Sized,
    B: ImageBuildOps + ?Sized,
    M: MeshOps + ?Sized,
{
    pub fn new(
        catalog: &'a TemplateCatalog,
        defaults: &'a ProcessDefaults,
        cluster: &'a C,
        builder: &'a B,
        mesh: &'a M,
        base_dir: impl Into<PathBuf>,
        state_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            catalog,
            defaults,
            cluster,
            builder,
            mesh,
            base_dir: base_dir.into(),
            state_dir: state_dir.into(),
        }
    }
}
