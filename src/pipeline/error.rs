// ABOUTME: Pipeline error wrapper attaching stage and identity to every failure.
// ABOUTME: Multi-stage pipelines make root-causing ambiguous without this.

use snafu::Snafu;

use super::Stage;
use crate::cluster::{BuildError, ClusterError, MeshError};
use crate::config::ConfigError;
use crate::routing::ValidationError;
use crate::templates::TemplateError;

/// A stage failure, carrying exactly which stage and which identity it
/// pertains to. Configuration, template, and validation failures happen
/// before any external call; external failures are surfaced verbatim and
/// never retried here (stages are idempotent, so the caller may).
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PipelineError {
    #[snafu(display("{stage} failed for '{identity}': {source}"))]
    Config {
        stage: Stage,
        identity: String,
        source: ConfigError,
    },

    #[snafu(display("{stage} failed for '{identity}': {source}"))]
    Template {
        stage: Stage,
        identity: String,
        source: TemplateError,
    },

    #[snafu(display("{stage} failed for '{identity}': {source}"))]
    Validation {
        stage: Stage,
        identity: String,
        source: ValidationError,
    },

    #[snafu(display("{stage} failed for '{identity}': {source}"))]
    Cluster {
        stage: Stage,
        identity: String,
        source: ClusterError,
    },

    #[snafu(display("{stage} failed for '{identity}': {source}"))]
    ImageBuild {
        stage: Stage,
        identity: String,
        source: BuildError,
    },

    #[snafu(display("{stage} failed for '{identity}': {source}"))]
    Mesh {
        stage: Stage,
        identity: String,
        source: MeshError,
    },

    #[snafu(display("{stage} failed for '{identity}': {message}"))]
    Lock {
        stage: Stage,
        identity: String,
        message: String,
    },

    #[snafu(display("{stage} failed for '{identity}': {source}"))]
    Io {
        stage: Stage,
        identity: String,
        source: std::io::Error,
    },
}

impl PipelineError {
    /// The stage this failure happened in.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Config { stage, .. }
            | PipelineError::Template { stage, .. }
            | PipelineError::Validation { stage, .. }
            | PipelineError::Cluster { stage, .. }
            | PipelineError::ImageBuild { stage, .. }
            | PipelineError::Mesh { stage, .. }
            | PipelineError::Lock { stage, .. }
            | PipelineError::Io { stage, .. } => *stage,
        }
    }

    /// The model identity the failing stage was operating on.
    pub fn identity(&self) -> &str {
        match self {
            PipelineError::Config { identity, .. }
            | PipelineError::Template { identity, .. }
            | PipelineError::Validation { identity, .. }
            | PipelineError::Cluster { identity, .. }
            | PipelineError::ImageBuild { identity, .. }
            | PipelineError::Mesh { identity, .. }
            | PipelineError::Lock { identity, .. }
            | PipelineError::Io { identity, .. } => identity,
        }
    }
}
