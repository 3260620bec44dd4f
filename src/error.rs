// ABOUTME: Application-wide error type for the caravel CLI.
// ABOUTME: Joins configuration, routing, and pipeline failures at the top level.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    #[error(transparent)]
    Template(#[from] crate::templates::TemplateError),

    #[error(transparent)]
    Validation(#[from] crate::routing::ValidationError),

    #[error(transparent)]
    Pipeline(#[from] crate::pipeline::PipelineError),

    #[error(transparent)]
    Cluster(#[from] crate::cluster::ClusterError),

    #[error(transparent)]
    Stream(#[from] crate::cluster::StreamError),

    #[error("invalid model name: {0}")]
    InvalidName(#[from] crate::types::ModelNameError),

    #[error("invalid model tag: {0}")]
    InvalidTag(#[from] crate::types::ModelTagError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
