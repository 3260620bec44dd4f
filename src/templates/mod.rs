// ABOUTME: Template catalog and manifest renderer.
// ABOUTME: Maps flavors to template files and materializes them with a context.

mod catalog;
mod render;

pub use catalog::{Facet, TemplateCatalog, TemplateDescriptor};
pub use render::{CtxValue, ManifestRenderer, RenderContext, RenderedArtifact};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("no {facet} template registered for flavor '{flavor}'")]
    UnknownFlavor { facet: Facet, flavor: String },

    #[error("template not found: {path}")]
    TemplateNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("template {template} references undefined variable '{name}'")]
    UndefinedVariable { name: String, template: PathBuf },

    #[error("failed to write rendered artifact {path}")]
    Render {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
