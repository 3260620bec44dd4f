// ABOUTME: Model variant identity and image registry coordinates.
// ABOUTME: A variant plus coordinates fully determines the image reference.

use serde::Serialize;

use super::image_ref::ImageRef;
use super::model_name::ModelName;
use super::model_tag::ModelTag;
use super::model_type::{Chip, ModelType, Runtime};

/// Identity of one deployable model unit.
///
/// Immutable once resolved; a re-deploy constructs a fresh variant with the
/// same key rather than mutating an existing one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelVariant {
    pub name: ModelName,
    pub tag: ModelTag,
    pub model_type: ModelType,
    pub runtime: Runtime,
    pub chip: Chip,
}

impl ModelVariant {
    /// The `{namespace}-{name}-{tag}` service name this variant deploys as.
    /// Cluster resource lookups match on containment of this string.
    pub fn service_name(&self, registry_namespace: &str) -> String {
        format!("{}-{}-{}", registry_namespace, self.name, self.tag)
    }

    /// Short identity string used in stage error reporting.
    pub fn identity(&self) -> String {
        format!("{}:{}", self.name, self.tag)
    }
}

/// Where built images live.
///
/// Recomputed from defaults plus overrides on every call; the orchestrator
/// never persists these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryCoordinates {
    pub url: String,
    pub repo: String,
    pub namespace: String,
    pub base_tag: String,
    pub base_chip: Chip,
}

impl RegistryCoordinates {
    /// Fully-qualified image reference for a model variant:
    /// `url/repo/namespace-name:tag`.
    pub fn image_ref(&self, name: &ModelName, tag: &ModelTag) -> ImageRef {
        ImageRef::parse(&format!(
            "{}/{}/{}-{}:{}",
            self.url, self.repo, self.namespace, name, tag
        ))
        .expect("image reference composed from validated components")
    }

    /// The base serving image this registry namespace builds FROM:
    /// `url/repo/namespace-chip:base_tag`.
    pub fn base_image_ref(&self) -> ImageRef {
        ImageRef::parse(&format!(
            "{}/{}/{}-{}:{}",
            self.url, self.repo, self.namespace, self.base_chip, self.base_tag
        ))
        .expect("base image reference composed from validated components")
    }
}
