// ABOUTME: DeploymentRequest with explicit optional fields and one resolve step.
// ABOUTME: Replaces ad-hoc per-call defaulting with a single defaulting table.

use std::path::PathBuf;
use std::str::FromStr;

use super::path_arg::{PathArg, normalize_path, normalize_relative_to};
use super::{ConfigError, ProcessDefaults};
use crate::types::{Chip, ModelName, ModelTag, ModelType, ModelVariant, RegistryCoordinates, Runtime};

/// Which workload family a request targets; selects the default image
/// registry namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkloadKind {
    #[default]
    Predict,
    Train,
    Stream,
}

/// One deployment request as received from the CLI boundary.
///
/// Every field the caller may omit is an `Option`; `resolve` applies the
/// defaulting table in one place. Path-like fields may be base64-encoded to
/// survive URL-path transport and are decoded exactly once here.
#[derive(Debug, Clone, Default)]
pub struct DeploymentRequest {
    pub name: Option<String>,
    pub tag: Option<String>,
    pub model_type: Option<String>,
    pub runtime: Option<String>,
    pub chip: Option<String>,
    pub kind: WorkloadKind,
    pub namespace: Option<String>,
    pub model_path: Option<String>,
    pub build_context_path: Option<String>,
    pub templates_path: Option<String>,
    pub registry_url: Option<String>,
    pub registry_repo: Option<String>,
    pub registry_namespace: Option<String>,
    pub registry_base_tag: Option<String>,
    pub registry_base_chip: Option<String>,
    pub memory_limit: Option<String>,
    pub core_limit: Option<String>,
    pub target_core_util_percentage: Option<u32>,
    pub min_replicas: Option<u32>,
    pub max_replicas: Option<u32>,
    pub stream_logger_topic: Option<String>,
    pub stream_input_topic: Option<String>,
    pub stream_output_topic: Option<String>,
    pub stream_logger_url: Option<String>,
    pub stream_input_url: Option<String>,
    pub stream_output_url: Option<String>,
}

/// A fully-resolved deployment: every field concrete, every path normalized.
#[derive(Debug, Clone)]
pub struct ResolvedDeployment {
    pub variant: ModelVariant,
    pub registry: RegistryCoordinates,
    pub kind: WorkloadKind,
    pub namespace: String,
    /// Model artifact path, relative to the build context.
    pub model_path: Option<PathBuf>,
    /// Absolute build context directory.
    pub build_context: PathBuf,
    /// Absolute templates root.
    pub templates_path: PathBuf,
    pub memory_limit: String,
    pub core_limit: String,
    pub target_core_util_percentage: u32,
    pub min_replicas: u32,
    pub max_replicas: u32,
    pub stream_logger_topic: String,
    pub stream_input_topic: String,
    pub stream_output_topic: String,
    pub stream_logger_url: String,
    pub stream_input_url: String,
    pub stream_output_url: String,
}

impl DeploymentRequest {
    /// Normalize the identity and fill every unset field from the process
    /// defaults. Pure data transformation: no filesystem or network access;
    /// `base_dir` supplies the anchor for absolutizing relative paths.
    pub fn resolve(
        &self,
        defaults: &ProcessDefaults,
        base_dir: &std::path::Path,
    ) -> Result<ResolvedDeployment, ConfigError> {
        let name = self
            .name
            .as_deref()
            .ok_or(ConfigError::MissingRequiredField("name"))?;
        let name = ModelName::new(name)?;

        let tag = self
            .tag
            .as_deref()
            .ok_or(ConfigError::MissingRequiredField("tag"))?;
        let tag = ModelTag::new(tag)?;

        let model_type = self
            .model_type
            .as_deref()
            .ok_or(ConfigError::MissingRequiredField("type"))?;
        let model_type = ModelType::from_str(model_type)?;

        let chip = match self.chip.as_deref() {
            Some(c) => Chip::from_str(c)?,
            None => defaults.chip,
        };

        let runtime = match self.runtime.as_deref() {
            Some(r) => Runtime::from_str(r)?,
            None => model_type.default_runtime(),
        };

        let registry_namespace = self.registry_namespace.clone().unwrap_or_else(|| match self
            .kind
        {
            WorkloadKind::Predict => defaults.predict_namespace.clone(),
            WorkloadKind::Train => defaults.train_namespace.clone(),
            WorkloadKind::Stream => defaults.stream_namespace.clone(),
        });

        // An explicit base-chip override wins; otherwise the base image
        // follows the chip the variant resolved to.
        let base_chip = match self.registry_base_chip.as_deref() {
            Some(c) => Chip::from_str(c)?,
            None => chip,
        };

        let registry = RegistryCoordinates {
            url: self
                .registry_url
                .clone()
                .unwrap_or_else(|| defaults.image_registry_url.clone()),
            repo: self
                .registry_repo
                .clone()
                .unwrap_or_else(|| defaults.image_registry_repo.clone()),
            namespace: registry_namespace,
            base_tag: self
                .registry_base_tag
                .clone()
                .unwrap_or_else(|| defaults.image_registry_base_tag.clone()),
            base_chip,
        };

        let build_context = normalize_path(
            self.build_context_path
                .as_deref()
                .unwrap_or(&defaults.build_context_path),
            base_dir,
        );

        let templates_path = normalize_path(
            self.templates_path
                .as_deref()
                .unwrap_or(&defaults.templates_path),
            base_dir,
        );

        // Model paths may arrive base64-encoded through URL-path transport;
        // decode once, then absolutize and re-relativize against the build
        // context so relative and absolute inputs agree.
        let model_path = match &self.model_path {
            Some(raw) => {
                let literal = PathArg::detect(raw).into_path()?;
                Some(normalize_relative_to(&literal, base_dir, &build_context))
            }
            None => None,
        };

        let stream_logger_topic = self
            .stream_logger_topic
            .clone()
            .unwrap_or_else(|| format!("{}-{}-logger", name, tag));
        let stream_input_topic = self
            .stream_input_topic
            .clone()
            .unwrap_or_else(|| format!("{}-{}-input", name, tag));
        let stream_output_topic = self
            .stream_output_topic
            .clone()
            .unwrap_or_else(|| format!("{}-{}-output", name, tag));

        Ok(ResolvedDeployment {
            variant: ModelVariant {
                name,
                tag,
                model_type,
                runtime,
                chip,
            },
            registry,
            kind: self.kind,
            namespace: self
                .namespace
                .clone()
                .unwrap_or_else(|| defaults.cluster_namespace.clone()),
            model_path,
            build_context,
            templates_path,
            memory_limit: self.memory_limit.clone().unwrap_or_else(|| "2Gi".to_string()),
            core_limit: self.core_limit.clone().unwrap_or_else(|| "1000m".to_string()),
            target_core_util_percentage: self.target_core_util_percentage.unwrap_or(50),
            min_replicas: self.min_replicas.unwrap_or(1),
            max_replicas: self.max_replicas.unwrap_or(2),
            stream_logger_topic,
            stream_input_topic,
            stream_output_topic,
            stream_logger_url: self.stream_logger_url.clone().unwrap_or_default(),
            stream_input_url: self.stream_input_url.clone().unwrap_or_default(),
            stream_output_url: self.stream_output_url.clone().unwrap_or_default(),
        })
    }
}
