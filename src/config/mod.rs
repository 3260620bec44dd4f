// ABOUTME: Process-wide defaults and identity resolution for deployments.
// ABOUTME: Handles caravel.yml discovery and field-by-field defaulting.

mod path_arg;
mod request;

pub use path_arg::{PathArg, normalize_path, normalize_relative_to};
pub use request::{DeploymentRequest, ResolvedDeployment, WorkloadKind};

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::types::{Chip, RegistryCoordinates};

pub const CONFIG_FILENAME: &str = "caravel.yml";
pub const CONFIG_FILENAME_ALT: &str = "caravel.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".caravel/config.yml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required field: {0}")]
    MissingRequiredField(&'static str),

    #[error("argument is base64-encoded but does not decode to UTF-8: {0}")]
    InvalidEncoding(String),

    #[error("invalid model name: {0}")]
    InvalidName(#[from] crate::types::ModelNameError),

    #[error("invalid model tag: {0}")]
    InvalidTag(#[from] crate::types::ModelTagError),

    #[error("invalid field value: {0}")]
    InvalidValue(#[from] crate::types::ParseEnumError),

    #[error("configuration file not found in {0}")]
    NotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Process-wide defaults applied to any request field the caller left unset.
///
/// Every field has a built-in default mirroring the serving platform's
/// conventions; a `caravel.yml` in the working directory overrides them.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProcessDefaults {
    pub image_registry_url: String,
    pub image_registry_repo: String,
    pub predict_namespace: String,
    pub train_namespace: String,
    pub stream_namespace: String,
    pub image_registry_base_tag: String,
    pub chip: Chip,
    pub cluster_namespace: String,
    pub templates_path: String,
    pub build_context_path: String,
    #[serde(with = "humantime_serde")]
    pub apply_timeout: Duration,
}

impl Default for ProcessDefaults {
    fn default() -> Self {
        Self {
            image_registry_url: "docker.io".to_string(),
            image_registry_repo: "caravel".to_string(),
            predict_namespace: "predict".to_string(),
            train_namespace: "train".to_string(),
            stream_namespace: "stream".to_string(),
            image_registry_base_tag: "1.5.0".to_string(),
            chip: Chip::Cpu,
            cluster_namespace: "default".to_string(),
            templates_path: "templates".to_string(),
            build_context_path: ".".to_string(),
            apply_timeout: Duration::from_secs(1200),
        }
    }
}

impl ProcessDefaults {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(ConfigError::from)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Find and load a defaults file in `dir`, falling back to the built-in
    /// defaults when none of the candidate files exists.
    pub fn discover(dir: &Path) -> Result<Self, ConfigError> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Ok(Self::default())
    }

    /// Registry coordinates for an image operation that does not need a
    /// fully resolved deployment (push/pull know only name and tag).
    pub fn registry_coordinates(
        &self,
        url: Option<&str>,
        repo: Option<&str>,
        namespace: Option<&str>,
    ) -> RegistryCoordinates {
        RegistryCoordinates {
            url: url.unwrap_or(&self.image_registry_url).to_string(),
            repo: repo.unwrap_or(&self.image_registry_repo).to_string(),
            namespace: namespace.unwrap_or(&self.predict_namespace).to_string(),
            base_tag: self.image_registry_base_tag.clone(),
            base_chip: self.chip,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_defaults_match_platform_conventions() {
        let d = ProcessDefaults::default();
        assert_eq!(d.image_registry_url, "docker.io");
        assert_eq!(d.predict_namespace, "predict");
        assert_eq!(d.chip, Chip::Cpu);
        assert_eq!(d.apply_timeout, Duration::from_secs(1200));
    }

    #[test]
    fn partial_yaml_overrides_only_named_fields() {
        let d = ProcessDefaults::from_yaml(
            "image_registry_url: registry.example.com\napply_timeout: 5m\n",
        )
        .unwrap();
        assert_eq!(d.image_registry_url, "registry.example.com");
        assert_eq!(d.apply_timeout, Duration::from_secs(300));
        assert_eq!(d.image_registry_repo, "caravel");
    }
}
