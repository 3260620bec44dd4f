// ABOUTME: Managed inference endpoint operations trait (SageMaker-style).
// ABOUTME: Narrow seam only; no concrete cloud client ships with the CLI.

use async_trait::async_trait;

/// One production variant and its relative traffic weight on a managed
/// endpoint.
#[derive(Debug, Clone)]
pub struct VariantWeight {
    pub variant_name: String,
    pub weight: u32,
}

/// Status snapshot of a managed endpoint.
#[derive(Debug, Clone)]
pub struct ManagedEndpointStatus {
    pub endpoint_name: String,
    pub status: String,
    pub variant_weights: Vec<VariantWeight>,
}

#[derive(Debug, thiserror::Error)]
pub enum ManagedEndpointError {
    #[error("managed endpoint not found: {0}")]
    NotFound(String),

    #[error("managed endpoint operation failed ({status}): {message}")]
    Failed { status: String, message: String },
}

/// Managed-inference-endpoint operations.
///
/// The weighted-variant update is the managed-service analogue of the
/// cluster route stage: weights are validated by the same traffic-split
/// policy before they reach this seam.
#[async_trait]
pub trait ManagedEndpointOps: Send + Sync {
    async fn create_model(
        &self,
        model_name: &str,
        image: &str,
        region: &str,
    ) -> Result<(), ManagedEndpointError>;

    async fn create_endpoint_config(
        &self,
        config_name: &str,
        variants: &[VariantWeight],
    ) -> Result<(), ManagedEndpointError>;

    async fn update_endpoint_weights(
        &self,
        endpoint_name: &str,
        variants: &[VariantWeight],
    ) -> Result<(), ManagedEndpointError>;

    async fn create_endpoint(
        &self,
        endpoint_name: &str,
        config_name: &str,
    ) -> Result<(), ManagedEndpointError>;

    async fn describe_endpoint(
        &self,
        endpoint_name: &str,
    ) -> Result<ManagedEndpointStatus, ManagedEndpointError>;

    async fn delete_endpoint(&self, endpoint_name: &str) -> Result<(), ManagedEndpointError>;

    async fn delete_endpoint_config(&self, config_name: &str)
    -> Result<(), ManagedEndpointError>;
}
