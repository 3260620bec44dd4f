// ABOUTME: Cluster control-plane operations trait.
// ABOUTME: List/read resources, apply/delete manifests, scale deployments.

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// Summary of one deployment resource.
#[derive(Debug, Clone)]
pub struct DeploymentSummary {
    pub name: String,
    pub replicas: Option<i64>,
    pub available_replicas: Option<i64>,
}

/// Summary of one service resource, including any load-balancer address.
#[derive(Debug, Clone)]
pub struct ServiceSummary {
    pub name: String,
    pub lb_hostname: Option<String>,
    pub lb_ip: Option<String>,
}

/// The routing-relevant slice of an ingress resource.
#[derive(Debug, Clone)]
pub struct IngressInfo {
    pub name: String,
    pub lb_hostname: Option<String>,
    pub lb_ip: Option<String>,
    /// Path of the first HTTP rule, e.g. `/predict/mnist/.*`.
    pub path: Option<String>,
}

/// Errors from the cluster control plane, preserving the underlying
/// status or exit code for the caller's retry decision.
#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("cluster command failed (exit {code:?}): {stderr}")]
    CommandFailed { code: Option<i32>, stderr: String },

    #[error("cluster command timed out after {0:?}")]
    Timeout(Duration),

    #[error("could not parse cluster response: {0}")]
    Parse(String),

    #[error("I/O error talking to cluster: {0}")]
    Io(#[from] std::io::Error),
}

/// Control-plane operations the orchestrator drives.
///
/// All name matching against generated resource names is substring
/// containment, mirroring the platform's naming convention
/// `{registry-namespace}-{name}-{tag}` and its facet variants.
#[async_trait]
pub trait ClusterOps: Send + Sync {
    async fn list_deployments(
        &self,
        namespace: &str,
    ) -> Result<Vec<DeploymentSummary>, ClusterError>;

    async fn list_services(&self, namespace: &str) -> Result<Vec<ServiceSummary>, ClusterError>;

    async fn list_ingresses(&self, namespace: &str) -> Result<Vec<IngressInfo>, ClusterError>;

    async fn read_ingress(&self, name: &str, namespace: &str)
    -> Result<IngressInfo, ClusterError>;

    async fn read_service(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<ServiceSummary, ClusterError>;

    async fn apply_manifest(
        &self,
        path: &Path,
        namespace: &str,
        timeout: Duration,
    ) -> Result<(), ClusterError>;

    async fn delete_manifest(
        &self,
        path: &Path,
        namespace: &str,
        timeout: Duration,
    ) -> Result<(), ClusterError>;

    async fn scale_deployment(
        &self,
        name: &str,
        replicas: u32,
        namespace: &str,
    ) -> Result<(), ClusterError>;

    async fn autoscale_deployment(
        &self,
        name: &str,
        cpu_percent: u32,
        min_replicas: u32,
        max_replicas: u32,
        namespace: &str,
    ) -> Result<(), ClusterError>;

    async fn delete_deployment(&self, name: &str, namespace: &str) -> Result<(), ClusterError>;

    /// Roll a deployment back to its previous (or a specific) revision.
    async fn rollback_deployment(
        &self,
        name: &str,
        revision: Option<u32>,
        namespace: &str,
    ) -> Result<(), ClusterError>;

    /// Node port of the ingress controller's service.
    async fn ingress_controller_node_port(&self) -> Result<String, ClusterError>;

    /// Host IP of the node running the ingress controller.
    async fn ingress_controller_host_ip(&self) -> Result<String, ClusterError>;
}
