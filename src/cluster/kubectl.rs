// ABOUTME: ClusterOps implementation driving the kubectl CLI.
// ABOUTME: Reads parse -o json; writes shell out to apply/delete/scale/autoscale.

use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;

use super::exec::{self, ExecError};
use super::traits::{ClusterError, ClusterOps, DeploymentSummary, IngressInfo, ServiceSummary};

/// Default timeout for quick read operations; applies get their own
/// caller-supplied timeout because image pulls can take many minutes.
const READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Drives `kubectl` against whatever context the operator's kubeconfig
/// selects.
#[derive(Debug, Clone)]
pub struct KubectlClient {
    /// Namespace holding the ingress controller.
    mesh_namespace: String,
}

impl KubectlClient {
    pub fn new() -> Self {
        Self {
            mesh_namespace: "istio-system".to_string(),
        }
    }

    pub fn with_mesh_namespace(mesh_namespace: impl Into<String>) -> Self {
        Self {
            mesh_namespace: mesh_namespace.into(),
        }
    }

    async fn kubectl_json(&self, args: &[&str]) -> Result<Value, ClusterError> {
        let mut cmd = Command::new("kubectl");
        cmd.args(args).args(["-o", "json"]);
        let output = exec::run(&mut cmd, READ_TIMEOUT).await.map_err(map_exec)?;

        if !output.status.success() {
            let stderr = exec::stderr_of(&output);
            if stderr.contains("NotFound") || stderr.contains("not found") {
                return Err(ClusterError::NotFound(args.join(" ")));
            }
            return Err(ClusterError::CommandFailed {
                code: output.status.code(),
                stderr,
            });
        }

        serde_json::from_slice(&output.stdout).map_err(|e| ClusterError::Parse(e.to_string()))
    }

    async fn kubectl_run(&self, args: &[&str], timeout: Duration) -> Result<(), ClusterError> {
        let mut cmd = Command::new("kubectl");
        cmd.args(args);
        let output = exec::run(&mut cmd, timeout).await.map_err(map_exec)?;

        if !output.status.success() {
            return Err(ClusterError::CommandFailed {
                code: output.status.code(),
                stderr: exec::stderr_of(&output),
            });
        }
        Ok(())
    }

    async fn kubectl_value(&self, args: &[&str]) -> Result<String, ClusterError> {
        let mut cmd = Command::new("kubectl");
        cmd.args(args);
        let output = exec::run(&mut cmd, READ_TIMEOUT).await.map_err(map_exec)?;

        if !output.status.success() {
            return Err(ClusterError::CommandFailed {
                code: output.status.code(),
                stderr: exec::stderr_of(&output),
            });
        }
        Ok(exec::stdout_of(&output))
    }
}

impl Default for KubectlClient {
    fn default() -> Self {
        Self::new()
    }
}

fn map_exec(e: ExecError) -> ClusterError {
    match e {
        ExecError::Timeout(d) => ClusterError::Timeout(d),
        ExecError::Io(e) => ClusterError::Io(e),
    }
}

fn name_of(item: &Value) -> String {
    item.pointer("/metadata/name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn lb_ingress(item: &Value) -> (Option<String>, Option<String>) {
    let first = item.pointer("/status/loadBalancer/ingress/0");
    let hostname = first
        .and_then(|v| v.get("hostname"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let ip = first
        .and_then(|v| v.get("ip"))
        .and_then(Value::as_str)
        .map(str::to_string);
    (hostname, ip)
}

fn ingress_info(item: &Value) -> IngressInfo {
    let (lb_hostname, lb_ip) = lb_ingress(item);
    IngressInfo {
        name: name_of(item),
        lb_hostname,
        lb_ip,
        path: item
            .pointer("/spec/rules/0/http/paths/0/path")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

fn service_summary(item: &Value) -> ServiceSummary {
    let (lb_hostname, lb_ip) = lb_ingress(item);
    ServiceSummary {
        name: name_of(item),
        lb_hostname,
        lb_ip,
    }
}

#[async_trait]
impl ClusterOps for KubectlClient {
    async fn list_deployments(
        &self,
        namespace: &str,
    ) -> Result<Vec<DeploymentSummary>, ClusterError> {
        let json = self
            .kubectl_json(&["get", "deployments", "--namespace", namespace])
            .await?;
        let items = json
            .get("items")
            .and_then(Value::as_array)
            .ok_or_else(|| ClusterError::Parse("missing items in deployment list".into()))?;

        Ok(items
            .iter()
            .map(|item| DeploymentSummary {
                name: name_of(item),
                replicas: item.pointer("/spec/replicas").and_then(Value::as_i64),
                available_replicas: item
                    .pointer("/status/availableReplicas")
                    .and_then(Value::as_i64),
            })
            .collect())
    }

    async fn list_services(&self, namespace: &str) -> Result<Vec<ServiceSummary>, ClusterError> {
        let json = self
            .kubectl_json(&["get", "services", "--namespace", namespace])
            .await?;
        let items = json
            .get("items")
            .and_then(Value::as_array)
            .ok_or_else(|| ClusterError::Parse("missing items in service list".into()))?;

        Ok(items.iter().map(service_summary).collect())
    }

    async fn list_ingresses(&self, namespace: &str) -> Result<Vec<IngressInfo>, ClusterError> {
        let json = self
            .kubectl_json(&["get", "ingress", "--namespace", namespace])
            .await?;
        let items = json
            .get("items")
            .and_then(Value::as_array)
            .ok_or_else(|| ClusterError::Parse("missing items in ingress list".into()))?;

        Ok(items.iter().map(ingress_info).collect())
    }

    async fn read_ingress(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<IngressInfo, ClusterError> {
        let json = self
            .kubectl_json(&["get", "ingress", name, "--namespace", namespace])
            .await?;
        Ok(ingress_info(&json))
    }

    async fn read_service(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<ServiceSummary, ClusterError> {
        let json = self
            .kubectl_json(&["get", "service", name, "--namespace", namespace])
            .await?;
        Ok(service_summary(&json))
    }

    async fn apply_manifest(
        &self,
        path: &Path,
        namespace: &str,
        timeout: Duration,
    ) -> Result<(), ClusterError> {
        let path = path.to_string_lossy();
        self.kubectl_run(
            &["apply", "--namespace", namespace, "-f", path.as_ref()],
            timeout,
        )
        .await
    }

    async fn delete_manifest(
        &self,
        path: &Path,
        namespace: &str,
        timeout: Duration,
    ) -> Result<(), ClusterError> {
        let path = path.to_string_lossy();
        self.kubectl_run(
            &["delete", "--namespace", namespace, "-f", path.as_ref()],
            timeout,
        )
        .await
    }

    async fn scale_deployment(
        &self,
        name: &str,
        replicas: u32,
        namespace: &str,
    ) -> Result<(), ClusterError> {
        let replicas_arg = format!("--replicas={replicas}");
        self.kubectl_run(
            &[
                "scale",
                "deploy",
                name,
                &replicas_arg,
                "--namespace",
                namespace,
            ],
            READ_TIMEOUT,
        )
        .await
    }

    async fn autoscale_deployment(
        &self,
        name: &str,
        cpu_percent: u32,
        min_replicas: u32,
        max_replicas: u32,
        namespace: &str,
    ) -> Result<(), ClusterError> {
        let cpu = format!("--cpu-percent={cpu_percent}");
        let min = format!("--min={min_replicas}");
        let max = format!("--max={max_replicas}");
        self.kubectl_run(
            &[
                "autoscale",
                "deployment",
                name,
                &cpu,
                &min,
                &max,
                "--namespace",
                namespace,
            ],
            READ_TIMEOUT,
        )
        .await
    }

    async fn delete_deployment(&self, name: &str, namespace: &str) -> Result<(), ClusterError> {
        self.kubectl_run(
            &["delete", "deploy", name, "--namespace", namespace],
            READ_TIMEOUT,
        )
        .await
    }

    async fn rollback_deployment(
        &self,
        name: &str,
        revision: Option<u32>,
        namespace: &str,
    ) -> Result<(), ClusterError> {
        let deploy_ref = format!("deploy/{name}");
        let revision_arg = revision.map(|r| format!("--to-revision={r}"));
        let mut args: Vec<&str> = vec!["rollout", "undo", &deploy_ref, "--namespace", namespace];
        if let Some(ref revision_arg) = revision_arg {
            args.push(revision_arg);
        }
        self.kubectl_run(&args, READ_TIMEOUT).await
    }

    async fn ingress_controller_node_port(&self) -> Result<String, ClusterError> {
        self.kubectl_value(&[
            "get",
            "svc",
            "-n",
            &self.mesh_namespace,
            "istio-ingress",
            "-o",
            "jsonpath={.spec.ports[0].nodePort}",
        ])
        .await
    }

    async fn ingress_controller_host_ip(&self) -> Result<String, ClusterError> {
        self.kubectl_value(&[
            "get",
            "po",
            "-n",
            &self.mesh_namespace,
            "-l",
            "istio=ingress",
            "-o",
            "jsonpath={.items[0].status.hostIP}",
        ])
        .await
    }
}
