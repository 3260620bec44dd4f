// ABOUTME: Resolves externally reachable URLs for deployed variants.
// ABOUTME: Fixed fallback chain; always produces some string for display.

use crate::cluster::{ClusterError, ClusterOps, IngressInfo};

/// Placeholder tokens substituted when the controller queries themselves
/// fail. Endpoint resolution exists for display and diagnostics, so it must
/// degrade to something readable rather than abort.
const NODEPORT_PLACEHOLDER: &str = "<ingress-controller-nodeport>";
const IP_PLACEHOLDER: &str = "<ingress-controller-ip>";

/// The serving protocol exposes predictions at this literal path; the
/// ingress path's trailing wildcard is rewritten to it.
const INVOCATIONS_SUFFIX: &str = "invocations";

/// Resolves reachable endpoint URLs through the cluster control plane.
pub struct EndpointResolver<'a, C: ClusterOps + ?Sized> {
    cluster: &'a C,
}

impl<'a, C: ClusterOps + ?Sized> EndpointResolver<'a, C> {
    pub fn new(cluster: &'a C) -> Self {
        Self { cluster }
    }

    /// Resolve the URL of a model's ingress.
    ///
    /// Fallback chain, first success wins: load-balancer hostname, then
    /// load-balancer IP, then `{controller-host-ip}:{controller-node-port}`
    /// with placeholder tokens for any controller query that itself fails.
    /// Only a missing ingress resource is an error; an ingress with no
    /// address still resolves to a best-effort string.
    pub async fn resolve(
        &self,
        model_name: &str,
        namespace: &str,
        registry_namespace: &str,
    ) -> Result<String, ClusterError> {
        let ingress_name = format!("{registry_namespace}-{model_name}");
        let ingress = self.cluster.read_ingress(&ingress_name, namespace).await?;
        Ok(self.endpoint_from_ingress(&ingress).await)
    }

    /// Resolve the URLs of every model ingress in a namespace.
    pub async fn resolve_all(&self, namespace: &str) -> Result<Vec<String>, ClusterError> {
        let ingresses = self.cluster.list_ingresses(namespace).await?;
        let mut endpoints = Vec::with_capacity(ingresses.len());
        for ingress in &ingresses {
            endpoints.push(self.endpoint_from_ingress(ingress).await);
        }
        Ok(endpoints)
    }

    /// Resolve the address of a cluster service's load balancer, falling
    /// back to the controller address pair. Used for stream URLs.
    pub async fn cluster_service_endpoint(
        &self,
        service_name: &str,
        namespace: &str,
    ) -> Result<String, ClusterError> {
        let service = self.cluster.read_service(service_name, namespace).await?;
        if let Some(hostname) = service.lb_hostname {
            return Ok(hostname);
        }
        if let Some(ip) = service.lb_ip {
            return Ok(ip);
        }
        Ok(self.controller_endpoint().await)
    }

    async fn endpoint_from_ingress(&self, ingress: &IngressInfo) -> String {
        let endpoint = if let Some(hostname) = &ingress.lb_hostname {
            hostname.clone()
        } else if let Some(ip) = &ingress.lb_ip {
            ip.clone()
        } else {
            self.controller_endpoint().await
        };

        let path = ingress.path.as_deref().unwrap_or("");
        let url = format!("http://{endpoint}{path}");
        url.replace(".*", INVOCATIONS_SUFFIX)
    }

    async fn controller_endpoint(&self) -> String {
        let node_port = match self.cluster.ingress_controller_node_port().await {
            Ok(port) if !port.is_empty() => port,
            _ => NODEPORT_PLACEHOLDER.to_string(),
        };
        let host_ip = match self.cluster.ingress_controller_host_ip().await {
            Ok(ip) if !ip.is_empty() => ip,
            _ => IP_PLACEHOLDER.to_string(),
        };
        format!("{host_ip}:{node_port}")
    }
}

/// URL of a variant on the managed inference service. The managed runtime
/// serves predictions at the same literal `invocations` path the ingress
/// rewrite targets.
pub fn managed_endpoint_url(model_name: &str, region: &str, registry_namespace: &str) -> String {
    format!(
        "https://runtime.sagemaker.{region}.amazonaws.com/endpoints/{registry_namespace}-{model_name}/{INVOCATIONS_SUFFIX}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn managed_url_embeds_region_and_namespace() {
        assert_eq!(
            managed_endpoint_url("mnist", "us-west-2", "predict"),
            "https://runtime.sagemaker.us-west-2.amazonaws.com/endpoints/predict-mnist/invocations"
        );
    }
}
