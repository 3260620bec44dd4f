// ABOUTME: Shared test doubles for the collaborator traits.
// ABOUTME: Fakes record calls and serve canned cluster state.

// Each test binary only uses some of these helpers, so allow dead_code.
#![allow(dead_code)]

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use caravel::cluster::{
    BuildError, BuildOptions, ClusterError, ClusterOps, DeploymentSummary, ImageBuildOps,
    IngressInfo, MeshError, MeshOps, ServiceSummary,
};
use caravel::types::ImageRef;

/// Canned cluster state plus a record of every mutating call.
#[derive(Default)]
pub struct FakeCluster {
    pub deployments: Vec<DeploymentSummary>,
    pub services: Vec<ServiceSummary>,
    pub ingresses: Vec<IngressInfo>,
    /// `None` makes the controller query itself fail.
    pub node_port: Option<String>,
    pub host_ip: Option<String>,
    pub applied: Mutex<Vec<PathBuf>>,
    pub deleted: Mutex<Vec<PathBuf>>,
    pub scaled: Mutex<Vec<(String, u32)>>,
    pub autoscaled: Mutex<Vec<(String, u32, u32, u32)>>,
    pub deleted_deployments: Mutex<Vec<String>>,
    pub rollbacks: Mutex<Vec<(String, Option<u32>)>>,
}

impl FakeCluster {
    pub fn with_ingress(ingress: IngressInfo) -> Self {
        Self {
            ingresses: vec![ingress],
            ..Default::default()
        }
    }
}

#[async_trait]
impl ClusterOps for FakeCluster {
    async fn list_deployments(
        &self,
        _namespace: &str,
    ) -> Result<Vec<DeploymentSummary>, ClusterError> {
        Ok(self.deployments.clone())
    }

    async fn list_services(&self, _namespace: &str) -> Result<Vec<ServiceSummary>, ClusterError> {
        Ok(self.services.clone())
    }

    async fn list_ingresses(&self, _namespace: &str) -> Result<Vec<IngressInfo>, ClusterError> {
        Ok(self.ingresses.clone())
    }

    async fn read_ingress(
        &self,
        name: &str,
        _namespace: &str,
    ) -> Result<IngressInfo, ClusterError> {
        self.ingresses
            .iter()
            .find(|i| i.name.contains(name))
            .cloned()
            .ok_or_else(|| ClusterError::NotFound(name.to_string()))
    }

    async fn read_service(
        &self,
        name: &str,
        _namespace: &str,
    ) -> Result<ServiceSummary, ClusterError> {
        self.services
            .iter()
            .find(|s| s.name.contains(name))
            .cloned()
            .ok_or_else(|| ClusterError::NotFound(name.to_string()))
    }

    async fn apply_manifest(
        &self,
        path: &Path,
        _namespace: &str,
        _timeout: Duration,
    ) -> Result<(), ClusterError> {
        self.applied.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }

    async fn delete_manifest(
        &self,
        path: &Path,
        _namespace: &str,
        _timeout: Duration,
    ) -> Result<(), ClusterError> {
        self.deleted.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }

    async fn scale_deployment(
        &self,
        name: &str,
        replicas: u32,
        _namespace: &str,
    ) -> Result<(), ClusterError> {
        self.scaled.lock().unwrap().push((name.to_string(), replicas));
        Ok(())
    }

    async fn autoscale_deployment(
        &self,
        name: &str,
        cpu_percent: u32,
        min_replicas: u32,
        max_replicas: u32,
        _namespace: &str,
    ) -> Result<(), ClusterError> {
        self.autoscaled
            .lock()
            .unwrap()
            .push((name.to_string(), cpu_percent, min_replicas, max_replicas));
        Ok(())
    }

    async fn delete_deployment(&self, name: &str, _namespace: &str) -> Result<(), ClusterError> {
        self.deleted_deployments
            .lock()
            .unwrap()
            .push(name.to_string());
        Ok(())
    }

    async fn rollback_deployment(
        &self,
        name: &str,
        revision: Option<u32>,
        _namespace: &str,
    ) -> Result<(), ClusterError> {
        self.rollbacks
            .lock()
            .unwrap()
            .push((name.to_string(), revision));
        Ok(())
    }

    async fn ingress_controller_node_port(&self) -> Result<String, ClusterError> {
        self.node_port.clone().ok_or(ClusterError::CommandFailed {
            code: Some(1),
            stderr: "no controller service".to_string(),
        })
    }

    async fn ingress_controller_host_ip(&self) -> Result<String, ClusterError> {
        self.host_ip.clone().ok_or(ClusterError::CommandFailed {
            code: Some(1),
            stderr: "no controller pod".to_string(),
        })
    }
}

/// Records build/push/pull invocations.
#[derive(Default)]
pub struct FakeBuilder {
    pub builds: Mutex<Vec<(PathBuf, PathBuf, String)>>,
    pub pushes: Mutex<Vec<String>>,
    pub pulls: Mutex<Vec<String>>,
}

#[async_trait]
impl ImageBuildOps for FakeBuilder {
    async fn build(
        &self,
        dockerfile: &Path,
        context: &Path,
        image: &ImageRef,
        _options: &BuildOptions,
        _timeout: Duration,
    ) -> Result<(), BuildError> {
        self.builds.lock().unwrap().push((
            dockerfile.to_path_buf(),
            context.to_path_buf(),
            image.to_string(),
        ));
        Ok(())
    }

    async fn push(&self, image: &ImageRef, _timeout: Duration) -> Result<(), BuildError> {
        self.pushes.lock().unwrap().push(image.to_string());
        Ok(())
    }

    async fn pull(&self, image: &ImageRef, _timeout: Duration) -> Result<(), BuildError> {
        self.pulls.lock().unwrap().push(image.to_string());
        Ok(())
    }
}

/// Copies the manifest to `{path}-istio`, like the real injector.
#[derive(Default)]
pub struct FakeMesh {
    pub injected: Mutex<Vec<PathBuf>>,
}

#[async_trait]
impl MeshOps for FakeMesh {
    async fn inject(
        &self,
        manifest: &Path,
        _namespace: &str,
        _timeout: Duration,
    ) -> Result<PathBuf, MeshError> {
        self.injected.lock().unwrap().push(manifest.to_path_buf());
        let mut injected = manifest.as_os_str().to_os_string();
        injected.push("-istio");
        let injected = PathBuf::from(injected);
        std::fs::copy(manifest, &injected)?;
        Ok(injected)
    }
}

/// Lay down a minimal templates tree for pipeline tests.
pub fn write_templates(root: &Path) {
    let write = |rel: &str, body: &str| {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    };

    write(
        "docker/predict-server-local-dockerfile.template",
        "FROM {{ IMAGE_REGISTRY_URL }}/{{ IMAGE_REGISTRY_REPO }}/{{ IMAGE_REGISTRY_NAMESPACE }}-{{ IMAGE_REGISTRY_BASE_CHIP }}:{{ IMAGE_REGISTRY_BASE_TAG }}\nCOPY {{ MODEL_PATH }} /opt/model\n",
    );
    write(
        "yaml/predict-deploy.yaml.template",
        "kind: Deployment\nname: {{ IMAGE_REGISTRY_NAMESPACE }}-{{ MODEL_NAME }}-{{ MODEL_TAG }}\nreplicas: {{ MIN_REPLICAS }}\n",
    );
    write(
        "yaml/predict-ingress.yaml.template",
        "kind: Ingress\nname: {{ IMAGE_REGISTRY_NAMESPACE }}-{{ MODEL_NAME }}\n",
    );
    write(
        "yaml/predict-svc.yaml.template",
        "kind: Service\nname: {{ IMAGE_REGISTRY_NAMESPACE }}-{{ MODEL_NAME }}\n",
    );
    write(
        "yaml/predict-autoscale.yaml.template",
        "kind: HorizontalPodAutoscaler\ntarget: {{ TARGET_CORE_UTIL_PERCENTAGE }}\n",
    );
    write(
        "yaml/predict-routerules.yaml.template",
        "kind: RouteRule\ntags: {{ MODEL_SPLIT_TAG_LIST }}\nweights: {{ MODEL_SPLIT_WEIGHT_LIST }}\nshadows: {{ MODEL_SHADOW_TAG_LIST }}\n",
    );
    write(
        "models/tensorflow/model-server.yaml",
        "model: {{ MODEL_NAME }}:{{ MODEL_TAG }}\nruntime: {{ MODEL_RUNTIME }}\n",
    );
    write(
        "yaml/stream-svc.yaml.template",
        "kind: Service\nname: {{ IMAGE_REGISTRY_NAMESPACE }}-{{ MODEL_NAME }}-{{ MODEL_TAG }}\n",
    );
    write(
        "yaml/stream-deploy.yaml.template",
        "kind: Deployment\nname: {{ IMAGE_REGISTRY_NAMESPACE }}-{{ MODEL_NAME }}-{{ MODEL_TAG }}\ninput: {{ STREAM_INPUT_TOPIC }}\nmqtt: {{ STREAM_ENABLE_MQTT }}\n",
    );
    write(
        "yaml/stream-ingress.yaml.template",
        "kind: Ingress\nname: {{ IMAGE_REGISTRY_NAMESPACE }}-{{ MODEL_NAME }}-{{ MODEL_TAG }}\n",
    );
    write(
        "yaml/stream-routerules.yaml.template",
        "kind: RouteRule\nname: {{ IMAGE_REGISTRY_NAMESPACE }}-{{ MODEL_NAME }}-{{ MODEL_TAG }}\n",
    );
}
