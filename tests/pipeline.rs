// ABOUTME: Tests for the deployment pipeline stages over fake collaborators.
// ABOUTME: Idempotent init, artifact flow, apply sequencing, and stage attribution.

mod support;

use caravel::cluster::{BuildOptions, DeploymentSummary, IngressInfo, ServiceSummary};
use caravel::config::{DeploymentRequest, ProcessDefaults, ResolvedDeployment, WorkloadKind};
use caravel::pipeline::{DeploymentPipeline, Stage, StageStatus};
use caravel::routing::TrafficSplitSpec;
use caravel::templates::TemplateCatalog;
use caravel::types::{ModelName, ModelTag};
use support::{FakeBuilder, FakeCluster, FakeMesh, write_templates};

struct Harness {
    dir: tempfile::TempDir,
    defaults: ProcessDefaults,
    catalog: TemplateCatalog,
    cluster: FakeCluster,
    builder: FakeBuilder,
    mesh: FakeMesh,
}

impl Harness {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        write_templates(&dir.path().join("templates"));

        Self {
            dir,
            defaults: ProcessDefaults::default(),
            catalog: TemplateCatalog::builtin(),
            cluster: FakeCluster::default(),
            builder: FakeBuilder::default(),
            mesh: FakeMesh::default(),
        }
    }

    fn pipeline(&self) -> DeploymentPipeline<'_, FakeCluster, FakeBuilder, FakeMesh> {
        DeploymentPipeline::new(
            &self.catalog,
            &self.defaults,
            &self.cluster,
            &self.builder,
            &self.mesh,
            self.dir.path(),
            self.dir.path().join("locks"),
        )
    }

    fn resolve(&self, request: DeploymentRequest) -> ResolvedDeployment {
        request.resolve(&self.defaults, self.dir.path()).unwrap()
    }

    fn request(&self) -> DeploymentRequest {
        DeploymentRequest {
            name: Some("mnist".to_string()),
            tag: Some("a".to_string()),
            model_type: Some("tensorflow".to_string()),
            templates_path: Some(
                self.dir.path().join("templates").to_string_lossy().into_owned(),
            ),
            build_context_path: Some(self.dir.path().to_string_lossy().into_owned()),
            ..Default::default()
        }
    }
}

fn mnist_ingress() -> IngressInfo {
    IngressInfo {
        name: "predict-mnist".to_string(),
        lb_hostname: Some("elb.example.com".to_string()),
        lb_ip: None,
        path: Some("/predict/mnist/.*".to_string()),
    }
}

#[tokio::test]
async fn init_scaffolds_then_reports_already_exists() {
    let harness = Harness::new();
    let resolved = harness.resolve(harness.request());
    let pipeline = harness.pipeline();

    let outcome = pipeline.init(&resolved).await.unwrap();
    assert_eq!(outcome.status, StageStatus::Complete);
    assert_eq!(outcome.rendered.len(), 1);
    let rendered = std::fs::read_to_string(&outcome.rendered[0]).unwrap();
    assert_eq!(rendered, "model: mnist:a\nruntime: tfserving\n");

    // Re-running is a no-op that reports the existing path.
    let again = pipeline.init(&resolved).await.unwrap();
    assert!(matches!(again.status, StageStatus::AlreadyExists(_)));
    assert!(again.rendered.is_empty());
}

#[tokio::test]
async fn build_renders_deterministic_dockerfile_and_builds_image() {
    let harness = Harness::new();
    // "./" keeps the path out of the base64 alphabet, so the opaque-encoding
    // detector cannot mistake it for an encoded payload.
    let mut request = harness.request();
    request.model_path = Some("./models/mnist".to_string());
    let resolved = harness.resolve(request);
    let pipeline = harness.pipeline();

    let outcome = pipeline
        .build(&resolved, &BuildOptions::default())
        .await
        .unwrap();

    let expected = harness.dir.path().join(
        ".caravel-generated-predict-mnist-a-tensorflow-tfserving-cpu-Dockerfile",
    );
    assert_eq!(outcome.dockerfile, expected);
    assert_eq!(outcome.image.to_string(), "docker.io/caravel/predict-mnist:a");

    let content = std::fs::read_to_string(&expected).unwrap();
    assert!(content.contains("FROM docker.io/caravel/predict-cpu:1.5.0"));
    assert!(content.contains("COPY models/mnist /opt/model"));

    let builds = harness.builder.builds.lock().unwrap();
    assert_eq!(builds.len(), 1);
    assert_eq!(builds[0].2, "docker.io/caravel/predict-mnist:a");

    // Re-building overwrites the same artifact path.
    drop(builds);
    let again = pipeline
        .build(&resolved, &BuildOptions::default())
        .await
        .unwrap();
    assert_eq!(again.dockerfile, expected);
}

#[tokio::test]
async fn build_without_model_path_is_a_config_error_before_any_build() {
    let harness = Harness::new();
    let resolved = harness.resolve(harness.request());
    let pipeline = harness.pipeline();

    let err = pipeline
        .build(&resolved, &BuildOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.stage(), Stage::Build);
    assert_eq!(err.identity(), "mnist:a");
    assert!(harness.builder.builds.lock().unwrap().is_empty());
}

#[tokio::test]
async fn deploy_applies_injected_manifests_and_resolves_endpoint() {
    let mut harness = Harness::new();
    harness.cluster.ingresses = vec![mnist_ingress()];
    let resolved = harness.resolve(harness.request());
    let pipeline = harness.pipeline();

    let outcome = pipeline.deploy(&resolved).await.unwrap();

    // deploy + ingress + svc + autoscale rendered.
    assert_eq!(outcome.artifacts.len(), 4);
    for artifact in &outcome.artifacts {
        assert!(artifact.output.exists());
    }

    // deploy, ingress, svc applied through the injector; autoscale rendered
    // but not applied.
    let applied = harness.cluster.applied.lock().unwrap();
    assert_eq!(applied.len(), 3);
    for path in applied.iter() {
        assert!(path.to_string_lossy().ends_with("-istio"));
    }
    assert!(
        !applied
            .iter()
            .any(|p| p.to_string_lossy().contains("autoscale"))
    );

    assert_eq!(
        outcome.endpoint_url,
        "http://elb.example.com/predict/mnist/invocations"
    );

    let deploy_yaml = std::fs::read_to_string(
        harness
            .dir
            .path()
            .join(".caravel-generated-predict-mnist-a-cpu-deploy.yaml"),
    )
    .unwrap();
    assert!(deploy_yaml.contains("name: predict-mnist-a"));
    assert!(deploy_yaml.contains("replicas: 1"));
}

#[tokio::test]
async fn route_renders_split_named_artifact_and_applies_it() {
    let harness = Harness::new();
    let pipeline = harness.pipeline();

    let name = ModelName::new("mnist").unwrap();
    let spec = TrafficSplitSpec::parse("a=100,b=0", "b").unwrap();
    let outcome = pipeline.route(&name, &spec, None, None).await.unwrap();

    let expected = harness.dir.path().join(
        ".caravel-generated-predict-mnist-split-a-100-b-0-shadow-b-router-routerules.yaml",
    );
    assert_eq!(outcome.artifact.output, expected);

    let content = std::fs::read_to_string(&expected).unwrap();
    assert!(content.contains("tags: [\"a\", \"b\"]"));
    assert!(content.contains("weights: [\"100\", \"0\"]"));
    assert!(content.contains("shadows: [\"b\"]"));

    let applied = harness.cluster.applied.lock().unwrap();
    assert_eq!(applied.as_slice(), &[expected]);
}

#[tokio::test]
async fn route_validation_failure_aborts_before_render_or_apply() {
    let harness = Harness::new();
    let pipeline = harness.pipeline();

    let name = ModelName::new("mnist").unwrap();
    let spec = TrafficSplitSpec::parse("a=60,b=39", "").unwrap();
    let err = pipeline.route(&name, &spec, None, None).await.unwrap_err();

    assert_eq!(err.stage(), Stage::Route);
    assert_eq!(err.identity(), "mnist");
    assert!(err.to_string().contains("route failed for 'mnist'"));
    assert!(err.to_string().contains("99"));

    assert!(harness.cluster.applied.lock().unwrap().is_empty());
    let leftovers: Vec<_> = std::fs::read_dir(harness.dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().contains("routerules"))
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn scale_matches_deployments_by_substring() {
    let mut harness = Harness::new();
    harness.cluster.deployments = vec![DeploymentSummary {
        name: "predict-mnist-a-7d9f8c".to_string(),
        replicas: Some(1),
        available_replicas: Some(1),
    }];
    let pipeline = harness.pipeline();

    let name = ModelName::new("mnist").unwrap();
    let tag = ModelTag::new("a").unwrap();
    let status = pipeline.scale(&name, &tag, 4, None, None).await.unwrap();
    assert_eq!(status, StageStatus::Complete);

    let scaled = harness.cluster.scaled.lock().unwrap();
    assert_eq!(scaled.as_slice(), &[("predict-mnist-a-7d9f8c".to_string(), 4)]);
}

#[tokio::test]
async fn scale_of_absent_deployment_reports_not_running() {
    let harness = Harness::new();
    let pipeline = harness.pipeline();

    let name = ModelName::new("mnist").unwrap();
    let tag = ModelTag::new("a").unwrap();
    let status = pipeline.scale(&name, &tag, 4, None, None).await.unwrap();
    assert_eq!(status, StageStatus::NotRunning("predict-mnist-a".to_string()));
    assert!(harness.cluster.scaled.lock().unwrap().is_empty());
}

#[tokio::test]
async fn stop_deletes_the_matched_deployment() {
    let mut harness = Harness::new();
    harness.cluster.deployments = vec![DeploymentSummary {
        name: "predict-mnist-a-7d9f8c".to_string(),
        replicas: Some(1),
        available_replicas: Some(1),
    }];
    let pipeline = harness.pipeline();

    let name = ModelName::new("mnist").unwrap();
    let tag = ModelTag::new("a").unwrap();
    let status = pipeline.stop(&name, &tag, None, None).await.unwrap();
    assert_eq!(status, StageStatus::Complete);
    assert_eq!(
        harness
            .cluster
            .deleted_deployments
            .lock()
            .unwrap()
            .as_slice(),
        &["predict-mnist-a-7d9f8c".to_string()]
    );
}

#[tokio::test]
async fn rollback_targets_the_requested_revision() {
    let mut harness = Harness::new();
    harness.cluster.deployments = vec![DeploymentSummary {
        name: "predict-mnist-a-7d9f8c".to_string(),
        replicas: Some(1),
        available_replicas: Some(1),
    }];
    let pipeline = harness.pipeline();

    let name = ModelName::new("mnist").unwrap();
    let tag = ModelTag::new("a").unwrap();
    pipeline
        .rollback(&name, &tag, Some(3), None, None)
        .await
        .unwrap();
    assert_eq!(
        harness.cluster.rollbacks.lock().unwrap().as_slice(),
        &[("predict-mnist-a-7d9f8c".to_string(), Some(3))]
    );
}

#[tokio::test]
async fn register_pushes_the_composed_image_reference() {
    let harness = Harness::new();
    let pipeline = harness.pipeline();

    let name = ModelName::new("mnist").unwrap();
    let tag = ModelTag::new("A").unwrap();
    let coordinates = harness.defaults.registry_coordinates(None, None, None);
    let image = pipeline.register(&name, &tag, &coordinates).await.unwrap();

    assert_eq!(image.to_string(), "docker.io/caravel/predict-mnist:a");
    assert_eq!(
        harness.builder.pushes.lock().unwrap().as_slice(),
        &["docker.io/caravel/predict-mnist:a".to_string()]
    );
}

#[tokio::test]
async fn stream_deploy_applies_manifests_and_composes_stream_url() {
    let mut harness = Harness::new();
    harness.cluster.services = vec![ServiceSummary {
        name: "stream-mnist-a".to_string(),
        lb_hostname: None,
        lb_ip: Some("10.0.0.7".to_string()),
    }];
    let mut request = harness.request();
    request.kind = WorkloadKind::Stream;
    let resolved = harness.resolve(request);
    let pipeline = harness.pipeline();

    let outcome = pipeline.stream_deploy(&resolved, true, true).await.unwrap();

    assert_eq!(outcome.artifacts.len(), 4);
    assert_eq!(harness.cluster.applied.lock().unwrap().len(), 4);
    assert_eq!(outcome.stream_url, "http://10.0.0.7/stream/mnist/a");
    assert_eq!(outcome.endpoint_url, "http://10.0.0.7/stream/mnist/a/topics");

    let deploy_yaml = std::fs::read_to_string(
        harness
            .dir
            .path()
            .join(".caravel-generated-stream-mnist-a-deploy.yaml"),
    )
    .unwrap();
    assert!(deploy_yaml.contains("name: stream-mnist-a"));
    assert!(deploy_yaml.contains("input: mnist-a-input"));
    assert!(deploy_yaml.contains("mqtt: true"));
}

#[tokio::test]
async fn concurrent_deploys_of_the_same_variant_contend_on_the_lock() {
    let mut harness = Harness::new();
    harness.cluster.ingresses = vec![mnist_ingress()];
    let resolved = harness.resolve(harness.request());
    let pipeline = harness.pipeline();

    // Hold the lock the deploy stage uses.
    let lock = caravel::pipeline::DeployLock::acquire(
        &harness.dir.path().join("locks"),
        "default-mnist-a-deploy",
        false,
    )
    .unwrap();

    let err = pipeline.deploy(&resolved).await.unwrap_err();
    assert_eq!(err.stage(), Stage::Deploy);
    assert!(harness.cluster.applied.lock().unwrap().is_empty());

    lock.release().unwrap();
    pipeline.deploy(&resolved).await.unwrap();
}

#[tokio::test]
async fn different_variants_render_to_distinct_artifacts() {
    let mut harness = Harness::new();
    harness.cluster.ingresses = vec![mnist_ingress()];
    let pipeline = harness.pipeline();

    let resolved_a = harness.resolve(harness.request());
    let mut request_b = harness.request();
    request_b.tag = Some("b".to_string());
    let resolved_b = harness.resolve(request_b);

    pipeline.deploy(&resolved_a).await.unwrap();
    pipeline.deploy(&resolved_b).await.unwrap();

    assert!(
        harness
            .dir
            .path()
            .join(".caravel-generated-predict-mnist-a-cpu-deploy.yaml")
            .exists()
    );
    assert!(
        harness
            .dir
            .path()
            .join(".caravel-generated-predict-mnist-b-cpu-deploy.yaml")
            .exists()
    );
}
