// ABOUTME: Stage methods for the deployment pipeline.
// ABOUTME: Each stage resolves locally, renders, then makes one external-apply pass.

use snafu::ResultExt;
use std::path::{Path, PathBuf};

use super::artifacts;
use super::error::{
    ClusterSnafu, ConfigSnafu, ImageBuildSnafu, IoSnafu, LockSnafu, MeshSnafu, TemplateSnafu,
    ValidationSnafu,
};
use super::lock::DeployLock;
use super::{DeploymentPipeline, PipelineError, Stage, StageStatus};
use crate::cluster::{BuildOptions, ClusterOps, ImageBuildOps, MeshOps};
use crate::config::{ConfigError, ResolvedDeployment, normalize_path};
use crate::endpoint::EndpointResolver;
use crate::routing::TrafficSplitSpec;
use crate::templates::{Facet, ManifestRenderer, RenderContext, RenderedArtifact, TemplateError};
use crate::types::{ImageRef, ModelName, ModelTag, RegistryCoordinates};

/// Result of the init stage.
#[derive(Debug)]
pub struct InitOutcome {
    pub model_path: PathBuf,
    pub rendered: Vec<PathBuf>,
    pub status: StageStatus,
}

/// Result of the build stage.
#[derive(Debug)]
pub struct BuildOutcome {
    pub dockerfile: PathBuf,
    pub image: ImageRef,
}

/// Result of the deploy stage.
#[derive(Debug)]
pub struct DeployOutcome {
    pub artifacts: Vec<RenderedArtifact>,
    pub endpoint_url: String,
}

/// Result of the route stage.
#[derive(Debug)]
pub struct RouteOutcome {
    pub artifact: RenderedArtifact,
}

/// Result of the stream-deploy stage.
#[derive(Debug)]
pub struct StreamOutcome {
    pub artifacts: Vec<RenderedArtifact>,
    pub stream_url: String,
    pub endpoint_url: String,
}

impl<'a, C, B, M> DeploymentPipeline<'a, C, B, M>
where
    C: ClusterOps + ?Sized,
    B: ImageBuildOps + ?Sized,
    M: MeshOps + ?Sized,
{
    /// Scaffold a model directory from the per-type starter templates.
    ///
    /// Idempotent: an existing path is reported as already existing and
    /// nothing is written; the caller decides whether that satisfies them.
    pub async fn init(&self, resolved: &ResolvedDeployment) -> Result<InitOutcome, PipelineError> {
        let stage = Stage::Init;
        let identity = resolved.variant.identity();
        let v = &resolved.variant;

        let rel = match &resolved.model_path {
            Some(p) => p.clone(),
            None => PathBuf::from(format!("{}/{}-{}", v.model_type, v.name, v.tag)),
        };
        let target = normalize_path(&rel.to_string_lossy(), &resolved.build_context);

        if target.exists() {
            return Ok(InitOutcome {
                model_path: target.clone(),
                rendered: Vec::new(),
                status: StageStatus::AlreadyExists(target),
            });
        }

        let scaffold_rel = format!("models/{}", v.model_type);
        let scaffold_dir = resolved.templates_path.join(&scaffold_rel);
        let mut templates = Vec::new();
        collect_templates(&scaffold_dir, Path::new(""), &mut templates)
            .map_err(|source| TemplateError::TemplateNotFound {
                path: scaffold_dir.clone(),
                source,
            })
            .context(TemplateSnafu {
                stage,
                identity: identity.clone(),
            })?;
        templates.sort();

        let mut ctx = RenderContext::new();
        ctx.set("MODEL_NAME", v.name.as_str())
            .set("MODEL_TAG", v.tag.as_str())
            .set("MODEL_TYPE", v.model_type.as_str())
            .set("MODEL_RUNTIME", v.runtime.as_str())
            .set("MODEL_CHIP", v.chip.as_str());

        let renderer = ManifestRenderer::new(&resolved.templates_path);
        let mut rendered = Vec::new();
        for template in &templates {
            let output = target.join(template);
            if let Some(parent) = output.parent() {
                std::fs::create_dir_all(parent).context(IoSnafu {
                    stage,
                    identity: identity.clone(),
                })?;
            }
            let template_rel = format!("{}/{}", scaffold_rel, template.to_string_lossy());
            let artifact = renderer
                .render(&template_rel, &ctx, Facet::ModelScaffold, |_| output.clone())
                .context(TemplateSnafu {
                    stage,
                    identity: identity.clone(),
                })?;
            rendered.push(artifact.output);
        }

        Ok(InitOutcome {
            model_path: target,
            rendered,
            status: StageStatus::Complete,
        })
    }

    /// Render the server Dockerfile and build the variant image.
    pub async fn build(
        &self,
        resolved: &ResolvedDeployment,
        options: &BuildOptions,
    ) -> Result<BuildOutcome, PipelineError> {
        let stage = Stage::Build;
        let identity = resolved.variant.identity();
        let v = &resolved.variant;

        let model_path = resolved
            .model_path
            .as_ref()
            .ok_or(ConfigError::MissingRequiredField("model-path"))
            .context(ConfigSnafu {
                stage,
                identity: identity.clone(),
            })?;

        let flavor = match resolved.kind {
            crate::config::WorkloadKind::Train => "train-server",
            _ => "predict-server",
        };
        let template = self
            .dockerfile_template(flavor)
            .context(TemplateSnafu {
                stage,
                identity: identity.clone(),
            })?;

        let mut ctx = RenderContext::new();
        ctx.set("MODEL_NAME", v.name.as_str())
            .set("MODEL_TAG", v.tag.as_str())
            .set("MODEL_PATH", model_path.to_string_lossy().to_string())
            .set("MODEL_TYPE", v.model_type.as_str())
            .set("MODEL_RUNTIME", v.runtime.as_str())
            .set("MODEL_CHIP", v.chip.as_str());
        set_stream_vars(&mut ctx, resolved);
        set_registry_vars(&mut ctx, resolved);

        let renderer = ManifestRenderer::new(&resolved.templates_path);
        let dockerfile = artifacts::dockerfile_path(resolved);
        renderer
            .render(template, &ctx, Facet::Dockerfile, |_| dockerfile.clone())
            .context(TemplateSnafu {
                stage,
                identity: identity.clone(),
            })?;

        let image = resolved.registry.image_ref(&v.name, &v.tag);
        self.builder
            .build(
                &dockerfile,
                &resolved.build_context,
                &image,
                options,
                self.defaults.apply_timeout,
            )
            .await
            .context(ImageBuildSnafu { stage, identity })?;

        Ok(BuildOutcome { dockerfile, image })
    }

    /// Push a variant image to its registry. Needs only the identity and
    /// coordinates, not a fully resolved deployment.
    pub async fn register(
        &self,
        name: &ModelName,
        tag: &ModelTag,
        registry: &RegistryCoordinates,
    ) -> Result<ImageRef, PipelineError> {
        let image = registry.image_ref(name, tag);
        self.builder
            .push(&image, self.defaults.apply_timeout)
            .await
            .context(ImageBuildSnafu {
                stage: Stage::Register,
                identity: format!("{name}:{tag}"),
            })?;
        Ok(image)
    }

    /// Pull a variant image from its registry.
    pub async fn pull(
        &self,
        name: &ModelName,
        tag: &ModelTag,
        registry: &RegistryCoordinates,
    ) -> Result<ImageRef, PipelineError> {
        let image = registry.image_ref(name, tag);
        self.builder
            .pull(&image, self.defaults.apply_timeout)
            .await
            .context(ImageBuildSnafu {
                stage: Stage::Pull,
                identity: format!("{name}:{tag}"),
            })?;
        Ok(image)
    }

    /// Render and apply the serving manifests, then resolve the endpoint.
    ///
    /// The deploy, svc, and ingress manifests go through sidecar injection
    /// before apply; the autoscale manifest is rendered for inspection but
    /// only applied by the autoscale verb. Re-running regenerates and
    /// re-applies (overwrite semantics).
    pub async fn deploy(
        &self,
        resolved: &ResolvedDeployment,
    ) -> Result<DeployOutcome, PipelineError> {
        let stage = Stage::Deploy;
        let identity = resolved.variant.identity();
        let v = &resolved.variant;

        let mut ctx = RenderContext::new();
        ctx.set("MODEL_NAME", v.name.as_str())
            .set("MODEL_TAG", v.tag.as_str())
            .set("NAMESPACE", resolved.namespace.as_str());
        set_stream_vars(&mut ctx, resolved);
        ctx.set("CORE_LIMIT", resolved.core_limit.as_str())
            .set("MEMORY_LIMIT", resolved.memory_limit.as_str())
            .set(
                "TARGET_CORE_UTIL_PERCENTAGE",
                resolved.target_core_util_percentage,
            )
            .set("MIN_REPLICAS", resolved.min_replicas)
            .set("MAX_REPLICAS", resolved.max_replicas);
        set_registry_vars(&mut ctx, resolved);

        let deploy_flavor = match v.chip {
            crate::types::Chip::Gpu => "predict-router-gpu-split",
            crate::types::Chip::Cpu => "predict-router-split",
        };

        let renderer = ManifestRenderer::new(&resolved.templates_path);
        let out_dir = resolved.build_context.clone();

        let to_render: [(Facet, &str, PathBuf); 4] = [
            (
                Facet::RouterDeploy,
                deploy_flavor,
                artifacts::deploy_yaml_path(&out_dir, resolved),
            ),
            (
                Facet::RouterIngress,
                "predict-router-split",
                artifacts::ingress_yaml_path(&out_dir, resolved),
            ),
            (
                Facet::RouterSvc,
                "predict-router-split",
                artifacts::svc_yaml_path(&out_dir, resolved),
            ),
            (
                Facet::RouterAutoscale,
                "predict-router-split",
                artifacts::autoscale_yaml_path(&out_dir, resolved),
            ),
        ];

        let mut rendered = Vec::new();
        for (facet, flavor, output) in to_render {
            let files = self.catalog.resolve(facet, flavor).context(TemplateSnafu {
                stage,
                identity: identity.clone(),
            })?;
            for template in files {
                let artifact = renderer
                    .render(template, &ctx, facet, |_| output.clone())
                    .context(TemplateSnafu {
                        stage,
                        identity: identity.clone(),
                    })?;
                rendered.push(artifact);
            }
        }

        let lock_key = format!("{}-{}-{}-deploy", resolved.namespace, v.name, v.tag);
        let lock = DeployLock::acquire(&self.state_dir, &lock_key, false).map_err(|e| {
            LockSnafu {
                stage,
                identity: identity.clone(),
                message: e.to_string(),
            }
            .build()
        })?;

        for artifact in &rendered {
            if artifact.facet == Facet::RouterAutoscale {
                continue;
            }
            let injected = self
                .mesh
                .inject(
                    &artifact.output,
                    &resolved.namespace,
                    self.defaults.apply_timeout,
                )
                .await
                .context(MeshSnafu {
                    stage,
                    identity: identity.clone(),
                })?;
            self.cluster
                .apply_manifest(&injected, &resolved.namespace, self.defaults.apply_timeout)
                .await
                .context(ClusterSnafu {
                    stage,
                    identity: identity.clone(),
                })?;
        }

        if let Err(e) = lock.release() {
            tracing::warn!("failed to release deploy lock: {e}");
        }

        let endpoint_url = EndpointResolver::new(self.cluster)
            .resolve(v.name.as_str(), &resolved.namespace, &resolved.registry.namespace)
            .await
            .context(ClusterSnafu { stage, identity })?;

        Ok(DeployOutcome {
            artifacts: rendered,
            endpoint_url: endpoint_url.trim_end_matches('/').to_string(),
        })
    }

    /// Validate a traffic split and apply its route rules.
    ///
    /// Validation failures abort before any render or apply; no partial
    /// routing state is left behind by this stage.
    pub async fn route(
        &self,
        model_name: &ModelName,
        spec: &TrafficSplitSpec,
        namespace: Option<&str>,
        registry_namespace: Option<&str>,
    ) -> Result<RouteOutcome, PipelineError> {
        let stage = Stage::Route;
        let identity = model_name.to_string();
        let namespace = namespace.unwrap_or(&self.defaults.cluster_namespace);
        let registry_namespace =
            registry_namespace.unwrap_or(&self.defaults.predict_namespace);

        spec.validate().context(ValidationSnafu {
            stage,
            identity: identity.clone(),
        })?;

        let ctx = spec.build_route_context(registry_namespace, model_name.as_str());

        let files = self
            .catalog
            .resolve(Facet::RouterRouteRules, "predict-router")
            .context(TemplateSnafu {
                stage,
                identity: identity.clone(),
            })?;
        let template = files
            .into_iter()
            .next()
            .ok_or_else(|| TemplateError::UnknownFlavor {
                facet: Facet::RouterRouteRules,
                flavor: "predict-router".to_string(),
            })
            .context(TemplateSnafu {
                stage,
                identity: identity.clone(),
            })?;

        let templates_root = normalize_path(&self.defaults.templates_path, &self.base_dir);
        let renderer = ManifestRenderer::new(templates_root);
        let output = artifacts::routerules_yaml_path(
            &self.base_dir,
            registry_namespace,
            model_name.as_str(),
            &spec.split_snippet(),
            &spec.shadow_snippet(),
        );
        let artifact = renderer
            .render(template, &ctx, Facet::RouterRouteRules, |_| output.clone())
            .context(TemplateSnafu {
                stage,
                identity: identity.clone(),
            })?;

        let lock_key = format!("{namespace}-{model_name}-route");
        let lock = DeployLock::acquire(&self.state_dir, &lock_key, false).map_err(|e| {
            LockSnafu {
                stage,
                identity: identity.clone(),
                message: e.to_string(),
            }
            .build()
        })?;

        let apply = self
            .cluster
            .apply_manifest(&artifact.output, namespace, self.defaults.apply_timeout)
            .await
            .context(ClusterSnafu { stage, identity });

        if let Err(e) = lock.release() {
            tracing::warn!("failed to release route lock: {e}");
        }
        apply?;

        Ok(RouteOutcome { artifact })
    }

    /// Scale a deployed variant to a fixed replica count.
    pub async fn scale(
        &self,
        name: &ModelName,
        tag: &ModelTag,
        replicas: u32,
        namespace: Option<&str>,
        registry_namespace: Option<&str>,
    ) -> Result<StageStatus, PipelineError> {
        let stage = Stage::Scale;
        let namespace = namespace.unwrap_or(&self.defaults.cluster_namespace);
        let needle = self.deployment_needle(name, tag, registry_namespace);

        match self.find_deployment(&needle, namespace, stage).await? {
            None => Ok(StageStatus::NotRunning(needle)),
            Some(deployment) => {
                self.cluster
                    .scale_deployment(&deployment, replicas, namespace)
                    .await
                    .context(ClusterSnafu {
                        stage,
                        identity: needle,
                    })?;
                Ok(StageStatus::Complete)
            }
        }
    }

    /// Attach a horizontal autoscaler to a deployed variant.
    pub async fn autoscale(
        &self,
        name: &ModelName,
        tag: &ModelTag,
        cpu_percent: u32,
        min_replicas: u32,
        max_replicas: u32,
        namespace: Option<&str>,
        registry_namespace: Option<&str>,
    ) -> Result<StageStatus, PipelineError> {
        let stage = Stage::Autoscale;
        let namespace = namespace.unwrap_or(&self.defaults.cluster_namespace);
        let needle = self.deployment_needle(name, tag, registry_namespace);

        match self.find_deployment(&needle, namespace, stage).await? {
            None => Ok(StageStatus::NotRunning(needle)),
            Some(deployment) => {
                self.cluster
                    .autoscale_deployment(
                        &deployment,
                        cpu_percent,
                        min_replicas,
                        max_replicas,
                        namespace,
                    )
                    .await
                    .context(ClusterSnafu {
                        stage,
                        identity: needle,
                    })?;
                Ok(StageStatus::Complete)
            }
        }
    }

    /// Roll a deployed variant back to its previous (or given) revision.
    pub async fn rollback(
        &self,
        name: &ModelName,
        tag: &ModelTag,
        revision: Option<u32>,
        namespace: Option<&str>,
        registry_namespace: Option<&str>,
    ) -> Result<StageStatus, PipelineError> {
        let stage = Stage::Rollback;
        let namespace = namespace.unwrap_or(&self.defaults.cluster_namespace);
        let needle = self.deployment_needle(name, tag, registry_namespace);

        match self.find_deployment(&needle, namespace, stage).await? {
            None => Ok(StageStatus::NotRunning(needle)),
            Some(deployment) => {
                self.cluster
                    .rollback_deployment(&deployment, revision, namespace)
                    .await
                    .context(ClusterSnafu {
                        stage,
                        identity: needle,
                    })?;
                Ok(StageStatus::Complete)
            }
        }
    }

    /// Delete a deployed variant's deployment.
    pub async fn stop(
        &self,
        name: &ModelName,
        tag: &ModelTag,
        namespace: Option<&str>,
        registry_namespace: Option<&str>,
    ) -> Result<StageStatus, PipelineError> {
        let stage = Stage::Stop;
        let namespace = namespace.unwrap_or(&self.defaults.cluster_namespace);
        let needle = self.deployment_needle(name, tag, registry_namespace);

        match self.find_deployment(&needle, namespace, stage).await? {
            None => Ok(StageStatus::NotRunning(needle)),
            Some(deployment) => {
                self.cluster
                    .delete_deployment(&deployment, namespace)
                    .await
                    .context(ClusterSnafu {
                        stage,
                        identity: needle,
                    })?;
                Ok(StageStatus::Complete)
            }
        }
    }

    /// Render and apply the stream manifests and compose the stream URL.
    pub async fn stream_deploy(
        &self,
        resolved: &ResolvedDeployment,
        enable_mqtt: bool,
        enable_kafka_rest_api: bool,
    ) -> Result<StreamOutcome, PipelineError> {
        let stage = Stage::StreamDeploy;
        let identity = resolved.variant.identity();
        let v = &resolved.variant;

        let mut ctx = RenderContext::new();
        ctx.set("MODEL_NAME", v.name.as_str())
            .set("MODEL_TAG", v.tag.as_str())
            .set("NAMESPACE", resolved.namespace.as_str())
            .set("STREAM_LOGGER_TOPIC", resolved.stream_logger_topic.as_str())
            .set("STREAM_INPUT_TOPIC", resolved.stream_input_topic.as_str())
            .set("STREAM_OUTPUT_TOPIC", resolved.stream_output_topic.as_str())
            .set("STREAM_ENABLE_MQTT", bool_str(enable_mqtt))
            .set(
                "STREAM_ENABLE_KAFKA_REST_API",
                bool_str(enable_kafka_rest_api),
            );
        set_registry_vars(&mut ctx, resolved);

        let renderer = ManifestRenderer::new(&resolved.templates_path);
        let out_dir = resolved.build_context.clone();

        let to_render: [(Facet, &str); 4] = [
            (Facet::StreamSvc, "svc"),
            (Facet::StreamDeploy, "deploy"),
            (Facet::StreamIngress, "ingress"),
            (Facet::StreamRouteRules, "routerules"),
        ];

        let mut rendered = Vec::new();
        for (facet, suffix) in to_render {
            let files = self.catalog.resolve(facet, "stream").context(TemplateSnafu {
                stage,
                identity: identity.clone(),
            })?;
            let output = artifacts::stream_yaml_path(&out_dir, resolved, suffix);
            for template in files {
                let artifact = renderer
                    .render(template, &ctx, facet, |_| output.clone())
                    .context(TemplateSnafu {
                        stage,
                        identity: identity.clone(),
                    })?;
                rendered.push(artifact);
            }
        }

        for artifact in &rendered {
            self.cluster
                .apply_manifest(&artifact.output, &resolved.namespace, self.defaults.apply_timeout)
                .await
                .context(ClusterSnafu {
                    stage,
                    identity: identity.clone(),
                })?;
        }

        let service_name = v.service_name(&resolved.registry.namespace);
        let service_endpoint = EndpointResolver::new(self.cluster)
            .cluster_service_endpoint(&service_name, &resolved.namespace)
            .await
            .context(ClusterSnafu { stage, identity })?;

        let stream_url =
            crate::cluster::stream_url(&service_endpoint, v.name.as_str(), v.tag.as_str());
        let endpoint_url = format!("{stream_url}/topics");

        Ok(StreamOutcome {
            artifacts: rendered,
            stream_url,
            endpoint_url,
        })
    }

    fn deployment_needle(
        &self,
        name: &ModelName,
        tag: &ModelTag,
        registry_namespace: Option<&str>,
    ) -> String {
        let registry_namespace =
            registry_namespace.unwrap_or(&self.defaults.predict_namespace);
        format!("{registry_namespace}-{name}-{tag}")
    }

    /// Find the first deployment whose name contains `needle`.
    ///
    /// Substring containment matches the platform's generated-name
    /// convention; variants sharing a prefix can collide, so callers keep
    /// needles fully qualified (namespace-name-tag).
    async fn find_deployment(
        &self,
        needle: &str,
        namespace: &str,
        stage: Stage,
    ) -> Result<Option<String>, PipelineError> {
        let deployments = self
            .cluster
            .list_deployments(namespace)
            .await
            .context(ClusterSnafu {
                stage,
                identity: needle.to_string(),
            })?;
        Ok(deployments
            .into_iter()
            .map(|d| d.name)
            .find(|name| name.contains(needle)))
    }

    fn dockerfile_template(&self, flavor: &str) -> Result<&'static str, TemplateError> {
        self.catalog
            .resolve(Facet::Dockerfile, flavor)?
            .into_iter()
            .next()
            .ok_or_else(|| TemplateError::UnknownFlavor {
                facet: Facet::Dockerfile,
                flavor: flavor.to_string(),
            })
    }
}

fn bool_str(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

fn set_stream_vars(ctx: &mut RenderContext, resolved: &ResolvedDeployment) {
    ctx.set("STREAM_LOGGER_URL", resolved.stream_logger_url.as_str())
        .set("STREAM_LOGGER_TOPIC", resolved.stream_logger_topic.as_str())
        .set("STREAM_INPUT_URL", resolved.stream_input_url.as_str())
        .set("STREAM_INPUT_TOPIC", resolved.stream_input_topic.as_str())
        .set("STREAM_OUTPUT_URL", resolved.stream_output_url.as_str())
        .set("STREAM_OUTPUT_TOPIC", resolved.stream_output_topic.as_str());
}

fn set_registry_vars(ctx: &mut RenderContext, resolved: &ResolvedDeployment) {
    ctx.set("IMAGE_REGISTRY_URL", resolved.registry.url.as_str())
        .set("IMAGE_REGISTRY_REPO", resolved.registry.repo.as_str())
        .set(
            "IMAGE_REGISTRY_NAMESPACE",
            resolved.registry.namespace.as_str(),
        )
        .set(
            "IMAGE_REGISTRY_BASE_TAG",
            resolved.registry.base_tag.as_str(),
        )
        .set("IMAGE_REGISTRY_BASE_CHIP", resolved.registry.base_chip.as_str());
}

/// Recursively collect template files under `dir`, as paths relative to it.
fn collect_templates(
    dir: &Path,
    prefix: &Path,
    out: &mut Vec<PathBuf>,
) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let rel = prefix.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            collect_templates(&entry.path(), &rel, out)?;
        } else {
            out.push(rel);
        }
    }
    Ok(())
}
