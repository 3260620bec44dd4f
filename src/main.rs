// ABOUTME: Entry point for the caravel CLI application.
// ABOUTME: Parses arguments and dispatches to pipeline stages.

mod cli;

use clap::Parser;
use cli::{Cli, Commands, IdentityArgs, OutputModeArg, RegistryArgs, StreamCommands};
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use caravel::cluster::{
    BuildOptions, DockerCli, IstioCli, KubectlClient, StreamHttpClient, stream_url,
};
use caravel::config::{DeploymentRequest, ProcessDefaults, WorkloadKind};
use caravel::endpoint::EndpointResolver;
use caravel::error::Result;
use caravel::output::{Output, OutputMode};
use caravel::pipeline::{DeploymentPipeline, StageStatus};
use caravel::routing::TrafficSplitSpec;
use caravel::templates::TemplateCatalog;
use caravel::types::{ModelName, ModelTag};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let mode = match cli.output {
        OutputModeArg::Normal => OutputMode::Normal,
        OutputModeArg::Quiet => OutputMode::Quiet,
        OutputModeArg::Json => OutputMode::Json,
    };
    let mut output = Output::new(mode);
    output.start_timer();

    if let Err(e) = run(cli, &output).await {
        output.error(&e.to_string());
        std::process::exit(1);
    }
}

fn state_dir(cwd: &std::path::Path) -> PathBuf {
    match env::var("HOME") {
        Ok(home) => PathBuf::from(home).join(".local/state/caravel"),
        Err(_) => cwd.join(".caravel/locks"),
    }
}

async fn run(cli: Cli, output: &Output) -> Result<()> {
    let cwd = env::current_dir().expect("Failed to get current directory");
    let defaults = ProcessDefaults::discover(&cwd)?;
    let catalog = TemplateCatalog::builtin();

    let kubectl = KubectlClient::new();
    let docker = DockerCli::new();
    let istio = IstioCli::new();

    let pipeline = DeploymentPipeline::new(
        &catalog,
        &defaults,
        &kubectl,
        &docker,
        &istio,
        &cwd,
        state_dir(&cwd),
    );

    match cli.command {
        Commands::Defaults => {
            print_defaults(&defaults);
            Ok(())
        }

        Commands::Init {
            identity,
            model_type,
            path,
            runtime,
            chip,
        } => {
            let request = DeploymentRequest {
                model_type: Some(model_type),
                model_path: path,
                runtime,
                chip,
                ..base_request(&identity, &RegistryArgs::default())
            };
            let resolved = request.resolve(&defaults, &cwd)?;
            let outcome = pipeline.init(&resolved).await?;

            match outcome.status {
                StageStatus::AlreadyExists(path) => {
                    output.success(&format!(
                        "Model path '{}' already exists. Please specify a different path.",
                        path.display()
                    ));
                }
                _ => {
                    for file in &outcome.rendered {
                        output.progress(&format!("'{}'", file.display()));
                    }
                    output.success(&format!(
                        "Scaffolded {} at '{}'",
                        resolved.variant.identity(),
                        outcome.model_path.display()
                    ));
                }
            }
            Ok(())
        }

        Commands::Build {
            identity,
            model_type,
            model_path,
            train,
            runtime,
            chip,
            build_context,
            templates_path,
            no_cache,
            squash,
            http_proxy,
            https_proxy,
            registry,
        } => {
            let request = DeploymentRequest {
                model_type: Some(model_type),
                model_path: Some(model_path),
                kind: if train {
                    WorkloadKind::Train
                } else {
                    WorkloadKind::Predict
                },
                runtime,
                chip,
                build_context_path: build_context,
                templates_path,
                ..base_request(&identity, &registry)
            };
            let resolved = request.resolve(&defaults, &cwd)?;
            let options = BuildOptions {
                no_cache,
                squash,
                http_proxy,
                https_proxy,
            };

            output.progress(&format!("Building {}...", resolved.variant.identity()));
            let outcome = pipeline.build(&resolved, &options).await?;
            output.progress(&format!("Generated '{}'", outcome.dockerfile.display()));
            output.success(&format!("Built image {}", outcome.image));
            Ok(())
        }

        Commands::Register { identity, registry } => {
            let name = ModelName::new(&identity.name)?;
            let tag = ModelTag::new(&identity.tag)?;
            let coordinates = defaults.registry_coordinates(
                registry.registry_url.as_deref(),
                registry.registry_repo.as_deref(),
                registry.registry_namespace.as_deref(),
            );
            let image = pipeline.register(&name, &tag, &coordinates).await?;
            output.success(&format!("Registered image {image}"));
            Ok(())
        }

        Commands::Pull { identity, registry } => {
            let name = ModelName::new(&identity.name)?;
            let tag = ModelTag::new(&identity.tag)?;
            let coordinates = defaults.registry_coordinates(
                registry.registry_url.as_deref(),
                registry.registry_repo.as_deref(),
                registry.registry_namespace.as_deref(),
            );
            let image = pipeline.pull(&name, &tag, &coordinates).await?;
            output.success(&format!("Pulled image {image}"));
            Ok(())
        }

        Commands::Deploy {
            identity,
            model_type,
            chip,
            namespace,
            memory_limit,
            core_limit,
            target_core_util,
            min_replicas,
            max_replicas,
            templates_path,
            registry,
        } => {
            let request = DeploymentRequest {
                model_type: Some(model_type),
                chip,
                namespace,
                memory_limit,
                core_limit,
                target_core_util_percentage: target_core_util,
                min_replicas,
                max_replicas,
                templates_path,
                ..base_request(&identity, &registry)
            };
            let resolved = request.resolve(&defaults, &cwd)?;

            output.progress(&format!("Deploying {}...", resolved.variant.identity()));
            let outcome = pipeline.deploy(&resolved).await?;
            for artifact in &outcome.artifacts {
                output.artifact(&artifact.template, &artifact.output);
            }
            output.progress(
                "The endpoint is internal to the ingress controller. No traffic flows until \
                 a traffic split is applied with `caravel route`; this extra step is intentional.",
            );
            output.success(&format!("Deployed; endpoint: {}", outcome.endpoint_url));
            Ok(())
        }

        Commands::Route {
            name,
            split,
            shadow,
            namespace,
            registry,
        } => {
            let name = ModelName::new(&name)?;
            let spec = TrafficSplitSpec::parse(&split, &shadow)?;
            let outcome = pipeline
                .route(
                    &name,
                    &spec,
                    namespace.as_deref(),
                    registry.registry_namespace.as_deref(),
                )
                .await?;
            output.artifact(&outcome.artifact.template, &outcome.artifact.output);
            output.success(&format!(
                "Routed {}: {} / {}",
                name,
                spec.split_snippet(),
                spec.shadow_snippet()
            ));
            Ok(())
        }

        Commands::Scale {
            identity,
            replicas,
            namespace,
            registry,
        } => {
            let name = ModelName::new(&identity.name)?;
            let tag = ModelTag::new(&identity.tag)?;
            let status = pipeline
                .scale(
                    &name,
                    &tag,
                    replicas,
                    namespace.as_deref(),
                    registry.registry_namespace.as_deref(),
                )
                .await?;
            report_status(output, status, &format!("Scaled {name}:{tag} to {replicas} replicas"));
            Ok(())
        }

        Commands::Autoscale {
            identity,
            cpu_percent,
            min_replicas,
            max_replicas,
            namespace,
            registry,
        } => {
            let name = ModelName::new(&identity.name)?;
            let tag = ModelTag::new(&identity.tag)?;
            let status = pipeline
                .autoscale(
                    &name,
                    &tag,
                    cpu_percent,
                    min_replicas,
                    max_replicas,
                    namespace.as_deref(),
                    registry.registry_namespace.as_deref(),
                )
                .await?;
            report_status(
                output,
                status,
                &format!(
                    "Autoscaling {name}:{tag} at {cpu_percent}% cpu, {min_replicas}-{max_replicas} replicas"
                ),
            );
            Ok(())
        }

        Commands::Rollback {
            identity,
            revision,
            namespace,
            registry,
        } => {
            let name = ModelName::new(&identity.name)?;
            let tag = ModelTag::new(&identity.tag)?;
            let status = pipeline
                .rollback(
                    &name,
                    &tag,
                    revision,
                    namespace.as_deref(),
                    registry.registry_namespace.as_deref(),
                )
                .await?;
            report_status(output, status, &format!("Rolled back {name}:{tag}"));
            Ok(())
        }

        Commands::Stop {
            identity,
            namespace,
            registry,
        } => {
            let name = ModelName::new(&identity.name)?;
            let tag = ModelTag::new(&identity.tag)?;
            let status = pipeline
                .stop(
                    &name,
                    &tag,
                    namespace.as_deref(),
                    registry.registry_namespace.as_deref(),
                )
                .await?;
            report_status(output, status, &format!("Stopped {name}:{tag}"));
            Ok(())
        }

        Commands::Endpoint {
            name,
            namespace,
            registry,
        } => {
            let name = ModelName::new(&name)?;
            let namespace = namespace.unwrap_or_else(|| defaults.cluster_namespace.clone());
            let registry_namespace = registry
                .registry_namespace
                .unwrap_or_else(|| defaults.predict_namespace.clone());
            let url = EndpointResolver::new(&kubectl)
                .resolve(name.as_str(), &namespace, &registry_namespace)
                .await?;
            output.success(url.trim_end_matches('/'));
            Ok(())
        }

        Commands::Endpoints { namespace } => {
            let namespace = namespace.unwrap_or_else(|| defaults.cluster_namespace.clone());
            let urls = EndpointResolver::new(&kubectl).resolve_all(&namespace).await?;
            for url in urls {
                output.success(url.trim_end_matches('/'));
            }
            Ok(())
        }

        Commands::Stream(stream) => run_stream(stream, &pipeline, &kubectl, &defaults, output, &cwd).await,
    }
}

async fn run_stream(
    command: StreamCommands,
    pipeline: &DeploymentPipeline<'_, KubectlClient, DockerCli, IstioCli>,
    kubectl: &KubectlClient,
    defaults: &ProcessDefaults,
    output: &Output,
    cwd: &std::path::Path,
) -> Result<()> {
    match command {
        StreamCommands::Deploy {
            identity,
            namespace,
            no_mqtt,
            no_rest_api,
            templates_path,
            registry,
        } => {
            let request = DeploymentRequest {
                // Stream variants have no model artifact; the type only
                // completes the identity.
                model_type: Some("python".to_string()),
                kind: WorkloadKind::Stream,
                namespace,
                templates_path,
                ..base_request(&identity, &registry)
            };
            let resolved = request.resolve(defaults, cwd)?;

            let outcome = pipeline
                .stream_deploy(&resolved, !no_mqtt, !no_rest_api)
                .await?;
            for artifact in &outcome.artifacts {
                output.artifact(&artifact.template, &artifact.output);
            }
            output.progress(&format!("Stream URL: {}", outcome.stream_url));
            output.success(&format!("Stream deployed; topics at {}", outcome.endpoint_url));
            Ok(())
        }

        StreamCommands::Describe {
            identity,
            topic,
            namespace,
            registry,
        } => {
            let url = resolve_stream_url(kubectl, defaults, &identity, &registry, namespace).await?;
            let client = StreamHttpClient::new(defaults.apply_timeout);
            let response = match topic {
                Some(topic) => client.describe_topic(&url, &topic).await?,
                None => client.topics(&url).await?,
            };
            output.success(&response);
            Ok(())
        }

        StreamCommands::Consume {
            identity,
            topic,
            consumer,
            offset,
            namespace,
            registry,
        } => {
            let url = resolve_stream_url(kubectl, defaults, &identity, &registry, namespace).await?;
            let client = StreamHttpClient::new(defaults.apply_timeout);
            let records = client
                .consume(&url, &topic, consumer.as_deref(), &offset)
                .await?;
            output.success(&records);
            Ok(())
        }

        StreamCommands::Produce {
            identity,
            topic,
            payload,
            namespace,
            registry,
        } => {
            let topic = topic
                .unwrap_or_else(|| format!("{}-{}-input", identity.name, identity.tag));
            let url = resolve_stream_url(kubectl, defaults, &identity, &registry, namespace).await?;
            let payload = std::fs::read_to_string(&payload)?;
            let client = StreamHttpClient::new(defaults.apply_timeout);
            let response = client.produce(&url, &topic, payload.trim()).await?;
            output.success(&response);
            Ok(())
        }
    }
}

async fn resolve_stream_url(
    kubectl: &KubectlClient,
    defaults: &ProcessDefaults,
    identity: &IdentityArgs,
    registry: &RegistryArgs,
    namespace: Option<String>,
) -> Result<String> {
    let name = ModelName::new(&identity.name)?;
    let tag = ModelTag::new(&identity.tag)?;
    let namespace = namespace.unwrap_or_else(|| defaults.cluster_namespace.clone());
    let registry_namespace = registry
        .registry_namespace
        .clone()
        .unwrap_or_else(|| defaults.stream_namespace.clone());

    let service_name = format!("{registry_namespace}-{name}-{tag}");
    let endpoint = EndpointResolver::new(kubectl)
        .cluster_service_endpoint(&service_name, &namespace)
        .await?;
    Ok(stream_url(&endpoint, name.as_str(), tag.as_str()))
}

fn base_request(identity: &IdentityArgs, registry: &RegistryArgs) -> DeploymentRequest {
    DeploymentRequest {
        name: Some(identity.name.clone()),
        tag: Some(identity.tag.clone()),
        registry_url: registry.registry_url.clone(),
        registry_repo: registry.registry_repo.clone(),
        registry_namespace: registry.registry_namespace.clone(),
        ..Default::default()
    }
}

fn report_status(output: &Output, status: StageStatus, success: &str) {
    match status {
        StageStatus::NotRunning(needle) => {
            output.success(&format!("Service '{needle}' is not running."));
        }
        _ => output.success(success),
    }
}

fn print_defaults(defaults: &ProcessDefaults) {
    println!("Image registry url:   {}", defaults.image_registry_url);
    println!("Image registry repo:  {}", defaults.image_registry_repo);
    println!("Predict namespace:    {}", defaults.predict_namespace);
    println!("Train namespace:      {}", defaults.train_namespace);
    println!("Stream namespace:     {}", defaults.stream_namespace);
    println!("Cluster namespace:    {}", defaults.cluster_namespace);
    println!("Chip:                 {}", defaults.chip);
    println!("Templates path:       {}", defaults.templates_path);
    println!("Build context path:   {}", defaults.build_context_path);
    println!("Apply timeout:        {:?}", defaults.apply_timeout);
    println!();
    println!(
        "Default train base image:   {}/{}/{}-{}:{}",
        defaults.image_registry_url,
        defaults.image_registry_repo,
        defaults.train_namespace,
        defaults.chip,
        defaults.image_registry_base_tag
    );
    println!(
        "Default predict base image: {}/{}/{}-{}:{}",
        defaults.image_registry_url,
        defaults.image_registry_repo,
        defaults.predict_namespace,
        defaults.chip,
        defaults.image_registry_base_tag
    );
}
