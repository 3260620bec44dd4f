// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "caravel")]
#[command(about = "Model-serving deployment and traffic routing for Kubernetes")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output mode
    #[arg(long, global = true, value_enum, default_value = "normal")]
    pub output: OutputModeArg,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputModeArg {
    Normal,
    Quiet,
    Json,
}

/// Identity shared by most commands.
#[derive(Debug, Args)]
pub struct IdentityArgs {
    /// Model name (DNS-label safe)
    #[arg(long)]
    pub name: String,

    /// Model tag (lower-cased on input)
    #[arg(long)]
    pub tag: String,
}

/// Image registry overrides.
#[derive(Debug, Args, Default)]
pub struct RegistryArgs {
    /// Image registry URL
    #[arg(long)]
    pub registry_url: Option<String>,

    /// Image registry repository
    #[arg(long)]
    pub registry_repo: Option<String>,

    /// Image registry namespace (e.g. predict)
    #[arg(long)]
    pub registry_namespace: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the resolved process-wide defaults
    Defaults,

    /// Scaffold a model directory from the per-type starter templates
    Init {
        #[command(flatten)]
        identity: IdentityArgs,

        /// Model type (tensorflow, python, xgboost, ...)
        #[arg(long = "type")]
        model_type: String,

        /// Target path for the scaffold (may be base64-encoded)
        #[arg(long)]
        path: Option<String>,

        /// Serving runtime override (derived from type when omitted)
        #[arg(long)]
        runtime: Option<String>,

        /// Chip target (cpu or gpu)
        #[arg(long)]
        chip: Option<String>,
    },

    /// Render the server Dockerfile and build the variant image
    Build {
        #[command(flatten)]
        identity: IdentityArgs,

        /// Model type (tensorflow, python, xgboost, ...)
        #[arg(long = "type")]
        model_type: String,

        /// Model artifact path (may be base64-encoded)
        #[arg(long)]
        model_path: String,

        /// Build the train-server image instead of the predict-server image
        #[arg(long)]
        train: bool,

        /// Serving runtime override (derived from type when omitted)
        #[arg(long)]
        runtime: Option<String>,

        /// Chip target (cpu or gpu)
        #[arg(long)]
        chip: Option<String>,

        /// Build context directory
        #[arg(long)]
        build_context: Option<String>,

        /// Templates root directory
        #[arg(long)]
        templates_path: Option<String>,

        /// Build without the layer cache
        #[arg(long)]
        no_cache: bool,

        /// Squash image layers
        #[arg(long)]
        squash: bool,

        /// HTTP proxy forwarded as a build arg
        #[arg(long)]
        http_proxy: Option<String>,

        /// HTTPS proxy forwarded as a build arg
        #[arg(long)]
        https_proxy: Option<String>,

        #[command(flatten)]
        registry: RegistryArgs,
    },

    /// Push the variant image to its registry
    Register {
        #[command(flatten)]
        identity: IdentityArgs,

        #[command(flatten)]
        registry: RegistryArgs,
    },

    /// Pull the variant image from its registry
    Pull {
        #[command(flatten)]
        identity: IdentityArgs,

        #[command(flatten)]
        registry: RegistryArgs,
    },

    /// Render, inject, and apply the serving manifests
    Deploy {
        #[command(flatten)]
        identity: IdentityArgs,

        /// Model type (tensorflow, python, xgboost, ...)
        #[arg(long = "type")]
        model_type: String,

        /// Chip target (cpu or gpu)
        #[arg(long)]
        chip: Option<String>,

        /// Cluster namespace
        #[arg(long)]
        namespace: Option<String>,

        /// Container memory limit
        #[arg(long)]
        memory_limit: Option<String>,

        /// Container core limit
        #[arg(long)]
        core_limit: Option<String>,

        /// Autoscale target core utilization percentage
        #[arg(long)]
        target_core_util: Option<u32>,

        /// Minimum replica count
        #[arg(long)]
        min_replicas: Option<u32>,

        /// Maximum replica count
        #[arg(long)]
        max_replicas: Option<u32>,

        /// Templates root directory
        #[arg(long)]
        templates_path: Option<String>,

        #[command(flatten)]
        registry: RegistryArgs,
    },

    /// Validate a traffic split and apply its route rules
    Route {
        /// Model name
        #[arg(long)]
        name: String,

        /// Ordered split weights, e.g. 'a=60,b=40' (optionally base64)
        #[arg(long)]
        split: String,

        /// Shadow tags, e.g. 'b,c' (optionally base64)
        #[arg(long, default_value = "")]
        shadow: String,

        /// Cluster namespace
        #[arg(long)]
        namespace: Option<String>,

        #[command(flatten)]
        registry: RegistryArgs,
    },

    /// Scale a deployed variant to a fixed replica count
    Scale {
        #[command(flatten)]
        identity: IdentityArgs,

        /// Replica count
        #[arg(long)]
        replicas: u32,

        /// Cluster namespace
        #[arg(long)]
        namespace: Option<String>,

        #[command(flatten)]
        registry: RegistryArgs,
    },

    /// Attach a horizontal autoscaler to a deployed variant
    Autoscale {
        #[command(flatten)]
        identity: IdentityArgs,

        /// Target CPU utilization percentage
        #[arg(long)]
        cpu_percent: u32,

        /// Minimum replica count
        #[arg(long)]
        min_replicas: u32,

        /// Maximum replica count
        #[arg(long)]
        max_replicas: u32,

        /// Cluster namespace
        #[arg(long)]
        namespace: Option<String>,

        #[command(flatten)]
        registry: RegistryArgs,
    },

    /// Roll a deployed variant back to a previous revision
    Rollback {
        #[command(flatten)]
        identity: IdentityArgs,

        /// Specific revision to roll back to (previous when omitted)
        #[arg(long)]
        revision: Option<u32>,

        /// Cluster namespace
        #[arg(long)]
        namespace: Option<String>,

        #[command(flatten)]
        registry: RegistryArgs,
    },

    /// Delete a deployed variant's deployment
    Stop {
        #[command(flatten)]
        identity: IdentityArgs,

        /// Cluster namespace
        #[arg(long)]
        namespace: Option<String>,

        #[command(flatten)]
        registry: RegistryArgs,
    },

    /// Resolve the reachable endpoint URL for a model
    Endpoint {
        /// Model name
        #[arg(long)]
        name: String,

        /// Cluster namespace
        #[arg(long)]
        namespace: Option<String>,

        #[command(flatten)]
        registry: RegistryArgs,
    },

    /// Resolve the endpoint URLs of every model in a namespace
    Endpoints {
        /// Cluster namespace
        #[arg(long)]
        namespace: Option<String>,
    },

    /// Streaming variants and broker operations
    #[command(subcommand)]
    Stream(StreamCommands),
}

#[derive(Subcommand)]
pub enum StreamCommands {
    /// Render and apply the stream manifests for a variant
    Deploy {
        #[command(flatten)]
        identity: IdentityArgs,

        /// Cluster namespace
        #[arg(long)]
        namespace: Option<String>,

        /// Disable the MQTT bridge
        #[arg(long)]
        no_mqtt: bool,

        /// Disable the broker REST API
        #[arg(long)]
        no_rest_api: bool,

        /// Templates root directory
        #[arg(long)]
        templates_path: Option<String>,

        #[command(flatten)]
        registry: RegistryArgs,
    },

    /// Describe the broker's topics (or one topic)
    Describe {
        #[command(flatten)]
        identity: IdentityArgs,

        /// Topic to describe (all topics when omitted)
        #[arg(long)]
        topic: Option<String>,

        /// Cluster namespace
        #[arg(long)]
        namespace: Option<String>,

        #[command(flatten)]
        registry: RegistryArgs,
    },

    /// Consume pending records from a topic
    Consume {
        #[command(flatten)]
        identity: IdentityArgs,

        /// Topic to consume from
        #[arg(long)]
        topic: String,

        /// Consumer instance name (defaults to the topic)
        #[arg(long)]
        consumer: Option<String>,

        /// Offset reset policy (earliest or latest)
        #[arg(long, default_value = "earliest")]
        offset: String,

        /// Cluster namespace
        #[arg(long)]
        namespace: Option<String>,

        #[command(flatten)]
        registry: RegistryArgs,
    },

    /// Publish a JSON payload file as a record on a topic
    Produce {
        #[command(flatten)]
        identity: IdentityArgs,

        /// Topic to publish to (defaults to the variant's input topic)
        #[arg(long)]
        topic: Option<String>,

        /// Path of the JSON payload file
        #[arg(long)]
        payload: String,

        /// Cluster namespace
        #[arg(long)]
        namespace: Option<String>,

        #[command(flatten)]
        registry: RegistryArgs,
    },
}
