// ABOUTME: External collaborator seams and their CLI-driving implementations.
// ABOUTME: kubectl for the control plane, docker for images, istioctl for the mesh.

mod docker;
mod exec;
mod istio;
mod kubectl;
mod stream;
pub mod traits;

pub use docker::DockerCli;
pub use istio::IstioCli;
pub use kubectl::KubectlClient;
pub use stream::{StreamError, StreamHttpClient, stream_url};
pub use traits::{
    BuildError, BuildOptions, ClusterError, ClusterOps, DeploymentSummary, ImageBuildOps,
    IngressInfo, ManagedEndpointError, ManagedEndpointOps, ManagedEndpointStatus, MeshError,
    MeshOps, ServiceSummary, VariantWeight,
};
