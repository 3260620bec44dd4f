// ABOUTME: Deterministic naming for generated artifact files.
// ABOUTME: Same identity in, same path out, so re-renders overwrite in place.

use std::path::{Path, PathBuf};

use crate::config::ResolvedDeployment;

/// Every generated file starts with this prefix; the files are disposable
/// and regenerable, and the prefix makes them easy to clean up.
pub const GENERATED_PREFIX: &str = ".caravel-generated";

/// `.caravel-generated-{ns}-{name}-{tag}-{type}-{runtime}-{chip}-Dockerfile`
/// inside the build context.
pub fn dockerfile_path(resolved: &ResolvedDeployment) -> PathBuf {
    let v = &resolved.variant;
    resolved.build_context.join(format!(
        "{GENERATED_PREFIX}-{}-{}-{}-{}-{}-{}-Dockerfile",
        resolved.registry.namespace, v.name, v.tag, v.model_type, v.runtime, v.chip
    ))
}

/// `.caravel-generated-{ns}-{name}-{tag}-{chip}-deploy.yaml`
pub fn deploy_yaml_path(out_dir: &Path, resolved: &ResolvedDeployment) -> PathBuf {
    let v = &resolved.variant;
    out_dir.join(format!(
        "{GENERATED_PREFIX}-{}-{}-{}-{}-deploy.yaml",
        resolved.registry.namespace, v.name, v.tag, v.chip
    ))
}

/// `.caravel-generated-{ns}-{name}-ingress.yaml`. One ingress per model,
/// shared by all its tags, so the tag is not part of the name.
pub fn ingress_yaml_path(out_dir: &Path, resolved: &ResolvedDeployment) -> PathBuf {
    out_dir.join(format!(
        "{GENERATED_PREFIX}-{}-{}-ingress.yaml",
        resolved.registry.namespace, resolved.variant.name
    ))
}

/// `.caravel-generated-{ns}-{name}-svc.yaml`
pub fn svc_yaml_path(out_dir: &Path, resolved: &ResolvedDeployment) -> PathBuf {
    out_dir.join(format!(
        "{GENERATED_PREFIX}-{}-{}-svc.yaml",
        resolved.registry.namespace, resolved.variant.name
    ))
}

/// `.caravel-generated-{ns}-{name}-{tag}-autoscale.yaml`
pub fn autoscale_yaml_path(out_dir: &Path, resolved: &ResolvedDeployment) -> PathBuf {
    out_dir.join(format!(
        "{GENERATED_PREFIX}-{}-{}-{}-autoscale.yaml",
        resolved.registry.namespace, resolved.variant.name, resolved.variant.tag
    ))
}

/// `.caravel-generated-{ns}-{name}-{split-snippet}-{shadow-snippet}-router-routerules.yaml`
/// The snippets come from the validated split spec's ordered lists, so the
/// filename doubles as a human-readable record of the applied routing.
pub fn routerules_yaml_path(
    out_dir: &Path,
    registry_namespace: &str,
    model_name: &str,
    split_snippet: &str,
    shadow_snippet: &str,
) -> PathBuf {
    out_dir.join(format!(
        "{GENERATED_PREFIX}-{registry_namespace}-{model_name}-{split_snippet}-{shadow_snippet}-router-routerules.yaml"
    ))
}

/// `.caravel-generated-{ns}-{name}-{tag}-{suffix}.yaml` for stream facets.
pub fn stream_yaml_path(
    out_dir: &Path,
    resolved: &ResolvedDeployment,
    suffix: &str,
) -> PathBuf {
    out_dir.join(format!(
        "{GENERATED_PREFIX}-{}-{}-{}-{}.yaml",
        resolved.registry.namespace, resolved.variant.name, resolved.variant.tag, suffix
    ))
}
