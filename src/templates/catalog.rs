// ABOUTME: Static template catalog mapping (facet, flavor) to template files.
// ABOUTME: Dependency flavors expand recursively, deps-first, duplicates kept.

use std::collections::HashMap;

use super::TemplateError;

/// A class of generated artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Facet {
    ModelScaffold,
    Dockerfile,
    RouterDeploy,
    RouterIngress,
    RouterSvc,
    RouterRouteRules,
    RouterAutoscale,
    StreamDeploy,
    StreamSvc,
    StreamIngress,
    StreamRouteRules,
    TrainCluster,
    ServiceDeploy,
    ServiceSvc,
}

impl Facet {
    pub fn as_str(self) -> &'static str {
        match self {
            Facet::ModelScaffold => "model-scaffold",
            Facet::Dockerfile => "Dockerfile",
            Facet::RouterDeploy => "deploy",
            Facet::RouterIngress => "ingress",
            Facet::RouterSvc => "svc",
            Facet::RouterRouteRules => "router-routerules",
            Facet::RouterAutoscale => "autoscale",
            Facet::StreamDeploy => "deploy",
            Facet::StreamSvc => "svc",
            Facet::StreamIngress => "ingress",
            Facet::StreamRouteRules => "routerules",
            Facet::TrainCluster => "train-cluster",
            Facet::ServiceDeploy => "deploy",
            Facet::ServiceSvc => "svc",
        }
    }
}

impl std::fmt::Display for Facet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Template files for one flavor, plus the flavors whose manifests must be
/// materialized before it.
#[derive(Debug, Clone)]
pub struct TemplateDescriptor {
    pub files: Vec<&'static str>,
    pub deps: Vec<&'static str>,
}

impl TemplateDescriptor {
    fn new(files: &[&'static str], deps: &[&'static str]) -> Self {
        Self {
            files: files.to_vec(),
            deps: deps.to_vec(),
        }
    }
}

/// Immutable registry of manifest templates, constructed once at startup and
/// passed explicitly to every component that renders.
#[derive(Debug)]
pub struct TemplateCatalog {
    entries: HashMap<(Facet, &'static str), TemplateDescriptor>,
}

impl TemplateCatalog {
    /// The built-in catalog shipped with the CLI.
    pub fn builtin() -> Self {
        let mut entries = HashMap::new();
        let mut add = |facet: Facet, flavor: &'static str, files: &[&'static str], deps: &[&'static str]| {
            entries.insert((facet, flavor), TemplateDescriptor::new(files, deps));
        };

        add(
            Facet::Dockerfile,
            "predict-server",
            &["docker/predict-server-local-dockerfile.template"],
            &[],
        );
        add(
            Facet::Dockerfile,
            "train-server",
            &["docker/train-server-local-dockerfile.template"],
            &[],
        );

        add(
            Facet::RouterDeploy,
            "predict-router-split",
            &["yaml/predict-deploy.yaml.template"],
            &[],
        );
        add(
            Facet::RouterDeploy,
            "predict-router-gpu-split",
            &["yaml/predict-gpu-deploy.yaml.template"],
            &[],
        );
        add(
            Facet::RouterIngress,
            "predict-router-split",
            &["yaml/predict-ingress.yaml.template"],
            &[],
        );
        add(
            Facet::RouterSvc,
            "predict-router-split",
            &["yaml/predict-svc.yaml.template"],
            &[],
        );
        add(
            Facet::RouterRouteRules,
            "predict-router",
            &["yaml/predict-routerules.yaml.template"],
            &[],
        );
        add(
            Facet::RouterAutoscale,
            "predict-router-split",
            &["yaml/predict-autoscale.yaml.template"],
            &[],
        );

        add(Facet::StreamDeploy, "stream", &["yaml/stream-deploy.yaml.template"], &[]);
        add(Facet::StreamSvc, "stream", &["yaml/stream-svc.yaml.template"], &[]);
        add(Facet::StreamIngress, "stream", &["yaml/stream-ingress.yaml.template"], &[]);
        add(
            Facet::StreamRouteRules,
            "stream",
            &["yaml/stream-routerules.yaml.template"],
            &[],
        );

        add(
            Facet::TrainCluster,
            "train-cluster",
            &["yaml/train-cluster.yaml.template"],
            &[],
        );
        add(
            Facet::TrainCluster,
            "train-gpu-cluster",
            &["yaml/train-gpu-cluster.yaml.template"],
            &[],
        );

        // Legacy multi-service stacks. These are the only entries with
        // dependency chains; a flavor pulls in the manifests of every flavor
        // it depends on, ahead of its own.
        add(Facet::ServiceDeploy, "jupyter", &["jupyterhub-deploy.yaml"], &[]);
        add(
            Facet::ServiceDeploy,
            "spark",
            &["spark-master-deploy.yaml"],
            &["spark-worker", "metastore"],
        );
        add(Facet::ServiceDeploy, "spark-worker", &["spark-worker-deploy.yaml"], &[]);
        add(
            Facet::ServiceDeploy,
            "metastore",
            &["metastore-deploy.yaml"],
            &["mysql"],
        );
        add(Facet::ServiceDeploy, "hdfs", &["namenode-deploy.yaml"], &[]);
        add(Facet::ServiceDeploy, "redis", &["redis-master-deploy.yaml"], &[]);
        add(
            Facet::ServiceDeploy,
            "presto",
            &["presto-master-deploy.yaml", "presto-worker-deploy.yaml"],
            &["metastore"],
        );
        add(Facet::ServiceDeploy, "presto-ui", &["presto-ui-deploy.yaml"], &["presto"]);
        add(
            Facet::ServiceDeploy,
            "airflow",
            &["airflow-deploy.yaml"],
            &["mysql", "redis"],
        );
        add(Facet::ServiceDeploy, "mysql", &["mysql-master-deploy.yaml"], &[]);
        add(Facet::ServiceDeploy, "zeppelin", &["zeppelin-deploy.yaml"], &[]);
        add(
            Facet::ServiceDeploy,
            "elasticsearch",
            &["elasticsearch-2-3-0-deploy.yaml"],
            &[],
        );
        add(
            Facet::ServiceDeploy,
            "kibana",
            &["kibana-4-5-0-deploy.yaml"],
            &["elasticsearch"],
        );
        add(Facet::ServiceDeploy, "cassandra", &["cassandra-deploy.yaml"], &[]);
        add(Facet::ServiceDeploy, "jenkins", &["jenkins-deploy.yaml"], &[]);

        add(Facet::ServiceSvc, "jupyter", &["jupyterhub-svc.yaml"], &[]);
        add(
            Facet::ServiceSvc,
            "spark",
            &["spark-master-svc.yaml"],
            &["spark-worker", "metastore"],
        );
        add(Facet::ServiceSvc, "spark-worker", &["spark-worker-svc.yaml"], &[]);
        add(Facet::ServiceSvc, "metastore", &["metastore-svc.yaml"], &["mysql"]);
        add(Facet::ServiceSvc, "hdfs", &["namenode-svc.yaml"], &[]);
        add(Facet::ServiceSvc, "redis", &["redis-master-svc.yaml"], &[]);
        add(
            Facet::ServiceSvc,
            "presto",
            &["presto-master-svc.yaml", "presto-worker-svc.yaml"],
            &["metastore"],
        );
        add(Facet::ServiceSvc, "presto-ui", &["presto-ui-svc.yaml"], &["presto"]);
        add(
            Facet::ServiceSvc,
            "airflow",
            &["airflow-svc.yaml"],
            &["mysql", "redis"],
        );
        add(Facet::ServiceSvc, "mysql", &["mysql-master-svc.yaml"], &[]);
        add(Facet::ServiceSvc, "zeppelin", &["zeppelin-svc.yaml"], &[]);
        add(
            Facet::ServiceSvc,
            "elasticsearch",
            &["elasticsearch-2-3-0-svc.yaml"],
            &[],
        );
        add(
            Facet::ServiceSvc,
            "kibana",
            &["kibana-4-5-0-svc.yaml"],
            &["elasticsearch"],
        );
        add(Facet::ServiceSvc, "cassandra", &["cassandra-svc.yaml"], &[]);

        Self { entries }
    }

    /// An empty catalog, for tests that register their own entries.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register an entry. Intended for per-test catalogs.
    pub fn register(
        &mut self,
        facet: Facet,
        flavor: &'static str,
        files: &[&'static str],
        deps: &[&'static str],
    ) {
        self.entries
            .insert((facet, flavor), TemplateDescriptor::new(files, deps));
    }

    /// Resolve a flavor to its ordered template file list, expanding
    /// dependency flavors first. Duplicate files are preserved: applying a
    /// manifest twice is harmless, dropping one is not.
    pub fn resolve(&self, facet: Facet, flavor: &str) -> Result<Vec<&'static str>, TemplateError> {
        let descriptor = self
            .entries
            .get(&(facet, flavor))
            .ok_or_else(|| TemplateError::UnknownFlavor {
                facet,
                flavor: flavor.to_string(),
            })?;

        let mut files = Vec::new();
        for dep in &descriptor.deps {
            files.extend(self.resolve(facet, dep)?);
        }
        files.extend(descriptor.files.iter().copied());
        Ok(files)
    }

    /// Legacy-compatible lookup: an unknown flavor yields an empty list
    /// instead of an error. Only for callers that intentionally probe with
    /// unregistered flavors.
    pub fn resolve_tolerant(&self, facet: Facet, flavor: &str) -> Vec<&'static str> {
        self.resolve(facet, flavor).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dependency_files_come_before_own_files() {
        let catalog = TemplateCatalog::builtin();
        let files = catalog.resolve(Facet::ServiceDeploy, "spark").unwrap();
        assert_eq!(
            files,
            vec![
                "spark-worker-deploy.yaml",
                "mysql-master-deploy.yaml",
                "metastore-deploy.yaml",
                "spark-master-deploy.yaml",
            ]
        );
    }

    #[test]
    fn unknown_flavor_is_an_error() {
        let catalog = TemplateCatalog::builtin();
        let err = catalog.resolve(Facet::RouterDeploy, "nope").unwrap_err();
        assert!(matches!(err, TemplateError::UnknownFlavor { .. }));
    }

    #[test]
    fn tolerant_mode_returns_empty_for_unknown() {
        let catalog = TemplateCatalog::builtin();
        assert!(catalog.resolve_tolerant(Facet::RouterDeploy, "nope").is_empty());
    }
}
