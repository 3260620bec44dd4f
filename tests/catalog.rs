// ABOUTME: Tests for template catalog lookup and dependency expansion.
// ABOUTME: Deps-first ordering, duplicates preserved, strict vs tolerant misses.

use caravel::templates::{Facet, TemplateCatalog, TemplateError};

#[test]
fn dependency_expansion_orders_deps_before_own_files() {
    let mut catalog = TemplateCatalog::empty();
    catalog.register(Facet::ServiceDeploy, "g", &["g.yaml"], &[]);
    catalog.register(Facet::ServiceDeploy, "h", &["h.yaml"], &[]);
    catalog.register(Facet::ServiceDeploy, "f", &["f.yaml"], &["g", "h"]);

    let files = catalog.resolve(Facet::ServiceDeploy, "f").unwrap();
    assert_eq!(files, vec!["g.yaml", "h.yaml", "f.yaml"]);
}

#[test]
fn transitive_dependencies_expand_recursively() {
    let catalog = TemplateCatalog::builtin();
    // spark -> [spark-worker, metastore], metastore -> [mysql]
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
fn duplicate_files_are_preserved() {
    let mut catalog = TemplateCatalog::empty();
    catalog.register(Facet::ServiceDeploy, "shared", &["shared.yaml"], &[]);
    catalog.register(Facet::ServiceDeploy, "a", &["a.yaml"], &["shared"]);
    catalog.register(Facet::ServiceDeploy, "b", &["b.yaml"], &["shared"]);
    catalog.register(Facet::ServiceDeploy, "top", &["top.yaml"], &["a", "b"]);

    let files = catalog.resolve(Facet::ServiceDeploy, "top").unwrap();
    assert_eq!(
        files,
        vec!["shared.yaml", "a.yaml", "shared.yaml", "b.yaml", "top.yaml"]
    );
}

#[test]
fn unknown_flavor_is_an_explicit_error() {
    let catalog = TemplateCatalog::builtin();
    let err = catalog
        .resolve(Facet::RouterDeploy, "unregistered")
        .unwrap_err();
    match err {
        TemplateError::UnknownFlavor { flavor, .. } => assert_eq!(flavor, "unregistered"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn tolerant_mode_swallows_unknown_flavors() {
    let catalog = TemplateCatalog::builtin();
    assert!(
        catalog
            .resolve_tolerant(Facet::RouterDeploy, "unregistered")
            .is_empty()
    );
    // Known flavors behave identically in both modes.
    assert_eq!(
        catalog.resolve_tolerant(Facet::RouterDeploy, "predict-router-split"),
        catalog
            .resolve(Facet::RouterDeploy, "predict-router-split")
            .unwrap()
    );
}

#[test]
fn facets_partition_the_flavor_space() {
    let catalog = TemplateCatalog::builtin();
    // The same flavor key resolves differently per facet.
    let deploy = catalog.resolve(Facet::ServiceDeploy, "mysql").unwrap();
    let svc = catalog.resolve(Facet::ServiceSvc, "mysql").unwrap();
    assert_eq!(deploy, vec!["mysql-master-deploy.yaml"]);
    assert_eq!(svc, vec!["mysql-master-svc.yaml"]);
}

#[test]
fn gpu_flavors_select_gpu_templates() {
    let catalog = TemplateCatalog::builtin();
    assert_eq!(
        catalog
            .resolve(Facet::RouterDeploy, "predict-router-gpu-split")
            .unwrap(),
        vec!["yaml/predict-gpu-deploy.yaml.template"]
    );
    assert_eq!(
        catalog
            .resolve(Facet::TrainCluster, "train-gpu-cluster")
            .unwrap(),
        vec!["yaml/train-gpu-cluster.yaml.template"]
    );
}
