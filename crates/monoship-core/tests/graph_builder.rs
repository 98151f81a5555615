//! Graph construction from package manifests on disk.

mod support;

use monoship_core::graph::{GraphBuilder, GraphError};
use support::{Workspace, dirs};

#[test]
fn links_workspace_dependencies_in_both_directions() {
    let ws = Workspace::three_packages();

    let graph = GraphBuilder::new(ws.packages_root()).build().unwrap();

    assert_eq!(graph.len(), 3);
    assert_eq!(graph.name_for_dir("api"), Some("@acme/api"));
    assert_eq!(graph.dir_for_name("@acme/shared"), Some("shared"));
    assert_eq!(graph.parents("@acme/api"), &dirs(&["@acme/shared"]));
    assert_eq!(
        graph.children("@acme/shared"),
        &dirs(&["@acme/api", "@acme/worker"])
    );
}

#[test]
fn external_dependencies_do_not_create_edges() {
    let ws = Workspace::three_packages();

    let graph = GraphBuilder::new(ws.packages_root()).build().unwrap();

    assert!(graph.children("express").is_empty());
    assert!(!graph.parents("@acme/api").contains("express"));
}

#[test]
fn every_edge_has_a_matching_reverse_edge() {
    let ws = Workspace::three_packages();
    ws.package(
        "web",
        "@acme/web",
        &[("@acme/api", "workspace:*"), ("@acme/shared", "workspace:*")],
    );

    let graph = GraphBuilder::new(ws.packages_root()).build().unwrap();

    for package in graph.packages() {
        for parent in graph.parents(&package.name) {
            assert!(graph.children(parent).contains(&package.name));
        }
        for child in graph.children(&package.name) {
            assert!(graph.parents(child).contains(&package.name));
        }
    }
}

#[test]
fn packages_are_listed_in_directory_order() {
    let ws = Workspace::three_packages();

    let graph = GraphBuilder::new(ws.packages_root()).build().unwrap();

    let listed: Vec<&str> = graph.packages().iter().map(|p| p.dir.as_str()).collect();
    assert_eq!(listed, vec!["api", "shared", "worker"]);
}

#[test]
fn directory_without_manifest_is_fatal() {
    let ws = Workspace::three_packages();
    ws.bare_dir("docs");

    let err = GraphBuilder::new(ws.packages_root()).build().unwrap_err();

    match err {
        GraphError::ManifestUnreadable { dir, .. } => assert_eq!(dir, "docs"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn malformed_manifest_excludes_only_that_package() {
    let ws = Workspace::three_packages();
    ws.raw_manifest("broken", "{ \"name\": ");

    let graph = GraphBuilder::new(ws.packages_root()).build().unwrap();

    assert_eq!(graph.len(), 3);
    assert!(graph.package_by_dir("broken").is_none());
}

#[test]
fn duplicate_declared_names_are_rejected() {
    let ws = Workspace::three_packages();
    ws.package("api-copy", "@acme/api", &[]);

    let err = GraphBuilder::new(ws.packages_root()).build().unwrap_err();

    assert!(matches!(err, GraphError::DuplicateName { ref name, .. } if name == "@acme/api"));
}

#[test]
fn deploy_options_are_carried_onto_packages() {
    let ws = Workspace::new();
    ws.raw_manifest(
        "api",
        r#"{ "name": "@acme/api", "deploy": { "replicas": 2, "publish": "8080:80" } }"#,
    );

    let graph = GraphBuilder::new(ws.packages_root()).build().unwrap();

    let api = graph.package_by_dir("api").unwrap();
    assert_eq!(api.deploy.get("replicas"), Some("2"));
    assert_eq!(api.deploy.get("publish"), Some("8080:80"));
}

#[test]
fn missing_packages_root_is_fatal() {
    let ws = Workspace::new();

    let err = GraphBuilder::new(ws.root().join("nope")).build().unwrap_err();

    assert!(matches!(err, GraphError::PackagesRootUnreadable { .. }));
}
