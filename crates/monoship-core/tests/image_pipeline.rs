//! Concurrent build and push stages with per-package error isolation.

mod support;

use std::sync::Arc;

use monoship_core::image::{self, BuildRequest, ImageNamer};
use monoship_core::orchestration::Stage;
use support::{FakeDocker, dirs};

fn requests(packages: &[&str]) -> Vec<BuildRequest> {
    let namer = ImageNamer::new("registry.example.com", None, "0123456789abcdef");
    packages
        .iter()
        .map(|dir| BuildRequest {
            dir: dir.to_string(),
            build_file: format!("packages/{dir}/Dockerfile").into(),
            context: ".".into(),
            image: namer.image_for(dir),
        })
        .collect()
}

#[tokio::test]
async fn all_builds_succeed() {
    let docker = Arc::new(FakeDocker::default());

    let report = image::build_all(Arc::clone(&docker), requests(&["api", "worker"])).await;

    assert!(report.is_success());
    assert_eq!(report.succeeded.len(), 2);
    assert_eq!(
        docker.calls_starting_with("build"),
        vec![
            "build api registry.example.com/api:0123456",
            "build worker registry.example.com/worker:0123456",
        ]
    );
}

#[tokio::test]
async fn one_failed_build_does_not_stop_the_others() {
    let docker = Arc::new(FakeDocker {
        failing_builds: dirs(&["api"]),
        ..Default::default()
    });

    let report = image::build_all(
        Arc::clone(&docker),
        requests(&["admin", "api", "worker"]),
    )
    .await;

    assert_eq!(docker.calls_starting_with("build").len(), 3);
    assert_eq!(report.succeeded.len(), 2);
    assert_eq!(report.failures.len(), 1);
    let failure = &report.failures[0];
    assert_eq!(failure.package, "api");
    assert!(failure.target.contains("registry.example.com/api:0123456"));
    assert!(failure.detail.contains("exited with status 1"));

    let err = report.into_result().unwrap_err();
    assert_eq!(err.stage, Stage::Build);
}

#[tokio::test]
async fn every_failure_is_collected() {
    let docker = Arc::new(FakeDocker {
        failing_builds: dirs(&["api", "worker"]),
        ..Default::default()
    });

    let report = image::build_all(Arc::clone(&docker), requests(&["api", "worker"])).await;

    let failed: Vec<&str> = report
        .failures
        .iter()
        .map(|f| f.package.as_str())
        .collect();
    assert_eq!(failed, vec!["api", "worker"]);
    assert!(report.succeeded.is_empty());
}

#[tokio::test]
async fn push_failures_name_the_image() {
    let docker = Arc::new(FakeDocker {
        failing_pushes: dirs(&["worker"]),
        ..Default::default()
    });
    let images = requests(&["api", "worker"])
        .into_iter()
        .map(|request| (request.dir, request.image))
        .collect();

    let report = image::push_all(Arc::clone(&docker), images).await;

    assert_eq!(docker.calls_starting_with("push").len(), 2);
    assert_eq!(report.succeeded.len(), 1);
    assert_eq!(report.succeeded[0].0, "api");

    let err = report.into_result().unwrap_err();
    assert_eq!(err.stage, Stage::Push);
    assert_eq!(err.failures[0].target, "registry.example.com/worker:0123456");
    let summary = err.to_string();
    assert!(summary.starts_with("Push failed"));
    assert!(summary.contains("worker"));
}

#[tokio::test]
async fn empty_stage_succeeds_without_calls() {
    let docker = Arc::new(FakeDocker::default());

    let report = image::build_all(Arc::clone(&docker), Vec::new()).await;

    assert!(report.is_success());
    assert!(docker.calls().is_empty());
}
