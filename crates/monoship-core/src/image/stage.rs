//! Concurrent build and push stages.
//!
//! Every item runs to completion; failures are collected per package instead
//! of cancelling siblings.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::orchestration::{ItemFailure, Stage, StageReport};

use super::{BuildRequest, ImageBuilder, ImageRef};

/// Build every request concurrently.
#[tracing::instrument(skip_all, fields(packages = requests.len()))]
pub async fn build_all<B: ImageBuilder>(
    builder: Arc<B>,
    requests: Vec<BuildRequest>,
) -> StageReport<BuildRequest> {
    tracing::info!("Building images");

    let tasks = requests
        .into_iter()
        .map(|request| {
            let identity = (request.dir.clone(), request.image.to_string());
            let builder = Arc::clone(&builder);
            let handle = tokio::spawn(async move {
                let result = builder.build(&request).await;
                (request, result)
            });
            (identity, handle)
        })
        .collect();

    collect(Stage::Build, tasks, |request: &BuildRequest| {
        format!("{} -> {}", request.build_file.display(), request.image)
    })
    .await
}

/// Push every image concurrently. `images` pairs a package directory with its image.
#[tracing::instrument(skip_all, fields(packages = images.len()))]
pub async fn push_all<B: ImageBuilder>(
    builder: Arc<B>,
    images: Vec<(String, ImageRef)>,
) -> StageReport<(String, ImageRef)> {
    tracing::info!("Pushing images");

    let tasks = images
        .into_iter()
        .map(|(dir, image)| {
            let identity = (dir.clone(), image.to_string());
            let builder = Arc::clone(&builder);
            let handle = tokio::spawn(async move {
                let result = builder.push(&image).await;
                ((dir, image), result)
            });
            (identity, handle)
        })
        .collect();

    collect(Stage::Push, tasks, |(_, image): &(String, ImageRef)| {
        image.to_string()
    })
    .await
}

type Task<T> = ((String, String), JoinHandle<(T, anyhow::Result<()>)>);

async fn collect<T>(
    stage: Stage,
    tasks: Vec<Task<T>>,
    target: impl Fn(&T) -> String,
) -> StageReport<T> {
    let mut report = StageReport::new(stage);

    for ((dir, image), handle) in tasks {
        match handle.await {
            Ok((item, Ok(()))) => {
                tracing::info!(package = %dir, image = %image, "{} succeeded", stage);
                report.succeeded.push(item);
            }
            Ok((item, Err(err))) => {
                let failure = ItemFailure::new(dir, target(&item), format!("{:#}", err));
                tracing::error!(
                    package = %failure.package,
                    target = %failure.target,
                    detail = %failure.detail,
                    "{} failed",
                    stage
                );
                report.failures.push(failure);
            }
            Err(join_err) => {
                let failure = ItemFailure::new(dir, image, format!("task aborted: {}", join_err));
                tracing::error!(
                    package = %failure.package,
                    detail = %failure.detail,
                    "{} task aborted",
                    stage
                );
                report.failures.push(failure);
            }
        }
    }

    report
}
