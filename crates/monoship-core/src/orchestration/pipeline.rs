//! The per-pull-request pipeline.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::config::MonoshipConfig;
use crate::deploy::{DeployItem, DeployOrchestrator, DeployOutcome};
use crate::graph::{Graph, GraphBuilder, GraphError, PrefixMatcher};
use crate::image::{self, BuildRequest, ImageBuilder, ImageNamer};
use crate::impact;
use crate::manifest::FsManifestReader;
use crate::registry::{Authenticator, RegistryBackend, TokenExchange};
use crate::remote::RemoteExecutor;

use super::error::PipelineError;
use super::stage::{Stage, StageFailure};

/// Where packages live and how they are recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceLayout {
    pub packages_root: PathBuf,
    pub manifest_file: String,
    pub build_file: String,
    pub build_context: PathBuf,
    pub workspace_marker: String,
}

impl WorkspaceLayout {
    pub fn from_config(config: &MonoshipConfig, repo_root: &Path) -> Self {
        Self {
            packages_root: config.packages_root(repo_root),
            manifest_file: config.workspace.manifest_file.clone(),
            build_file: config.workspace.build_file.clone(),
            build_context: config.build_context(repo_root),
            workspace_marker: config.workspace.workspace_marker.clone(),
        }
    }

    pub fn build_file_for(&self, dir: &str) -> PathBuf {
        self.packages_root.join(dir).join(&self.build_file)
    }
}

/// Resolved, run-specific settings.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub layout: WorkspaceLayout,
    pub namer: ImageNamer,
    pub authenticator: Authenticator,
}

impl PipelineSettings {
    pub fn from_config(
        config: &MonoshipConfig,
        repo_root: &Path,
        commit_sha: &str,
    ) -> anyhow::Result<Self> {
        let registry = config.registry.host.as_deref().ok_or_else(|| {
            anyhow::anyhow!("No registry configured (set registry.host or MONOSHIP_REGISTRY)")
        })?;
        if commit_sha.trim().is_empty() {
            anyhow::bail!("Commit SHA is empty");
        }

        Ok(Self {
            layout: WorkspaceLayout::from_config(config, repo_root),
            namer: ImageNamer::new(registry, config.registry.prefix.as_deref(), commit_sha),
            authenticator: Authenticator::select(&config.registry)?,
        })
    }
}

/// Graph-derived view of what a change set touches.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlanReport {
    pub changed: BTreeSet<String>,
    pub impacted: BTreeSet<String>,
    pub buildable: BTreeSet<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    #[serde(flatten)]
    pub plan: PlanReport,
    /// Pushed image per package directory
    pub images: BTreeMap<String, String>,
    /// `None` when nothing needed a rebuild
    pub deploy: Option<DeployOutcome>,
}

impl RunReport {
    /// Directories whose images were rebuilt and pushed.
    pub fn rebuilt(&self) -> impl Iterator<Item = &str> {
        self.images.keys().map(String::as_str)
    }
}

pub struct Pipeline<B, T, X> {
    settings: PipelineSettings,
    builder: Arc<B>,
    tokens: T,
    deployer: DeployOrchestrator<X>,
}

impl<B, T, X> Pipeline<B, T, X>
where
    B: ImageBuilder + RegistryBackend,
    T: TokenExchange,
    X: RemoteExecutor,
{
    pub fn new(
        settings: PipelineSettings,
        builder: B,
        tokens: T,
        deployer: DeployOrchestrator<X>,
    ) -> Self {
        Self {
            settings,
            builder: Arc::new(builder),
            tokens,
            deployer,
        }
    }

    /// Expand and filter `changed` without side effects.
    pub fn plan(&self, changed: &BTreeSet<String>) -> Result<(Graph, PlanReport), PipelineError> {
        plan(&self.settings.layout, changed)
    }

    #[tracing::instrument(skip_all, fields(changed = changed.len()))]
    pub async fn run(&self, changed: &BTreeSet<String>) -> Result<RunReport, PipelineError> {
        let (graph, plan) = self.plan(changed)?;
        tracing::info!(
            impacted = ?plan.impacted,
            buildable = ?plan.buildable,
            "Resolved packages to rebuild"
        );

        if plan.buildable.is_empty() {
            tracing::info!("No impacted package has a build definition; nothing to do");
            return Ok(RunReport {
                plan,
                images: BTreeMap::new(),
                deploy: None,
            });
        }

        let requests = plan
            .buildable
            .iter()
            .map(|dir| BuildRequest {
                dir: dir.clone(),
                build_file: self.settings.layout.build_file_for(dir),
                context: self.settings.layout.build_context.clone(),
                image: self.settings.namer.image_for(dir),
            })
            .collect();
        let built = image::build_all(Arc::clone(&self.builder), requests)
            .await
            .into_result()?;

        self.settings
            .authenticator
            .login(self.builder.as_ref(), &self.tokens)
            .await?;

        let images = built
            .into_iter()
            .map(|request| (request.dir, request.image))
            .collect();
        let pushed = image::push_all(Arc::clone(&self.builder), images)
            .await
            .into_result()?;

        let items: Vec<DeployItem> = pushed
            .iter()
            .map(|(dir, image)| DeployItem {
                options: graph
                    .package_by_dir(dir)
                    .map(|package| package.deploy.clone())
                    .unwrap_or_default(),
                dir: dir.clone(),
                image: image.clone(),
            })
            .collect();

        let outcome = self.deployer.deploy(&items).await?;
        if let DeployOutcome::Completed(report) = &outcome {
            if !report.failures.is_empty() {
                return Err(StageFailure {
                    stage: Stage::Deploy,
                    failures: report.failures.clone(),
                }
                .into());
            }
        }

        Ok(RunReport {
            plan,
            images: pushed
                .into_iter()
                .map(|(dir, image)| (dir, image.to_string()))
                .collect(),
            deploy: Some(outcome),
        })
    }
}

/// Build the dependency graph of the packages under `layout`.
pub fn build_graph(layout: &WorkspaceLayout) -> Result<Graph, GraphError> {
    let reader = FsManifestReader::new(layout.packages_root.clone())
        .with_file_name(layout.manifest_file.clone());
    GraphBuilder::with_reader(layout.packages_root.clone(), reader)
        .with_matcher(PrefixMatcher::new(layout.workspace_marker.clone()))
        .build()
}

/// Graph, impacted set and buildable set for `changed`.
///
/// Keys that are not a single directory name are dropped first.
pub fn plan(
    layout: &WorkspaceLayout,
    changed: &BTreeSet<String>,
) -> Result<(Graph, PlanReport), PipelineError> {
    let changed = impact::valid_dir_keys(changed);
    let graph = build_graph(layout)?;
    let impacted = impact::expand(&changed, &graph);
    let buildable = image::filter_buildable(&impacted, &layout.packages_root, &layout.build_file);
    Ok((
        graph,
        PlanReport {
            changed,
            impacted,
            buildable,
        },
    ))
}
