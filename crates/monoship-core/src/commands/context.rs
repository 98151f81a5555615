//! Run context providing dependency injection for commands.
//!
//! RunContext holds the repository root and the merged configuration, and
//! creates the concrete collaborators (docker, aws, ssh, GitHub) from them.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::config::{ConfigStore, MonoshipConfig};
use crate::deploy::{DeployOrchestrator, DeploySettings};
use crate::github::{self, GitHubClient, PullRequestEvent};
use crate::image::DockerCli;
use crate::orchestration::{Pipeline, PipelineSettings, WorkspaceLayout};
use crate::registry::AwsCli;
use crate::remote::SshExecutor;

/// The production pipeline wiring.
pub type CliPipeline = Pipeline<DockerCli, AwsCli, SshExecutor>;

/// Where the set of changed packages comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeSource {
    /// Directory keys given explicitly
    Dirs(BTreeSet<String>),
    /// Files of the pull request described by the event payload
    Event(PathBuf),
    /// Use the configured event payload (`GITHUB_EVENT_PATH`)
    Configured,
}

pub struct RunContext {
    repo_root: PathBuf,
    config: MonoshipConfig,
}

impl RunContext {
    pub fn new(repo_root: PathBuf, config: MonoshipConfig) -> Self {
        Self { repo_root, config }
    }

    /// Load `monoship.toml` (or `config_path`) and overlay the environment.
    pub fn load(repo_root: PathBuf, config_path: Option<PathBuf>) -> anyhow::Result<Self> {
        let store = match config_path {
            Some(path) => ConfigStore::from_path(path),
            None => ConfigStore::from_repo_root(&repo_root),
        };
        let config = store.load_with_env()?;
        Ok(Self::new(repo_root, config))
    }

    /// Context for the current directory.
    pub fn with_defaults() -> anyhow::Result<Self> {
        let repo_root = std::env::current_dir().context("Could not determine current directory")?;
        Self::load(repo_root, None)
    }

    // --- Accessors ---

    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    pub fn config(&self) -> &MonoshipConfig {
        &self.config
    }

    pub fn layout(&self) -> WorkspaceLayout {
        WorkspaceLayout::from_config(&self.config, &self.repo_root)
    }

    // --- Service factories ---

    /// Commit to tag images from: configured value, then the event's head, then `HEAD`.
    pub fn commit_sha(&self, event: Option<&PullRequestEvent>) -> anyhow::Result<String> {
        if let Some(sha) = &self.config.commit_sha {
            return Ok(sha.clone());
        }
        if let Some(sha) = event.and_then(|e| e.head_sha.clone()) {
            return Ok(sha);
        }
        crate::git::resolve_head_sha(&self.repo_root)
    }

    pub fn pipeline(&self, commit_sha: &str) -> anyhow::Result<CliPipeline> {
        let settings = PipelineSettings::from_config(&self.config, &self.repo_root, commit_sha)?;
        let timeouts = &self.config.timeouts;
        let deploy = DeploySettings::from_config(&self.config.remote);
        Ok(Pipeline::new(
            settings,
            DockerCli::new(timeouts),
            AwsCli::new(timeouts.login()),
            DeployOrchestrator::new(SshExecutor::new(timeouts.remote()), deploy),
        ))
    }

    pub fn github(&self) -> anyhow::Result<GitHubClient> {
        GitHubClient::new(&self.config.github.api_url, self.config.github.token.clone())
    }

    /// The pull request event for `source`.
    ///
    /// With explicit directories the configured event is optional and only
    /// used to report failures back to the pull request.
    pub fn pull_request_event(
        &self,
        source: &ChangeSource,
    ) -> anyhow::Result<Option<PullRequestEvent>> {
        let configured = self.config.github.event_path.as_deref();
        match source {
            ChangeSource::Event(path) => PullRequestEvent::from_path(path).map(Some),
            ChangeSource::Configured => {
                let path = configured.ok_or_else(|| {
                    anyhow::anyhow!(
                        "No changed packages given and no event payload configured (GITHUB_EVENT_PATH)"
                    )
                })?;
                PullRequestEvent::from_path(path).map(Some)
            }
            ChangeSource::Dirs(_) => match configured.filter(|path| path.exists()) {
                Some(path) => match PullRequestEvent::from_path(path) {
                    Ok(event) => Ok(Some(event)),
                    Err(err) => {
                        tracing::warn!(
                            error = %format!("{:#}", err),
                            "Ignoring configured event payload"
                        );
                        Ok(None)
                    }
                },
                None => Ok(None),
            },
        }
    }

    /// Changed package directories for `source`.
    pub async fn changed_dirs(
        &self,
        source: &ChangeSource,
        event: Option<&PullRequestEvent>,
    ) -> anyhow::Result<BTreeSet<String>> {
        if let ChangeSource::Dirs(dirs) = source {
            return Ok(dirs.clone());
        }
        let event = event.ok_or_else(|| anyhow::anyhow!("No pull request event available"))?;
        let files = self
            .github()?
            .pull_request_files(&event.repository, event.number)
            .await?;
        let dirs = github::changed_dirs(
            files.iter().flat_map(|file| file.paths()),
            &self.config.workspace.packages_root,
        );
        tracing::info!(
            pull_request = event.number,
            files = files.len(),
            changed = ?dirs,
            "Resolved changed packages"
        );
        Ok(dirs)
    }
}

/// Runtime for commands called from synchronous code.
pub(crate) fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")
}
