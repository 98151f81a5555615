//! Deployment of built images to the remote orchestrator.
//!
//! One run opens a single session, snapshots the existing services once and
//! then creates or updates each package's service in turn. Per-package
//! failures are collected; connection and listing failures abort the run.

pub mod commands;

use std::collections::BTreeSet;

use serde::Serialize;

use crate::config::RemoteConfig;
use crate::image::ImageRef;
use crate::manifest::DeployOptions;
use crate::orchestration::ItemFailure;
use crate::remote::{RemoteError, RemoteExecutor, RemoteSession, RemoteTarget};

/// Settings for an enabled deployment stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploySettings {
    pub target: RemoteTarget,
    pub network: String,
}

impl DeploySettings {
    /// `None` (deployment disabled) unless host, network and a credential are configured.
    pub fn from_config(config: &RemoteConfig) -> Option<Self> {
        let network = config.network.as_deref().filter(|n| !n.is_empty())?;
        let target = RemoteTarget::from_config(config)?;
        Some(Self {
            target,
            network: network.to_string(),
        })
    }
}

/// One package to deploy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployItem {
    pub dir: String,
    pub image: ImageRef,
    pub options: DeployOptions,
}

impl DeployItem {
    pub fn service_name(&self) -> &str {
        self.options.service_name(&self.dir)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployAction {
    Create,
    Update,
}

impl DeployAction {
    /// Update iff the service is in the snapshot taken at the start of the run.
    pub fn decide(existing: &BTreeSet<String>, service: &str) -> Self {
        if existing.contains(service) {
            Self::Update
        } else {
            Self::Create
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployedService {
    pub dir: String,
    pub service: String,
    pub action: DeployAction,
    pub image: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DeployReport {
    /// Services present on the remote when the run started
    pub existing_services: BTreeSet<String>,
    pub deployed: Vec<DeployedService>,
    pub failures: Vec<ItemFailure>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DeployOutcome {
    /// Remote deployment not configured
    Disabled,
    Completed(DeployReport),
}

#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error(transparent)]
    Connect(RemoteError),

    #[error("failed to list remote services: {detail}")]
    Listing { detail: String },
}

pub struct DeployOrchestrator<X> {
    executor: X,
    settings: Option<DeploySettings>,
}

impl<X: RemoteExecutor> DeployOrchestrator<X> {
    pub fn new(executor: X, settings: Option<DeploySettings>) -> Self {
        Self { executor, settings }
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.is_some()
    }

    #[tracing::instrument(skip_all, fields(packages = items.len()))]
    pub async fn deploy(&self, items: &[DeployItem]) -> Result<DeployOutcome, DeployError> {
        let Some(settings) = &self.settings else {
            tracing::info!("Remote deployment not configured; skipping");
            return Ok(DeployOutcome::Disabled);
        };
        if items.is_empty() {
            return Ok(DeployOutcome::Completed(DeployReport::default()));
        }

        let mut session = self
            .executor
            .connect(&settings.target)
            .await
            .map_err(DeployError::Connect)?;

        let existing = match list_services(&mut session).await {
            Ok(existing) => existing,
            Err(err) => {
                if let Err(close_err) = session.close().await {
                    tracing::warn!(error = %close_err, "Failed to close remote session");
                }
                return Err(err);
            }
        };
        tracing::info!(services = existing.len(), "Listed existing remote services");

        let mut report = DeployReport {
            existing_services: existing,
            ..Default::default()
        };

        for item in items {
            match deploy_one(&mut session, settings, &report.existing_services, item).await {
                Ok(deployed) => {
                    tracing::info!(
                        package = %deployed.dir,
                        service = %deployed.service,
                        action = ?deployed.action,
                        "Deployed"
                    );
                    report.deployed.push(deployed);
                }
                Err(failure) => {
                    tracing::error!(
                        package = %failure.package,
                        target = %failure.target,
                        detail = %failure.detail,
                        "Deploy failed"
                    );
                    report.failures.push(failure);
                }
            }
        }

        if let Err(err) = session.close().await {
            tracing::warn!(error = %err, "Failed to close remote session");
        }

        Ok(DeployOutcome::Completed(report))
    }
}

async fn list_services<S: RemoteSession>(session: &mut S) -> Result<BTreeSet<String>, DeployError> {
    let command = commands::list_services_command();
    let output = session
        .exec(&command)
        .await
        .map_err(|err| DeployError::Listing {
            detail: err.to_string(),
        })?;
    if !output.success() {
        return Err(DeployError::Listing {
            detail: output.failure_detail(),
        });
    }
    Ok(commands::parse_service_list(&output.stdout))
}

async fn deploy_one<S: RemoteSession>(
    session: &mut S,
    settings: &DeploySettings,
    existing: &BTreeSet<String>,
    item: &DeployItem,
) -> Result<DeployedService, ItemFailure> {
    let service = item.service_name();
    let action = DeployAction::decide(existing, service);

    let command = match action {
        DeployAction::Update => commands::update_command(service, &item.image),
        DeployAction::Create => {
            commands::create_command(service, &settings.network, &item.image, &item.options)
                .map_err(|detail| ItemFailure::new(&item.dir, service, detail))?
        }
    };

    let output = session
        .exec(&command)
        .await
        .map_err(|err| ItemFailure::new(&item.dir, command.render(), err.to_string()))?;
    if !output.success() {
        return Err(ItemFailure::new(
            &item.dir,
            command.render(),
            output.failure_detail(),
        ));
    }

    Ok(DeployedService {
        dir: item.dir.clone(),
        service: service.to_string(),
        action,
        image: item.image.to_string(),
    })
}
