//! Configuration schema for monoship.toml

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::graph::PrefixMatcher;
use crate::manifest::MANIFEST_FILE;

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MonoshipConfig {
    /// Commit the images are tagged from (falls back to HEAD)
    pub commit_sha: Option<String>,
    pub workspace: WorkspaceConfig,
    pub registry: RegistryConfig,
    pub remote: RemoteConfig,
    pub github: GitHubConfig,
    pub timeouts: TimeoutConfig,
}

/// Monorepo layout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Directory holding one subdirectory per package, relative to the repo root
    pub packages_root: PathBuf,
    /// Manifest file name inside each package
    pub manifest_file: String,
    /// Build definition file name inside each package
    pub build_file: String,
    /// Build context handed to the image builder, relative to the repo root
    pub build_context: PathBuf,
    /// Version prefix marking a workspace-local dependency
    pub workspace_marker: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            packages_root: PathBuf::from("packages"),
            manifest_file: MANIFEST_FILE.to_string(),
            build_file: crate::image::BUILD_FILE.to_string(),
            build_context: PathBuf::from("."),
            workspace_marker: PrefixMatcher::DEFAULT_MARKER.to_string(),
        }
    }
}

/// Target image registry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Registry host, e.g. `ghcr.io` or `123456789012.dkr.ecr.eu-west-1.amazonaws.com`
    pub host: Option<String>,
    /// Optional path prefix inserted between host and package directory
    pub prefix: Option<String>,
    pub username: Option<String>,
    pub password: Option<Secret>,
}

/// Remote orchestrator reachable over SSH
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub host: Option<String>,
    pub port: u16,
    pub username: String,
    pub password: Option<Secret>,
    /// Private key contents (PEM/OpenSSH format)
    pub private_key: Option<Secret>,
    /// Overlay network services are attached to
    pub network: Option<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: 22,
            username: "root".to_string(),
            password: None,
            private_key: None,
            network: None,
        }
    }
}

/// Pull-request integration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    pub api_url: String,
    pub token: Option<Secret>,
    /// `owner/name` of the repository
    pub repository: Option<String>,
    /// Path to the webhook event payload
    pub event_path: Option<PathBuf>,
    /// Close the pull request after reporting a failure
    pub close_on_failure: bool,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            token: None,
            repository: None,
            event_path: None,
            close_on_failure: true,
        }
    }
}

/// Upper bounds for external calls, in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub build_secs: u64,
    pub push_secs: u64,
    pub login_secs: u64,
    pub remote_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            build_secs: 30 * 60,
            push_secs: 15 * 60,
            login_secs: 2 * 60,
            remote_secs: 5 * 60,
        }
    }
}

impl TimeoutConfig {
    pub fn build(&self) -> Duration {
        Duration::from_secs(self.build_secs)
    }

    pub fn push(&self) -> Duration {
        Duration::from_secs(self.push_secs)
    }

    pub fn login(&self) -> Duration {
        Duration::from_secs(self.login_secs)
    }

    pub fn remote(&self) -> Duration {
        Duration::from_secs(self.remote_secs)
    }
}

impl MonoshipConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Absolute packages root for a repository checked out at `repo_root`.
    pub fn packages_root(&self, repo_root: &Path) -> PathBuf {
        repo_root.join(&self.workspace.packages_root)
    }

    pub fn build_context(&self, repo_root: &Path) -> PathBuf {
        repo_root.join(&self.workspace.build_context)
    }
}

/// A credential that never shows up in logs or debug output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(***)")
    }
}
