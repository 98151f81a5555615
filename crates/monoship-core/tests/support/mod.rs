//! Shared fixtures: an on-disk monorepo layout and recording fakes for the
//! container engine, the cloud token exchange and the remote host.

#![allow(dead_code)]

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use monoship_core::config::{MonoshipConfig, Secret};
use monoship_core::image::{BuildRequest, ImageBuilder, ImageRef};
use monoship_core::orchestration::WorkspaceLayout;
use monoship_core::registry::{Credentials, RegistryBackend, TokenExchange};
use monoship_core::remote::{
    ExecOutput, RemoteAuth, RemoteCommand, RemoteError, RemoteExecutor, RemoteSession,
    RemoteTarget,
};
use tempfile::TempDir;

// --- Workspace layout ---

pub struct Workspace {
    temp: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("packages")).unwrap();
        Self { temp }
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn packages_root(&self) -> PathBuf {
        self.root().join("packages")
    }

    /// Write `packages/<dir>/package.json` declaring `name` and `deps`.
    pub fn package(&self, dir: &str, name: &str, deps: &[(&str, &str)]) -> &Self {
        let dependencies: serde_json::Map<String, serde_json::Value> = deps
            .iter()
            .map(|(dep, version)| (dep.to_string(), serde_json::Value::from(*version)))
            .collect();
        self.raw_manifest(
            dir,
            &serde_json::json!({ "name": name, "dependencies": dependencies }).to_string(),
        )
    }

    pub fn raw_manifest(&self, dir: &str, content: &str) -> &Self {
        let path = self.packages_root().join(dir);
        std::fs::create_dir_all(&path).unwrap();
        std::fs::write(path.join("package.json"), content).unwrap();
        self
    }

    /// Directory without a manifest.
    pub fn bare_dir(&self, dir: &str) -> &Self {
        std::fs::create_dir_all(self.packages_root().join(dir)).unwrap();
        self
    }

    pub fn dockerfile(&self, dir: &str) -> &Self {
        let path = self.packages_root().join(dir);
        std::fs::create_dir_all(&path).unwrap();
        std::fs::write(path.join("Dockerfile"), "FROM scratch\n").unwrap();
        self
    }

    pub fn layout(&self) -> WorkspaceLayout {
        WorkspaceLayout::from_config(&MonoshipConfig::default(), self.root())
    }

    /// The api/shared/worker monorepo: api and worker depend on shared, only
    /// api and worker can be built.
    pub fn three_packages() -> Self {
        let ws = Self::new();
        ws.package("shared", "@acme/shared", &[])
            .package(
                "api",
                "@acme/api",
                &[("@acme/shared", "workspace:*"), ("express", "^4.18.0")],
            )
            .package("worker", "@acme/worker", &[("@acme/shared", "workspace:^")])
            .dockerfile("api")
            .dockerfile("worker");
        ws
    }
}

pub fn dirs(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// --- Container engine ---

/// Records every build, push and login. Items whose package directory is in
/// a failing set fail. Clones share the call log.
#[derive(Clone, Default)]
pub struct FakeDocker {
    pub calls: Arc<Mutex<Vec<String>>>,
    pub failing_builds: BTreeSet<String>,
    pub failing_pushes: BTreeSet<String>,
    pub reject_login: bool,
}

impl FakeDocker {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_starting_with(&self, prefix: &str) -> Vec<String> {
        let mut calls: Vec<String> = self
            .calls()
            .into_iter()
            .filter(|call| call.starts_with(prefix))
            .collect();
        calls.sort();
        calls
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

fn package_of(image: &ImageRef) -> &str {
    image.repository().rsplit('/').next().unwrap_or_default()
}

impl ImageBuilder for FakeDocker {
    async fn build(&self, request: &BuildRequest) -> anyhow::Result<()> {
        self.record(format!("build {} {}", request.dir, request.image));
        if self.failing_builds.contains(&request.dir) {
            anyhow::bail!("build of {} exited with status 1", request.dir);
        }
        Ok(())
    }

    async fn push(&self, image: &ImageRef) -> anyhow::Result<()> {
        self.record(format!("push {}", image));
        if self.failing_pushes.contains(package_of(image)) {
            anyhow::bail!("denied: requested access to the resource is denied");
        }
        Ok(())
    }
}

impl RegistryBackend for FakeDocker {
    async fn login(&self, host: &str, credentials: &Credentials) -> anyhow::Result<()> {
        self.record(format!(
            "login {} {} {}",
            host,
            credentials.username,
            credentials.password.expose()
        ));
        if self.reject_login {
            anyhow::bail!("unauthorized: incorrect username or password");
        }
        Ok(())
    }
}

// --- Token exchange ---

#[derive(Default)]
pub struct FakeTokens {
    pub token: Option<String>,
    pub regions: Mutex<Vec<String>>,
}

impl FakeTokens {
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Some(token.to_string()),
            ..Default::default()
        }
    }

    pub fn regions(&self) -> Vec<String> {
        self.regions.lock().unwrap().clone()
    }
}

impl TokenExchange for FakeTokens {
    async fn registry_token(&self, region: &str) -> anyhow::Result<Secret> {
        self.regions.lock().unwrap().push(region.to_string());
        match &self.token {
            Some(token) => Ok(Secret::new(token.clone())),
            None => anyhow::bail!("Unable to locate credentials"),
        }
    }
}

// --- Remote host ---

/// How the fake remote host behaves.
#[derive(Debug, Clone, Default)]
pub struct RemoteScript {
    /// Service names reported by the listing command
    pub existing: Vec<String>,
    pub refuse_connection: bool,
    pub fail_listing: bool,
    /// Commands containing any of these fragments exit non-zero
    pub failing: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RemoteLog {
    pub connects: usize,
    pub commands: Vec<String>,
    pub closes: usize,
}

#[derive(Clone, Default)]
pub struct FakeRemote {
    script: Arc<RemoteScript>,
    log: Arc<Mutex<RemoteLog>>,
}

impl FakeRemote {
    pub fn new(script: RemoteScript) -> Self {
        Self {
            script: Arc::new(script),
            log: Arc::default(),
        }
    }

    pub fn log(&self) -> RemoteLog {
        self.log.lock().unwrap().clone()
    }
}

pub struct FakeSession {
    script: Arc<RemoteScript>,
    log: Arc<Mutex<RemoteLog>>,
}

impl RemoteExecutor for FakeRemote {
    type Session = FakeSession;

    async fn connect(&self, target: &RemoteTarget) -> Result<FakeSession, RemoteError> {
        self.log.lock().unwrap().connects += 1;
        if self.script.refuse_connection {
            return Err(RemoteError::Connect {
                destination: target.destination(),
                detail: "Connection refused".to_string(),
            });
        }
        Ok(FakeSession {
            script: Arc::clone(&self.script),
            log: Arc::clone(&self.log),
        })
    }
}

impl RemoteSession for FakeSession {
    async fn exec(&mut self, command: &RemoteCommand) -> Result<ExecOutput, RemoteError> {
        let rendered = command.render();
        self.log.lock().unwrap().commands.push(rendered.clone());

        if rendered.contains("service ls") {
            if self.script.fail_listing {
                return Ok(failed("Cannot connect to the Docker daemon"));
            }
            let stdout = self
                .script
                .existing
                .iter()
                .enumerate()
                .map(|(idx, name)| format!("id{} {}", idx, name))
                .collect();
            return Ok(ExecOutput {
                exit_code: Some(0),
                stdout,
                stderr: Vec::new(),
            });
        }

        if self
            .script
            .failing
            .iter()
            .any(|fragment| rendered.contains(fragment.as_str()))
        {
            return Ok(failed("Error response from daemon: rpc error"));
        }

        Ok(ExecOutput {
            exit_code: Some(0),
            ..Default::default()
        })
    }

    async fn close(self) -> Result<(), RemoteError> {
        self.log.lock().unwrap().closes += 1;
        Ok(())
    }
}

fn failed(stderr: &str) -> ExecOutput {
    ExecOutput {
        exit_code: Some(1),
        stdout: Vec::new(),
        stderr: vec![stderr.to_string()],
    }
}

pub fn remote_target() -> RemoteTarget {
    RemoteTarget {
        host: "swarm.internal".to_string(),
        port: 22,
        username: "deploy".to_string(),
        auth: RemoteAuth::Password(Secret::new("hunter2")),
    }
}
