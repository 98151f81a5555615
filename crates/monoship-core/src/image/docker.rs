//! Docker CLI backend for building, pushing and registry login.

use std::time::Duration;

use anyhow::Context;

use crate::config::TimeoutConfig;
use crate::process::{self, CommandSpec};
use crate::registry::{Credentials, RegistryBackend};

use super::{BuildRequest, ImageBuilder, ImageRef};

#[derive(Debug, Clone)]
pub struct DockerCli {
    program: String,
    build_timeout: Duration,
    push_timeout: Duration,
    login_timeout: Duration,
}

impl DockerCli {
    pub fn new(timeouts: &TimeoutConfig) -> Self {
        Self {
            program: "docker".to_string(),
            build_timeout: timeouts.build(),
            push_timeout: timeouts.push(),
            login_timeout: timeouts.login(),
        }
    }

    /// Use a different docker-compatible binary (e.g. `podman`).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn build_command(&self, request: &BuildRequest) -> CommandSpec {
        CommandSpec::new(&self.program)
            .arg("build")
            .arg("--file")
            .arg(request.build_file.display().to_string())
            .arg("--tag")
            .arg(request.image.to_string())
            .arg(request.context.display().to_string())
    }

    async fn run_checked(&self, spec: CommandSpec, timeout: Duration) -> anyhow::Result<()> {
        let output = process::run(&spec, timeout)
            .await
            .with_context(|| format!("Failed to run {}", spec))?;
        if !output.success() {
            anyhow::bail!("`{}` failed with {}", spec, output.failure_detail());
        }
        Ok(())
    }
}

impl ImageBuilder for DockerCli {
    async fn build(&self, request: &BuildRequest) -> anyhow::Result<()> {
        self.run_checked(self.build_command(request), self.build_timeout)
            .await
    }

    async fn push(&self, image: &ImageRef) -> anyhow::Result<()> {
        let spec = CommandSpec::new(&self.program)
            .arg("push")
            .arg(image.to_string());
        self.run_checked(spec, self.push_timeout).await
    }
}

impl RegistryBackend for DockerCli {
    async fn login(&self, host: &str, credentials: &Credentials) -> anyhow::Result<()> {
        let spec = CommandSpec::new(&self.program)
            .args([
                "login",
                host,
                "--username",
                credentials.username.as_str(),
                "--password-stdin",
            ])
            .stdin(credentials.password.expose().as_bytes().to_vec());
        self.run_checked(spec, self.login_timeout).await
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn build_command_uses_definition_and_context() {
        let docker = DockerCli::new(&TimeoutConfig::default());
        let request = BuildRequest {
            dir: "api".to_string(),
            build_file: PathBuf::from("/repo/packages/api/Dockerfile"),
            context: PathBuf::from("/repo"),
            image: ImageRef::new("ghcr.io/acme/api", "abc1234"),
        };
        assert_eq!(
            docker.build_command(&request).to_string(),
            "docker build --file /repo/packages/api/Dockerfile --tag ghcr.io/acme/api:abc1234 /repo"
        );
    }
}
