//! AWS CLI token exchange for ECR.

use std::time::Duration;

use anyhow::Context;

use crate::config::Secret;
use crate::process::{self, CommandSpec};

use super::TokenExchange;

#[derive(Debug, Clone)]
pub struct AwsCli {
    program: String,
    timeout: Duration,
}

impl AwsCli {
    pub fn new(timeout: Duration) -> Self {
        Self {
            program: "aws".to_string(),
            timeout,
        }
    }

    fn token_command(&self, region: &str) -> CommandSpec {
        CommandSpec::new(&self.program).args(["ecr", "get-login-password", "--region", region])
    }
}

impl TokenExchange for AwsCli {
    async fn registry_token(&self, region: &str) -> anyhow::Result<Secret> {
        let spec = self.token_command(region);
        let output = process::run(&spec, self.timeout)
            .await
            .with_context(|| format!("Failed to run {}", spec))?;
        if !output.success() {
            anyhow::bail!("`{}` failed with {}", spec, output.failure_detail());
        }
        let token = output.stdout.trim();
        if token.is_empty() {
            anyhow::bail!("`{}` returned an empty token", spec);
        }
        Ok(Secret::new(token))
    }
}
