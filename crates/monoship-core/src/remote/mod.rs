//! Remote command execution over a single long-lived session.

mod command;
mod ssh;

pub use command::RemoteCommand;
pub use ssh::{SshExecutor, SshSession};

use std::future::Future;

use crate::config::{RemoteConfig, Secret};

/// How to authenticate against the remote host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteAuth {
    Password(Secret),
    PrivateKey(Secret),
}

/// Where and as whom to connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub auth: RemoteAuth,
}

impl RemoteTarget {
    /// Target from configuration, or `None` when host or credentials are missing.
    ///
    /// A private key takes precedence over a password when both are set.
    pub fn from_config(config: &RemoteConfig) -> Option<Self> {
        let host = config.host.as_deref().filter(|h| !h.is_empty())?;
        let auth = match (&config.private_key, &config.password) {
            (Some(key), _) => RemoteAuth::PrivateKey(key.clone()),
            (None, Some(password)) => RemoteAuth::Password(password.clone()),
            (None, None) => return None,
        };
        Some(Self {
            host: host.to_string(),
            port: config.port,
            username: config.username.clone(),
            auth,
        })
    }

    pub fn destination(&self) -> String {
        format!("{}@{}", self.username, self.host)
    }
}

/// Result of one remote command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    pub exit_code: Option<i32>,
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn failure_detail(&self) -> String {
        let status = match self.exit_code {
            Some(code) => format!("exit code {}", code),
            None => "no exit status".to_string(),
        };
        let stderr = self.stderr.join("\n");
        if stderr.trim().is_empty() {
            status
        } else {
            format!("{}: {}", status, stderr.trim())
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("failed to connect to {destination}: {detail}")]
    Connect { destination: String, detail: String },

    #[error("failed to run `{command}`: {detail}")]
    Exec { command: String, detail: String },

    #[error("failed to close session to {destination}: {detail}")]
    Close { destination: String, detail: String },
}

/// Opens sessions on the remote orchestrator host.
pub trait RemoteExecutor: Send + Sync {
    type Session: RemoteSession;

    fn connect(
        &self,
        target: &RemoteTarget,
    ) -> impl Future<Output = Result<Self::Session, RemoteError>> + Send;
}

/// An open session. Owned exclusively by one deployment run.
pub trait RemoteSession: Send {
    fn exec(
        &mut self,
        command: &RemoteCommand,
    ) -> impl Future<Output = Result<ExecOutput, RemoteError>> + Send;

    fn close(self) -> impl Future<Output = Result<(), RemoteError>> + Send;
}
