//! Registry authentication.
//!
//! Exactly one strategy is chosen per run from the registry configuration:
//! a cloud registry (detected from its host name) gets a short-lived token
//! from the cloud CLI, otherwise configured username/password are used, and
//! with neither the login step is skipped.

mod aws;

pub use aws::AwsCli;

use std::future::Future;

use crate::config::{RegistryConfig, Secret};

/// Marker identifying an ECR registry host.
const CLOUD_MARKER: &str = ".dkr.ecr.";
/// Suffix terminating the region in an ECR registry host.
const CLOUD_SUFFIX: &str = ".amazonaws.com";
/// Login user ECR expects together with an exchanged token.
const CLOUD_USERNAME: &str = "AWS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: Secret,
}

/// Performs `login(host, credentials)` against a registry.
pub trait RegistryBackend: Send + Sync {
    fn login(
        &self,
        host: &str,
        credentials: &Credentials,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;
}

/// Exchanges ambient cloud credentials for a registry password.
pub trait TokenExchange: Send + Sync {
    fn registry_token(&self, region: &str) -> impl Future<Output = anyhow::Result<Secret>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("cannot determine region from registry host '{host}'")]
    UnknownRegion { host: String },

    #[error("failed to obtain registry token for region {region}: {detail}")]
    TokenExchange { region: String, detail: String },

    #[error("login to {host} failed: {detail}")]
    Rejected { host: String, detail: String },
}

/// Selected login strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authenticator {
    /// Token exchange for a cloud-hosted registry
    CloudToken { host: String, region: String },
    /// Plain username/password login
    Direct {
        host: String,
        credentials: Credentials,
    },
    /// No login; pushes rely on existing local credentials
    Anonymous,
}

impl Authenticator {
    pub fn select(config: &RegistryConfig) -> Result<Self, LoginError> {
        let Some(host) = config.host.as_deref() else {
            return Ok(Self::Anonymous);
        };

        if is_cloud_registry(host) {
            let region = cloud_region(host).ok_or_else(|| LoginError::UnknownRegion {
                host: host.to_string(),
            })?;
            return Ok(Self::CloudToken {
                host: host.to_string(),
                region: region.to_string(),
            });
        }

        match (&config.username, &config.password) {
            (Some(username), Some(password)) if !username.is_empty() => Ok(Self::Direct {
                host: host.to_string(),
                credentials: Credentials {
                    username: username.clone(),
                    password: password.clone(),
                },
            }),
            _ => Ok(Self::Anonymous),
        }
    }

    #[tracing::instrument(skip_all, fields(strategy = self.strategy_name()))]
    pub async fn login<B, T>(&self, backend: &B, tokens: &T) -> Result<(), LoginError>
    where
        B: RegistryBackend,
        T: TokenExchange,
    {
        match self {
            Self::Anonymous => {
                tracing::info!("No registry credentials configured; skipping login");
                Ok(())
            }
            Self::Direct { host, credentials } => {
                tracing::info!(host = %host, "Logging in to registry");
                backend
                    .login(host, credentials)
                    .await
                    .map_err(|err| LoginError::Rejected {
                        host: host.clone(),
                        detail: format!("{:#}", err),
                    })
            }
            Self::CloudToken { host, region } => {
                tracing::info!(host = %host, region = %region, "Logging in to cloud registry");
                let token = tokens.registry_token(region).await.map_err(|err| {
                    LoginError::TokenExchange {
                        region: region.clone(),
                        detail: format!("{:#}", err),
                    }
                })?;
                let credentials = Credentials {
                    username: CLOUD_USERNAME.to_string(),
                    password: token,
                };
                backend
                    .login(host, &credentials)
                    .await
                    .map_err(|err| LoginError::Rejected {
                        host: host.clone(),
                        detail: format!("{:#}", err),
                    })
            }
        }
    }

    pub fn strategy_name(&self) -> &'static str {
        match self {
            Self::CloudToken { .. } => "cloud-token",
            Self::Direct { .. } => "direct",
            Self::Anonymous => "anonymous",
        }
    }
}

pub fn is_cloud_registry(host: &str) -> bool {
    host.contains(CLOUD_MARKER)
}

/// Region between the ECR marker and the `.amazonaws.com` suffix.
pub fn cloud_region(host: &str) -> Option<&str> {
    let start = host.find(CLOUD_MARKER)? + CLOUD_MARKER.len();
    let rest = &host[start..];
    let end = rest.find(CLOUD_SUFFIX)?;
    Some(&rest[..end]).filter(|region| !region.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_region_from_ecr_host() {
        assert_eq!(
            cloud_region("123456789012.dkr.ecr.eu-west-1.amazonaws.com"),
            Some("eu-west-1")
        );
        assert_eq!(
            cloud_region("123456789012.dkr.ecr.cn-north-1.amazonaws.com.cn"),
            Some("cn-north-1")
        );
        assert_eq!(cloud_region("123456789012.dkr.ecr..amazonaws.com"), None);
        assert_eq!(cloud_region("ghcr.io"), None);
    }

    #[test]
    fn cloud_host_wins_over_credentials() {
        let config = RegistryConfig {
            host: Some("1.dkr.ecr.us-east-1.amazonaws.com".to_string()),
            prefix: None,
            username: Some("ci".to_string()),
            password: Some(Secret::new("pw")),
        };
        assert_eq!(
            Authenticator::select(&config).unwrap(),
            Authenticator::CloudToken {
                host: "1.dkr.ecr.us-east-1.amazonaws.com".to_string(),
                region: "us-east-1".to_string(),
            }
        );
    }

    #[test]
    fn direct_requires_both_username_and_password() {
        let mut config = RegistryConfig {
            host: Some("ghcr.io".to_string()),
            username: Some("ci".to_string()),
            ..Default::default()
        };
        assert_eq!(Authenticator::select(&config).unwrap(), Authenticator::Anonymous);

        config.password = Some(Secret::new("pw"));
        assert!(matches!(
            Authenticator::select(&config).unwrap(),
            Authenticator::Direct { .. }
        ));
    }

    #[test]
    fn cloud_host_without_region_is_an_error() {
        let config = RegistryConfig {
            host: Some("mirror.dkr.ecr.internal".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            Authenticator::select(&config),
            Err(LoginError::UnknownRegion { .. })
        ));
    }
}
