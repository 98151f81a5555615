//! Environment overlay for configuration values.
//!
//! CI systems hand secrets and per-run values (commit, event payload) to the
//! process through the environment. Every variable here overrides the file.

use std::path::PathBuf;

use anyhow::Context;

use super::schema::{MonoshipConfig, Secret};

/// Apply `MONOSHIP_*` / `GITHUB_*` variables read through `lookup`.
///
/// Empty values are treated as unset.
pub fn apply_env_overrides<F>(config: &mut MonoshipConfig, lookup: F) -> anyhow::Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("MONOSHIP_COMMIT_SHA").or_else(|| get("GITHUB_SHA")) {
        config.commit_sha = Some(v);
    }

    if let Some(v) = get("MONOSHIP_PACKAGES_ROOT") {
        config.workspace.packages_root = PathBuf::from(v);
    }
    if let Some(v) = get("MONOSHIP_BUILD_CONTEXT") {
        config.workspace.build_context = PathBuf::from(v);
    }
    if let Some(v) = get("MONOSHIP_WORKSPACE_MARKER") {
        config.workspace.workspace_marker = v;
    }

    if let Some(v) = get("MONOSHIP_REGISTRY") {
        config.registry.host = Some(v);
    }
    if let Some(v) = get("MONOSHIP_REGISTRY_PREFIX") {
        config.registry.prefix = Some(v);
    }
    if let Some(v) = get("MONOSHIP_REGISTRY_USERNAME") {
        config.registry.username = Some(v);
    }
    if let Some(v) = get("MONOSHIP_REGISTRY_PASSWORD") {
        config.registry.password = Some(Secret::new(v));
    }

    if let Some(v) = get("MONOSHIP_REMOTE_HOST") {
        config.remote.host = Some(v);
    }
    if let Some(v) = get("MONOSHIP_REMOTE_PORT") {
        config.remote.port = v
            .trim()
            .parse()
            .with_context(|| format!("MONOSHIP_REMOTE_PORT is not a valid port: {}", v))?;
    }
    if let Some(v) = get("MONOSHIP_REMOTE_USER") {
        config.remote.username = v;
    }
    if let Some(v) = get("MONOSHIP_REMOTE_PASSWORD") {
        config.remote.password = Some(Secret::new(v));
    }
    if let Some(v) = get("MONOSHIP_REMOTE_PRIVATE_KEY") {
        config.remote.private_key = Some(Secret::new(v));
    }
    if let Some(v) = get("MONOSHIP_NETWORK") {
        config.remote.network = Some(v);
    }

    if let Some(v) = get("GITHUB_API_URL") {
        config.github.api_url = v;
    }
    if let Some(v) = get("MONOSHIP_GITHUB_TOKEN").or_else(|| get("GITHUB_TOKEN")) {
        config.github.token = Some(Secret::new(v));
    }
    if let Some(v) = get("GITHUB_REPOSITORY") {
        config.github.repository = Some(v);
    }
    if let Some(v) = get("GITHUB_EVENT_PATH") {
        config.github.event_path = Some(PathBuf::from(v));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = MonoshipConfig::new();
        config.registry.host = Some("file.example".to_string());

        apply_env_overrides(
            &mut config,
            lookup(&[
                ("MONOSHIP_REGISTRY", "ghcr.io"),
                ("MONOSHIP_REMOTE_PORT", "2200"),
                ("MONOSHIP_REMOTE_PASSWORD", "hunter2"),
                ("GITHUB_SHA", "abcdef0123456"),
            ]),
        )
        .unwrap();

        assert_eq!(config.registry.host.as_deref(), Some("ghcr.io"));
        assert_eq!(config.remote.port, 2200);
        assert_eq!(
            config.remote.password.as_ref().map(Secret::expose),
            Some("hunter2")
        );
        assert_eq!(config.commit_sha.as_deref(), Some("abcdef0123456"));
    }

    #[test]
    fn explicit_commit_wins_over_github_sha() {
        let mut config = MonoshipConfig::new();
        apply_env_overrides(
            &mut config,
            lookup(&[("MONOSHIP_COMMIT_SHA", "1111111"), ("GITHUB_SHA", "2222222")]),
        )
        .unwrap();
        assert_eq!(config.commit_sha.as_deref(), Some("1111111"));
    }

    #[test]
    fn empty_values_are_ignored() {
        let mut config = MonoshipConfig::new();
        config.remote.host = Some("kept".to_string());
        apply_env_overrides(&mut config, lookup(&[("MONOSHIP_REMOTE_HOST", "  ")])).unwrap();
        assert_eq!(config.remote.host.as_deref(), Some("kept"));
    }

    #[test]
    fn invalid_port_is_an_error() {
        let mut config = MonoshipConfig::new();
        let overrides = lookup(&[("MONOSHIP_REMOTE_PORT", "ssh")]);
        let err = apply_env_overrides(&mut config, overrides).unwrap_err();
        assert!(err.to_string().contains("MONOSHIP_REMOTE_PORT"));
    }

    #[test]
    fn secrets_are_redacted_in_debug_output() {
        let mut config = MonoshipConfig::new();
        apply_env_overrides(&mut config, lookup(&[("MONOSHIP_REGISTRY_PASSWORD", "s3cr3t")]))
            .unwrap();
        assert!(!format!("{:?}", config).contains("s3cr3t"));
    }
}
