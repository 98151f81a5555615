//! TOML parser with helpful error messages

use std::path::{Component, Path};

use anyhow::{Context, Result};

use super::schema::MonoshipConfig;

/// Parse monoship.toml with detailed error messages
pub fn parse_monoship_toml(path: &Path) -> Result<MonoshipConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_monoship_toml_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse monoship.toml content from string
pub fn parse_monoship_toml_str(content: &str) -> Result<MonoshipConfig> {
    let config: MonoshipConfig =
        toml::from_str(content).map_err(|e| enhance_toml_error(e, content))?;

    validate_config(&config)?;

    Ok(config)
}

/// Enhance TOML parsing errors with the offending lines
fn enhance_toml_error(error: toml::de::Error, content: &str) -> anyhow::Error {
    let Some(span) = error.span() else {
        return anyhow::anyhow!("TOML parsing error: {}", error.message());
    };

    let line_num = content[..span.start.min(content.len())]
        .matches('\n')
        .count()
        + 1;
    anyhow::anyhow!(
        "TOML parsing error at line {}:\n{}\n\nError: {}",
        line_num,
        get_line_context(content, line_num),
        error.message()
    )
}

/// Get context lines around an error
fn get_line_context(content: &str, line_num: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = line_num.saturating_sub(2);
    let end = (line_num + 1).min(lines.len());

    (start..end)
        .map(|i| {
            let marker = if i + 1 == line_num { ">" } else { " " };
            format!("{} {:4} | {}", marker, i + 1, lines[i])
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Validate configuration values that serde cannot express
pub fn validate_config(config: &MonoshipConfig) -> Result<()> {
    if config.remote.port == 0 {
        anyhow::bail!("remote.port must be between 1 and 65535");
    }

    ensure_repo_relative("workspace.packages_root", &config.workspace.packages_root)?;
    ensure_repo_relative("workspace.build_context", &config.workspace.build_context)?;

    if config.workspace.manifest_file.trim().is_empty() {
        anyhow::bail!("workspace.manifest_file cannot be empty");
    }
    if config.workspace.build_file.trim().is_empty() {
        anyhow::bail!("workspace.build_file cannot be empty");
    }

    if let Some(host) = &config.registry.host {
        if host.contains("://") {
            anyhow::bail!("registry.host must be a bare host name, got '{}'", host);
        }
    }

    url::Url::parse(&config.github.api_url)
        .with_context(|| format!("github.api_url is not a valid URL: {}", config.github.api_url))?;

    Ok(())
}

fn ensure_repo_relative(field: &str, path: &Path) -> Result<()> {
    if path.is_absolute() {
        anyhow::bail!("{} must be relative to the repository root", field);
    }
    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        anyhow::bail!("{} cannot leave the repository root", field);
    }
    Ok(())
}
