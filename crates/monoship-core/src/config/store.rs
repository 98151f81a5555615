//! Config store for loading monoship.toml.

use std::path::{Path, PathBuf};

use super::{CONFIG_FILE, MonoshipConfig, apply_env_overrides, parser};

#[derive(Debug, Clone)]
pub struct ConfigStore {
    config_path: PathBuf,
}

impl ConfigStore {
    /// Store for `<repo_root>/monoship.toml`.
    pub fn from_repo_root(repo_root: &Path) -> Self {
        Self::from_path(repo_root.join(CONFIG_FILE))
    }

    pub fn from_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load the file only; a missing file yields defaults.
    pub fn load(&self) -> anyhow::Result<MonoshipConfig> {
        if !self.config_path.exists() {
            return Ok(MonoshipConfig::new());
        }
        parser::parse_monoship_toml(&self.config_path)
    }

    /// Load the file and overlay the process environment.
    pub fn load_with_env(&self) -> anyhow::Result<MonoshipConfig> {
        self.load_with(|key| std::env::var(key).ok())
    }

    /// Load the file and overlay values from `lookup`.
    pub fn load_with<F>(&self, lookup: F) -> anyhow::Result<MonoshipConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = self.load()?;
        apply_env_overrides(&mut config, lookup)?;
        parser::validate_config(&config)?;
        Ok(config)
    }
}
