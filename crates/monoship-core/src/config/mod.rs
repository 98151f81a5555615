//! Pipeline configuration.
//!
//! Settings come from an optional `monoship.toml` at the repository root,
//! overlaid with `MONOSHIP_*` and CI-provided `GITHUB_*` environment
//! variables.

pub mod env;
pub mod parser;
pub mod schema;
pub mod store;

pub use env::apply_env_overrides;
pub use parser::{parse_monoship_toml, parse_monoship_toml_str};
pub use schema::{
    GitHubConfig, MonoshipConfig, RegistryConfig, RemoteConfig, Secret, TimeoutConfig,
    WorkspaceConfig,
};
pub use store::ConfigStore;

/// Default config file name at the repository root.
pub const CONFIG_FILE: &str = "monoship.toml";
