//! Manifest schema and lenient normalization.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ManifestError;

/// Key inside the deploy options that overrides the service name.
const SERVICE_NAME_KEY: &str = "name";

/// Normalized view of one package's manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageManifest {
    /// Declared package name
    pub name: String,

    /// Declared dependencies (name -> version string)
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,

    /// Orchestrator options used when the service is created
    #[serde(default)]
    pub deploy: DeployOptions,
}

/// Deploy options declared under the manifest's `"deploy"` object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeployOptions(BTreeMap<String, String>);

impl DeployOptions {
    pub fn new(options: BTreeMap<String, String>) -> Self {
        Self(options)
    }

    /// Service name for a package, defaulting to its directory key.
    pub fn service_name<'a>(&'a self, dir: &'a str) -> &'a str {
        self.0
            .get(SERVICE_NAME_KEY)
            .map(String::as_str)
            .filter(|name| !name.is_empty())
            .unwrap_or(dir)
    }

    /// Options passed through as flags on service creation (everything but the name).
    pub fn flags(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .filter(|(key, _)| key.as_str() != SERVICE_NAME_KEY)
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

#[derive(Deserialize)]
struct RawManifest {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    dependencies: Value,
    #[serde(default)]
    deploy: Value,
}

/// Parse manifest content. `path` is only used for error messages.
pub fn parse_manifest_str(content: &str, path: &Path) -> Result<PackageManifest, ManifestError> {
    let raw: RawManifest =
        serde_json::from_str(content).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    let name = raw
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ManifestError::Invalid {
            path: path.to_path_buf(),
            reason: "missing \"name\"".to_string(),
        })?;

    Ok(PackageManifest {
        name,
        dependencies: string_map(&raw.dependencies),
        deploy: DeployOptions(option_map(&raw.deploy)),
    })
}

// Anything other than an object means "no dependencies".
fn string_map(value: &Value) -> BTreeMap<String, String> {
    let Value::Object(map) = value else {
        return BTreeMap::new();
    };
    map.iter()
        .filter_map(|(key, value)| value.as_str().map(|v| (key.clone(), v.to_string())))
        .collect()
}

fn option_map(value: &Value) -> BTreeMap<String, String> {
    let Value::Object(map) = value else {
        return BTreeMap::new();
    };
    map.iter()
        .filter_map(|(key, value)| {
            let rendered = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some((key.clone(), rendered))
        })
        .collect()
}
