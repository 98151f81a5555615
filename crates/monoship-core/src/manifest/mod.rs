//! Package manifests.
//!
//! Every package directory under the packages root carries a `package.json`
//! declaring its name, its dependencies and optional deploy options.

mod reader;
mod schema;

pub use reader::{FsManifestReader, ManifestReader};
pub use schema::{DeployOptions, PackageManifest, parse_manifest_str};

use std::path::PathBuf;

/// Default manifest file name inside a package directory.
pub const MANIFEST_FILE: &str = "package.json";

/// Errors raised while loading a single package manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("manifest not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read manifest {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid manifest {}: {reason}", path.display())]
    Invalid { path: PathBuf, reason: String },
}

impl ManifestError {
    /// Whether the file could not be read at all (as opposed to read but malformed).
    pub fn is_unreadable(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Io { .. })
    }
}
