//! Loading manifests from package directories.

use std::path::PathBuf;

use super::{MANIFEST_FILE, ManifestError, PackageManifest, parse_manifest_str};

/// Loads one package's manifest by directory key.
pub trait ManifestReader {
    fn read(&self, dir: &str) -> Result<PackageManifest, ManifestError>;
}

/// Reads `<packages_root>/<dir>/<file_name>` from disk.
#[derive(Debug, Clone)]
pub struct FsManifestReader {
    packages_root: PathBuf,
    file_name: String,
}

impl FsManifestReader {
    pub fn new(packages_root: impl Into<PathBuf>) -> Self {
        Self {
            packages_root: packages_root.into(),
            file_name: MANIFEST_FILE.to_string(),
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    pub fn manifest_path(&self, dir: &str) -> PathBuf {
        self.packages_root.join(dir).join(&self.file_name)
    }
}

impl ManifestReader for FsManifestReader {
    fn read(&self, dir: &str) -> Result<PackageManifest, ManifestError> {
        let path = self.manifest_path(dir);
        let content = std::fs::read_to_string(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ManifestError::NotFound { path: path.clone() }
            } else {
                ManifestError::Io {
                    path: path.clone(),
                    source,
                }
            }
        })?;
        parse_manifest_str(&content, &path)
    }
}
