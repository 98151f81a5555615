//! Graph construction from the packages root.

use std::path::PathBuf;

use crate::manifest::{FsManifestReader, ManifestReader};

use super::{Graph, GraphError, Package, PrefixMatcher, WorkspaceRef};

/// Scans every immediate subdirectory of the packages root and links
/// packages through their workspace dependencies.
pub struct GraphBuilder<R = FsManifestReader> {
    packages_root: PathBuf,
    reader: R,
    matcher: Box<dyn WorkspaceRef>,
}

impl GraphBuilder<FsManifestReader> {
    /// Builder reading `package.json` files under `packages_root`.
    pub fn new(packages_root: impl Into<PathBuf>) -> Self {
        let packages_root = packages_root.into();
        let reader = FsManifestReader::new(packages_root.clone());
        Self::with_reader(packages_root, reader)
    }
}

impl<R: ManifestReader> GraphBuilder<R> {
    pub fn with_reader(packages_root: impl Into<PathBuf>, reader: R) -> Self {
        Self {
            packages_root: packages_root.into(),
            reader,
            matcher: Box::new(PrefixMatcher::default()),
        }
    }

    /// Replace the workspace dependency predicate.
    pub fn with_matcher(mut self, matcher: impl WorkspaceRef + 'static) -> Self {
        self.matcher = Box::new(matcher);
        self
    }

    #[tracing::instrument(skip(self), fields(root = %self.packages_root.display()))]
    pub fn build(&self) -> Result<Graph, GraphError> {
        let dirs = self.package_dirs()?;
        let mut graph = Graph::default();
        let mut declared = Vec::with_capacity(dirs.len());

        for dir in dirs {
            let manifest = match self.reader.read(&dir) {
                Ok(manifest) => manifest,
                Err(source) if source.is_unreadable() => {
                    return Err(GraphError::ManifestUnreadable { dir, source });
                }
                Err(err) => {
                    tracing::warn!(
                        package = %dir,
                        error = %err,
                        "Excluding package with malformed manifest"
                    );
                    continue;
                }
            };

            let workspace_deps: Vec<String> = manifest
                .dependencies
                .iter()
                .filter(|(_, version)| self.matcher.is_workspace_ref(version))
                .map(|(name, _)| name.clone())
                .collect();

            graph.insert_package(Package {
                dir,
                name: manifest.name.clone(),
                deploy: manifest.deploy,
            })?;
            declared.push((manifest.name, workspace_deps));
        }

        for (child, parents) in &declared {
            for parent in parents {
                graph.insert_edge(child, parent);
            }
        }

        tracing::debug!(packages = graph.len(), "Built dependency graph");
        Ok(graph)
    }

    // Sorted so the arena order is independent of readdir order.
    fn package_dirs(&self) -> Result<Vec<String>, GraphError> {
        let unreadable = |source| GraphError::PackagesRootUnreadable {
            path: self.packages_root.clone(),
            source,
        };

        let mut dirs = Vec::new();
        for entry in std::fs::read_dir(&self.packages_root).map_err(unreadable)? {
            let entry = entry.map_err(unreadable)?;
            if !entry.file_type().map_err(unreadable)?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                dirs.push(name.to_string());
            } else {
                tracing::warn!(
                    path = %entry.path().display(),
                    "Skipping non UTF-8 package directory"
                );
            }
        }
        dirs.sort();
        Ok(dirs)
    }
}
