//! In-memory package dependency graph.
//!
//! The graph is built once per run by scanning the packages root and is
//! immutable afterwards. It keeps four lookup tables:
//! - directory key -> declared name
//! - declared name -> directory key
//! - name -> direct workspace dependencies ("parents")
//! - name -> direct dependents ("children")

mod builder;
mod workspace_ref;

pub use builder::GraphBuilder;
pub use workspace_ref::{PrefixMatcher, WorkspaceRef};

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use serde::Serialize;

use crate::manifest::{DeployOptions, ManifestError};

/// One package record in the graph arena.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Package {
    /// Directory key under the packages root
    pub dir: String,
    /// Declared name from the manifest
    pub name: String,
    /// Declared deploy options
    pub deploy: DeployOptions,
}

/// Fatal errors while building the graph.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("failed to read packages root {}: {source}", path.display())]
    PackagesRootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read manifest for package '{dir}': {source}")]
    ManifestUnreadable {
        dir: String,
        #[source]
        source: ManifestError,
    },

    #[error("package name '{name}' is declared by both '{first}' and '{second}'")]
    DuplicateName {
        name: String,
        first: String,
        second: String,
    },
}

static EMPTY: BTreeSet<String> = BTreeSet::new();

#[derive(Debug, Clone, Default)]
pub struct Graph {
    packages: Vec<Package>,
    by_dir: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
    parents: HashMap<String, BTreeSet<String>>,
    children: HashMap<String, BTreeSet<String>>,
}

impl Graph {
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Packages in directory order.
    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    pub fn package_by_dir(&self, dir: &str) -> Option<&Package> {
        self.by_dir.get(dir).map(|&idx| &self.packages[idx])
    }

    pub fn package_by_name(&self, name: &str) -> Option<&Package> {
        self.by_name.get(name).map(|&idx| &self.packages[idx])
    }

    pub fn name_for_dir(&self, dir: &str) -> Option<&str> {
        self.package_by_dir(dir).map(|p| p.name.as_str())
    }

    pub fn dir_for_name(&self, name: &str) -> Option<&str> {
        self.package_by_name(name).map(|p| p.dir.as_str())
    }

    /// Direct workspace dependencies of `name`.
    ///
    /// May contain names that have no package in the graph.
    pub fn parents(&self, name: &str) -> &BTreeSet<String> {
        self.parents.get(name).unwrap_or(&EMPTY)
    }

    /// Direct dependents of `name`.
    pub fn children(&self, name: &str) -> &BTreeSet<String> {
        self.children.get(name).unwrap_or(&EMPTY)
    }

    fn insert_package(&mut self, package: Package) -> Result<(), GraphError> {
        if let Some(&existing) = self.by_name.get(&package.name) {
            return Err(GraphError::DuplicateName {
                name: package.name,
                first: self.packages[existing].dir.clone(),
                second: package.dir,
            });
        }
        let idx = self.packages.len();
        self.by_dir.insert(package.dir.clone(), idx);
        self.by_name.insert(package.name.clone(), idx);
        self.packages.push(package);
        Ok(())
    }

    fn insert_edge(&mut self, child: &str, parent: &str) {
        self.parents
            .entry(child.to_string())
            .or_default()
            .insert(parent.to_string());
        self.children
            .entry(parent.to_string())
            .or_default()
            .insert(child.to_string());
    }
}
