//! Container images: naming, buildability and the build/push stages.

mod builder;
mod docker;
mod stage;

pub use builder::{BuildRequest, ImageBuilder};
pub use docker::DockerCli;
pub use stage::{build_all, push_all};

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use serde::Serialize;

/// Default build definition file name inside a package directory.
pub const BUILD_FILE: &str = "Dockerfile";

/// Number of commit hash characters used as the image tag.
pub const TAG_LENGTH: usize = 7;

/// Fully-qualified tagged image identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ImageRef {
    repository: String,
    tag: String,
}

impl ImageRef {
    pub fn new(repository: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            tag: tag.into(),
        }
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.repository, self.tag)
    }
}

/// Derives image references for one run: `<registry>[/<prefix>]/<dir>:<sha7>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageNamer {
    base: String,
    tag: String,
}

impl ImageNamer {
    pub fn new(registry: &str, prefix: Option<&str>, commit_sha: &str) -> Self {
        let mut base = registry.trim_end_matches('/').to_string();
        if let Some(prefix) = prefix.map(|p| p.trim_matches('/')).filter(|p| !p.is_empty()) {
            base.push('/');
            base.push_str(prefix);
        }
        Self {
            base,
            tag: short_sha(commit_sha).to_string(),
        }
    }

    pub fn image_for(&self, dir: &str) -> ImageRef {
        ImageRef::new(format!("{}/{}", self.base, dir), self.tag.clone())
    }
}

/// First seven characters of a commit hash (the whole string if shorter).
pub fn short_sha(commit_sha: &str) -> &str {
    let sha = commit_sha.trim();
    match sha.char_indices().nth(TAG_LENGTH) {
        Some((idx, _)) => &sha[..idx],
        None => sha,
    }
}

/// Keep only the directories that contain a build definition.
pub fn filter_buildable(
    impacted: &BTreeSet<String>,
    packages_root: &Path,
    build_file: &str,
) -> BTreeSet<String> {
    impacted
        .iter()
        .filter(|dir| packages_root.join(dir).join(build_file).is_file())
        .cloned()
        .collect()
}
