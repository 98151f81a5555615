//! Pull-request integration: where changed files come from and where
//! failures are reported.

mod client;

pub use client::{GitHubClient, PullRequestFile, failure_comment};

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::impact::is_dir_key;

/// The parts of a `pull_request` webhook payload the pipeline needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestEvent {
    pub number: u64,
    /// `owner/name` of the base repository
    pub repository: String,
    pub head_sha: Option<String>,
}

#[derive(Deserialize)]
struct RawEvent {
    number: Option<u64>,
    pull_request: Option<RawPullRequest>,
    repository: Option<RawRepo>,
}

#[derive(Deserialize)]
struct RawPullRequest {
    number: Option<u64>,
    head: Option<RawRef>,
    base: Option<RawRef>,
}

#[derive(Deserialize)]
struct RawRef {
    sha: Option<String>,
    repo: Option<RawRepo>,
}

#[derive(Deserialize)]
struct RawRepo {
    full_name: String,
}

impl PullRequestEvent {
    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read event payload: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse event payload: {}", path.display()))
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let raw: RawEvent = serde_json::from_str(content)?;
        let pull_request = raw
            .pull_request
            .ok_or_else(|| anyhow::anyhow!("Event is not a pull_request event"))?;

        let number = pull_request
            .number
            .or(raw.number)
            .ok_or_else(|| anyhow::anyhow!("Event has no pull request number"))?;

        let (head_sha, base_repo) = (
            pull_request.head.and_then(|head| head.sha),
            pull_request.base.and_then(|base| base.repo),
        );
        let repository = base_repo
            .or(raw.repository)
            .map(|repo| repo.full_name)
            .ok_or_else(|| anyhow::anyhow!("Event has no repository"))?;

        Ok(Self {
            number,
            repository,
            head_sha,
        })
    }
}

/// Directory keys of packages touched by `paths`.
///
/// A path counts when it lies inside a package directory, i.e. below
/// `<packages_root>/<dir>/`. Files directly in the packages root are ignored.
pub fn changed_dirs<I, S>(paths: I, packages_root: &Path) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let root = packages_root.to_string_lossy().replace('\\', "/");
    let root = root.trim_start_matches("./").trim_end_matches('/');
    let prefix = format!("{}/", root);

    paths
        .into_iter()
        .filter_map(|path| {
            let path = path.as_ref().trim_start_matches("./");
            let rest = path.strip_prefix(&prefix)?;
            let (dir, inner) = rest.split_once('/')?;
            (is_dir_key(dir) && !inner.is_empty()).then(|| dir.to_string())
        })
        .collect()
}
