//! Git helpers for resolving the commit being shipped.

use std::path::Path;

use anyhow::Context;
use git2::Repository;

/// Commit hash `HEAD` points at in the repository containing `path`.
pub fn resolve_head_sha(path: &Path) -> anyhow::Result<String> {
    let repo = Repository::discover(path)
        .with_context(|| format!("No git repository found at {}", path.display()))?;
    let commit = repo
        .head()
        .context("Failed to resolve HEAD")?
        .peel_to_commit()
        .context("HEAD does not point at a commit")?;
    Ok(commit.id().to_string())
}
