//! Detection of workspace-local dependency versions.

/// Decides whether a declared version string points at another package in
/// the same monorepo.
pub trait WorkspaceRef: Send + Sync {
    fn is_workspace_ref(&self, version: &str) -> bool;
}

impl<F> WorkspaceRef for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_workspace_ref(&self, version: &str) -> bool {
        self(version)
    }
}

/// Matches versions starting with a fixed marker, e.g. `workspace:*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixMatcher {
    prefix: String,
}

impl PrefixMatcher {
    pub const DEFAULT_MARKER: &'static str = "workspace:";

    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for PrefixMatcher {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MARKER)
    }
}

impl WorkspaceRef for PrefixMatcher {
    fn is_workspace_ref(&self, version: &str) -> bool {
        version.trim_start().starts_with(&self.prefix)
    }
}
