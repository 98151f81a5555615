//! Image builder contract.

use std::future::Future;
use std::path::PathBuf;

use super::ImageRef;

/// One package's build invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    /// Package directory key
    pub dir: String,
    /// Path to the package's build definition
    pub build_file: PathBuf,
    /// Build context directory
    pub context: PathBuf,
    pub image: ImageRef,
}

/// Builds and pushes container images.
///
/// Builds and pushes for different packages run concurrently, so
/// implementations must be shareable across tasks.
pub trait ImageBuilder: Send + Sync + 'static {
    fn build(&self, request: &BuildRequest) -> impl Future<Output = anyhow::Result<()>> + Send;

    fn push(&self, image: &ImageRef) -> impl Future<Output = anyhow::Result<()>> + Send;
}
