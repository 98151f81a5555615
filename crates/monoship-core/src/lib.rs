//! Monoship Core Library
//!
//! Change propagation and deployment for JavaScript-style monorepos: build a
//! dependency graph from package manifests, expand a pull request's changed
//! packages to their direct dependents, build and push one container image
//! per package and roll the images out to a remote Docker Swarm.

pub mod commands;
pub mod config;
pub mod deploy;
pub mod git;
pub mod github;
pub mod graph;
pub mod image;
pub mod impact;
pub mod manifest;
pub mod orchestration;
pub mod process;
pub mod registry;
pub mod remote;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{ConfigStore, MonoshipConfig};

    // Graph
    pub use crate::graph::{Graph, GraphBuilder, GraphError, Package, WorkspaceRef};
    pub use crate::manifest::{DeployOptions, ManifestReader, PackageManifest};

    // Images and registries
    pub use crate::image::{BuildRequest, ImageBuilder, ImageNamer, ImageRef};
    pub use crate::registry::{Authenticator, Credentials, RegistryBackend, TokenExchange};

    // Deployment
    pub use crate::deploy::{DeployItem, DeployOrchestrator, DeployOutcome, DeploySettings};
    pub use crate::remote::{RemoteCommand, RemoteExecutor, RemoteSession, RemoteTarget};

    // Orchestration
    pub use crate::orchestration::{
        Pipeline, PipelineError, PipelineSettings, PlanReport, RunReport, StageFailure,
        WorkspaceLayout,
    };
}
