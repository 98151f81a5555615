//! Run-level failures.

use crate::deploy::DeployError;
use crate::graph::GraphError;
use crate::registry::LoginError;

use super::stage::StageFailure;

/// Why a pipeline run failed. `Display` is the summary posted to the pull request.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Dependency graph could not be built: {0}")]
    Graph(#[from] GraphError),

    #[error("{0}")]
    Stage(#[from] StageFailure),

    #[error("Registry login failed: {0}")]
    Login(#[from] LoginError),

    #[error("Deploy aborted: {0}")]
    Deploy(#[from] DeployError),
}
