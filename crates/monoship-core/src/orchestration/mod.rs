//! End-to-end pipeline orchestration.
//!
//! changed dirs -> impact expansion -> filter -> build -> login -> push -> deploy

pub mod error;
pub mod pipeline;
pub mod stage;

pub use error::PipelineError;
pub use pipeline::{
    Pipeline, PipelineSettings, PlanReport, RunReport, WorkspaceLayout, build_graph, plan,
};
pub use stage::{ItemFailure, Stage, StageFailure, StageReport};
