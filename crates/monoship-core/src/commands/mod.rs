//! High-level commands for monoship operations.
//!
//! This module provides the public API the CLI calls into. Each command owns
//! a [`RunContext`] and hides the async runtime from its caller.

pub mod context;
pub mod graph;
pub mod plan;
pub mod run;

pub use context::{ChangeSource, RunContext};
pub use graph::{GraphCommand, GraphEntry, GraphReport};
pub use plan::PlanCommand;
pub use run::RunCommand;
