//! Dependency graph listing.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::orchestration::build_graph;

use super::context::RunContext;

#[derive(Debug, Clone, Serialize)]
pub struct GraphEntry {
    pub dir: String,
    pub name: String,
    pub parents: BTreeSet<String>,
    pub children: BTreeSet<String>,
    pub buildable: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphReport {
    pub packages: Vec<GraphEntry>,
}

pub struct GraphCommand {
    ctx: RunContext,
}

impl GraphCommand {
    pub fn new(ctx: RunContext) -> Self {
        Self { ctx }
    }

    pub fn with_defaults() -> anyhow::Result<Self> {
        Ok(Self::new(RunContext::with_defaults()?))
    }

    pub fn execute(&self) -> anyhow::Result<GraphReport> {
        let layout = self.ctx.layout();
        let graph = build_graph(&layout)?;

        let packages = graph
            .packages()
            .iter()
            .map(|package| GraphEntry {
                dir: package.dir.clone(),
                name: package.name.clone(),
                parents: graph.parents(&package.name).clone(),
                children: graph.children(&package.name).clone(),
                buildable: layout.build_file_for(&package.dir).is_file(),
            })
            .collect();

        Ok(GraphReport { packages })
    }
}
