//! Dry run: which packages a change set would rebuild.

use crate::orchestration::{self, PlanReport};

use super::context::{ChangeSource, RunContext, runtime};

pub struct PlanCommand {
    ctx: RunContext,
}

impl PlanCommand {
    pub fn new(ctx: RunContext) -> Self {
        Self { ctx }
    }

    pub fn with_defaults() -> anyhow::Result<Self> {
        Ok(Self::new(RunContext::with_defaults()?))
    }

    pub fn execute(&self, source: &ChangeSource) -> anyhow::Result<PlanReport> {
        let changed = match source {
            ChangeSource::Dirs(dirs) => dirs.clone(),
            _ => {
                let event = self.ctx.pull_request_event(source)?;
                runtime()?.block_on(self.ctx.changed_dirs(source, event.as_ref()))?
            }
        };
        let (_, report) = orchestration::plan(&self.ctx.layout(), &changed)?;
        Ok(report)
    }
}
