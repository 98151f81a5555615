//! The full CI run: resolve changes, build, push, deploy, report.

use crate::github::PullRequestEvent;
use crate::orchestration::RunReport;

use super::context::{ChangeSource, RunContext, runtime};

pub struct RunCommand {
    ctx: RunContext,
}

impl RunCommand {
    pub fn new(ctx: RunContext) -> Self {
        Self { ctx }
    }

    pub fn with_defaults() -> anyhow::Result<Self> {
        Ok(Self::new(RunContext::with_defaults()?))
    }

    pub fn execute(&self, source: &ChangeSource) -> anyhow::Result<RunReport> {
        runtime()?.block_on(self.execute_async(source))
    }

    /// Run the pipeline; on failure the summary is posted to the pull request
    /// before the error is returned.
    pub async fn execute_async(&self, source: &ChangeSource) -> anyhow::Result<RunReport> {
        let event = self.ctx.pull_request_event(source)?;

        match self.run_pipeline(source, event.as_ref()).await {
            Ok(report) => {
                let rebuilt: Vec<_> = report.rebuilt().collect();
                tracing::info!(rebuilt = ?rebuilt, "Pipeline succeeded");
                Ok(report)
            }
            Err(err) => {
                tracing::error!(error = %format!("{:#}", err), "Pipeline failed");
                if let Some(event) = &event {
                    self.report_failure(event, &err).await;
                }
                Err(err)
            }
        }
    }

    async fn run_pipeline(
        &self,
        source: &ChangeSource,
        event: Option<&PullRequestEvent>,
    ) -> anyhow::Result<RunReport> {
        let changed = self.ctx.changed_dirs(source, event).await?;
        let commit_sha = self.ctx.commit_sha(event)?;
        let pipeline = self.ctx.pipeline(&commit_sha)?;
        Ok(pipeline.run(&changed).await?)
    }

    async fn report_failure(&self, event: &PullRequestEvent, err: &anyhow::Error) {
        let github = &self.ctx.config().github;
        if github.token.is_none() {
            tracing::warn!("No GitHub token configured; not reporting failure to the pull request");
            return;
        }

        let summary = format!("{:#}", err);
        let result = match self.ctx.github() {
            Ok(client) => {
                client
                    .report_failure(event, &summary, github.close_on_failure)
                    .await
            }
            Err(err) => Err(err),
        };
        if let Err(err) = result {
            tracing::warn!(
                error = %format!("{:#}", err),
                pull_request = event.number,
                "Failed to report failure to pull request"
            );
        }
    }
}
