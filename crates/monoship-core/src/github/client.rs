//! Minimal GitHub REST client for pull requests.

use anyhow::Context;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::config::Secret;

use super::PullRequestEvent;

const PAGE_SIZE: usize = 100;
// GitHub stops listing pull request files after 3000 entries.
const MAX_PAGES: usize = 30;

/// One entry of `GET /repos/{repo}/pulls/{number}/files`.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestFile {
    pub filename: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub previous_filename: Option<String>,
}

impl PullRequestFile {
    /// Current path plus the old one for renames.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.filename.as_str()).chain(self.previous_filename.as_deref())
    }
}

pub struct GitHubClient {
    http: reqwest::Client,
    api: Url,
    token: Option<Secret>,
}

impl GitHubClient {
    pub fn new(api_url: &str, token: Option<Secret>) -> anyhow::Result<Self> {
        let api = Url::parse(api_url)
            .with_context(|| format!("Invalid GitHub API URL: {}", api_url))?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("monoship/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { http, api, token })
    }

    fn endpoint(&self, path: &str) -> anyhow::Result<Url> {
        let base = self.api.as_str().trim_end_matches('/');
        Url::parse(&format!("{}/{}", base, path.trim_start_matches('/')))
            .with_context(|| format!("Invalid GitHub endpoint: {}", path))
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let builder = self
            .http
            .request(method, url)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");
        match &self.token {
            Some(token) => builder.bearer_auth(token.expose()),
            None => builder,
        }
    }

    /// Every file touched by a pull request.
    pub async fn pull_request_files(
        &self,
        repository: &str,
        number: u64,
    ) -> anyhow::Result<Vec<PullRequestFile>> {
        let mut files = Vec::new();

        for page in 1..=MAX_PAGES {
            let mut url = self.endpoint(&format!("repos/{}/pulls/{}/files", repository, number))?;
            url.query_pairs_mut()
                .append_pair("per_page", &PAGE_SIZE.to_string())
                .append_pair("page", &page.to_string());

            let response = self
                .request(reqwest::Method::GET, url.clone())
                .send()
                .await
                .with_context(|| format!("Failed to fetch {}", url))?;
            if !response.status().is_success() {
                anyhow::bail!(
                    "Failed to list pull request files: HTTP {} from {}",
                    response.status(),
                    url
                );
            }
            let batch: Vec<PullRequestFile> = response
                .json()
                .await
                .context("Failed to parse pull request files response")?;

            let last = batch.len() < PAGE_SIZE;
            files.extend(batch);
            if last {
                break;
            }
        }

        tracing::debug!(files = files.len(), number, "Fetched pull request files");
        Ok(files)
    }

    pub async fn comment(&self, repository: &str, number: u64, body: &str) -> anyhow::Result<()> {
        let url = self.endpoint(&format!("repos/{}/issues/{}/comments", repository, number))?;
        let response = self
            .request(reqwest::Method::POST, url.clone())
            .json(&json!({ "body": body }))
            .send()
            .await
            .with_context(|| format!("Failed to post comment to {}", url))?;
        if !response.status().is_success() {
            anyhow::bail!("Failed to post comment: HTTP {} from {}", response.status(), url);
        }
        Ok(())
    }

    pub async fn close(&self, repository: &str, number: u64) -> anyhow::Result<()> {
        let url = self.endpoint(&format!("repos/{}/pulls/{}", repository, number))?;
        let response = self
            .request(reqwest::Method::PATCH, url.clone())
            .json(&json!({ "state": "closed" }))
            .send()
            .await
            .with_context(|| format!("Failed to close pull request via {}", url))?;
        if !response.status().is_success() {
            anyhow::bail!(
                "Failed to close pull request: HTTP {} from {}",
                response.status(),
                url
            );
        }
        Ok(())
    }

    /// Comment the failure summary on the pull request and optionally close it.
    pub async fn report_failure(
        &self,
        event: &PullRequestEvent,
        summary: &str,
        close: bool,
    ) -> anyhow::Result<()> {
        self.comment(&event.repository, event.number, &failure_comment(summary))
            .await?;
        if close {
            self.close(&event.repository, event.number).await?;
        }
        Ok(())
    }
}

/// Markdown body for a failure comment.
pub fn failure_comment(summary: &str) -> String {
    format!(
        "### :x: monoship pipeline failed\n\n```\n{}\n```\n",
        summary.trim().replace("```", "'''")
    )
}
