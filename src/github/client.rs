use reqwest::{header, Client};

use crate::error::{Error, Result};
use crate::models::{NewPullRequest, PullRequest, RepoSlug, RepositoryInfo};

pub struct GitHubClient {
    client: Client,
    base_url: String,
}

impl GitHubClient {
    pub fn new(token: &str) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", token))?,
        );
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            header::HeaderValue::from_static("2022-11-28"),
        );
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static(concat!("aipr/", env!("CARGO_PKG_VERSION"))),
        );

        let client = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            client,
            base_url: "https://api.github.com".to_string(),
        })
    }

    /// Point the client at another API root, e.g. GitHub Enterprise.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub async fn get_default_branch(&self, repo: &RepoSlug) -> Result<String> {
        let url = format!("{}/repos/{}/{}", self.base_url, repo.owner, repo.name);
        tracing::debug!("Fetching repository: {}", repo);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::GitHubApi(format!(
                "Failed to fetch repository {}: {} - {}",
                repo, status, body
            )));
        }

        let info: RepositoryInfo = response.json().await.map_err(|e| {
            Error::GitHubApi(format!("Failed to decode repository {}: {}", repo, e))
        })?;
        Ok(info.default_branch)
    }

    pub async fn create_pull_request(
        &self,
        repo: &RepoSlug,
        pull: &NewPullRequest,
    ) -> Result<PullRequest> {
        let url = format!("{}/repos/{}/{}/pulls", self.base_url, repo.owner, repo.name);
        tracing::info!("Creating pull request {} -> {} on {}", pull.head, pull.base, repo);

        let response = self.client.post(&url).json(pull).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::GitHubApi(format!(
                "Failed to create pull request on {}: {} - {}",
                repo, status, body
            )));
        }

        response.json().await.map_err(|e| {
            Error::GitHubApi(format!("Failed to decode pull request from {}: {}", repo, e))
        })
    }
}
