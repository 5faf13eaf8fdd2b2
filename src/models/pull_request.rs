use std::fmt;

use serde::{Deserialize, Serialize};

/// `owner/name` of a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    pub owner: String,
    pub name: String,
}

impl RepoSlug {
    /// Parse the origin remote URL of a GitHub checkout.
    ///
    /// Accepts `https://github.com/o/r(.git)`, `ssh://git@github.com/o/r.git`
    /// and scp-style `git@github.com:o/r.git`.
    pub fn from_remote_url(url: &str) -> Option<Self> {
        let url = url.trim();
        let path = if let Some((_, rest)) = url.split_once("://") {
            // drop the host, keep the path
            rest.split_once('/')?.1
        } else {
            url.split_once(':')?.1
        };

        let path = path.trim_end_matches('/');
        let path = path.strip_suffix(".git").unwrap_or(path);
        let mut segments = path.rsplit('/');
        let name = segments.next()?;
        let owner = segments.next()?;

        if owner.is_empty() || name.is_empty() {
            return None;
        }

        Some(Self {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryInfo {
    pub default_branch: String,
}

/// Payload of `POST /repos/{owner}/{repo}/pulls`.
#[derive(Debug, Clone, Serialize)]
pub struct NewPullRequest {
    pub title: String,
    pub body: String,
    pub head: String,
    pub base: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    #[serde(default)]
    pub html_url: Option<String>,
}

/// Generated text, before anything is sent to GitHub.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullRequestDraft {
    pub title: Option<String>,
    pub body: Option<String>,
}
