use tokio::process::Command;

use crate::error::{Error, Result};
use crate::models::RepoSlug;

/// Thin wrapper over the `git` binary for the checkout we run in.
#[derive(Debug, Clone, Default)]
pub struct LocalRepo;

impl LocalRepo {
    /// The repository containing the current directory.
    pub fn current() -> Self {
        Self
    }

    pub async fn current_branch(&self) -> Result<String> {
        self.run(&["rev-parse", "--abbrev-ref", "HEAD"])
            .await
            .map(|out| out.trim().to_string())
    }

    /// Diff of the working tree against `origin/<base>`.
    pub async fn diff_against(&self, base: &str) -> Result<String> {
        let target = format!("origin/{}", base);
        tracing::debug!("Running git diff {}", target);
        self.run(&["diff", &target]).await
    }

    pub async fn origin_slug(&self) -> Result<RepoSlug> {
        let url = self.run(&["remote", "get-url", "origin"]).await?;
        RepoSlug::from_remote_url(&url).ok_or_else(|| {
            Error::Git(format!("origin is not a GitHub remote: {}", url.trim()))
        })
    }

    /// Default branch as recorded by the last fetch of `origin`.
    pub async fn origin_head(&self) -> Result<String> {
        let head = self
            .run(&["symbolic-ref", "--short", "refs/remotes/origin/HEAD"])
            .await?;
        let head = head.trim();
        Ok(head.strip_prefix("origin/").unwrap_or(head).to_string())
    }

    async fn run(&self, args: &[&str]) -> Result<String> {
        let output = Command::new("git").args(args).output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Git(format!(
                "git {} failed ({}): {}",
                args.join(" "),
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
