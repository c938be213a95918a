use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use std::fmt;
use tracing::debug;

use crate::model::{RawRelease, RepoRef};

const GITHUB_API_BASE: &str = "https://api.github.com/";
const GITHUB_API_VERSION: &str = "2022-11-28";

#[derive(Clone)]
pub struct GithubClient {
    http: Client,
    base_url: Url,
    token: String,
}

impl fmt::Debug for GithubClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Read side of the bot: everything it needs from the release host.
#[async_trait]
pub trait ReleaseFeed: Send + Sync {
    async fn list_releases(&self, repo: &RepoRef) -> Result<Vec<RawRelease>>;
}

impl GithubClient {
    pub fn new(token: String) -> Self {
        let base_url = Url::parse(GITHUB_API_BASE).expect("valid default GitHub URL");
        Self::with_base_url(token, base_url)
    }

    pub fn with_base_url(token: String, base_url: Url) -> Self {
        let http = Client::builder()
            .user_agent("release-watchbot/0.1")
            .no_proxy()
            .build()
            .expect("reqwest client");
        Self {
            http,
            base_url,
            token,
        }
    }

    pub fn build_list_request(&self, repo: &RepoRef) -> Result<reqwest::Request> {
        let endpoint = self
            .base_url
            .join(&format!("repos/{}/{}/releases", repo.owner, repo.name))
            .context("invalid GitHub base URL")?;
        self.http
            .get(endpoint)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .build()
            .context("failed to build GitHub request")
    }
}

#[async_trait]
impl ReleaseFeed for GithubClient {
    async fn list_releases(&self, repo: &RepoRef) -> Result<Vec<RawRelease>> {
        let request = self.build_list_request(repo)?;
        debug!(url=%request.url(), "listing releases");
        let res = self
            .http
            .execute(request)
            .await
            .context("failed to reach GitHub")?;

        if res.status() == StatusCode::FORBIDDEN {
            let body = res.text().await.unwrap_or_default();
            return Err(anyhow!("received 403 from GitHub (rate limited?): {}", body));
        }
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(anyhow!("github error {}: {}", status, body));
        }

        res.json().await.context("invalid GitHub release list")
    }
}
