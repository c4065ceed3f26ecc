use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use trailmark_config::DateWindow;

use super::models::{GitLabBranch, GitLabCommit, GitLabDiff, GitLabProject, GitLabUser};
use crate::connector::CommitSource;

const PER_PAGE: u32 = 100;

#[derive(Debug, Clone)]
pub struct GitLabClientConfig {
    pub base_url: String,
    pub private_token: String,
    pub max_retries: u32,
    pub timeout_secs: u64,
}

impl GitLabClientConfig {
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("GITLAB_BASE_URL").ok()?;
        let private_token = std::env::var("GITLAB_PRIVATE_TOKEN").ok()?;
        let max_retries = std::env::var("GITLAB_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3);
        let timeout_secs = std::env::var("GITLAB_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        Some(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            private_token,
            max_retries,
            timeout_secs,
        })
    }
}

#[derive(Clone)]
pub struct GitLabClient {
    client: Client,
    config: GitLabClientConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum GitLabClientError {
    #[error("HTTP {status}: {body}")]
    HttpError { status: StatusCode, body: String },

    #[error("request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },
}

impl GitLabClient {
    pub fn new(config: GitLabClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// For testing: create a client pointing at a specific base URL (e.g., wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.config.base_url = base_url.to_string();
        self
    }

    /// Confirm the token is accepted before any extraction starts.
    pub async fn verify_auth(&self) -> Result<GitLabUser, GitLabClientError> {
        let url = format!("{}/api/v4/user", self.config.base_url);
        let (user, _) = self.request_with_retry(&url).await?;
        Ok(user)
    }

    /// Follow `x-next-page` until exhausted. `url` must already carry a query string.
    async fn fetch_all_pages<T: DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<Vec<T>, GitLabClientError> {
        let mut page: u64 = 1;
        let mut all = Vec::new();

        loop {
            let page_url = format!("{url}&per_page={PER_PAGE}&page={page}");
            let (items, next_page): (Vec<T>, _) = self.request_with_retry(&page_url).await?;
            all.extend(items);

            match next_page {
                Some(np) if !np.is_empty() => page = np.parse::<u64>().unwrap_or(page + 1),
                _ => break,
            }
        }

        Ok(all)
    }

    async fn request_with_retry<T: DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<(T, Option<String>), GitLabClientError> {
        let mut last_error = String::new();

        // set by a 429 with Retry-After; replaces the backoff for the next attempt
        let mut retry_after: Option<u64> = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                match retry_after.take() {
                    Some(wait) => {
                        tracing::warn!(attempt, wait, url, "rate-limited, waiting Retry-After");
                        tokio::time::sleep(Duration::from_secs(wait)).await;
                    }
                    None => {
                        let backoff_secs = std::cmp::min(1u64 << attempt, 30);
                        tracing::warn!(attempt, backoff_secs, url, "retrying after backoff");
                        tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
                    }
                }
            }

            let response = match self
                .client
                .get(url)
                .header("PRIVATE-TOKEN", &self.config.private_token)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    last_error = e.to_string();
                    if e.is_timeout() || e.is_connect() {
                        continue;
                    }
                    return Err(GitLabClientError::RequestError(e));
                }
            };

            let status = response.status();

            if status.is_success() {
                let next_page = response
                    .headers()
                    .get("x-next-page")
                    .and_then(|v| v.to_str().ok())
                    .map(|s| s.to_string());

                let body = response
                    .json::<T>()
                    .await
                    .map_err(GitLabClientError::RequestError)?;

                return Ok((body, next_page));
            }

            // Honor Retry-After header for 429
            if status == StatusCode::TOO_MANY_REQUESTS {
                retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .map(|secs| std::cmp::min(secs, 60));
                last_error = "429 Too Many Requests".to_string();
                continue;
            }

            // Retry on 5xx
            if status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                last_error = format!("{status}: {body}");
                continue;
            }

            // Fail fast on 4xx (except 429 handled above)
            let body = response.text().await.unwrap_or_default();
            return Err(GitLabClientError::HttpError { status, body });
        }

        Err(GitLabClientError::MaxRetriesExceeded {
            attempts: self.config.max_retries + 1,
            last_error,
        })
    }
}

#[async_trait]
impl CommitSource for GitLabClient {
    async fn list_group_projects(
        &self,
        group: &str,
        include_subgroups: bool,
    ) -> Result<Vec<GitLabProject>, GitLabClientError> {
        let url = format!(
            "{}/api/v4/groups/{}/projects?include_subgroups={}",
            self.config.base_url,
            urlencoding::encode(group),
            include_subgroups
        );
        self.fetch_all_pages(&url).await
    }

    async fn list_branches(&self, project_id: u64) -> Result<Vec<GitLabBranch>, GitLabClientError> {
        let url = format!(
            "{}/api/v4/projects/{}/repository/branches?sort=name_asc",
            self.config.base_url, project_id
        );
        self.fetch_all_pages(&url).await
    }

    async fn list_commits(
        &self,
        project_id: u64,
        branch: &str,
        window: &DateWindow,
    ) -> Result<Vec<GitLabCommit>, GitLabClientError> {
        let url = format!(
            "{}/api/v4/projects/{}/repository/commits?ref_name={}&since={}&until={}",
            self.config.base_url,
            project_id,
            urlencoding::encode(branch),
            urlencoding::encode(&window.since_param()),
            urlencoding::encode(&window.until_param()),
        );
        self.fetch_all_pages(&url).await
    }

    async fn fetch_commit(
        &self,
        project_id: u64,
        sha: &str,
    ) -> Result<GitLabCommit, GitLabClientError> {
        let url = format!(
            "{}/api/v4/projects/{}/repository/commits/{}?stats=true",
            self.config.base_url,
            project_id,
            urlencoding::encode(sha)
        );
        let (commit, _) = self.request_with_retry(&url).await?;
        Ok(commit)
    }

    async fn fetch_commit_diff(
        &self,
        project_id: u64,
        sha: &str,
    ) -> Result<Vec<GitLabDiff>, GitLabClientError> {
        let url = format!(
            "{}/api/v4/projects/{}/repository/commits/{}/diff?unidiff=false",
            self.config.base_url,
            project_id,
            urlencoding::encode(sha)
        );
        self.fetch_all_pages(&url).await
    }
}
