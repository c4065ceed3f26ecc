use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use super::models::{
    JiraChangelogEntry, JiraChangelogPage, JiraIssue, JiraSearchPage, JiraUser, ISSUE_FIELDS,
};
use crate::connector::IssueSource;

pub const DEFAULT_STORY_POINTS_FIELD: &str = "customfield_10002";

const SEARCH_PAGE_SIZE: u32 = 50;
const CHANGELOG_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone)]
pub struct JiraClientConfig {
    pub base_url: String,
    pub email: String,
    pub api_token: String,
    /// Ticket prefixes allowed to resolve; empty allows every project.
    pub project_keys: Vec<String>,
    pub story_points_field: String,
    pub max_retries: u32,
    pub timeout_secs: u64,
}

impl JiraClientConfig {
    /// Load Jira config from environment.
    ///
    /// Returns `Ok(None)` if Jira is not configured (base URL / email / token missing).
    /// Returns `Err` if `JIRA_PROJECT_KEYS` is set but lists no keys.
    pub fn from_env() -> Result<Option<Self>, String> {
        let base_url = match std::env::var("JIRA_BASE_URL").ok() {
            Some(v) => v,
            None => return Ok(None),
        };
        let email = match std::env::var("JIRA_EMAIL").ok() {
            Some(v) => v,
            None => return Ok(None),
        };
        let api_token = match std::env::var("JIRA_API_TOKEN").ok() {
            Some(v) => v,
            None => return Ok(None),
        };

        let project_keys = parse_csv_project_keys("JIRA_PROJECT_KEYS")?;

        let story_points_field = std::env::var("JIRA_STORY_POINTS_FIELD")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_STORY_POINTS_FIELD.to_string());
        let max_retries = std::env::var("JIRA_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3);
        let timeout_secs = std::env::var("JIRA_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        Ok(Some(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            email,
            api_token,
            project_keys,
            story_points_field,
            max_retries,
            timeout_secs,
        }))
    }
}

/// Parse an optional comma-separated list of Jira project keys from an env var.
/// A missing var allows every project; a var with only blank entries is an error.
pub fn parse_csv_project_keys(env_key: &str) -> Result<Vec<String>, String> {
    let raw = match std::env::var(env_key) {
        Ok(raw) => raw,
        Err(_) => return Ok(Vec::new()),
    };

    let keys: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect();

    if keys.is_empty() {
        return Err(format!("{env_key} is set but contains no valid project keys"));
    }

    Ok(keys)
}

#[derive(Clone)]
pub struct JiraClient {
    client: Client,
    config: JiraClientConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum JiraClientError {
    #[error("HTTP {status}: {body}")]
    HttpError { status: StatusCode, body: String },

    #[error("request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },
}

impl JiraClient {
    pub fn new(config: JiraClientConfig) -> Result<Self, reqwest::Error> {
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

    pub fn config(&self) -> &JiraClientConfig {
        &self.config
    }

    /// Confirm the credentials are accepted before any extraction starts.
    pub async fn verify_auth(&self) -> Result<JiraUser, JiraClientError> {
        let url = format!("{}/rest/api/3/myself", self.config.base_url);
        self.request_with_retry(&url).await
    }

    fn fields_param(&self) -> String {
        let mut fields: Vec<&str> = ISSUE_FIELDS.to_vec();
        fields.push(&self.config.story_points_field);
        fields.join(",")
    }

    async fn request_with_retry<T: DeserializeOwned>(&self, url: &str) -> Result<T, JiraClientError> {
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
                .basic_auth(&self.config.email, Some(&self.config.api_token))
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    last_error = e.to_string();
                    if e.is_timeout() || e.is_connect() {
                        continue;
                    }
                    return Err(JiraClientError::RequestError(e));
                }
            };

            let status = response.status();

            if status.is_success() {
                return response
                    .json::<T>()
                    .await
                    .map_err(JiraClientError::RequestError);
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
            return Err(JiraClientError::HttpError { status, body });
        }

        Err(JiraClientError::MaxRetriesExceeded {
            attempts: self.config.max_retries + 1,
            last_error,
        })
    }
}

#[async_trait]
impl IssueSource for JiraClient {
    fn story_points_field(&self) -> &str {
        &self.config.story_points_field
    }

    async fn fetch_issue(
        &self,
        key: &str,
        expand_changelog: bool,
    ) -> Result<JiraIssue, JiraClientError> {
        let mut url = format!(
            "{}/rest/api/3/issue/{}?fields={}",
            self.config.base_url,
            urlencoding::encode(key),
            self.fields_param()
        );
        if expand_changelog {
            url.push_str("&expand=changelog");
        }
        self.request_with_retry(&url).await
    }

    async fn fetch_changelog(&self, key: &str) -> Result<Vec<JiraChangelogEntry>, JiraClientError> {
        let mut start_at: u32 = 0;
        let mut entries = Vec::new();

        loop {
            let url = format!(
                "{}/rest/api/3/issue/{}/changelog?startAt={}&maxResults={}",
                self.config.base_url,
                urlencoding::encode(key),
                start_at,
                CHANGELOG_PAGE_SIZE
            );

            let page: JiraChangelogPage = self.request_with_retry(&url).await?;
            let page_len = page.values.len() as u32;
            entries.extend(page.values);

            let exhausted = page.is_last.unwrap_or(start_at + page_len >= page.total);
            if exhausted || page_len == 0 {
                break;
            }
            start_at += page_len;
        }

        Ok(entries)
    }

    async fn search_issues(&self, jql: &str) -> Result<Vec<JiraIssue>, JiraClientError> {
        let mut start_at: u32 = 0;
        let mut issues = Vec::new();

        loop {
            let url = format!(
                "{}/rest/api/3/search?jql={}&startAt={}&maxResults={}&fields={}&expand=changelog",
                self.config.base_url,
                urlencoding::encode(jql),
                start_at,
                SEARCH_PAGE_SIZE,
                self.fields_param()
            );

            let page: JiraSearchPage = self.request_with_retry(&url).await?;
            let page_len = page.issues.len() as u32;
            issues.extend(page.issues);

            if page_len == 0 || start_at + page_len >= page.total {
                break;
            }
            start_at += page_len;
        }

        Ok(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{basic_auth, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config() -> JiraClientConfig {
        JiraClientConfig {
            base_url: "http://localhost".to_string(),
            email: "test@example.com".to_string(),
            api_token: "fake-token".to_string(),
            project_keys: Vec::new(),
            story_points_field: DEFAULT_STORY_POINTS_FIELD.to_string(),
            max_retries: 2,
            timeout_secs: 5,
        }
    }

    fn client(server: &MockServer) -> JiraClient {
        JiraClient::new(test_config())
            .unwrap()
            .with_base_url(&server.uri())
    }

    fn make_issues(count: usize, offset: usize) -> Vec<serde_json::Value> {
        (0..count)
            .map(|i| {
                serde_json::json!({
                    "key": format!("OPS-{}", i + offset),
                    "fields": {
                        "assignee": {"displayName": "Lee, Ann, Acme"},
                        "issuetype": {"name": "Task"},
                        "summary": format!("Task {}", i + offset),
                        "status": {"name": "Done"},
                        "created": "2024-03-01T10:00:00.000+0100",
                        "customfield_10002": 2
                    }
                })
            })
            .collect()
    }

    #[tokio::test]
    async fn fetch_issue_requests_fields_and_changelog() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/api/3/issue/PMS-10"))
            .and(query_param(
                "fields",
                "key,assignee,issuetype,summary,status,created,parent,customfield_10002",
            ))
            .and(query_param("expand", "changelog"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "key": "PMS-10",
                "fields": {"summary": "CSV export", "customfield_10002": 5}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let issue = client(&server).fetch_issue("PMS-10", true).await.unwrap();
        assert_eq!(issue.key, "PMS-10");
        assert_eq!(issue.fields.number("customfield_10002"), 5.0);
    }

    #[tokio::test]
    async fn fetch_issue_404_fails_fast() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/api/3/issue/NOPE-1"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Issue does not exist"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server).fetch_issue("NOPE-1", false).await.unwrap_err();
        match err {
            JiraClientError::HttpError { status, body } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(body, "Issue does not exist");
            }
            other => panic!("expected HttpError, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_changelog_pages_until_last() {
        let server = MockServer::start().await;
        let entry = |id: u32| {
            serde_json::json!({
                "id": id.to_string(),
                "created": "2024-03-02T10:00:00.000+0100",
                "items": [{"field": "status", "fromString": "To Do", "toString": "In Progress"}]
            })
        };

        Mock::given(method("GET"))
            .and(path("/rest/api/3/issue/PMS-10/changelog"))
            .and(query_param("startAt", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "startAt": 0, "maxResults": 2, "total": 3, "isLast": false,
                "values": [entry(1), entry(2)]
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/rest/api/3/issue/PMS-10/changelog"))
            .and(query_param("startAt", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "startAt": 2, "maxResults": 2, "total": 3, "isLast": true,
                "values": [entry(3)]
            })))
            .mount(&server)
            .await;

        let entries = client(&server).fetch_changelog("PMS-10").await.unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2].id.as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn search_pages_by_total() {
        let server = MockServer::start().await;
        let jql = "assignee = \"Lee, Ann, Acme\" AND status = Done";

        Mock::given(method("GET"))
            .and(path("/rest/api/3/search"))
            .and(query_param("jql", jql))
            .and(query_param("startAt", "0"))
            .and(query_param("maxResults", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "startAt": 0, "maxResults": 50, "total": 53, "issues": make_issues(50, 0)
            })))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/rest/api/3/search"))
            .and(query_param("startAt", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "startAt": 50, "maxResults": 50, "total": 53, "issues": make_issues(3, 50)
            })))
            .mount(&server)
            .await;

        let issues = client(&server).search_issues(jql).await.unwrap();
        assert_eq!(issues.len(), 53);
        assert_eq!(issues[52].key, "OPS-52");
    }

    #[tokio::test]
    async fn retries_on_500() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/api/3/issue/PMS-10"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .up_to_n_times(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/rest/api/3/issue/PMS-10"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"key": "PMS-10", "fields": {}})),
            )
            .mount(&server)
            .await;

        let issue = client(&server).fetch_issue("PMS-10", true).await.unwrap();
        assert_eq!(issue.key, "PMS-10");
    }

    #[tokio::test]
    async fn retries_on_429_with_retry_after() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/api/3/issue/PMS-10"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/rest/api/3/issue/PMS-10"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"key": "PMS-10", "fields": {}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let started = std::time::Instant::now();
        let issue = client(&server).fetch_issue("PMS-10", true).await.unwrap();
        assert_eq!(issue.key, "PMS-10");
        // Retry-After: 0 replaces the 2s backoff
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn max_retries_exceeded() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/api/3/issue/PMS-10"))
            .respond_with(ResponseTemplate::new(500).set_body_string("always failing"))
            .mount(&server)
            .await;

        let mut config = test_config();
        config.max_retries = 1;
        let client = JiraClient::new(config)
            .unwrap()
            .with_base_url(&server.uri());

        let err = client.fetch_issue("PMS-10", true).await.unwrap_err();
        assert!(matches!(err, JiraClientError::MaxRetriesExceeded { .. }));
    }

    #[tokio::test]
    async fn verify_auth_uses_basic_auth() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/api/3/myself"))
            .and(basic_auth("test@example.com", "fake-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "accountId": "acc-1", "displayName": "Reader"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let me = client(&server).verify_auth().await.unwrap();
        assert_eq!(me.account_id, "acc-1");
    }

    #[tokio::test]
    async fn verify_auth_fails_fast_on_403() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/api/3/myself"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server).verify_auth().await.unwrap_err();
        assert!(matches!(err, JiraClientError::HttpError { status, .. } if status == StatusCode::FORBIDDEN));
    }

    // ── Env parsing tests ────────────────────────────────────────

    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn parse_csv_valid_multiple_keys() {
        let _g = ENV_LOCK.lock().unwrap();
        std::env::set_var("_TEST_KEYS", "PROJ, TEAM ,ops");
        let keys = super::parse_csv_project_keys("_TEST_KEYS").unwrap();
        assert_eq!(keys, vec!["PROJ", "TEAM", "OPS"]);
        std::env::remove_var("_TEST_KEYS");
    }

    #[test]
    fn parse_csv_empty_value_fails() {
        let _g = ENV_LOCK.lock().unwrap();
        std::env::set_var("_TEST_KEYS3", "  , , ");
        let err = super::parse_csv_project_keys("_TEST_KEYS3").unwrap_err();
        assert!(err.contains("no valid project keys"), "got: {err}");
        std::env::remove_var("_TEST_KEYS3");
    }

    #[test]
    fn parse_csv_missing_var_allows_all() {
        let _g = ENV_LOCK.lock().unwrap();
        std::env::remove_var("_TEST_KEYS_MISSING");
        let keys = super::parse_csv_project_keys("_TEST_KEYS_MISSING").unwrap();
        assert!(keys.is_empty());
    }

    #[test]
    fn from_env_returns_none_when_no_jira_creds() {
        let _g = ENV_LOCK.lock().unwrap();
        std::env::remove_var("JIRA_BASE_URL");
        std::env::remove_var("JIRA_EMAIL");
        std::env::remove_var("JIRA_API_TOKEN");
        let result = JiraClientConfig::from_env().unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn from_env_succeeds_with_all_vars() {
        let _g = ENV_LOCK.lock().unwrap();
        std::env::set_var("JIRA_BASE_URL", "https://test.atlassian.net/");
        std::env::set_var("JIRA_EMAIL", "a@b.com");
        std::env::set_var("JIRA_API_TOKEN", "tok");
        std::env::set_var("JIRA_PROJECT_KEYS", "pms,OPS");
        std::env::set_var("JIRA_STORY_POINTS_FIELD", "customfield_10016");
        let cfg = JiraClientConfig::from_env().unwrap().unwrap();
        assert_eq!(cfg.base_url, "https://test.atlassian.net");
        assert_eq!(cfg.project_keys, vec!["PMS", "OPS"]);
        assert_eq!(cfg.story_points_field, "customfield_10016");
        assert_eq!(cfg.max_retries, 3);
        std::env::remove_var("JIRA_BASE_URL");
        std::env::remove_var("JIRA_EMAIL");
        std::env::remove_var("JIRA_API_TOKEN");
        std::env::remove_var("JIRA_PROJECT_KEYS");
        std::env::remove_var("JIRA_STORY_POINTS_FIELD");
    }

    #[test]
    fn from_env_defaults_story_points_field() {
        let _g = ENV_LOCK.lock().unwrap();
        std::env::set_var("JIRA_BASE_URL", "https://test.atlassian.net");
        std::env::set_var("JIRA_EMAIL", "a@b.com");
        std::env::set_var("JIRA_API_TOKEN", "tok");
        std::env::remove_var("JIRA_PROJECT_KEYS");
        std::env::remove_var("JIRA_STORY_POINTS_FIELD");
        let cfg = JiraClientConfig::from_env().unwrap().unwrap();
        assert!(cfg.project_keys.is_empty());
        assert_eq!(cfg.story_points_field, "customfield_10002");
        std::env::remove_var("JIRA_BASE_URL");
        std::env::remove_var("JIRA_EMAIL");
        std::env::remove_var("JIRA_API_TOKEN");
    }
}
