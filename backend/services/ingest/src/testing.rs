//! In-memory sources for pipeline, resolver and export tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::DateTime;
use reqwest::StatusCode;
use trailmark_config::DateWindow;

use crate::connector::{CommitSource, IssueSource};
use crate::gitlab::client::GitLabClientError;
use crate::gitlab::models::{GitLabBranch, GitLabCommit, GitLabCommitStats, GitLabDiff, GitLabProject};
use crate::jira::client::{JiraClientError, DEFAULT_STORY_POINTS_FIELD};
use crate::jira::models::{JiraChangelogEntry, JiraIssue};

/// Shared record of remote calls, cloned into the test before the source is moved.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    fn record(&self, call: String) {
        if let Ok(mut calls) = self.0.lock() {
            calls.push(call);
        }
    }

    pub fn count(&self, call: &str) -> usize {
        self.0
            .lock()
            .map(|calls| calls.iter().filter(|c| c.as_str() == call).count())
            .unwrap_or(0)
    }

    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.0
            .lock()
            .map(|calls| calls.iter().filter(|c| c.starts_with(prefix)).count())
            .unwrap_or(0)
    }
}

fn not_found(body: &str) -> GitLabClientError {
    GitLabClientError::HttpError {
        status: StatusCode::NOT_FOUND,
        body: body.to_string(),
    }
}

pub fn commit(sha: &str, title: &str, author: &str, date: &str) -> GitLabCommit {
    GitLabCommit {
        id: sha.to_string(),
        short_id: sha.chars().take(8).collect(),
        title: title.to_string(),
        author_name: author.to_string(),
        author_email: format!("{}@example.com", author.to_lowercase().replace(' ', ".")),
        committed_date: chrono::DateTime::parse_from_rfc3339(date).ok(),
        stats: None,
    }
}

#[derive(Debug, Default)]
pub struct MockCommitSource {
    pub projects: Vec<GitLabProject>,
    pub branches: HashMap<u64, Vec<String>>,
    pub commits: HashMap<(u64, String), Vec<GitLabCommit>>,
    pub fail_group: bool,
    pub failing_projects: HashSet<u64>,
    pub failing_commits: HashSet<String>,
    pub failing_diffs: HashSet<String>,
    pub calls: CallLog,
}

impl MockCommitSource {
    pub fn with_project(mut self, id: u64, name: &str) -> Self {
        self.projects.push(GitLabProject {
            id,
            name: name.to_string(),
            path_with_namespace: Some(format!("acme/{name}")),
        });
        self
    }

    pub fn with_commits(mut self, project_id: u64, branch: &str, commits: Vec<GitLabCommit>) -> Self {
        self.branches
            .entry(project_id)
            .or_default()
            .push(branch.to_string());
        self.commits.insert((project_id, branch.to_string()), commits);
        self
    }

    fn find_commit(&self, project_id: u64, sha: &str) -> Option<&GitLabCommit> {
        self.commits
            .iter()
            .filter(|((p, _), _)| *p == project_id)
            .flat_map(|(_, commits)| commits.iter())
            .find(|c| c.id == sha)
    }
}

#[async_trait]
impl CommitSource for MockCommitSource {
    async fn list_group_projects(
        &self,
        group: &str,
        _include_subgroups: bool,
    ) -> Result<Vec<GitLabProject>, GitLabClientError> {
        self.calls.record(format!("projects:{group}"));
        if self.fail_group {
            return Err(not_found("404 Group Not Found"));
        }
        Ok(self.projects.clone())
    }

    async fn list_branches(&self, project_id: u64) -> Result<Vec<GitLabBranch>, GitLabClientError> {
        self.calls.record(format!("branches:{project_id}"));
        if self.failing_projects.contains(&project_id) {
            return Err(not_found("404 Project Not Found"));
        }
        Ok(self
            .branches
            .get(&project_id)
            .into_iter()
            .flatten()
            .map(|name| GitLabBranch { name: name.clone() })
            .collect())
    }

    async fn list_commits(
        &self,
        project_id: u64,
        branch: &str,
        window: &DateWindow,
    ) -> Result<Vec<GitLabCommit>, GitLabClientError> {
        self.calls.record(format!("commits:{project_id}:{branch}"));
        // same instant filter GitLab applies to `since`/`until`
        let bound = |param: String| DateTime::parse_from_rfc3339(&param).ok();
        let (since, until) = (bound(window.since_param()), bound(window.until_param()));
        Ok(self
            .commits
            .get(&(project_id, branch.to_string()))
            .map(|listed| {
                listed
                    .iter()
                    .filter(|c| {
                        c.committed_date.is_none_or(|at| {
                            since.is_none_or(|s| at >= s) && until.is_none_or(|u| at <= u)
                        })
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn fetch_commit(
        &self,
        project_id: u64,
        sha: &str,
    ) -> Result<GitLabCommit, GitLabClientError> {
        self.calls.record(format!("commit:{sha}"));
        if self.failing_commits.contains(sha) {
            return Err(GitLabClientError::MaxRetriesExceeded {
                attempts: 3,
                last_error: "502 Bad Gateway".to_string(),
            });
        }
        let mut commit = self
            .find_commit(project_id, sha)
            .cloned()
            .ok_or_else(|| not_found("404 Commit Not Found"))?;
        commit.stats = Some(GitLabCommitStats {
            additions: 10,
            deletions: 2,
            total: 12,
        });
        Ok(commit)
    }

    async fn fetch_commit_diff(
        &self,
        _project_id: u64,
        sha: &str,
    ) -> Result<Vec<GitLabDiff>, GitLabClientError> {
        self.calls.record(format!("diff:{sha}"));
        if self.failing_diffs.contains(sha) {
            return Err(not_found("404 Diff Not Found"));
        }
        Ok(vec![GitLabDiff {
            old_path: Some("src/export.rs".to_string()),
            new_path: Some("src/export.rs".to_string()),
            diff: "+fn export() {}".to_string(),
            new_file: false,
            renamed_file: false,
            deleted_file: false,
        }])
    }
}

/// Issue JSON as returned with `expand=changelog`.
pub fn issue_json(key: &str, assignee: &str, status: &str, points: f64) -> serde_json::Value {
    serde_json::json!({
        "key": key,
        "fields": {
            "assignee": {"displayName": assignee},
            "issuetype": {"name": "Story"},
            "summary": format!("Summary of {key}"),
            "status": {"name": status},
            "created": "2024-03-01T09:00:00.000+0000",
            "customfield_10002": points,
        },
        "changelog": {"startAt": 0, "maxResults": 100, "total": 2, "histories": [
            {"id": "1", "created": "2024-03-01T09:00:00.000+0000",
             "items": [{"field": "status", "fromString": "To Do", "toString": "In Progress"}]},
            {"id": "2", "created": "2024-03-03T14:00:00.000+0000",
             "items": [{"field": "status", "fromString": "In Progress", "toString": status}]}
        ]}
    })
}

pub fn issue(value: serde_json::Value) -> JiraIssue {
    serde_json::from_value(value).expect("valid issue json")
}

#[derive(Debug, Default)]
pub struct MockIssueSource {
    pub issues: HashMap<String, JiraIssue>,
    pub changelogs: HashMap<String, Vec<JiraChangelogEntry>>,
    pub search_results: Vec<JiraIssue>,
    pub calls: CallLog,
}

impl MockIssueSource {
    pub fn with_issue(mut self, issue: JiraIssue) -> Self {
        self.issues.insert(issue.key.clone(), issue);
        self
    }
}

#[async_trait]
impl IssueSource for MockIssueSource {
    fn story_points_field(&self) -> &str {
        DEFAULT_STORY_POINTS_FIELD
    }

    async fn fetch_issue(
        &self,
        key: &str,
        expand_changelog: bool,
    ) -> Result<JiraIssue, JiraClientError> {
        self.calls.record(format!("issue:{key}"));
        let mut issue = self
            .issues
            .get(key)
            .cloned()
            .ok_or_else(|| JiraClientError::HttpError {
                status: StatusCode::NOT_FOUND,
                body: "Issue does not exist or you do not have permission to see it.".to_string(),
            })?;
        if !expand_changelog {
            issue.changelog = None;
        }
        Ok(issue)
    }

    async fn fetch_changelog(&self, key: &str) -> Result<Vec<JiraChangelogEntry>, JiraClientError> {
        self.calls.record(format!("changelog:{key}"));
        self.changelogs
            .get(key)
            .cloned()
            .ok_or_else(|| JiraClientError::MaxRetriesExceeded {
                attempts: 3,
                last_error: "503 Service Unavailable".to_string(),
            })
    }

    async fn search_issues(&self, jql: &str) -> Result<Vec<JiraIssue>, JiraClientError> {
        self.calls.record(format!("search:{jql}"));
        Ok(self.search_results.clone())
    }
}
