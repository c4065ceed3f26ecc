use async_trait::async_trait;
use trailmark_config::DateWindow;

use crate::gitlab::client::GitLabClientError;
use crate::gitlab::models::{GitLabBranch, GitLabCommit, GitLabDiff, GitLabProject};
use crate::jira::client::JiraClientError;
use crate::jira::models::{JiraChangelogEntry, JiraIssue};

/// Read access to the source-control host.
#[async_trait]
pub trait CommitSource: Send + Sync {
    async fn list_group_projects(
        &self,
        group: &str,
        include_subgroups: bool,
    ) -> Result<Vec<GitLabProject>, GitLabClientError>;

    async fn list_branches(&self, project_id: u64) -> Result<Vec<GitLabBranch>, GitLabClientError>;

    /// Commits reachable from `branch` committed inside `window`.
    async fn list_commits(
        &self,
        project_id: u64,
        branch: &str,
        window: &DateWindow,
    ) -> Result<Vec<GitLabCommit>, GitLabClientError>;

    /// Single commit including line stats.
    async fn fetch_commit(
        &self,
        project_id: u64,
        sha: &str,
    ) -> Result<GitLabCommit, GitLabClientError>;

    async fn fetch_commit_diff(
        &self,
        project_id: u64,
        sha: &str,
    ) -> Result<Vec<GitLabDiff>, GitLabClientError>;
}

/// Read access to the issue tracker.
#[async_trait]
pub trait IssueSource: Send + Sync {
    /// Custom field holding story points.
    fn story_points_field(&self) -> &str;

    async fn fetch_issue(
        &self,
        key: &str,
        expand_changelog: bool,
    ) -> Result<JiraIssue, JiraClientError>;

    /// Complete change history, across every page.
    async fn fetch_changelog(&self, key: &str) -> Result<Vec<JiraChangelogEntry>, JiraClientError>;

    async fn search_issues(&self, jql: &str) -> Result<Vec<JiraIssue>, JiraClientError>;
}
