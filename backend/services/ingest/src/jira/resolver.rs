use trailmark_store::IssueRecord;

use super::models::{JiraChangelogEntry, JiraIssue};
use crate::connector::IssueSource;
use crate::timer::StatusTimer;

/// Turns issue-tracker responses into flat [`IssueRecord`]s with parent
/// points and tracked-state timings attached.
pub struct IssueResolver<I> {
    source: I,
    timer: StatusTimer,
}

impl<I: IssueSource> IssueResolver<I> {
    pub fn new(source: I, timer: StatusTimer) -> Self {
        Self { source, timer }
    }

    pub fn source(&self) -> &I {
        &self.source
    }

    /// Fetch and flatten one issue. Failures become an error record and never propagate.
    pub async fn resolve(&self, key: &str) -> IssueRecord {
        match self.source.fetch_issue(key, true).await {
            Ok(issue) => self.build_record(issue).await,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to fetch jira issue");
                IssueRecord::error(key, &e.to_string())
            }
        }
    }

    /// Flatten an already fetched issue, following its parent and completing a truncated history.
    pub async fn build_record(&self, issue: JiraIssue) -> IssueRecord {
        let history = self.full_history(&issue).await;
        let timings = self.timer.measure(&history);

        let fields = &issue.fields;
        let parent_key = fields.parent.as_ref().map(|p| p.key.clone());
        let (parent_type, parent_story_points) = match &parent_key {
            Some(parent) => self.parent_details(&issue.key, parent).await,
            None => (String::new(), 0.0),
        };

        IssueRecord {
            key: issue.key.clone(),
            assignee: fields.assignee_name(),
            issue_type: fields.type_name(),
            summary: fields.summary.clone().unwrap_or_default(),
            status: fields.status_name(),
            created_at: fields.created_at(),
            story_points: fields.number(self.source.story_points_field()),
            parent_key,
            parent_type,
            parent_story_points,
            timings,
        }
    }

    async fn full_history(&self, issue: &JiraIssue) -> Vec<JiraChangelogEntry> {
        let Some(changelog) = &issue.changelog else {
            return Vec::new();
        };
        if !changelog.is_truncated() {
            return changelog.histories.clone();
        }

        tracing::debug!(
            key = %issue.key,
            returned = changelog.histories.len(),
            total = changelog.total,
            "changelog truncated, paging full history"
        );
        match self.source.fetch_changelog(&issue.key).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(key = %issue.key, error = %e, "failed to page changelog, using truncated history");
                changelog.histories.clone()
            }
        }
    }

    async fn parent_details(&self, key: &str, parent: &str) -> (String, f64) {
        match self.source.fetch_issue(parent, false).await {
            Ok(issue) => (
                issue.fields.type_name(),
                issue.fields.number(self.source.story_points_field()),
            ),
            Err(e) => {
                tracing::warn!(key, parent, error = %e, "failed to fetch parent issue");
                (String::new(), 0.0)
            }
        }
    }
}
