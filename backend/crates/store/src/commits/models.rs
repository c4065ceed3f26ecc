use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::issues::models::IssueRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitStats {
    pub additions: i64,
    pub deletions: i64,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub project_name: String,
    pub short_id: String,
    pub author_name: String,
    pub author_email: String,
    pub committed_at: Option<DateTime<FixedOffset>>,
    pub title: String,
    pub stats: Option<CommitStats>,
    /// Rendered file-level change summary.
    pub changes: String,
}

/// One output row: a commit left-joined with the issue its title references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedCommit {
    pub commit: CommitRecord,
    pub extracted_ticket: Option<String>,
    pub issue: Option<IssueRecord>,
    pub error: Option<String>,
}

impl EnrichedCommit {
    pub fn has_ticket(&self) -> bool {
        self.extracted_ticket.is_some()
    }

    /// Issue that resolved successfully, skipping error sentinels.
    pub fn resolved_issue(&self) -> Option<&IssueRecord> {
        self.issue.as_ref().filter(|i| !i.is_error())
    }
}
