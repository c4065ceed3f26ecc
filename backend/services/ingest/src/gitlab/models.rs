use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Longest diff excerpt kept per file, in characters.
pub const DIFF_EXCERPT_CHARS: usize = 500;

/// The authenticated user (`GET /api/v4/user`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitLabUser {
    pub id: u64,
    pub username: String,
    pub name: Option<String>,
}

/// A project from `GET /api/v4/groups/:id/projects`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitLabProject {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub path_with_namespace: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitLabBranch {
    pub name: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GitLabCommitStats {
    pub additions: i64,
    pub deletions: i64,
    pub total: i64,
}

/// A commit from the commit list or single-commit endpoints.
///
/// `stats` is only populated by the single-commit endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitLabCommit {
    pub id: String,
    pub short_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub author_email: String,
    #[serde(default)]
    pub committed_date: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub stats: Option<GitLabCommitStats>,
}

/// One file of `GET /projects/:id/repository/commits/:sha/diff`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitLabDiff {
    #[serde(default)]
    pub old_path: Option<String>,
    #[serde(default)]
    pub new_path: Option<String>,
    #[serde(default)]
    pub diff: String,
    #[serde(default)]
    pub new_file: bool,
    #[serde(default)]
    pub renamed_file: bool,
    #[serde(default)]
    pub deleted_file: bool,
}

impl GitLabDiff {
    pub fn change_kind(&self) -> &'static str {
        if self.new_file {
            "added"
        } else if self.deleted_file {
            "deleted"
        } else if self.renamed_file {
            "renamed"
        } else {
            "modified"
        }
    }

    pub fn path(&self) -> &str {
        self.new_path
            .as_deref()
            .or(self.old_path.as_deref())
            .unwrap_or("unknown")
    }

    /// `path (kind): excerpt`, with line breaks flattened to spaces.
    pub fn summary(&self) -> String {
        let excerpt: String = self
            .diff
            .chars()
            .take(DIFF_EXCERPT_CHARS)
            .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
            .collect();
        format!("{} ({}): {}", self.path(), self.change_kind(), excerpt)
    }
}

/// Render a commit's file changes into a single cell.
pub fn summarize_diffs(diffs: &[GitLabDiff]) -> String {
    if diffs.is_empty() {
        return "No changes detected".to_string();
    }
    diffs
        .iter()
        .map(GitLabDiff::summary)
        .collect::<Vec<_>>()
        .join(" | ")
}
