use std::path::PathBuf;

use csv::StringRecord;
use trailmark_common::{TrailmarkResult, TrackedState};

use crate::commits::models::{CommitRecord, CommitStats, EnrichedCommit};
use crate::commits::repositories::EnrichedCommitRepository;
use crate::issues::models::{ElapsedTime, IssueRecord, StateTiming};
use crate::table::{
    csv_error, format_timestamp, non_empty, parse_points, parse_timestamp, timing_cells,
    timing_column, HeaderIndex,
};

/// Fixed columns preceding the per-state timing columns.
pub const BASE_COLUMNS: &[&str] = &[
    "project_name",
    "commit_short_id",
    "commit_author_name",
    "commit_author_email",
    "commit_date",
    "commit_title",
    "commit_additions",
    "commit_deletions",
    "commit_total_changes",
    "commit_changes",
    "extracted_jira_ticket",
    "jira_assignee",
    "jira_key",
    "jira_type",
    "jira_summary",
    "jira_status",
    "jira_created_on",
    "jira_story_points",
    "jira_parent",
    "jira_parent_type",
    "jira_parent_story_points",
];

pub const ERROR_COLUMN: &str = "error";

/// The joined commit table stored as a CSV file.
#[derive(Debug, Clone)]
pub struct CsvCommitTable {
    path: PathBuf,
    states: Vec<TrackedState>,
}

impl CsvCommitTable {
    /// `states` selects the timing columns written; reads take them from the header.
    pub fn new(path: impl Into<PathBuf>, states: Vec<TrackedState>) -> Self {
        Self {
            path: path.into(),
            states,
        }
    }

    pub fn header(&self) -> Vec<String> {
        BASE_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(self.states.iter().map(timing_column))
            .chain(std::iter::once(ERROR_COLUMN.to_owned()))
            .collect()
    }

    fn to_record(&self, row: &EnrichedCommit) -> Vec<String> {
        let c = &row.commit;
        let issue = row.issue.as_ref();
        let stat = |f: fn(&CommitStats) -> i64| c.stats.as_ref().map(f).map(|v| v.to_string());
        let field = |f: fn(&IssueRecord) -> String| issue.map(f).unwrap_or_default();

        let mut record = vec![
            c.project_name.clone(),
            c.short_id.clone(),
            c.author_name.clone(),
            c.author_email.clone(),
            format_timestamp(c.committed_at.as_ref()),
            c.title.clone(),
            stat(|s| s.additions).unwrap_or_default(),
            stat(|s| s.deletions).unwrap_or_default(),
            stat(|s| s.total).unwrap_or_default(),
            c.changes.clone(),
            row.extracted_ticket.clone().unwrap_or_default(),
            field(|i| i.assignee.clone()),
            field(|i| i.key.clone()),
            field(|i| i.issue_type.clone()),
            field(|i| i.summary.clone()),
            field(|i| i.status.clone()),
            field(|i| format_timestamp(i.created_at.as_ref())),
            field(|i| i.story_points.to_string()),
            field(|i| i.parent_key.clone().unwrap_or_default()),
            field(|i| i.parent_type.clone()),
            field(|i| i.parent_story_points.to_string()),
        ];
        record.extend(timing_cells(issue, &self.states));
        record.push(row.error.clone().unwrap_or_default());
        record
    }
}

fn from_record(index: &HeaderIndex, record: &StringRecord) -> EnrichedCommit {
    let get = |name: &str| index.get(record, name);

    let stats = (|| {
        Some(CommitStats {
            additions: get("commit_additions").trim().parse().ok()?,
            deletions: get("commit_deletions").trim().parse().ok()?,
            total: get("commit_total_changes").trim().parse().ok()?,
        })
    })();

    let commit = CommitRecord {
        project_name: get("project_name").to_owned(),
        short_id: get("commit_short_id").to_owned(),
        author_name: get("commit_author_name").to_owned(),
        author_email: get("commit_author_email").to_owned(),
        committed_at: parse_timestamp(get("commit_date")),
        title: get("commit_title").to_owned(),
        stats,
        changes: get("commit_changes").to_owned(),
    };

    let issue = non_empty(get("jira_key")).map(|key| IssueRecord {
        key,
        assignee: get("jira_assignee").trim().to_owned(),
        issue_type: get("jira_type").to_owned(),
        summary: get("jira_summary").to_owned(),
        status: get("jira_status").to_owned(),
        created_at: parse_timestamp(get("jira_created_on")),
        story_points: parse_points(get("jira_story_points")),
        parent_key: non_empty(get("jira_parent")),
        parent_type: get("jira_parent_type").to_owned(),
        parent_story_points: parse_points(get("jira_parent_story_points")),
        timings: index
            .timing_states()
            .iter()
            .map(|state| StateTiming {
                state: state.clone(),
                elapsed: ElapsedTime::parse(get(&format!("jira_time_{state}"))),
            })
            .collect(),
    });

    EnrichedCommit {
        commit,
        extracted_ticket: non_empty(get("extracted_jira_ticket")),
        issue,
        error: non_empty(get(ERROR_COLUMN)),
    }
}

impl EnrichedCommitRepository for CsvCommitTable {
    fn write_all(&self, rows: &[EnrichedCommit]) -> TrailmarkResult<usize> {
        let mut writer = csv::Writer::from_path(&self.path).map_err(csv_error)?;
        writer.write_record(self.header()).map_err(csv_error)?;
        for row in rows {
            writer.write_record(self.to_record(row)).map_err(csv_error)?;
        }
        writer.flush()?;

        tracing::info!(path = %self.path.display(), rows = rows.len(), "wrote commit table");
        Ok(rows.len())
    }

    fn read_all(&self) -> TrailmarkResult<Vec<EnrichedCommit>> {
        let mut reader = csv::Reader::from_path(&self.path).map_err(csv_error)?;
        let index = HeaderIndex::new(reader.headers().map_err(csv_error)?);
        index.require(&["project_name", "commit_short_id", "commit_author_name", "jira_key"])?;

        let mut rows = Vec::new();
        for record in reader.records() {
            rows.push(from_record(&index, &record.map_err(csv_error)?));
        }

        tracing::debug!(path = %self.path.display(), rows = rows.len(), "read commit table");
        Ok(rows)
    }
}
