use std::path::PathBuf;

use trailmark_common::{TrailmarkResult, TrackedState};

use crate::issues::models::IssueRecord;
use crate::issues::repositories::IssueExportRepository;
use crate::table::{csv_error, format_timestamp, timing_cells, timing_column};

pub const BASE_COLUMNS: &[&str] = &[
    "assignee",
    "key",
    "type",
    "summary",
    "status",
    "created_on",
    "story_points",
    "parent",
    "parent_type",
    "parent_story_points",
];

/// Per-assignee issue export stored as a CSV file.
#[derive(Debug, Clone)]
pub struct CsvIssueExport {
    path: PathBuf,
    states: Vec<TrackedState>,
}

impl CsvIssueExport {
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
            .collect()
    }
}

impl IssueExportRepository for CsvIssueExport {
    fn write_all(&self, issues: &[IssueRecord]) -> TrailmarkResult<usize> {
        let mut writer = csv::Writer::from_path(&self.path).map_err(csv_error)?;
        writer.write_record(self.header()).map_err(csv_error)?;

        for issue in issues {
            let mut record = vec![
                issue.assignee.clone(),
                issue.key.clone(),
                issue.issue_type.clone(),
                issue.summary.clone(),
                issue.status.clone(),
                format_timestamp(issue.created_at.as_ref()),
                issue.story_points.to_string(),
                issue.parent_key.clone().unwrap_or_default(),
                issue.parent_type.clone(),
                issue.parent_story_points.to_string(),
            ];
            record.extend(timing_cells(Some(issue), &self.states));
            writer.write_record(record).map_err(csv_error)?;
        }
        writer.flush()?;

        tracing::info!(path = %self.path.display(), rows = issues.len(), "wrote issue export");
        Ok(issues.len())
    }
}
