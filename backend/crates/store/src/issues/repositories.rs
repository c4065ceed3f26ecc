use trailmark_common::TrailmarkResult;

use crate::issues::models::IssueRecord;

pub trait IssueExportRepository {
    /// Replace the stored export with `issues`. Returns the number of rows written.
    fn write_all(&self, issues: &[IssueRecord]) -> TrailmarkResult<usize>;
}
