use futures::stream::{self, StreamExt};
use trailmark_common::{TrailmarkError, TrailmarkResult};
use trailmark_store::issues::repositories::IssueExportRepository;

use super::query::build_assignee_jql;
use super::resolver::IssueResolver;
use crate::connector::IssueSource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub jql: String,
    pub issues_found: usize,
    pub rows_written: usize,
}

/// Exports every issue assigned to one person in one status.
pub struct AssigneeExport<I, R> {
    resolver: IssueResolver<I>,
    repo: R,
    workers: usize,
}

impl<I, R> AssigneeExport<I, R>
where
    I: IssueSource,
    R: IssueExportRepository,
{
    pub fn new(resolver: IssueResolver<I>, repo: R, workers: usize) -> Self {
        Self {
            resolver,
            repo,
            workers: workers.max(1),
        }
    }

    pub async fn run(&self, assignee: &str, status: &str) -> TrailmarkResult<ExportSummary> {
        let jql = build_assignee_jql(assignee, status);
        tracing::info!(jql = %jql, "searching jira issues");

        let issues = self
            .resolver
            .source()
            .search_issues(&jql)
            .await
            .map_err(|e| TrailmarkError::Upstream(format!("jira search failed: {e}")))?;
        let issues_found = issues.len();
        tracing::info!(count = issues_found, "fetched jira issues");

        // search order is kept in the export
        let records: Vec<_> = stream::iter(issues)
            .map(|issue| self.resolver.build_record(issue))
            .buffered(self.workers)
            .collect()
            .await;

        let rows_written = self.repo.write_all(&records)?;

        let result = ExportSummary {
            jql,
            issues_found,
            rows_written,
        };
        tracing::info!(?result, "assignee export completed");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{issue, issue_json, MockIssueSource};
    use crate::timer::StatusTimer;
    use std::sync::Mutex;
    use trailmark_common::TrackedState;
    use trailmark_store::IssueRecord;

    #[derive(Default)]
    struct MemoryExport {
        rows: Mutex<Vec<IssueRecord>>,
    }

    impl IssueExportRepository for &MemoryExport {
        fn write_all(&self, issues: &[IssueRecord]) -> TrailmarkResult<usize> {
            let mut rows = self.rows.lock().unwrap();
            *rows = issues.to_vec();
            Ok(rows.len())
        }
    }

    fn resolver(source: MockIssueSource) -> IssueResolver<MockIssueSource> {
        IssueResolver::new(source, StatusTimer::new(TrackedState::defaults()))
    }

    #[tokio::test]
    async fn exports_search_results_in_order() {
        let mut source = MockIssueSource::default();
        source.search_results = vec![
            issue(issue_json("OPS-2", "Lee, Ann, Acme", "Done", 3.0)),
            issue(issue_json("OPS-1", "Lee, Ann, Acme", "Done", 1.0)),
        ];
        let calls = source.calls.clone();
        let memory = MemoryExport::default();

        let summary = AssigneeExport::new(resolver(source), &memory, 4)
            .run("Lee, Ann, Acme", "Done")
            .await
            .unwrap();

        assert_eq!(summary.issues_found, 2);
        assert_eq!(summary.rows_written, 2);
        assert_eq!(
            calls.count("search:assignee = \"Lee, Ann, Acme\" AND status = \"Done\""),
            1
        );
        // search results already carry the changelog
        assert_eq!(calls.count_prefix("issue:"), 0);

        let rows = memory.rows.lock().unwrap();
        assert_eq!(rows[0].key, "OPS-2");
        assert_eq!(rows[1].key, "OPS-1");
        assert!(rows[0].timing("in_progress").is_some());
    }

    #[tokio::test]
    async fn empty_search_writes_no_rows() {
        let memory = MemoryExport::default();
        let summary = AssigneeExport::new(resolver(MockIssueSource::default()), &memory, 1)
            .run("nobody", "Done")
            .await
            .unwrap();
        assert_eq!(summary.issues_found, 0);
        assert_eq!(summary.rows_written, 0);
    }
}
