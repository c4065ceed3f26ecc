use std::collections::HashSet;
use std::time::Duration;

use trailmark_store::EnrichedCommit;

use crate::cache::CacheStats;

/// Counters reported at the end of an extraction run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub projects_seen: usize,
    pub projects_skipped: usize,
    pub branches_seen: usize,
    pub branches_skipped: usize,
    pub commits_processed: usize,
    pub commits_with_ticket: usize,
    pub commits_without_ticket: usize,
    pub commit_errors: usize,
    pub commits_outside_window: usize,
    pub duplicates_dropped: usize,
    pub distinct_tickets: usize,
    pub tickets_resolved: usize,
    pub tickets_errored: usize,
    /// Extracted keys whose project is not in the allow-list.
    pub tickets_not_allowed: usize,
    pub cache_hits: usize,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn record_rows(&mut self, rows: &[EnrichedCommit]) {
        self.commits_processed = rows.len();
        self.commit_errors = rows.iter().filter(|r| r.error.is_some()).count();
        self.commits_with_ticket = rows.iter().filter(|r| r.has_ticket()).count();
        self.commits_without_ticket = rows
            .iter()
            .filter(|r| !r.has_ticket() && r.error.is_none())
            .count();
        self.tickets_not_allowed = rows
            .iter()
            .filter(|r| r.issue.is_none())
            .filter_map(|r| r.extracted_ticket.as_deref())
            .collect::<HashSet<_>>()
            .len();
    }

    pub fn record_cache(&mut self, stats: CacheStats) {
        self.distinct_tickets = stats.keys;
        self.tickets_resolved = stats.fetches - stats.errors;
        self.tickets_errored = stats.errors;
        self.cache_hits = stats.hits;
    }
}
