use std::collections::{BTreeMap, HashSet};

use trailmark_matching::NameReconciler;
use trailmark_store::{EnrichedCommit, IssueRecord};

use crate::classify::{classify_issue_type, WorkCategory};

/// Distinct resolved tickets, optionally only those assigned to `identity`.
fn distinct_tickets<'a>(
    rows: &'a [EnrichedCommit],
    reconciler: &NameReconciler,
    identity: Option<&str>,
) -> Vec<&'a IssueRecord> {
    let mut seen: HashSet<String> = HashSet::new();
    rows.iter()
        .filter_map(EnrichedCommit::resolved_issue)
        .filter(|i| identity.is_none_or(|id| reconciler.canonical_assignee(&i.assignee) == id))
        .filter(|i| seen.insert(i.key.clone()))
        .collect()
}

fn sorted_counts<K: Ord>(counts: BTreeMap<K, usize>) -> Vec<(K, usize)> {
    let mut out: Vec<(K, usize)> = counts.into_iter().collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

/// Ticket counts per issue type, most frequent first. Blank types are `"Unknown"`.
pub fn ticket_type_distribution(
    rows: &[EnrichedCommit],
    reconciler: &NameReconciler,
    identity: Option<&str>,
) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for issue in distinct_tickets(rows, reconciler, identity) {
        let t = issue.issue_type.trim();
        let t = if t.is_empty() { "Unknown" } else { t };
        *counts.entry(t.to_owned()).or_default() += 1;
    }
    sorted_counts(counts)
}

/// Ticket counts per work category, most frequent first.
pub fn category_distribution(
    rows: &[EnrichedCommit],
    reconciler: &NameReconciler,
    identity: Option<&str>,
) -> Vec<(WorkCategory, usize)> {
    let mut counts: BTreeMap<WorkCategory, usize> = BTreeMap::new();
    for issue in distinct_tickets(rows, reconciler, identity) {
        *counts.entry(classify_issue_type(&issue.issue_type)).or_default() += 1;
    }
    sorted_counts(counts)
}

/// Commit counts per project, optionally only commits by `identity`.
pub fn project_distribution(
    rows: &[EnrichedCommit],
    reconciler: &NameReconciler,
    identity: Option<&str>,
) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for row in rows.iter().filter(|r| !r.commit.short_id.trim().is_empty()) {
        if identity.is_some_and(|id| reconciler.canonical_author(&row.commit.author_name) != id) {
            continue;
        }
        *counts.entry(row.commit.project_name.clone()).or_default() += 1;
    }
    sorted_counts(counts)
}
