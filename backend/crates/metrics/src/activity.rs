use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;
use trailmark_matching::NameReconciler;
use trailmark_store::EnrichedCommit;

use crate::compute::round2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorActivity {
    pub identity: String,
    pub total_commits: usize,
    pub active_days: usize,
    pub commits_per_active_day: f64,
}

/// Commit volume per canonical author, busiest first.
pub fn author_activity(rows: &[EnrichedCommit], reconciler: &NameReconciler) -> Vec<AuthorActivity> {
    let mut per_author: BTreeMap<String, (usize, BTreeSet<NaiveDate>)> = BTreeMap::new();

    for row in rows.iter().filter(|r| !r.commit.short_id.trim().is_empty()) {
        let author = reconciler.canonical_author(&row.commit.author_name);
        if author.is_empty() {
            continue;
        }
        let entry = per_author.entry(author).or_default();
        entry.0 += 1;
        if let Some(ts) = row.commit.committed_at {
            entry.1.insert(ts.date_naive());
        }
    }

    let mut activity: Vec<AuthorActivity> = per_author
        .into_iter()
        .map(|(identity, (total_commits, days))| AuthorActivity {
            identity,
            total_commits,
            active_days: days.len(),
            commits_per_active_day: if days.is_empty() {
                0.0
            } else {
                round2(total_commits as f64 / days.len() as f64)
            },
        })
        .collect();

    activity.sort_by(|a, b| {
        b.commits_per_active_day
            .total_cmp(&a.commits_per_active_day)
            .then_with(|| a.identity.cmp(&b.identity))
    });
    activity
}

/// Commit counts per day for one identity, limited to the most recent `last_days` active days.
pub fn daily_commit_counts(
    rows: &[EnrichedCommit],
    reconciler: &NameReconciler,
    identity: &str,
    last_days: usize,
) -> Vec<(NaiveDate, usize)> {
    let mut counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for row in rows {
        let Some(ts) = row.commit.committed_at else {
            continue;
        };
        if reconciler.canonical_author(&row.commit.author_name) == identity {
            *counts.entry(ts.date_naive()).or_default() += 1;
        }
    }

    let skip = counts.len().saturating_sub(last_days);
    counts.into_iter().skip(skip).collect()
}
