use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use trailmark_matching::NameReconciler;
use trailmark_store::{EnrichedCommit, IssueRecord};

use crate::compute::{
    commits_per_story_point, commits_per_week, completion_rate, round1, round2,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateAverage {
    pub state: String,
    /// Mean hours over tickets with a measured timing; `None` when none has one.
    pub average_hours: Option<f64>,
    pub tickets: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserMetrics {
    pub identity: String,
    pub total_commits: usize,
    pub total_story_points: f64,
    pub commits_per_story_point: f64,
    pub commits_per_week: f64,
    pub completed_tickets: usize,
    pub total_tickets: usize,
    pub completion_rate: f64,
    pub projects: Vec<String>,
    pub state_hours: Vec<StateAverage>,
}

#[derive(Default)]
struct Bucket<'a> {
    commits: usize,
    projects: BTreeSet<&'a str>,
    tickets: BTreeMap<&'a str, &'a IssueRecord>,
}

/// Group joined rows by canonical identity and derive per-person metrics.
///
/// Commits are attributed through the canonical author, tickets through the
/// canonical assignee. A ticket referenced by several commits counts once.
/// Results are ordered by identity.
pub fn aggregate(rows: &[EnrichedCommit], reconciler: &NameReconciler) -> Vec<UserMetrics> {
    let mut buckets: BTreeMap<String, Bucket<'_>> = BTreeMap::new();

    for row in rows {
        let commit = &row.commit;
        let author = reconciler.canonical_author(&commit.author_name);
        if !author.is_empty() && !commit.short_id.trim().is_empty() {
            let bucket = buckets.entry(author).or_default();
            bucket.commits += 1;
            if !commit.project_name.is_empty() {
                bucket.projects.insert(commit.project_name.as_str());
            }
        }

        if let Some(issue) = row.resolved_issue() {
            let assignee = reconciler.canonical_assignee(&issue.assignee);
            if !assignee.is_empty() {
                buckets
                    .entry(assignee)
                    .or_default()
                    .tickets
                    .entry(issue.key.as_str())
                    .or_insert(issue);
            }
        }
    }

    let states = tracked_state_order(rows);

    buckets
        .into_iter()
        .map(|(identity, bucket)| build_metrics(identity, bucket, &states))
        .collect()
}

fn build_metrics(identity: String, bucket: Bucket<'_>, states: &[String]) -> UserMetrics {
    let tickets: Vec<&IssueRecord> = bucket.tickets.into_values().collect();

    let total_story_points: f64 = tickets.iter().map(|i| i.total_story_points()).sum();
    let completed_tickets = tickets.iter().filter(|i| i.is_done()).count();

    let created: Vec<_> = tickets.iter().filter_map(|i| i.created_at).collect();
    let span_days = match (created.iter().min(), created.iter().max()) {
        (Some(first), Some(last)) => Some((*last - *first).num_days()),
        _ => None,
    };

    let state_hours = states
        .iter()
        .map(|state| {
            let hours: Vec<f64> = tickets
                .iter()
                .filter_map(|i| i.timing(state))
                .map(|e| e.total_hours())
                .collect();
            StateAverage {
                state: state.clone(),
                average_hours: (!hours.is_empty())
                    .then(|| round2(hours.iter().sum::<f64>() / hours.len() as f64)),
                tickets: hours.len(),
            }
        })
        .collect();

    UserMetrics {
        identity,
        total_commits: bucket.commits,
        total_story_points,
        commits_per_story_point: round2(commits_per_story_point(bucket.commits, total_story_points)),
        commits_per_week: round2(commits_per_week(bucket.commits, span_days)),
        completed_tickets,
        total_tickets: tickets.len(),
        completion_rate: round1(completion_rate(completed_tickets, tickets.len())),
        projects: bucket.projects.into_iter().map(str::to_owned).collect(),
        state_hours,
    }
}

/// Timing states in the order they first appear on resolved issues.
fn tracked_state_order(rows: &[EnrichedCommit]) -> Vec<String> {
    let mut states: Vec<String> = Vec::new();
    for issue in rows.iter().filter_map(EnrichedCommit::resolved_issue) {
        for timing in &issue.timings {
            if !states.contains(&timing.state) {
                states.push(timing.state.clone());
            }
        }
    }
    states
}
