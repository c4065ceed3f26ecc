use std::fmt::{self, Write};

use chrono::NaiveDate;
use serde::Serialize;
use trailmark_common::{TrailmarkError, TrailmarkResult};
use trailmark_matching::{NameReconciler, Resolution, ResolutionSource};
use trailmark_metrics::{
    aggregate, author_activity, category_distribution, daily_commit_counts, project_distribution,
    ticket_type_distribution, AuthorActivity, UserMetrics,
};
use trailmark_store::EnrichedCommit;

#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    pub user: Option<String>,
    pub show_mapping: bool,
    pub activity: bool,
    pub days: usize,
    pub breakdown: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Count {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyCount {
    pub date: NaiveDate,
    pub commits: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breakdown {
    pub ticket_types: Vec<Count>,
    pub categories: Vec<Count>,
    pub projects: Vec<Count>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub users: Vec<UserMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping: Option<Vec<Resolution>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity: Option<Vec<AuthorActivity>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_commits: Option<Vec<DailyCount>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<Breakdown>,
}

fn counts<K: ToString>(pairs: Vec<(K, usize)>) -> Vec<Count> {
    pairs
        .into_iter()
        .map(|(name, count)| Count {
            name: name.to_string(),
            count,
        })
        .collect()
}

pub fn build_report(
    rows: &[EnrichedCommit],
    reconciler: &NameReconciler,
    options: &ReportOptions,
) -> TrailmarkResult<Report> {
    let identity = options
        .user
        .as_deref()
        .map(|user| reconciler.canonical_author(user));

    let mut users = aggregate(rows, reconciler);
    if let Some(id) = &identity {
        users.retain(|m| &m.identity == id);
        if users.is_empty() {
            return Err(TrailmarkError::Validation(format!(
                "no commits or tickets found for {id}"
            )));
        }
    }

    let mapping = options.show_mapping.then(|| reconciler.trace());

    let activity = options.activity.then(|| {
        let mut activity = author_activity(rows, reconciler);
        if let Some(id) = &identity {
            activity.retain(|a| &a.identity == id);
        }
        activity
    });

    let daily_commits = match (&identity, options.activity) {
        (Some(id), true) => Some(
            daily_commit_counts(rows, reconciler, id, options.days)
                .into_iter()
                .map(|(date, commits)| DailyCount { date, commits })
                .collect(),
        ),
        _ => None,
    };

    let breakdown = options.breakdown.then(|| {
        let id = identity.as_deref();
        Breakdown {
            ticket_types: counts(ticket_type_distribution(rows, reconciler, id)),
            categories: counts(
                category_distribution(rows, reconciler, id)
                    .into_iter()
                    .map(|(c, n)| (c.as_str(), n))
                    .collect(),
            ),
            projects: counts(project_distribution(rows, reconciler, id)),
        }
    });

    Ok(Report {
        users,
        mapping,
        activity,
        daily_commits,
        breakdown,
    })
}

fn hours_cell(hours: Option<f64>) -> String {
    hours.map(|h| format!("{h:.1}")).unwrap_or_else(|| "-".to_owned())
}

pub fn render_table(report: &Report) -> Result<String, fmt::Error> {
    let mut out = String::new();

    let states: Vec<&str> = report
        .users
        .first()
        .map(|u| u.state_hours.iter().map(|s| s.state.as_str()).collect())
        .unwrap_or_default();

    write!(
        out,
        "{:<32} {:>8} {:>9} {:>10} {:>10} {:>9} {:>7}",
        "identity", "commits", "points", "commits/sp", "commits/wk", "done", "done %"
    )?;
    for state in &states {
        write!(out, " {:>14}", format!("{state} h"))?;
    }
    writeln!(out, "  projects")?;

    for u in &report.users {
        write!(
            out,
            "{:<32} {:>8} {:>9} {:>10.2} {:>10.2} {:>9} {:>7.1}",
            u.identity,
            u.total_commits,
            u.total_story_points,
            u.commits_per_story_point,
            u.commits_per_week,
            format!("{}/{}", u.completed_tickets, u.total_tickets),
            u.completion_rate,
        )?;
        for s in &u.state_hours {
            write!(out, " {:>14}", hours_cell(s.average_hours))?;
        }
        writeln!(out, "  {}", u.projects.join(", "))?;
    }

    if let Some(mapping) = &report.mapping {
        writeln!(out, "\nName mapping")?;
        for r in mapping {
            let how = match &r.source {
                ResolutionSource::Alias { matched } => format!("alias of {matched}"),
                ResolutionSource::Similarity {
                    representative,
                    score,
                } => format!("similar to {representative} ({score:.1})"),
                ResolutionSource::Own => "own".to_owned(),
            };
            writeln!(out, "  {:<32} -> {:<32} [{how}]", r.raw, r.canonical)?;
        }
    }

    if let Some(activity) = &report.activity {
        writeln!(out, "\nCommit activity")?;
        writeln!(
            out,
            "  {:<32} {:>8} {:>11} {:>12}",
            "identity", "commits", "active days", "commits/day"
        )?;
        for a in activity {
            writeln!(
                out,
                "  {:<32} {:>8} {:>11} {:>12.2}",
                a.identity, a.total_commits, a.active_days, a.commits_per_active_day
            )?;
        }
    }

    if let Some(daily) = &report.daily_commits {
        writeln!(out, "\nDaily commits")?;
        for d in daily {
            writeln!(out, "  {}  {}", d.date, d.commits)?;
        }
    }

    if let Some(b) = &report.breakdown {
        for (title, rows) in [
            ("Ticket types", &b.ticket_types),
            ("Categories", &b.categories),
            ("Projects", &b.projects),
        ] {
            writeln!(out, "\n{title}")?;
            for c in rows {
                writeln!(out, "  {:<32} {:>6}", c.name, c.count)?;
            }
        }
    }

    Ok(out)
}
