use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};
use csv::StringRecord;
use trailmark_common::{TrailmarkError, TrailmarkResult, TrackedState};

use crate::issues::models::IssueRecord;

pub(crate) const TIMING_PREFIX: &str = "jira_time_";

pub(crate) fn timing_column(state: &TrackedState) -> String {
    format!("{TIMING_PREFIX}{}", state.slug())
}

/// Timing cells for one issue: empty without a resolved issue, `"0"` for an absent timing.
pub(crate) fn timing_cells(issue: Option<&IssueRecord>, states: &[TrackedState]) -> Vec<String> {
    states
        .iter()
        .map(|state| match issue {
            Some(issue) if !issue.is_error() => issue
                .timing(&state.slug())
                .map(|e| e.to_string())
                .unwrap_or_else(|| "0".to_owned()),
            _ => String::new(),
        })
        .collect()
}

pub(crate) fn csv_error(e: csv::Error) -> TrailmarkError {
    TrailmarkError::Storage(e.to_string())
}

pub(crate) fn format_timestamp(ts: Option<&DateTime<FixedOffset>>) -> String {
    ts.map(|t| t.to_rfc3339()).unwrap_or_default()
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw.trim()).ok()
}

pub(crate) fn parse_points(raw: &str) -> f64 {
    raw.trim()
        .parse()
        .ok()
        .filter(|v: &f64| v.is_finite())
        .unwrap_or(0.0)
}

pub(crate) fn non_empty(raw: &str) -> Option<String> {
    let raw = raw.trim();
    (!raw.is_empty()).then(|| raw.to_owned())
}

/// Column lookup by header name.
pub(crate) struct HeaderIndex {
    columns: HashMap<String, usize>,
    timing_states: Vec<String>,
}

impl HeaderIndex {
    pub(crate) fn new(headers: &StringRecord) -> Self {
        let mut columns = HashMap::new();
        let mut timing_states = Vec::new();
        for (i, name) in headers.iter().enumerate() {
            let name = name.trim();
            if let Some(state) = name.strip_prefix(TIMING_PREFIX) {
                timing_states.push(state.to_owned());
            }
            columns.insert(name.to_owned(), i);
        }
        Self {
            columns,
            timing_states,
        }
    }

    pub(crate) fn require(&self, names: &[&str]) -> TrailmarkResult<()> {
        let missing: Vec<&str> = names
            .iter()
            .copied()
            .filter(|n| !self.columns.contains_key(*n))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(TrailmarkError::Validation(format!(
                "table is missing columns: {}",
                missing.join(", ")
            )))
        }
    }

    /// Cell by column name; empty when the column or cell is absent.
    pub(crate) fn get<'r>(&self, record: &'r StringRecord, name: &str) -> &'r str {
        self.columns
            .get(name)
            .and_then(|&i| record.get(i))
            .unwrap_or("")
    }

    /// State slugs of the `jira_time_*` columns, in header order.
    pub(crate) fn timing_states(&self) -> &[String] {
        &self.timing_states
    }
}
