use chrono::{DateTime, FixedOffset};
use trailmark_common::TrackedState;
use trailmark_store::{ElapsedTime, StateTiming};

use crate::jira::models::{parse_jira_timestamp, JiraChangelogEntry};

/// One status change taken from an issue's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTransition {
    pub from: Option<String>,
    pub to: Option<String>,
    pub at: DateTime<FixedOffset>,
}

/// Status changes in timestamp order. Other fields and unparseable timestamps are dropped.
pub fn status_transitions(history: &[JiraChangelogEntry]) -> Vec<StatusTransition> {
    let mut transitions: Vec<StatusTransition> = history
        .iter()
        .filter_map(|entry| parse_jira_timestamp(&entry.created).map(|at| (entry, at)))
        .flat_map(|(entry, at)| {
            entry
                .items
                .iter()
                .filter(|item| item.field.eq_ignore_ascii_case("status"))
                .map(move |item| StatusTransition {
                    from: item.from_string.clone(),
                    to: item.to_string.clone(),
                    at,
                })
        })
        .collect();

    transitions.sort_by_key(|t| t.at);
    transitions
}

/// Measures time spent in each tracked state.
///
/// Only the most recent entry into and exit from a state are used, so an
/// issue that re-enters a state reports the last stay only.
#[derive(Debug, Clone)]
pub struct StatusTimer {
    states: Vec<TrackedState>,
}

impl StatusTimer {
    pub fn new(states: Vec<TrackedState>) -> Self {
        Self { states }
    }

    pub fn measure(&self, history: &[JiraChangelogEntry]) -> Vec<StateTiming> {
        let transitions = status_transitions(history);
        self.states
            .iter()
            .map(|state| StateTiming {
                state: state.slug(),
                elapsed: time_in_state(&transitions, &state.status),
            })
            .collect()
    }
}

fn time_in_state(transitions: &[StatusTransition], status: &str) -> Option<ElapsedTime> {
    let entered = transitions
        .iter()
        .filter(|t| t.to.as_deref() == Some(status))
        .map(|t| t.at)
        .last()?;
    let left = transitions
        .iter()
        .filter(|t| t.from.as_deref() == Some(status))
        .map(|t| t.at)
        .last()?;
    ElapsedTime::from_delta(left - entered)
}
