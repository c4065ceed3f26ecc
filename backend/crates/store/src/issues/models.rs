use std::fmt;

use chrono::{DateTime, FixedOffset, TimeDelta};
use serde::{Deserialize, Serialize};

/// Status prefix marking an issue that could not be fetched.
pub const ERROR_STATUS_PREFIX: &str = "Error: ";

/// Whole days plus remaining whole hours spent in a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElapsedTime {
    pub days: i64,
    pub hours: i64,
}

impl ElapsedTime {
    /// Returns `None` for negative durations.
    pub fn from_delta(delta: TimeDelta) -> Option<Self> {
        if delta < TimeDelta::zero() {
            return None;
        }
        let days = delta.num_days();
        let rest = delta - TimeDelta::days(days);
        Some(Self {
            days,
            hours: rest.num_seconds() / 3600,
        })
    }

    pub fn total_hours(&self) -> f64 {
        (self.days * 24 + self.hours) as f64
    }

    /// Parse a `"<d> days, <h> hours"` cell. Empty and `"0"` cells are absent timings.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() || raw == "0" {
            return None;
        }
        let (days, hours) = raw.split_once(',')?;
        let days = days.trim().trim_end_matches("days").trim_end_matches("day");
        let hours = hours.trim().trim_end_matches("hours").trim_end_matches("hour");
        Some(Self {
            days: days.trim().parse().ok()?,
            hours: hours.trim().parse().ok()?,
        })
    }
}

impl fmt::Display for ElapsedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} days, {} hours", self.days, self.hours)
    }
}

/// Time spent in one tracked state, keyed by the state's slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTiming {
    pub state: String,
    pub elapsed: Option<ElapsedTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub key: String,
    pub assignee: String,
    pub issue_type: String,
    pub summary: String,
    pub status: String,
    pub created_at: Option<DateTime<FixedOffset>>,
    pub story_points: f64,
    pub parent_key: Option<String>,
    pub parent_type: String,
    pub parent_story_points: f64,
    pub timings: Vec<StateTiming>,
}

impl IssueRecord {
    /// Sentinel cached for a key whose fetch failed.
    pub fn error(key: &str, message: &str) -> Self {
        Self {
            key: key.to_owned(),
            assignee: String::new(),
            issue_type: String::new(),
            summary: String::new(),
            status: format!("{ERROR_STATUS_PREFIX}{message}"),
            created_at: None,
            story_points: 0.0,
            parent_key: None,
            parent_type: String::new(),
            parent_story_points: 0.0,
            timings: Vec::new(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.status.starts_with(ERROR_STATUS_PREFIX)
    }

    pub fn is_done(&self) -> bool {
        self.status == "Done"
    }

    /// Own points plus the parent's points.
    pub fn total_story_points(&self) -> f64 {
        self.story_points + self.parent_story_points
    }

    pub fn timing(&self, state: &str) -> Option<ElapsedTime> {
        self.timings
            .iter()
            .find(|t| t.state == state)
            .and_then(|t| t.elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_from_delta_splits_days_and_hours() {
        let delta = TimeDelta::days(2) + TimeDelta::hours(5) + TimeDelta::minutes(59);
        let e = ElapsedTime::from_delta(delta).unwrap();
        assert_eq!(e, ElapsedTime { days: 2, hours: 5 });
        assert_eq!(e.to_string(), "2 days, 5 hours");
        assert_eq!(e.total_hours(), 53.0);
    }

    #[test]
    fn elapsed_negative_is_absent() {
        assert!(ElapsedTime::from_delta(TimeDelta::hours(-1)).is_none());
    }

    #[test]
    fn elapsed_zero_is_present() {
        let e = ElapsedTime::from_delta(TimeDelta::zero()).unwrap();
        assert_eq!(e.to_string(), "0 days, 0 hours");
    }

    #[test]
    fn parse_reads_rendered_form() {
        assert_eq!(
            ElapsedTime::parse("3 days, 12 hours"),
            Some(ElapsedTime { days: 3, hours: 12 })
        );
        assert_eq!(
            ElapsedTime::parse(" 1 day, 1 hour "),
            Some(ElapsedTime { days: 1, hours: 1 })
        );
    }

    #[test]
    fn parse_treats_zero_and_garbage_as_absent() {
        assert_eq!(ElapsedTime::parse("0"), None);
        assert_eq!(ElapsedTime::parse(""), None);
        assert_eq!(ElapsedTime::parse("soon"), None);
        assert_eq!(ElapsedTime::parse("x days, 2 hours"), None);
    }

    #[test]
    fn error_record_is_flagged() {
        let issue = IssueRecord::error("PMS-404", "HTTP 404 Not Found");
        assert!(issue.is_error());
        assert_eq!(issue.status, "Error: HTTP 404 Not Found");
        assert_eq!(issue.total_story_points(), 0.0);
        assert!(!issue.is_done());
    }

    #[test]
    fn timing_lookup_by_state() {
        let mut issue = IssueRecord::error("A-1", "x");
        issue.timings = vec![
            StateTiming {
                state: "in_progress".to_string(),
                elapsed: Some(ElapsedTime { days: 1, hours: 0 }),
            },
            StateTiming {
                state: "blocked".to_string(),
                elapsed: None,
            },
        ];
        assert_eq!(issue.timing("in_progress"), Some(ElapsedTime { days: 1, hours: 0 }));
        assert_eq!(issue.timing("blocked"), None);
        assert_eq!(issue.timing("code_review"), None);
    }
}
