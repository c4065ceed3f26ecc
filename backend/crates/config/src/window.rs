use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone};
use serde::{Deserialize, Serialize};
use trailmark_common::{TrailmarkError, TrailmarkResult};

/// Inclusive calendar-date range used to select commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub since: NaiveDate,
    pub until: NaiveDate,
}

impl DateWindow {
    pub fn new(since: NaiveDate, until: NaiveDate) -> TrailmarkResult<Self> {
        if since > until {
            return Err(TrailmarkError::Config(format!(
                "date window is empty: since {since} is after until {until}"
            )));
        }
        Ok(Self { since, until })
    }

    /// Whether the timestamp's calendar date, in its own offset, falls in the window.
    pub fn contains<Tz: TimeZone>(&self, ts: &DateTime<Tz>) -> bool {
        let date = ts.date_naive();
        date >= self.since && date <= self.until
    }

    /// Start of the API filter (UTC). Reaches back by the widest UTC offset so that
    /// commits on `since` in any local zone are returned; `contains` makes the exact cut.
    pub fn since_param(&self) -> String {
        let start = self.since.and_time(NaiveTime::MIN);
        let widened = start
            .checked_sub_signed(max_utc_offset())
            .unwrap_or(start);
        utc_param(widened)
    }

    /// End of the API filter (UTC), widened the same way past the last second of `until`.
    pub fn until_param(&self) -> String {
        let start = self.until.and_time(NaiveTime::MIN);
        let end = start
            .checked_add_signed(TimeDelta::days(1) - TimeDelta::seconds(1))
            .unwrap_or(start);
        let widened = end.checked_add_signed(max_utc_offset()).unwrap_or(end);
        utc_param(widened)
    }
}

/// Zone offsets run from UTC-12:00 to UTC+14:00.
fn max_utc_offset() -> TimeDelta {
    TimeDelta::hours(14)
}

fn utc_param(at: NaiveDateTime) -> String {
    format!("{}Z", at.format("%Y-%m-%dT%H:%M:%S"))
}

impl Default for DateWindow {
    fn default() -> Self {
        Self {
            since: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or(NaiveDate::MIN),
            until: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap_or(NaiveDate::MIN),
        }
    }
}

pub fn parse_date(key: &str, raw: &str) -> TrailmarkResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| TrailmarkError::Config(format!("invalid {key} '{raw}': {e}")))
}
