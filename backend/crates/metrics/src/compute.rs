/// Commits per story point; zero points count as one.
pub fn commits_per_story_point(commits: usize, story_points: f64) -> f64 {
    commits as f64 / story_points.max(1.0)
}

/// Commits per week over the span between the first and last ticket creation.
///
/// Spans shorter than a week count as one week. Without a span, every commit
/// falls in a single week.
pub fn commits_per_week(commits: usize, span_days: Option<i64>) -> f64 {
    let weeks = match span_days {
        Some(days) => (days as f64 / 7.0).max(1.0),
        None => 1.0,
    };
    commits as f64 / weeks
}

/// Share of completed tickets as a percentage; no tickets yields 0.
pub fn completion_rate(completed: usize, total: usize) -> f64 {
    completed as f64 / total.max(1) as f64 * 100.0
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_points_divides_by_one() {
        assert_eq!(commits_per_story_point(7, 0.0), 7.0);
        assert_eq!(commits_per_story_point(7, 0.5), 7.0);
    }

    #[test]
    fn points_divide_commits() {
        assert_eq!(commits_per_story_point(3, 5.0), 0.6);
    }

    #[test]
    fn short_span_is_one_week() {
        assert_eq!(commits_per_week(12, Some(0)), 12.0);
        assert_eq!(commits_per_week(12, Some(6)), 12.0);
    }

    #[test]
    fn long_span_spreads_commits() {
        assert_eq!(commits_per_week(12, Some(28)), 3.0);
    }

    #[test]
    fn missing_span_returns_total() {
        assert_eq!(commits_per_week(5, None), 5.0);
    }

    #[test]
    fn completion_rate_bounds() {
        assert_eq!(completion_rate(0, 0), 0.0);
        assert_eq!(completion_rate(2, 2), 100.0);
        assert_eq!(round1(completion_rate(1, 3)), 33.3);
    }

    #[test]
    fn rounding() {
        assert_eq!(round2(0.666_666), 0.67);
        assert_eq!(round1(66.66), 66.7);
        assert_eq!(round2(2.0), 2.0);
    }
}
