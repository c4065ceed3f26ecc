use std::env;
use std::path::PathBuf;

use serde::Serialize;
use trailmark_common::{TrailmarkError, TrailmarkResult, TrackedState};

use crate::window::{parse_date, DateWindow};

pub const DEFAULT_OUTPUT: &str = "gitlab_jira_data.csv";
pub const DEFAULT_WORKERS: usize = 10;
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 90.0;

/// Run options shared by the trailmark binaries.
///
/// Service credentials are read by each client's own config; this holds
/// everything else.
#[derive(Debug, Clone, Serialize)]
pub struct AppConfig {
    pub log_level: String,
    pub output_path: PathBuf,
    pub alias_file: Option<PathBuf>,
    pub workers: usize,
    pub window: DateWindow,
    pub tracked_states: Vec<TrackedState>,
    pub similarity_threshold: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            output_path: PathBuf::from(DEFAULT_OUTPUT),
            alias_file: None,
            workers: DEFAULT_WORKERS,
            window: DateWindow::default(),
            tracked_states: TrackedState::defaults(),
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    /// Loads `.env` file if present; every variable has a default.
    pub fn from_env() -> TrailmarkResult<Self> {
        // Best-effort .env load; ignore if missing
        let _ = dotenvy::dotenv();

        let defaults = DateWindow::default();
        let since = match get_opt("TRAILMARK_SINCE") {
            Some(raw) => parse_date("TRAILMARK_SINCE", &raw)?,
            None => defaults.since,
        };
        let until = match get_opt("TRAILMARK_UNTIL") {
            Some(raw) => parse_date("TRAILMARK_UNTIL", &raw)?,
            None => defaults.until,
        };

        let workers: usize = get_var_or("TRAILMARK_WORKERS", &DEFAULT_WORKERS.to_string())
            .parse()
            .map_err(|e| TrailmarkError::Config(format!("invalid TRAILMARK_WORKERS: {e}")))?;
        if workers == 0 {
            return Err(TrailmarkError::Config(
                "TRAILMARK_WORKERS must be at least 1".to_owned(),
            ));
        }

        let similarity_threshold: f64 = get_var_or(
            "TRAILMARK_SIMILARITY_THRESHOLD",
            &DEFAULT_SIMILARITY_THRESHOLD.to_string(),
        )
        .parse()
        .map_err(|e| {
            TrailmarkError::Config(format!("invalid TRAILMARK_SIMILARITY_THRESHOLD: {e}"))
        })?;
        if !(0.0..=100.0).contains(&similarity_threshold) {
            return Err(TrailmarkError::Config(format!(
                "TRAILMARK_SIMILARITY_THRESHOLD must be within 0..=100, got {similarity_threshold}"
            )));
        }

        let tracked_states = match get_opt("TRAILMARK_TRACKED_STATES") {
            Some(raw) => parse_tracked_states(&raw)?,
            None => TrackedState::defaults(),
        };

        Ok(Self {
            log_level: get_var_or("LOG_LEVEL", "info"),
            output_path: PathBuf::from(get_var_or("TRAILMARK_OUTPUT", DEFAULT_OUTPUT)),
            alias_file: get_opt("TRAILMARK_ALIAS_FILE").map(PathBuf::from),
            workers,
            window: DateWindow::new(since, until)?,
            tracked_states,
            similarity_threshold,
        })
    }
}

/// Parse `label=status` pairs separated by commas.
///
/// An entry without `=` uses the same text for label and status.
pub fn parse_tracked_states(raw: &str) -> TrailmarkResult<Vec<TrackedState>> {
    let mut states: Vec<TrackedState> = Vec::new();

    for entry in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (label, status) = match entry.split_once('=') {
            Some((label, status)) => (label.trim(), status.trim()),
            None => (entry, entry),
        };
        if label.is_empty() || status.is_empty() {
            return Err(TrailmarkError::Config(format!(
                "TRAILMARK_TRACKED_STATES entry '{entry}' needs both a label and a status"
            )));
        }

        let state = TrackedState::new(label, status);
        if state.slug().is_empty() {
            return Err(TrailmarkError::Config(format!(
                "TRAILMARK_TRACKED_STATES label '{label}' has no alphanumeric characters"
            )));
        }
        if states.iter().any(|s| s.slug() == state.slug()) {
            return Err(TrailmarkError::Config(format!(
                "TRAILMARK_TRACKED_STATES label '{label}' is listed twice"
            )));
        }
        states.push(state);
    }

    if states.is_empty() {
        return Err(TrailmarkError::Config(
            "TRAILMARK_TRACKED_STATES is set but lists no states".to_owned(),
        ));
    }

    Ok(states)
}

fn get_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn get_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}
