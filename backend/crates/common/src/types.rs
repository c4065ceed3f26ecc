use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies one invocation of a trailmark binary in logs and summaries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunInfo {
    pub service: String,
    pub version: String,
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
}

impl RunInfo {
    pub fn new(service: &str) -> Self {
        Self {
            service: service.to_owned(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
            run_id: Uuid::new_v4(),
            started_at: Utc::now(),
        }
    }
}

/// A workflow status whose dwell time is measured, with the label used in reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedState {
    pub label: String,
    pub status: String,
}

impl TrackedState {
    pub fn new(label: &str, status: &str) -> Self {
        Self {
            label: label.to_owned(),
            status: status.to_owned(),
        }
    }

    /// Column-safe identifier derived from the label: `"Code Review"` → `"code_review"`.
    pub fn slug(&self) -> String {
        let mut slug = String::with_capacity(self.label.len());
        for c in self.label.trim().chars() {
            if c.is_alphanumeric() {
                slug.extend(c.to_lowercase());
            } else if !slug.ends_with('_') && !slug.is_empty() {
                slug.push('_');
            }
        }
        slug.trim_end_matches('_').to_owned()
    }

    /// The three states measured by default.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new("In Progress", "In Progress"),
            Self::new("Blocked", "blocked (migrated)"),
            Self::new("Code Review", "code review"),
        ]
    }
}
