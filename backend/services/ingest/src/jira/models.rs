use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fields requested for every issue fetch, excluding the story-points custom field.
pub const ISSUE_FIELDS: &[&str] = &[
    "key", "assignee", "issuetype", "summary", "status", "created", "parent",
];

/// Parse a Jira timestamp. Jira uses offsets without a colon (`+0100`).
pub fn parse_jira_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
}

/// The authenticated account (`GET /rest/api/3/myself`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraUser {
    pub account_id: String,
    pub display_name: Option<String>,
    pub email_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraUserRef {
    pub display_name: Option<String>,
    pub account_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraNamed {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraParentRef {
    pub key: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JiraIssueFields {
    #[serde(default)]
    pub assignee: Option<JiraUserRef>,
    #[serde(default)]
    pub issuetype: Option<JiraNamed>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub status: Option<JiraNamed>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub parent: Option<JiraParentRef>,
    /// Everything else, including custom fields such as story points.
    #[serde(flatten)]
    pub custom: HashMap<String, Value>,
}

impl JiraIssueFields {
    /// Numeric value of a custom field; missing, null and non-numeric values are 0.
    pub fn number(&self, field: &str) -> f64 {
        self.custom.get(field).and_then(Value::as_f64).unwrap_or(0.0)
    }

    pub fn created_at(&self) -> Option<DateTime<FixedOffset>> {
        self.created.as_deref().and_then(parse_jira_timestamp)
    }

    pub fn assignee_name(&self) -> String {
        self.assignee
            .as_ref()
            .and_then(|a| a.display_name.clone())
            .unwrap_or_default()
    }

    pub fn type_name(&self) -> String {
        self.issuetype
            .as_ref()
            .map(|t| t.name.clone())
            .unwrap_or_default()
    }

    pub fn status_name(&self) -> String {
        self.status.as_ref().map(|s| s.name.clone()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraChangelogItem {
    pub field: String,
    #[serde(default)]
    pub from_string: Option<String>,
    #[serde(default)]
    pub to_string: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraChangelogEntry {
    #[serde(default)]
    pub id: Option<String>,
    pub created: String,
    #[serde(default)]
    pub items: Vec<JiraChangelogItem>,
}

/// Changelog embedded by `expand=changelog`; may hold only the first page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraChangelog {
    #[serde(default)]
    pub start_at: u32,
    #[serde(default)]
    pub max_results: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub histories: Vec<JiraChangelogEntry>,
}

impl JiraChangelog {
    pub fn is_truncated(&self) -> bool {
        (self.histories.len() as u32) < self.total
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraIssue {
    pub key: String,
    #[serde(default)]
    pub fields: JiraIssueFields,
    #[serde(default)]
    pub changelog: Option<JiraChangelog>,
}

/// One page of `GET /rest/api/3/issue/:key/changelog`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraChangelogPage {
    #[serde(default)]
    pub start_at: u32,
    #[serde(default)]
    pub max_results: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub is_last: Option<bool>,
    #[serde(default)]
    pub values: Vec<JiraChangelogEntry>,
}

/// One page of `GET /rest/api/3/search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraSearchPage {
    #[serde(default)]
    pub start_at: u32,
    #[serde(default)]
    pub max_results: u32,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub issues: Vec<JiraIssue>,
}
