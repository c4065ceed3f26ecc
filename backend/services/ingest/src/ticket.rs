use std::sync::LazyLock;

use regex::Regex;

static TICKET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z]{2,}-[0-9]+").expect("valid regex"));

/// First issue-tracker key in a commit title, e.g. `"Fix ABC-123 and DEF-456"` → `ABC-123`.
///
/// Case-sensitive: `abc-123` is not a reference.
pub fn extract_ticket(title: &str) -> Option<&str> {
    TICKET_RE.find(title).map(|m| m.as_str())
}

/// Project prefix of a ticket key (`"PMS-10"` → `"PMS"`).
pub fn project_key(ticket: &str) -> &str {
    ticket.split_once('-').map(|(p, _)| p).unwrap_or(ticket)
}

/// Restricts which extracted keys are looked up.
#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    allowed_projects: Vec<String>,
}

impl TicketFilter {
    /// An empty list allows every project.
    pub fn new(allowed_projects: Vec<String>) -> Self {
        Self { allowed_projects }
    }

    pub fn allows(&self, ticket: &str) -> bool {
        self.allowed_projects.is_empty()
            || self
                .allowed_projects
                .iter()
                .any(|p| p == project_key(ticket))
    }
}
