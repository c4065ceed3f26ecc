/// Build the JQL for the assignee export.
///
/// Generates: `assignee = "Lee, Ann, Acme" AND status = "Done"`
pub fn build_assignee_jql(assignee: &str, status: &str) -> String {
    format!(
        "assignee = {} AND status = {}",
        quote_jql_value(assignee),
        quote_jql_value(status)
    )
}

/// Quote a JQL string literal, escaping backslashes and double quotes.
fn quote_jql_value(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}
