pub mod activity;
pub mod aggregate;
pub mod breakdown;
pub mod classify;
pub mod compute;

pub use activity::{author_activity, daily_commit_counts, AuthorActivity};
pub use aggregate::{aggregate, StateAverage, UserMetrics};
pub use breakdown::{category_distribution, project_distribution, ticket_type_distribution};
pub use classify::WorkCategory;
