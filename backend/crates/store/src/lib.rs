pub mod commits;
pub mod issues;
mod table;

pub use commits::models::{CommitRecord, CommitStats, EnrichedCommit};
pub use issues::models::{ElapsedTime, IssueRecord, StateTiming};
