use trailmark_common::TrailmarkResult;

use crate::commits::models::EnrichedCommit;

pub trait EnrichedCommitRepository {
    /// Replace the stored table with `rows`. Returns the number of rows written.
    fn write_all(&self, rows: &[EnrichedCommit]) -> TrailmarkResult<usize>;

    /// Load every stored row in table order.
    fn read_all(&self) -> TrailmarkResult<Vec<EnrichedCommit>>;
}
