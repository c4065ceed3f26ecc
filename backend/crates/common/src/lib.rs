pub mod error;
pub mod types;

pub use error::{TrailmarkError, TrailmarkResult};
pub use types::{RunInfo, TrackedState};
