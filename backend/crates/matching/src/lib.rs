pub mod aliases;
pub mod config;
pub mod engine;
pub mod normalize;
pub mod trace;

pub use aliases::AliasTable;
pub use config::MatchingConfig;
pub use engine::NameReconciler;
pub use trace::{Resolution, ResolutionSource};
