pub mod client;
pub mod export;
pub mod models;
pub mod query;
pub mod resolver;
