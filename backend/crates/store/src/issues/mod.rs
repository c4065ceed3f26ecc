pub mod csv_repository;
pub mod models;
pub mod repositories;
