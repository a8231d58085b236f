//! Storage infrastructure for the org directory.

pub mod entity;
pub mod mapper;
pub mod memory_repo;
pub mod migrations;
pub mod predicate;
pub mod sea_orm_repo;
pub mod seed;

pub use memory_repo::{DirectorySnapshot, InMemoryDirectoryRepository};
pub use sea_orm_repo::{SeaOrmDirectoryRepository, connect};
pub use seed::{SeedReport, seed_database};
