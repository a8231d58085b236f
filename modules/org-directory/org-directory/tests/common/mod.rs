#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

//! Common test utilities for org-directory integration tests

use std::path::PathBuf;
use std::sync::Arc;

use org_directory::config::{DatabaseConfig, OrgDirectoryConfig, StorageConfig};
use org_directory::domain::phone::PhoneNormalizer;
use org_directory::infra::dataset::Dataset;
use org_directory::infra::storage::{SeaOrmDirectoryRepository, connect, seed_database};
use org_directory::{OrgDirectoryClientV1, OrgDirectoryModule, Organization};

// Identifiers assigned to the sample dataset (documents are resolved in key order).
pub const BLUKHERA: i64 = 1;
pub const EMPTY_WAREHOUSE: i64 = 2;
pub const LENINA: i64 = 3;
pub const NEVSKY: i64 = 4;

pub const TYRES: i64 = 3;
pub const FOOD: i64 = 6;
pub const MEAT: i64 = 10;

pub const HORNS_AND_HOOVES: i64 = 1;
pub const SWEET_CRUMB: i64 = 2;
pub const BANK_OF_RIVERS: i64 = 3;
pub const RIVER_CAFE: i64 = 4;
pub const TYRE_DEPOT: i64 = 5;

pub fn sample_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sample_data.json")
}

/// Cyrillic titles under the Russian section keys.
pub fn cyrillic_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/cyrillic_data.json")
}

pub fn sample_dataset() -> Dataset {
    Dataset::from_path(&sample_path()).unwrap()
}

pub fn phones() -> PhoneNormalizer {
    PhoneNormalizer::new("RU").unwrap()
}

pub fn memory_db_config() -> DatabaseConfig {
    DatabaseConfig {
        dsn: "sqlite::memory:".to_owned(),
        max_connections: 1,
        run_migrations: true,
    }
}

/// Migrated, empty in-memory `SQLite` store.
pub async fn empty_sqlite_repo() -> SeaOrmDirectoryRepository {
    SeaOrmDirectoryRepository::new(connect(&memory_db_config()).await.unwrap())
}

/// In-memory `SQLite` store seeded with the sample dataset.
pub async fn seeded_sqlite_repo() -> SeaOrmDirectoryRepository {
    let repo = empty_sqlite_repo().await;
    seed_database(repo.connection(), &sample_dataset(), &phones())
        .await
        .unwrap();
    repo
}

pub async fn module_seeded_from(storage: StorageConfig, seed_file: PathBuf) -> OrgDirectoryModule {
    let cfg = OrgDirectoryConfig {
        storage,
        seed_file: Some(seed_file),
        ..OrgDirectoryConfig::default()
    };
    OrgDirectoryModule::init(&cfg).await.unwrap()
}

pub async fn database_module() -> OrgDirectoryModule {
    module_seeded_from(StorageConfig::Database(memory_db_config()), sample_path()).await
}

pub async fn memory_module() -> OrgDirectoryModule {
    module_seeded_from(StorageConfig::Memory, sample_path()).await
}

/// Clients over both stores, labelled for assertion messages.
pub async fn clients() -> Vec<(&'static str, Arc<dyn OrgDirectoryClientV1>)> {
    clients_seeded_from(sample_path()).await
}

/// Clients over both stores seeded from the given dataset file.
pub async fn clients_seeded_from(
    seed_file: PathBuf,
) -> Vec<(&'static str, Arc<dyn OrgDirectoryClientV1>)> {
    let database =
        module_seeded_from(StorageConfig::Database(memory_db_config()), seed_file.clone()).await;
    let memory = module_seeded_from(StorageConfig::Memory, seed_file).await;
    vec![("database", database.client()), ("memory", memory.client())]
}

pub fn ids(orgs: &[Organization]) -> Vec<i64> {
    orgs.iter().map(|o| o.id).collect()
}
