use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration for the org-directory module.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrgDirectoryConfig {
    /// Radius used by proximity search when the query does not set one.
    #[serde(default = "default_radius_meters")]
    pub default_radius_meters: f64,

    /// Region whose national format phone numbers are normalized to.
    #[serde(default = "default_phone_region")]
    pub phone_region: String,

    #[serde(default)]
    pub storage: StorageConfig,

    /// JSON dataset loaded once at startup.
    #[serde(default)]
    pub seed_file: Option<PathBuf>,
}

impl Default for OrgDirectoryConfig {
    fn default() -> Self {
        Self {
            default_radius_meters: default_radius_meters(),
            phone_region: default_phone_region(),
            storage: StorageConfig::default(),
            seed_file: None,
        }
    }
}

impl OrgDirectoryConfig {
    /// Checks values serde cannot express.
    ///
    /// # Errors
    /// Returns `ConfigError` for a negative or non-finite default radius, an
    /// empty phone region, or a memory store without a dataset file.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.default_radius_meters.is_finite() || self.default_radius_meters < 0.0 {
            return Err(ConfigError::Invalid {
                field: "default_radius_meters",
                message: format!(
                    "must be a finite, non-negative number of meters, got {}",
                    self.default_radius_meters
                ),
            });
        }
        if self.phone_region.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "phone_region",
                message: "must not be empty".to_owned(),
            });
        }
        if matches!(self.storage, StorageConfig::Memory) && self.seed_file.is_none() {
            return Err(ConfigError::Invalid {
                field: "seed_file",
                message: "the memory store requires a dataset file".to_owned(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StorageConfig {
    /// Relational store accessed through `SeaORM`.
    Database(DatabaseConfig),
    /// Immutable snapshot built from `seed_file`.
    Memory,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Database(DatabaseConfig::default())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_dsn")]
    pub dsn: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_run_migrations")]
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            dsn: default_dsn(),
            max_connections: default_max_connections(),
            run_migrations: default_run_migrations(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for '{field}': {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

fn default_radius_meters() -> f64 {
    100_000.0
}

fn default_phone_region() -> String {
    "RU".to_owned()
}

fn default_dsn() -> String {
    "sqlite::memory:".to_owned()
}

fn default_max_connections() -> u32 {
    8
}

fn default_run_migrations() -> bool {
    true
}
