//! Module declaration for the org directory.

use std::sync::Arc;

use anyhow::{Context, bail};
use org_directory_sdk::OrgDirectoryClientV1;
use sea_orm::DatabaseConnection;
use tracing::{debug, info};

use crate::config::{OrgDirectoryConfig, StorageConfig};
use crate::domain::local_client::LocalClient;
use crate::domain::phone::PhoneNormalizer;
use crate::domain::service::{Service, ServiceConfig};
use crate::infra::dataset::Dataset;
use crate::infra::storage::{
    InMemoryDirectoryRepository, SeaOrmDirectoryRepository, SeedReport, connect, seed_database,
};

/// Org directory module.
///
/// Owns the selected store and exposes it through [`OrgDirectoryClientV1`].
/// With the database store, `seed_file` (when set) is loaded after migrations;
/// with the memory store it is the whole content of the directory.
pub struct OrgDirectoryModule {
    client: Arc<dyn OrgDirectoryClientV1>,
    phones: PhoneNormalizer,
    db: Option<DatabaseConnection>,
    seeded: Option<SeedReport>,
}

impl OrgDirectoryModule {
    /// # Errors
    /// Fails on invalid configuration, an unreadable or inconsistent dataset,
    /// or when the database cannot be reached or migrated.
    pub async fn init(cfg: &OrgDirectoryConfig) -> anyhow::Result<Self> {
        info!("Initializing org_directory module");
        cfg.validate()?;
        debug!(
            default_radius_meters = cfg.default_radius_meters,
            phone_region = %cfg.phone_region,
            "Loaded org_directory config"
        );

        let phones = PhoneNormalizer::new(&cfg.phone_region)?;
        let service_cfg = ServiceConfig::from(cfg);

        let module = match &cfg.storage {
            StorageConfig::Database(db_cfg) => {
                let db = connect(db_cfg).await?;
                let seeded = match &cfg.seed_file {
                    Some(path) => {
                        let dataset = Dataset::from_path(path)?;
                        Some(seed_database(&db, &dataset, &phones).await?)
                    }
                    None => None,
                };

                let repo = Arc::new(SeaOrmDirectoryRepository::new(db.clone()));
                let service = Arc::new(Service::new(repo, service_cfg));
                Self {
                    client: Arc::new(LocalClient::new(service)),
                    phones,
                    db: Some(db),
                    seeded,
                }
            }
            StorageConfig::Memory => {
                let path = cfg
                    .seed_file
                    .as_deref()
                    .context("memory store requires a seed_file")?;
                let snapshot = Dataset::from_path(path)?.into_snapshot(&phones)?;
                info!(
                    organizations = snapshot.organization_count(),
                    "Loaded in-memory directory"
                );

                let repo = Arc::new(InMemoryDirectoryRepository::new(snapshot));
                let service = Arc::new(Service::new(repo, service_cfg));
                Self {
                    client: Arc::new(LocalClient::new(service)),
                    phones,
                    db: None,
                    seeded: None,
                }
            }
        };

        info!("Org directory module initialized");
        Ok(module)
    }

    #[must_use]
    pub fn client(&self) -> Arc<dyn OrgDirectoryClientV1> {
        Arc::clone(&self.client)
    }

    /// Rows added by the startup seeding run, if one happened.
    #[must_use]
    pub fn seeded(&self) -> Option<SeedReport> {
        self.seeded
    }

    /// Loads an additional dataset into the database store.
    ///
    /// # Errors
    /// Fails for the memory store, or as [`seed_database`] does.
    pub async fn seed(&self, dataset: &Dataset) -> anyhow::Result<SeedReport> {
        let Some(db) = &self.db else {
            bail!("the memory store is immutable; seeding requires the database store");
        };
        seed_database(db, dataset, &self.phones).await
    }
}
