//! `SeaORM` implementation of `DirectoryRepository`.

use std::collections::BTreeSet;

use async_trait::async_trait;
use org_directory_sdk::{Building, Organization, PhoneNumber};
use sea_orm::{
    ColumnTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder,
};
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info, instrument};

use super::entity::{
    BuildingEntity, OperationTypeEntity, OrganizationEntity, OrganizationOperationTypeEntity,
    PhoneNumberEntity, building, operation_type, organization, organization_operation_type,
    phone_number,
};
use super::mapper::{OrganizationParts, hydrate_organizations};
use super::migrations::Migrator;
use super::predicate::{ID_BATCH, PredicatePlan};
use crate::config::DatabaseConfig;
use crate::domain::error::DomainError;
use crate::domain::filter::OrganizationPredicate;
use crate::domain::geo::LatitudeBand;
use crate::domain::hierarchy::{CategoryForest, OperationTypeRecord};
use crate::domain::repo::DirectoryRepository;
use crate::infra::dataset::{OperationTypeLink, OrganizationRow};

/// Opens the connection pool and applies pending migrations when configured.
///
/// In-memory `SQLite` databases live as long as their connection, so the pool
/// is pinned to a single connection for them.
///
/// # Errors
/// Returns `DomainError::Storage` when the database is unreachable or a
/// migration fails.
pub async fn connect(cfg: &DatabaseConfig) -> Result<DatabaseConnection, DomainError> {
    let mut opts = ConnectOptions::new(cfg.dsn.clone());
    if is_memory_dsn(&cfg.dsn) {
        opts.max_connections(1).min_connections(1);
    } else {
        opts.max_connections(cfg.max_connections);
    }
    opts.sqlx_logging(false);

    let db = Database::connect(opts).await?;
    info!(backend = ?db.get_database_backend(), "Connected to directory database");

    if cfg.run_migrations {
        Migrator::up(&db, None).await?;
        debug!("Directory migrations applied");
    }
    Ok(db)
}

fn is_memory_dsn(dsn: &str) -> bool {
    dsn.starts_with("sqlite:") && (dsn.contains(":memory:") || dsn.contains("mode=memory"))
}

pub struct SeaOrmDirectoryRepository {
    db: DatabaseConnection,
}

impl SeaOrmDirectoryRepository {
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    async fn hydrate(
        &self,
        rows: Vec<organization::Model>,
    ) -> Result<Vec<Organization>, DomainError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let org_ids: Vec<i64> = rows.iter().map(|o| o.id).collect();
        let building_ids: Vec<i64> = rows
            .iter()
            .map(|o| o.building_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut parts = OrganizationParts::default();
        for chunk in building_ids.chunks(ID_BATCH) {
            let found = BuildingEntity::find()
                .filter(building::Column::Id.is_in(chunk.iter().copied()))
                .all(&self.db)
                .await?;
            parts
                .buildings
                .extend(found.into_iter().map(|m| (m.id, Building::from(m))));
        }
        for chunk in org_ids.chunks(ID_BATCH) {
            let phones = PhoneNumberEntity::find()
                .filter(phone_number::Column::OrganizationId.is_in(chunk.iter().copied()))
                .all(&self.db)
                .await?;
            parts
                .phone_numbers
                .extend(phones.into_iter().map(PhoneNumber::from));

            let links = OrganizationOperationTypeEntity::find()
                .filter(
                    organization_operation_type::Column::OrganizationId
                        .is_in(chunk.iter().copied()),
                )
                .all(&self.db)
                .await?;
            parts
                .links
                .extend(links.into_iter().map(OperationTypeLink::from));
        }

        let forest = CategoryForest::build(self.load_operation_types().await?);
        hydrate_organizations(
            rows.into_iter().map(OrganizationRow::from).collect(),
            parts,
            &forest,
        )
    }

    /// Applies the predicates kept out of the `WHERE` clause.
    async fn retain_matching(
        &self,
        mut rows: Vec<organization::Model>,
        predicates: &[&OrganizationPredicate],
    ) -> Result<Vec<organization::Model>, DomainError> {
        for predicate in predicates {
            match predicate {
                OrganizationPredicate::InBuilding(id) => rows.retain(|r| r.building_id == *id),
                OrganizationPredicate::InAnyBuilding(ids) => {
                    rows.retain(|r| ids.contains(&r.building_id));
                }
                OrganizationPredicate::LinkedTo(id) => {
                    let linked = self.linked_organization_ids(&[*id]).await?;
                    rows.retain(|r| linked.contains(&r.id));
                }
                OrganizationPredicate::LinkedToAny(ids) => {
                    let ids: Vec<i64> = ids.iter().copied().collect();
                    let linked = self.linked_organization_ids(&ids).await?;
                    rows.retain(|r| linked.contains(&r.id));
                }
                OrganizationPredicate::TitleContains(needle) => {
                    rows.retain(|r| r.title.to_lowercase().contains(needle.as_str()));
                }
            }
        }
        Ok(rows)
    }

    async fn linked_organization_ids(
        &self,
        operation_type_ids: &[i64],
    ) -> Result<BTreeSet<i64>, DomainError> {
        let mut linked = BTreeSet::new();
        for chunk in operation_type_ids.chunks(ID_BATCH) {
            let links = OrganizationOperationTypeEntity::find()
                .filter(
                    organization_operation_type::Column::OperationTypeId
                        .is_in(chunk.iter().copied()),
                )
                .all(&self.db)
                .await?;
            linked.extend(links.into_iter().map(|l| l.organization_id));
        }
        Ok(linked)
    }

    async fn load_operation_types(&self) -> Result<Vec<OperationTypeRecord>, DomainError> {
        let models = OperationTypeEntity::find()
            .order_by_asc(operation_type::Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(OperationTypeRecord::from).collect())
    }
}

#[async_trait]
impl DirectoryRepository for SeaOrmDirectoryRepository {
    #[instrument(skip(self))]
    async fn get_organization(&self, id: i64) -> Result<Option<Organization>, DomainError> {
        let Some(model) = OrganizationEntity::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };
        Ok(self.hydrate(vec![model]).await?.pop())
    }

    #[instrument(skip(self, predicates), fields(predicates = predicates.len()))]
    async fn list_organizations(
        &self,
        predicates: &[OrganizationPredicate],
    ) -> Result<Vec<Organization>, DomainError> {
        let plan = PredicatePlan::new(predicates, self.db.get_database_backend());
        let rows = OrganizationEntity::find()
            .filter(plan.condition())
            .order_by_asc(organization::Column::Id)
            .all(&self.db)
            .await?;
        debug!(
            rows = rows.len(),
            on_rows = plan.on_rows.len(),
            "Loaded organization rows"
        );
        let rows = self.retain_matching(rows, &plan.on_rows).await?;
        self.hydrate(rows).await
    }

    #[instrument(skip(self))]
    async fn get_building(&self, id: i64) -> Result<Option<Building>, DomainError> {
        let model = BuildingEntity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(Building::from))
    }

    #[instrument(skip(self))]
    async fn list_buildings(&self) -> Result<Vec<Building>, DomainError> {
        let models = BuildingEntity::find()
            .order_by_asc(building::Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Building::from).collect())
    }

    #[instrument(skip(self))]
    async fn list_buildings_in_latitude_band(
        &self,
        band: LatitudeBand,
    ) -> Result<Vec<Building>, DomainError> {
        let models = BuildingEntity::find()
            .filter(building::Column::Latitude.between(band.min, band.max))
            .order_by_asc(building::Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Building::from).collect())
    }

    #[instrument(skip(self))]
    async fn list_operation_types(&self) -> Result<Vec<OperationTypeRecord>, DomainError> {
        self.load_operation_types().await
    }
}
