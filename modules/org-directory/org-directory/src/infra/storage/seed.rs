//! Loads a dataset into the relational store.

use anyhow::Context;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    QueryOrder, TransactionTrait,
};
use serde::Serialize;
use tracing::{info, instrument};

use super::entity::{
    BuildingEntity, OperationTypeEntity, OrganizationEntity, PhoneNumberEntity, building,
    operation_type, organization, organization_operation_type, phone_number,
};
use crate::domain::phone::PhoneNormalizer;
use crate::infra::dataset::{Dataset, DirectoryRows, KnownKeys};

// Keeps multi-row inserts under the SQLite bound-parameter limit.
const INSERT_BATCH: usize = 200;

/// Rows added by a seeding run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub operation_types: usize,
    pub buildings: usize,
    pub organizations: usize,
    pub phone_numbers: usize,
    pub links: usize,
}

impl SeedReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<&DirectoryRows> for SeedReport {
    fn from(rows: &DirectoryRows) -> Self {
        Self {
            operation_types: rows.operation_types.len(),
            buildings: rows.buildings.len(),
            organizations: rows.organizations.len(),
            phone_numbers: rows.phone_numbers.len(),
            links: rows.links.len(),
        }
    }
}

/// Adds the missing part of `dataset` to the database in one transaction.
/// Running it again with the same dataset adds nothing.
///
/// # Errors
/// Returns an error wrapping `DatasetError` for inconsistent datasets, or the
/// database error when reading or writing fails. Nothing is written then.
#[instrument(skip_all)]
pub async fn seed_database(
    db: &DatabaseConnection,
    dataset: &Dataset,
    phones: &PhoneNormalizer,
) -> anyhow::Result<SeedReport> {
    let txn = db.begin().await.context("failed to open seeding transaction")?;

    let known = load_known_keys(&txn).await?;
    let rows = dataset.resolve(&known, phones)?;
    let report = SeedReport::from(&rows);
    if report.is_empty() {
        info!("Directory dataset already present, nothing to seed");
        txn.rollback().await?;
        return Ok(report);
    }

    insert_batched(
        &txn,
        rows.operation_types.into_iter().map(|t| operation_type::ActiveModel {
            id: Set(t.id),
            title: Set(t.title),
            parent_id: Set(t.parent_id),
        }),
    )
    .await
    .context("failed to insert operation types")?;

    insert_batched(
        &txn,
        rows.buildings.into_iter().map(|b| building::ActiveModel {
            id: Set(b.id),
            address: Set(b.address),
            latitude: Set(b.latitude),
            longitude: Set(b.longitude),
        }),
    )
    .await
    .context("failed to insert buildings")?;

    insert_batched(
        &txn,
        rows.organizations.into_iter().map(|o| organization::ActiveModel {
            id: Set(o.id),
            title: Set(o.title),
            building_id: Set(o.building_id),
        }),
    )
    .await
    .context("failed to insert organizations")?;

    insert_batched(
        &txn,
        rows.phone_numbers.into_iter().map(|p| phone_number::ActiveModel {
            id: Set(p.id),
            number: Set(p.number),
            organization_id: Set(p.organization_id),
        }),
    )
    .await
    .context("failed to insert phone numbers")?;

    insert_batched(
        &txn,
        rows.links
            .into_iter()
            .map(|l| organization_operation_type::ActiveModel {
                organization_id: Set(l.organization_id),
                operation_type_id: Set(l.operation_type_id),
            }),
    )
    .await
    .context("failed to insert operation type links")?;

    txn.commit().await.context("failed to commit seeding transaction")?;

    info!(
        operation_types = report.operation_types,
        buildings = report.buildings,
        organizations = report.organizations,
        phone_numbers = report.phone_numbers,
        links = report.links,
        "Seeded directory dataset"
    );
    Ok(report)
}

async fn load_known_keys<C: ConnectionTrait>(conn: &C) -> anyhow::Result<KnownKeys> {
    let buildings = BuildingEntity::find().all(conn).await?;
    let operation_types = OperationTypeEntity::find().all(conn).await?;
    let organizations = OrganizationEntity::find().all(conn).await?;
    let last_phone = PhoneNumberEntity::find()
        .order_by_desc(phone_number::Column::Id)
        .one(conn)
        .await?;

    Ok(KnownKeys {
        buildings: buildings.into_iter().map(|m| (m.address, m.id)).collect(),
        operation_types: operation_types.into_iter().map(|m| (m.title, m.id)).collect(),
        organizations: organizations.into_iter().map(|m| (m.title, m.id)).collect(),
        last_phone_number_id: last_phone.map_or(0, |m| m.id),
    })
}

async fn insert_batched<A, C>(conn: &C, models: impl IntoIterator<Item = A>) -> anyhow::Result<()>
where
    A: ActiveModelTrait,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    C: ConnectionTrait,
{
    let mut models = models.into_iter().peekable();
    while models.peek().is_some() {
        let batch: Vec<A> = models.by_ref().take(INSERT_BATCH).collect();
        <A::Entity as EntityTrait>::insert_many(batch)
            .exec_without_returning(conn)
            .await?;
    }
    Ok(())
}
