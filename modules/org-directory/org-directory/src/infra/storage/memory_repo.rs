//! In-memory implementation of `DirectoryRepository`.
//!
//! The snapshot is built once from a dataset and never mutated, so it is
//! shared between concurrent queries without locking.

use std::collections::HashMap;

use async_trait::async_trait;
use org_directory_sdk::{Building, Organization};
use tracing::{debug, instrument};

use super::mapper::{OrganizationParts, hydrate_organizations};
use crate::domain::error::DomainError;
use crate::domain::filter::{OrganizationPredicate, matches_all};
use crate::domain::geo::LatitudeBand;
use crate::domain::hierarchy::{CategoryForest, OperationTypeRecord};
use crate::domain::repo::DirectoryRepository;
use crate::infra::dataset::DirectoryRows;

/// Hydrated directory contents ordered by identifier.
#[derive(Debug, Default)]
pub struct DirectorySnapshot {
    organizations: Vec<Organization>,
    buildings: Vec<Building>,
    /// Indices into `buildings`, ordered by latitude.
    by_latitude: Vec<usize>,
    operation_types: Vec<OperationTypeRecord>,
}

impl DirectorySnapshot {
    /// # Errors
    /// Returns `DomainError::Storage` when the rows reference missing
    /// buildings or operation types.
    pub fn from_rows(rows: DirectoryRows) -> Result<Self, DomainError> {
        let DirectoryRows {
            mut buildings,
            mut operation_types,
            mut organizations,
            phone_numbers,
            links,
        } = rows;

        buildings.sort_by_key(|b| b.id);
        operation_types.sort_by_key(|t| t.id);
        organizations.sort_by_key(|o| o.id);

        let forest = CategoryForest::build(operation_types.clone());
        let parts = OrganizationParts {
            buildings: buildings.iter().map(|b| (b.id, b.clone())).collect::<HashMap<_, _>>(),
            phone_numbers,
            links,
        };
        let organizations = hydrate_organizations(organizations, parts, &forest)?;

        let mut by_latitude: Vec<usize> = (0..buildings.len()).collect();
        by_latitude.sort_by(|&a, &b| buildings[a].latitude.total_cmp(&buildings[b].latitude));

        debug!(
            organizations = organizations.len(),
            buildings = buildings.len(),
            operation_types = operation_types.len(),
            "Built directory snapshot"
        );
        Ok(Self {
            organizations,
            buildings,
            by_latitude,
            operation_types,
        })
    }

    #[must_use]
    pub fn organization_count(&self) -> usize {
        self.organizations.len()
    }
}

pub struct InMemoryDirectoryRepository {
    snapshot: DirectorySnapshot,
}

impl InMemoryDirectoryRepository {
    #[must_use]
    pub fn new(snapshot: DirectorySnapshot) -> Self {
        Self { snapshot }
    }
}

#[async_trait]
impl DirectoryRepository for InMemoryDirectoryRepository {
    #[instrument(skip(self))]
    async fn get_organization(&self, id: i64) -> Result<Option<Organization>, DomainError> {
        let orgs = &self.snapshot.organizations;
        Ok(orgs
            .binary_search_by_key(&id, |o| o.id)
            .ok()
            .map(|idx| orgs[idx].clone()))
    }

    #[instrument(skip(self, predicates), fields(predicates = predicates.len()))]
    async fn list_organizations(
        &self,
        predicates: &[OrganizationPredicate],
    ) -> Result<Vec<Organization>, DomainError> {
        Ok(self
            .snapshot
            .organizations
            .iter()
            .filter(|o| matches_all(predicates, o))
            .cloned()
            .collect())
    }

    #[instrument(skip(self))]
    async fn get_building(&self, id: i64) -> Result<Option<Building>, DomainError> {
        let buildings = &self.snapshot.buildings;
        Ok(buildings
            .binary_search_by_key(&id, |b| b.id)
            .ok()
            .map(|idx| buildings[idx].clone()))
    }

    #[instrument(skip(self))]
    async fn list_buildings(&self) -> Result<Vec<Building>, DomainError> {
        Ok(self.snapshot.buildings.clone())
    }

    #[instrument(skip(self))]
    async fn list_buildings_in_latitude_band(
        &self,
        band: LatitudeBand,
    ) -> Result<Vec<Building>, DomainError> {
        let buildings = &self.snapshot.buildings;
        let order = &self.snapshot.by_latitude;

        let start = order.partition_point(|&idx| buildings[idx].latitude < band.min);
        let mut in_band: Vec<Building> = order[start..]
            .iter()
            .take_while(|&&idx| buildings[idx].latitude <= band.max)
            .map(|&idx| buildings[idx].clone())
            .collect();
        in_band.sort_by_key(|b| b.id);
        Ok(in_band)
    }

    #[instrument(skip(self))]
    async fn list_operation_types(&self) -> Result<Vec<OperationTypeRecord>, DomainError> {
        Ok(self.snapshot.operation_types.clone())
    }
}
