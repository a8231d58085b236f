use async_trait::async_trait;
use org_directory_sdk::{Building, Organization};

use super::error::DomainError;
use super::filter::OrganizationPredicate;
use super::geo::LatitudeBand;
use super::hierarchy::OperationTypeRecord;

/// Read-only access to the directory entity graph.
///
/// Contract shared by all implementations:
/// - every returned `Organization` is fully hydrated (building, phone
///   numbers, operation types with their ancestor chains);
/// - results are ordered by ascending identifier;
/// - no method has side effects.
#[async_trait]
pub trait DirectoryRepository: Send + Sync {
    async fn get_organization(&self, id: i64) -> Result<Option<Organization>, DomainError>;

    /// Organizations satisfying every predicate. No predicates lists everything.
    async fn list_organizations(
        &self,
        predicates: &[OrganizationPredicate],
    ) -> Result<Vec<Organization>, DomainError>;

    async fn get_building(&self, id: i64) -> Result<Option<Building>, DomainError>;

    async fn list_buildings(&self) -> Result<Vec<Building>, DomainError>;

    /// Buildings whose latitude lies inside `band` (inclusive).
    async fn list_buildings_in_latitude_band(
        &self,
        band: LatitudeBand,
    ) -> Result<Vec<Building>, DomainError>;

    /// Flat operation type rows, used to build the category forest.
    async fn list_operation_types(&self) -> Result<Vec<OperationTypeRecord>, DomainError>;
}
