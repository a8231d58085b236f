//! `OrgDirectoryClientV1` trait definition.
//!
//! This trait defines the public, read-only API of the org-directory module
//! (Version 1). Parameters are expected to be parsed and type-checked by the
//! caller; range checks (coordinates, radius) are still enforced here.
//! Every method takes a `CancellationToken`: once it fires, outstanding
//! storage calls are abandoned and `DirectoryError::Cancelled` is returned.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::errors::DirectoryError;
use crate::models::{Building, Organization, OrganizationFilter, ProximityQuery};

#[async_trait]
pub trait OrgDirectoryClientV1: Send + Sync {
    /// Get a single organization by identifier.
    async fn get_organization(
        &self,
        cancel: &CancellationToken,
        id: i64,
    ) -> Result<Organization, DirectoryError>;

    /// List organizations matching every set filter, ordered by identifier.
    /// An empty filter lists every organization; no match is an empty list.
    async fn list_organizations(
        &self,
        cancel: &CancellationToken,
        filter: &OrganizationFilter,
    ) -> Result<Vec<Organization>, DirectoryError>;

    /// Organizations linked to any operation type whose title contains
    /// `pattern`, or to any descendant of such a type.
    /// Returns `DirectoryError::NoMatch` when nothing is found.
    async fn search_by_operation_type(
        &self,
        cancel: &CancellationToken,
        pattern: Option<&str>,
    ) -> Result<Vec<Organization>, DirectoryError>;

    /// Organizations housed in buildings within the query circle.
    /// Returns `DirectoryError::NoMatch` when nothing is found.
    async fn search_nearby(
        &self,
        cancel: &CancellationToken,
        query: &ProximityQuery,
    ) -> Result<Vec<Organization>, DirectoryError>;

    /// Get a single building by identifier.
    async fn get_building(
        &self,
        cancel: &CancellationToken,
        id: i64,
    ) -> Result<Building, DirectoryError>;

    /// List every building, ordered by identifier.
    async fn list_buildings(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<Building>, DirectoryError>;
}
