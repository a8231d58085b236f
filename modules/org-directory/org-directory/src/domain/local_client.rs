use async_trait::async_trait;
use org_directory_sdk::{
    Building, DirectoryError, OrgDirectoryClientV1, Organization, OrganizationFilter,
    ProximityQuery,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use super::repo::DirectoryRepository;
use super::service::Service;

/// In-process implementation of the public client trait.
pub struct LocalClient<R: DirectoryRepository> {
    service: Arc<Service<R>>,
}

impl<R: DirectoryRepository> LocalClient<R> {
    #[must_use]
    pub fn new(service: Arc<Service<R>>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<R: DirectoryRepository + 'static> OrgDirectoryClientV1 for LocalClient<R> {
    async fn get_organization(
        &self,
        cancel: &CancellationToken,
        id: i64,
    ) -> Result<Organization, DirectoryError> {
        self.service
            .get_organization(cancel, id)
            .await
            .map_err(Into::into)
    }

    async fn list_organizations(
        &self,
        cancel: &CancellationToken,
        filter: &OrganizationFilter,
    ) -> Result<Vec<Organization>, DirectoryError> {
        self.service
            .list_organizations(cancel, filter)
            .await
            .map_err(Into::into)
    }

    async fn search_by_operation_type(
        &self,
        cancel: &CancellationToken,
        pattern: Option<&str>,
    ) -> Result<Vec<Organization>, DirectoryError> {
        self.service
            .search_by_operation_type(cancel, pattern)
            .await
            .map_err(Into::into)
    }

    async fn search_nearby(
        &self,
        cancel: &CancellationToken,
        query: &ProximityQuery,
    ) -> Result<Vec<Organization>, DirectoryError> {
        self.service
            .search_nearby(cancel, query)
            .await
            .map_err(Into::into)
    }

    async fn get_building(
        &self,
        cancel: &CancellationToken,
        id: i64,
    ) -> Result<Building, DirectoryError> {
        self.service
            .get_building(cancel, id)
            .await
            .map_err(Into::into)
    }

    async fn list_buildings(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<Building>, DirectoryError> {
        self.service.list_buildings(cancel).await.map_err(Into::into)
    }
}
