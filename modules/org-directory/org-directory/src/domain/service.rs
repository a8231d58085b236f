use std::future::Future;
use std::sync::Arc;

use org_directory_sdk::{
    Building, NoMatchReason, Organization, OrganizationFilter, ProximityQuery,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use super::error::DomainError;
use super::filter::{OrganizationPredicate, OrganizationQuery};
use super::geo::ProximitySearch;
use super::hierarchy::CategoryForest;
use super::repo::DirectoryRepository;
use crate::config::OrgDirectoryConfig;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub default_radius_meters: f64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            default_radius_meters: 100_000.0,
        }
    }
}

impl From<&OrgDirectoryConfig> for ServiceConfig {
    fn from(cfg: &OrgDirectoryConfig) -> Self {
        Self {
            default_radius_meters: cfg.default_radius_meters,
        }
    }
}

/// Directory query service.
///
/// Stateless apart from the shared repository handle; every call is an
/// independent unit of work. Store calls are raced against the caller's
/// cancellation token.
pub struct Service<R: DirectoryRepository> {
    repo: Arc<R>,
    config: ServiceConfig,
}

impl<R: DirectoryRepository> Service<R> {
    #[must_use]
    pub fn new(repo: Arc<R>, config: ServiceConfig) -> Self {
        Self { repo, config }
    }

    /// # Errors
    /// `NotFound` for an unknown id, `Storage` or `Cancelled` from the store call.
    #[instrument(skip(self, cancel))]
    pub async fn get_organization(
        &self,
        cancel: &CancellationToken,
        id: i64,
    ) -> Result<Organization, DomainError> {
        debug!("Getting organization by id");

        let found = guarded(cancel, self.repo.get_organization(id)).await?;
        found.ok_or_else(|| DomainError::not_found("Organization", id))
    }

    /// Organizations matching every set filter. No match is an empty list.
    ///
    /// # Errors
    /// `Storage` or `Cancelled` from the store call.
    #[instrument(skip(self, cancel))]
    pub async fn list_organizations(
        &self,
        cancel: &CancellationToken,
        filter: &OrganizationFilter,
    ) -> Result<Vec<Organization>, DomainError> {
        let query = OrganizationQuery::from_filter(filter);
        debug!(predicates = query.predicates().len(), "Listing organizations");

        let orgs = guarded(cancel, self.repo.list_organizations(query.predicates())).await?;

        debug!("Listed {} organizations", orgs.len());
        Ok(orgs)
    }

    /// Organizations linked to any category whose title contains `pattern`
    /// or to any of their descendants. An absent pattern matches every category.
    ///
    /// # Errors
    /// `NoMatch` when no category matches or no organization is linked to the
    /// resolved categories.
    #[instrument(skip(self, cancel))]
    pub async fn search_by_operation_type(
        &self,
        cancel: &CancellationToken,
        pattern: Option<&str>,
    ) -> Result<Vec<Organization>, DomainError> {
        let records = guarded(cancel, self.repo.list_operation_types()).await?;
        let forest = CategoryForest::build(records);

        let Some(closure) = forest.resolve_pattern(pattern.unwrap_or_default()) else {
            debug!(categories = forest.len(), "No operation type matches the pattern");
            return Err(DomainError::no_match(NoMatchReason::NoCategoryMatched));
        };
        debug!(closure = closure.len(), "Resolved operation type closure");

        let predicates = [OrganizationPredicate::LinkedToAny(closure)];
        let orgs = guarded(cancel, self.repo.list_organizations(&predicates)).await?;
        if orgs.is_empty() {
            return Err(DomainError::no_match(NoMatchReason::NoLinkedOrganizations));
        }

        debug!("Found {} organizations by operation type", orgs.len());
        Ok(orgs)
    }

    /// Organizations housed within the query circle. Coordinates are
    /// validated before the store is touched.
    ///
    /// # Errors
    /// `Validation` for out-of-range coordinates or a negative radius,
    /// `NoMatch` when the circle holds no building or no organization.
    #[instrument(skip(self, cancel))]
    pub async fn search_nearby(
        &self,
        cancel: &CancellationToken,
        query: &ProximityQuery,
    ) -> Result<Vec<Organization>, DomainError> {
        let radius = query
            .radius_meters
            .unwrap_or(self.config.default_radius_meters);
        let search = ProximitySearch::new(query.center, radius)?;

        let candidates = guarded(
            cancel,
            self.repo.list_buildings_in_latitude_band(search.band()),
        )
        .await?;
        let building_ids = search.select(&candidates);
        debug!(
            candidates = candidates.len(),
            in_range = building_ids.len(),
            "Selected buildings in range"
        );
        if building_ids.is_empty() {
            return Err(DomainError::no_match(NoMatchReason::NoBuildingsInRange));
        }

        let predicates = [OrganizationPredicate::InAnyBuilding(building_ids)];
        let orgs = guarded(cancel, self.repo.list_organizations(&predicates)).await?;
        if orgs.is_empty() {
            return Err(DomainError::no_match(NoMatchReason::NoOrganizationsInRange));
        }

        debug!("Found {} organizations nearby", orgs.len());
        Ok(orgs)
    }

    /// # Errors
    /// `NotFound` for an unknown id.
    #[instrument(skip(self, cancel))]
    pub async fn get_building(
        &self,
        cancel: &CancellationToken,
        id: i64,
    ) -> Result<Building, DomainError> {
        let found = guarded(cancel, self.repo.get_building(id)).await?;
        found.ok_or_else(|| DomainError::not_found("Building", id))
    }

    /// # Errors
    /// `Storage` or `Cancelled` from the store call.
    #[instrument(skip(self, cancel))]
    pub async fn list_buildings(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<Building>, DomainError> {
        guarded(cancel, self.repo.list_buildings()).await
    }
}

/// Runs a store call unless the token fires first.
async fn guarded<T, F>(cancel: &CancellationToken, call: F) -> Result<T, DomainError>
where
    F: Future<Output = Result<T, DomainError>>,
{
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(DomainError::Cancelled),
        res = call => res,
    }
}
