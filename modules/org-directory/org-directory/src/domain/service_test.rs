#[cfg(test)]
mod tests {
    use super::super::*;
    use async_trait::async_trait;
    use org_directory_sdk::{
        Building, GeoPoint, NoMatchReason, OperationType, Organization, OrganizationFilter,
        PhoneNumber, ProximityQuery,
    };
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_util::sync::CancellationToken;

    use error::DomainError;
    use filter::{OrganizationPredicate, matches_all};
    use geo::LatitudeBand;
    use hierarchy::{CategoryForest, OperationTypeRecord};
    use service::{Service, ServiceConfig};

    // Mock repository evaluating predicates in memory and counting store calls
    #[derive(Default)]
    struct MockRepository {
        organizations: Vec<Organization>,
        buildings: Vec<Building>,
        operation_types: Vec<OperationTypeRecord>,
        calls: AtomicUsize,
        hang: bool,
    }

    impl MockRepository {
        async fn enter(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.hang {
                std::future::pending::<()>().await;
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl repo::DirectoryRepository for MockRepository {
        async fn get_organization(&self, id: i64) -> Result<Option<Organization>, DomainError> {
            self.enter().await;
            Ok(self.organizations.iter().find(|o| o.id == id).cloned())
        }

        async fn list_organizations(
            &self,
            predicates: &[OrganizationPredicate],
        ) -> Result<Vec<Organization>, DomainError> {
            self.enter().await;
            Ok(self
                .organizations
                .iter()
                .filter(|o| matches_all(predicates, o))
                .cloned()
                .collect())
        }

        async fn get_building(&self, id: i64) -> Result<Option<Building>, DomainError> {
            self.enter().await;
            Ok(self.buildings.iter().find(|b| b.id == id).cloned())
        }

        async fn list_buildings(&self) -> Result<Vec<Building>, DomainError> {
            self.enter().await;
            Ok(self.buildings.clone())
        }

        async fn list_buildings_in_latitude_band(
            &self,
            band: LatitudeBand,
        ) -> Result<Vec<Building>, DomainError> {
            self.enter().await;
            Ok(self
                .buildings
                .iter()
                .filter(|b| band.contains(b.latitude))
                .cloned()
                .collect())
        }

        async fn list_operation_types(&self) -> Result<Vec<OperationTypeRecord>, DomainError> {
            self.enter().await;
            Ok(self.operation_types.clone())
        }
    }

    fn building(id: i64, latitude: f64, longitude: f64) -> Building {
        Building {
            id,
            address: format!("Lenina {id}"),
            latitude,
            longitude,
        }
    }

    fn category(id: i64, title: &str, parent_id: Option<i64>) -> OperationTypeRecord {
        OperationTypeRecord {
            id,
            title: title.to_owned(),
            parent_id,
        }
    }

    fn organization(
        id: i64,
        title: &str,
        building: &Building,
        forest: &CategoryForest,
        types: &[i64],
    ) -> Organization {
        Organization {
            id,
            title: title.to_owned(),
            building: building.clone(),
            phone_numbers: vec![PhoneNumber {
                id,
                number: format!("8 (495) 000-00-0{id}"),
                organization_id: id,
            }],
            operation_types: types
                .iter()
                .filter_map(|t| forest.operation_type(*t))
                .collect::<Vec<OperationType>>(),
        }
    }

    /// Food(1) > Bakery(2), Food(1) > Dairy(3), Cars(4).
    /// Central (1) and Suburb (2, ~9 km north) are near; Far (3) is ~1000 km away.
    fn populated() -> MockRepository {
        let operation_types = vec![
            category(1, "Food", None),
            category(2, "Bakery", Some(1)),
            category(3, "Dairy", Some(1)),
            category(4, "Cars", None),
        ];
        let forest = CategoryForest::build(operation_types.clone());
        let central = building(1, 55.7500, 37.6100);
        let suburb = building(2, 55.8300, 37.6100);
        let far = building(3, 64.7500, 37.6100);

        let organizations = vec![
            organization(1, "Bread & Co", &central, &forest, &[2]),
            organization(2, "Milky Way", &suburb, &forest, &[3]),
            organization(3, "Auto Parts", &central, &forest, &[4]),
            organization(4, "Northern Bakery", &far, &forest, &[2]),
        ];

        MockRepository {
            organizations,
            buildings: vec![central, suburb, far],
            operation_types,
            ..MockRepository::default()
        }
    }

    fn service(repo: MockRepository) -> (Arc<MockRepository>, Service<MockRepository>) {
        let repo = Arc::new(repo);
        let service = Service::new(repo.clone(), ServiceConfig::default());
        (repo, service)
    }

    fn ids(orgs: &[Organization]) -> Vec<i64> {
        orgs.iter().map(|o| o.id).collect()
    }

    #[tokio::test]
    async fn test_get_organization_returns_hydrated_aggregate() {
        let (_, service) = service(populated());
        let cancel = CancellationToken::new();

        let org = service.get_organization(&cancel, 1).await.unwrap();

        assert_eq!(org.title, "Bread & Co");
        assert_eq!(org.building.id, 1);
        assert_eq!(org.phone_numbers.len(), 1);
        let bakery = &org.operation_types[0];
        assert_eq!(bakery.title, "Bakery");
        assert_eq!(bakery.parent.as_deref().map(|p| p.title.as_str()), Some("Food"));
    }

    #[tokio::test]
    async fn test_get_organization_not_found() {
        let (_, service) = service(populated());
        let cancel = CancellationToken::new();

        let err = service.get_organization(&cancel, 404).await.unwrap_err();

        assert!(matches!(
            err,
            DomainError::NotFound {
                entity: "Organization",
                id: 404
            }
        ));
    }

    #[tokio::test]
    async fn test_list_without_filters_returns_everything() {
        let (_, service) = service(populated());
        let cancel = CancellationToken::new();

        let orgs = service
            .list_organizations(&cancel, &OrganizationFilter::default())
            .await
            .unwrap();

        assert_eq!(ids(&orgs), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_list_combines_filters_with_and() {
        let (_, service) = service(populated());
        let cancel = CancellationToken::new();

        let filter = OrganizationFilter::default()
            .with_building(1)
            .with_operation_type(2);
        let orgs = service.list_organizations(&cancel, &filter).await.unwrap();
        assert_eq!(ids(&orgs), vec![1]);

        let filter = OrganizationFilter::default().with_title("BAKERY");
        let orgs = service.list_organizations(&cancel, &filter).await.unwrap();
        assert_eq!(ids(&orgs), vec![4]);
    }

    #[tokio::test]
    async fn test_list_operation_type_filter_is_direct_only() {
        let (_, service) = service(populated());
        let cancel = CancellationToken::new();

        // Food has no directly linked organization
        let filter = OrganizationFilter::default().with_operation_type(1);
        let orgs = service.list_organizations(&cancel, &filter).await.unwrap();

        assert!(orgs.is_empty());
    }

    #[tokio::test]
    async fn test_list_with_no_match_is_empty_success() {
        let (_, service) = service(populated());
        let cancel = CancellationToken::new();

        let filter = OrganizationFilter::default().with_title("zzz");
        let orgs = service.list_organizations(&cancel, &filter).await.unwrap();

        assert!(orgs.is_empty());
    }

    #[tokio::test]
    async fn test_search_by_operation_type_includes_descendants() {
        let (_, service) = service(populated());
        let cancel = CancellationToken::new();

        let orgs = service
            .search_by_operation_type(&cancel, Some("foo"))
            .await
            .unwrap();

        assert_eq!(ids(&orgs), vec![1, 2, 4]);
    }

    #[tokio::test]
    async fn test_search_by_operation_type_without_pattern_matches_all_linked() {
        let (_, service) = service(populated());
        let cancel = CancellationToken::new();

        let orgs = service.search_by_operation_type(&cancel, None).await.unwrap();

        assert_eq!(ids(&orgs), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_search_by_operation_type_reports_unknown_category() {
        let (_, service) = service(populated());
        let cancel = CancellationToken::new();

        let err = service
            .search_by_operation_type(&cancel, Some("Medicine"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DomainError::NoMatch {
                reason: NoMatchReason::NoCategoryMatched
            }
        ));
    }

    #[tokio::test]
    async fn test_search_by_operation_type_reports_category_without_organizations() {
        let mut repo = populated();
        repo.operation_types.push(category(5, "Pharmacy", None));
        let (_, service) = service(repo);
        let cancel = CancellationToken::new();

        let err = service
            .search_by_operation_type(&cancel, Some("pharm"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DomainError::NoMatch {
                reason: NoMatchReason::NoLinkedOrganizations
            }
        ));
    }

    #[tokio::test]
    async fn test_search_nearby_uses_radius() {
        let (_, service) = service(populated());
        let cancel = CancellationToken::new();
        let center = GeoPoint::new(55.7500, 37.6100);

        let close = ProximityQuery::new(center).with_radius(1_000.0);
        let orgs = service.search_nearby(&cancel, &close).await.unwrap();
        assert_eq!(ids(&orgs), vec![1, 3]);

        let wider = ProximityQuery::new(center).with_radius(10_000.0);
        let orgs = service.search_nearby(&cancel, &wider).await.unwrap();
        assert_eq!(ids(&orgs), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_search_nearby_applies_default_radius() {
        let (_, service) = service(populated());
        let cancel = CancellationToken::new();

        let query = ProximityQuery::new(GeoPoint::new(55.7500, 37.6100));
        let orgs = service.search_nearby(&cancel, &query).await.unwrap();

        // 100 km default reaches the suburb but not the far building
        assert_eq!(ids(&orgs), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_search_nearby_reports_empty_area() {
        let (_, service) = service(populated());
        let cancel = CancellationToken::new();

        let query = ProximityQuery::new(GeoPoint::new(-33.86, 151.21)).with_radius(5_000.0);
        let err = service.search_nearby(&cancel, &query).await.unwrap_err();

        assert!(matches!(
            err,
            DomainError::NoMatch {
                reason: NoMatchReason::NoBuildingsInRange
            }
        ));
    }

    #[tokio::test]
    async fn test_search_nearby_reports_empty_buildings() {
        let mut repo = populated();
        repo.buildings.push(building(9, -33.86, 151.21));
        let (_, service) = service(repo);
        let cancel = CancellationToken::new();

        let query = ProximityQuery::new(GeoPoint::new(-33.86, 151.21)).with_radius(5_000.0);
        let err = service.search_nearby(&cancel, &query).await.unwrap_err();

        assert!(matches!(
            err,
            DomainError::NoMatch {
                reason: NoMatchReason::NoOrganizationsInRange
            }
        ));
    }

    #[tokio::test]
    async fn test_invalid_coordinates_never_reach_the_store() {
        let (repo, service) = service(populated());
        let cancel = CancellationToken::new();

        let bad_latitude = ProximityQuery::new(GeoPoint::new(90.5, 0.0));
        let err = service.search_nearby(&cancel, &bad_latitude).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation { field: "latitude", .. }));

        let negative = ProximityQuery::new(GeoPoint::new(0.0, 0.0)).with_radius(-5.0);
        let err = service.search_nearby(&cancel, &negative).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation { field: "radius_meters", .. }));

        assert_eq!(repo.calls(), 0);
    }

    #[tokio::test]
    async fn test_get_building_and_list_buildings() {
        let (_, service) = service(populated());
        let cancel = CancellationToken::new();

        let b = service.get_building(&cancel, 2).await.unwrap();
        assert_eq!(b.address, "Lenina 2");

        let all = service.list_buildings(&cancel).await.unwrap();
        assert_eq!(all.iter().map(|b| b.id).collect::<Vec<_>>(), vec![1, 2, 3]);

        let err = service.get_building(&cancel, 77).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "Building", .. }));
    }

    #[tokio::test]
    async fn test_cancelled_token_short_circuits() {
        let (_, service) = service(populated());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = service.list_buildings(&cancel).await.unwrap_err();

        assert!(matches!(err, DomainError::Cancelled));
    }

    #[tokio::test]
    async fn test_cancellation_abandons_pending_store_call() {
        let repo = MockRepository {
            hang: true,
            ..populated()
        };
        let (repo, service) = service(repo);
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            trigger.cancel();
        });

        let err = service
            .search_by_operation_type(&cancel, Some("Food"))
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Cancelled));
        assert_eq!(repo.calls(), 1);
    }
}
