#![allow(clippy::unwrap_used, clippy::expect_used)]

//! `SeaORM` store and dataset seeding against in-memory `SQLite`

mod common;

use std::collections::BTreeSet;

use common::{
    BLUKHERA, HORNS_AND_HOOVES, LENINA, NEVSKY, RIVER_CAFE, empty_sqlite_repo, ids, phones,
    sample_dataset, seeded_sqlite_repo,
};
use org_directory::domain::filter::OrganizationPredicate;
use org_directory::domain::geo::LatitudeBand;
use org_directory::domain::repo::DirectoryRepository;
use org_directory::infra::dataset::{Dataset, DatasetError};
use org_directory::infra::storage::migrations::Migrator;
use org_directory::infra::storage::{SeedReport, seed_database};
use sea_orm_migration::MigratorTrait;
use tracing_test::traced_test;

#[tokio::test]
async fn test_seeding_reports_every_row() {
    let repo = empty_sqlite_repo().await;

    let report = seed_database(repo.connection(), &sample_dataset(), &phones())
        .await
        .unwrap();

    assert_eq!(
        report,
        SeedReport {
            operation_types: 10,
            buildings: 4,
            organizations: 5,
            phone_numbers: 4,
            links: 6,
        }
    );
    assert_eq!(repo.list_buildings().await.unwrap().len(), 4);
    assert_eq!(repo.list_operation_types().await.unwrap().len(), 10);
}

#[tokio::test]
async fn test_seeding_twice_adds_nothing() {
    let repo = seeded_sqlite_repo().await;

    let report = seed_database(repo.connection(), &sample_dataset(), &phones())
        .await
        .unwrap();

    assert!(report.is_empty());
    assert_eq!(repo.list_organizations(&[]).await.unwrap().len(), 5);
}

#[tokio::test]
async fn test_seeding_extends_existing_data_by_natural_key() {
    let repo = seeded_sqlite_repo().await;
    let extra = Dataset::from_json_str(
        r#"{
            "operation_types": { "Food": { "Coffee": {} } },
            "buildings": { "Lenina 1": { "lat": 0.0, "long": 0.0 } },
            "organizations": [
                { "title": "Bean There", "building": "Lenina 1",
                  "phone_numbers": ["+7 495 000-00-01"], "operation_types": ["Coffee", "Dairy"] },
                { "title": "Horns and Hooves", "building": "Nevsky 28" }
            ]
        }"#,
    )
    .unwrap();

    let report = seed_database(repo.connection(), &extra, &phones())
        .await
        .unwrap();
    assert_eq!(report.operation_types, 1);
    assert_eq!(report.buildings, 0);
    assert_eq!(report.organizations, 1);

    let orgs = repo.list_organizations(&[]).await.unwrap();
    let bean = orgs.iter().find(|o| o.title == "Bean There").unwrap();
    assert_eq!(bean.id, 6);
    // The known address keeps its stored coordinates
    assert_eq!(bean.building.id, LENINA);
    assert!((bean.building.latitude - 55.75).abs() < 1e-9);
    assert_eq!(bean.phone_numbers[0].id, 5);
    let coffee = bean
        .operation_types
        .iter()
        .find(|t| t.title == "Coffee")
        .unwrap();
    assert_eq!(coffee.parent.as_deref().unwrap().title, "Food");

    // Existing organizations are left untouched
    let horns = repo.get_organization(HORNS_AND_HOOVES).await.unwrap().unwrap();
    assert_eq!(horns.building.id, LENINA);
}

#[tokio::test]
async fn test_inconsistent_dataset_writes_nothing() {
    let repo = empty_sqlite_repo().await;
    let broken = Dataset::from_json_str(
        r#"{
            "operation_types": { "Food": {} },
            "buildings": { "Lenina 1": { "lat": 55.75, "long": 37.61 } },
            "organizations": [{ "title": "Ghost", "building": "Nowhere 0" }]
        }"#,
    )
    .unwrap();

    let err = seed_database(repo.connection(), &broken, &phones())
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<DatasetError>(),
        Some(DatasetError::UnknownBuilding { .. })
    ));
    assert!(repo.list_buildings().await.unwrap().is_empty());
    assert!(repo.list_operation_types().await.unwrap().is_empty());
}

#[tokio::test]
#[traced_test]
async fn test_seeding_is_logged() {
    let _repo = seeded_sqlite_repo().await;

    assert!(logs_contain("Seeded directory dataset"));
}

#[tokio::test]
async fn test_latitude_band_is_inclusive_and_ordered() {
    let repo = seeded_sqlite_repo().await;

    let band = LatitudeBand {
        min: 55.75,
        max: 59.9343,
    };
    let found = repo.list_buildings_in_latitude_band(band).await.unwrap();

    assert_eq!(
        found.iter().map(|b| b.id).collect::<Vec<_>>(),
        vec![BLUKHERA, LENINA, NEVSKY]
    );
}

#[tokio::test]
async fn test_predicates_translate_to_sql() {
    let repo = seeded_sqlite_repo().await;

    let orgs = repo
        .list_organizations(&[
            OrganizationPredicate::InBuilding(LENINA),
            OrganizationPredicate::title_contains("Sweet"),
        ])
        .await
        .unwrap();
    assert_eq!(ids(&orgs), vec![2]);

    let orgs = repo
        .list_organizations(&[OrganizationPredicate::title_contains("_")])
        .await
        .unwrap();
    assert!(orgs.is_empty());
}

#[tokio::test]
async fn test_id_sets_above_the_parameter_limit() {
    let repo = seeded_sqlite_repo().await;
    // SQLite refuses statements with more than 32766 bound parameters
    let buildings: BTreeSet<i64> = (NEVSKY..=40_000).collect();
    let operation_types: BTreeSet<i64> = (1..=40_000).collect();

    let orgs = repo
        .list_organizations(&[
            OrganizationPredicate::InAnyBuilding(buildings),
            OrganizationPredicate::LinkedToAny(operation_types),
        ])
        .await
        .unwrap();
    assert_eq!(ids(&orgs), vec![RIVER_CAFE]);

    let orgs = repo
        .list_organizations(&[OrganizationPredicate::LinkedToAny(
            (1_000..=40_000).collect(),
        )])
        .await
        .unwrap();
    assert!(orgs.is_empty());
}

#[tokio::test]
async fn test_migrations_can_run_twice() {
    let repo = empty_sqlite_repo().await;

    // Already applied migrations are skipped
    Migrator::up(repo.connection(), None)
        .await
        .unwrap();

    assert!(repo.list_buildings().await.unwrap().is_empty());
}
