//! Initial migration for the org directory tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[allow(elided_lifetimes_in_paths)]
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Building::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Building::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Building::Address)
                            .text()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Building::Latitude).double().not_null())
                    .col(ColumnDef::new(Building::Longitude).double().not_null())
                    .to_owned(),
            )
            .await?;

        // Proximity searches prefilter on a latitude band
        manager
            .create_index(
                Index::create()
                    .name("idx_building_latitude")
                    .table(Building::Table)
                    .col(Building::Latitude)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OperationType::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OperationType::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(OperationType::Title)
                            .text()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(OperationType::ParentId).big_integer())
                    .foreign_key(
                        ForeignKey::create()
                            .from(OperationType::Table, OperationType::ParentId)
                            .to(OperationType::Table, OperationType::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Organization::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Organization::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Organization::Title)
                            .text()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Organization::BuildingId)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Organization::Table, Organization::BuildingId)
                            .to(Building::Table, Building::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_organization_building")
                    .table(Organization::Table)
                    .col(Organization::BuildingId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PhoneNumber::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PhoneNumber::Id)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PhoneNumber::Number).text().not_null())
                    .col(
                        ColumnDef::new(PhoneNumber::OrganizationId)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(PhoneNumber::Table, PhoneNumber::OrganizationId)
                            .to(Organization::Table, Organization::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_phone_number_organization")
                    .table(PhoneNumber::Table)
                    .col(PhoneNumber::OrganizationId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OrganizationToOperationType::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrganizationToOperationType::OrganizationId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrganizationToOperationType::OperationTypeId)
                            .big_integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(OrganizationToOperationType::OrganizationId)
                            .col(OrganizationToOperationType::OperationTypeId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(
                                OrganizationToOperationType::Table,
                                OrganizationToOperationType::OrganizationId,
                            )
                            .to(Organization::Table, Organization::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(
                                OrganizationToOperationType::Table,
                                OrganizationToOperationType::OperationTypeId,
                            )
                            .to(OperationType::Table, OperationType::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Category searches look organizations up by operation type
        manager
            .create_index(
                Index::create()
                    .name("idx_organization_to_operation_type_type")
                    .table(OrganizationToOperationType::Table)
                    .col(OrganizationToOperationType::OperationTypeId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .table(OrganizationToOperationType::Table)
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(PhoneNumber::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Organization::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(OperationType::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Building::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Building {
    Table,
    Id,
    Address,
    Latitude,
    Longitude,
}

#[derive(DeriveIden)]
enum OperationType {
    Table,
    Id,
    Title,
    ParentId,
}

#[derive(DeriveIden)]
enum Organization {
    Table,
    Id,
    Title,
    BuildingId,
}

#[derive(DeriveIden)]
enum PhoneNumber {
    Table,
    Id,
    Number,
    OrganizationId,
}

#[derive(DeriveIden)]
enum OrganizationToOperationType {
    Table,
    OrganizationId,
    OperationTypeId,
}
