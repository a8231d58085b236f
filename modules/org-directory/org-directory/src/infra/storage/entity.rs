//! `SeaORM` entities for the org directory.

pub use building::Entity as BuildingEntity;
pub use operation_type::Entity as OperationTypeEntity;
pub use organization::Entity as OrganizationEntity;
pub use organization_operation_type::Entity as OrganizationOperationTypeEntity;
pub use phone_number::Entity as PhoneNumberEntity;

/// Building entity module.
pub mod building {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "building")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: i64,
        #[sea_orm(unique)]
        pub address: String,
        pub latitude: f64,
        pub longitude: f64,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::organization::Entity")]
        Organizations,
    }

    impl Related<super::organization::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Organizations.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

/// Operation type (category) entity module. `parent_id` points at the same table.
pub mod operation_type {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "operation_type")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: i64,
        #[sea_orm(unique)]
        pub title: String,
        pub parent_id: Option<i64>,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "Entity",
            from = "Column::ParentId",
            to = "Column::Id",
            on_delete = "SetNull"
        )]
        Parent,
        #[sea_orm(has_many = "super::organization_operation_type::Entity")]
        OrganizationLinks,
    }

    impl Related<super::organization_operation_type::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::OrganizationLinks.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

/// Organization entity module.
pub mod organization {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "organization")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: i64,
        #[sea_orm(unique)]
        pub title: String,
        pub building_id: i64,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::building::Entity",
            from = "Column::BuildingId",
            to = "super::building::Column::Id"
        )]
        Building,
        #[sea_orm(has_many = "super::phone_number::Entity")]
        PhoneNumbers,
        #[sea_orm(has_many = "super::organization_operation_type::Entity")]
        OperationTypeLinks,
    }

    impl Related<super::building::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Building.def()
        }
    }

    impl Related<super::phone_number::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::PhoneNumbers.def()
        }
    }

    impl Related<super::organization_operation_type::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::OperationTypeLinks.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

/// Phone number entity module.
pub mod phone_number {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "phone_number")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: i64,
        pub number: String,
        pub organization_id: i64,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::organization::Entity",
            from = "Column::OrganizationId",
            to = "super::organization::Column::Id",
            on_delete = "Cascade"
        )]
        Organization,
    }

    impl Related<super::organization::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Organization.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

/// Organization to operation type link (many-to-many join table).
pub mod organization_operation_type {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "organization_to_operation_type")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub organization_id: i64,
        #[sea_orm(primary_key, auto_increment = false)]
        pub operation_type_id: i64,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::organization::Entity",
            from = "Column::OrganizationId",
            to = "super::organization::Column::Id",
            on_delete = "Cascade"
        )]
        Organization,
        #[sea_orm(
            belongs_to = "super::operation_type::Entity",
            from = "Column::OperationTypeId",
            to = "super::operation_type::Column::Id",
            on_delete = "Cascade"
        )]
        OperationType,
    }

    impl Related<super::organization::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Organization.def()
        }
    }

    impl Related<super::operation_type::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::OperationType.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}
