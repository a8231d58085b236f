//! Row to aggregate mappers shared by both stores.

use std::collections::HashMap;

use anyhow::anyhow;
use org_directory_sdk::{Building, Organization, PhoneNumber};

use super::entity::{building, operation_type, organization, organization_operation_type, phone_number};
use crate::domain::error::DomainError;
use crate::domain::hierarchy::{CategoryForest, OperationTypeRecord};
use crate::infra::dataset::{OperationTypeLink, OrganizationRow};

impl From<building::Model> for Building {
    fn from(model: building::Model) -> Self {
        Self {
            id: model.id,
            address: model.address,
            latitude: model.latitude,
            longitude: model.longitude,
        }
    }
}

impl From<phone_number::Model> for PhoneNumber {
    fn from(model: phone_number::Model) -> Self {
        Self {
            id: model.id,
            number: model.number,
            organization_id: model.organization_id,
        }
    }
}

impl From<operation_type::Model> for OperationTypeRecord {
    fn from(model: operation_type::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            parent_id: model.parent_id,
        }
    }
}

impl From<organization::Model> for OrganizationRow {
    fn from(model: organization::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            building_id: model.building_id,
        }
    }
}

impl From<organization_operation_type::Model> for OperationTypeLink {
    fn from(model: organization_operation_type::Model) -> Self {
        Self {
            organization_id: model.organization_id,
            operation_type_id: model.operation_type_id,
        }
    }
}

/// Related rows of a batch of organizations.
#[derive(Debug, Default)]
pub struct OrganizationParts {
    pub buildings: HashMap<i64, Building>,
    pub phone_numbers: Vec<PhoneNumber>,
    pub links: Vec<OperationTypeLink>,
}

/// Assembles fully hydrated organizations, keeping the order of `rows`.
/// Phone numbers and operation types are ordered by identifier.
///
/// # Errors
/// Returns `DomainError::Storage` when a row references a building or an
/// operation type missing from `parts` or `forest`.
pub fn hydrate_organizations(
    rows: Vec<OrganizationRow>,
    mut parts: OrganizationParts,
    forest: &CategoryForest,
) -> Result<Vec<Organization>, DomainError> {
    parts.phone_numbers.sort_by_key(|p| p.id);
    let mut phones: HashMap<i64, Vec<PhoneNumber>> = HashMap::new();
    for phone in parts.phone_numbers {
        phones.entry(phone.organization_id).or_default().push(phone);
    }

    parts.links.sort_unstable();
    parts.links.dedup();
    let mut types: HashMap<i64, Vec<i64>> = HashMap::new();
    for link in &parts.links {
        types
            .entry(link.organization_id)
            .or_default()
            .push(link.operation_type_id);
    }

    rows.into_iter()
        .map(|row| {
            let building = parts.buildings.get(&row.building_id).cloned().ok_or_else(|| {
                DomainError::storage(anyhow!(
                    "organization {} references missing building {}",
                    row.id,
                    row.building_id
                ))
            })?;
            let operation_types = types
                .remove(&row.id)
                .unwrap_or_default()
                .into_iter()
                .map(|type_id| {
                    forest.operation_type(type_id).ok_or_else(|| {
                        DomainError::storage(anyhow!(
                            "organization {} references missing operation type {type_id}",
                            row.id
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            Ok(Organization {
                id: row.id,
                title: row.title,
                building,
                phone_numbers: phones.remove(&row.id).unwrap_or_default(),
                operation_types,
            })
        })
        .collect()
}
