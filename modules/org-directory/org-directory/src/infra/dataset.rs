//! Directory dataset documents.
//!
//! A dataset is a JSON document with three sections:
//!
//! ```json
//! {
//!   "operation_types": { "Food": { "Bakery": {}, "Dairy": null } },
//!   "buildings": { "Lenina 1": { "lat": 55.75, "long": 37.61 } },
//!   "organizations": [
//!     { "title": "Bread & Co", "building": "Lenina 1",
//!       "phone_numbers": ["+7 495 123-45-67"], "operation_types": ["Bakery"] }
//!   ]
//! }
//! ```
//!
//! Loading is get-or-create by natural key: operation types by title,
//! buildings by address, organizations by title. Entries already known to
//! the target store are reused; organizations that already exist are left
//! untouched, including their phone numbers and operation type links.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use org_directory_sdk::{Building, GeoPoint, PhoneNumber};
use serde::Deserialize;

use crate::domain::geo::validate_point;
use crate::domain::hierarchy::OperationTypeRecord;
use crate::domain::phone::PhoneNormalizer;
use crate::infra::storage::memory_repo::DirectorySnapshot;

#[derive(thiserror::Error, Debug)]
pub enum DatasetError {
    #[error("failed to read dataset '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed dataset: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("organization '{organization}' references unknown building '{address}'")]
    UnknownBuilding {
        organization: String,
        address: String,
    },

    #[error("organization '{organization}' references unknown operation type '{title}'")]
    UnknownOperationType {
        organization: String,
        title: String,
    },

    #[error("building '{address}' has invalid coordinates: {message}")]
    InvalidCoordinates { address: String, message: String },
}

/// Nested category titles. A leaf is either `{}` or `null`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct CategoryTree(pub BTreeMap<String, Option<CategoryTree>>);

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Coordinates {
    pub lat: f64,
    pub long: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrganizationEntry {
    pub title: String,
    /// Address of the housing building.
    pub building: String,
    #[serde(default)]
    pub phone_numbers: Vec<String>,
    /// Titles of the directly linked operation types.
    #[serde(default)]
    pub operation_types: Vec<String>,
}

/// Dataset document. Sections also accept their Russian keys
/// ("Виды деятельности", "Здания", "Организации").
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Dataset {
    #[serde(
        default,
        alias = "\u{0412}\u{0438}\u{0434}\u{044b} \u{0434}\u{0435}\u{044f}\u{0442}\u{0435}\u{043b}\u{044c}\u{043d}\u{043e}\u{0441}\u{0442}\u{0438}"
    )]
    pub operation_types: CategoryTree,
    #[serde(default, alias = "\u{0417}\u{0434}\u{0430}\u{043d}\u{0438}\u{044f}")]
    pub buildings: BTreeMap<String, Coordinates>,
    #[serde(
        default,
        alias = "\u{041e}\u{0440}\u{0433}\u{0430}\u{043d}\u{0438}\u{0437}\u{0430}\u{0446}\u{0438}\u{0438}"
    )]
    pub organizations: Vec<OrganizationEntry>,
}

/// Natural keys already present in the target store.
#[derive(Debug, Default)]
pub struct KnownKeys {
    pub buildings: HashMap<String, i64>,
    pub operation_types: HashMap<String, i64>,
    pub organizations: HashMap<String, i64>,
    pub last_phone_number_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationRow {
    pub id: i64,
    pub title: String,
    pub building_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct OperationTypeLink {
    pub organization_id: i64,
    pub operation_type_id: i64,
}

/// Flat directory rows, each list ordered by identifier.
#[derive(Debug, Clone, Default)]
pub struct DirectoryRows {
    pub buildings: Vec<Building>,
    pub operation_types: Vec<OperationTypeRecord>,
    pub organizations: Vec<OrganizationRow>,
    pub phone_numbers: Vec<PhoneNumber>,
    pub links: Vec<OperationTypeLink>,
}

impl DirectoryRows {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
            && self.operation_types.is_empty()
            && self.organizations.is_empty()
            && self.phone_numbers.is_empty()
            && self.links.is_empty()
    }
}

impl Dataset {
    /// # Errors
    /// Returns `DatasetError::Parse` for malformed JSON or unknown keys.
    pub fn from_json_str(json: &str) -> Result<Self, DatasetError> {
        Ok(serde_json::from_str(json)?)
    }

    /// # Errors
    /// Returns `DatasetError::Io` when the file cannot be read, or
    /// `DatasetError::Parse` when it is not a valid dataset.
    pub fn from_path(path: &Path) -> Result<Self, DatasetError> {
        let json = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Rows that must be added to a store already holding `known` so that it
    /// contains this dataset. Identifiers continue after the largest known one.
    ///
    /// # Errors
    /// Returns `DatasetError` for invalid coordinates or references to
    /// buildings and operation types that are neither in the dataset nor known.
    pub fn resolve(
        &self,
        known: &KnownKeys,
        phones: &PhoneNormalizer,
    ) -> Result<DirectoryRows, DatasetError> {
        let mut rows = DirectoryRows::default();
        let type_ids = self.resolve_operation_types(known, &mut rows);
        let building_ids = self.resolve_buildings(known, &mut rows)?;
        self.resolve_organizations(known, &type_ids, &building_ids, phones, &mut rows)?;
        rows.operation_types.sort_by_key(|r| r.id);
        Ok(rows)
    }

    /// Snapshot for the in-memory store.
    ///
    /// # Errors
    /// Returns the `DatasetError` from [`Dataset::resolve`].
    pub fn into_snapshot(self, phones: &PhoneNormalizer) -> anyhow::Result<DirectorySnapshot> {
        let rows = self.resolve(&KnownKeys::default(), phones)?;
        Ok(DirectorySnapshot::from_rows(rows)?)
    }

    fn resolve_operation_types(
        &self,
        known: &KnownKeys,
        rows: &mut DirectoryRows,
    ) -> HashMap<String, i64> {
        let mut type_ids = known.operation_types.clone();
        let mut next_type_id = next_id(&known.operation_types);
        // Preorder walk; children are pushed reversed to keep title order.
        let mut stack: Vec<(&str, Option<&CategoryTree>, Option<i64>)> = self
            .operation_types
            .0
            .iter()
            .rev()
            .map(|(title, children)| (title.as_str(), children.as_ref(), None))
            .collect();
        while let Some((title, children, parent_id)) = stack.pop() {
            let id = if let Some(&id) = type_ids.get(title) {
                id
            } else {
                let id = next_type_id;
                next_type_id += 1;
                type_ids.insert(title.to_owned(), id);
                rows.operation_types.push(OperationTypeRecord {
                    id,
                    title: title.to_owned(),
                    parent_id,
                });
                id
            };
            if let Some(children) = children {
                stack.extend(
                    children
                        .0
                        .iter()
                        .rev()
                        .map(|(title, grand)| (title.as_str(), grand.as_ref(), Some(id))),
                );
            }
        }
        type_ids
    }

    fn resolve_buildings(
        &self,
        known: &KnownKeys,
        rows: &mut DirectoryRows,
    ) -> Result<HashMap<String, i64>, DatasetError> {
        let mut building_ids = known.buildings.clone();
        let mut next_building_id = next_id(&known.buildings);
        for (address, coords) in &self.buildings {
            if building_ids.contains_key(address) {
                continue;
            }
            validate_point(GeoPoint::new(coords.lat, coords.long)).map_err(|e| {
                DatasetError::InvalidCoordinates {
                    address: address.clone(),
                    message: e.to_string(),
                }
            })?;
            let id = next_building_id;
            next_building_id += 1;
            building_ids.insert(address.clone(), id);
            rows.buildings.push(Building {
                id,
                address: address.clone(),
                latitude: coords.lat,
                longitude: coords.long,
            });
        }
        Ok(building_ids)
    }

    fn resolve_organizations(
        &self,
        known: &KnownKeys,
        type_ids: &HashMap<String, i64>,
        building_ids: &HashMap<String, i64>,
        phones: &PhoneNormalizer,
        rows: &mut DirectoryRows,
    ) -> Result<(), DatasetError> {
        let mut org_titles: BTreeSet<&str> =
            known.organizations.keys().map(String::as_str).collect();
        let mut next_org_id = next_id(&known.organizations);
        let mut next_phone_id = known.last_phone_number_id + 1;
        for entry in &self.organizations {
            if !org_titles.insert(entry.title.as_str()) {
                continue;
            }

            let building_id = *building_ids.get(&entry.building).ok_or_else(|| {
                DatasetError::UnknownBuilding {
                    organization: entry.title.clone(),
                    address: entry.building.clone(),
                }
            })?;
            let linked = entry
                .operation_types
                .iter()
                .map(|title| {
                    type_ids
                        .get(title)
                        .copied()
                        .ok_or_else(|| DatasetError::UnknownOperationType {
                            organization: entry.title.clone(),
                            title: title.clone(),
                        })
                })
                .collect::<Result<BTreeSet<i64>, _>>()?;

            let id = next_org_id;
            next_org_id += 1;
            rows.organizations.push(OrganizationRow {
                id,
                title: entry.title.clone(),
                building_id,
            });
            for raw in &entry.phone_numbers {
                rows.phone_numbers.push(PhoneNumber {
                    id: next_phone_id,
                    number: phones.normalize(raw),
                    organization_id: id,
                });
                next_phone_id += 1;
            }
            rows.links
                .extend(linked.into_iter().map(|operation_type_id| OperationTypeLink {
                    organization_id: id,
                    operation_type_id,
                }));
        }
        Ok(())
    }
}

fn next_id(known: &HashMap<String, i64>) -> i64 {
    known.values().copied().max().unwrap_or(0) + 1
}
