//! Organization predicates and their composition.
//!
//! A query is a conjunction of predicates. Stores either translate the list
//! into their native condition (see `infra::storage::predicate`) or evaluate
//! it directly with [`OrganizationPredicate::matches`].

use std::collections::BTreeSet;

use org_directory_sdk::{Organization, OrganizationFilter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrganizationPredicate {
    /// Housed in this building.
    InBuilding(i64),
    /// Housed in any of these buildings.
    InAnyBuilding(BTreeSet<i64>),
    /// Directly linked to this operation type.
    LinkedTo(i64),
    /// Directly linked to any of these operation types.
    LinkedToAny(BTreeSet<i64>),
    /// Title contains the needle, ignoring case. The needle is stored lowercased.
    TitleContains(String),
}

impl OrganizationPredicate {
    #[must_use]
    pub fn title_contains(needle: &str) -> Self {
        Self::TitleContains(needle.to_lowercase())
    }

    #[must_use]
    pub fn matches(&self, org: &Organization) -> bool {
        match self {
            Self::InBuilding(id) => org.building.id == *id,
            Self::InAnyBuilding(ids) => ids.contains(&org.building.id),
            Self::LinkedTo(id) => org.operation_types.iter().any(|t| t.id == *id),
            Self::LinkedToAny(ids) => org.operation_types.iter().any(|t| ids.contains(&t.id)),
            Self::TitleContains(needle) => org.title.to_lowercase().contains(needle.as_str()),
        }
    }
}

/// Conjunction of predicates. An empty query matches every organization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrganizationQuery {
    predicates: Vec<OrganizationPredicate>,
}

impl OrganizationQuery {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the query for a caller-supplied filter. Blank titles are ignored.
    #[must_use]
    pub fn from_filter(filter: &OrganizationFilter) -> Self {
        let mut query = Self::new();
        if let Some(building_id) = filter.building_id {
            query = query.and(OrganizationPredicate::InBuilding(building_id));
        }
        if let Some(operation_type_id) = filter.operation_type_id {
            query = query.and(OrganizationPredicate::LinkedTo(operation_type_id));
        }
        if let Some(title) = filter.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            query = query.and(OrganizationPredicate::title_contains(title));
        }
        query
    }

    #[must_use]
    pub fn and(mut self, predicate: OrganizationPredicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    #[must_use]
    pub fn predicates(&self) -> &[OrganizationPredicate] {
        &self.predicates
    }

    #[must_use]
    pub fn is_unfiltered(&self) -> bool {
        self.predicates.is_empty()
    }

    #[must_use]
    pub fn matches(&self, org: &Organization) -> bool {
        matches_all(&self.predicates, org)
    }
}

#[must_use]
pub fn matches_all(predicates: &[OrganizationPredicate], org: &Organization) -> bool {
    predicates.iter().all(|p| p.matches(org))
}
