//! Directory models shared by the module and its consumers.
//!
//! Every aggregate returned through the API is fully hydrated: an
//! `Organization` always carries its `Building`, its phone numbers and its
//! operation types (each with the ancestor chain in `parent`).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub id: i64,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneNumber {
    pub id: i64,
    /// Number in the national format of the configured region.
    pub number: String,
    pub organization_id: i64,
}

/// Category node. `parent` is populated up to the root of the category tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationType {
    pub id: i64,
    pub title: String,
    pub parent_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<Box<OperationType>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: i64,
    pub title: String,
    pub building: Building,
    pub phone_numbers: Vec<PhoneNumber>,
    pub operation_types: Vec<OperationType>,
}

/// Optional filters for listing organizations. All set filters must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationFilter {
    pub building_id: Option<i64>,
    /// Direct category link only; descendants are not included.
    pub operation_type_id: Option<i64>,
    /// Case-insensitive substring of the organization title.
    pub title: Option<String>,
}

impl OrganizationFilter {
    #[must_use]
    pub fn with_building(mut self, building_id: i64) -> Self {
        self.building_id = Some(building_id);
        self
    }

    #[must_use]
    pub fn with_operation_type(mut self, operation_type_id: i64) -> Self {
        self.operation_type_id = Some(operation_type_id);
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Circle on the map: organizations housed inside it are returned.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProximityQuery {
    pub center: GeoPoint,
    /// Radius in meters; the module default applies when absent.
    pub radius_meters: Option<f64>,
}

impl ProximityQuery {
    #[must_use]
    pub const fn new(center: GeoPoint) -> Self {
        Self {
            center,
            radius_meters: None,
        }
    }

    #[must_use]
    pub const fn with_radius(mut self, radius_meters: f64) -> Self {
        self.radius_meters = Some(radius_meters);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_builder_sets_every_field() {
        let filter = OrganizationFilter::default()
            .with_building(3)
            .with_operation_type(7)
            .with_title("river");

        assert_eq!(filter.building_id, Some(3));
        assert_eq!(filter.operation_type_id, Some(7));
        assert_eq!(filter.title.as_deref(), Some("river"));
    }

    #[test]
    fn operation_type_without_parent_omits_field() {
        let root = OperationType {
            id: 1,
            title: "Food".to_owned(),
            parent_id: None,
            parent: None,
        };

        let json = serde_json::to_value(&root).unwrap();
        assert!(json.get("parent").is_none());
        assert_eq!(json["parent_id"], serde_json::Value::Null);
    }
}
