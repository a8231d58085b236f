//! Proximity search over building coordinates.
//!
//! Distances are great-circle distances on a sphere with the mean Earth
//! radius. Stores prefilter candidates with a latitude band that contains
//! the whole search circle, then [`ProximitySearch::select`] applies the
//! exact, boundary-inclusive distance test.

use std::collections::BTreeSet;

use org_directory_sdk::{Building, GeoPoint};

use super::error::DomainError;

/// IUGG mean Earth radius.
pub const EARTH_MEAN_RADIUS_METERS: f64 = 6_371_008.8;

// Absorbs rounding in the band edges; the exact test runs afterwards anyway.
const BAND_SLACK_DEGREES: f64 = 1e-9;

/// Inclusive latitude range, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatitudeBand {
    pub min: f64,
    pub max: f64,
}

impl LatitudeBand {
    #[must_use]
    pub fn contains(&self, latitude: f64) -> bool {
        (self.min..=self.max).contains(&latitude)
    }
}

/// Validated search circle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximitySearch {
    center: GeoPoint,
    radius_meters: f64,
}

impl ProximitySearch {
    /// # Errors
    /// Returns `DomainError::Validation` when the center lies outside the
    /// coordinate ranges or the radius is negative or not finite.
    pub fn new(center: GeoPoint, radius_meters: f64) -> Result<Self, DomainError> {
        validate_point(center)?;
        if !radius_meters.is_finite() || radius_meters < 0.0 {
            return Err(DomainError::validation(
                "radius_meters",
                format!("must be a finite, non-negative number of meters, got {radius_meters}"),
            ));
        }
        Ok(Self {
            center,
            radius_meters,
        })
    }

    #[must_use]
    pub fn center(&self) -> GeoPoint {
        self.center
    }

    #[must_use]
    pub fn radius_meters(&self) -> f64 {
        self.radius_meters
    }

    /// Latitude band enclosing the circle. Any point on the sphere is at
    /// least `R * |dlat|` away from the center, so nothing in range is cut.
    #[must_use]
    pub fn band(&self) -> LatitudeBand {
        let half_width = (self.radius_meters / EARTH_MEAN_RADIUS_METERS).to_degrees()
            + BAND_SLACK_DEGREES;
        LatitudeBand {
            min: (self.center.latitude - half_width).max(-90.0),
            max: (self.center.latitude + half_width).min(90.0),
        }
    }

    #[must_use]
    pub fn contains(&self, point: GeoPoint) -> bool {
        haversine_distance(self.center, point) <= self.radius_meters
    }

    /// Identifiers of the buildings inside the circle.
    #[must_use]
    pub fn select<'a>(&self, buildings: impl IntoIterator<Item = &'a Building>) -> BTreeSet<i64> {
        buildings
            .into_iter()
            .filter(|b| self.contains(GeoPoint::new(b.latitude, b.longitude)))
            .map(|b| b.id)
            .collect()
    }
}

/// # Errors
/// Returns `DomainError::Validation` naming the offending coordinate.
pub fn validate_point(point: GeoPoint) -> Result<(), DomainError> {
    if !point.latitude.is_finite() || !(-90.0..=90.0).contains(&point.latitude) {
        return Err(DomainError::validation(
            "latitude",
            format!("must be within [-90, 90], got {}", point.latitude),
        ));
    }
    if !point.longitude.is_finite() || !(-180.0..=180.0).contains(&point.longitude) {
        return Err(DomainError::validation(
            "longitude",
            format!("must be within [-180, 180], got {}", point.longitude),
        ));
    }
    Ok(())
}

/// Great-circle distance in meters.
#[must_use]
pub fn haversine_distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let phi_a = a.latitude.to_radians();
    let phi_b = b.latitude.to_radians();
    let d_phi = (b.latitude - a.latitude).to_radians();
    let d_lambda = (b.longitude - a.longitude).to_radians();

    let h = (d_phi / 2.0).sin().powi(2)
        + phi_a.cos() * phi_b.cos() * (d_lambda / 2.0).sin().powi(2);

    2.0 * EARTH_MEAN_RADIUS_METERS * h.sqrt().min(1.0).asin()
}
