//! Geographic predicates used by listings and search.
//!
//! This module owns the coordinate model ([`GeoPoint`]), the circular region
//! used to keep map results inside the visible radius, and the location
//! matcher deciding whether a user is searching for the place they are in.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

mod location_match;

pub use error::GeoError;
pub use location_match::{
    Address, Country, CountryResolver, LocationMatcher, MINIMUM_FUZZY_MATCH_RATIO,
    ReverseGeocoder, match_ratio, meets_match_threshold,
};

/// Flat metres-to-degrees divisor applied to map radii.
///
/// Stored coordinates are plain degrees, so a radius in metres is divided by this
/// value before the region is built. It ignores latitude on purpose: results must
/// match the existing listing behaviour.
pub const METERS_PER_DEGREE: f64 = 100_000.0;

/// Tolerance absorbing floating point noise on the region boundary.
const BOUNDARY_EPSILON_DEGREES: f64 = 1e-9;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Finite and inside the `[-90, 90]` x `[-180, 180]` range.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Usable as a search origin or region centre.
    ///
    /// Clients send `0` for "unknown", so a zero on either axis counts as absent.
    pub fn is_usable(&self) -> bool {
        self.is_valid() && self.latitude.abs() > 0.0 && self.longitude.abs() > 0.0
    }

    /// Returns the point only when it is usable.
    pub fn usable(point: Option<Self>) -> Option<Self> {
        point.filter(Self::is_usable)
    }
}

/// Anything that may carry a position.
pub trait Located {
    fn location(&self) -> Option<GeoPoint>;
}

impl Located for GeoPoint {
    fn location(&self) -> Option<GeoPoint> {
        Some(*self)
    }
}

impl<T: Located> Located for &T {
    fn location(&self) -> Option<GeoPoint> {
        (*self).location()
    }
}

/// Radius filter parameters for map searches.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RadiusFilterSpec {
    /// Radius of the visible map, in metres.
    pub radius_meters: f64,
    /// Centre of the map. Falls back to the first candidate when absent or zero.
    pub center: Option<GeoPoint>,
}

impl RadiusFilterSpec {
    pub const fn new(radius_meters: f64, center: Option<GeoPoint>) -> Self {
        Self {
            radius_meters,
            center,
        }
    }
}

/// Circle in degree space, the region every map candidate is tested against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircularRegion {
    center: GeoPoint,
    radius_degrees: f64,
}

impl CircularRegion {
    /// Builds the region for a radius given in metres.
    pub fn around(center: GeoPoint, radius_meters: f64) -> Self {
        Self {
            center,
            radius_degrees: radius_meters / METERS_PER_DEGREE,
        }
    }

    pub const fn center(&self) -> GeoPoint {
        self.center
    }

    pub const fn radius_degrees(&self) -> f64 {
        self.radius_degrees
    }

    /// Point-in-region test, boundary inclusive.
    pub fn contains(&self, point: GeoPoint) -> bool {
        let d_lng = point.longitude - self.center.longitude;
        let d_lat = point.latitude - self.center.latitude;
        d_lng.hypot(d_lat) <= self.radius_degrees + BOUNDARY_EPSILON_DEGREES
    }
}

/// Keeps the candidates lying inside the map radius.
///
/// Candidates without a valid coordinate pair are dropped first. When the requested
/// centre is unusable the first remaining candidate becomes the centre. The relative
/// order of the survivors is preserved.
#[instrument(name = "Filter By Radius", level = "debug", skip(candidates), fields(num_candidates = candidates.len()))]
pub fn filter_by_radius<T: Located>(candidates: Vec<T>, spec: &RadiusFilterSpec) -> Vec<T> {
    let candidates: Vec<(T, GeoPoint)> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let point = candidate.location().filter(GeoPoint::is_valid)?;
            Some((candidate, point))
        })
        .collect();

    let Some((_, first_point)) = candidates.first() else {
        debug!("No candidate with valid coordinates");
        return Vec::new();
    };

    let center = GeoPoint::usable(spec.center).unwrap_or(*first_point);
    let region = CircularRegion::around(center, spec.radius_meters);
    debug!(?center, radius_degrees = region.radius_degrees(), "Built map region");

    candidates
        .into_iter()
        .filter(|(_, point)| region.contains(*point))
        .map(|(candidate, _)| candidate)
        .collect()
}

/// Great-circle distance between two points, in kilometres.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    haversine::distance(
        haversine::Location {
            latitude: a.latitude,
            longitude: a.longitude,
        },
        haversine::Location {
            latitude: b.latitude,
            longitude: b.longitude,
        },
        haversine::Units::Kilometers,
    )
}

mod error {
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum GeoError {
        #[error("Reverse geocoding failed: {0}")]
        Geocoding(String),
        #[error(transparent)]
        Other(#[from] anyhow::Error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Candidate {
        id: u32,
        point: Option<GeoPoint>,
    }

    impl Located for Candidate {
        fn location(&self) -> Option<GeoPoint> {
            self.point
        }
    }

    fn candidate(id: u32, lat: f64, lng: f64) -> Candidate {
        Candidate {
            id,
            point: Some(GeoPoint::new(lat, lng)),
        }
    }

    fn ids(candidates: &[Candidate]) -> Vec<u32> {
        candidates.iter().map(|c| c.id).collect()
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let center = GeoPoint::new(10.0, 20.0);
        // 500 m is 0.005 degrees with the flat conversion
        let on_boundary = candidate(1, 10.005, 20.0);
        let one_metre_out = candidate(2, 10.005 + 1.0 / METERS_PER_DEGREE, 20.0);

        let kept = filter_by_radius(
            vec![on_boundary, one_metre_out],
            &RadiusFilterSpec::new(500.0, Some(center)),
        );
        assert_eq!(ids(&kept), vec![1]);
    }

    #[test]
    fn test_fallback_center_is_first_candidate() {
        let candidates = vec![candidate(1, 10.0, 20.0), candidate(2, 10.001, 20.001)];
        let kept = filter_by_radius(
            candidates,
            &RadiusFilterSpec::new(500.0, Some(GeoPoint::new(0.0, 0.0))),
        );
        assert_eq!(ids(&kept), vec![1, 2]);

        let candidates = vec![candidate(1, 10.0, 20.0), candidate(2, 10.01, 20.01)];
        let kept = filter_by_radius(candidates, &RadiusFilterSpec::new(500.0, None));
        assert_eq!(ids(&kept), vec![1]);
    }

    #[test]
    fn test_invalid_coordinates_are_dropped_before_fallback() {
        let candidates = vec![
            Candidate { id: 1, point: None },
            candidate(2, 95.0, 20.0),
            candidate(3, f64::NAN, 20.0),
            candidate(4, 25.2, 55.3),
            candidate(5, 25.2001, 55.3001),
        ];
        let kept = filter_by_radius(candidates, &RadiusFilterSpec::new(100.0, None));
        assert_eq!(ids(&kept), vec![4, 5]);
    }

    #[test]
    fn test_empty_and_all_invalid_inputs() {
        let kept: Vec<Candidate> = filter_by_radius(Vec::new(), &RadiusFilterSpec::new(500.0, None));
        assert!(kept.is_empty());

        let kept = filter_by_radius(
            vec![Candidate { id: 1, point: None }],
            &RadiusFilterSpec::new(500.0, None),
        );
        assert!(kept.is_empty());
    }

    #[test]
    fn test_zero_radius_keeps_coincident_points_only() {
        let center = GeoPoint::new(25.2, 55.3);
        let candidates = vec![candidate(1, 25.2, 55.3), candidate(2, 25.2001, 55.3)];
        let kept = filter_by_radius(candidates, &RadiusFilterSpec::new(0.0, Some(center)));
        assert_eq!(ids(&kept), vec![1]);
    }

    #[test]
    fn test_order_is_preserved() {
        let center = GeoPoint::new(25.0, 55.0);
        let candidates = vec![
            candidate(3, 25.001, 55.0),
            candidate(1, 26.0, 55.0),
            candidate(2, 25.0, 55.002),
            candidate(7, 25.0, 55.0),
        ];
        let kept = filter_by_radius(candidates, &RadiusFilterSpec::new(1_000.0, Some(center)));
        assert_eq!(ids(&kept), vec![3, 2, 7]);
    }

    #[test]
    fn test_point_usability() {
        assert!(GeoPoint::new(25.2, 55.3).is_usable());
        assert!(!GeoPoint::new(0.0, 55.3).is_usable());
        assert!(!GeoPoint::new(25.2, 0.0).is_usable());
        assert!(!GeoPoint::new(120.0, 55.3).is_usable());
        assert!(GeoPoint::new(0.0, 0.0).is_valid());
        assert_eq!(GeoPoint::usable(None), None);
    }

    #[test]
    fn test_haversine_known_distance() {
        let dubai = GeoPoint::new(25.2048, 55.2708);
        let abu_dhabi = GeoPoint::new(24.4539, 54.3773);
        let distance = haversine_km(dubai, abu_dhabi);
        assert!((distance - 124.0).abs() < 3.0, "got {distance}");
        assert!(haversine_km(dubai, dubai).abs() < 1e-9);
    }
}
