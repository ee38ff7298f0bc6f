use std::fmt;

use serde::{Deserialize, Serialize};

// ── Coordinates ──────────────────────────────────────────────────────

/// A geographic coordinate pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl Waypoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// True when both axes differ by less than `tolerance` degrees.
    pub fn coincides_with(&self, other: &Waypoint, tolerance: f64) -> bool {
        (self.latitude - other.latitude).abs() < tolerance
            && (self.longitude - other.longitude).abs() < tolerance
    }

    /// Finite and within the WGS84 latitude/longitude ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude.abs() <= 90.0
            && self.longitude.abs() <= 180.0
    }
}

impl fmt::Display for Waypoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

// ── Route ────────────────────────────────────────────────────────────

/// Destination hospital selected by the route supplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub id: String,
    pub name: String,
    pub coords: Waypoint,
    /// Free beds at the time the route was computed.
    #[serde(default)]
    pub availability: u32,
}

/// A precomputed route from the ambulance to its best facility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub id: String,
    pub ambulance_location: Waypoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_hospital_id: Option<String>,
    pub best_hospital: Facility,
    pub route_coordinates: Vec<Waypoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Route {
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.route_coordinates
    }

    pub fn len(&self) -> usize {
        self.route_coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.route_coordinates.is_empty()
    }
}
