//! Great-circle distance and coordinate validation.

use tracing::warn;

/// Mean Earth radius in kilometers, per §4.1. A compile-time constant,
/// not configuration.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Average fleet speed used to convert distance to duration everywhere in
/// the CORE (§4.1). A design choice, not configuration.
pub const AVERAGE_SPEED_KMH: f64 = 40.0;

/// A WGS-84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Non-finite latitude/longitude is invalid input (§4.1, §4.15).
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

/// Great-circle (haversine) distance between two coordinates, in km,
/// rounded to 0.001 km. Invalid (non-finite) inputs yield 0.0 and a
/// warning rather than propagating NaN through the matrix (§4.1).
pub fn haversine_distance_km(a: Coordinate, b: Coordinate) -> f64 {
    if !a.is_finite() || !b.is_finite() {
        warn!(?a, ?b, "non-finite coordinate passed to haversine_distance_km");
        return 0.0;
    }

    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().clamp(0.0, 1.0).asin();
    let distance = EARTH_RADIUS_KM * c;

    round_km(distance)
}

/// Round to 0.001 km, per §4.1.
pub fn round_km(distance_km: f64) -> f64 {
    (distance_km * 1000.0).round() / 1000.0
}

/// Convert a distance in km to a duration in minutes at the CORE's uniform
/// average speed (§4.1, §3: `duration = round(distance / 40 * 60)`).
pub fn distance_to_duration_min(distance_km: f64) -> f64 {
    (distance_km / AVERAGE_SPEED_KMH * 60.0).round()
}

/// Bearing of a location from the depot, per §4.5's angular-continuity
/// factor: `atan2(lat - depot.lat, lon - depot.lon)`.
pub fn bearing_from_depot(depot: Coordinate, loc: Coordinate) -> f64 {
    (loc.lat - depot.lat).atan2(loc.lon - depot.lon)
}

/// Smallest angle between two bearings, normalized into `[0, pi]`.
pub fn angular_difference(a: f64, b: f64) -> f64 {
    let diff = (a - b).abs();
    diff.min(2.0 * std::f64::consts::PI - diff)
}
