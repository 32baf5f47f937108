//! Equirectangular distance helpers.
//!
//! At city scale the equirectangular projection is within a fraction of a
//! percent of great-circle distance, and its squared form is plain arithmetic
//! that SQLite can order by without math extensions.

use askgeorge_common::types::Coordinate;

/// Mean Earth radius in statute miles.
pub const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Longitude degrees shrink by `cos(latitude)` away from the equator.
#[must_use]
pub fn lng_scale(lat: f64) -> f64 {
    lat.to_radians().cos()
}

/// Convert a squared scaled-degree distance to miles.
#[must_use]
pub fn squared_degrees_to_miles(squared: f64) -> f64 {
    EARTH_RADIUS_MILES * squared.max(0.0).sqrt().to_radians()
}

/// Approximate distance between two points in miles.
#[must_use]
pub fn distance_miles(a: Coordinate, b: Coordinate) -> f64 {
    let dlat = b.lat - a.lat;
    let dlng = (b.lng - a.lng) * lng_scale(a.lat);
    squared_degrees_to_miles(dlat * dlat + dlng * dlng)
}
