//! Geographic calculations

use crate::defaults::{AVERAGE_SPEED_KMH, REFERENCE_LEVEL};

/// Earth radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Cell edge in degrees at the reference resolution level
const REFERENCE_CELL_DEG: f64 = 1.0;

/// Calculate Haversine distance between two points in kilometers
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lng2 - lng1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);

    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Convert a great-circle distance to travel seconds at the fixed
/// average fleet speed
pub fn travel_seconds(distance_km: f64) -> f64 {
    distance_km / AVERAGE_SPEED_KMH * 3600.0
}

/// Cell edge length in degrees for a resolution level. The reference level
/// uses 1° cells; each level up halves the edge, each level down doubles it.
pub fn cell_size_deg(level: i32) -> f64 {
    REFERENCE_CELL_DEG * 2f64.powi(REFERENCE_LEVEL - level)
}

/// A cell of the equirectangular aggregation grid at one resolution level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct GridCell {
    pub level: i32,
    pub row: i64,
    pub col: i64,
}

impl GridCell {
    /// Map coordinates to their containing cell at `level`
    pub fn containing(lat: f64, lng: f64, level: i32) -> Self {
        let size = cell_size_deg(level);
        Self {
            level,
            row: (lat / size).floor() as i64,
            col: (lng / size).floor() as i64,
        }
    }

    /// Stable string identifier, sortable within one level
    pub fn id(&self) -> String {
        format!("r{}:{}:{}", self.level, self.row, self.col)
    }

    /// Representative center coordinates of the cell
    pub fn center(&self) -> (f64, f64) {
        let size = cell_size_deg(self.level);
        (
            (self.row as f64 + 0.5) * size,
            (self.col as f64 + 0.5) * size,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_prague_brno() {
        // Prague to Brno is approximately 185 km
        let distance = haversine_km(50.0755, 14.4378, 49.1951, 16.6068);
        assert!((distance - 185.0).abs() < 5.0);
    }

    #[test]
    fn test_haversine_same_point() {
        let distance = haversine_km(50.0, 14.0, 50.0, 14.0);
        assert!(distance.abs() < 0.001);
    }

    #[test]
    fn test_travel_seconds_at_fixed_speed() {
        // 50 km at 50 km/h is exactly one hour
        assert!((travel_seconds(50.0) - 3600.0).abs() < 1e-9);
    }

    #[test]
    fn test_cell_size_halves_per_level() {
        assert!((cell_size_deg(5) - 1.0).abs() < 1e-12);
        assert!((cell_size_deg(6) - 0.5).abs() < 1e-12);
        assert!((cell_size_deg(4) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_grid_cell_contains_its_center() {
        let cell = GridCell::containing(50.07, 14.43, 6);
        let (lat, lng) = cell.center();
        assert_eq!(GridCell::containing(lat, lng, 6), cell);
    }

    #[test]
    fn test_nearby_points_share_a_cell() {
        let a = GridCell::containing(50.01, 14.01, 5);
        let b = GridCell::containing(50.02, 14.02, 5);
        assert_eq!(a, b);
        assert_eq!(a.id(), "r5:50:14");
    }

    #[test]
    fn test_negative_coordinates_floor_correctly() {
        let cell = GridCell::containing(-0.5, -0.5, 5);
        assert_eq!(cell.row, -1);
        assert_eq!(cell.col, -1);
    }
}
