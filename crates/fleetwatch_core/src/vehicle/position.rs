use geo::{Distance, Haversine};

use super::meters::Meters;

/// A WGS84 coordinate. Stored as a `geo::Point` with x = longitude, y = latitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    point: geo::Point,
}

impl Position {
    /// Returns `None` when either coordinate is not finite or out of range.
    pub fn from_lat_lng(lat: f64, lng: f64) -> Option<Self> {
        if !lat.is_finite() || !lng.is_finite() {
            return None;
        }

        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return None;
        }

        Some(Self {
            point: geo::Point::new(lng, lat),
        })
    }

    pub fn lat(&self) -> f64 {
        self.point.y()
    }

    pub fn lng(&self) -> f64 {
        self.point.x()
    }

    pub fn haversine_distance(&self, to: &Position) -> Meters {
        let haversine = Haversine;
        Meters::new(haversine.distance(self.point, to.point))
    }
}

impl From<&Position> for geo::Point<f64> {
    fn from(position: &Position) -> Self {
        position.point
    }
}

impl From<&Position> for geo::Coord<f64> {
    fn from(position: &Position) -> Self {
        geo::Coord {
            x: position.lng(),
            y: position.lat(),
        }
    }
}
