use geo::{Distance, HaversineMeasure, Point};
use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the haversine primitive.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// A WGS84 position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Arithmetic mean of both axes. Not a geodesic midpoint, but close
    /// enough at city scale.
    pub fn midpoint(&self, other: &Coordinate) -> Coordinate {
        Coordinate {
            lat: (self.lat + other.lat) / 2.0,
            lng: (self.lng + other.lng) / 2.0,
        }
    }

    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        haversine_distance(self, other)
    }

    /// `[lng, lat]`, the GeoJSON / OSRM axis order.
    pub fn to_lng_lat(&self) -> [f64; 2] {
        [self.lng, self.lat]
    }

    pub fn from_lng_lat([lng, lat]: [f64; 2]) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Great-circle distance in meters, on a sphere of `EARTH_RADIUS_METERS`.
pub fn haversine_distance(p1: &Coordinate, p2: &Coordinate) -> f64 {
    HaversineMeasure::new(EARTH_RADIUS_METERS).distance(Point::from(*p1), Point::from(*p2))
}

impl From<Coordinate> for Point<f64> {
    fn from(c: Coordinate) -> Self {
        Point::new(c.lng, c.lat)
    }
}
