//! Geometric value types shared by the text and voice APIs.

use serde::{Deserialize, Serialize};

/// A WGS84 latitude/longitude pair.
///
/// The client never validates ranges; the server rejects out-of-range values
/// with `BadCoordinates`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// A grid square or clipping bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub southwest: Coordinates,
    pub northeast: Coordinates,
}

impl Rectangle {
    pub fn new(southwest: Coordinates, northeast: Coordinates) -> Self {
        Self {
            southwest,
            northeast,
        }
    }

    /// Whether `point` lies inside (or on the edge of) this rectangle.
    ///
    /// A rectangle whose southwest longitude is greater than its northeast
    /// longitude crosses the antimeridian.
    pub fn contains(&self, point: &Coordinates) -> bool {
        let lat_ok = point.lat >= self.southwest.lat && point.lat <= self.northeast.lat;
        let lng_ok = if self.southwest.lng <= self.northeast.lng {
            point.lng >= self.southwest.lng && point.lng <= self.northeast.lng
        } else {
            point.lng >= self.southwest.lng || point.lng <= self.northeast.lng
        };
        lat_ok && lng_ok
    }
}

/// A distance in kilometers.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Distance {
    km: f64,
}

impl Distance {
    pub fn from_km(km: f64) -> Self {
        Self { km }
    }

    pub fn km(&self) -> f64 {
        self.km
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Coordinates,
    pub radius: Distance,
}

impl Circle {
    pub fn new(center: Coordinates, radius: Distance) -> Self {
        Self { center, radius }
    }
}

/// An ordered ring of coordinates.
///
/// The server requires at least four points with the first equal to the
/// last; neither rule is checked here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub points: Vec<Coordinates>,
}

impl Polygon {
    pub fn new(points: Vec<Coordinates>) -> Self {
        Self { points }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub start: Coordinates,
    pub end: Coordinates,
}

/// Grid lines of the 3m x 3m grid that intersect a bounding box, in server order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GridSection {
    pub lines: Vec<Line>,
}
