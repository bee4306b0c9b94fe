use crate::{MapError, Result};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

/// A geographic coordinate.
///
/// Latitude is clamped to `[-90, 90]` whenever it is written. Longitude is
/// stored as given; use [`Location::normalize_longitude`] to bring it into
/// range. The Mercator-projected latitude is computed on write and travels
/// with the value, so every `with_*` call produces a fresh, consistent copy.
#[derive(Clone, Copy, Serialize, Deserialize)]
#[serde(from = "LocationRepr", into = "LocationRepr")]
pub struct Location {
    latitude: f64,
    longitude: f64,
    mercator_y: f64,
}

#[derive(Serialize, Deserialize)]
struct LocationRepr {
    latitude: f64,
    longitude: f64,
}

impl From<LocationRepr> for Location {
    fn from(repr: LocationRepr) -> Self {
        Location::new(repr.latitude, repr.longitude)
    }
}

impl From<Location> for LocationRepr {
    fn from(location: Location) -> Self {
        Self {
            latitude: location.latitude,
            longitude: location.longitude,
        }
    }
}

impl Location {
    /// Creates a new location, clamping latitude to `[-90, 90]`.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        let latitude = latitude.clamp(-90.0, 90.0);
        Self {
            latitude,
            longitude,
            mercator_y: mercator_y(latitude),
        }
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Returns a copy with a new latitude; the projected value is recomputed.
    pub fn with_latitude(&self, latitude: f64) -> Self {
        Self::new(latitude, self.longitude)
    }

    /// Returns a copy with a new longitude.
    pub fn with_longitude(&self, longitude: f64) -> Self {
        Self {
            longitude,
            ..*self
        }
    }

    /// Projected Mercator y of this latitude, in degrees. `±∞` at the poles.
    pub(crate) fn mercator_y(&self) -> f64 {
        self.mercator_y
    }

    /// Wraps a longitude into `[-180, 180]`.
    ///
    /// Values already inside the range are returned unchanged, so `180`
    /// stays `180` and `-180` stays `-180`.
    pub fn normalize_longitude(longitude: f64) -> f64 {
        if longitude < -180.0 {
            ((longitude + 180.0) % 360.0) + 180.0
        } else if longitude > 180.0 {
            ((longitude - 180.0) % 360.0) - 180.0
        } else {
            longitude
        }
    }

    /// Returns the longitude congruent to `longitude` (mod 360) that lies
    /// closest to `reference`.
    pub fn nearest_longitude(longitude: f64, reference: f64) -> f64 {
        let delta = longitude - reference;
        if delta > 180.0 {
            longitude - 360.0 * ((delta + 180.0) / 360.0).floor()
        } else if delta < -180.0 {
            longitude + 360.0 * ((180.0 - delta) / 360.0).floor()
        } else {
            longitude
        }
    }
}

fn mercator_y(latitude: f64) -> f64 {
    if latitude <= -90.0 {
        f64::NEG_INFINITY
    } else if latitude >= 90.0 {
        f64::INFINITY
    } else {
        let lat = latitude * PI / 180.0;
        (lat.tan() + 1.0 / lat.cos()).ln() / PI * 180.0
    }
}

impl PartialEq for Location {
    fn eq(&self, other: &Self) -> bool {
        self.latitude == other.latitude && self.longitude == other.longitude
    }
}

impl fmt::Debug for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Location")
            .field("latitude", &self.latitude)
            .field("longitude", &self.longitude)
            .finish()
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

impl FromStr for Location {
    type Err = MapError;

    /// Parses `"latitude,longitude"`.
    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.split(',');
        let (Some(lat), Some(lon), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(MapError::Parse(format!(
                "expected \"latitude,longitude\", got {s:?}"
            )));
        };

        let parse = |text: &str| {
            text.trim()
                .parse::<f64>()
                .map_err(|e| MapError::Parse(format!("invalid coordinate {text:?}: {e}")))
        };

        Ok(Location::new(parse(lat)?, parse(lon)?))
    }
}

/// Represents a point in viewport or projected map coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn add(&self, other: &Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    pub fn subtract(&self, other: &Point) -> Point {
        Point::new(self.x - other.x, self.y - other.y)
    }

    pub fn multiply(&self, scalar: f64) -> Point {
        Point::new(self.x * scalar, self.y * scalar)
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl From<Point2<f64>> for Point {
    fn from(point: Point2<f64>) -> Self {
        Point::new(point.x, point.y)
    }
}

impl From<Point> for Point2<f64> {
    fn from(point: Point) -> Self {
        Point2::new(point.x, point.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latitude_is_clamped() {
        assert_eq!(Location::new(95.0, 10.0).latitude(), 90.0);
        assert_eq!(Location::new(-120.0, 10.0).latitude(), -90.0);
        assert_eq!(Location::new(45.0, 10.0).with_latitude(100.0).latitude(), 90.0);
    }

    #[test]
    fn test_normalize_longitude() {
        assert_eq!(Location::normalize_longitude(190.0), -170.0);
        assert_eq!(Location::normalize_longitude(-190.0), 170.0);
        assert_eq!(Location::normalize_longitude(180.0), 180.0);
        assert_eq!(Location::normalize_longitude(-180.0), -180.0);
        assert_eq!(Location::normalize_longitude(540.0), -180.0);
        assert_eq!(Location::normalize_longitude(725.0), 5.0);
    }

    #[test]
    fn test_nearest_longitude() {
        assert_eq!(Location::nearest_longitude(-170.0, 170.0), 190.0);
        assert_eq!(Location::nearest_longitude(170.0, -170.0), -190.0);
        assert_eq!(Location::nearest_longitude(10.0, 20.0), 10.0);
        assert_eq!(Location::nearest_longitude(370.0, 0.0), 10.0);
    }

    #[test]
    fn test_projected_latitude_follows_writes() {
        let equator = Location::new(0.0, 0.0);
        assert_eq!(equator.mercator_y(), 0.0);

        let moved = equator.with_latitude(45.0);
        assert!(moved.mercator_y() > 50.0);
        assert_eq!(equator.mercator_y(), 0.0);

        let shifted = moved.with_longitude(120.0);
        assert_eq!(shifted.mercator_y(), moved.mercator_y());
    }

    #[test]
    fn test_parse_location() {
        let location: Location = " 52.5 , 13.4 ".parse().unwrap();
        assert_eq!(location, Location::new(52.5, 13.4));

        assert!("52.5".parse::<Location>().is_err());
        assert!("north,east".parse::<Location>().is_err());
        assert!("1,2,3".parse::<Location>().is_err());
    }

    #[test]
    fn test_display_round_trips() {
        let location = Location::new(-33.25, 151.5);
        let parsed: Location = location.to_string().parse().unwrap();
        assert_eq!(parsed, location);
    }

    #[test]
    fn test_serde_recomputes_projection() {
        let json = r#"{"latitude":45.0,"longitude":7.0}"#;
        let location: Location = serde_json::from_str(json).unwrap();
        assert_eq!(location.mercator_y(), Location::new(45.0, 7.0).mercator_y());
    }
}
