//! Shared trait abstractions for common patterns

use crate::core::geo::{Location, Point};

/// Linear interpolation, `t` in `[0, 1]`.
pub trait Lerp {
    fn lerp(&self, other: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        self + (other - self) * t
    }
}

impl Lerp for Point {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        Point::new(self.x.lerp(&other.x, t), self.y.lerp(&other.y, t))
    }
}

/// Straight interpolation of both coordinates. Callers that want the short
/// way across the date line pass an `other` whose longitude has already been
/// moved next to `self`.
impl Lerp for Location {
    fn lerp(&self, other: &Self, t: f64) -> Self {
        Location::new(
            self.latitude().lerp(&other.latitude(), t),
            self.longitude().lerp(&other.longitude(), t),
        )
    }
}

/// Anything that can convert between geographic and viewport coordinates.
pub trait ViewportProjection {
    fn location_to_viewport_point(&self, location: &Location) -> Point;

    fn viewport_point_to_location(&self, point: &Point) -> Location;
}
