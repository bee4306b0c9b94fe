//! Map projections between geographic locations and planar map coordinates.
//!
//! Map coordinates are expressed in degrees: `x` is longitude and `y` is the
//! projected latitude, with `y` growing northwards.

use crate::core::geo::{Location, Point};
use std::f64::consts::PI;

/// Bidirectional mapping between [`Location`] and planar map coordinates.
pub trait MapTransform: Send + Sync {
    /// Largest latitude (in degrees) this projection can represent.
    fn max_latitude(&self) -> f64;

    /// Scale factor at `location` relative to the scale at the equator.
    fn relative_scale(&self, location: &Location) -> f64;

    /// Projects a location to map coordinates.
    fn transform(&self, location: &Location) -> Point;

    /// Inverse projection of a map point.
    fn inverse_transform(&self, point: &Point) -> Location;
}

/// Spherical Mercator.
///
/// The poles project to `y = ±∞`; callers that compute distances from the
/// relative scale have to cope with infinities there.
#[derive(Debug, Clone, Copy, Default)]
pub struct MercatorTransform;

impl MercatorTransform {
    /// `atan(sinh(π))` in degrees, ~85.0511°.
    pub fn max_latitude_value() -> f64 {
        PI.sinh().atan() / PI * 180.0
    }

    pub fn new() -> Self {
        Self
    }
}

impl MapTransform for MercatorTransform {
    fn max_latitude(&self) -> f64 {
        Self::max_latitude_value()
    }

    fn relative_scale(&self, location: &Location) -> f64 {
        if location.latitude() <= -90.0 {
            f64::NEG_INFINITY
        } else if location.latitude() >= 90.0 {
            f64::INFINITY
        } else {
            1.0 / (location.latitude() * PI / 180.0).cos()
        }
    }

    fn transform(&self, location: &Location) -> Point {
        Point::new(location.longitude(), location.mercator_y())
    }

    fn inverse_transform(&self, point: &Point) -> Location {
        Location::new((point.y * PI / 180.0).sinh().atan() / PI * 180.0, point.x)
    }
}
