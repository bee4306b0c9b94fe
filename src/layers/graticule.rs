//! Latitude/longitude reference lines
//!
//! Lines are straight in map coordinates, so each one is returned as the two
//! viewport points where it leaves the visible map area.

use crate::core::geo::{Location, Point};
use crate::core::map::MapBase;

const LINE_SPACINGS: [f64; 15] = [
    1.0 / 60.0,
    1.0 / 30.0,
    1.0 / 12.0,
    1.0 / 6.0,
    1.0 / 4.0,
    1.0 / 3.0,
    1.0 / 2.0,
    1.0,
    2.0,
    5.0,
    10.0,
    15.0,
    20.0,
    30.0,
    45.0,
];

#[derive(Debug, Clone, PartialEq)]
pub struct GraticuleLine {
    /// Latitude or longitude of the line in degrees.
    pub value: f64,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GraticuleLabel {
    pub position: Point,
    pub latitude_text: String,
    pub longitude_text: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graticule {
    pub spacing: f64,
    pub latitude_lines: Vec<GraticuleLine>,
    pub longitude_lines: Vec<GraticuleLine>,
    pub labels: Vec<GraticuleLabel>,
}

#[derive(Debug, Clone)]
pub struct MapGraticule {
    /// Minimum distance between adjacent lines in viewport pixels.
    pub min_line_spacing: f64,
}

impl Default for MapGraticule {
    fn default() -> Self {
        Self {
            min_line_spacing: 150.0,
        }
    }
}

impl MapGraticule {
    pub fn new(min_line_spacing: f64) -> Self {
        Self { min_line_spacing }
    }

    /// Smallest spacing in degrees that keeps lines at least
    /// `min_line_spacing` pixels apart, or the largest one available.
    pub fn line_spacing(&self, zoom_level: f64, tile_size: u32) -> f64 {
        let min_spacing =
            self.min_line_spacing * 360.0 / (2f64.powf(zoom_level) * f64::from(tile_size));
        LINE_SPACINGS
            .iter()
            .copied()
            .find(|&spacing| spacing >= min_spacing)
            .unwrap_or(LINE_SPACINGS[LINE_SPACINGS.len() - 1])
    }

    pub fn compute(&self, map: &MapBase) -> Graticule {
        let size = map.render_size();
        let Some(inverse) = map.viewport_transform().try_inverse() else {
            return Graticule::default();
        };
        if size.is_empty() {
            return Graticule::default();
        }

        let corners = [
            Point::new(0.0, 0.0),
            Point::new(size.width, 0.0),
            Point::new(0.0, size.height),
            Point::new(size.width, size.height),
        ]
        .map(|p| Point::from(inverse.transform_point(&p.into())));

        let x_min = corners.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let x_max = corners.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        let y_min = corners.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let y_max = corners.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

        let transform = map.map_transform();
        let max_latitude = transform.max_latitude();
        let lat_min = transform
            .inverse_transform(&Point::new(x_min, y_min))
            .latitude()
            .max(-max_latitude);
        let lat_max = transform
            .inverse_transform(&Point::new(x_max, y_max))
            .latitude()
            .min(max_latitude);

        let spacing = self.line_spacing(map.zoom_level(), map.options().tile_size);
        let latitudes = steps(lat_min, lat_max, spacing);
        let longitudes = steps(x_min, x_max, spacing);

        let viewport = map.viewport_transform();
        let to_viewport = |latitude: f64, longitude: f64| {
            let map_point = transform.transform(&Location::new(latitude, longitude));
            Point::from(viewport.transform_point(&map_point.into()))
        };

        let latitude_lines = latitudes
            .iter()
            .map(|&latitude| GraticuleLine {
                value: latitude,
                points: vec![to_viewport(latitude, x_min), to_viewport(latitude, x_max)],
            })
            .collect();

        let longitude_lines = longitudes
            .iter()
            .map(|&longitude| GraticuleLine {
                value: longitude,
                points: vec![to_viewport(lat_min, longitude), to_viewport(lat_max, longitude)],
            })
            .collect();

        let labels = latitudes
            .iter()
            .flat_map(|&latitude| {
                longitudes.iter().map(move |&longitude| (latitude, longitude))
            })
            .map(|(latitude, longitude)| GraticuleLabel {
                position: to_viewport(latitude, longitude),
                latitude_text: format_coordinate(latitude, spacing, 'N', 'S'),
                longitude_text: format_coordinate(
                    Location::normalize_longitude(longitude),
                    spacing,
                    'E',
                    'W',
                ),
            })
            .collect();

        Graticule {
            spacing,
            latitude_lines,
            longitude_lines,
            labels,
        }
    }
}

/// Multiples of `spacing` within `[min, max]`.
fn steps(min: f64, max: f64, spacing: f64) -> Vec<f64> {
    if !(min.is_finite() && max.is_finite()) || min > max {
        return Vec::new();
    }
    let first = (min / spacing).ceil() as i64;
    let last = (max / spacing).floor() as i64;
    (first..=last).map(|i| i as f64 * spacing).collect()
}

/// `48°30'N` below one degree spacing, `48°N` otherwise.
fn format_coordinate(value: f64, spacing: f64, positive: char, negative: char) -> String {
    let hemisphere = if value < 0.0 { negative } else { positive };
    let minutes = (value.abs() * 60.0).round() as i64;

    if spacing < 1.0 {
        format!("{}°{:02}'{}", minutes / 60, minutes % 60, hemisphere)
    } else {
        format!("{}°{}", (minutes + 30) / 60, hemisphere)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_spacing() {
        let graticule = MapGraticule::default();
        // 150 px at zoom 0 is ~211°, beyond the largest spacing.
        assert_eq!(graticule.line_spacing(0.0, 256), 45.0);
        // zoom 3: 150 * 360 / 2048 = 26.4°
        assert_eq!(graticule.line_spacing(3.0, 256), 30.0);
        // zoom 10: ~0.206°
        assert_eq!(graticule.line_spacing(10.0, 256), 0.25);
        assert_eq!(graticule.line_spacing(22.0, 256), 1.0 / 60.0);
    }

    #[test]
    fn test_format_coordinate() {
        assert_eq!(format_coordinate(48.5, 0.5, 'N', 'S'), "48°30'N");
        assert_eq!(format_coordinate(-12.25, 0.25, 'N', 'S'), "12°15'S");
        assert_eq!(format_coordinate(48.0, 2.0, 'N', 'S'), "48°N");
        assert_eq!(format_coordinate(-120.0, 30.0, 'E', 'W'), "120°W");
        assert_eq!(format_coordinate(0.0, 10.0, 'E', 'W'), "0°E");
    }

    #[test]
    fn test_steps() {
        assert_eq!(steps(-25.0, 25.0, 10.0), vec![-20.0, -10.0, 0.0, 10.0, 20.0]);
        assert_eq!(steps(1.0, 9.0, 10.0), Vec::<f64>::new());
        assert!(steps(f64::NEG_INFINITY, 0.0, 10.0).is_empty());
    }
}
