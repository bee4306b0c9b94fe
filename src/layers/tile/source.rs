//! Tile sources: from a tile index to something the image decoder can load.

use super::image::ImageRequest;
use crate::core::constants::{MAX_TILE_ZOOM_LEVEL, METERS_PER_DEGREE};
use crate::core::geo::Point;
use crate::core::transform::{MapTransform, MercatorTransform};
use crate::{MapError, Result};
use once_cell::sync::Lazy;
use std::sync::Arc;

/// Trait representing anything that can produce tile images for an index.
///
/// `x` is always the wrapped index in `[0, 2^zoom)`.
pub trait TileSource: Send + Sync {
    /// Build a URI for the requested tile, if the source can address it.
    fn uri(&self, x: i32, y: i32, zoom_level: u8) -> Option<String>;

    /// What to hand to the image decoder. Programmatic sources override this
    /// to supply bytes directly.
    fn image_request(&self, x: i32, y: i32, zoom_level: u8) -> Option<ImageRequest> {
        self.uri(x, y, zoom_level).map(ImageRequest::Uri)
    }
}

/// The placeholder set a URI template was classified as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UriScheme {
    /// `{x}{y}{z}` with `{c}` cycling through `a`, `b`, `c`.
    LetterSubdomain,
    /// `{x}{y}{z}` with `{i}` in `0..=3`.
    NumericSubdomain,
    /// `{x}{y}{z}` with `{n}` in `1..=4`.
    OneBasedSubdomain,
    /// Plain `{x}{y}{z}`.
    Xyz,
    /// `{q}` quadkey, optionally with `{i}` as its first digit.
    QuadKey,
    /// `{W}{S}{E}{N}` bounding box in projected meters.
    ProjectedBoundingBox,
    /// `{w}{s}{e}{n}` bounding box in degrees.
    GeographicBoundingBox,
    /// `{x}{v}{z}` with a flipped y axis.
    Tms,
    /// No recognised placeholder set; every lookup yields `None`.
    Unclassified,
}

impl UriScheme {
    fn classify(format: &str) -> Self {
        let has = |token: &str| format.contains(token);
        let has_all = |tokens: &[&str]| tokens.iter().all(|token| format.contains(token));

        if has_all(&["{x}", "{y}", "{z}"]) {
            if has("{c}") {
                UriScheme::LetterSubdomain
            } else if has("{i}") {
                UriScheme::NumericSubdomain
            } else if has("{n}") {
                UriScheme::OneBasedSubdomain
            } else {
                UriScheme::Xyz
            }
        } else if has("{q}") {
            UriScheme::QuadKey
        } else if has_all(&["{W}", "{S}", "{E}", "{N}"]) {
            UriScheme::ProjectedBoundingBox
        } else if has_all(&["{w}", "{s}", "{e}", "{n}"]) {
            UriScheme::GeographicBoundingBox
        } else if has_all(&["{x}", "{v}", "{z}"]) {
            UriScheme::Tms
        } else {
            UriScheme::Unclassified
        }
    }
}

/// URI template tile source.
///
/// The template is classified once, at construction. See [`UriScheme`] for
/// the recognised placeholder sets.
#[derive(Debug, Clone, PartialEq)]
pub struct UriTileSource {
    uri_format: String,
    scheme: UriScheme,
    meters_per_degree: f64,
}

static OPEN_STREET_MAP: Lazy<Arc<UriTileSource>> = Lazy::new(|| {
    Arc::new(UriTileSource::classified(
        "https://{c}.tile.openstreetmap.org/{z}/{x}/{y}.png",
    ))
});

impl UriTileSource {
    /// Fails for an empty template or one with unbalanced braces.
    pub fn new(uri_format: impl Into<String>) -> Result<Self> {
        let uri_format = uri_format.into();
        validate_format(&uri_format)?;
        Ok(Self::classified(uri_format))
    }

    fn classified(uri_format: impl Into<String>) -> Self {
        let uri_format = uri_format.into();
        let scheme = UriScheme::classify(&uri_format);
        if scheme == UriScheme::Unclassified {
            log::warn!("tile URI format {uri_format:?} has no recognised placeholders");
        }
        Self {
            uri_format,
            scheme,
            meters_per_degree: METERS_PER_DEGREE,
        }
    }

    /// Shared OpenStreetMap source.
    pub fn open_street_map() -> Arc<UriTileSource> {
        OPEN_STREET_MAP.clone()
    }

    pub fn uri_format(&self) -> &str {
        &self.uri_format
    }

    pub fn scheme(&self) -> UriScheme {
        self.scheme
    }

    fn xyz(&self, x: i32, y: i32, zoom_level: u8) -> String {
        self.uri_format
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string())
            .replace("{z}", &zoom_level.to_string())
    }

    fn quad_key_uri(&self, x: i32, y: i32, zoom_level: u8) -> Option<String> {
        let key = quad_key(x, y, zoom_level)?;
        let mut uri = self.uri_format.replace("{q}", &key);
        if uri.contains("{i}") {
            uri = uri.replace("{i}", &key[..1]);
        }
        Some(uri)
    }

    fn projected_bounding_box(&self, x: i32, y: i32, zoom_level: u8) -> String {
        let tile_size = 360.0 / f64::from(1u32 << zoom_level);
        let (x, y) = (f64::from(x), f64::from(y));
        let west = self.meters_per_degree * (x * tile_size - 180.0);
        let east = self.meters_per_degree * ((x + 1.0) * tile_size - 180.0);
        let south = self.meters_per_degree * (180.0 - (y + 1.0) * tile_size);
        let north = self.meters_per_degree * (180.0 - y * tile_size);

        self.uri_format
            .replace("{W}", &west.to_string())
            .replace("{S}", &south.to_string())
            .replace("{E}", &east.to_string())
            .replace("{N}", &north.to_string())
    }

    fn geographic_bounding_box(&self, x: i32, y: i32, zoom_level: u8) -> String {
        let tile_size = 360.0 / f64::from(1u32 << zoom_level);
        let (x, y) = (f64::from(x), f64::from(y));
        let transform = MercatorTransform::new();
        let south_west = transform.inverse_transform(&Point::new(
            x * tile_size - 180.0,
            180.0 - (y + 1.0) * tile_size,
        ));
        let north_east = transform.inverse_transform(&Point::new(
            (x + 1.0) * tile_size - 180.0,
            180.0 - y * tile_size,
        ));

        self.uri_format
            .replace("{w}", &south_west.longitude().to_string())
            .replace("{s}", &south_west.latitude().to_string())
            .replace("{e}", &north_east.longitude().to_string())
            .replace("{n}", &north_east.latitude().to_string())
    }
}

impl TileSource for UriTileSource {
    fn uri(&self, x: i32, y: i32, zoom_level: u8) -> Option<String> {
        if zoom_level > MAX_TILE_ZOOM_LEVEL {
            log::trace!("no tile URI beyond zoom level {MAX_TILE_ZOOM_LEVEL}");
            return None;
        }

        let uri = match self.scheme {
            UriScheme::LetterSubdomain => {
                let letter = ["a", "b", "c"][(x + y).rem_euclid(3) as usize];
                self.xyz(x, y, zoom_level).replace("{c}", letter)
            }
            UriScheme::NumericSubdomain => self
                .xyz(x, y, zoom_level)
                .replace("{i}", &(x + y).rem_euclid(4).to_string()),
            UriScheme::OneBasedSubdomain => self
                .xyz(x, y, zoom_level)
                .replace("{n}", &((x + y).rem_euclid(4) + 1).to_string()),
            UriScheme::Xyz => self.xyz(x, y, zoom_level),
            UriScheme::QuadKey => return self.quad_key_uri(x, y, zoom_level),
            UriScheme::ProjectedBoundingBox => self.projected_bounding_box(x, y, zoom_level),
            UriScheme::GeographicBoundingBox => self.geographic_bounding_box(x, y, zoom_level),
            UriScheme::Tms => {
                let v = (1i32 << zoom_level) - 1 - y;
                self.uri_format
                    .replace("{x}", &x.to_string())
                    .replace("{v}", &v.to_string())
                    .replace("{z}", &zoom_level.to_string())
            }
            UriScheme::Unclassified => return None,
        };
        Some(uri)
    }
}

/// Quadkey of a tile: one digit per level, most significant level first.
/// Zoom level 0 and levels beyond `MAX_TILE_ZOOM_LEVEL` have no quadkey.
pub fn quad_key(x: i32, y: i32, zoom_level: u8) -> Option<String> {
    if zoom_level == 0 || zoom_level > MAX_TILE_ZOOM_LEVEL {
        return None;
    }

    let key = (1..=zoom_level)
        .rev()
        .map(|level| {
            let mask = 1i32 << (level - 1);
            let digit = u8::from(x & mask != 0) + 2 * u8::from(y & mask != 0);
            char::from(b'0' + digit)
        })
        .collect();
    Some(key)
}

fn validate_format(format: &str) -> Result<()> {
    if format.trim().is_empty() {
        return Err(MapError::InvalidUriFormat(
            "tile URI format must not be empty".to_string(),
        ));
    }

    let mut open = false;
    for (position, c) in format.char_indices() {
        match c {
            '{' if open => {
                return Err(MapError::InvalidUriFormat(format!(
                    "nested '{{' at byte {position} in {format:?}"
                )))
            }
            '{' => open = true,
            '}' if !open => {
                return Err(MapError::InvalidUriFormat(format!(
                    "unmatched '}}' at byte {position} in {format:?}"
                )))
            }
            '}' => open = false,
            _ => {}
        }
    }

    if open {
        return Err(MapError::InvalidUriFormat(format!(
            "unterminated placeholder in {format:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(format: &str) -> UriTileSource {
        UriTileSource::new(format).unwrap()
    }

    #[test]
    fn test_classification_priority() {
        assert_eq!(source("{c}/{z}/{x}/{y}").scheme(), UriScheme::LetterSubdomain);
        assert_eq!(source("{i}/{z}/{x}/{y}").scheme(), UriScheme::NumericSubdomain);
        assert_eq!(source("{n}/{z}/{x}/{y}").scheme(), UriScheme::OneBasedSubdomain);
        assert_eq!(source("{z}/{x}/{y}").scheme(), UriScheme::Xyz);
        assert_eq!(source("t{i}/{q}.png").scheme(), UriScheme::QuadKey);
        assert_eq!(source("bbox={W},{S},{E},{N}").scheme(), UriScheme::ProjectedBoundingBox);
        assert_eq!(source("bbox={w},{s},{e},{n}").scheme(), UriScheme::GeographicBoundingBox);
        assert_eq!(source("{z}/{x}/{v}").scheme(), UriScheme::Tms);
        assert_eq!(source("https://example.com/{foo}").scheme(), UriScheme::Unclassified);
    }

    #[test]
    fn test_invalid_formats_fail_at_construction() {
        assert!(matches!(UriTileSource::new(""), Err(MapError::InvalidUriFormat(_))));
        assert!(UriTileSource::new("   ").is_err());
        assert!(UriTileSource::new("{z}/{x/{y}").is_err());
        assert!(UriTileSource::new("{z}/x}/{y}").is_err());
        assert!(UriTileSource::new("{z}/{x}/{y").is_err());
    }

    #[test]
    fn test_unclassified_yields_none() {
        let source = source("https://example.com/static.png");
        assert_eq!(source.uri(1, 2, 3), None);
        assert_eq!(source.image_request(1, 2, 3), None);
    }

    #[test]
    fn test_letter_subdomain() {
        let source = source("https://{c}.tile.example.org/{z}/{x}/{y}.png");
        assert_eq!(
            source.uri(0, 0, 1).as_deref(),
            Some("https://a.tile.example.org/1/0/0.png")
        );
        assert_eq!(
            source.uri(1, 0, 1).as_deref(),
            Some("https://b.tile.example.org/1/1/0.png")
        );
        assert_eq!(
            source.uri(1, 1, 1).as_deref(),
            Some("https://c.tile.example.org/1/1/1.png")
        );
        assert_eq!(source.uri(2, 1, 2), source.uri(2, 1, 2));
    }

    #[test]
    fn test_numeric_subdomains() {
        assert_eq!(source("{i}/{z}/{x}/{y}").uri(3, 2, 4).as_deref(), Some("1/4/3/2"));
        assert_eq!(source("{n}/{z}/{x}/{y}").uri(3, 2, 4).as_deref(), Some("2/4/3/2"));
    }

    #[test]
    fn test_quad_key_table() {
        assert_eq!(quad_key(3, 5, 3).as_deref(), Some("213"));
        assert_eq!(quad_key(0, 0, 1).as_deref(), Some("0"));
        assert_eq!(quad_key(1, 1, 1).as_deref(), Some("3"));
        assert_eq!(quad_key(35210, 21493, 16).as_deref(), Some("1202102332221212"));
        assert_eq!(quad_key(0, 0, 0), None);
        assert_eq!(quad_key(0, 0, 40), None);

        let source = source("http://ecn.t{i}.tiles.example.net/tiles/r{q}.png");
        assert_eq!(
            source.uri(3, 5, 3).as_deref(),
            Some("http://ecn.t2.tiles.example.net/tiles/r213.png")
        );
        assert_eq!(source.uri(0, 0, 0), None);
    }

    #[test]
    fn test_tms_flips_y() {
        let source = source("{z}/{x}/{v}.png");
        assert_eq!(source.uri(5, 3, 4).as_deref(), Some("4/5/12.png"));
    }

    #[test]
    fn test_projected_bounding_box() {
        let source = source("{W},{S},{E},{N}");
        let uri = source.uri(0, 0, 0).unwrap();
        let values: Vec<f64> = uri.split(',').map(|v| v.parse().unwrap()).collect();
        let half_world = METERS_PER_DEGREE * 180.0;
        assert!((values[0] + half_world).abs() < 1e-6);
        assert!((values[1] + half_world).abs() < 1e-6);
        assert!((values[2] - half_world).abs() < 1e-6);
        assert!((values[3] - half_world).abs() < 1e-6);
    }

    #[test]
    fn test_geographic_bounding_box() {
        let source = source("{w},{s},{e},{n}");
        let uri = source.uri(1, 0, 1).unwrap();
        let values: Vec<f64> = uri.split(',').map(|v| v.parse().unwrap()).collect();
        let max = MercatorTransform::max_latitude_value();
        assert!(values[0].abs() < 1e-9);
        assert!(values[1].abs() < 1e-9);
        assert!((values[2] - 180.0).abs() < 1e-9);
        assert!((values[3] - max).abs() < 1e-9);
    }

    #[test]
    fn test_levels_beyond_the_pyramid_have_no_uri() {
        for format in ["{z}/{x}/{y}", "{z}/{x}/{v}", "{W},{S},{E},{N}", "{w},{s},{e},{n}", "{q}"] {
            let source = source(format);
            assert_eq!(source.uri(0, 0, 40), None, "{format}");
            assert_eq!(source.image_request(0, 0, 32), None, "{format}");
            assert!(source.uri(0, 0, MAX_TILE_ZOOM_LEVEL).is_some(), "{format}");
        }
    }

    #[test]
    fn test_open_street_map_is_shared() {
        let a = UriTileSource::open_street_map();
        let b = UriTileSource::open_street_map();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.scheme(), UriScheme::LetterSubdomain);
    }
}
