//! Engine-wide constants.

/// Native square tile size in pixels.
pub const TILE_SIZE: u32 = 256;

/// Upper bound for `MapBase::max_zoom_level`.
pub const MAX_ZOOM_LEVEL: f64 = 22.0;

/// Deepest tile pyramid level that can be addressed, i.e. `MAX_ZOOM_LEVEL`.
pub const MAX_TILE_ZOOM_LEVEL: u8 = 22;

/// WGS84 semi-major axis in meters.
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Meters per degree of longitude at the equator.
pub const METERS_PER_DEGREE: f64 = EARTH_RADIUS * std::f64::consts::PI / 180.0;

/// Tiles switch to the next zoom level once they are scaled down to 75%.
pub fn zoom_level_switch_delta() -> f64 {
    -(0.75_f64).log2()
}

/// Default duration of Center/ZoomLevel/Heading animations.
pub const DEFAULT_ANIMATION_DURATION_MS: u64 = 500;

/// Settle interval before the tile grid is recomputed.
pub const DEFAULT_TILE_UPDATE_INTERVAL_MS: u64 = 500;

/// Default tile opacity fade-in.
pub const DEFAULT_OPACITY_FADE_MS: u64 = 200;

/// Latitude tolerance used when re-checking the centre after a pivoted transform.
pub const CENTER_LATITUDE_EPSILON: f64 = 1e-9;
