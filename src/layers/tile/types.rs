//! Core data types for tile layer functionality

use super::image::ImageHandle;
use crate::core::constants::MAX_TILE_ZOOM_LEVEL;
use crate::traits::Lerp;
use instant::Instant;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Identity of a tile: zoom level plus the raw, unwrapped x index and y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileKey {
    pub zoom_level: u8,
    pub x: i32,
    pub y: i32,
}

impl TileKey {
    pub fn new(zoom_level: u8, x: i32, y: i32) -> Self {
        Self { zoom_level, x, y }
    }

    /// Number of tiles along one axis at this zoom level. Levels beyond
    /// `MAX_TILE_ZOOM_LEVEL` count as that level.
    pub fn tiles_per_axis(&self) -> i32 {
        1 << self.zoom_level.min(MAX_TILE_ZOOM_LEVEL)
    }

    /// x wrapped into `[0, 2^zoom)`.
    pub fn x_index(&self) -> i32 {
        self.x.rem_euclid(self.tiles_per_axis())
    }

    /// Same zoom, same y, same wrapped x.
    pub fn is_equivalent(&self, other: &TileKey) -> bool {
        self.zoom_level == other.zoom_level
            && self.y == other.y
            && self.x_index() == other.x_index()
    }

    /// The key with x wrapped, shared by every date-line equivalent tile.
    pub fn canonical(&self) -> TileKey {
        TileKey::new(self.zoom_level, self.x_index(), self.y)
    }
}

/// Inclusive integer rectangle in tile-index space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TileGrid {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
}

impl TileGrid {
    pub fn new(x_min: i32, y_min: i32, x_max: i32, y_max: i32) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    pub fn width(&self) -> i32 {
        (self.x_max - self.x_min + 1).max(0)
    }

    pub fn height(&self) -> i32 {
        (self.y_max - self.y_min + 1).max(0)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x_min && x <= self.x_max && y >= self.y_min && y <= self.y_max
    }

    /// The range covering this grid at a coarser level, `levels` steps up.
    ///
    /// Both edges use floor division so negative x indices map correctly.
    pub fn coarsen(&self, levels: u8) -> TileGrid {
        let factor = 1i32 << levels.min(MAX_TILE_ZOOM_LEVEL);
        TileGrid::new(
            self.x_min.div_euclid(factor),
            self.y_min.div_euclid(factor),
            self.x_max.div_euclid(factor),
            self.y_max.div_euclid(factor),
        )
    }
}

/// Where a tile is in its image lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TileImageState {
    /// Never requested.
    #[default]
    Pending,
    /// A request was issued and has not completed.
    Requested,
    Loaded,
    /// Every request so far failed.
    Failed { attempts: u32 },
}

/// One cell of the tile pyramid and the state of its image.
#[derive(Debug, Clone)]
pub struct Tile {
    key: TileKey,
    image: Option<ImageHandle>,
    state: TileImageState,
    failed_attempts: u32,
    opacity: f64,
    fade_start: Option<Instant>,
}

impl Tile {
    pub fn new(zoom_level: u8, x: i32, y: i32) -> Self {
        Self::from_key(TileKey::new(zoom_level, x, y))
    }

    pub fn from_key(key: TileKey) -> Self {
        Self {
            key,
            image: None,
            state: TileImageState::Pending,
            failed_attempts: 0,
            opacity: 0.0,
            fade_start: None,
        }
    }

    pub fn key(&self) -> TileKey {
        self.key
    }

    pub fn zoom_level(&self) -> u8 {
        self.key.zoom_level
    }

    pub fn x(&self) -> i32 {
        self.key.x
    }

    pub fn y(&self) -> i32 {
        self.key.y
    }

    pub fn x_index(&self) -> i32 {
        self.key.x_index()
    }

    pub fn image(&self) -> Option<&ImageHandle> {
        self.image.as_ref()
    }

    pub fn image_state(&self) -> TileImageState {
        self.state
    }

    /// A request has been issued or an image is present.
    pub fn has_image_source(&self) -> bool {
        matches!(
            self.state,
            TileImageState::Requested | TileImageState::Loaded
        )
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    pub fn is_fading(&self) -> bool {
        self.fade_start.is_some()
    }

    /// Whether the loader should be asked for this tile.
    pub fn needs_image(&self, max_retries: u32) -> bool {
        match self.state {
            TileImageState::Pending => true,
            TileImageState::Failed { attempts } => attempts < max_retries,
            TileImageState::Requested | TileImageState::Loaded => false,
        }
    }

    pub(crate) fn mark_requested(&mut self) {
        self.state = TileImageState::Requested;
    }

    /// Takes over the image of a date-line equivalent tile, fully opaque.
    pub(crate) fn seed_from(&mut self, other: &Tile) {
        if let Some(image) = other.image.clone() {
            self.image = Some(image);
            self.state = TileImageState::Loaded;
            self.opacity = 1.0;
            self.fade_start = None;
        }
    }

    /// Stores a loaded image, starting a fade-in when `fade_start` is given.
    pub(crate) fn set_image(&mut self, image: ImageHandle, fade_start: Option<Instant>) {
        self.image = Some(image);
        self.state = TileImageState::Loaded;
        self.failed_attempts = 0;
        match fade_start {
            Some(start) => {
                self.opacity = 0.0;
                self.fade_start = Some(start);
            }
            None => {
                self.opacity = 1.0;
                self.fade_start = None;
            }
        }
    }

    pub(crate) fn set_failed(&mut self) {
        self.image = None;
        self.failed_attempts += 1;
        self.state = TileImageState::Failed {
            attempts: self.failed_attempts,
        };
        self.opacity = 0.0;
        self.fade_start = None;
    }

    /// Request was dropped before it started; the tile may be asked for again.
    pub(crate) fn reset_request(&mut self) {
        if self.state == TileImageState::Requested {
            self.state = if self.failed_attempts > 0 {
                TileImageState::Failed {
                    attempts: self.failed_attempts,
                }
            } else {
                TileImageState::Pending
            };
        }
    }

    /// Advances the opacity fade. Returns true while the opacity changed.
    pub(crate) fn update_opacity(&mut self, now: Instant, duration: Duration) -> bool {
        let Some(start) = self.fade_start else {
            return false;
        };

        let t = if duration.is_zero() {
            1.0
        } else {
            now.saturating_duration_since(start).as_secs_f64() / duration.as_secs_f64()
        };

        if t >= 1.0 {
            self.opacity = 1.0;
            self.fade_start = None;
        } else {
            self.opacity = 0.0_f64.lerp(&1.0, t.max(0.0));
        }
        true
    }
}
