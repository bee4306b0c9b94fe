//! Configuration for the map viewport and tile layers
//!
//! Options are plain structs with sensible defaults. They can be built in
//! code, resolved from a [`TileLoadingProfile`] preset, or read from JSON
//! strings and files.

use crate::core::constants::{
    zoom_level_switch_delta, DEFAULT_ANIMATION_DURATION_MS, DEFAULT_OPACITY_FADE_MS,
    DEFAULT_TILE_UPDATE_INTERVAL_MS, MAX_ZOOM_LEVEL, TILE_SIZE,
};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Viewport behaviour of a `MapBase`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapOptions {
    pub min_zoom_level: f64,
    pub max_zoom_level: f64,
    /// Duration of Center/ZoomLevel/Heading animations, in milliseconds.
    pub animation_duration_ms: u64,
    /// Settle interval before the visible tile set is recomputed, in milliseconds.
    pub tile_update_interval_ms: u64,
    pub zoom_level_switch_delta: f64,
    pub tile_size: u32,
    /// Zoom change per wheel notch (120 units).
    pub mouse_wheel_zoom_change: f64,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            min_zoom_level: 1.0,
            max_zoom_level: 18.0,
            animation_duration_ms: DEFAULT_ANIMATION_DURATION_MS,
            tile_update_interval_ms: DEFAULT_TILE_UPDATE_INTERVAL_MS,
            zoom_level_switch_delta: zoom_level_switch_delta(),
            tile_size: TILE_SIZE,
            mouse_wheel_zoom_change: 1.0,
        }
    }
}

impl MapOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        let mut options: Self = serde_json::from_str(json)?;
        options.validate();
        Ok(options)
    }

    /// Reads JSON options from `path`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("loading map options from {}", path.display());
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn animation_duration(&self) -> Duration {
        Duration::from_millis(self.animation_duration_ms)
    }

    pub fn tile_update_interval(&self) -> Duration {
        Duration::from_millis(self.tile_update_interval_ms)
    }

    /// Brings inconsistent values back into range.
    pub fn validate(&mut self) {
        self.max_zoom_level = self.max_zoom_level.clamp(0.0, MAX_ZOOM_LEVEL);
        self.min_zoom_level = self.min_zoom_level.clamp(0.0, self.max_zoom_level);
        if self.tile_size == 0 {
            self.tile_size = TILE_SIZE;
        }
    }
}

/// Behaviour of a single `TileLayer`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileLayerOptions {
    pub min_zoom_level: u8,
    pub max_zoom_level: u8,
    pub max_parallel_downloads: usize,
    /// Only honoured for the bottom layer of a container.
    pub load_lower_zoom_levels: bool,
    pub animate_opacity: bool,
    pub opacity_fade_ms: u64,
    /// Number of failed attempts after which a tile is no longer requested.
    pub max_retries: u32,
}

impl Default for TileLayerOptions {
    fn default() -> Self {
        TileLoadingProfile::default().resolve()
    }
}

impl TileLayerOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        let mut options: Self = serde_json::from_str(json)?;
        options.validate();
        Ok(options)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("loading tile layer options from {}", path.display());
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn opacity_fade(&self) -> Duration {
        Duration::from_millis(self.opacity_fade_ms)
    }

    pub fn validate(&mut self) {
        self.max_zoom_level = self.max_zoom_level.min(MAX_ZOOM_LEVEL as u8);
        self.min_zoom_level = self.min_zoom_level.min(self.max_zoom_level);
        self.max_parallel_downloads = self.max_parallel_downloads.max(1);
    }
}

/// Presets for [`TileLayerOptions`].
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TileLoadingProfile {
    #[default]
    Balanced,
    LowBandwidth,
    Aggressive,
    Custom(TileLayerOptions),
}

impl TileLoadingProfile {
    pub fn resolve(&self) -> TileLayerOptions {
        match self {
            Self::Balanced => TileLayerOptions {
                min_zoom_level: 0,
                max_zoom_level: 18,
                max_parallel_downloads: 8,
                load_lower_zoom_levels: true,
                animate_opacity: true,
                opacity_fade_ms: DEFAULT_OPACITY_FADE_MS,
                max_retries: 2,
            },
            Self::LowBandwidth => TileLayerOptions {
                min_zoom_level: 0,
                max_zoom_level: 18,
                max_parallel_downloads: 2,
                load_lower_zoom_levels: false,
                animate_opacity: false,
                opacity_fade_ms: 0,
                max_retries: 1,
            },
            Self::Aggressive => TileLayerOptions {
                min_zoom_level: 0,
                max_zoom_level: 19,
                max_parallel_downloads: 16,
                load_lower_zoom_levels: true,
                animate_opacity: true,
                opacity_fade_ms: DEFAULT_OPACITY_FADE_MS,
                max_retries: 4,
            },
            Self::Custom(options) => {
                let mut options = options.clone();
                options.validate();
                options
            }
        }
    }
}
