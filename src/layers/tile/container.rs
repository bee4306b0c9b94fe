//! Owner of the tile layers and of the viewport transform they are drawn with.
//!
//! Transforms follow every viewport change immediately. Tile reselection is
//! debounced: it runs once the viewport has been quiet for the configured
//! interval, except when the map origin leaps across the date line, which
//! reselects synchronously.

use super::layer::TileLayer;
use super::types::TileGrid;
use crate::core::config::MapOptions;
use crate::core::constants::MAX_ZOOM_LEVEL;
use crate::core::geo::{Point, Size};
use crate::runtime::MapServices;
use instant::Instant;
use nalgebra::{Affine2, Matrix3, Rotation2, Vector2};
use std::time::Duration;

pub struct TileContainer {
    services: MapServices,
    layers: Vec<TileLayer>,
    tile_size: u32,
    zoom_level_switch_delta: f64,
    update_interval: Duration,

    zoom_level: f64,
    rotation: f64,
    map_origin: Point,
    viewport_origin: Point,
    viewport_size: Size,
    has_viewport: bool,

    viewport_transform: Affine2<f64>,
    tile_layer_transform: Affine2<f64>,
    tile_zoom_level: u8,
    tile_grid: TileGrid,
    pending_update: Option<Instant>,
}

impl TileContainer {
    pub fn new(services: MapServices, options: &MapOptions) -> Self {
        Self {
            services,
            layers: Vec::new(),
            tile_size: options.tile_size,
            zoom_level_switch_delta: options.zoom_level_switch_delta,
            update_interval: options.tile_update_interval(),
            zoom_level: 0.0,
            rotation: 0.0,
            map_origin: Point::default(),
            viewport_origin: Point::default(),
            viewport_size: Size::default(),
            has_viewport: false,
            viewport_transform: Affine2::identity(),
            tile_layer_transform: Affine2::identity(),
            tile_zoom_level: 0,
            tile_grid: TileGrid::default(),
            pending_update: None,
        }
    }

    /// Layers in paint order; the first one is the base layer.
    pub fn layers(&self) -> &[TileLayer] {
        &self.layers
    }

    pub fn layer(&self, index: usize) -> Option<&TileLayer> {
        self.layers.get(index)
    }

    pub fn add_layer(&mut self, layer: TileLayer) {
        self.insert_layer(self.layers.len(), layer);
    }

    /// Inserts at `index`, clamped to the layer count.
    pub fn insert_layer(&mut self, index: usize, mut layer: TileLayer) {
        layer.attach(self.services.clone(), self.tile_size);
        let index = index.min(self.layers.len());
        self.layers.insert(index, layer);
        self.reselect_layers();
    }

    pub fn remove_layer(&mut self, index: usize) -> Option<TileLayer> {
        if index >= self.layers.len() {
            return None;
        }
        let mut layer = self.layers.remove(index);
        layer.detach();
        self.reselect_layers();
        Some(layer)
    }

    /// Base-layer status depends on position, so every layer is reselected.
    fn reselect_layers(&mut self) {
        if self.has_viewport {
            self.update_tiles();
        }
    }

    /// Pixels per degree of longitude for a continuous zoom level.
    pub fn viewport_scale(&self, zoom_level: f64) -> f64 {
        2f64.powf(zoom_level) * f64::from(self.tile_size) / 360.0
    }

    /// Updates the map-to-viewport transform and returns its scale in
    /// pixels per degree.
    ///
    /// `map_origin` (map coordinates) is placed at `viewport_origin`
    /// (viewport pixels), and the map is rotated by `rotation` degrees about
    /// that viewport point.
    pub fn set_viewport_transform(
        &mut self,
        zoom_level: f64,
        rotation: f64,
        map_origin: Point,
        viewport_origin: Point,
        viewport_size: Size,
    ) -> f64 {
        let previous_origin_x = self.map_origin.x;
        let scale = self.viewport_scale(zoom_level);

        self.zoom_level = zoom_level;
        self.rotation = rotation;
        self.map_origin = map_origin;
        self.viewport_origin = viewport_origin;
        self.viewport_size = viewport_size;
        self.has_viewport = true;

        // rightmost factor applies first; map y grows up, viewport y down
        self.viewport_transform = Affine2::from_matrix_unchecked(
            translation(viewport_origin.x, viewport_origin.y)
                * Rotation2::new(rotation.to_radians()).to_homogeneous()
                * Matrix3::new_nonuniform_scaling(&Vector2::new(scale, -scale))
                * translation(-map_origin.x, -map_origin.y),
        );
        self.update_tile_layer_transform();

        let leaped = sign(previous_origin_x) != sign(map_origin.x) && map_origin.x.abs() > 90.0;
        if leaped {
            log::debug!(
                "map origin leapt across the date line ({previous_origin_x:.3} -> {:.3})",
                map_origin.x
            );
            self.update_tiles();
        } else {
            let deadline = self.services.now() + self.update_interval;
            log::trace!("tile update deferred by {:?}", self.update_interval);
            self.pending_update = Some(deadline);
        }

        scale
    }

    fn update_tile_layer_transform(&mut self) {
        let tile_scale = 360.0 / (f64::from(self.tile_size) * 2f64.powi(i32::from(self.tile_zoom_level)));
        let tile_to_map = Affine2::from_matrix_unchecked(
            translation(-180.0, 180.0)
                * Matrix3::new_nonuniform_scaling(&Vector2::new(tile_scale, -tile_scale)),
        );
        self.tile_layer_transform = self.viewport_transform * tile_to_map;
    }

    /// Integer zoom level tiles are selected at for a continuous zoom level.
    pub fn tile_zoom_level_for(&self, zoom_level: f64) -> u8 {
        (zoom_level + self.zoom_level_switch_delta)
            .floor()
            .clamp(0.0, MAX_ZOOM_LEVEL) as u8
    }

    /// Recomputes the tile zoom level and visible grid, then reselects every
    /// layer.
    pub fn update_tiles(&mut self) {
        self.pending_update = None;
        self.tile_zoom_level = self.tile_zoom_level_for(self.zoom_level);
        self.update_tile_layer_transform();

        let tile_size = f64::from(self.tile_size);
        let index_to_viewport = self.tile_layer_transform
            * Affine2::from_matrix_unchecked(Matrix3::new_scaling(tile_size));
        let Some(viewport_to_index) = index_to_viewport.try_inverse() else {
            log::warn!("viewport transform is not invertible; keeping tiles");
            return;
        };

        let (width, height) = (self.viewport_size.width, self.viewport_size.height);
        let corners = [
            Point::new(0.0, 0.0),
            Point::new(width, 0.0),
            Point::new(0.0, height),
            Point::new(width, height),
        ]
        .map(|corner| Point::from(viewport_to_index.transform_point(&corner.into())));

        let (mut x_min, mut y_min) = (f64::INFINITY, f64::INFINITY);
        let (mut x_max, mut y_max) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for corner in corners {
            x_min = x_min.min(corner.x);
            y_min = y_min.min(corner.y);
            x_max = x_max.max(corner.x);
            y_max = y_max.max(corner.y);
        }

        self.tile_grid = TileGrid::new(
            x_min.floor() as i32,
            y_min.floor() as i32,
            x_max.floor() as i32,
            y_max.floor() as i32,
        );

        log::debug!(
            "updating tiles: zoom {:.3} -> tile zoom {}, grid {:?}",
            self.zoom_level,
            self.tile_zoom_level,
            self.tile_grid
        );

        for (i, layer) in self.layers.iter_mut().enumerate() {
            layer.update_tiles(self.tile_zoom_level, self.tile_grid, i == 0);
        }
    }

    /// Runs a debounced tile update if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.pending_update {
            Some(deadline) if now >= deadline => {
                self.update_tiles();
                true
            }
            _ => false,
        }
    }

    /// When the pending tile update is due.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending_update
    }

    pub fn has_pending_update(&self) -> bool {
        self.pending_update.is_some()
    }

    pub fn process_loaded_images(&mut self, now: Instant) -> bool {
        let mut changed = false;
        for layer in &mut self.layers {
            changed |= layer.process_loaded_images(now);
        }
        changed
    }

    pub fn has_fading_tiles(&self) -> bool {
        self.layers.iter().any(TileLayer::has_fading_tiles)
    }

    pub fn is_loading(&self) -> bool {
        self.layers.iter().any(TileLayer::is_loading)
    }

    /// Debounce, completed loads and opacity fades. Returns true if any tile
    /// changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut changed = self.poll(now);
        changed |= self.process_loaded_images(now);
        for layer in &mut self.layers {
            changed |= layer.update_opacity(now);
        }
        changed
    }

    pub fn cancel_get_tiles(&mut self) {
        for layer in &mut self.layers {
            layer.cancel_get_tiles();
        }
    }

    /// Map coordinates to viewport pixels.
    pub fn viewport_transform(&self) -> Affine2<f64> {
        self.viewport_transform
    }

    /// Tile pixels at the current tile zoom level to viewport pixels.
    pub fn tile_layer_transform(&self) -> Affine2<f64> {
        self.tile_layer_transform
    }

    pub fn tile_zoom_level(&self) -> u8 {
        self.tile_zoom_level
    }

    pub fn tile_grid(&self) -> TileGrid {
        self.tile_grid
    }
}

fn translation(dx: f64, dy: f64) -> Matrix3<f64> {
    Matrix3::new_translation(&Vector2::new(dx, dy))
}

fn sign(value: f64) -> i8 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

impl std::fmt::Debug for TileContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileContainer")
            .field("layers", &self.layers)
            .field("zoom_level", &self.zoom_level)
            .field("rotation", &self.rotation)
            .field("map_origin", &self.map_origin)
            .field("tile_zoom_level", &self.tile_zoom_level)
            .field("tile_grid", &self.tile_grid)
            .field("pending_update", &self.pending_update)
            .finish()
    }
}
