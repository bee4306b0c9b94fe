use super::image::ImageHandle;
use super::loader::TileImageLoader;
use super::source::{TileSource, UriTileSource};
use super::types::{Tile, TileGrid, TileImageState, TileKey};
use crate::core::config::{TileLayerOptions, TileLoadingProfile};
use crate::core::constants::MAX_TILE_ZOOM_LEVEL;
use crate::core::geo::Rect;
use crate::runtime::MapServices;
use fxhash::FxHashMap as HashMap;
use instant::Instant;
use std::sync::Arc;

/// What the host needs to draw one tile: a rectangle in the layer's tile
/// pixel space (see `TileContainer::tile_layer_transform`), an opacity and
/// the decoded image, if any.
#[derive(Debug, Clone)]
pub struct TileRenderItem {
    pub key: TileKey,
    pub rect: Rect,
    pub opacity: f64,
    pub image: Option<ImageHandle>,
}

/// Selects and holds the visible tiles of one map layer.
///
/// The current tile list is the only cache: tiles that fall out of a
/// selection are dropped.
pub struct TileLayer {
    source: Arc<dyn TileSource>,
    options: TileLayerOptions,
    tiles: Vec<Tile>,
    index: HashMap<TileKey, usize>,
    /// Tile positions by canonical key.
    equivalents: HashMap<TileKey, Vec<usize>>,
    grid: Option<TileGrid>,
    zoom_level: u8,
    tile_size: u32,
    loader: Option<TileImageLoader>,
}

impl TileLayer {
    pub fn new(source: Arc<dyn TileSource>, options: TileLayerOptions) -> Self {
        let mut options = options;
        options.validate();
        Self {
            source,
            options,
            tiles: Vec::new(),
            index: HashMap::default(),
            equivalents: HashMap::default(),
            grid: None,
            zoom_level: 0,
            tile_size: crate::core::constants::TILE_SIZE,
            loader: None,
        }
    }

    pub fn with_profile(source: Arc<dyn TileSource>, profile: TileLoadingProfile) -> Self {
        Self::new(source, profile.resolve())
    }

    /// OpenStreetMap with default options.
    pub fn open_street_map() -> Self {
        Self::new(UriTileSource::open_street_map(), TileLayerOptions::default())
    }

    pub fn source(&self) -> &Arc<dyn TileSource> {
        &self.source
    }

    pub fn options(&self) -> &TileLayerOptions {
        &self.options
    }

    /// Current tiles ordered by zoom level, then y, then x.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tile(&self, key: &TileKey) -> Option<&Tile> {
        self.index.get(key).map(|&i| &self.tiles[i])
    }

    /// Grid and zoom level of the last selection.
    pub fn grid(&self) -> Option<TileGrid> {
        self.grid
    }

    pub fn zoom_level(&self) -> u8 {
        self.zoom_level
    }

    pub fn is_loading(&self) -> bool {
        self.loader.as_ref().is_some_and(|loader| !loader.is_idle())
    }

    pub fn has_fading_tiles(&self) -> bool {
        self.tiles.iter().any(Tile::is_fading)
    }

    /// Wires the layer to the host services. Called by the container.
    pub(crate) fn attach(&mut self, services: MapServices, tile_size: u32) {
        self.tile_size = tile_size;
        self.loader = Some(TileImageLoader::new(
            services,
            self.options.max_parallel_downloads,
        ));
    }

    /// Queued requests are dropped and their tiles go back to waiting.
    pub(crate) fn detach(&mut self) {
        self.cancel_get_tiles();
        self.loader = None;
    }

    /// Zoom levels to load for `zoom_level`, lowest first. Empty when the
    /// requested level lies below the layer's minimum.
    pub fn zoom_range(&self, zoom_level: u8, is_base_layer: bool) -> std::ops::RangeInclusive<u8> {
        let max = zoom_level.min(self.options.max_zoom_level);
        let min = if self.options.load_lower_zoom_levels && is_base_layer {
            self.options.min_zoom_level
        } else {
            max.max(self.options.min_zoom_level)
        };
        min..=max
    }

    /// Replaces the tile set with the selection for `grid` at `zoom_level`
    /// and requests images for tiles that still need one.
    ///
    /// Queued requests for tiles that left the selection are dropped first so
    /// they cannot hold up the visible ones.
    pub fn update_tiles(&mut self, zoom_level: u8, grid: TileGrid, is_base_layer: bool) {
        let zoom_level = zoom_level.min(MAX_TILE_ZOOM_LEVEL);
        self.zoom_level = zoom_level;
        self.grid = Some(grid);

        let mut previous: HashMap<TileKey, Tile> = self
            .tiles
            .drain(..)
            .map(|tile| (tile.key(), tile))
            .collect();
        let mut tiles = Vec::new();

        for z in self.zoom_range(zoom_level, is_base_layer) {
            let range = grid.coarsen(zoom_level - z);
            let max_y = (1i32 << z) - 1;
            let y_min = range.y_min.clamp(0, max_y);
            let y_max = range.y_max.clamp(0, max_y);

            for y in y_min..=y_max {
                for x in range.x_min..=range.x_max {
                    let key = TileKey::new(z, x, y);
                    let tile = previous.remove(&key).unwrap_or_else(|| {
                        let mut tile = Tile::from_key(key);
                        if let Some(equivalent) = previous
                            .values()
                            .chain(tiles.iter())
                            .find(|other| other.image().is_some() && key.is_equivalent(&other.key()))
                        {
                            tile.seed_from(equivalent);
                        }
                        tile
                    });
                    tiles.push(tile);
                }
            }
        }

        self.index = tiles
            .iter()
            .enumerate()
            .map(|(i, tile)| (tile.key(), i))
            .collect();
        self.equivalents.clear();
        for (i, tile) in tiles.iter().enumerate() {
            self.equivalents.entry(tile.key().canonical()).or_default().push(i);
        }
        self.tiles = tiles;

        log::debug!(
            "tile layer selected {} tiles at zoom {} (base layer: {}), dropped {}",
            self.tiles.len(),
            zoom_level,
            is_base_layer,
            previous.len()
        );

        if let Some(loader) = self.loader.as_mut() {
            let equivalents = &self.equivalents;
            loader.retain_queued(|key| equivalents.contains_key(key));
            loader.begin_get_tiles(self.source.as_ref(), &mut self.tiles, self.options.max_retries);
        }
    }

    /// Positions of every tile sharing `canonical`'s image.
    fn equivalent_tiles(&self, canonical: &TileKey) -> Vec<usize> {
        self.equivalents.get(canonical).cloned().unwrap_or_default()
    }

    /// Drops requests that have not started. Their tiles become requestable
    /// again on the next selection.
    pub fn cancel_get_tiles(&mut self) {
        let Some(loader) = self.loader.as_mut() else {
            return;
        };
        for key in loader.cancel_get_tiles() {
            for i in self.equivalent_tiles(&key) {
                self.tiles[i].reset_request();
            }
        }
    }

    /// Applies completed loads to tiles still in the set. Returns true if any
    /// tile changed.
    pub fn process_loaded_images(&mut self, now: Instant) -> bool {
        let fade_start = (self.options.animate_opacity && !self.options.opacity_fade().is_zero())
            .then_some(now);

        let mut changed = false;
        loop {
            let completed = match self.loader.as_mut() {
                Some(loader) => loader.drain_completed(),
                None => return changed,
            };
            if completed.is_empty() {
                break;
            }

            for loaded in completed {
                let targets: Vec<usize> = self
                    .equivalent_tiles(&loaded.key)
                    .into_iter()
                    .filter(|&i| self.tiles[i].image_state() != TileImageState::Loaded)
                    .collect();
                if targets.is_empty() {
                    log::trace!("discarding image for stale tile {:?}", loaded.key);
                    continue;
                }

                match loaded.result {
                    Ok(image) => {
                        for i in targets {
                            self.tiles[i].set_image(image.clone(), fade_start);
                        }
                    }
                    Err(e) => {
                        log::warn!("failed to load tile {:?}: {}", loaded.key, e);
                        for i in targets {
                            self.tiles[i].set_failed();
                        }
                    }
                }
                changed = true;
            }
        }
        changed
    }

    /// Advances opacity fades. Returns true if any opacity changed.
    pub fn update_opacity(&mut self, now: Instant) -> bool {
        let fade = self.options.opacity_fade();
        let mut changed = false;
        for tile in &mut self.tiles {
            changed |= tile.update_opacity(now, fade);
        }
        changed
    }

    /// One render item per tile, in tile order. Rectangles are in tile pixels
    /// at the selection's zoom level, so coarser tiles cover larger squares.
    pub fn render_items(&self) -> Vec<TileRenderItem> {
        self.tiles
            .iter()
            .map(|tile| {
                let size = f64::from(self.tile_size)
                    * f64::from(1u32 << (self.zoom_level - tile.zoom_level()));
                TileRenderItem {
                    key: tile.key(),
                    rect: Rect::new(
                        f64::from(tile.x()) * size,
                        f64::from(tile.y()) * size,
                        size,
                        size,
                    ),
                    opacity: tile.opacity(),
                    image: tile.image().cloned(),
                }
            })
            .collect()
    }

    /// Drops all tiles.
    pub fn clear(&mut self) {
        self.cancel_get_tiles();
        self.tiles.clear();
        self.index.clear();
        self.equivalents.clear();
        self.grid = None;
    }
}

impl std::fmt::Debug for TileLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileLayer")
            .field("options", &self.options)
            .field("tiles", &self.tiles.len())
            .field("grid", &self.grid)
            .field("zoom_level", &self.zoom_level)
            .field("loader", &self.loader)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(load_lower: bool) -> TileLayer {
        TileLayer::new(
            Arc::new(UriTileSource::new("{z}/{x}/{y}").unwrap()),
            TileLayerOptions {
                min_zoom_level: 1,
                max_zoom_level: 18,
                load_lower_zoom_levels: load_lower,
                ..TileLayerOptions::default()
            },
        )
    }

    #[test]
    fn test_zoom_range() {
        let base = layer(true);
        assert_eq!(base.zoom_range(10, true), 1..=10);
        assert_eq!(base.zoom_range(10, false), 10..=10);
        assert_eq!(base.zoom_range(20, true), 1..=18);
        assert!(base.zoom_range(0, true).is_empty());
        assert!(base.zoom_range(0, false).is_empty());
        assert_eq!(layer(false).zoom_range(10, true), 10..=10);
    }

    #[test]
    fn test_selection_order_and_y_clamp() {
        let mut layer = layer(false);
        layer.update_tiles(2, TileGrid::new(-1, -2, 1, 5), true);

        let keys: Vec<_> = layer.tiles().iter().map(|t| (t.y(), t.x())).collect();
        let expected: Vec<_> = (0..=3).flat_map(|y| (-1..=1).map(move |x| (y, x))).collect();
        assert_eq!(keys, expected);
    }

    #[test]
    fn test_existing_tiles_are_reused() {
        let mut layer = layer(false);
        layer.update_tiles(3, TileGrid::new(0, 0, 2, 2), true);
        layer.tiles[0].set_image(ImageHandle::new(1u8), None);
        let image = layer.tiles()[0].image().cloned().unwrap();

        layer.update_tiles(3, TileGrid::new(0, 0, 3, 3), true);
        assert_eq!(layer.tiles().len(), 16);
        let tile = layer.tile(&TileKey::new(3, 0, 0)).unwrap();
        assert!(tile.image().unwrap().ptr_eq(&image));
    }

    #[test]
    fn test_render_items_scale_coarser_tiles() {
        let mut layer = layer(true);
        layer.update_tiles(3, TileGrid::new(2, 2, 3, 3), true);

        let items = layer.render_items();
        assert_eq!(items.len(), layer.tiles().len());

        let coarse = items.iter().find(|i| i.key == TileKey::new(1, 0, 0)).unwrap();
        assert_eq!(coarse.rect, Rect::new(0.0, 0.0, 1024.0, 1024.0));
        let fine = items.iter().find(|i| i.key == TileKey::new(3, 3, 2)).unwrap();
        assert_eq!(fine.rect, Rect::new(768.0, 512.0, 256.0, 256.0));
    }
}
