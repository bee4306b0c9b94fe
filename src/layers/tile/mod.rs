//! Tile pipeline
//!
//! - [`source`]: tile index to URI (or bytes) templating
//! - [`types`]: tile identity, grids and image state
//! - [`image`] and [`loader`]: asynchronous image loading through the host
//! - [`layer`]: per-layer tile selection across zoom levels
//! - [`container`]: viewport transform and debounced reselection

pub mod container;
pub mod image;
pub mod layer;
pub mod loader;
pub mod source;
pub mod types;

pub use container::TileContainer;
pub use image::{ImageDecoder, ImageHandle, ImageRequest};
pub use layer::{TileLayer, TileRenderItem};
pub use loader::{LoadedImage, TileImageLoader};
pub use source::{quad_key, TileSource, UriScheme, UriTileSource};
pub use types::{Tile, TileGrid, TileImageState, TileKey};
