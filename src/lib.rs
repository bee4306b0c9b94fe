//! # mapcontrol
//!
//! The engine behind a slippy-map control: Mercator projection, the
//! viewport transform chain, tile selection across zoom levels with
//! date-line wrapping, tile image loading, and animated Center / ZoomLevel /
//! Heading state machines.
//!
//! The crate computes *what* to display and *where*. Painting, input capture
//! and image decoding belong to the host, which plugs in through the traits in
//! [`runtime`] and [`layers::tile::image`].

pub mod animation;
pub mod core;
pub mod input;
pub mod layers;
pub mod prelude;
pub mod runtime;
pub mod traits;

pub use crate::core::constants;

// Re-export public API
pub use core::{
    config::{MapOptions, TileLayerOptions, TileLoadingProfile},
    geo::{Location, Point, Rect, Size},
    map::{MapBase, SharedMap},
    transform::{MapTransform, MercatorTransform},
};

pub use layers::{
    graticule::MapGraticule,
    panel::MapPanel,
    tile::{
        container::TileContainer, layer::TileLayer, source::TileSource, source::UriTileSource,
        types::Tile,
    },
};

pub use input::{events::InputEvent, handler::InputHandler};

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Invalid tile URI format: {0}")]
    InvalidUriFormat(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Image load error: {0}")]
    ImageLoad(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "http")]
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Error type alias for convenience
pub type Error = MapError;

/// Installs `env_logger` as the `log` backend. Safe to call more than once.
#[cfg(feature = "debug")]
pub fn init_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
