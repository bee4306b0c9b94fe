//! Prelude module for common mapcontrol types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use mapcontrol::prelude::*;`

pub use crate::core::{
    config::{MapOptions, TileLayerOptions, TileLoadingProfile},
    geo::{Location, Point, Rect, Size},
    map::{MapBase, SharedMap, TransformOrigin},
    transform::{MapTransform, MercatorTransform},
};

pub use crate::layers::{
    graticule::{Graticule, MapGraticule},
    panel::{ChildArrangement, ChildId, HorizontalAlignment, MapPanel, PanelChild, VerticalAlignment},
    tile::{
        ImageDecoder, ImageHandle, ImageRequest, Tile, TileContainer, TileGrid, TileImageState,
        TileKey, TileLayer, TileRenderItem, TileSource, UriTileSource,
    },
};

pub use crate::input::{
    events::{EventHandled, InputEvent, KeyCode, MapEvent, MapEventKind},
    handler::InputHandler,
};

pub use crate::animation::{EasingFunction, PropertyAnimation};

pub use crate::runtime::{spawn, AsyncSpawner, Clock, InlineSpawner, MapServices, SystemClock};

#[cfg(feature = "tokio-runtime")]
pub use crate::runtime::TokioSpawner;

pub use crate::traits::{Lerp, ViewportProjection};

pub use crate::{MapError, Result};

/// Fast hash map used throughout the crate
pub type HashMap<K, V> = fxhash::FxHashMap<K, V>;

/// Fast hash set used throughout the crate
pub type HashSet<T> = fxhash::FxHashSet<T>;
