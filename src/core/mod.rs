pub mod config;
pub mod constants;
pub mod geo;
pub mod map;
pub mod transform;

pub use config::{MapOptions, TileLayerOptions, TileLoadingProfile};
pub use geo::{Location, Point, Rect, Size};
pub use map::{MapBase, SharedMap, TransformOrigin};
pub use transform::{MapTransform, MercatorTransform};
