pub mod graticule;
pub mod panel;
pub mod tile;

pub use graticule::{Graticule, GraticuleLabel, GraticuleLine, MapGraticule};
pub use panel::{
    ChildArrangement, ChildId, HorizontalAlignment, MapPanel, PanelChild, VerticalAlignment,
};
pub use tile::{TileContainer, TileLayer};
