use crate::core::geo::{Location, Point};
use serde::{Deserialize, Serialize};

/// Input already normalised to viewport coordinates by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Pointer drag by `delta` pixels
    Drag { delta: Point },
    /// Mouse wheel; 120 units per notch
    Scroll { position: Point, delta: f64 },
    /// Combined pinch / rotate / pan gesture step
    Manipulation {
        origin: Point,
        translation: Point,
        rotation: f64,
        scale: f64,
    },
    /// Double click/tap
    DoubleTap { position: Point },
    /// Keyboard input
    Key { key: KeyCode },
}

/// Keyboard key codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Plus,
    Minus,
    Other(u32),
}

/// Whether an input event changed the map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventHandled {
    Handled,
    NotHandled,
}

impl EventHandled {
    pub fn is_handled(&self) -> bool {
        matches!(self, EventHandled::Handled)
    }
}

/// Notifications emitted by `MapBase`
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// The viewport transform was recomputed.
    ViewportChanged { generation: u64 },
    CenterChanged { center: Location },
    ZoomLevelChanged { zoom_level: f64 },
    HeadingChanged { heading: f64 },
    /// Tile selection, images or opacities changed.
    TilesChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapEventKind {
    ViewportChanged,
    CenterChanged,
    ZoomLevelChanged,
    HeadingChanged,
    TilesChanged,
}

impl MapEvent {
    pub fn kind(&self) -> MapEventKind {
        match self {
            MapEvent::ViewportChanged { .. } => MapEventKind::ViewportChanged,
            MapEvent::CenterChanged { .. } => MapEventKind::CenterChanged,
            MapEvent::ZoomLevelChanged { .. } => MapEventKind::ZoomLevelChanged,
            MapEvent::HeadingChanged { .. } => MapEventKind::HeadingChanged,
            MapEvent::TilesChanged => MapEventKind::TilesChanged,
        }
    }
}
