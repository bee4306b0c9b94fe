pub mod events;
pub mod handler;

// Re-export the essential types
pub use events::{EventHandled, InputEvent, KeyCode, MapEvent, MapEventKind};
pub use handler::{EventManager, InputHandler};
