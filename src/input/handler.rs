use crate::{
    core::{geo::Point, map::MapBase},
    input::events::{EventHandled, InputEvent, KeyCode, MapEvent, MapEventKind},
};
use fxhash::FxHashMap as HashMap;
use std::collections::VecDeque;

/// Event listener callback type
pub type EventCallback = Box<dyn Fn(&MapEvent) + Send + Sync>;

/// Event management system for the map
#[derive(Default)]
pub struct EventManager {
    /// Event listeners by event kind
    listeners: HashMap<MapEventKind, Vec<EventCallback>>,
    /// Event queue for processing
    event_queue: VecDeque<MapEvent>,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an event listener
    pub fn on<F>(&mut self, kind: MapEventKind, callback: F)
    where
        F: Fn(&MapEvent) + Send + Sync + 'static,
    {
        self.listeners.entry(kind).or_default().push(Box::new(callback));
    }

    /// Queue an event. At most one event per kind is pending; a newer one
    /// replaces it in place, so the queue stays bounded however rarely the
    /// host drains it.
    pub fn emit(&mut self, event: MapEvent) {
        let kind = event.kind();
        match self.event_queue.iter_mut().find(|queued| queued.kind() == kind) {
            Some(queued) => *queued = event,
            None => self.event_queue.push_back(event),
        }
    }

    /// Process all queued events
    pub fn process_events(&mut self) -> Vec<MapEvent> {
        let events: Vec<_> = self.event_queue.drain(..).collect();

        for event in &events {
            if let Some(callbacks) = self.listeners.get(&event.kind()) {
                for callback in callbacks {
                    callback(event);
                }
            }
        }

        events
    }

    /// Clear all events from the queue
    pub fn clear_events(&mut self) {
        self.event_queue.clear();
    }

    /// Get number of pending events
    pub fn pending_events(&self) -> usize {
        self.event_queue.len()
    }
}

impl std::fmt::Debug for EventManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventManager")
            .field("listeners", &self.listeners.len())
            .field("event_queue", &self.event_queue)
            .finish()
    }
}

/// Maps normalised input onto `MapBase` operations
#[derive(Debug, Clone)]
pub struct InputHandler {
    pub enabled: bool,
    pub pan_on_drag: bool,
    pub zoom_on_wheel: bool,
    pub zoom_on_double_tap: bool,
    pub manipulation: bool,
    pub keyboard: bool,
    /// Pixels moved per arrow key press.
    pub keyboard_pan_step: f64,
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl InputHandler {
    pub fn new() -> Self {
        Self {
            enabled: true,
            pan_on_drag: true,
            zoom_on_wheel: true,
            zoom_on_double_tap: true,
            manipulation: true,
            keyboard: true,
            keyboard_pan_step: 100.0,
        }
    }

    pub fn handle_event(&mut self, map: &mut MapBase, event: InputEvent) -> EventHandled {
        if !self.enabled {
            return EventHandled::NotHandled;
        }

        match event {
            InputEvent::Drag { delta } if self.pan_on_drag => {
                map.translate_map(delta);
            }
            InputEvent::Scroll { position, delta } if self.zoom_on_wheel => {
                let zoom_change = map.options().mouse_wheel_zoom_change * delta / 120.0;
                map.zoom_map(position, map.target_zoom_level() + zoom_change);
            }
            InputEvent::Manipulation {
                origin,
                translation,
                rotation,
                scale,
            } if self.manipulation => {
                map.transform_map(origin, translation, rotation, scale);
            }
            InputEvent::DoubleTap { position } if self.zoom_on_double_tap => {
                map.zoom_map(position, map.target_zoom_level() + 1.0);
            }
            InputEvent::Key { key } if self.keyboard => return self.handle_key(map, key),
            _ => return EventHandled::NotHandled,
        }

        EventHandled::Handled
    }

    fn handle_key(&self, map: &mut MapBase, key: KeyCode) -> EventHandled {
        let step = self.keyboard_pan_step;
        match key {
            KeyCode::ArrowLeft => map.translate_map(Point::new(step, 0.0)),
            KeyCode::ArrowRight => map.translate_map(Point::new(-step, 0.0)),
            KeyCode::ArrowUp => map.translate_map(Point::new(0.0, step)),
            KeyCode::ArrowDown => map.translate_map(Point::new(0.0, -step)),
            KeyCode::Plus => {
                map.set_target_zoom_level(map.target_zoom_level() + 1.0);
            }
            KeyCode::Minus => {
                map.set_target_zoom_level(map.target_zoom_level() - 1.0);
            }
            KeyCode::Other(_) => return EventHandled::NotHandled,
        }
        EventHandled::Handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::Location;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_listeners_receive_events() {
        let mut manager = EventManager::new();
        let zoom_events = Arc::new(AtomicUsize::new(0));
        let counter = zoom_events.clone();
        manager.on(MapEventKind::ZoomLevelChanged, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        manager.emit(MapEvent::ZoomLevelChanged { zoom_level: 3.0 });
        manager.emit(MapEvent::CenterChanged {
            center: Location::new(1.0, 2.0),
        });
        let events = manager.process_events();
        assert_eq!(events.len(), 2);
        assert_eq!(zoom_events.load(Ordering::SeqCst), 1);
        assert_eq!(manager.pending_events(), 0);

        manager.emit(MapEvent::ZoomLevelChanged { zoom_level: 4.0 });
        manager.process_events();
        assert_eq!(zoom_events.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_pending_events_coalesce_per_kind() {
        let mut manager = EventManager::new();
        manager.emit(MapEvent::ViewportChanged { generation: 1 });
        manager.emit(MapEvent::TilesChanged);
        manager.emit(MapEvent::ViewportChanged { generation: 2 });

        assert_eq!(
            manager.process_events(),
            vec![
                MapEvent::ViewportChanged { generation: 2 },
                MapEvent::TilesChanged
            ]
        );
    }
}
