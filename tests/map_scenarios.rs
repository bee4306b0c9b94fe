use async_trait::async_trait;
use mapcontrol::input::{EventHandled, InputEvent, KeyCode, MapEvent, MapEventKind};
use mapcontrol::layers::tile::{ImageDecoder, ImageHandle, ImageRequest};
use mapcontrol::runtime::{InlineSpawner, ManualClock, MapServices};
use mapcontrol::{InputHandler, Location, MapBase, MapOptions, Point, Size};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Integration tests for the viewport state machines as a host drives them
struct UriDecoder;

#[async_trait]
impl ImageDecoder for UriDecoder {
    async fn decode(&self, request: ImageRequest) -> mapcontrol::Result<ImageHandle> {
        Ok(ImageHandle::new(request.uri().unwrap_or_default().to_string()))
    }
}

fn test_map() -> (MapBase, Arc<ManualClock>) {
    let _ = env_logger::builder().is_test(true).try_init();

    let clock = Arc::new(ManualClock::new());
    let services = MapServices::new(Arc::new(UriDecoder), Arc::new(InlineSpawner), clock.clone());
    let mut map = MapBase::new(MapOptions::default(), services);
    map.set_render_size(Size::new(400.0, 400.0));
    (map, clock)
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn test_writes_are_coerced_and_idempotent() {
    let (mut map, _clock) = test_map();

    assert_eq!(map.set_target_zoom_level(25.0), 18.0);
    assert_eq!(map.target_zoom_level(), 18.0);
    assert_eq!(map.set_zoom_level(-3.0), 1.0);
    assert_eq!(map.set_zoom_level(1.0), 1.0);

    let heading = map.set_heading(-90.0);
    assert_eq!(heading, 270.0);
    assert_eq!(map.set_heading(heading), 270.0);

    let center = map.set_center(Location::new(89.0, 200.0));
    assert_close(center.latitude(), mapcontrol::MercatorTransform::max_latitude_value());
    assert_close(center.longitude(), -160.0);
    assert_eq!(map.set_center(center), center);
}

#[test]
fn test_heading_animates_over_the_short_arc() {
    let (mut map, clock) = test_map();
    map.set_heading(350.0);
    map.set_target_heading(10.0);
    assert!(map.is_animating());

    clock.advance(Duration::from_millis(250));
    map.tick();
    // ease-out quad at t = 0.5 covers 75% of the +20° arc
    assert_close(map.heading(), 5.0);

    clock.advance(Duration::from_millis(250));
    map.tick();
    assert_eq!(map.heading(), 10.0);
    assert!(!map.is_animating());
}

#[test]
fn test_zoom_animation_restarts_from_live_value() {
    let (mut map, clock) = test_map();
    map.set_target_zoom_level(5.0);

    clock.advance(Duration::from_millis(250));
    map.tick();
    assert_close(map.zoom_level(), 4.0);

    map.set_target_zoom_level(2.0);
    map.tick();
    assert_close(map.zoom_level(), 4.0);

    clock.advance(Duration::from_millis(500));
    map.tick();
    assert_eq!(map.zoom_level(), 2.0);
}

#[test]
fn test_direct_write_cancels_animation() {
    let (mut map, clock) = test_map();
    map.set_target_center(Location::new(10.0, 10.0));
    assert!(map.is_animating());

    map.set_center(Location::new(-5.0, 20.0));
    assert!(!map.is_animating());
    assert_eq!(map.target_center(), Location::new(-5.0, 20.0));

    clock.advance(Duration::from_secs(1));
    map.tick();
    assert_eq!(map.center(), Location::new(-5.0, 20.0));
}

#[test]
fn test_zoom_limits_pull_current_values() {
    let (mut map, _clock) = test_map();
    map.set_zoom_level(12.0);

    assert_eq!(map.set_max_zoom_level(30.0), 22.0);
    assert_eq!(map.set_max_zoom_level(8.0), 8.0);
    assert_eq!(map.zoom_level(), 8.0);

    assert_eq!(map.set_min_zoom_level(10.0), 8.0);
    assert_eq!(map.set_min_zoom_level(-1.0), 0.0);
    assert_eq!(map.min_zoom_level(), 0.0);
}

#[test]
fn test_wheel_zoom_keeps_location_under_cursor() {
    let (mut map, clock) = test_map();
    map.set_zoom_level(4.0);
    let mut handler = InputHandler::new();

    let cursor = Point::new(100.0, 120.0);
    let pinned = map.viewport_point_to_location(&cursor);

    let handled = handler.handle_event(
        &mut map,
        InputEvent::Scroll {
            position: cursor,
            delta: 120.0,
        },
    );
    assert_eq!(handled, EventHandled::Handled);
    assert_eq!(map.target_zoom_level(), 5.0);

    clock.advance(Duration::from_millis(600));
    map.tick();
    assert_eq!(map.zoom_level(), 5.0);
    assert!(map.transform_origin().is_none());

    let after = map.viewport_point_to_location(&cursor);
    assert_close(after.latitude(), pinned.latitude());
    assert_close(after.longitude(), pinned.longitude());
}

#[test]
fn test_drag_and_keys() {
    let (mut map, _clock) = test_map();
    map.set_zoom_level(5.0);
    let mut handler = InputHandler::new();

    handler.handle_event(
        &mut map,
        InputEvent::Drag {
            delta: Point::new(40.0, 0.0),
        },
    );
    assert!(map.center().longitude() < 0.0);
    assert_close(map.center().latitude(), 0.0);

    handler.handle_event(&mut map, InputEvent::Key { key: KeyCode::Plus });
    assert_eq!(map.target_zoom_level(), 6.0);
    assert_eq!(
        handler.handle_event(&mut map, InputEvent::Key { key: KeyCode::Other(7) }),
        EventHandled::NotHandled
    );

    handler.enabled = false;
    assert_eq!(
        handler.handle_event(&mut map, InputEvent::DoubleTap { position: Point::default() }),
        EventHandled::NotHandled
    );
}

#[test]
fn test_events_reach_listeners() {
    let (mut map, _clock) = test_map();
    let headings = Arc::new(AtomicUsize::new(0));
    let counter = headings.clone();
    map.on(MapEventKind::HeadingChanged, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    map.process_events();

    map.set_heading(45.0);
    map.set_heading(90.0);
    let events = map.process_events();

    assert_eq!(headings.load(Ordering::SeqCst), 1);
    assert!(events.contains(&MapEvent::HeadingChanged { heading: 90.0 }));
    assert!(events
        .iter()
        .any(|event| matches!(event, MapEvent::ViewportChanged { .. })));
}

#[test]
fn test_zoom_to_bounds() {
    let (mut map, clock) = test_map();
    map.set_render_size(Size::new(400.0, 800.0));
    map.set_heading(30.0);
    map.zoom_to_bounds(Location::new(-10.0, -10.0), Location::new(10.0, 10.0));

    clock.advance(Duration::from_secs(1));
    map.tick();

    assert_eq!(map.heading(), 0.0);
    assert_close(map.center().latitude(), 0.0);
    assert_close(map.center().longitude(), 0.0);
    // 400 px across 20° of longitude
    assert_close(map.viewport_scale(), 20.0);
}
