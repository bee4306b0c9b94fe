use async_trait::async_trait;
use mapcontrol::layers::panel::{HorizontalAlignment, PanelChild, VerticalAlignment};
use mapcontrol::layers::tile::{ImageDecoder, ImageHandle, ImageRequest};
use mapcontrol::runtime::MapServices;
use mapcontrol::{Location, MapBase, MapGraticule, MapOptions, MapPanel, Point, Rect, SharedMap, Size};
use std::rc::Rc;
use std::sync::Arc;

/// Integration tests for overlays that follow the map viewport
struct NullDecoder;

#[async_trait]
impl ImageDecoder for NullDecoder {
    async fn decode(&self, _request: ImageRequest) -> mapcontrol::Result<ImageHandle> {
        Ok(ImageHandle::new(()))
    }
}

fn shared_map(size: Size, zoom_level: f64) -> SharedMap {
    let mut map = MapBase::new(
        MapOptions::default(),
        MapServices::with_decoder(Arc::new(NullDecoder)),
    );
    map.set_render_size(size);
    map.set_zoom_level(zoom_level);
    map.into_shared()
}

fn assert_point_close(actual: Point, expected: Point) {
    assert!(
        actual.distance_to(&expected) < 1e-6,
        "expected {expected:?}, got {actual:?}"
    );
}

#[test]
fn test_located_children_follow_the_map() {
    let map = shared_map(Size::new(400.0, 300.0), 3.0);
    let mut panel = MapPanel::new();
    panel.attach_map(&map);

    let pin = panel.add_child(
        PanelChild::at(Location::new(0.0, 360.0), Size::new(20.0, 30.0))
            .with_alignment(HorizontalAlignment::Center, VerticalAlignment::Bottom),
    );
    let legend = panel.add_child(
        PanelChild::new(Size::new(100.0, 40.0))
            .with_alignment(HorizontalAlignment::Left, VerticalAlignment::Bottom),
    );

    let arranged = panel.arrange(Size::new(400.0, 300.0));
    let pin_arrangement = arranged.iter().find(|a| a.id == pin).unwrap();
    assert_eq!(pin_arrangement.rect, Rect::new(-10.0, -30.0, 20.0, 30.0));
    // 360° east is the same meridian as the centre
    assert_point_close(pin_arrangement.translation.unwrap(), Point::new(200.0, 150.0));

    let legend_arrangement = arranged.iter().find(|a| a.id == legend).unwrap();
    assert_eq!(legend_arrangement.translation, None);
    assert_eq!(legend_arrangement.rect, Rect::new(0.0, 260.0, 100.0, 40.0));

    assert!(!panel.needs_arrange());
    map.borrow_mut().set_center(Location::new(0.0, 10.0));
    assert!(panel.needs_arrange());

    let arranged = panel.arrange(Size::new(400.0, 300.0));
    let scale = map.borrow().viewport_scale();
    let translation = arranged[0].translation.unwrap();
    assert_point_close(translation, Point::new(200.0 - 10.0 * scale, 150.0));
}

#[test]
fn test_nested_panels_find_and_release_the_map() {
    let map = shared_map(Size::new(200.0, 200.0), 2.0);
    let outer = MapPanel::new().into_shared();
    outer.borrow_mut().attach_map(&map);

    let mut inner = MapPanel::new();
    inner.attach_parent(&outer);
    let found = inner.parent_map().unwrap();
    assert!(Rc::ptr_eq(&found, &map));
    drop(found);

    inner.detach();
    assert!(inner.parent_map().is_none());

    inner.attach_parent(&outer);
    drop(map);
    assert!(inner.parent_map().is_none());
    assert!(outer.borrow_mut().parent_map().is_none());
}

#[test]
fn test_graticule_lines_and_labels() {
    let map = shared_map(Size::new(512.0, 512.0), 3.0);
    let graticule = MapGraticule::default().compute(&map.borrow());

    assert_eq!(graticule.spacing, 30.0);

    let longitudes: Vec<f64> = graticule.longitude_lines.iter().map(|l| l.value).collect();
    assert_eq!(longitudes, vec![-30.0, 0.0, 30.0]);
    let latitudes: Vec<f64> = graticule.latitude_lines.iter().map(|l| l.value).collect();
    assert_eq!(latitudes, vec![-30.0, 0.0, 30.0]);

    let equator = &graticule.latitude_lines[1];
    assert_eq!(equator.points.len(), 2);
    assert!(equator.points.iter().all(|p| (p.y - 256.0).abs() < 1e-6));

    let origin = graticule
        .labels
        .iter()
        .find(|label| label.latitude_text == "0°N" && label.longitude_text == "0°E")
        .unwrap();
    assert_point_close(origin.position, Point::new(256.0, 256.0));
    assert!(graticule
        .labels
        .iter()
        .any(|label| label.latitude_text == "30°S" && label.longitude_text == "30°W"));
    assert_eq!(graticule.labels.len(), 9);
}

#[test]
fn test_graticule_uses_minutes_when_zoomed_in() {
    let map = shared_map(Size::new(512.0, 512.0), 10.0);
    map.borrow_mut().set_center(Location::new(48.5, 11.5));
    let graticule = MapGraticule::default().compute(&map.borrow());

    assert_eq!(graticule.spacing, 0.25);
    assert!(graticule
        .labels
        .iter()
        .any(|label| label.latitude_text == "48°30'N" && label.longitude_text == "11°30'E"));
}
