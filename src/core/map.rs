//! The map viewport: Center, ZoomLevel and Heading state machines on top of
//! a [`TileContainer`].
//!
//! Each of the three properties has a current value, a target value and an
//! optional animation. Writing the current value jumps there and retargets.
//! Writing the target animates from the live current value. All writes are
//! coerced into range and never fail.
//!
//! The map does not own a frame clock. The host calls [`MapBase::tick`]
//! whenever [`MapBase::next_deadline`] says so.

use crate::{
    animation::{EasingFunction, Interpolation, PropertyAnimation},
    core::{
        config::MapOptions,
        constants::{CENTER_LATITUDE_EPSILON, MAX_ZOOM_LEVEL, METERS_PER_DEGREE},
        geo::{Location, Point, Size},
        transform::{MapTransform, MercatorTransform},
    },
    input::{EventManager, MapEvent, MapEventKind},
    layers::tile::{TileContainer, TileLayer},
    runtime::MapServices,
    traits::ViewportProjection,
};
use instant::Instant;
use nalgebra::Affine2;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

/// Shared handle used by overlays that follow the map.
pub type SharedMap = Rc<RefCell<MapBase>>;

/// Pivot held fixed on screen while a gesture zooms or rotates the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformOrigin {
    pub location: Location,
    pub viewport_point: Point,
}

pub struct MapBase {
    options: MapOptions,
    services: MapServices,
    map_transform: Arc<dyn MapTransform>,
    tile_container: TileContainer,
    events: EventManager,

    render_size: Size,
    min_zoom_level: f64,
    max_zoom_level: f64,

    center: Location,
    target_center: Location,
    center_animation: Option<PropertyAnimation<Location>>,
    zoom_level: f64,
    target_zoom_level: f64,
    zoom_animation: Option<PropertyAnimation<f64>>,
    heading: f64,
    target_heading: f64,
    heading_animation: Option<PropertyAnimation<f64>>,

    transform_origin: Option<TransformOrigin>,
    viewport_scale: f64,
    center_scale: f64,
    viewport_generation: u64,
}

impl MapBase {
    pub fn new(options: MapOptions, services: MapServices) -> Self {
        Self::with_transform(options, services, Arc::new(MercatorTransform::new()))
    }

    pub fn with_transform(
        options: MapOptions,
        services: MapServices,
        map_transform: Arc<dyn MapTransform>,
    ) -> Self {
        let mut options = options;
        options.validate();

        let zoom_level = 1.0_f64.clamp(options.min_zoom_level, options.max_zoom_level);
        let tile_container = TileContainer::new(services.clone(), &options);

        let mut map = Self {
            min_zoom_level: options.min_zoom_level,
            max_zoom_level: options.max_zoom_level,
            options,
            services,
            map_transform,
            tile_container,
            events: EventManager::new(),
            render_size: Size::default(),
            center: Location::default(),
            target_center: Location::default(),
            center_animation: None,
            zoom_level,
            target_zoom_level: zoom_level,
            zoom_animation: None,
            heading: 0.0,
            target_heading: 0.0,
            heading_animation: None,
            transform_origin: None,
            viewport_scale: 0.0,
            center_scale: 0.0,
            viewport_generation: 0,
        };
        map.update_transform(false);
        map
    }

    pub fn into_shared(self) -> SharedMap {
        Rc::new(RefCell::new(self))
    }

    pub fn options(&self) -> &MapOptions {
        &self.options
    }

    pub fn services(&self) -> &MapServices {
        &self.services
    }

    pub fn map_transform(&self) -> &dyn MapTransform {
        self.map_transform.as_ref()
    }

    pub fn tile_container(&self) -> &TileContainer {
        &self.tile_container
    }

    pub fn tile_container_mut(&mut self) -> &mut TileContainer {
        &mut self.tile_container
    }

    pub fn add_tile_layer(&mut self, layer: TileLayer) {
        self.tile_container.add_layer(layer);
        self.events.emit(MapEvent::TilesChanged);
    }

    /// Register an event listener
    pub fn on<F>(&mut self, kind: MapEventKind, callback: F)
    where
        F: Fn(&MapEvent) + Send + Sync + 'static,
    {
        self.events.on(kind, callback);
    }

    pub fn process_events(&mut self) -> Vec<MapEvent> {
        self.events.process_events()
    }

    // ---------------------------------------------------------------------
    // Viewport geometry
    // ---------------------------------------------------------------------

    pub fn render_size(&self) -> Size {
        self.render_size
    }

    /// Sets the viewport size; its centre becomes the default viewport origin.
    pub fn set_render_size(&mut self, size: Size) {
        if size != self.render_size {
            self.render_size = size;
            self.update_transform(false);
        }
    }

    /// Map coordinates to viewport pixels.
    pub fn viewport_transform(&self) -> Affine2<f64> {
        self.tile_container.viewport_transform()
    }

    /// Pixels per degree of longitude.
    pub fn viewport_scale(&self) -> f64 {
        self.viewport_scale
    }

    /// Pixels per meter at the current centre.
    pub fn center_scale(&self) -> f64 {
        self.center_scale
    }

    /// Incremented on every transform update.
    pub fn viewport_generation(&self) -> u64 {
        self.viewport_generation
    }

    pub fn transform_origin(&self) -> Option<TransformOrigin> {
        self.transform_origin
    }

    /// Pins `location` at its current viewport position for a gesture.
    pub fn set_transform_origin(&mut self, location: Location) {
        let viewport_point = self.location_to_viewport_point(&location);
        self.transform_origin = Some(TransformOrigin {
            location,
            viewport_point,
        });
    }

    /// Pins whatever lies under `viewport_point` for a gesture.
    pub fn set_transform_origin_point(&mut self, viewport_point: Point) {
        let location = self.viewport_point_to_location(&viewport_point);
        self.transform_origin = Some(TransformOrigin {
            location,
            viewport_point,
        });
    }

    pub fn reset_transform_origin(&mut self) {
        self.transform_origin = None;
    }

    // ---------------------------------------------------------------------
    // Zoom limits
    // ---------------------------------------------------------------------

    pub fn min_zoom_level(&self) -> f64 {
        self.min_zoom_level
    }

    pub fn max_zoom_level(&self) -> f64 {
        self.max_zoom_level
    }

    /// Clamped to `[0, max_zoom_level]`. Pulls the current and target zoom
    /// level up if they fall below. Returns the stored value.
    pub fn set_min_zoom_level(&mut self, min_zoom_level: f64) -> f64 {
        let min_zoom_level = if min_zoom_level.is_nan() {
            0.0
        } else {
            min_zoom_level.clamp(0.0, self.max_zoom_level)
        };
        self.min_zoom_level = min_zoom_level;

        if self.zoom_level < min_zoom_level {
            self.set_zoom_level(min_zoom_level);
        } else if self.target_zoom_level < min_zoom_level {
            self.set_target_zoom_level(min_zoom_level);
        }
        min_zoom_level
    }

    /// Clamped to `[min_zoom_level, 22]`. Pulls the current and target zoom
    /// level down if they lie above. Returns the stored value.
    pub fn set_max_zoom_level(&mut self, max_zoom_level: f64) -> f64 {
        let max_zoom_level = if max_zoom_level.is_nan() {
            MAX_ZOOM_LEVEL
        } else {
            max_zoom_level.clamp(self.min_zoom_level, MAX_ZOOM_LEVEL)
        };
        self.max_zoom_level = max_zoom_level;

        if self.zoom_level > max_zoom_level {
            self.set_zoom_level(max_zoom_level);
        } else if self.target_zoom_level > max_zoom_level {
            self.set_target_zoom_level(max_zoom_level);
        }
        max_zoom_level
    }

    // ---------------------------------------------------------------------
    // Coercion
    // ---------------------------------------------------------------------

    fn coerce_zoom_level(&self, zoom_level: f64) -> f64 {
        if zoom_level.is_nan() {
            self.min_zoom_level
        } else {
            zoom_level.clamp(self.min_zoom_level, self.max_zoom_level)
        }
    }

    fn coerce_heading(heading: f64) -> f64 {
        if heading.is_finite() {
            Interpolation::normalize_heading(heading)
        } else {
            0.0
        }
    }

    fn coerce_center(&self, center: Location) -> Location {
        let max_latitude = self.map_transform.max_latitude();
        let longitude = if center.longitude().is_finite() {
            Location::normalize_longitude(center.longitude())
        } else {
            0.0
        };
        Location::new(
            center.latitude().clamp(-max_latitude, max_latitude),
            longitude,
        )
    }

    fn animation<T: crate::traits::Lerp + Clone>(&self, from: T, to: T) -> PropertyAnimation<T> {
        PropertyAnimation::new(
            from,
            to,
            self.services.now(),
            self.options.animation_duration(),
            EasingFunction::EaseOutQuad,
        )
    }

    // ---------------------------------------------------------------------
    // Center
    // ---------------------------------------------------------------------

    pub fn center(&self) -> Location {
        self.center
    }

    pub fn target_center(&self) -> Location {
        self.target_center
    }

    /// Jumps to `center`, cancelling any centre animation and clearing the
    /// transform origin. Returns the coerced value.
    pub fn set_center(&mut self, center: Location) -> Location {
        let center = self.coerce_center(center);
        self.transform_origin = None;
        self.center_animation = None;
        self.target_center = center;

        if center != self.center {
            self.center = center;
            self.events.emit(MapEvent::CenterChanged { center });
            self.update_transform(false);
        }
        center
    }

    /// Animates towards `center` along the shorter way around the globe.
    pub fn set_target_center(&mut self, center: Location) -> Location {
        let target = self.coerce_center(center);
        if target == self.target_center {
            return target;
        }

        self.target_center = target;
        self.transform_origin = None;

        if target == self.center {
            self.center_animation = None;
        } else {
            let to = target.with_longitude(Location::nearest_longitude(
                target.longitude(),
                self.center.longitude(),
            ));
            self.center_animation = Some(self.animation(self.center, to));
        }
        target
    }

    // ---------------------------------------------------------------------
    // ZoomLevel
    // ---------------------------------------------------------------------

    pub fn zoom_level(&self) -> f64 {
        self.zoom_level
    }

    pub fn target_zoom_level(&self) -> f64 {
        self.target_zoom_level
    }

    /// Jumps to `zoom_level`, cancelling any zoom animation and clearing the
    /// transform origin. Returns the coerced value.
    pub fn set_zoom_level(&mut self, zoom_level: f64) -> f64 {
        let zoom_level = self.coerce_zoom_level(zoom_level);
        self.transform_origin = None;
        self.zoom_animation = None;
        self.target_zoom_level = zoom_level;

        if zoom_level != self.zoom_level {
            self.zoom_level = zoom_level;
            self.events.emit(MapEvent::ZoomLevelChanged { zoom_level });
            self.update_transform(false);
        }
        zoom_level
    }

    /// Animates towards `zoom_level`. Setting the current target again is a
    /// no-op.
    pub fn set_target_zoom_level(&mut self, zoom_level: f64) -> f64 {
        let target = self.coerce_zoom_level(zoom_level);
        if target == self.target_zoom_level {
            return target;
        }

        self.target_zoom_level = target;
        if target == self.zoom_level {
            self.zoom_animation = None;
            // nothing will run to consume the pivot
            self.transform_origin = None;
        } else {
            self.zoom_animation = Some(self.animation(self.zoom_level, target));
        }
        target
    }

    // ---------------------------------------------------------------------
    // Heading
    // ---------------------------------------------------------------------

    pub fn heading(&self) -> f64 {
        self.heading
    }

    pub fn target_heading(&self) -> f64 {
        self.target_heading
    }

    /// Jumps to `heading`, cancelling any heading animation and clearing the
    /// transform origin. Returns the normalised value.
    pub fn set_heading(&mut self, heading: f64) -> f64 {
        let heading = Self::coerce_heading(heading);
        self.transform_origin = None;
        self.heading_animation = None;
        self.target_heading = heading;

        if heading != self.heading {
            self.heading = heading;
            self.events.emit(MapEvent::HeadingChanged { heading });
            self.update_transform(false);
        }
        heading
    }

    /// Animates towards `heading` over the shorter arc.
    pub fn set_target_heading(&mut self, heading: f64) -> f64 {
        let target = Self::coerce_heading(heading);
        if target == self.target_heading {
            return target;
        }

        self.target_heading = target;
        if target == self.heading {
            self.heading_animation = None;
        } else {
            let to = self.heading + Interpolation::shortest_angle_delta(self.heading, target);
            self.heading_animation = Some(self.animation(self.heading, to));
        }
        target
    }

    /// Animates the heading back to north.
    pub fn reset_heading(&mut self) {
        self.set_target_heading(0.0);
    }

    // ---------------------------------------------------------------------
    // Gestures
    // ---------------------------------------------------------------------

    /// Moves the map content by `translation` viewport pixels.
    pub fn translate_map(&mut self, translation: Point) {
        if self.transform_origin.is_some() {
            self.reset_transform_origin();
            self.update_transform(false);
        }

        if translation.x != 0.0 || translation.y != 0.0 {
            let center = self
                .viewport_point_to_location(&self.render_size.center().subtract(&translation));
            self.set_center(center);
        }
    }

    /// One step of a combined pan / rotate / pinch gesture around `origin`.
    ///
    /// Rotation and zoom are applied directly, without animation, since the
    /// gesture itself is continuous.
    pub fn transform_map(&mut self, origin: Point, translation: Point, rotation: f64, scale: f64) {
        self.set_transform_origin_point(origin);
        if let Some(transform_origin) = self.transform_origin.as_mut() {
            transform_origin.viewport_point = origin.add(&translation);
        }

        if rotation != 0.0 {
            let heading = Self::coerce_heading(self.heading + rotation);
            self.heading_animation = None;
            self.target_heading = heading;
            if heading != self.heading {
                self.heading = heading;
                self.events.emit(MapEvent::HeadingChanged { heading });
            }
        }

        if scale != 1.0 && scale > 0.0 {
            let zoom_level = self.coerce_zoom_level(self.zoom_level + scale.log2());
            self.zoom_animation = None;
            self.target_zoom_level = zoom_level;
            if zoom_level != self.zoom_level {
                self.zoom_level = zoom_level;
                self.events.emit(MapEvent::ZoomLevelChanged { zoom_level });
            }
        }

        self.update_transform(true);
    }

    /// Animates to `zoom_level` keeping the location under `origin` fixed.
    pub fn zoom_map(&mut self, origin: Point, zoom_level: f64) {
        let zoom_level = self.coerce_zoom_level(zoom_level);
        if zoom_level != self.target_zoom_level {
            self.set_transform_origin_point(origin);
            self.set_target_zoom_level(zoom_level);
        }
    }

    /// Animates centre and zoom level so the bounds fill the viewport, and
    /// the heading back to north.
    pub fn zoom_to_bounds(&mut self, south_west: Location, north_east: Location) {
        if south_west.latitude() >= north_east.latitude()
            || south_west.longitude() >= north_east.longitude()
            || self.render_size.is_empty()
        {
            return;
        }

        let p1 = self.map_transform.transform(&south_west);
        let p2 = self.map_transform.transform(&north_east);
        let lon_delta = p2.x - p1.x;
        let lat_delta = p2.y - p1.y;
        let scale = (self.render_size.width / lon_delta).min(self.render_size.height / lat_delta);
        let zoom_level = (scale * 360.0 / f64::from(self.options.tile_size)).log2();
        let center = self
            .map_transform
            .inverse_transform(&Point::new(p1.x + lon_delta / 2.0, p1.y + lat_delta / 2.0));

        self.set_target_zoom_level(zoom_level);
        self.set_target_center(center);
        self.set_target_heading(0.0);
    }

    // ---------------------------------------------------------------------
    // Driving
    // ---------------------------------------------------------------------

    pub fn is_animating(&self) -> bool {
        self.center_animation.is_some()
            || self.zoom_animation.is_some()
            || self.heading_animation.is_some()
    }

    /// When the host should call [`MapBase::tick`] next: right away while
    /// anything animates, at the tile debounce deadline otherwise.
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.is_animating() || self.tile_container.has_fading_tiles() {
            Some(self.services.now())
        } else {
            self.tile_container.next_deadline()
        }
    }

    /// Advances property animations, the tile debounce, completed image
    /// loads and opacity fades. Returns true if anything visible changed.
    pub fn tick(&mut self) -> bool {
        let now = self.services.now();
        let mut viewport_changed = false;
        let mut reset_origin = false;

        if let Some(animation) = self.zoom_animation.clone() {
            let zoom_level = if animation.is_finished(now) {
                self.zoom_animation = None;
                reset_origin = self.transform_origin.is_some();
                self.target_zoom_level
            } else {
                self.coerce_zoom_level(animation.sample(now))
            };
            if zoom_level != self.zoom_level {
                self.zoom_level = zoom_level;
                self.events.emit(MapEvent::ZoomLevelChanged { zoom_level });
            }
            viewport_changed = true;
        }

        if let Some(animation) = self.heading_animation.clone() {
            let heading = if animation.is_finished(now) {
                self.heading_animation = None;
                self.target_heading
            } else {
                Self::coerce_heading(animation.sample(now))
            };
            if heading != self.heading {
                self.heading = heading;
                self.events.emit(MapEvent::HeadingChanged { heading });
            }
            viewport_changed = true;
        }

        if let Some(animation) = self.center_animation.clone() {
            let center = if animation.is_finished(now) {
                self.center_animation = None;
                self.target_center
            } else {
                self.coerce_center(animation.sample(now))
            };
            if center != self.center {
                self.center = center;
                self.events.emit(MapEvent::CenterChanged { center });
            }
            viewport_changed = true;
        }

        if viewport_changed {
            self.update_transform(reset_origin);
        }

        let tiles_changed = self.tile_container.tick(now);
        if tiles_changed {
            self.events.emit(MapEvent::TilesChanged);
        }

        viewport_changed || tiles_changed
    }

    /// Forces the debounced tile reselection to run now.
    pub fn update_tiles(&mut self) {
        self.tile_container.update_tiles();
        self.events.emit(MapEvent::TilesChanged);
    }

    // ---------------------------------------------------------------------
    // Transform
    // ---------------------------------------------------------------------

    fn set_viewport_transform(&mut self, origin: &Location, viewport_origin: Point) {
        let map_origin = self.map_transform.transform(origin);
        self.viewport_scale = self.tile_container.set_viewport_transform(
            self.zoom_level,
            self.heading,
            map_origin,
            viewport_origin,
            self.render_size,
        );
    }

    /// Recomputes the viewport transform.
    ///
    /// With a transform origin, the origin stays put and the centre follows
    /// from whatever now lies in the middle of the viewport. The origin is
    /// dropped afterwards when `reset_origin` is set or the centre had to be
    /// pulled back inside the projection's latitude range.
    fn update_transform(&mut self, reset_origin: bool) {
        let viewport_center = self.render_size.center();
        let mut center = self.center;

        if let Some(origin) = self.transform_origin {
            let mut reset_origin = reset_origin;
            self.set_viewport_transform(&origin.location, origin.viewport_point);

            center = self.viewport_point_to_location(&viewport_center);
            center = center.with_longitude(Location::normalize_longitude(center.longitude()));

            let max_latitude = self.map_transform.max_latitude();
            if center.latitude().abs() > max_latitude + CENTER_LATITUDE_EPSILON {
                center = center.with_latitude(center.latitude().clamp(-max_latitude, max_latitude));
                reset_origin = true;
            }

            if center != self.center {
                self.center = center;
                self.events.emit(MapEvent::CenterChanged { center });
            }
            if self.center_animation.is_none() {
                self.target_center = center;
            }

            if reset_origin {
                self.transform_origin = None;
                self.set_viewport_transform(&center, viewport_center);
            }
        } else {
            self.set_viewport_transform(&center, viewport_center);
        }

        self.center_scale =
            self.viewport_scale * self.map_transform.relative_scale(&center) / METERS_PER_DEGREE;
        self.viewport_generation += 1;
        self.events.emit(MapEvent::ViewportChanged {
            generation: self.viewport_generation,
        });
    }

    pub fn location_to_viewport_point(&self, location: &Location) -> Point {
        let map_point = self.map_transform.transform(location);
        self.viewport_transform()
            .transform_point(&map_point.into())
            .into()
    }

    /// Location under a viewport point. Falls back to the centre if the
    /// transform is degenerate.
    pub fn viewport_point_to_location(&self, point: &Point) -> Location {
        self.viewport_transform()
            .try_inverse()
            .map(|inverse| {
                let map_point = Point::from(inverse.transform_point(&(*point).into()));
                self.map_transform.inverse_transform(&map_point)
            })
            .unwrap_or(self.center)
    }
}

impl ViewportProjection for MapBase {
    fn location_to_viewport_point(&self, location: &Location) -> Point {
        MapBase::location_to_viewport_point(self, location)
    }

    fn viewport_point_to_location(&self, point: &Point) -> Location {
        MapBase::viewport_point_to_location(self, point)
    }
}

impl std::fmt::Debug for MapBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapBase")
            .field("render_size", &self.render_size)
            .field("center", &self.center)
            .field("target_center", &self.target_center)
            .field("zoom_level", &self.zoom_level)
            .field("target_zoom_level", &self.target_zoom_level)
            .field("heading", &self.heading)
            .field("target_heading", &self.target_heading)
            .field("transform_origin", &self.transform_origin)
            .field("viewport_generation", &self.viewport_generation)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::tile::image::{ImageDecoder, ImageHandle, ImageRequest};
    use crate::runtime::{InlineSpawner, ManualClock};
    use crate::Result;
    use async_trait::async_trait;
    use std::time::Duration;

    struct NullDecoder;

    #[async_trait]
    impl ImageDecoder for NullDecoder {
        async fn decode(&self, _request: ImageRequest) -> Result<ImageHandle> {
            Ok(ImageHandle::new(()))
        }
    }

    fn map() -> (MapBase, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let services =
            MapServices::new(Arc::new(NullDecoder), Arc::new(InlineSpawner), clock.clone());
        let mut map = MapBase::new(MapOptions::default(), services);
        map.set_render_size(Size::new(800.0, 600.0));
        (map, clock)
    }

    fn settle(map: &mut MapBase, clock: &ManualClock) {
        clock.advance(Duration::from_secs(1));
        map.tick();
    }

    #[test]
    fn test_zoom_level_is_clamped_and_idempotent() {
        let (mut map, _) = map();
        assert_eq!(map.set_zoom_level(30.0), 18.0);
        assert_eq!(map.zoom_level(), 18.0);

        map.process_events();
        assert_eq!(map.set_zoom_level(30.0), 18.0);
        assert!(map.process_events().is_empty());

        assert_eq!(map.set_zoom_level(-4.0), 1.0);
        assert_eq!(map.target_zoom_level(), 1.0);
    }

    #[test]
    fn test_target_zoom_animates_from_live_value() {
        let (mut map, clock) = map();
        map.set_zoom_level(2.0);
        map.set_target_zoom_level(6.0);
        assert!(map.is_animating());

        clock.advance(Duration::from_millis(250));
        map.tick();
        let midway = map.zoom_level();
        assert!(midway > 2.0 && midway < 6.0);

        // retarget mid-flight: the new animation starts where the old one is
        map.set_target_zoom_level(4.0);
        map.tick();
        assert_eq!(map.zoom_level(), midway);

        settle(&mut map, &clock);
        assert_eq!(map.zoom_level(), 4.0);
        assert!(!map.is_animating());
    }

    #[test]
    fn test_direct_write_cancels_animation() {
        let (mut map, clock) = map();
        map.set_target_zoom_level(10.0);
        map.set_zoom_level(3.0);
        assert!(!map.is_animating());
        assert_eq!(map.target_zoom_level(), 3.0);

        settle(&mut map, &clock);
        assert_eq!(map.zoom_level(), 3.0);
    }

    #[test]
    fn test_direct_writes_drop_the_zoom_pivot() {
        let (mut map, _) = map();
        map.zoom_map(Point::new(50.0, 50.0), 7.0);
        assert!(map.transform_origin().is_some());

        map.set_zoom_level(6.0);
        assert!(map.transform_origin().is_none());
        assert_eq!(map.center(), Location::new(0.0, 0.0));

        map.set_heading(90.0);
        assert_eq!(map.center(), Location::new(0.0, 0.0));
        let center = map.location_to_viewport_point(&map.center());
        assert!(center.distance_to(&Point::new(400.0, 300.0)) < 1e-9);

        map.zoom_map(Point::new(700.0, 100.0), 8.0);
        map.set_heading(45.0);
        assert!(map.transform_origin().is_none());
        assert_eq!(map.center(), Location::new(0.0, 0.0));
    }

    #[test]
    fn test_heading_takes_shorter_arc() {
        let (mut map, clock) = map();
        map.set_heading(350.0);
        map.set_target_heading(10.0);

        clock.advance(Duration::from_millis(250));
        map.tick();
        let heading = map.heading();
        assert!(heading > 350.0 || heading < 10.0, "heading {heading}");

        settle(&mut map, &clock);
        assert_eq!(map.heading(), 10.0);
    }

    #[test]
    fn test_center_is_coerced() {
        let (mut map, _) = map();
        let center = map.set_center(Location::new(89.0, 190.0));
        assert_eq!(center.latitude(), MercatorTransform::max_latitude_value());
        assert_eq!(center.longitude(), -170.0);
    }

    #[test]
    fn test_center_animation_crosses_date_line() {
        let (mut map, clock) = map();
        map.set_center(Location::new(0.0, 170.0));
        map.set_target_center(Location::new(0.0, -170.0));

        clock.advance(Duration::from_millis(250));
        map.tick();
        let longitude = map.center().longitude();
        assert!(longitude > 170.0 || longitude < -170.0, "longitude {longitude}");

        settle(&mut map, &clock);
        assert_eq!(map.center(), Location::new(0.0, -170.0));
    }

    #[test]
    fn test_min_max_coerce_each_other() {
        let (mut map, _) = map();
        map.set_zoom_level(5.0);
        assert_eq!(map.set_min_zoom_level(7.0), 7.0);
        assert_eq!(map.zoom_level(), 7.0);

        assert_eq!(map.set_max_zoom_level(3.0), 7.0);
        assert_eq!(map.set_max_zoom_level(40.0), 22.0);
        assert_eq!(map.set_min_zoom_level(30.0), 22.0);
        assert_eq!(map.zoom_level(), 22.0);
    }

    #[test]
    fn test_conversions_round_trip() {
        let (mut map, _) = map();
        map.set_zoom_level(5.0);
        map.set_heading(30.0);
        map.set_center(Location::new(48.0, 11.0));

        let center = map.location_to_viewport_point(&map.center());
        assert!(center.distance_to(&Point::new(400.0, 300.0)) < 1e-9);
        let location = Location::new(47.5, 12.0);
        let back = map.viewport_point_to_location(&map.location_to_viewport_point(&location));
        assert!((back.latitude() - 47.5).abs() < 1e-9);
        assert!((back.longitude() - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_center_scale() {
        let (mut map, _) = map();
        map.set_zoom_level(1.0);
        map.set_center(Location::new(60.0, 0.0));
        let expected = map.viewport_scale() * 2.0 / METERS_PER_DEGREE;
        assert!((map.center_scale() - expected).abs() < 1e-12);
    }
}
