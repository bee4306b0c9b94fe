//! Overlay positioning
//!
//! A [`MapPanel`] lays out host-owned children. Children with a
//! [`Location`] are translated to that location's viewport point; the rest
//! are aligned inside the panel's bounds. The panel never owns the map: it
//! holds a weak reference, either attached directly or discovered through its
//! parent panels and then cached.

use crate::core::geo::{Location, Point, Rect, Size};
use crate::core::map::{MapBase, SharedMap};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChildId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HorizontalAlignment {
    Left,
    #[default]
    Center,
    Right,
    Stretch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VerticalAlignment {
    Top,
    #[default]
    Center,
    Bottom,
    Stretch,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PanelChild {
    pub location: Option<Location>,
    pub horizontal_alignment: HorizontalAlignment,
    pub vertical_alignment: VerticalAlignment,
    pub desired_size: Size,
}

impl PanelChild {
    pub fn new(desired_size: Size) -> Self {
        Self {
            desired_size,
            ..Self::default()
        }
    }

    pub fn at(location: Location, desired_size: Size) -> Self {
        Self {
            location: Some(location),
            desired_size,
            ..Self::default()
        }
    }

    pub fn with_alignment(
        mut self,
        horizontal_alignment: HorizontalAlignment,
        vertical_alignment: VerticalAlignment,
    ) -> Self {
        self.horizontal_alignment = horizontal_alignment;
        self.vertical_alignment = vertical_alignment;
        self
    }
}

/// Where the host should place one child.
///
/// For a located child, `rect` is relative to the anchor and `translation`
/// is the anchor's viewport point. Otherwise `rect` is in panel coordinates
/// and there is no translation.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildArrangement {
    pub id: ChildId,
    pub rect: Rect,
    pub translation: Option<Point>,
}

#[derive(Debug, Default)]
pub struct MapPanel {
    children: Vec<(ChildId, PanelChild)>,
    next_id: u64,
    map: Option<Weak<RefCell<MapBase>>>,
    parent: Option<Weak<RefCell<MapPanel>>>,
    arranged_generation: Option<u64>,
}

impl MapPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_shared(self) -> Rc<RefCell<MapPanel>> {
        Rc::new(RefCell::new(self))
    }

    pub fn add_child(&mut self, child: PanelChild) -> ChildId {
        let id = ChildId(self.next_id);
        self.next_id += 1;
        self.children.push((id, child));
        self.arranged_generation = None;
        id
    }

    pub fn remove_child(&mut self, id: ChildId) -> Option<PanelChild> {
        let index = self.children.iter().position(|(child_id, _)| *child_id == id)?;
        self.arranged_generation = None;
        Some(self.children.remove(index).1)
    }

    pub fn child(&self, id: ChildId) -> Option<&PanelChild> {
        self.children
            .iter()
            .find(|(child_id, _)| *child_id == id)
            .map(|(_, child)| child)
    }

    pub fn child_mut(&mut self, id: ChildId) -> Option<&mut PanelChild> {
        self.arranged_generation = None;
        self.children
            .iter_mut()
            .find(|(child_id, _)| *child_id == id)
            .map(|(_, child)| child)
    }

    pub fn set_location(&mut self, id: ChildId, location: Option<Location>) {
        if let Some(child) = self.child_mut(id) {
            child.location = location;
        }
    }

    pub fn children(&self) -> impl Iterator<Item = (ChildId, &PanelChild)> {
        self.children.iter().map(|(id, child)| (*id, child))
    }

    /// Attaches the panel directly to a map.
    pub fn attach_map(&mut self, map: &SharedMap) {
        self.map = Some(Rc::downgrade(map));
        self.arranged_generation = None;
    }

    /// Nests the panel in another one; the map is looked up through it.
    pub fn attach_parent(&mut self, parent: &Rc<RefCell<MapPanel>>) {
        self.parent = Some(Rc::downgrade(parent));
        self.map = None;
        self.arranged_generation = None;
    }

    /// Forgets both the map and the parent panel.
    pub fn detach(&mut self) {
        self.map = None;
        self.parent = None;
        self.arranged_generation = None;
    }

    /// The map this panel belongs to: the cached one if it is still alive,
    /// otherwise the first map found walking up the parent panels, which is
    /// then cached.
    pub fn parent_map(&mut self) -> Option<SharedMap> {
        if let Some(map) = self.map.as_ref().and_then(Weak::upgrade) {
            return Some(map);
        }

        let parent = self.parent.as_ref().and_then(Weak::upgrade)?;
        let map = parent.borrow_mut().parent_map()?;
        self.map = Some(Rc::downgrade(&map));
        Some(map)
    }

    /// True when the map's viewport moved since the last arrange, or the
    /// children changed.
    pub fn needs_arrange(&mut self) -> bool {
        let generation = self.parent_map().map(|map| map.borrow().viewport_generation());
        generation.is_none() || generation != self.arranged_generation
    }

    pub fn arrange(&mut self, panel_size: Size) -> Vec<ChildArrangement> {
        let map = self.parent_map();
        let map = map.as_ref().map(|map| map.borrow());
        self.arranged_generation = map.as_ref().map(|map| map.viewport_generation());

        self.children
            .iter()
            .map(|(id, child)| match (child.location, map.as_deref()) {
                (Some(location), Some(map)) => {
                    let center_longitude = map.center().longitude();
                    let location = location.with_longitude(Location::nearest_longitude(
                        location.longitude(),
                        center_longitude,
                    ));
                    ChildArrangement {
                        id: *id,
                        rect: anchored_rect(child),
                        translation: Some(map.location_to_viewport_point(&location)),
                    }
                }
                _ => ChildArrangement {
                    id: *id,
                    rect: aligned_rect(child, panel_size),
                    translation: None,
                },
            })
            .collect()
    }
}

/// Child rectangle relative to its anchor point.
fn anchored_rect(child: &PanelChild) -> Rect {
    let size = child.desired_size;
    let x = match child.horizontal_alignment {
        HorizontalAlignment::Left => 0.0,
        HorizontalAlignment::Right => -size.width,
        HorizontalAlignment::Center | HorizontalAlignment::Stretch => -size.width / 2.0,
    };
    let y = match child.vertical_alignment {
        VerticalAlignment::Top => 0.0,
        VerticalAlignment::Bottom => -size.height,
        VerticalAlignment::Center | VerticalAlignment::Stretch => -size.height / 2.0,
    };
    Rect::new(x, y, size.width, size.height)
}

/// Child rectangle inside the panel's bounds.
fn aligned_rect(child: &PanelChild, panel_size: Size) -> Rect {
    let size = child.desired_size;
    let (x, width) = match child.horizontal_alignment {
        HorizontalAlignment::Left => (0.0, size.width),
        HorizontalAlignment::Right => (panel_size.width - size.width, size.width),
        HorizontalAlignment::Center => ((panel_size.width - size.width) / 2.0, size.width),
        HorizontalAlignment::Stretch => (0.0, panel_size.width),
    };
    let (y, height) = match child.vertical_alignment {
        VerticalAlignment::Top => (0.0, size.height),
        VerticalAlignment::Bottom => (panel_size.height - size.height, size.height),
        VerticalAlignment::Center => ((panel_size.height - size.height) / 2.0, size.height),
        VerticalAlignment::Stretch => (0.0, panel_size.height),
    };
    Rect::new(x, y, width, height)
}
