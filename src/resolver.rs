//! Turns item placements into world-space pins and obstacles.

use std::collections::hash_map::DefaultHasher;
use std::hash::BuildHasherDefault;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::geometry::{BoundingBox, Direction, Point, Rectangle};
use crate::netlist::{ItemId, ItemKind, Obstacle, Pin, PinCategory, PinRef};

/// Lookup map with a fixed hasher so lookups are reproducible across runs.
pub(crate) type LookupMap<K, V> = hashbrown::HashMap<K, V, BuildHasherDefault<DefaultHasher>>;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    R0,
    R90,
    R180,
    R270,
}

impl Rotation {
    fn quarter_turns(&self) -> usize {
        match self {
            Rotation::R0 => 0,
            Rotation::R90 => 1,
            Rotation::R180 => 2,
            Rotation::R270 => 3,
        }
    }
}

/// Placement of an item: mirror about the local y axis, rotate clockwise,
/// then translate.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Default, Serialize, Deserialize)]
pub struct ItemTransform {
    pub position: Point,
    #[serde(default)]
    pub rotation: Rotation,
    #[serde(default)]
    pub mirror: bool,
}

impl ItemTransform {
    pub fn at(position: Point) -> Self {
        ItemTransform {
            position,
            ..Default::default()
        }
    }

    pub fn rotated(mut self, rotation: Rotation) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn mirrored(mut self, mirror: bool) -> Self {
        self.mirror = mirror;
        self
    }

    pub fn apply_point(&self, local: Point) -> Point {
        let mut p = if self.mirror { Point::new(-local.x, local.y) } else { local };
        for _ in 0..self.rotation.quarter_turns() {
            // Clockwise on screen, y pointing down.
            p = Point::new(-p.y, p.x);
        }
        p + self.position
    }

    pub fn apply_direction(&self, local: Direction) -> Direction {
        let mut d = if self.mirror { local.mirror_horizontal() } else { local };
        for _ in 0..self.rotation.quarter_turns() {
            d = d.rotate_clockwise();
        }
        d
    }

    pub fn apply_rect(&self, local: &Rectangle) -> Rectangle {
        Rectangle::from_corners(
            self.apply_point(local.top_left()),
            self.apply_point(local.bottom_right()),
        )
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct LocalPin {
    pub terminal: String,
    pub offset: Point,
    pub side: Direction,
    #[serde(default)]
    pub category: PinCategory,
    #[serde(default)]
    pub breakout: bool,
}

impl LocalPin {
    pub fn new(terminal: impl Into<String>, offset: Point, side: Direction) -> Self {
        LocalPin {
            terminal: terminal.into(),
            offset,
            side,
            category: PinCategory::Plain,
            breakout: false,
        }
    }

    pub fn with_category(mut self, category: PinCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_breakout(mut self, breakout: bool) -> Self {
        self.breakout = breakout;
        self
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ItemPlacement {
    pub item: ItemId,
    pub kind: ItemKind,
    pub transform: ItemTransform,
    /// Body in local coordinates.
    pub body: Rectangle,
    pub pins: Vec<LocalPin>,
}

impl ItemPlacement {
    pub fn new(item: impl Into<ItemId>, kind: ItemKind, transform: ItemTransform, body: Rectangle) -> Self {
        ItemPlacement {
            item: item.into(),
            kind,
            transform,
            body,
            pins: Vec::new(),
        }
    }

    pub fn with_pin(mut self, pin: LocalPin) -> Self {
        self.pins.push(pin);
        self
    }

    pub fn world_pins(&self) -> impl Iterator<Item = Pin> + '_ {
        self.pins.iter().map(move |local| Pin {
            item: self.item.clone(),
            terminal: local.terminal.clone(),
            position: self.transform.apply_point(local.offset),
            side: self.transform.apply_direction(local.side),
            item_kind: self.kind,
            category: local.category.clone(),
            breakout: local.breakout,
        })
    }

    pub fn obstacle(&self) -> Obstacle {
        Obstacle::new(self.item.clone(), self.transform.apply_rect(&self.body))
    }
}

/// Source of resolved pin geometry for one routing pass.
pub trait PinResolver {
    fn resolve(&self, pin: &PinRef) -> Option<Pin>;

    /// Synthetic power-symbol endpoint placed next to `pin`, if the host drew one.
    fn power_symbol(&self, _pin: &PinRef) -> Option<Pin> {
        None
    }
}

/// Resolved pins for every placed item, plus any power-symbol endpoints.
#[derive(Clone, Debug, Default)]
pub struct PinTable {
    pins: LookupMap<PinRef, Pin>,
    power_symbols: LookupMap<PinRef, Pin>,
    obstacles: IndexMap<ItemId, Obstacle>,
}

impl PinTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_placements<'a>(placements: impl IntoIterator<Item = &'a ItemPlacement>) -> Self {
        let mut table = PinTable::new();
        for placement in placements {
            table.add_placement(placement);
        }
        table
    }

    pub fn add_placement(&mut self, placement: &ItemPlacement) {
        for pin in placement.world_pins() {
            self.pins.insert(pin.pin_ref(), pin);
        }
        self.obstacles.insert(placement.item.clone(), placement.obstacle());
    }

    /// Register a pin directly, without an owning placement.
    pub fn insert_pin(&mut self, pin: Pin) {
        self.pins.insert(pin.pin_ref(), pin);
    }

    pub fn insert_obstacle(&mut self, obstacle: Obstacle) {
        self.obstacles.insert(obstacle.item.clone(), obstacle);
    }

    pub fn insert_power_symbol(&mut self, for_pin: PinRef, symbol: Pin) {
        self.power_symbols.insert(for_pin, symbol);
    }

    pub fn obstacles(&self) -> impl Iterator<Item = &Obstacle> {
        self.obstacles.values()
    }
}

impl PinResolver for PinTable {
    fn resolve(&self, pin: &PinRef) -> Option<Pin> {
        self.pins.get(pin).cloned()
    }

    fn power_symbol(&self, pin: &PinRef) -> Option<Pin> {
        self.power_symbols.get(pin).cloned()
    }
}
