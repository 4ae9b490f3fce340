//! Items, pins and nets as the router sees them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{BoundingBox, DirectedPoint, Direction, Point, PointLike, Rectangle};

pub type ItemId = String;
pub type NetId = String;

/// What kind of diagram item owns a pin.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Component,
    Module,
    Port,
    /// Two-terminal pass-through part (series resistor, ferrite, jumper) drawn
    /// between two halves of a net.
    Bridge,
}

impl ItemKind {
    /// Pins on sub-circuits and ports rather than on leaf components.
    pub fn is_item_level(&self) -> bool {
        matches!(self, ItemKind::Module | ItemKind::Port)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "kind", content = "name", rename_all = "lowercase")]
pub enum PinCategory {
    #[default]
    Plain,
    Power,
    Ground,
    Protocol(String),
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PinRef {
    pub item: ItemId,
    pub terminal: String,
}

impl PinRef {
    pub fn new(item: impl Into<ItemId>, terminal: impl Into<String>) -> Self {
        PinRef {
            item: item.into(),
            terminal: terminal.into(),
        }
    }
}

impl fmt::Display for PinRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.item, self.terminal)
    }
}

/// A pin resolved to world coordinates for one routing pass.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Pin {
    pub item: ItemId,
    pub terminal: String,
    pub position: Point,
    pub side: Direction,
    pub item_kind: ItemKind,
    #[serde(default)]
    pub category: PinCategory,
    /// Breakout pins are never bundled into a bus.
    #[serde(default)]
    pub breakout: bool,
}

impl Pin {
    pub fn new(item: impl Into<ItemId>, terminal: impl Into<String>, position: Point, side: Direction) -> Self {
        Pin {
            item: item.into(),
            terminal: terminal.into(),
            position,
            side,
            item_kind: ItemKind::Component,
            category: PinCategory::Plain,
            breakout: false,
        }
    }

    pub fn with_kind(mut self, item_kind: ItemKind) -> Self {
        self.item_kind = item_kind;
        self
    }

    pub fn with_category(mut self, category: PinCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_breakout(mut self, breakout: bool) -> Self {
        self.breakout = breakout;
        self
    }

    pub fn pin_ref(&self) -> PinRef {
        PinRef::new(self.item.clone(), self.terminal.clone())
    }

    pub fn anchor(&self) -> DirectedPoint {
        DirectedPoint::new(self.position.x, self.position.y, self.side)
    }
}

impl PointLike for Pin {
    fn x(&self) -> i32 {
        self.position.x
    }

    fn y(&self) -> i32 {
        self.position.y
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetKind {
    Power,
    Ground,
    Bus,
    Electrical,
    Signal,
}

impl NetKind {
    /// Routes of every kind except plain signals are kept whatever their quality.
    pub fn is_force_routed(&self) -> bool {
        !matches!(self, NetKind::Signal)
    }

    pub fn is_supply(&self) -> bool {
        matches!(self, NetKind::Power | NetKind::Ground)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Net {
    pub id: NetId,
    pub name: String,
    pub kind: NetKind,
    pub pins: Vec<PinRef>,
}

impl Net {
    pub fn new(id: impl Into<NetId>, name: impl Into<String>, kind: NetKind, pins: Vec<PinRef>) -> Self {
        Net {
            id: id.into(),
            name: name.into(),
            kind,
            pins,
        }
    }
}

/// An item body that routes should not cut through.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub item: ItemId,
    pub rect: Rectangle,
}

impl Obstacle {
    pub fn new(item: impl Into<ItemId>, rect: Rectangle) -> Self {
        Obstacle {
            item: item.into(),
            rect,
        }
    }
}

impl BoundingBox for Obstacle {
    fn top_left(&self) -> Point {
        self.rect.top_left()
    }

    fn bottom_right(&self) -> Point {
        self.rect.bottom_right()
    }
}

impl rstar::RTreeObject for Obstacle {
    type Envelope = rstar::AABB<Point>;

    fn envelope(&self) -> Self::Envelope {
        rstar::AABB::from_corners(self.top_left(), self.bottom_right())
    }
}
