//! Manhattan wire routing for schematic diagrams.
//!
//! Given placed items, their pins and the nets between them, [`SchematicRouter`]
//! draws each net as rectilinear wires, a shared bus trunk, or a labelled stub,
//! and reports where wires of different nets cross. User edits to individual
//! routes live in a [`RouteOverrideStore`] and survive later passes.

pub mod error;
pub mod geometry;
pub mod lib_tracing;
pub mod netlist;
pub mod resolver;
pub mod routing;

pub use error::RoutingError;
pub use geometry::{DirectedPoint, Direction, Orientation, Point, Rectangle};
pub use lib_tracing::RoutingTracer;
pub use netlist::{ItemKind, Net, NetKind, Obstacle, Pin, PinCategory, PinRef};
pub use resolver::{ItemPlacement, ItemTransform, LocalPin, PinResolver, PinTable, Rotation};
pub use routing::{
    LiveDrag, NetRouting, Route, RouteOverrideStore, RoutingConfig, RoutingOutput, SchematicRouter,
};
