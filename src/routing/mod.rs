mod bus;
mod classify;
mod context;
mod crossing;
mod edges;
mod orthogonal;
mod overrides;
mod schematic_router;
mod scoring;
mod trace;
mod types;

pub use bus::{bus_eligible, detect_buses, protocol_label, BusEndpoint, BusGroup, EndpointKey, Fanout};
pub use classify::{classify_net, pin_span, resolve_pins, should_demote, NetPlan, StubReason};
pub use context::RoutingContext;
pub use crossing::{detect_crossings, Crossing};
pub use edges::{build_edges, spanning_tree, EdgeSet, Topology};
pub use orthogonal::{base_route, candidate_routes, connect, score_and_select_route, ScoredRoute};
pub use overrides::{drag_segment, reanchor, snap, DragOutcome, LiveDrag, RouteOverrideStore};
pub use schematic_router::{route_nets, NetRouting, RoutedPath, RoutingOutput, SchematicRouter, StubMarker};
pub use scoring::evaluate;
pub use types::{simplify, BendHandle, Route, RouteQuality, RoutingConfig, Segment, TRACE_ENV_VAR};
