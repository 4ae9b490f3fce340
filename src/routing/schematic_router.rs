use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::geometry::Point;
use crate::netlist::{ItemId, Net, NetId, Obstacle, Pin, PinRef};
use crate::resolver::{ItemPlacement, PinResolver, PinTable};

use super::bus::{bus_eligible, detect_buses, BusGroup};
use super::classify::{classify_net, should_demote, NetPlan, StubReason};
use super::context::RoutingContext;
use super::crossing::{detect_crossings, Crossing};
use super::edges::build_edges;
use super::orthogonal::score_and_select_route;
use super::overrides::RouteOverrideStore;
use super::trace::{write_trace, RoutingTrace};
use super::types::{Route, RouteQuality, RoutingConfig, Segment};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RoutedPath {
    pub id: String,
    pub route: Route,
    /// Absent for user overrides, which are not scored.
    pub quality: Option<RouteQuality>,
    pub overridden: bool,
}

/// Short labelled lead drawn at a pin instead of a wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StubMarker {
    pub pin: PinRef,
    pub position: Point,
    pub lead_end: Point,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum NetRouting {
    Routed(Vec<RoutedPath>),
    Bus { bus_id: String },
    Stub { reason: StubReason, markers: Vec<StubMarker> },
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RoutingOutput {
    pub nets: IndexMap<NetId, NetRouting>,
    pub buses: Vec<BusGroup>,
    pub crossings: Vec<Crossing>,
    /// Nets with fewer than two resolvable pins.
    pub unresolved: Vec<NetId>,
}

impl RoutingOutput {
    /// Every drawn segment, tagged with its net or bus id.
    pub fn segments(&self) -> Vec<Segment> {
        let mut segments = Vec::new();
        for (net_id, routing) in &self.nets {
            if let NetRouting::Routed(paths) = routing {
                for path in paths {
                    segments.extend(path.route.segments(net_id));
                }
            }
        }
        for bus in &self.buses {
            segments.extend(bus.trunk.segments(&bus.id));
            for fanout in &bus.fanouts {
                segments.extend(fanout.route.segments(&bus.id));
            }
        }
        segments
    }

    /// Look up a drawn route by id: a routed path or a bus trunk.
    pub fn route(&self, route_id: &str) -> Option<&Route> {
        self.nets
            .values()
            .filter_map(|routing| match routing {
                NetRouting::Routed(paths) => Some(paths),
                _ => None,
            })
            .flatten()
            .find(|path| path.id == route_id)
            .map(|path| &path.route)
            .or_else(|| self.buses.iter().find(|bus| bus.id == route_id).map(|bus| &bus.trunk))
    }
}

fn stub_markers(net: &Net, pins: &[Pin], config: &RoutingConfig) -> Vec<StubMarker> {
    pins.iter()
        .map(|pin| StubMarker {
            pin: pin.pin_ref(),
            position: pin.position,
            lead_end: pin.side.offset(pin.position, config.stub_length),
            label: net.name.clone(),
        })
        .collect()
}

/// Route every wire of one net. The wires are committed to the context only
/// if the whole net stays routed.
fn route_wires(
    net: &Net,
    wires: Vec<(String, &Pin, &Pin)>,
    stub_pins: &[Pin],
    ctx: &mut RoutingContext,
    trace: &mut Option<RoutingTrace>,
) -> NetRouting {
    let config = ctx.config;
    let stub = |reason| NetRouting::Stub {
        reason,
        markers: stub_markers(net, stub_pins, config),
    };

    let mut paths = Vec::with_capacity(wires.len());
    for (id, a, b) in wires {
        if let Some(route) = ctx.overrides.resolve(ctx.diagram_context, &id, a.position, b.position) {
            debug!(route_id = %id, "using route override");
            paths.push(RoutedPath {
                id,
                route,
                quality: None,
                overridden: true,
            });
            continue;
        }

        let Some(chosen) = score_and_select_route(a, b, &net.id, ctx) else {
            debug!(net = %net.id, route_id = %id, "no route between coincident pins");
            return stub(StubReason::Unroutable);
        };
        let demoted = !net.kind.is_force_routed() && should_demote(a.position, b.position, &chosen.quality, config);
        if let Some(trace) = trace.as_mut() {
            trace.record_route(&id, &chosen, demoted);
        }
        if demoted {
            debug!(net = %net.id, score = chosen.quality.score, "demoting signal route to stub");
            return stub(StubReason::Demoted);
        }
        debug!(route_id = %id, score = chosen.quality.score, candidate = chosen.candidate_index, "routed");
        paths.push(RoutedPath {
            id,
            route: chosen.route,
            quality: Some(chosen.quality),
            overridden: false,
        });
    }

    for path in &paths {
        ctx.place(&path.route, &net.id);
    }
    NetRouting::Routed(paths)
}

fn route_plan(net: &Net, plan: NetPlan, ctx: &mut RoutingContext, trace: &mut Option<RoutingTrace>) -> NetRouting {
    match plan {
        NetPlan::PowerSymbols(wires) => {
            let pins: Vec<Pin> = wires.iter().map(|(_, pin)| pin.clone()).collect();
            let wires = wires
                .iter()
                .map(|(symbol, pin)| (format!("{}@{}", net.id, pin.pin_ref()), symbol, pin))
                .collect();
            route_wires(net, wires, &pins, ctx, trace)
        }
        NetPlan::Direct(pins) => {
            let wires = vec![(net.id.clone(), &pins[0], &pins[1])];
            route_wires(net, wires, &pins, ctx, trace)
        }
        NetPlan::Multi(pins) => {
            let edges = build_edges(&pins);
            debug!(net = %net.id, topology = ?edges.topology, edges = edges.len(), "multi-pin net");
            let wires = edges
                .edges()
                .into_iter()
                .enumerate()
                .map(|(k, (from, to))| (format!("{}#{k}", net.id), &pins[from], &pins[to]))
                .collect();
            route_wires(net, wires, &pins, ctx, trace)
        }
        NetPlan::Stub(pins, reason) => NetRouting::Stub {
            reason,
            markers: stub_markers(net, &pins, ctx.config),
        },
    }
}

/// One full routing pass: classify, bundle buses, route, find crossings.
/// Deterministic for a given input and override store.
#[instrument(skip_all, fields(context = diagram_context))]
pub fn route_nets<'n, R: PinResolver + ?Sized>(
    nets: impl IntoIterator<Item = &'n Net>,
    resolver: &R,
    obstacles: Vec<Obstacle>,
    config: &RoutingConfig,
    overrides: &mut RouteOverrideStore,
    diagram_context: &str,
) -> RoutingOutput {
    let trace_path = config.resolved_trace_path();
    let mut ctx = RoutingContext::new(config, obstacles, overrides, diagram_context);
    let mut trace = trace_path.as_ref().map(|_| RoutingTrace::new(ctx.obstacles()));
    let mut output = RoutingOutput::default();

    let mut plans: Vec<(&Net, NetPlan)> = Vec::new();
    for net in nets {
        match classify_net(net, resolver, config) {
            Some(plan) => {
                debug!(net = %net.id, plan = plan.name(), "classified");
                if let Some(trace) = trace.as_mut() {
                    trace.record_plan(net, &plan);
                }
                plans.push((net, plan));
            }
            None => {
                debug!(net = %net.id, "fewer than two pins resolved, skipping");
                output.unresolved.push(net.id.clone());
            }
        }
    }

    let bus_candidates: Vec<(&Net, [Pin; 2])> = plans
        .iter()
        .filter_map(|(net, plan)| match plan {
            NetPlan::Direct(pins) if bus_eligible(net, pins) => Some((*net, pins.clone())),
            _ => None,
        })
        .collect();
    let mut buses = detect_buses(&bus_candidates, config);

    let mut bus_of: IndexMap<NetId, String> = IndexMap::new();
    for bus in &mut buses {
        let (start, end) = (bus.trunk.start(), bus.trunk.end());
        if let Some(route) = ctx.overrides.resolve(diagram_context, &bus.id, start, end) {
            bus.trunk = route;
        }
        ctx.place(&bus.trunk, &bus.id);
        for fanout in &bus.fanouts {
            ctx.place(&fanout.route, &bus.id);
        }
        for member in &bus.members {
            bus_of.insert(member.clone(), bus.id.clone());
        }
    }

    for (net, plan) in plans {
        let routing = match bus_of.get(&net.id) {
            Some(bus_id) => NetRouting::Bus { bus_id: bus_id.clone() },
            None => route_plan(net, plan, &mut ctx, &mut trace),
        };
        output.nets.insert(net.id.clone(), routing);
    }
    output.buses = buses;
    output.crossings = detect_crossings(&output.segments(), config.max_crossing_segments);

    info!(
        nets = output.nets.len(),
        buses = output.buses.len(),
        crossings = output.crossings.len(),
        unresolved = output.unresolved.len(),
        "routing pass finished"
    );

    if let (Some(path), Some(trace)) = (trace_path, trace) {
        let json = trace.into_json(&output.buses, &output.crossings);
        if let Err(error) = write_trace(&path, &json) {
            warn!(%error, "failed to write routing trace");
        }
    }
    output
}

/// Holds the current diagram snapshot and routes it on demand.
#[derive(Clone, Debug, Default)]
pub struct SchematicRouter {
    config: RoutingConfig,
    placements: IndexMap<ItemId, ItemPlacement>,
    power_symbols: IndexMap<PinRef, Pin>,
    nets: IndexMap<NetId, Net>,
}

impl SchematicRouter {
    pub fn new(config: RoutingConfig) -> Self {
        SchematicRouter {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// Add or move an item.
    pub fn add_item(&mut self, placement: ItemPlacement) {
        self.placements.insert(placement.item.clone(), placement);
    }

    pub fn remove_item(&mut self, item: &str) -> Option<ItemPlacement> {
        self.placements.shift_remove(item)
    }

    pub fn add_net(&mut self, net: Net) {
        self.nets.insert(net.id.clone(), net);
    }

    pub fn remove_net(&mut self, net_id: &str) -> Option<Net> {
        self.nets.shift_remove(net_id)
    }

    pub fn add_power_symbol(&mut self, for_pin: PinRef, symbol: Pin) {
        self.power_symbols.insert(for_pin, symbol);
    }

    fn pin_table(&self) -> PinTable {
        let mut table = PinTable::from_placements(self.placements.values());
        for (pin, symbol) in &self.power_symbols {
            table.insert_power_symbol(pin.clone(), symbol.clone());
        }
        table
    }

    pub fn route(&self, overrides: &mut RouteOverrideStore, diagram_context: &str) -> RoutingOutput {
        let table = self.pin_table();
        let obstacles = table.obstacles().cloned().collect();
        route_nets(self.nets.values(), &table, obstacles, &self.config, overrides, diagram_context)
    }
}
