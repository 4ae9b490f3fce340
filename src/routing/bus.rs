use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::geometry::{Direction, Orientation, Point};
use crate::netlist::{ItemId, Net, NetId, NetKind, Pin, PinCategory, PinRef};

use super::orthogonal::connect;
use super::types::{Route, RoutingConfig};

const PROTOCOLS: &[(&[&str], &str)] = &[
    (&["i2c", "scl", "sda"], "I2C"),
    (&["spi", "miso", "mosi", "sck"], "SPI"),
    (&["uart", "tx", "rx"], "UART"),
];

pub const GENERIC_PROTOCOL: &str = "SIGNAL";

/// Protocol label for a net name, by case-insensitive keyword.
pub fn protocol_label(name: &str) -> &'static str {
    let lower = name.to_lowercase();
    PROTOCOLS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|keyword| lower.contains(keyword)))
        .map(|(_, label)| *label)
        .unwrap_or(GENERIC_PROTOCOL)
}

/// Whether a two-pin net may be bundled with its neighbours. Breakout pins
/// are always drawn on their own.
pub fn bus_eligible(net: &Net, pins: &[Pin]) -> bool {
    if pins.len() != 2 || pins.iter().any(|pin| pin.breakout) {
        return false;
    }
    match net.kind {
        NetKind::Bus => true,
        NetKind::Electrical => {
            let protocol_named = protocol_label(&net.name) != GENERIC_PROTOCOL
                || pins.iter().any(|pin| matches!(pin.category, PinCategory::Protocol(_)));
            protocol_named && pins.iter().all(|pin| pin.item_kind.is_item_level())
        }
        _ => false,
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EndpointKey {
    pub item: ItemId,
    pub side: Direction,
}

impl EndpointKey {
    fn of(pin: &Pin) -> Self {
        EndpointKey {
            item: pin.item.clone(),
            side: pin.side,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BusEndpoint {
    pub key: EndpointKey,
    /// Pin the merge point is measured from.
    pub representative: PinRef,
    pub merge_point: Point,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Fanout {
    pub net_id: NetId,
    pub route: Route,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BusGroup {
    pub id: String,
    pub protocol: &'static str,
    pub members: Vec<NetId>,
    pub endpoints: [BusEndpoint; 2],
    pub trunk: Route,
    pub fanouts: Vec<Fanout>,
}

/// Left-most then right-most pin by x, ties broken by y then pin identity.
fn left_right(pins: &[Pin; 2]) -> (&Pin, &Pin) {
    let order = |pin: &Pin| (pin.position.x, pin.position.y, pin.item.clone(), pin.terminal.clone());
    if order(&pins[0]) <= order(&pins[1]) {
        (&pins[0], &pins[1])
    } else {
        (&pins[1], &pins[0])
    }
}

fn group_key(pins: &[Pin; 2]) -> (EndpointKey, EndpointKey) {
    let (left, right) = left_right(pins);
    let (a, b) = (EndpointKey::of(left), EndpointKey::of(right));
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn merge_point(pin: &Pin, offset: i32) -> Point {
    pin.side.offset(pin.position, offset)
}

/// Lead from a member pin out to the merge line, then along it to the merge point.
fn fanout_route(pin: &Pin, merge: Point) -> Option<Route> {
    let knee = match pin.side.to_orientation() {
        Orientation::Horizontal => Point::new(merge.x, pin.position.y),
        Orientation::Vertical => Point::new(pin.position.x, merge.y),
    };
    Route::new(vec![pin.position, knee, merge])
}

fn build_group(members: &[(&Net, &[Pin; 2])], config: &RoutingConfig) -> Option<BusGroup> {
    let (first_net, first_pins) = members.first()?;
    let (left, right) = left_right(first_pins);
    let reps = [left, right];
    let keys = [EndpointKey::of(left), EndpointKey::of(right)];
    let merges = [
        merge_point(left, config.bus_merge_offset),
        merge_point(right, config.bus_merge_offset),
    ];
    let trunk = Route::new(connect(merges[0], merges[1], left.side.to_orientation()))?;
    let id = format!(
        "bus:{}.{}|{}.{}",
        keys[0].item,
        keys[0].side.as_str(),
        keys[1].item,
        keys[1].side.as_str()
    );

    let mut fanouts = Vec::with_capacity(members.len() * 2);
    for (net, pins) in members {
        for (end, key) in keys.iter().enumerate() {
            let Some(pin) = pins.iter().find(|pin| pin.item == key.item) else {
                continue;
            };
            if let Some(route) = fanout_route(pin, merges[end]) {
                fanouts.push(Fanout {
                    net_id: net.id.clone(),
                    route,
                });
            }
        }
    }

    let endpoints = [0, 1].map(|end| BusEndpoint {
        key: keys[end].clone(),
        representative: reps[end].pin_ref(),
        merge_point: merges[end],
    });

    Some(BusGroup {
        id,
        protocol: protocol_label(&first_net.name),
        members: members.iter().map(|(net, _)| net.id.clone()).collect(),
        endpoints,
        trunk,
        fanouts,
    })
}

/// Bundle eligible two-pin nets that run between the same pair of item sides.
/// Groups keep first-seen order; nets that end up alone are left to be routed
/// individually.
pub fn detect_buses(candidates: &[(&Net, [Pin; 2])], config: &RoutingConfig) -> Vec<BusGroup> {
    let mut by_key: IndexMap<(EndpointKey, EndpointKey), Vec<(&Net, &[Pin; 2])>> = IndexMap::new();
    for (net, pins) in candidates {
        by_key.entry(group_key(pins)).or_default().push((*net, pins));
    }

    by_key
        .into_values()
        .filter(|members| members.len() >= 2)
        .filter_map(|members| {
            let group = build_group(&members, config);
            if group.is_none() {
                debug!(net = %members[0].0.id, "bus merge points coincide, routing members individually");
            }
            group
        })
        .collect()
}
