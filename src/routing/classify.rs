use indexmap::IndexSet;
use serde::Serialize;

use crate::geometry::Point;
use crate::netlist::{Net, Pin, PinRef};
use crate::resolver::PinResolver;

use super::types::{RouteQuality, RoutingConfig};

pub const MIN_MULTI_PINS: usize = 3;
pub const MAX_MULTI_PINS: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum StubReason {
    /// Two pins on the same item.
    SameItem,
    TooManyPins,
    /// A 3-5 pin net spread too widely to draw as wires.
    SpanTooWide,
    /// A signal route that came out too messy.
    Demoted,
    /// No candidate route exists, e.g. coincident pins.
    Unroutable,
}

/// How one net will be drawn.
#[derive(Clone, Debug, PartialEq)]
pub enum NetPlan {
    /// One wire per pin, each from the pin's own power symbol.
    PowerSymbols(Vec<(Pin, Pin)>),
    Direct([Pin; 2]),
    Multi(Vec<Pin>),
    Stub(Vec<Pin>, StubReason),
}

impl NetPlan {
    pub fn name(&self) -> &'static str {
        match self {
            NetPlan::PowerSymbols(_) => "power_symbols",
            NetPlan::Direct(_) => "direct",
            NetPlan::Multi(_) => "multi",
            NetPlan::Stub(..) => "stub",
        }
    }
}

/// Resolve a net's pins, skipping unknown and repeated references.
pub fn resolve_pins<R: PinResolver + ?Sized>(net: &Net, resolver: &R) -> Vec<Pin> {
    let unique: IndexSet<&PinRef> = net.pins.iter().collect();
    unique.into_iter().filter_map(|pin| resolver.resolve(pin)).collect()
}

/// Diagonal of the bounding box around the pins.
pub fn pin_span(pins: &[Pin]) -> f64 {
    let positions: Vec<Point> = pins.iter().map(|pin| pin.position).collect();
    Point::min_point(&positions).distance(&Point::max_point(&positions))
}

/// Decide how a net is drawn. `None` means fewer than two pins resolved and
/// the net is left out of this pass.
pub fn classify_net<R: PinResolver + ?Sized>(net: &Net, resolver: &R, config: &RoutingConfig) -> Option<NetPlan> {
    let pins = resolve_pins(net, resolver);
    if pins.len() < 2 {
        return None;
    }

    if net.kind.is_supply() {
        let symbols: Option<Vec<Pin>> = pins.iter().map(|pin| resolver.power_symbol(&pin.pin_ref())).collect();
        if let Some(symbols) = symbols {
            return Some(NetPlan::PowerSymbols(symbols.into_iter().zip(pins).collect()));
        }
    }

    let pins = match <[Pin; 2]>::try_from(pins) {
        Ok([a, b]) if a.item != b.item => return Some(NetPlan::Direct([a, b])),
        Ok(pair) => return Some(NetPlan::Stub(pair.into(), StubReason::SameItem)),
        Err(pins) => pins,
    };

    let plan = match pins.len() {
        MIN_MULTI_PINS..=MAX_MULTI_PINS => {
            if pin_span(&pins) <= config.multi_pin_span_limit {
                NetPlan::Multi(pins)
            } else {
                NetPlan::Stub(pins, StubReason::SpanTooWide)
            }
        }
        _ => NetPlan::Stub(pins, StubReason::TooManyPins),
    };
    Some(plan)
}

/// Whether a routed signal wire should give way to a stub. Short wires are
/// always kept.
pub fn should_demote(start: Point, end: Point, quality: &RouteQuality, config: &RoutingConfig) -> bool {
    if start.manhattan_distance(&end) <= config.keep_distance {
        return false;
    }
    quality.overlaps > 0
        || quality.crossings > config.max_crossings
        || quality.close_parallel > config.max_close_parallel
        || quality.score > config.max_score
}
