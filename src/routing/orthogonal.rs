use serde::Serialize;
use tracing::trace;

use crate::geometry::{DirectedPoint, Orientation, Point, PointLike};
use crate::netlist::Pin;

use super::context::RoutingContext;
use super::scoring::evaluate;
use super::types::{Route, RouteQuality};

/// The chosen candidate together with the scores of all candidates tried.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScoredRoute {
    pub route: Route,
    pub quality: RouteQuality,
    pub candidate_index: usize,
    pub candidates: Vec<RouteQuality>,
}

/// Join `p` and `q` with a single corner, or directly if they share an axis.
/// `first` is the orientation of the leg leaving `p`.
pub fn connect(p: Point, q: Point, first: Orientation) -> Vec<Point> {
    if p.x == q.x || p.y == q.y {
        return vec![p, q];
    }
    let corner = match first {
        Orientation::Horizontal => Point::new(q.x, p.y),
        Orientation::Vertical => Point::new(p.x, q.y),
    };
    vec![p, corner, q]
}

/// Orientation of the run between two stub points that offset variants move sideways.
fn movable_run(p: Point, q: Point, first: Orientation) -> Orientation {
    if p == q {
        first
    } else if p.y == q.y {
        Orientation::Horizontal
    } else if p.x == q.x {
        Orientation::Vertical
    } else {
        // The second leg of the single-corner connection.
        first.other()
    }
}

fn shifted(p: Point, q: Point, first: Orientation, offset: i32) -> Vec<Point> {
    match movable_run(p, q, first) {
        Orientation::Vertical => {
            let x = q.x + offset;
            vec![p, Point::new(x, p.y), Point::new(x, q.y), q]
        }
        Orientation::Horizontal => {
            let y = q.y + offset;
            vec![p, Point::new(p.x, y), Point::new(q.x, y), q]
        }
    }
}

fn with_leads(start: Point, middle: Vec<Point>, end: Point) -> Vec<Point> {
    let mut points = Vec::with_capacity(middle.len() + 2);
    points.push(start);
    points.extend(middle);
    points.push(end);
    points
}

/// Stub out of each pin along its exit side, then one corner between the stub
/// ends. The corner keeps the first pin's exit orientation.
pub fn base_route(start: DirectedPoint, end: DirectedPoint, stub_length: i32) -> Option<Route> {
    let p = start.stub(stub_length);
    let q = end.stub(stub_length);
    let first = start.direction.to_orientation();
    Route::new(with_leads(start.as_point(), connect(p, q, first), end.as_point()))
}

/// All candidates in priority order: the base route, then the connecting run
/// moved by +spacing, -spacing, +2*spacing and -2*spacing.
pub fn candidate_routes(start: DirectedPoint, end: DirectedPoint, stub_length: i32, spacing: i32) -> Vec<Route> {
    let p = start.stub(stub_length);
    let q = end.stub(stub_length);
    let first = start.direction.to_orientation();

    let mut raw = vec![connect(p, q, first)];
    for offset in [spacing, -spacing, 2 * spacing, -2 * spacing] {
        raw.push(shifted(p, q, first, offset));
    }

    raw.into_iter()
        .filter_map(|middle| Route::new(with_leads(start.as_point(), middle, end.as_point())))
        .collect()
}

/// Pick the best candidate between two pins. An unblocked candidate always
/// beats a blocked one; otherwise the lowest score wins and earlier candidates
/// win ties. `None` only when the pins coincide.
pub fn score_and_select_route(a: &Pin, b: &Pin, owner: &str, ctx: &RoutingContext) -> Option<ScoredRoute> {
    let endpoint_items = [a.item.as_str(), b.item.as_str()];
    let candidates = candidate_routes(a.anchor(), b.anchor(), ctx.config.stub_length, ctx.config.spacing);

    let mut qualities = Vec::with_capacity(candidates.len());
    let mut best: Option<(usize, RouteQuality)> = None;
    for (index, route) in candidates.iter().enumerate() {
        let quality = evaluate(route, owner, &endpoint_items, ctx);
        trace!(owner, index, score = quality.score, blocked = quality.blocked, "scored candidate");
        let better = match &best {
            None => true,
            Some((_, current)) => (quality.blocked, quality.score) < (current.blocked, current.score),
        };
        if better {
            best = Some((index, quality));
        }
        qualities.push(quality);
    }

    let (index, quality) = best?;
    let route = candidates.into_iter().nth(index)?;
    Some(ScoredRoute {
        route,
        quality,
        candidate_index: index,
        candidates: qualities,
    })
}
