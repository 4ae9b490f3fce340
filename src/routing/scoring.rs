use super::context::RoutingContext;
use super::crossing::crossing_point;
use super::types::{Route, RouteQuality, Segment};

pub const OVERLAP_WEIGHT: u32 = 100;
pub const CROSSING_WEIGHT: u32 = 25;
pub const CLOSE_PARALLEL_WEIGHT: u32 = 6;
pub const EXCESS_BEND_WEIGHT: u32 = 2;

/// Interior points a route may have before bends start costing extra.
const FREE_INTERIOR_POINTS: usize = 2;

fn overlaps(a: &Segment, b: &Segment) -> bool {
    a.orientation == b.orientation && a.fixed() == b.fixed() && a.shared_span(b) > 0
}

fn close_parallel(a: &Segment, b: &Segment, spacing: i32) -> bool {
    if a.orientation != b.orientation {
        return false;
    }
    let gap = (a.fixed() - b.fixed()).abs();
    gap > 0 && gap <= spacing && a.shared_span(b) > 0
}

/// Score `route` against everything already placed in `ctx`. Segments owned by
/// `owner` are ignored so that edges of one net may share leads.
pub fn evaluate(route: &Route, owner: &str, endpoint_items: &[&str], ctx: &RoutingContext) -> RouteQuality {
    let spacing = ctx.config.spacing;
    let mut quality = RouteQuality::default();

    for segment in route.segments(owner) {
        if ctx.segment_blocked(segment.from, segment.to, endpoint_items) {
            quality.blocked = true;
        }
        for existing in ctx.placed_segments().iter().filter(|s| s.owner != owner) {
            if overlaps(&segment, existing) {
                quality.overlaps += 1;
            } else if close_parallel(&segment, existing, spacing) {
                quality.close_parallel += 1;
            } else if crossing_point(&segment, existing).is_some() {
                quality.crossings += 1;
            }
        }
    }

    quality.excess_bends = route.interior_point_count().saturating_sub(FREE_INTERIOR_POINTS) as u32;
    quality.score = quality.overlaps * OVERLAP_WEIGHT
        + quality.crossings * CROSSING_WEIGHT
        + quality.close_parallel * CLOSE_PARALLEL_WEIGHT
        + quality.excess_bends * EXCESS_BEND_WEIGHT;
    quality
}
