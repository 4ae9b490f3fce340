use serde::Serialize;
use tracing::warn;

use crate::geometry::{Orientation, Point};

use super::types::Segment;

/// A point where a horizontal and a vertical wire of different nets pass
/// through each other, drawn with a jump marker.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct Crossing {
    pub x: i32,
    pub y: i32,
    pub horizontal_net_id: String,
    pub vertical_net_id: String,
}

/// Intersection of a horizontal and a vertical segment strictly inside both.
/// Touching at an endpoint or a T-junction is not a crossing.
pub(crate) fn crossing_point(a: &Segment, b: &Segment) -> Option<Point> {
    let (h, v) = match (a.orientation, b.orientation) {
        (Orientation::Horizontal, Orientation::Vertical) => (a, b),
        (Orientation::Vertical, Orientation::Horizontal) => (b, a),
        _ => return None,
    };
    let (h_min, h_max) = h.span();
    let (v_min, v_max) = v.span();
    let x = v.fixed();
    let y = h.fixed();
    (h_min < x && x < h_max && v_min < y && y < v_max).then_some(Point::new(x, y))
}

/// Pairwise scan of every final segment. Quadratic, so scanning stops at
/// `max_segments`.
pub fn detect_crossings(segments: &[Segment], max_segments: usize) -> Vec<Crossing> {
    let scanned = if segments.len() > max_segments {
        warn!(
            segments = segments.len(),
            max_segments, "too many segments for crossing scan, ignoring the rest"
        );
        &segments[..max_segments]
    } else {
        segments
    };

    let mut crossings = Vec::new();
    for (i, a) in scanned.iter().enumerate() {
        for b in &scanned[i + 1..] {
            if a.owner == b.owner {
                continue;
            }
            if let Some(point) = crossing_point(a, b) {
                let (h, v) = if a.orientation == Orientation::Horizontal {
                    (a, b)
                } else {
                    (b, a)
                };
                crossings.push(Crossing {
                    x: point.x,
                    y: point.y,
                    horizontal_net_id: h.owner.clone(),
                    vertical_net_id: v.owner.clone(),
                });
            }
        }
    }
    crossings
}
