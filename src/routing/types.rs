use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geometry::{Orientation, Point};

pub const TRACE_ENV_VAR: &str = "WIRELAY_ROUTING_TRACE_JSON";

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Grid pitch for candidate offsets, close-parallel detection and drag snapping.
    pub spacing: i32,
    /// Length of the straight lead drawn out of each pin before the first bend.
    pub stub_length: i32,
    /// Distance of a bus merge point from its representative pin.
    pub bus_merge_offset: i32,
    /// Largest pin bounding-box diagonal for which a 3-5 pin net is drawn as wires.
    pub multi_pin_span_limit: f64,
    /// Signal routes at most this long (Manhattan) are never demoted.
    pub keep_distance: i32,
    pub max_close_parallel: u32,
    pub max_crossings: u32,
    pub max_score: u32,
    /// Pointer travel below which a drag gesture counts as a click.
    pub drag_threshold: i32,
    pub max_crossing_segments: usize,
    pub trace_path: Option<PathBuf>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        RoutingConfig {
            spacing: 4,
            stub_length: 4,
            bus_merge_offset: 6,
            multi_pin_span_limit: 160.0,
            keep_distance: 24,
            max_close_parallel: 3,
            max_crossings: 1,
            max_score: 210,
            drag_threshold: 3,
            max_crossing_segments: 4096,
            trace_path: None,
        }
    }
}

impl RoutingConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_spacing(mut self, spacing: i32) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn with_stub_length(mut self, stub_length: i32) -> Self {
        self.stub_length = stub_length;
        self
    }

    pub fn with_bus_merge_offset(mut self, offset: i32) -> Self {
        self.bus_merge_offset = offset;
        self
    }

    pub fn with_multi_pin_span_limit(mut self, limit: f64) -> Self {
        self.multi_pin_span_limit = limit;
        self
    }

    pub fn with_trace_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.trace_path = Some(path.into());
        self
    }

    /// The environment variable wins over the configured trace path.
    pub fn resolved_trace_path(&self) -> Option<PathBuf> {
        std::env::var_os(TRACE_ENV_VAR)
            .map(PathBuf::from)
            .or_else(|| self.trace_path.clone())
    }
}

/// Drop repeated points and interior points collinear with their neighbours,
/// including points where the path doubles back on itself. The first and last
/// points are never removed.
pub fn simplify(points: &[Point]) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for &point in points {
        while out.len() >= 2 {
            let a = out[out.len() - 2];
            let b = out[out.len() - 1];
            let collinear = (a.x == b.x && b.x == point.x) || (a.y == b.y && b.y == point.y);
            if collinear {
                out.pop();
            } else {
                break;
            }
        }
        if out.last() != Some(&point) {
            out.push(point);
        }
    }
    out
}

/// A rectilinear polyline of at least two points.
#[derive(Clone, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point>", into = "Vec<Point>")]
pub struct Route {
    points: Vec<Point>,
}

impl Route {
    /// Simplify `points` and accept the result if it is a valid route.
    pub fn new(points: Vec<Point>) -> Option<Route> {
        let points = simplify(&points);
        if points.len() < 2 {
            return None;
        }
        let rectilinear = points.windows(2).all(|w| (w[0].x == w[1].x) != (w[0].y == w[1].y));
        if !rectilinear {
            return None;
        }
        Some(Route { points })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn into_inner(self) -> Vec<Point> {
        self.points
    }

    pub fn start(&self) -> Point {
        self.points[0]
    }

    pub fn end(&self) -> Point {
        self.points[self.points.len() - 1]
    }

    pub fn interior_point_count(&self) -> usize {
        self.points.len() - 2
    }

    pub fn segment_count(&self) -> usize {
        self.points.len() - 1
    }

    pub fn orientation_of(&self, segment_index: usize) -> Option<Orientation> {
        let from = self.points.get(segment_index)?;
        let to = self.points.get(segment_index + 1)?;
        Some(if from.y == to.y {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        })
    }

    pub fn segments<'a>(&'a self, owner: &'a str) -> impl Iterator<Item = Segment> + 'a {
        self.points.windows(2).map(move |w| Segment::new(w[0], w[1], owner))
    }

    /// Interior segments a user may drag. The first and last segments stay
    /// pinned to their endpoints.
    pub fn bend_handles(&self) -> Vec<BendHandle> {
        let count = self.segment_count();
        if count < 3 {
            return Vec::new();
        }
        (1..count - 1)
            .filter_map(|index| {
                let orientation = self.orientation_of(index)?;
                let from = self.points[index];
                let to = self.points[index + 1];
                Some(BendHandle {
                    segment_index: index,
                    orientation,
                    coordinate: match orientation {
                        Orientation::Horizontal => from.y,
                        Orientation::Vertical => from.x,
                    },
                    anchor: Point::new((from.x + to.x) / 2, (from.y + to.y) / 2),
                })
            })
            .collect()
    }
}

impl TryFrom<Vec<Point>> for Route {
    type Error = String;

    fn try_from(points: Vec<Point>) -> std::result::Result<Self, Self::Error> {
        Route::new(points).ok_or_else(|| "route must be rectilinear with at least two distinct points".to_string())
    }
}

impl From<Route> for Vec<Point> {
    fn from(route: Route) -> Self {
        route.points
    }
}

/// Drag handle for one interior segment of a route.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct BendHandle {
    pub segment_index: usize,
    pub orientation: Orientation,
    /// The shared coordinate of the segment: y for horizontal, x for vertical.
    pub coordinate: i32,
    pub anchor: Point,
}

/// Axis-aligned piece of a placed route, tagged with the net or bus that owns it.
#[derive(Clone, PartialEq, Eq, Debug, Serialize)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
    pub orientation: Orientation,
    pub owner: String,
}

impl Segment {
    pub fn new(from: Point, to: Point, owner: &str) -> Self {
        let orientation = if from.y == to.y {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        };
        Segment {
            from,
            to,
            orientation,
            owner: owner.to_string(),
        }
    }

    /// The coordinate the segment holds constant.
    pub fn fixed(&self) -> i32 {
        match self.orientation {
            Orientation::Horizontal => self.from.y,
            Orientation::Vertical => self.from.x,
        }
    }

    /// Extent along the running axis as `(min, max)`.
    pub fn span(&self) -> (i32, i32) {
        let (a, b) = match self.orientation {
            Orientation::Horizontal => (self.from.x, self.to.x),
            Orientation::Vertical => (self.from.y, self.to.y),
        };
        (a.min(b), a.max(b))
    }

    /// Positive-length overlap of the running extents of two segments.
    pub fn shared_span(&self, other: &Segment) -> i32 {
        let (a0, a1) = self.span();
        let (b0, b1) = other.span();
        a1.min(b1) - a0.max(b0)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize)]
pub struct RouteQuality {
    pub overlaps: u32,
    pub crossings: u32,
    pub close_parallel: u32,
    pub excess_bends: u32,
    pub score: u32,
    pub blocked: bool,
}
