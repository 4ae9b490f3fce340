//! User-edited routes and the drag interaction that produces them.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::geometry::{Orientation, Point};

use super::types::{Route, RoutingConfig};

/// Persisted route overrides keyed by `"{diagram_context}:{route_id}"`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteOverrideStore {
    routes: IndexMap<String, Route>,
}

impl RouteOverrideStore {
    pub fn key(diagram_context: &str, route_id: &str) -> String {
        format!("{diagram_context}:{route_id}")
    }

    pub fn get(&self, diagram_context: &str, route_id: &str) -> Option<&Route> {
        self.routes.get(&Self::key(diagram_context, route_id))
    }

    pub fn set(&mut self, diagram_context: &str, route_id: &str, route: Route) {
        self.routes.insert(Self::key(diagram_context, route_id), route);
    }

    pub fn remove(&mut self, diagram_context: &str, route_id: &str) -> Option<Route> {
        self.routes.shift_remove(&Self::key(diagram_context, route_id))
    }

    pub fn clear(&mut self) {
        self.routes.clear();
    }

    /// Forget every override inside one diagram context.
    pub fn clear_context(&mut self, diagram_context: &str) {
        let prefix = format!("{diagram_context}:");
        self.routes.retain(|key, _| !key.starts_with(&prefix));
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Route)> {
        self.routes.iter().map(|(key, route)| (key.as_str(), route))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Re-anchor a stored override onto the current endpoints. The updated
    /// route replaces the stored one; an override that no longer fits is dropped.
    pub fn resolve(&mut self, diagram_context: &str, route_id: &str, start: Point, end: Point) -> Option<Route> {
        let key = Self::key(diagram_context, route_id);
        let stored = self.routes.get(&key)?;
        match reanchor(stored, start, end) {
            Some(route) => {
                self.routes.insert(key, route.clone());
                Some(route)
            }
            None => {
                warn!(key = %key, "discarding route override that no longer fits its endpoints");
                self.routes.shift_remove(&key);
                None
            }
        }
    }
}

/// Round to the nearest multiple of `spacing`, halves away from zero.
pub fn snap(value: i32, spacing: i32) -> i32 {
    if spacing <= 0 {
        return value;
    }
    ((value as f64 / spacing as f64).round() as i32) * spacing
}

/// Move an interior segment so it passes through `pointer`, snapped to the grid.
/// The first and last segments cannot be dragged.
pub fn drag_segment(route: &Route, segment_index: usize, pointer: Point, spacing: i32) -> Option<Route> {
    if segment_index == 0 || segment_index + 1 >= route.segment_count() {
        return None;
    }
    let orientation = route.orientation_of(segment_index)?;
    let mut points = route.points().to_vec();
    match orientation {
        Orientation::Horizontal => {
            let y = snap(pointer.y, spacing);
            points[segment_index].y = y;
            points[segment_index + 1].y = y;
        }
        Orientation::Vertical => {
            let x = snap(pointer.x, spacing);
            points[segment_index].x = x;
            points[segment_index + 1].x = x;
        }
    }
    Route::new(points)
}

/// Move a route's endpoints, dragging the neighbouring bends along so the first
/// and last segments keep their orientation. A straight route gains one corner.
pub fn reanchor(route: &Route, start: Point, end: Point) -> Option<Route> {
    let mut points = route.points().to_vec();
    let last = points.len() - 1;
    let first_orientation = route.orientation_of(0)?;
    let last_orientation = route.orientation_of(last - 1)?;

    if last == 1 {
        let corner = match first_orientation {
            Orientation::Horizontal => Point::new(end.x, start.y),
            Orientation::Vertical => Point::new(start.x, end.y),
        };
        return Route::new(vec![start, corner, end]);
    }

    points[0] = start;
    match first_orientation {
        Orientation::Horizontal => points[1].y = start.y,
        Orientation::Vertical => points[1].x = start.x,
    }
    points[last] = end;
    match last_orientation {
        Orientation::Horizontal => points[last - 1].y = end.y,
        Orientation::Vertical => points[last - 1].x = end.x,
    }
    Route::new(points)
}

#[derive(Clone, Debug, PartialEq)]
pub enum DragOutcome {
    /// The pointer never left the click threshold; treat it as a selection.
    Click,
    Committed(Route),
}

/// An in-progress drag of one bend. Lives only for the gesture and is written
/// to the store on [`LiveDrag::finish`].
#[derive(Clone, Debug)]
pub struct LiveDrag {
    diagram_context: String,
    route_id: String,
    segment_index: usize,
    origin: Point,
    original: Route,
    current: Route,
    spacing: i32,
    threshold: i32,
    /// Set once the pointer has travelled past the click threshold.
    exceeded: bool,
}

impl LiveDrag {
    pub fn begin(
        diagram_context: &str,
        route_id: &str,
        route: Route,
        segment_index: usize,
        pointer: Point,
        config: &RoutingConfig,
    ) -> Option<Self> {
        if segment_index == 0 || segment_index + 1 >= route.segment_count() {
            return None;
        }
        Some(LiveDrag {
            diagram_context: diagram_context.to_string(),
            route_id: route_id.to_string(),
            segment_index,
            origin: pointer,
            current: route.clone(),
            original: route,
            spacing: config.spacing,
            threshold: config.drag_threshold,
            exceeded: false,
        })
    }

    /// Recompute the dragged route for a new pointer position.
    pub fn update(&mut self, pointer: Point) -> &Route {
        if self.origin.manhattan_distance(&pointer) >= self.threshold {
            self.exceeded = true;
        }
        if let Some(route) = drag_segment(&self.original, self.segment_index, pointer, self.spacing) {
            self.current = route;
        }
        &self.current
    }

    pub fn route(&self) -> &Route {
        &self.current
    }

    pub fn finish(mut self, pointer: Point, store: &mut RouteOverrideStore) -> DragOutcome {
        self.update(pointer);
        if !self.exceeded {
            return DragOutcome::Click;
        }
        debug!(route_id = %self.route_id, "committing dragged route");
        store.set(&self.diagram_context, &self.route_id, self.current.clone());
        DragOutcome::Committed(self.current)
    }
}
