use rstar::{RTree, AABB};

use crate::geometry::Point;
use crate::netlist::Obstacle;

use super::overrides::RouteOverrideStore;
use super::types::{Route, RoutingConfig, Segment};

/// Everything a routing call may look at: configuration, item bodies, the
/// segments committed so far in this pass and the user's route overrides.
pub struct RoutingContext<'a> {
    pub config: &'a RoutingConfig,
    pub diagram_context: &'a str,
    pub overrides: &'a mut RouteOverrideStore,
    obstacle_tree: RTree<Obstacle>,
    placed: Vec<Segment>,
}

impl<'a> RoutingContext<'a> {
    pub fn new(
        config: &'a RoutingConfig,
        obstacles: Vec<Obstacle>,
        overrides: &'a mut RouteOverrideStore,
        diagram_context: &'a str,
    ) -> Self {
        RoutingContext {
            config,
            diagram_context,
            overrides,
            obstacle_tree: RTree::bulk_load(obstacles),
            placed: Vec::new(),
        }
    }

    pub fn placed_segments(&self) -> &[Segment] {
        &self.placed
    }

    /// Commit a route so later candidates are scored against it.
    pub fn place(&mut self, route: &Route, owner: &str) {
        self.placed.extend(route.segments(owner));
    }

    pub fn obstacles(&self) -> impl Iterator<Item = &Obstacle> {
        self.obstacle_tree.iter()
    }

    /// True if the segment cuts through an obstacle other than the given endpoint items.
    pub fn segment_blocked(&self, from: Point, to: Point, endpoint_items: &[&str]) -> bool {
        let envelope = AABB::from_corners(from, to);
        self.obstacle_tree
            .locate_in_envelope_intersecting(&envelope)
            .filter(|obstacle| !endpoint_items.contains(&obstacle.item.as_str()))
            .any(|obstacle| obstacle.rect.intersects_segment_interior(from, to))
    }
}
