use std::cmp::Reverse;

use indexmap::IndexSet;
use petgraph::algo::connected_components;
use petgraph::graph::{NodeIndex, UnGraph};
use priority_queue::PriorityQueue;
use serde::Serialize;
use tracing::warn;

use crate::geometry::Orientation;
use crate::netlist::{ItemKind, Pin};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Topology {
    SpanningTree,
    /// Every pin wired to the nearer terminal of a single pass-through part.
    Bridge,
}

/// Wires to draw for one multi-pin net. Nodes are pin indices.
#[derive(Clone, Debug)]
pub struct EdgeSet {
    pub topology: Topology,
    graph: UnGraph<usize, i32>,
}

impl EdgeSet {
    fn empty(topology: Topology, pin_count: usize) -> Self {
        let mut graph = UnGraph::with_capacity(pin_count, pin_count.saturating_sub(1));
        for index in 0..pin_count {
            graph.add_node(index);
        }
        EdgeSet { topology, graph }
    }

    fn connect(&mut self, from: usize, to: usize, distance: i32) {
        self.graph.add_edge(NodeIndex::new(from), NodeIndex::new(to), distance);
    }

    /// Edges as `(from, to)` pin indices, in the order they were chosen.
    pub fn edges(&self) -> Vec<(usize, usize)> {
        self.graph
            .edge_indices()
            .filter_map(|edge| self.graph.edge_endpoints(edge))
            .map(|(a, b)| (self.graph[a], self.graph[b]))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.edge_count() == 0
    }

    pub fn is_connected(&self) -> bool {
        connected_components(&self.graph) <= 1
    }
}

fn distance(pins: &[Pin], a: usize, b: usize) -> i32 {
    pins[a].position.manhattan_distance(&pins[b].position)
}

/// Bridge wiring if the net has exactly one two-terminal pass-through item and
/// at least two other pins to hang off it.
pub fn build_edges(pins: &[Pin]) -> EdgeSet {
    if let Some(edges) = bridge_edges(pins) {
        if edges.len() >= 2 {
            return edges;
        }
    }
    let tree = spanning_tree(pins);
    if !tree.is_connected() {
        warn!(pins = pins.len(), edges = tree.len(), "spanning tree left pins unattached");
    }
    tree
}

/// Greedy nearest-pin tree grown from the first pin. Ties go to the lower pin
/// index, and a pin keeps the earliest tree pin it was found to be closest to.
pub fn spanning_tree(pins: &[Pin]) -> EdgeSet {
    let mut edges = EdgeSet::empty(Topology::SpanningTree, pins.len());
    if pins.len() < 2 {
        return edges;
    }

    let mut parent = vec![0usize; pins.len()];
    let mut best = vec![i32::MAX; pins.len()];
    let mut queue: PriorityQueue<usize, Reverse<(i32, usize)>> = PriorityQueue::new();
    for index in 1..pins.len() {
        best[index] = distance(pins, 0, index);
        queue.push(index, Reverse((best[index], index)));
    }

    while let Some((next, Reverse((dist, _)))) = queue.pop() {
        edges.connect(parent[next], next, dist);
        for other in 1..pins.len() {
            if queue.get(&other).is_none() {
                continue;
            }
            let candidate = distance(pins, next, other);
            if candidate < best[other] {
                best[other] = candidate;
                parent[other] = next;
                queue.change_priority(&other, Reverse((candidate, other)));
            }
        }
    }
    edges
}

fn bridge_edges(pins: &[Pin]) -> Option<EdgeSet> {
    if pins.len() < 3 {
        return None;
    }
    let bridge_items: IndexSet<&str> = pins
        .iter()
        .filter(|pin| pin.item_kind == ItemKind::Bridge)
        .map(|pin| pin.item.as_str())
        .collect();
    if bridge_items.len() != 1 {
        return None;
    }
    let terminals: Vec<usize> = (0..pins.len())
        .filter(|&index| pins[index].item_kind == ItemKind::Bridge)
        .collect();
    let &[t0, t1] = terminals.as_slice() else {
        return None;
    };

    let (p0, p1) = (pins[t0].position, pins[t1].position);
    let axis = if (p0.x - p1.x).abs() >= (p0.y - p1.y).abs() {
        Orientation::Horizontal
    } else {
        Orientation::Vertical
    };
    // Doubled offsets from the bridge midpoint avoid halving odd coordinates.
    let mid2 = p0.along(axis) + p1.along(axis);
    let t0_side = (2 * p0.along(axis) - mid2).signum();

    let mut edges = EdgeSet::empty(Topology::Bridge, pins.len());
    for index in 0..pins.len() {
        if index == t0 || index == t1 {
            continue;
        }
        let d0 = distance(pins, index, t0);
        let d1 = distance(pins, index, t1);
        let terminal = if d0 != d1 {
            if d0 < d1 {
                t0
            } else {
                t1
            }
        } else {
            let side = (2 * pins[index].position.along(axis) - mid2).signum();
            if side == 0 || side == t0_side {
                t0
            } else {
                t1
            }
        };
        edges.connect(terminal, index, d0.min(d1));
    }
    Some(edges)
}
