use std::fs;
use std::path::Path;

use serde_json::json;

use crate::error::{Result, RoutingError};
use crate::geometry::BoundingBox;
use crate::netlist::{Net, Obstacle};

use super::bus::BusGroup;
use super::classify::NetPlan;
use super::crossing::Crossing;
use super::orthogonal::ScoredRoute;

/// JSON record of one routing pass, for offline inspection.
#[derive(Default)]
pub(crate) struct RoutingTrace {
    obstacles: Vec<serde_json::Value>,
    nets: Vec<serde_json::Value>,
    routes: Vec<serde_json::Value>,
}

impl RoutingTrace {
    pub(crate) fn new<'a>(obstacles: impl Iterator<Item = &'a Obstacle>) -> Self {
        let obstacles = obstacles
            .map(|obstacle| {
                let tl = obstacle.top_left();
                let br = obstacle.bottom_right();
                json!({
                    "item": obstacle.item,
                    "top_left": { "x": tl.x, "y": tl.y },
                    "bottom_right": { "x": br.x, "y": br.y },
                })
            })
            .collect();
        RoutingTrace {
            obstacles,
            ..Default::default()
        }
    }

    pub(crate) fn record_plan(&mut self, net: &Net, plan: &NetPlan) {
        let pins: Vec<serde_json::Value> = match plan {
            NetPlan::PowerSymbols(wires) => wires.iter().map(|(_, pin)| json!(pin)).collect(),
            NetPlan::Direct(pins) => pins.iter().map(|pin| json!(pin)).collect(),
            NetPlan::Multi(pins) | NetPlan::Stub(pins, _) => pins.iter().map(|pin| json!(pin)).collect(),
        };
        let mut entry = json!({
            "id": net.id,
            "name": net.name,
            "kind": net.kind,
            "plan": plan.name(),
            "pins": pins,
        });
        if let NetPlan::Stub(_, reason) = plan {
            entry["stub_reason"] = json!(reason);
        }
        self.nets.push(entry);
    }

    pub(crate) fn record_route(&mut self, route_id: &str, scored: &ScoredRoute, demoted: bool) {
        self.routes.push(json!({
            "id": route_id,
            "points": scored.route.points(),
            "chosen": scored.candidate_index,
            "candidates": scored.candidates,
            "demoted": demoted,
        }));
    }

    pub(crate) fn into_json(self, buses: &[BusGroup], crossings: &[Crossing]) -> serde_json::Value {
        json!({
            "layout": { "obstacles": self.obstacles },
            "nets": self.nets,
            "routes": self.routes,
            "buses": buses,
            "crossings": crossings,
        })
    }
}

pub(crate) fn write_trace(path: &Path, trace: &serde_json::Value) -> Result<()> {
    let serialized = serde_json::to_string_pretty(trace)?;
    fs::write(path, serialized).map_err(|source| RoutingError::Io {
        path: path.to_path_buf(),
        source,
    })
}
