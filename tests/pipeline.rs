//! End-to-end routing passes over small diagrams.

use pretty_assertions::assert_eq;
use wirelay_core::routing::{NetRouting, RoutedPath, StubReason};
use wirelay_core::{
    Direction, ItemKind, ItemPlacement, ItemTransform, LocalPin, Net, NetKind, PinRef, Point, Rectangle,
    RouteOverrideStore, RoutingConfig, RoutingOutput, SchematicRouter,
};

const CONTEXT: &str = "root";

/// A 20x20 box centred on `at` with pins on its left and right edges.
fn block(item: &str, kind: ItemKind, at: (i32, i32), left: &[&str], right: &[&str]) -> ItemPlacement {
    let mut placement = ItemPlacement::new(
        item,
        kind,
        ItemTransform::at(Point::new(at.0, at.1)),
        Rectangle::from_corners(Point::new(-10, -10), Point::new(10, 10)),
    );
    for (i, terminal) in left.iter().enumerate() {
        placement = placement.with_pin(LocalPin::new(*terminal, Point::new(-10, -8 + 4 * i as i32), Direction::Left));
    }
    for (i, terminal) in right.iter().enumerate() {
        placement = placement.with_pin(LocalPin::new(*terminal, Point::new(10, -8 + 4 * i as i32), Direction::Right));
    }
    placement
}

fn net(id: &str, kind: NetKind, pins: &[(&str, &str)]) -> Net {
    Net::new(
        id,
        id,
        kind,
        pins.iter().map(|&(item, terminal)| PinRef::new(item, terminal)).collect(),
    )
}

fn routed(output: &RoutingOutput, net_id: &str) -> Vec<RoutedPath> {
    match output.nets.get(net_id) {
        Some(NetRouting::Routed(paths)) => paths.clone(),
        other => panic!("{net_id} was not routed: {other:?}"),
    }
}

fn i2c_pair() -> SchematicRouter {
    let mut router = SchematicRouter::new(RoutingConfig::default());
    router.add_item(block("MCU", ItemKind::Module, (0, 0), &[], &["SDA", "SCL", "INT"]));
    router.add_item(block("SENSOR", ItemKind::Module, (120, 0), &["SDA", "SCL", "INT"], &[]));
    router
}

#[test]
fn three_nets_between_the_same_sides_share_a_bus() {
    let mut router = i2c_pair();
    for name in ["SDA", "SCL", "INT"] {
        router.add_net(net(name, NetKind::Bus, &[("MCU", name), ("SENSOR", name)]));
    }
    let output = router.route(&mut RouteOverrideStore::default(), CONTEXT);

    assert_eq!(output.buses.len(), 1);
    let bus = &output.buses[0];
    assert_eq!(bus.members, vec!["SDA", "SCL", "INT"]);
    assert_eq!(bus.protocol, "I2C");
    for name in ["SDA", "SCL", "INT"] {
        assert_eq!(
            output.nets.get(name),
            Some(&NetRouting::Bus {
                bus_id: bus.id.clone()
            })
        );
    }
    assert_eq!(bus.trunk.start(), bus.endpoints[0].merge_point);
    assert_eq!(bus.trunk.end(), bus.endpoints[1].merge_point);
}

#[test]
fn a_single_net_is_routed_on_its_own() {
    let mut router = i2c_pair();
    router.add_net(net("SDA", NetKind::Bus, &[("MCU", "SDA"), ("SENSOR", "SDA")]));
    let output = router.route(&mut RouteOverrideStore::default(), CONTEXT);

    assert!(output.buses.is_empty());
    let paths = routed(&output, "SDA");
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].route.points(), &[Point::new(10, -8), Point::new(110, -8)]);
}

#[test]
fn nets_missing_pins_are_reported_not_routed() {
    let mut router = i2c_pair();
    router.add_net(net("GHOST", NetKind::Signal, &[("MCU", "SDA"), ("NOWHERE", "1")]));
    let output = router.route(&mut RouteOverrideStore::default(), CONTEXT);
    assert!(output.nets.is_empty());
    assert_eq!(output.unresolved, vec!["GHOST"]);
}

#[test]
fn crossing_nets_get_a_jump_marker() {
    let mut router = SchematicRouter::new(RoutingConfig::default());
    router.add_item(block("A", ItemKind::Component, (-10, 50), &[], &["1"]));
    router.add_item(block("B", ItemKind::Component, (210, 50), &["1"], &[]));
    let top = ItemPlacement::new(
        "C",
        ItemKind::Component,
        ItemTransform::at(Point::new(100, -20)),
        Rectangle::from_corners(Point::new(-10, -10), Point::new(10, 10)),
    )
    .with_pin(LocalPin::new("1", Point::new(0, 10), Direction::Down));
    let bottom = ItemPlacement::new(
        "D",
        ItemKind::Component,
        ItemTransform::at(Point::new(100, 170)),
        Rectangle::from_corners(Point::new(-10, -10), Point::new(10, 10)),
    )
    .with_pin(LocalPin::new("1", Point::new(0, -10), Direction::Up));
    router.add_item(top);
    router.add_item(bottom);
    router.add_net(net("H", NetKind::Signal, &[("A", "1"), ("B", "1")]));
    router.add_net(net("V", NetKind::Signal, &[("C", "1"), ("D", "1")]));

    let output = router.route(&mut RouteOverrideStore::default(), CONTEXT);
    assert_eq!(routed(&output, "H")[0].route.points(), &[Point::new(0, 42), Point::new(200, 42)]);
    assert_eq!(output.crossings.len(), 1);
    let crossing = &output.crossings[0];
    assert_eq!((crossing.x, crossing.y), (100, 42));
    assert_eq!(crossing.horizontal_net_id, "H");
    assert_eq!(crossing.vertical_net_id, "V");
}

#[test]
fn wide_multi_pin_net_becomes_labelled_stubs() {
    let mut router = SchematicRouter::new(RoutingConfig::default());
    router.add_item(block("U1", ItemKind::Component, (0, 0), &[], &["RST"]));
    router.add_item(block("U2", ItemKind::Component, (400, 0), &["RST"], &[]));
    router.add_item(block("U3", ItemKind::Component, (200, 300), &["RST"], &[]));
    router.add_net(net("RST", NetKind::Signal, &[("U1", "RST"), ("U2", "RST"), ("U3", "RST")]));

    let output = router.route(&mut RouteOverrideStore::default(), CONTEXT);
    match output.nets.get("RST") {
        Some(NetRouting::Stub { reason, markers }) => {
            assert_eq!(*reason, StubReason::SpanTooWide);
            assert_eq!(markers.len(), 3);
            assert_eq!(markers[0].position, Point::new(10, -8));
            assert_eq!(markers[0].lead_end, Point::new(14, -8));
            assert!(markers.iter().all(|marker| marker.label == "RST"));
        }
        other => panic!("expected stub, got {other:?}"),
    }
}

#[test]
fn compact_multi_pin_net_is_wired_as_a_tree() {
    let mut router = SchematicRouter::new(RoutingConfig::default());
    router.add_item(block("U1", ItemKind::Component, (0, 0), &[], &["EN"]));
    router.add_item(block("U2", ItemKind::Component, (60, 0), &["EN"], &[]));
    router.add_item(block("U3", ItemKind::Component, (60, 40), &["EN"], &[]));
    router.add_net(net("EN", NetKind::Electrical, &[("U1", "EN"), ("U2", "EN"), ("U3", "EN")]));

    let output = router.route(&mut RouteOverrideStore::default(), CONTEXT);
    let paths = routed(&output, "EN");
    let ids: Vec<&str> = paths.iter().map(|path| path.id.as_str()).collect();
    assert_eq!(ids, vec!["EN#0", "EN#1"]);
    assert_eq!(paths[0].route.start(), Point::new(10, -8));
    assert_eq!(paths[0].route.end(), Point::new(50, -8));
}

#[test]
fn power_nets_draw_one_wire_per_symbol() {
    let mut router = SchematicRouter::new(RoutingConfig::default());
    router.add_item(block("U1", ItemKind::Component, (0, 0), &[], &["VCC"]));
    router.add_item(block("U2", ItemKind::Component, (200, 0), &["VCC"], &[]));
    router.add_power_symbol(
        PinRef::new("U1", "VCC"),
        wirelay_core::Pin::new("#PWR1", "1", Point::new(30, -30), Direction::Down),
    );
    router.add_power_symbol(
        PinRef::new("U2", "VCC"),
        wirelay_core::Pin::new("#PWR2", "1", Point::new(170, -30), Direction::Down),
    );
    router.add_net(net("VCC", NetKind::Power, &[("U1", "VCC"), ("U2", "VCC")]));

    let output = router.route(&mut RouteOverrideStore::default(), CONTEXT);
    let paths = routed(&output, "VCC");
    assert_eq!(paths.len(), 2);
    assert_eq!(paths[0].id, "VCC@U1.VCC");
    assert_eq!(paths[0].route.start(), Point::new(30, -30));
    assert_eq!(paths[0].route.end(), Point::new(10, -8));
    assert_eq!(paths[1].route.end(), Point::new(190, -8));
}

#[test]
fn override_follows_a_moved_item() {
    let mut router = SchematicRouter::new(RoutingConfig::default());
    router.add_item(block("U1", ItemKind::Component, (0, 0), &[], &["OUT"]));
    router.add_item(block("U2", ItemKind::Component, (100, 40), &["IN"], &[]));
    router.add_net(net("N1", NetKind::Electrical, &[("U1", "OUT"), ("U2", "IN")]));

    let mut overrides = RouteOverrideStore::default();
    let edited = wirelay_core::Route::new(vec![
        Point::new(10, -8),
        Point::new(40, -8),
        Point::new(40, 32),
        Point::new(90, 32),
    ])
    .unwrap();
    overrides.set(CONTEXT, "N1", edited.clone());
    let output = router.route(&mut overrides, CONTEXT);
    let paths = routed(&output, "N1");
    assert!(paths[0].overridden);
    assert_eq!(paths[0].route, edited);

    // Moving U1 down by 6 drags the first bend along, keeping the wire horizontal-first.
    router.add_item(block("U1", ItemKind::Component, (0, 6), &[], &["OUT"]));
    let output = router.route(&mut overrides, CONTEXT);
    let paths = routed(&output, "N1");
    let moved = &paths[0].route;
    assert_eq!(
        moved.points(),
        &[Point::new(10, -2), Point::new(40, -2), Point::new(40, 32), Point::new(90, 32)]
    );
    assert_eq!(overrides.get(CONTEXT, "N1"), Some(moved));
}

#[test]
fn overrides_in_other_contexts_are_ignored() {
    let mut router = SchematicRouter::new(RoutingConfig::default());
    router.add_item(block("U1", ItemKind::Component, (0, 0), &[], &["OUT"]));
    router.add_item(block("U2", ItemKind::Component, (100, 40), &["IN"], &[]));
    router.add_net(net("N1", NetKind::Electrical, &[("U1", "OUT"), ("U2", "IN")]));

    let mut overrides = RouteOverrideStore::default();
    overrides.set(
        "root.child",
        "N1",
        wirelay_core::Route::new(vec![Point::new(10, -8), Point::new(10, 32), Point::new(90, 32)]).unwrap(),
    );
    let output = router.route(&mut overrides, CONTEXT);
    assert!(!routed(&output, "N1")[0].overridden);
}

#[test]
fn route_lookup_finds_paths_and_trunks() {
    let mut router = i2c_pair();
    router.add_net(net("SDA", NetKind::Bus, &[("MCU", "SDA"), ("SENSOR", "SDA")]));
    router.add_net(net("SCL", NetKind::Bus, &[("MCU", "SCL"), ("SENSOR", "SCL")]));
    router.add_item(block("LED", ItemKind::Component, (0, 80), &[], &["A"]));
    router.add_item(block("R1", ItemKind::Component, (80, 80), &["1"], &[]));
    router.add_net(net("LED_A", NetKind::Signal, &[("LED", "A"), ("R1", "1")]));

    let output = router.route(&mut RouteOverrideStore::default(), CONTEXT);
    assert!(output.route("LED_A").is_some());
    assert!(output.route(&output.buses[0].id).is_some());
    assert!(output.route("SDA").is_none());
}

#[test]
fn routing_is_deterministic() {
    let build = || {
        let mut router = i2c_pair();
        for name in ["SDA", "SCL"] {
            router.add_net(net(name, NetKind::Bus, &[("MCU", name), ("SENSOR", name)]));
        }
        router.add_net(net("INT", NetKind::Signal, &[("MCU", "INT"), ("SENSOR", "INT")]));
        router
    };
    let first = build().route(&mut RouteOverrideStore::default(), CONTEXT);
    let second = build().route(&mut RouteOverrideStore::default(), CONTEXT);
    assert_eq!(first, second);
}

#[test]
fn trace_is_written_when_a_path_is_configured() {
    let path = std::env::temp_dir().join(format!("wirelay-trace-{}.json", std::process::id()));
    let config = RoutingConfig::default().with_trace_path(&path);
    let mut router = SchematicRouter::new(config);
    router.add_item(block("MCU", ItemKind::Module, (0, 0), &[], &["SDA", "SCL"]));
    router.add_item(block("SENSOR", ItemKind::Module, (120, 0), &["SDA", "SCL"], &[]));
    router.add_net(net("SDA", NetKind::Bus, &[("MCU", "SDA"), ("SENSOR", "SDA")]));
    router.add_net(net("SCL", NetKind::Bus, &[("MCU", "SCL"), ("SENSOR", "SCL")]));
    router.route(&mut RouteOverrideStore::default(), CONTEXT);

    let written = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    let trace: serde_json::Value = serde_json::from_str(&written).unwrap();
    assert_eq!(trace["layout"]["obstacles"].as_array().unwrap().len(), 2);
    assert_eq!(trace["nets"].as_array().unwrap().len(), 2);
    assert_eq!(trace["buses"][0]["id"], "bus:MCU.right|SENSOR.left");
}

/// A 20x20 box centred on `at` with a single pin on its top or bottom edge.
fn post(item: &str, at: (i32, i32), side: Direction) -> ItemPlacement {
    let offset = match side {
        Direction::Up => Point::new(0, -10),
        _ => Point::new(0, 10),
    };
    ItemPlacement::new(
        item,
        ItemKind::Component,
        ItemTransform::at(Point::new(at.0, at.1)),
        Rectangle::from_corners(Point::new(-10, -10), Point::new(10, 10)),
    )
    .with_pin(LocalPin::new("1", offset, side))
}

#[test]
fn cluttered_long_signal_becomes_a_stub() {
    let mut router = SchematicRouter::new(RoutingConfig::default());
    router.add_item(block("A", ItemKind::Component, (-10, 100), &[], &["1"]));
    router.add_item(block("B", ItemKind::Component, (210, 100), &["1"], &[]));
    for (k, x) in [50, 100, 150].into_iter().enumerate() {
        let (top, bottom) = (format!("T{k}"), format!("D{k}"));
        router.add_item(post(&top, (x, -20), Direction::Down));
        router.add_item(post(&bottom, (x, 220), Direction::Up));
        router.add_net(net(&format!("V{k}"), NetKind::Electrical, &[(&top, "1"), (&bottom, "1")]));
    }
    router.add_net(net("S", NetKind::Signal, &[("A", "1"), ("B", "1")]));
    router.add_net(net("E", NetKind::Electrical, &[("A", "1"), ("B", "1")]));

    let output = router.route(&mut RouteOverrideStore::default(), CONTEXT);
    match output.nets.get("S") {
        Some(NetRouting::Stub { reason, markers }) => {
            assert_eq!(*reason, StubReason::Demoted);
            assert_eq!(markers.len(), 2);
        }
        other => panic!("expected S to be demoted, got {other:?}"),
    }

    // E takes the same straight path; it would overlap S had S been committed.
    let paths = routed(&output, "E");
    assert_eq!(paths[0].route.points(), &[Point::new(0, 92), Point::new(200, 92)]);
    let quality = paths[0].quality.unwrap();
    assert_eq!(quality.overlaps, 0);
    assert_eq!(quality.crossings, 3);

    assert_eq!(output.crossings.len(), 3);
    assert!(output.crossings.iter().all(|crossing| crossing.horizontal_net_id == "E"));
}

#[test]
fn bus_trunk_override_replaces_the_computed_trunk() {
    let mut router = i2c_pair();
    router.add_net(net("SDA", NetKind::Bus, &[("MCU", "SDA"), ("SENSOR", "SDA")]));
    router.add_net(net("SCL", NetKind::Bus, &[("MCU", "SCL"), ("SENSOR", "SCL")]));
    let bus_id = "bus:MCU.right|SENSOR.left";
    let detour = wirelay_core::Route::new(vec![
        Point::new(16, -8),
        Point::new(16, -24),
        Point::new(104, -24),
        Point::new(104, -8),
    ])
    .unwrap();
    let mut overrides = RouteOverrideStore::default();
    overrides.set(CONTEXT, bus_id, detour.clone());

    let output = router.route(&mut overrides, CONTEXT);
    assert_eq!(output.buses[0].id, bus_id);
    assert_eq!(output.buses[0].endpoints[0].merge_point, Point::new(16, -8));
    assert_eq!(output.buses[0].trunk, detour);
    assert_eq!(output.route(bus_id), Some(&detour));
}

#[test]
fn nets_with_coinciding_merge_points_route_individually() {
    let mut router = SchematicRouter::new(RoutingConfig::default());
    router.add_item(block("MCU", ItemKind::Module, (0, 0), &[], &["SDA", "SCL"]));
    router.add_item(block("SENSOR", ItemKind::Module, (32, 0), &["SDA", "SCL"], &[]));
    router.add_net(net("SDA", NetKind::Bus, &[("MCU", "SDA"), ("SENSOR", "SDA")]));
    router.add_net(net("SCL", NetKind::Bus, &[("MCU", "SCL"), ("SENSOR", "SCL")]));

    let output = router.route(&mut RouteOverrideStore::default(), CONTEXT);
    assert!(output.buses.is_empty());
    assert_eq!(routed(&output, "SDA")[0].route.points(), &[Point::new(10, -8), Point::new(22, -8)]);
    assert_eq!(routed(&output, "SCL").len(), 1);
}
