use eframe::egui::{Vec2, pos2, vec2};
use hierflow::diagram::{FlowDiagram, NodeId, build_diagram};
use hierflow::error::BuildError;
use hierflow::layout::{
    ApproximateMeasurer, Body, LayoutConfig, LayoutContext, LayoutSession, SessionSlot,
    Simulation, TextAnchor, TextMeasurer, Viewport, place_labels,
};
use hierflow::settings::Settings;
use hierflow::table::{CategoryColumn, CategoryValue, DataTable, MeasureCell, MeasureColumn, MeasureRole};

fn table(names: &[&str], values: &[f64]) -> DataTable {
    DataTable::new(
        vec![CategoryColumn {
            name: "group".to_owned(),
            values: names.iter().copied().map(CategoryValue::from).collect(),
        }],
        vec![MeasureColumn {
            name: "value".to_owned(),
            role: MeasureRole::FlowStage,
            values: values.iter().copied().map(MeasureCell::from).collect(),
        }],
    )
}

fn diagram() -> FlowDiagram {
    build_diagram(&table(&["A", "B", "C"], &[10.0, 20.0, 30.0]), &Settings::default()).unwrap()
}

fn body(x: f32, y: f32) -> Body {
    Body {
        position: vec2(x, y),
        velocity: Vec2::ZERO,
        pin: None,
    }
}

fn near(a: Vec2, b: Vec2) -> bool {
    (a - b).length() < 1e-3
}

#[test]
fn simulation_settles_with_finite_positions() {
    let diagram = diagram();
    let mut simulation = Simulation::new(&diagram, &LayoutConfig::default());
    assert_eq!(simulation.bodies().len(), diagram.nodes.len());
    assert!(simulation.is_active());

    let mut ticks = 0;
    while simulation.tick() {
        ticks += 1;
        assert!(ticks < 400, "simulation never cooled");
    }
    assert!(!simulation.is_active());
    assert!(ticks > 200);
    assert!(
        simulation
            .positions()
            .all(|position| position.x.is_finite() && position.y.is_finite())
    );

    let root = simulation.position(NodeId::ROOT).unwrap();
    for id in 1..diagram.nodes.len() {
        let distance = (simulation.position(NodeId(id)).unwrap() - root).length();
        assert!(distance > 5.0, "child {id} collapsed onto the root");
    }
}

#[test]
fn pinned_body_stays_put() {
    let diagram = diagram();
    let mut simulation = Simulation::new(&diagram, &LayoutConfig::default());
    let target = vec2(80.0, -40.0);

    assert!(simulation.pin(NodeId(2), target));
    for _ in 0..50 {
        simulation.step();
    }
    assert_eq!(simulation.position(NodeId(2)), Some(target));

    assert!(simulation.unpin(NodeId(2)));
    assert!(simulation.bodies()[2].pin.is_none());
    assert!(!simulation.pin(NodeId(99), target));
}

#[test]
fn reheat_wakes_a_settled_simulation() {
    let diagram = diagram();
    let mut simulation = Simulation::new(&diagram, &LayoutConfig::default());
    while simulation.tick() {}

    assert!(!simulation.tick());
    simulation.reheat(0.3);
    assert!(simulation.is_active());
    for _ in 0..100 {
        assert!(simulation.tick());
    }
    assert!(simulation.alpha() > 0.1);

    simulation.cool();
    let mut ticks = 0;
    while simulation.tick() {
        ticks += 1;
        assert!(ticks < 400);
    }
}

#[test]
fn session_drag_pins_and_releases() {
    let mut session =
        LayoutSession::new(1, diagram(), Settings::default(), Viewport::default()).unwrap();

    assert!(session.begin_drag(NodeId(1)));
    assert!(!session.begin_drag(NodeId(2)));
    assert_eq!(session.dragging(), Some(NodeId(1)));
    assert!(session.simulation().alpha_target() > 0.0);

    assert!(session.drag_to(NodeId(1), vec2(120.0, 30.0)));
    assert!(!session.drag_to(NodeId(2), vec2(0.0, 0.0)));
    session.tick(&ApproximateMeasurer);
    assert_eq!(session.simulation().position(NodeId(1)), Some(vec2(120.0, 30.0)));

    assert!(!session.end_drag(NodeId(2)));
    assert!(session.end_drag(NodeId(1)));
    assert_eq!(session.dragging(), None);
    assert_eq!(session.simulation().alpha_target(), 0.0);
    assert!(session.simulation().bodies()[1].pin.is_none());
}

#[test]
fn session_finds_nodes_under_a_point() {
    let session =
        LayoutSession::new(1, diagram(), Settings::default(), Viewport::default()).unwrap();
    let position = session.simulation().position(NodeId(2)).unwrap();

    assert_eq!(session.node_at(position), Some(NodeId(2)));
    assert_eq!(session.node_at(vec2(1e4, 1e4)), None);
}

#[test]
fn radius_rules() {
    let table = table(&["A", "B"], &[-5.0, 20.0]);
    let settings = Settings::default();
    let diagram = build_diagram(&table, &settings).unwrap();
    let session = LayoutSession::new(1, diagram, settings.clone(), Viewport::default()).unwrap();

    assert_eq!(session.node_radius(NodeId::ROOT), settings.layout.max_radius);
    assert_eq!(session.node_radius(NodeId(1)), 0.0);
    assert_eq!(session.node_radius(NodeId(2)), settings.layout.max_radius);
    assert_eq!(session.node_radius(NodeId(42)), 0.0);

    let link = session.diagram().links[2];
    assert_eq!(session.link_width(&link), settings.layout.max_link_width);
}

#[test]
fn invalid_layout_settings_fail_the_session() {
    let mut settings = Settings::default();
    settings.layout.min_radius = 50.0;

    let result = LayoutSession::new(1, diagram(), settings, Viewport::default());
    assert!(matches!(result, Err(BuildError::Failure(_))));
}

#[test]
fn slot_ignores_stale_handles() {
    let table = table(&["A", "B", "C"], &[1.0, 2.0, 3.0]);
    let settings = Settings::default();
    let mut slot = SessionSlot::new();

    let first = slot.rebuild(&table, &settings).unwrap();
    assert!(slot.tick(first, &ApproximateMeasurer).is_some());

    let second = slot.rebuild(&table, &settings).unwrap();
    assert_ne!(first, second);
    assert_eq!(slot.generation(), 2);
    assert!(slot.tick(first, &ApproximateMeasurer).is_none());
    assert!(slot.get(first).is_none());
    assert!(slot.tick(second, &ApproximateMeasurer).is_some());
}

#[test]
fn failed_rebuild_leaves_slot_empty() {
    let settings = Settings::default();
    let mut slot = SessionSlot::new();
    let handle = slot.rebuild(&table(&["A"], &[1.0]), &settings).unwrap();

    let broken = DataTable::new(Vec::new(), Vec::new());
    let error = slot.rebuild(&broken, &settings).unwrap_err();
    assert!(error.is_precondition());
    assert!(slot.is_empty());
    assert!(slot.get(handle).is_none());
}

#[test]
fn viewport_survives_rebuilds() {
    let table = table(&["A", "B"], &[1.0, 2.0]);
    let settings = Settings::default();
    let mut slot = SessionSlot::new();

    let first = slot.rebuild(&table, &settings).unwrap();
    let viewport = slot.get_mut(first).unwrap().viewport_mut();
    viewport.zoom = 2.0;
    viewport.pan = vec2(15.0, -5.0);

    let second = slot.rebuild(&table, &settings).unwrap();
    let viewport = slot.get(second).unwrap().viewport();
    assert_eq!(viewport.zoom, 2.0);
    assert_eq!(viewport.pan, vec2(15.0, -5.0));
}

#[test]
fn viewport_zoom_keeps_pointer_fixed() {
    let mut viewport = Viewport::default();
    let center = pos2(400.0, 300.0);
    let pointer = pos2(520.0, 260.0);
    let world = viewport.screen_to_world(center, pointer);

    viewport.zoom_at(center, pointer, 1.15);
    assert!((viewport.zoom - 1.15).abs() < 1e-6);
    let after = viewport.world_to_screen(center, world);
    assert!((after - pointer).length() < 1e-3);

    for _ in 0..100 {
        viewport.zoom_at(center, pointer, 0.5);
    }
    assert!(viewport.zoom >= 0.05);
}

#[test]
fn labels_follow_side_of_root() {
    let diagram = diagram();
    let settings = Settings::default();
    let config = LayoutConfig::default();
    let mut context = LayoutContext::new(&diagram, &config, Viewport::default());
    let bodies = [
        body(0.0, 0.0),
        body(10.0, -100.0),
        body(-200.0, 0.0),
        body(200.0, 5.0),
    ];

    let labels = place_labels(&diagram, &bodies, &mut context, &settings, &ApproximateMeasurer);
    assert_eq!(labels.len(), 4);
    assert_eq!(context.root_last, Some(Vec2::ZERO));

    let font = settings.labels.font_size;
    let radius = |id: usize| context.radius_scale.size(diagram.nodes[id].aggregate_value);

    let root = &labels[0];
    assert_eq!(root.node, NodeId::ROOT);
    assert_eq!(root.anchor, TextAnchor::Start);
    assert!(near(root.position, vec2(config.max_radius * 1.25, 0.0)));
    assert_eq!(root.text, "Total: 60");

    let above = &labels[1];
    assert_eq!(above.anchor, TextAnchor::Middle);
    assert_eq!(above.text, "A: 10");
    let height = ApproximateMeasurer.measure(&above.text, font).y;
    assert!(near(above.position, vec2(10.0, -100.0 - (radius(1) + height))));

    let left = &labels[2];
    assert_eq!(left.anchor, TextAnchor::End);
    let gap = radius(2) + context.width_scale.size(20.0) + 4.0;
    assert!(near(left.position, vec2(-200.0 - gap, 0.0)));

    let right = &labels[3];
    assert_eq!(right.anchor, TextAnchor::Middle);
    let width = ApproximateMeasurer.measure(&right.text, font).x;
    assert!(near(right.position, vec2(200.0 + radius(3) + 6.0 + width * 0.5, 5.0)));
}

#[test]
fn labels_below_root_drop_down() {
    let diagram = diagram();
    let settings = Settings::default();
    let mut context = LayoutContext::new(&diagram, &LayoutConfig::default(), Viewport::default());
    let bodies = [
        body(50.0, 50.0),
        body(60.0, 150.0),
        body(-200.0, 0.0),
        body(200.0, 5.0),
    ];

    let labels = place_labels(&diagram, &bodies, &mut context, &settings, &ApproximateMeasurer);
    let below = &labels[1];
    assert_eq!(below.anchor, TextAnchor::Middle);
    assert!(below.position.y > 150.0);
    assert_eq!(below.position.x, 60.0);
}

#[test]
fn hidden_labels_place_nothing() {
    let diagram = diagram();
    let mut settings = Settings::default();
    settings.labels.show = false;
    let mut context = LayoutContext::new(&diagram, &LayoutConfig::default(), Viewport::default());
    let bodies = [body(0.0, 0.0); 4];

    assert!(place_labels(&diagram, &bodies, &mut context, &settings, &ApproximateMeasurer).is_empty());
}
