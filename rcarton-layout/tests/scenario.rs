use std::collections::BTreeMap;

use rcarton_layout::{
    auto_fold_sequence, build_panel_tree, plan_fold, AutoFoldSequence, FoldInputs, LayoutOptions, PanelTree,
    SiblingMode, TreeOptions, DEFAULT_OVERLAP,
};
use rcarton_model::{DrivenMap, EdgeKind, Panel};

use rstest::rstest;
use rstest_reuse::{self, *};

static INIT: std::sync::Once = std::sync::Once::new();
fn initialize_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt::init();
    });
}

fn abc() -> Vec<Panel> {
    vec![
        Panel::new("A", 0.0, 0.0, 100.0, 50.0),
        Panel::new("B", 100.0, 0.0, 100.0, 50.0),
        Panel::new("C", 0.0, 50.0, 100.0, 50.0),
    ]
}

/// Cube net, base first.
fn cube() -> Vec<Panel> {
    vec![
        Panel::new("base", 100.0, 200.0, 100.0, 100.0),
        Panel::new("lid", 100.0, 0.0, 100.0, 100.0),
        Panel::new("front", 100.0, 100.0, 100.0, 100.0),
        Panel::new("back", 100.0, 300.0, 100.0, 100.0),
        Panel::new("left", 0.0, 200.0, 100.0, 100.0),
        Panel::new("right", 200.0, 200.0, 100.0, 100.0),
    ]
}

/// Tray with two glue flaps on the same side of the base.
fn tray() -> Vec<Panel> {
    vec![
        Panel::new("base", 0.0, 0.0, 200.0, 100.0),
        Panel::new("flap-1", 0.0, 100.0, 100.0, 40.0),
        Panel::new("flap-2", 100.0, 100.0, 100.0, 40.0),
        Panel::new("side", 200.0, 0.0, 60.0, 100.0),
    ]
}

fn options(sibling_mode: SiblingMode) -> LayoutOptions {
    LayoutOptions {
        sibling_mode,
        ..Default::default()
    }
}

#[template]
#[rstest]
#[case::abc_chain(abc(), SiblingMode::Chain)]
#[case::abc_parallel(abc(), SiblingMode::Parallel)]
#[case::cube_chain(cube(), SiblingMode::Chain)]
#[case::cube_parallel(cube(), SiblingMode::Parallel)]
#[case::tray_chain(tray(), SiblingMode::Chain)]
#[case::tray_parallel(tray(), SiblingMode::Parallel)]
fn layouts(#[case] panels: Vec<Panel>, #[case] mode: SiblingMode) {}

#[apply(layouts)]
fn every_panel_once(#[case] panels: Vec<Panel>, #[case] mode: SiblingMode) {
    initialize_tracing();

    let plan = auto_fold_sequence(&panels, &options(mode)).unwrap();
    let mut sequence = plan.sequence.clone();
    sequence.sort();
    let mut expected = panels.iter().map(|p| p.id.clone()).collect::<Vec<_>>();
    expected.sort();
    assert_eq!(sequence, expected);
    assert!(plan.unreached.is_empty());
    assert_eq!(plan.driven.validate(&plan.root), Ok(()));
    assert_eq!(plan.fold_edges.len(), panels.len() - 1);
}

#[apply(layouts)]
fn windows_are_staggered(#[case] panels: Vec<Panel>, #[case] mode: SiblingMode) {
    let plan = auto_fold_sequence(&panels, &options(mode)).unwrap();
    let windows = &plan.schedule.windows;
    assert_eq!(windows[0].panel_id, plan.root);
    assert_eq!((windows[0].start, windows[0].end), (0.0, 0.0));

    let folding = &windows[1..];
    let n = folding.len() as f32;
    let segment = 1.0 / (n * (1.0 - DEFAULT_OVERLAP) + DEFAULT_OVERLAP);
    assert!((folding[folding.len() - 1].end - 1.0).abs() < 1e-5);
    for (a, b) in folding.iter().zip(folding.iter().skip(1)) {
        assert!((a.end - b.start - DEFAULT_OVERLAP * segment).abs() < 1e-5);
    }
}

#[apply(layouts)]
fn planning_is_deterministic(#[case] panels: Vec<Panel>, #[case] mode: SiblingMode) {
    let first = auto_fold_sequence(&panels, &options(mode)).unwrap();
    let second = auto_fold_sequence(&panels, &options(mode)).unwrap();
    assert_eq!(first, second);
}

#[apply(layouts)]
fn every_link_gets_a_detected_joint(#[case] panels: Vec<Panel>, #[case] mode: SiblingMode) {
    let plan = auto_fold_sequence(&panels, &options(mode)).unwrap();
    let tree = build_panel_tree(&panels, &plan.driven, &plan.root, &TreeOptions::default()).unwrap();
    assert_eq!(tree.len(), panels.len());
    assert!(tree.joints().all(|(_, _, joint)| !joint.inferred));
}

#[test]
fn abc_plan() {
    initialize_tracing();

    let plan = auto_fold_sequence(&abc(), &LayoutOptions::default()).unwrap();
    assert_eq!(plan.root, "A");
    assert_eq!(plan.driven.children("A"), ["B", "C"]);
    assert_eq!(plan.driven.edge_count(), 2);

    let [vertical, horizontal] = plan.fold_edges.as_slice() else {
        panic!("expected two creases, got {:?}", plan.fold_edges);
    };
    assert_eq!(vertical.kind, EdgeKind::Vertical);
    assert_eq!(vertical.position, 100.0);
    assert_eq!((vertical.span_start, vertical.span_end), (0.0, 50.0));
    assert_eq!(horizontal.kind, EdgeKind::Horizontal);
    assert_eq!(horizontal.position, 50.0);
    assert_eq!((horizontal.span_start, horizontal.span_end), (0.0, 100.0));

    let b = plan.schedule.window("B").unwrap();
    let c = plan.schedule.window("C").unwrap();
    let segment = 1.0 / 1.7;
    assert_eq!(b.start, 0.0);
    assert!((b.end - segment).abs() < 1e-6);
    assert!((c.start - 0.7 * segment).abs() < 1e-6);
    assert!((c.end - 1.0).abs() < 1e-6);
    assert!((b.end - c.start - 0.3 * segment).abs() < 1e-6);
}

/// The flaps touch each other too, which makes them better connected than
/// the base: pin the root.
fn tray_plan(mode: SiblingMode) -> AutoFoldSequence {
    plan_fold(
        &tray(),
        &FoldInputs {
            root: Some("base"),
            ..Default::default()
        },
        &options(mode),
    )
    .unwrap()
}

#[test]
fn tray_root_is_a_flap_when_left_alone() {
    let plan = auto_fold_sequence(&tray(), &LayoutOptions::default()).unwrap();
    assert_eq!(plan.root, "flap-1");
}

#[test]
fn chain_and_parallel_differ_only_in_links() {
    let chain = tray_plan(SiblingMode::Chain);
    let parallel = tray_plan(SiblingMode::Parallel);

    assert_eq!(chain.driven.children("base"), ["flap-1", "side"]);
    assert_eq!(chain.driven.children("flap-1"), ["flap-2"]);
    assert_eq!(parallel.driven.children("base"), ["flap-1", "flap-2", "side"]);
    assert_eq!(chain.sequence.len(), parallel.sequence.len());

    // flap-2 hinges on flap-1 in a chain, on the base otherwise
    let chained = build_panel_tree(&tray(), &chain.driven, "base", &TreeOptions::default()).unwrap();
    let flap = chained.get(chained.find("flap-2").unwrap()).unwrap();
    assert_eq!(flap.joint.as_ref().map(|j| j.kind), Some(EdgeKind::Vertical));

    let fanned = build_panel_tree(&tray(), &parallel.driven, "base", &TreeOptions::default()).unwrap();
    let flap = fanned.get(fanned.find("flap-2").unwrap()).unwrap();
    assert_eq!(flap.parent, Some(PanelTree::ROOT));
    assert_eq!(flap.joint.as_ref().map(|j| j.kind), Some(EdgeKind::Horizontal));
}

#[test]
fn loose_panels_come_last() {
    let mut panels = abc();
    panels.insert(1, Panel::new("loose", 500.0, 500.0, 20.0, 20.0));
    let plan = auto_fold_sequence(&panels, &LayoutOptions::default()).unwrap();
    assert_eq!(plan.unreached, ["loose"]);
    assert_eq!(plan.sequence, ["A", "B", "C", "loose"]);
    assert!(plan.schedule.window("loose").is_none());
}

#[test]
fn host_inputs_take_precedence() {
    let panels = cube();
    let order = vec!["back".to_string(), "lid".to_string()];

    let plan = plan_fold(
        &panels,
        &FoldInputs {
            root: Some("front"),
            order: Some(order.as_slice()),
            ..Default::default()
        },
        &LayoutOptions::default(),
    )
    .unwrap();
    assert_eq!(plan.root, "front");
    assert_eq!(&plan.sequence[..3], ["front", "back", "lid"]);

    // An unknown root falls back to automatic selection
    let fallback = plan_fold(
        &panels,
        &FoldInputs {
            root: Some("nope"),
            ..Default::default()
        },
        &LayoutOptions::default(),
    )
    .unwrap();
    assert_eq!(fallback.root, "base");
}

#[test]
fn hand_made_map_is_kept() {
    let panels = abc();
    let map = DrivenMap::from_edges([("B", "A"), ("A", "C")]).unwrap();
    let plan = plan_fold(
        &panels,
        &FoldInputs {
            driven: Some(&map),
            ..Default::default()
        },
        &LayoutOptions::default(),
    )
    .unwrap();
    assert_eq!(plan.root, "B");
    assert_eq!(plan.driven, map);
    assert_eq!(plan.sequence, ["B", "A", "C"]);
}

#[test]
fn nothing_to_plan() {
    assert!(auto_fold_sequence(&[], &LayoutOptions::default()).is_none());
}

fn with_map(panels: &[Panel], map: &DrivenMap) -> AutoFoldSequence {
    plan_fold(
        panels,
        &FoldInputs {
            driven: Some(map),
            ..Default::default()
        },
        &LayoutOptions::default(),
    )
    .unwrap()
}

#[test]
fn links_to_unknown_panels_are_dropped() {
    initialize_tracing();

    let map = DrivenMap::from_entries(BTreeMap::from([(
        "A".to_string(),
        vec!["B".to_string(), "C".to_string(), "ghost".to_string()],
    )]));
    let plan = with_map(&abc(), &map);

    assert_eq!(plan.sequence, ["A", "B", "C"]);
    assert!(plan.unreached.is_empty());
    assert_eq!(plan.driven.children("A"), ["B", "C"]);
    assert!(plan.schedule.window("ghost").is_none());
    assert_eq!(plan.schedule.windows.len(), 3);
    let last = plan.schedule.windows.last().unwrap();
    assert_eq!(last.panel_id, "C");
    assert!((last.end - 1.0).abs() < 1e-6);
    assert_eq!(plan.fold_edges.len(), 2);

    // A link from a panel that does not exist goes too
    let map = DrivenMap::from_edges([("A", "B"), ("ghost", "C")]).unwrap();
    let plan = with_map(&abc(), &map);
    assert_eq!(plan.root, "A");
    assert_eq!(plan.sequence, ["A", "B", "C"]);
    assert_eq!(plan.unreached, ["C"]);
    assert!((plan.schedule.window("B").unwrap().end - 1.0).abs() < 1e-6);
}

#[test]
fn inferred_links_keep_their_crease() {
    // B and C only share a corner
    let map = DrivenMap::from_edges([("A", "B"), ("B", "C")]).unwrap();
    let plan = with_map(&abc(), &map);
    let tree = build_panel_tree(&abc(), &plan.driven, &plan.root, &TreeOptions::default()).unwrap();

    assert_eq!(plan.fold_edges.len(), 2);
    assert_eq!(plan.fold_edges, tree.fold_edges());
    let crease = &plan.fold_edges[1];
    assert_eq!((crease.parent_id.as_str(), crease.child_id.as_str()), ("B", "C"));
}

#[test]
fn panels_without_area_stay_unreached() {
    let mut panels = abc();
    panels.push(Panel::new("sliver", 0.0, 100.0, 100.0, 0.0));

    let map = DrivenMap::from_edges([("A", "B"), ("A", "C"), ("C", "sliver")]).unwrap();
    let plan = with_map(&panels, &map);
    assert_eq!(plan.unreached, ["sliver"]);
    assert_eq!(plan.sequence, ["A", "B", "C", "sliver"]);
    assert!(plan.schedule.window("sliver").is_none());
    assert!((plan.schedule.window("C").unwrap().end - 1.0).abs() < 1e-6);
    assert!(plan.fold_edges.iter().all(|e| e.child_id != "sliver"));

    // It touches C along its whole bottom edge, but is never detected
    let plan = auto_fold_sequence(&panels, &LayoutOptions::default()).unwrap();
    assert_eq!(plan.unreached, ["sliver"]);
    assert_eq!(plan.fold_edges.len(), 2);
}
