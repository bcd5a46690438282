use nalgebra::{Point3, Vector3};
use rcarton_layout::{auto_fold_sequence, build_panel_tree, LayoutOptions, TreeOptions};
use rcarton_model::{GroupKind, Panel, SkinVertex};
use rcarton_rig::{FoldRig, SkeletalMeshBuilder};

use rstest::rstest;

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

fn rig(panels: &[Panel]) -> FoldRig {
    let plan = auto_fold_sequence(panels, &LayoutOptions::default()).unwrap();
    let tree = build_panel_tree(panels, &plan.driven, &plan.root, &TreeOptions::default()).unwrap();
    FoldRig::build(tree, &plan.schedule, &SkeletalMeshBuilder::default())
}

/// World positions of the four corners of a panel's quad.
fn quad(rig: &FoldRig, positions: &[[f32; 3]], panel_id: &str) -> [Point3<f32>; 4] {
    let group = rig
        .geometry()
        .groups_of(panel_id)
        .find(|g| g.kind == GroupKind::Panel)
        .unwrap();
    let first = rig.geometry().indices[group.first_index as usize] as usize;
    std::array::from_fn(|i| Point3::from(positions[first + i]))
}

fn normal([a, b, _, d]: &[Point3<f32>; 4]) -> Vector3<f32> {
    (b - a).cross(&(d - a)).normalize()
}

fn assert_close(got: Point3<f32>, want: [f32; 3]) {
    let want = Point3::from(want);
    assert!((got - want).norm() < 1e-3, "{got:?} vs {want:?}");
}

#[rstest]
#[case::abc(abc())]
#[case::cube(cube())]
fn rest_pose_is_the_flat_layout(#[case] panels: Vec<Panel>) {
    initialize_tracing();

    let rig = rig(&panels);
    let positions = rig.deformed_positions(0.0);
    let rest = rig.skeleton().rest_positions();

    for (vertex, world) in rig.geometry().vertices.iter().zip(&positions) {
        let expected = vertex.position + rest[vertex.owner as usize];
        assert_close(Point3::from(*world), expected.0);
        assert_eq!(world[2], 0.0);
    }
    for panel in &panels {
        let corners = quad(&rig, &positions, &panel.id);
        let r = panel.rect();
        assert_close(corners[0], [r.left(), r.top(), 0.0]);
        assert_close(corners[2], [r.right(), r.bottom(), 0.0]);
    }
}

#[rstest]
#[case::abc(abc())]
#[case::cube(cube())]
fn weights_are_normalised(#[case] panels: Vec<Panel>) {
    let rig = rig(&panels);
    for vertex in &rig.geometry().vertices {
        let SkinVertex {
            bone_indices,
            bone_weights,
            ..
        } = vertex;
        assert!((bone_weights[0] + bone_weights[1] - 1.0).abs() < 1e-6, "{vertex:?}");
        assert!(vertex.influences().count() <= 2);
        assert!(bone_indices.iter().all(|&b| (b as usize) < rig.skeleton().len()));
    }
}

#[test]
fn abc_folds_about_its_creases() {
    initialize_tracing();

    let rig = rig(&abc());
    let positions = rig.deformed_positions(1.0);

    // A does not move
    let a = quad(&rig, &positions, "A");
    assert_close(a[0], [0.0, 0.0, 0.0]);
    assert_close(a[2], [100.0, 50.0, 0.0]);

    // B stands up on x = 100, its far corners now at z = 100
    let b = quad(&rig, &positions, "B");
    assert_close(b[0], [100.0, 0.0, 0.0]);
    assert_close(b[1], [100.0, 0.0, 100.0]);
    assert_close(b[2], [100.0, 50.0, 100.0]);

    // C stands up on y = 50
    let c = quad(&rig, &positions, "C");
    assert_close(c[0], [0.0, 50.0, 0.0]);
    assert_close(c[2], [100.0, 50.0, 50.0]);
    assert_close(c[3], [0.0, 50.0, 50.0]);
}

#[rstest]
#[case::abc(abc())]
#[case::cube(cube())]
fn full_fold_is_a_right_angle(#[case] panels: Vec<Panel>) {
    let rig = rig(&panels);
    let positions = rig.deformed_positions(1.0);

    for (child, parent, _) in rig.tree().joints() {
        let child = &rig.tree().nodes()[child as usize];
        let parent = &rig.tree().nodes()[parent as usize];
        let n_child = normal(&quad(&rig, &positions, &child.id));
        let n_parent = normal(&quad(&rig, &positions, &parent.id));
        assert!(
            n_child.dot(&n_parent).abs() < 1e-4,
            "{} / {}: {n_child:?} {n_parent:?}",
            parent.id,
            child.id
        );
    }
}

#[test]
fn cube_closes() {
    let rig = rig(&cube());
    let positions = rig.deformed_positions(1.0);

    // Every face ends up on the boundary of the 100 unit cube sitting on the base
    for panel in cube() {
        for corner in quad(&rig, &positions, &panel.id) {
            assert!(corner.x > 100.0 - 1e-2 && corner.x < 200.0 + 1e-2, "{}: {corner:?}", panel.id);
            assert!(corner.y > 200.0 - 1e-2 && corner.y < 300.0 + 1e-2, "{}: {corner:?}", panel.id);
            assert!(corner.z > -1e-2 && corner.z < 100.0 + 1e-2, "{}: {corner:?}", panel.id);
        }
    }
    // The lid lies flat on top
    for corner in quad(&rig, &positions, "lid") {
        assert!((corner.z - 100.0).abs() < 1e-2, "{corner:?}");
    }
}

#[test]
fn crease_band_follows_both_bones() {
    let rig = rig(&abc());
    let positions = rig.deformed_positions(1.0);
    let group = rig
        .geometry()
        .groups_of("C")
        .find(|g| g.kind == GroupKind::Crease)
        .unwrap();
    let first = rig.geometry().indices[group.first_index as usize] as usize;
    let rows = (rcarton_rig::FOLD_SEGMENTS + 1) as usize;

    // The band is 2 wide: its parent edge stays flat, its child edge rises by half of it
    let heights = (0..rows)
        .map(|k| positions[first + 2 * k][2])
        .collect::<Vec<_>>();
    assert!(heights[0].abs() < 1e-5, "{heights:?}");
    assert!((heights[rows - 1] - 1.0).abs() < 1e-5, "{heights:?}");
    assert!(heights.iter().all(|h| h.abs() <= 1.0 + 1e-5), "{heights:?}");
}
