use nalgebra::Vector3;
use rcarton_layout::{NodeIndex, PanelTree};
use rcarton_model::{Bone, BoneIndex, Skeleton, Vector3F};

/// Bone driving a tree node. Bone 0 is the origin bone, panels follow in
/// tree order.
pub const fn bone_for_node(node: NodeIndex) -> BoneIndex {
    node + 1
}

pub(crate) fn to_vector3f(v: &Vector3<f32>) -> Vector3F {
    Vector3F::new(v.x, v.y, v.z)
}

/// One bone per tree node, under an origin bone.
///
/// The root panel's bone sits at the panel centre. Every other bone sits on
/// the crease its panel pivots about, expressed relative to the parent bone.
pub fn build_skeleton(tree: &PanelTree) -> Skeleton {
    let mut bones = Vec::with_capacity(tree.len() + 1);
    bones.push(Bone {
        id: Skeleton::ORIGIN_ID.to_owned(),
        local_position: Vector3F::ZERO,
        parent_index: None,
    });

    for node in tree.nodes() {
        let (local_position, parent_index) = match (&node.joint, node.parent) {
            (Some(joint), Some(parent)) => (to_vector3f(&joint.local_position), bone_for_node(parent)),
            _ => (
                Vector3F::new(node.center[0], node.center[1], 0.0),
                Skeleton::ORIGIN,
            ),
        };
        bones.push(Bone {
            id: node.id.clone(),
            local_position,
            parent_index: Some(parent_index),
        });
    }

    tracing::event!(tracing::Level::TRACE, "built {} bones", bones.len());
    Skeleton { bones }
}
