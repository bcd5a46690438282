//! Skeletal rig for a folding layout.
//!
//! A [`FoldRig`] is built once per topology change from a resolved
//! [`PanelTree`]: one skeleton, one skinned surface and the animator that
//! turns the global fold progress into bone rotations every frame.

use std::sync::Arc;

use rcarton_layout::PanelTree;
use rcarton_model::{BoneIndex, FoldSchedule, Skeleton, SkinnedGeometry};

pub mod animator;
pub mod mesh;
pub mod pose;
pub mod skeleton;

pub use animator::{sanitize_progress, FoldAnimator, JointChannel};
pub use mesh::{SkeletalMeshBuilder, DEFAULT_CREASE_WIDTH, FOLD_SEGMENTS};
pub use pose::{deform, Pose};
pub use skeleton::{bone_for_node, build_skeleton};

/// Retimed rigs share the tree, skeleton and geometry of the rig they came from.
#[derive(Debug, Clone)]
pub struct FoldRig {
    tree: Arc<PanelTree>,
    skeleton: Arc<Skeleton>,
    geometry: Arc<SkinnedGeometry>,
    animator: FoldAnimator,
}

impl FoldRig {
    #[tracing::instrument(skip_all, fields(panels = tree.len()))]
    pub fn build(tree: PanelTree, schedule: &FoldSchedule, mesh: &SkeletalMeshBuilder) -> Self {
        let skeleton = build_skeleton(&tree);
        let geometry = mesh.build(&tree, &skeleton.rest_positions());
        let animator = FoldAnimator::new(&tree, schedule);
        tracing::event!(
            tracing::Level::DEBUG,
            "rig: {} bones, {} vertices, {} triangles",
            skeleton.len(),
            geometry.vertex_count(),
            geometry.triangle_count()
        );
        Self {
            tree: Arc::new(tree),
            skeleton: Arc::new(skeleton),
            geometry: Arc::new(geometry),
            animator,
        }
    }

    pub fn tree(&self) -> &PanelTree {
        &self.tree
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    pub fn geometry(&self) -> &SkinnedGeometry {
        &self.geometry
    }

    pub fn animator(&self) -> &FoldAnimator {
        &self.animator
    }

    /// This rig with new timing windows, geometry untouched.
    pub fn retimed(&self, schedule: &FoldSchedule) -> Self {
        let mut animator = self.animator.clone();
        animator.retime(schedule);
        Self {
            tree: Arc::clone(&self.tree),
            skeleton: Arc::clone(&self.skeleton),
            geometry: Arc::clone(&self.geometry),
            animator,
        }
    }

    pub fn bone_of(&self, panel_id: &str) -> Option<BoneIndex> {
        self.tree.find(panel_id).map(bone_for_node)
    }

    pub fn rest_pose(&self) -> Pose {
        Pose::rest(self.skeleton.len())
    }

    pub fn pose(&self, progress: f32) -> Pose {
        self.animator.pose(progress, self.skeleton.len())
    }

    pub fn apply(&self, progress: f32, pose: &mut Pose) {
        self.animator.apply(progress, pose);
    }

    /// World-space vertex positions at `progress`, skinned on the CPU.
    pub fn deformed_positions(&self, progress: f32) -> Vec<[f32; 3]> {
        deform(&self.geometry, &self.skeleton, &self.pose(progress))
    }
}
