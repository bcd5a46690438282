use rcarton_layout::{JointInfo, PanelNode, PanelTree};
use rcarton_model::{
    BoneIndex, EdgeKind, GeometryGroup, GroupKind, Rect, SkinVertex, SkinnedGeometry, Vector2F,
    Vector3F, VertexIndex,
};

use crate::skeleton::bone_for_node;

/// Quads across each crease.
pub const FOLD_SEGMENTS: u32 = 6;

/// Width of the bending band centred on each crease, in layout units.
pub const DEFAULT_CREASE_WIDTH: f32 = 2.0;

/// Maps layout coordinates onto `[0, 1]²` over the bounding box of all panels.
#[derive(Debug, Clone, Copy, PartialEq)]
struct UvMapper {
    origin: [f32; 2],
    inv_size: [f32; 2],
}

impl UvMapper {
    fn new(tree: &PanelTree) -> Self {
        let bounds = tree
            .nodes()
            .iter()
            .map(|n| n.rect)
            .reduce(|a, b| a.union(&b))
            .unwrap_or_default();
        let inv = |size: f32| if size > 0.0 { 1.0 / size } else { 0.0 };
        Self {
            origin: [bounds.left(), bounds.top()],
            inv_size: [inv(bounds.width), inv(bounds.height)],
        }
    }

    fn map(&self, x: f32, y: f32) -> Vector2F {
        Vector2F([
            (x - self.origin[0]) * self.inv_size[0],
            (y - self.origin[1]) * self.inv_size[1],
        ])
    }
}

/// Extent of `rect` across a crease of the given kind.
fn across(rect: &Rect, kind: EdgeKind) -> f32 {
    match kind {
        EdgeKind::Horizontal => rect.height,
        EdgeKind::Vertical => rect.width,
    }
}

/// Synthesises the skinned surface of a [`PanelTree`]: one quad per panel,
/// bound to the panel's bone, and one strip of quads per crease whose
/// weights ramp from the parent bone to the child bone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkeletalMeshBuilder {
    pub fold_segments: u32,
    pub crease_width: f32,
}

impl Default for SkeletalMeshBuilder {
    fn default() -> Self {
        Self {
            fold_segments: FOLD_SEGMENTS,
            crease_width: DEFAULT_CREASE_WIDTH,
        }
    }
}

struct Emitter<'a> {
    geometry: SkinnedGeometry,
    rest: &'a [Vector3F],
    uv: UvMapper,
}

impl Emitter<'_> {
    /// Vertex at layout position `(x, y)`, stored relative to `owner`'s rest position.
    fn vertex(
        &mut self,
        x: f32,
        y: f32,
        owner: BoneIndex,
        bone_indices: [BoneIndex; 2],
        bone_weights: [f32; 2],
    ) -> VertexIndex {
        let origin = self.rest[owner as usize];
        self.geometry.push_vertex(SkinVertex {
            position: Vector3F::new(x, y, 0.0) - origin,
            uv: self.uv.map(x, y),
            bone_indices,
            bone_weights,
            owner,
        })
    }

    fn group(&mut self, panel_id: &str, kind: GroupKind, first_index: usize) {
        self.geometry.groups.push(GeometryGroup {
            panel_id: panel_id.to_owned(),
            kind,
            first_index: first_index as u32,
            index_count: (self.geometry.indices.len() - first_index) as u32,
        });
    }

    fn panel(&mut self, node: &PanelNode, bone: BoneIndex) {
        let first = self.geometry.indices.len();
        let r = &node.rect;
        let [a, b, c, d] = [
            (r.left(), r.top()),
            (r.right(), r.top()),
            (r.right(), r.bottom()),
            (r.left(), r.bottom()),
        ]
        .map(|(x, y)| self.vertex(x, y, bone, [bone, bone], [1.0, 0.0]));
        self.geometry.push_triangle([a, b, c]);
        self.geometry.push_triangle([a, c, d]);
        self.group(&node.id, GroupKind::Panel, first);
    }

    fn crease(
        &mut self,
        node: &PanelNode,
        parent: &PanelNode,
        joint: &JointInfo,
        [parent_bone, child_bone]: [BoneIndex; 2],
        segments: u32,
        width: f32,
    ) {
        let first = self.geometry.indices.len();
        let sign = joint.side.outward_sign();
        let mut previous: Option<[VertexIndex; 2]> = None;

        for k in 0..=segments {
            let t = k as f32 / segments as f32;
            let across = joint.position + sign * (t - 0.5) * width;
            let owner = if t >= 0.5 { child_bone } else { parent_bone };
            let row = [joint.span_start, joint.span_end].map(|along| {
                let (x, y) = match joint.kind {
                    EdgeKind::Horizontal => (along, across),
                    EdgeKind::Vertical => (across, along),
                };
                self.vertex(x, y, owner, [parent_bone, child_bone], [1.0 - t, t])
            });

            if let Some([p0, p1]) = previous {
                self.geometry.push_triangle([p0, p1, row[1]]);
                self.geometry.push_triangle([p0, row[1], row[0]]);
            }
            previous = Some(row);
        }

        tracing::event!(
            tracing::Level::TRACE,
            "crease {} -> {}: {} segments, band {}",
            parent.id,
            node.id,
            segments,
            width
        );
        self.group(&node.id, GroupKind::Crease, first);
    }
}

impl SkeletalMeshBuilder {
    /// `rest` holds the skeleton's rest positions, see
    /// [`rcarton_model::Skeleton::rest_positions`].
    pub fn build(&self, tree: &PanelTree, rest: &[Vector3F]) -> SkinnedGeometry {
        let segments = self.fold_segments.max(1);
        let mut emitter = Emitter {
            geometry: SkinnedGeometry::default(),
            rest,
            uv: UvMapper::new(tree),
        };

        for (index, node) in tree.nodes().iter().enumerate() {
            let bone = bone_for_node(index as u32);
            emitter.panel(node, bone);

            let (Some(joint), Some(parent_index)) = (&node.joint, node.parent) else {
                continue;
            };
            let parent = &tree.nodes()[parent_index as usize];
            let width = self
                .crease_width
                .min(across(&parent.rect, joint.kind))
                .min(across(&node.rect, joint.kind))
                .max(0.0);
            emitter.crease(
                node,
                parent,
                joint,
                [bone_for_node(parent_index), bone],
                segments,
                width,
            );
        }

        emitter.geometry
    }
}
