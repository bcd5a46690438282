use crate::{BoneIndex, PanelId, Vector2F, Vector3F, VertexIndex};

/// One skinned vertex, laid out for direct upload.
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
#[cfg_attr(feature = "bytemuck", derive(bytemuck::Pod, bytemuck::Zeroable))]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[repr(C)]
pub struct SkinVertex {
    /// Relative to the rest position of `owner`
    pub position: Vector3F,
    pub uv: Vector2F,
    pub bone_indices: [BoneIndex; 2],
    pub bone_weights: [f32; 2],
    pub owner: BoneIndex,
}

impl SkinVertex {
    /// Influences with a non-zero weight.
    pub fn influences(&self) -> impl Iterator<Item = (BoneIndex, f32)> + '_ {
        self.bone_indices
            .iter()
            .copied()
            .zip(self.bone_weights.iter().copied())
            .filter(|(_, w)| *w != 0.0)
    }
}

#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    Panel,
    Crease,
}

/// Contiguous index range belonging to one panel face or one crease strip.
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryGroup {
    pub panel_id: PanelId,
    pub kind: GroupKind,
    pub first_index: u32,
    pub index_count: u32,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkinnedGeometry {
    pub vertices: Vec<SkinVertex>,
    pub indices: Vec<VertexIndex>,
    pub groups: Vec<GeometryGroup>,
}

impl SkinnedGeometry {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn push_vertex(&mut self, vertex: SkinVertex) -> VertexIndex {
        let index = self.vertices.len() as VertexIndex;
        self.vertices.push(vertex);
        index
    }

    pub fn push_triangle(&mut self, triangle: [VertexIndex; 3]) {
        self.indices.extend_from_slice(&triangle);
    }

    pub fn positions(&self) -> Vec<[f32; 3]> {
        self.vertices.iter().map(|v| v.position.0).collect()
    }

    pub fn uvs(&self) -> Vec<[f32; 2]> {
        self.vertices.iter().map(|v| v.uv.0).collect()
    }

    pub fn bone_indices(&self) -> Vec<[BoneIndex; 2]> {
        self.vertices.iter().map(|v| v.bone_indices).collect()
    }

    pub fn bone_weights(&self) -> Vec<[f32; 2]> {
        self.vertices.iter().map(|v| v.bone_weights).collect()
    }

    pub fn groups_of<'a>(&'a self, panel_id: &'a str) -> impl Iterator<Item = &'a GeometryGroup> {
        self.groups.iter().filter(move |g| g.panel_id == panel_id)
    }
}
