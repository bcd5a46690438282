use crate::{BoneIndex, Vector3F};

#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
#[derive(Debug, Clone, PartialEq)]
pub struct Bone {
    /// Panel id, or [`Skeleton::ORIGIN_ID`] for the origin bone
    pub id: String,
    /// Offset from the parent bone at rest. For panel bones this is the crease
    /// the panel pivots about, not the panel centre.
    pub local_position: Vector3F,
    pub parent_index: Option<BoneIndex>,
}

/// Bones ordered so that every parent precedes its children.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Skeleton {
    pub bones: Vec<Bone>,
}

impl Skeleton {
    pub const ORIGIN: BoneIndex = 0;
    pub const ORIGIN_ID: &'static str = "__origin";

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn get(&self, index: BoneIndex) -> Option<&Bone> {
        self.bones.get(index as usize)
    }

    pub fn find(&self, id: &str) -> Option<BoneIndex> {
        self.bones
            .iter()
            .position(|bone| bone.id == id)
            .map(|i| i as BoneIndex)
    }

    /// Accumulated rest positions. Relies on parents preceding children.
    pub fn rest_positions(&self) -> Vec<Vector3F> {
        let mut out: Vec<Vector3F> = Vec::with_capacity(self.bones.len());
        for bone in &self.bones {
            let base = bone
                .parent_index
                .and_then(|p| out.get(p as usize).copied())
                .unwrap_or(Vector3F::ZERO);
            out.push(base + bone.local_position);
        }
        out
    }
}
