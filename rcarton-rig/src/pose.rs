use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};
use rcarton_model::{BoneIndex, Skeleton, SkinnedGeometry};

/// Per-bone rotations, indexed like [`Skeleton::bones`].
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    pub rotations: Vec<UnitQuaternion<f32>>,
}

impl Pose {
    /// Every bone at identity.
    pub fn rest(bone_count: usize) -> Self {
        Self {
            rotations: vec![UnitQuaternion::identity(); bone_count],
        }
    }

    pub fn len(&self) -> usize {
        self.rotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rotations.is_empty()
    }

    pub fn rotation(&self, bone: BoneIndex) -> Option<&UnitQuaternion<f32>> {
        self.rotations.get(bone as usize)
    }

    pub fn set(&mut self, bone: BoneIndex, rotation: UnitQuaternion<f32>) {
        if let Some(slot) = self.rotations.get_mut(bone as usize) {
            *slot = rotation;
        }
    }

    pub fn reset(&mut self) {
        self.rotations.fill(UnitQuaternion::identity());
    }

    /// Bone-to-world transforms: `parent * translate(local_position) * rotation`.
    ///
    /// Bones missing from the pose are left unrotated.
    pub fn global_transforms(&self, skeleton: &Skeleton) -> Vec<Isometry3<f32>> {
        let mut out: Vec<Isometry3<f32>> = Vec::with_capacity(skeleton.len());
        for (i, bone) in skeleton.bones.iter().enumerate() {
            let [x, y, z] = bone.local_position.0;
            let rotation = self
                .rotations
                .get(i)
                .copied()
                .unwrap_or_else(UnitQuaternion::identity);
            let local = Isometry3::from_parts(Translation3::new(x, y, z), rotation);
            let global = match bone.parent_index.and_then(|p| out.get(p as usize)) {
                Some(parent) => parent * local,
                None => local,
            };
            out.push(global);
        }
        out
    }
}

/// Linear blend skinning on the CPU.
///
/// Vertices are stored relative to their owner bone at rest, so each
/// influence is applied to the vertex expressed in that bone's rest frame.
pub fn deform(geometry: &SkinnedGeometry, skeleton: &Skeleton, pose: &Pose) -> Vec<[f32; 3]> {
    let rest = skeleton.rest_positions();
    let transforms = pose.global_transforms(skeleton);

    geometry
        .vertices
        .iter()
        .map(|vertex| {
            let [ox, oy, oz] = rest
                .get(vertex.owner as usize)
                .map(|p| p.0)
                .unwrap_or_default();
            let [vx, vy, vz] = vertex.position.0;
            let world_rest = Vector3::new(vx + ox, vy + oy, vz + oz);

            let mut blended = Vector3::zeros();
            let mut total = 0.0;
            for (bone, weight) in vertex.influences() {
                let (Some(transform), Some(origin)) =
                    (transforms.get(bone as usize), rest.get(bone as usize))
                else {
                    continue;
                };
                let [bx, by, bz] = origin.0;
                let local = Point3::from(world_rest - Vector3::new(bx, by, bz));
                blended += (transform * local).coords * weight;
                total += weight;
            }

            if total > 0.0 {
                blended /= total;
            } else {
                blended = world_rest;
            }
            [blended.x, blended.y, blended.z]
        })
        .collect()
}
