//! Plain data exchanged between the layout, rig and host stages.
//!
//! Nothing in here performs layout inference or mesh synthesis; it only
//! describes panels, creases, the fold hierarchy, timing windows and the
//! skinned output handed to a renderer. Enable the `serde` feature for
//! interchange and the `bytemuck` feature for GPU upload of vertex records.

mod panel;
pub use panel::*;

mod edge;
pub use edge::*;

mod driven;
pub use driven::*;

mod timing;
pub use timing::*;

mod skeleton;
pub use skeleton::*;

mod geometry;
pub use geometry::*;

pub type PanelIndex = u32;
pub type BoneIndex = u32;
pub type VertexIndex = u32;

#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
#[cfg_attr(feature = "bytemuck", derive(bytemuck::Pod, bytemuck::Zeroable))]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[repr(transparent)]
pub struct Vector3F(pub [f32; 3]);

impl Vector3F {
    pub const ZERO: Self = Self([0.0; 3]);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self([x, y, z])
    }

    pub const fn x(&self) -> f32 {
        self.0[0]
    }

    pub const fn y(&self) -> f32 {
        self.0[1]
    }

    pub const fn z(&self) -> f32 {
        self.0[2]
    }
}

impl core::ops::Add for Vector3F {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self([
            self.0[0] + rhs.0[0],
            self.0[1] + rhs.0[1],
            self.0[2] + rhs.0[2],
        ])
    }
}

impl core::ops::Sub for Vector3F {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self([
            self.0[0] - rhs.0[0],
            self.0[1] - rhs.0[1],
            self.0[2] - rhs.0[2],
        ])
    }
}

#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(transparent)
)]
#[cfg_attr(feature = "bytemuck", derive(bytemuck::Pod, bytemuck::Zeroable))]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[repr(transparent)]
pub struct Vector2F(pub [f32; 2]);

#[cfg(feature = "bytemuck")]
mod pod_sa {
    use static_assertions as sa;

    sa::assert_eq_size!(crate::Vector3F, [f32; 3]);
    sa::assert_eq_size!(crate::Vector2F, [f32; 2]);
    sa::assert_eq_size!(crate::SkinVertex, [u32; 10]);
}
