use glam::Mat4;

use crate::coords::Vec3;

/// Scale/origin/position mapping from data space to device pixels.
///
/// A point maps as `(p - origin) * scale + position`. Instances are never
/// mutated after construction; the engine swaps in a new one on recompute.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    pub scale: Vec3,
    pub origin: Vec3,
    pub position: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        scale: Vec3::splat(1.0),
        origin: Vec3::zero(),
        position: Vec3::zero(),
    };

    /// Maps a data-space point to pixel space.
    #[inline]
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        (p - self.origin).mul_elem(self.scale) + self.position
    }

    /// Maps a pixel-space point back to data space.
    ///
    /// Scale components are never zero for transforms built by the engine.
    #[inline]
    pub fn inverse_transform_point(&self, p: Vec3) -> Vec3 {
        (p - self.position).div_elem(self.scale) + self.origin
    }

    /// Model matrix for GPU upload: `T(position) · S(scale) · T(-origin)`.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position.to_f32())
            * Mat4::from_scale(self.scale.to_f32())
            * Mat4::from_translation(-self.origin.to_f32())
    }
}
