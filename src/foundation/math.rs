use crate::foundation::core::{Affine3A, Vec3};

/// Compose two transforms so that `b` is applied first.
#[inline]
pub fn compose(a: Affine3A, b: Affine3A) -> Affine3A {
    a * b
}

/// Box described by its eight corners. Transforming it maps every corner, so a rotated box is
/// exact; [`BoundingBox::min`] and [`BoundingBox::max`] give the enclosing axis-aligned box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    corners: [Vec3; 8],
}

impl BoundingBox {
    /// Box spanning `origin .. origin + size`.
    pub fn new(origin: Vec3, size: Vec3) -> Self {
        let o = origin;
        let s = size;
        Self {
            corners: [
                o,
                o + Vec3::new(s.x, 0.0, 0.0),
                o + Vec3::new(0.0, s.y, 0.0),
                o + Vec3::new(0.0, 0.0, s.z),
                o + Vec3::new(s.x, s.y, 0.0),
                o + Vec3::new(s.x, 0.0, s.z),
                o + Vec3::new(0.0, s.y, s.z),
                o + s,
            ],
        }
    }

    pub fn corners(&self) -> &[Vec3; 8] {
        &self.corners
    }

    pub fn min(&self) -> Vec3 {
        self.corners
            .iter()
            .copied()
            .fold(Vec3::splat(f32::INFINITY), Vec3::min)
    }

    pub fn max(&self) -> Vec3 {
        self.corners
            .iter()
            .copied()
            .fold(Vec3::splat(f32::NEG_INFINITY), Vec3::max)
    }

    pub fn size(&self) -> Vec3 {
        self.max() - self.min()
    }

    /// Map every corner through `t`.
    pub fn transformed(&self, t: &Affine3A) -> Self {
        let mut corners = self.corners;
        for c in &mut corners {
            *c = t.transform_point3(*c);
        }
        Self { corners }
    }

    /// Smallest axis-aligned box containing both.
    pub fn union(&self, other: &BoundingBox) -> Self {
        let min = self.min().min(other.min());
        let max = self.max().max(other.max());
        Self::new(min, max - min)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
