use glam::Vec2;

use crate::utilities::BoundingBox;

/// Segment cast input. The segment runs from `p1` to `p1 + max_fraction * (p2 - p1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayCastInput {
    pub p1: Vec2,
    pub p2: Vec2,
    pub max_fraction: f32,
}

impl RayCastInput {
    #[inline(always)]
    pub fn new(p1: Vec2, p2: Vec2) -> Self {
        Self {
            p1,
            p2,
            max_fraction: 1.0,
        }
    }

    /// Bounds of the portion of the segment still being cast.
    #[inline]
    pub fn bounds(&self) -> BoundingBox {
        let end = self.p1 + self.max_fraction * (self.p2 - self.p1);
        BoundingBox::from_points(self.p1, end)
    }
}

/// Result of a segment cast against a shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayCastOutput {
    /// Surface normal at the hit, pointing out of the shape.
    pub normal: Vec2,
    /// Hit point is `p1 + fraction * (p2 - p1)`.
    pub fraction: f32,
}
