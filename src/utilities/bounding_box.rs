use glam::Vec2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Provides simple axis-aligned bounding box functionality.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoundingBox {
    /// Location with the lowest X and Y coordinates in the axis-aligned bounding box.
    pub min: Vec2,
    /// Location with the highest X and Y coordinates in the axis-aligned bounding box.
    pub max: Vec2,
}

impl BoundingBox {
    /// Constructs a bounding box from the specified minimum and maximum.
    #[inline]
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Constructs the smallest bounding box containing both points.
    #[inline]
    pub fn from_points(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// A box is valid when its bounds are ordered and finite.
    #[inline]
    pub fn is_valid(&self) -> bool {
        let d = self.max - self.min;
        d.x >= 0.0 && d.y >= 0.0 && self.min.is_finite() && self.max.is_finite()
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        0.5 * (self.min + self.max)
    }

    /// Half widths of the box.
    #[inline]
    pub fn extents(&self) -> Vec2 {
        0.5 * (self.max - self.min)
    }

    #[inline]
    pub fn perimeter(&self) -> f32 {
        let d = self.max - self.min;
        2.0 * (d.x + d.y)
    }

    /// Computes a bounding box that contains the two input bounding boxes.
    #[inline]
    pub fn create_merged(a: &BoundingBox, b: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min: a.min.min(b.min),
            max: a.max.max(b.max),
        }
    }

    /// Determines if a bounding box intersects another bounding box.
    #[inline]
    pub fn intersects(a: &BoundingBox, b: &BoundingBox) -> bool {
        let d1 = b.min - a.max;
        let d2 = a.min - b.max;
        !(d1.x > 0.0 || d1.y > 0.0 || d2.x > 0.0 || d2.y > 0.0)
    }

    /// Returns true if `other` lies entirely within this box.
    #[inline]
    pub fn contains(&self, other: &BoundingBox) -> bool {
        self.min.x <= other.min.x
            && self.min.y <= other.min.y
            && other.max.x <= self.max.x
            && other.max.y <= self.max.y
    }

    /// Returns true if the point lies inside or on the boundary of the box.
    #[inline]
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    /// Expands the box by `margin` on every side.
    #[inline]
    pub fn expanded(&self, margin: f32) -> BoundingBox {
        let r = Vec2::splat(margin);
        BoundingBox {
            min: self.min - r,
            max: self.max + r,
        }
    }

    /// Translates the box.
    #[inline]
    pub fn translated(&self, offset: Vec2) -> BoundingBox {
        BoundingBox {
            min: self.min + offset,
            max: self.max + offset,
        }
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.min, self.max)
    }
}
