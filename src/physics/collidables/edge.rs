use glam::Vec2;

use super::ray::{RayCastInput, RayCastOutput};
use super::shape::ConvexShape;
use crate::physics::body_properties::{MassData, Transform};
use crate::physics::collision_detection::DistanceProxy;
use crate::physics::error::ShapeError;
use crate::physics::settings::{LINEAR_SLOP, POLYGON_RADIUS};
use crate::utilities::BoundingBox;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Line segment. Edges have no area, so they contribute no mass and contain no points.
/// Typically used for static terrain.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EdgeShape {
    pub(crate) vertices: [Vec2; 2],
    pub(crate) radius: f32,
}

impl EdgeShape {
    pub fn new(v1: Vec2, v2: Vec2) -> Result<Self, ShapeError> {
        if !v1.is_finite() || !v2.is_finite() || (v2 - v1).length_squared() < LINEAR_SLOP * LINEAR_SLOP {
            return Err(ShapeError::DegenerateEdge);
        }
        Ok(Self {
            vertices: [v1, v2],
            radius: POLYGON_RADIUS,
        })
    }

    #[inline]
    pub fn vertex1(&self) -> Vec2 {
        self.vertices[0]
    }

    #[inline]
    pub fn vertex2(&self) -> Vec2 {
        self.vertices[1]
    }
}

impl ConvexShape for EdgeShape {
    fn radius(&self) -> f32 {
        self.radius
    }

    fn compute_bounds(&self, transform: &Transform) -> BoundingBox {
        let v1 = transform.apply(self.vertices[0]);
        let v2 = transform.apply(self.vertices[1]);
        BoundingBox::from_points(v1, v2).expanded(self.radius)
    }

    fn compute_mass(&self, _density: f32) -> MassData {
        MassData {
            mass: 0.0,
            center: 0.5 * (self.vertices[0] + self.vertices[1]),
            inertia: 0.0,
        }
    }

    fn test_point(&self, _transform: &Transform, _point: Vec2) -> bool {
        false
    }

    fn ray_cast(&self, input: &RayCastInput, transform: &Transform) -> Option<RayCastOutput> {
        // Work in the edge frame.
        let p1 = transform.apply_inverse(input.p1);
        let p2 = transform.apply_inverse(input.p2);
        let d = p2 - p1;

        let [v1, v2] = self.vertices;
        let e = v2 - v1;
        let normal = Vec2::new(e.y, -e.x).normalize_or_zero();

        // q = p1 + t * d, dot(normal, q - v1) = 0
        let numerator = normal.dot(v1 - p1);
        let denominator = normal.dot(d);
        if denominator == 0.0 {
            return None;
        }

        let t = numerator / denominator;
        if t < 0.0 || input.max_fraction < t {
            return None;
        }

        let q = p1 + t * d;
        let rr = e.dot(e);
        if rr == 0.0 {
            return None;
        }
        let s = (q - v1).dot(e) / rr;
        if !(0.0..=1.0).contains(&s) {
            return None;
        }

        let world_normal = transform.q.apply(normal);
        Some(RayCastOutput {
            normal: if numerator > 0.0 { -world_normal } else { world_normal },
            fraction: t,
        })
    }

    fn distance_proxy(&self) -> DistanceProxy<'_> {
        DistanceProxy {
            vertices: &self.vertices,
            radius: self.radius,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ray_normal_faces_the_ray() {
        let edge = EdgeShape::new(Vec2::new(-1.0, 0.0), Vec2::new(1.0, 0.0)).unwrap();
        let down = RayCastInput::new(Vec2::new(0.0, 2.0), Vec2::new(0.0, -2.0));
        let hit = edge.ray_cast(&down, &Transform::IDENTITY).unwrap();
        assert_relative_eq!(hit.fraction, 0.5);
        assert_relative_eq!(hit.normal.y, 1.0);

        let up = RayCastInput::new(Vec2::new(0.0, -2.0), Vec2::new(0.0, 2.0));
        let hit = edge.ray_cast(&up, &Transform::IDENTITY).unwrap();
        assert_relative_eq!(hit.normal.y, -1.0);

        let beside = RayCastInput::new(Vec2::new(3.0, 2.0), Vec2::new(3.0, -2.0));
        assert!(edge.ray_cast(&beside, &Transform::IDENTITY).is_none());
    }

    #[test]
    fn test_edges_are_massless() {
        let edge = EdgeShape::new(Vec2::ZERO, Vec2::X).unwrap();
        assert_eq!(edge.compute_mass(10.0).mass, 0.0);
        assert!(!edge.test_point(&Transform::IDENTITY, Vec2::new(0.5, 0.0)));
        assert_eq!(EdgeShape::new(Vec2::ZERO, Vec2::ZERO), Err(ShapeError::DegenerateEdge));
    }
}
