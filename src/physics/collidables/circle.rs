use glam::Vec2;
use std::f32::consts::PI;

use super::ray::{RayCastInput, RayCastOutput};
use super::shape::ConvexShape;
use crate::physics::body_properties::{MassData, Transform};
use crate::physics::collision_detection::DistanceProxy;
use crate::physics::error::ShapeError;
use crate::utilities::math_helper::EPSILON;
use crate::utilities::BoundingBox;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Solid circle, optionally offset from the body origin.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CircleShape {
    /// Center of the circle in body space.
    pub position: Vec2,
    /// Radius of the circle.
    pub radius: f32,
}

impl CircleShape {
    /// Creates a circle centered on the body origin.
    pub fn new(radius: f32) -> Result<Self, ShapeError> {
        Self::with_offset(radius, Vec2::ZERO)
    }

    /// Creates a circle centered at `position` in body space.
    pub fn with_offset(radius: f32, position: Vec2) -> Result<Self, ShapeError> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(ShapeError::InvalidDimension(radius));
        }
        Ok(Self { position, radius })
    }
}

impl ConvexShape for CircleShape {
    fn radius(&self) -> f32 {
        self.radius
    }

    fn compute_bounds(&self, transform: &Transform) -> BoundingBox {
        let p = transform.apply(self.position);
        BoundingBox::new(p - Vec2::splat(self.radius), p + Vec2::splat(self.radius))
    }

    fn compute_mass(&self, density: f32) -> MassData {
        let mass = density * PI * self.radius * self.radius;
        MassData {
            mass,
            center: self.position,
            // Inertia about the local origin.
            inertia: mass * (0.5 * self.radius * self.radius + self.position.dot(self.position)),
        }
    }

    fn test_point(&self, transform: &Transform, point: Vec2) -> bool {
        let center = transform.apply(self.position);
        (point - center).length_squared() <= self.radius * self.radius
    }

    fn ray_cast(&self, input: &RayCastInput, transform: &Transform) -> Option<RayCastOutput> {
        let position = transform.apply(self.position);
        let s = input.p1 - position;
        let b = s.dot(s) - self.radius * self.radius;

        // Solve the quadratic for the entry point.
        let r = input.p2 - input.p1;
        let c = s.dot(r);
        let rr = r.dot(r);
        let sigma = c * c - rr * b;
        if sigma < 0.0 || rr < EPSILON {
            return None;
        }

        let a = -(c + sigma.sqrt());
        if 0.0 <= a && a <= input.max_fraction * rr {
            let fraction = a / rr;
            Some(RayCastOutput {
                normal: (s + fraction * r).normalize_or_zero(),
                fraction,
            })
        } else {
            None
        }
    }

    fn distance_proxy(&self) -> DistanceProxy<'_> {
        DistanceProxy {
            vertices: std::slice::from_ref(&self.position),
            radius: self.radius,
        }
    }
}
