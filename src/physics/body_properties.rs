use glam::Vec2;

use crate::utilities::Rot;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Represents a rigid transformation: a translation and a rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Transform {
    /// Position of the body origin.
    pub p: Vec2,
    /// Orientation of the body.
    pub q: Rot,
}

impl Default for Transform {
    #[inline(always)]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    /// Returns a transform with a position at (0,0) and identity orientation.
    pub const IDENTITY: Self = Self {
        p: Vec2::ZERO,
        q: Rot::IDENTITY,
    };

    /// Creates a transform from a position and an angle.
    #[inline(always)]
    pub fn new(position: Vec2, angle: f32) -> Self {
        Self {
            p: position,
            q: Rot::from_angle(angle),
        }
    }

    /// Transforms a point from local space into world space.
    #[inline(always)]
    pub fn apply(&self, v: Vec2) -> Vec2 {
        self.q.apply(v) + self.p
    }

    /// Transforms a point from world space into local space.
    #[inline(always)]
    pub fn apply_inverse(&self, v: Vec2) -> Vec2 {
        self.q.apply_inverse(v - self.p)
    }

    /// Concatenates two transforms: `a * b`.
    #[inline(always)]
    pub fn mul(a: &Transform, b: &Transform) -> Transform {
        Transform {
            q: Rot::mul(&a.q, &b.q),
            p: a.q.apply(b.p) + a.p,
        }
    }

    /// Computes `inverse(a) * b`, expressing `b` in the frame of `a`.
    #[inline(always)]
    pub fn mul_inverse(a: &Transform, b: &Transform) -> Transform {
        Transform {
            q: Rot::mul_transpose(&a.q, &b.q),
            p: a.q.apply_inverse(b.p - a.p),
        }
    }
}

/// Motion of a body's center of mass over a step. Continuous collision interpolates between
/// the `c0`/`a0` pose, valid at time `alpha0`, and the `c`/`a` pose at the end of the step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sweep {
    /// Center of mass relative to the body origin.
    pub local_center: Vec2,
    /// Center of mass at `alpha0`.
    pub c0: Vec2,
    /// Center of mass at the end of the step.
    pub c: Vec2,
    /// Angle at `alpha0`.
    pub a0: f32,
    /// Angle at the end of the step.
    pub a: f32,
    /// Fraction of the current step already consumed, in [0, 1).
    pub alpha0: f32,
}

impl Sweep {
    /// Gets the interpolated transform at `beta` in [0, 1], where 0 is the `c0` pose.
    #[inline]
    pub fn transform_at(&self, beta: f32) -> Transform {
        let center = (1.0 - beta) * self.c0 + beta * self.c;
        let angle = (1.0 - beta) * self.a0 + beta * self.a;
        let q = Rot::from_angle(angle);
        Transform {
            p: center - q.apply(self.local_center),
            q,
        }
    }

    /// Advances the start of the sweep forward to `alpha`, leaving the end untouched.
    pub fn advance(&mut self, alpha: f32) {
        debug_assert!(self.alpha0 < 1.0);
        let beta = (alpha - self.alpha0) / (1.0 - self.alpha0);
        self.c0 += beta * (self.c - self.c0);
        self.a0 += beta * (self.a - self.a0);
        self.alpha0 = alpha;
    }

    /// Wraps the angles into [-pi, pi] while preserving the swept difference.
    pub fn normalize(&mut self) {
        let two_pi = 2.0 * std::f32::consts::PI;
        let d = two_pi * (self.a0 / two_pi).floor();
        self.a0 -= d;
        self.a -= d;
    }
}

/// Mass properties of a shape or body.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MassData {
    /// Mass in kilograms.
    pub mass: f32,
    /// Center of mass relative to the shape origin.
    pub center: Vec2,
    /// Rotational inertia about the shape origin.
    pub inertia: f32,
}

/// Solver position of a body's center of mass.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub c: Vec2,
    pub a: f32,
}

/// Solver velocity of a body.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Velocity {
    pub v: Vec2,
    pub w: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_transform_round_trip_through_inverse() {
        let xf = Transform::new(Vec2::new(1.0, 2.0), 0.7);
        let p = Vec2::new(-3.0, 0.25);
        let back = xf.apply_inverse(xf.apply(p));
        assert_relative_eq!(back.x, p.x, epsilon = 1e-5);
        assert_relative_eq!(back.y, p.y, epsilon = 1e-5);
    }

    #[test]
    fn test_relative_transform() {
        let a = Transform::new(Vec2::new(1.0, 0.0), 0.5);
        let b = Transform::new(Vec2::new(0.0, 3.0), -0.2);
        let rel = Transform::mul_inverse(&a, &b);
        let composed = Transform::mul(&a, &rel);
        assert_relative_eq!(composed.p.x, b.p.x, epsilon = 1e-5);
        assert_relative_eq!(composed.p.y, b.p.y, epsilon = 1e-5);
        assert_relative_eq!(composed.q.angle(), b.q.angle(), epsilon = 1e-5);
    }

    #[test]
    fn test_sweep_advance_moves_start_pose() {
        let mut sweep = Sweep {
            local_center: Vec2::ZERO,
            c0: Vec2::ZERO,
            c: Vec2::new(10.0, 0.0),
            a0: 0.0,
            a: 1.0,
            alpha0: 0.0,
        };
        sweep.advance(0.5);
        assert_relative_eq!(sweep.c0.x, 5.0);
        assert_relative_eq!(sweep.a0, 0.5);
        // Halfway through the remaining interval is three quarters of the full step.
        let xf = sweep.transform_at(0.5);
        assert_relative_eq!(xf.p.x, 7.5);
        sweep.advance(0.75);
        assert_relative_eq!(sweep.c0.x, 7.5);
    }

    #[test]
    fn test_sweep_normalize_keeps_difference() {
        let mut sweep = Sweep {
            a0: 7.0,
            a: 7.5,
            ..Default::default()
        };
        sweep.normalize();
        assert!(sweep.a0 >= 0.0 && sweep.a0 < 2.0 * std::f32::consts::PI);
        assert_relative_eq!(sweep.a - sweep.a0, 0.5, epsilon = 1e-5);
    }
}
