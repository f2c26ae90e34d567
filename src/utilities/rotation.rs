use glam::Vec2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Rotation stored as the sine and cosine of its angle.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rot {
    /// Sine of the angle.
    pub s: f32,
    /// Cosine of the angle.
    pub c: f32,
}

impl Default for Rot {
    #[inline(always)]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Rot {
    /// The zero rotation.
    pub const IDENTITY: Self = Self { s: 0.0, c: 1.0 };

    /// Creates a rotation from an angle in radians.
    #[inline(always)]
    pub fn from_angle(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self { s, c }
    }

    /// Gets the angle in radians, in the range [-pi, pi].
    #[inline(always)]
    pub fn angle(&self) -> f32 {
        self.s.atan2(self.c)
    }

    /// Gets the rotated x axis.
    #[inline(always)]
    pub fn x_axis(&self) -> Vec2 {
        Vec2::new(self.c, self.s)
    }

    /// Gets the rotated y axis.
    #[inline(always)]
    pub fn y_axis(&self) -> Vec2 {
        Vec2::new(-self.s, self.c)
    }

    /// Rotates a vector.
    #[inline(always)]
    pub fn apply(&self, v: Vec2) -> Vec2 {
        Vec2::new(self.c * v.x - self.s * v.y, self.s * v.x + self.c * v.y)
    }

    /// Inverse rotates a vector.
    #[inline(always)]
    pub fn apply_inverse(&self, v: Vec2) -> Vec2 {
        Vec2::new(self.c * v.x + self.s * v.y, -self.s * v.x + self.c * v.y)
    }

    /// Concatenates two rotations: `q * r`.
    #[inline(always)]
    pub fn mul(q: &Rot, r: &Rot) -> Rot {
        Rot {
            s: q.s * r.c + q.c * r.s,
            c: q.c * r.c - q.s * r.s,
        }
    }

    /// Computes `transpose(q) * r`, the rotation of `r` relative to `q`.
    #[inline(always)]
    pub fn mul_transpose(q: &Rot, r: &Rot) -> Rot {
        Rot {
            s: q.c * r.s - q.s * r.c,
            c: q.c * r.c + q.s * r.s,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_quarter_turn() {
        let q = Rot::from_angle(FRAC_PI_2);
        let v = q.apply(Vec2::X);
        assert_relative_eq!(v.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(v.y, 1.0, epsilon = 1e-6);
        let back = q.apply_inverse(v);
        assert_relative_eq!(back.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(q.angle(), FRAC_PI_2, epsilon = 1e-6);
    }

    #[test]
    fn test_relative_rotation() {
        let q = Rot::from_angle(0.3);
        let r = Rot::from_angle(1.1);
        assert_relative_eq!(Rot::mul_transpose(&q, &r).angle(), 0.8, epsilon = 1e-5);
        assert_relative_eq!(Rot::mul(&q, &r).angle(), 1.4, epsilon = 1e-5);
    }
}
