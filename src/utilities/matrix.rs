use glam::{Vec2, Vec3};

/// 2x2 matrix stored as columns.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Mat22 {
    pub ex: Vec2,
    pub ey: Vec2,
}

impl Mat22 {
    pub const ZERO: Self = Self {
        ex: Vec2::ZERO,
        ey: Vec2::ZERO,
    };

    #[inline(always)]
    pub fn new(ex: Vec2, ey: Vec2) -> Self {
        Self { ex, ey }
    }

    /// Multiplies a vector by this matrix.
    #[inline(always)]
    pub fn transform(&self, v: Vec2) -> Vec2 {
        Vec2::new(
            self.ex.x * v.x + self.ey.x * v.y,
            self.ex.y * v.x + self.ey.y * v.y,
        )
    }

    /// Computes the inverse. A singular matrix inverts to zero.
    pub fn inverse(&self) -> Self {
        let (a, b, c, d) = (self.ex.x, self.ey.x, self.ex.y, self.ey.y);
        let mut det = a * d - b * c;
        if det != 0.0 {
            det = 1.0 / det;
        }
        Self {
            ex: Vec2::new(det * d, -det * c),
            ey: Vec2::new(-det * b, det * a),
        }
    }

    /// Solves `A * x = b` without computing the inverse. A singular matrix yields zero.
    pub fn solve(&self, b: Vec2) -> Vec2 {
        let (a11, a12, a21, a22) = (self.ex.x, self.ey.x, self.ex.y, self.ey.y);
        let mut det = a11 * a22 - a12 * a21;
        if det != 0.0 {
            det = 1.0 / det;
        }
        Vec2::new(det * (a22 * b.x - a12 * b.y), det * (a11 * b.y - a21 * b.x))
    }
}

/// 3x3 matrix stored as columns. Used by constraints that couple a point and an angle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Mat33 {
    pub ex: Vec3,
    pub ey: Vec3,
    pub ez: Vec3,
}

impl Mat33 {
    pub const ZERO: Self = Self {
        ex: Vec3::ZERO,
        ey: Vec3::ZERO,
        ez: Vec3::ZERO,
    };

    #[inline(always)]
    pub fn transform(&self, v: Vec3) -> Vec3 {
        v.x * self.ex + v.y * self.ey + v.z * self.ez
    }

    #[inline(always)]
    pub fn transform2(&self, v: Vec2) -> Vec2 {
        Vec2::new(
            self.ex.x * v.x + self.ey.x * v.y,
            self.ex.y * v.x + self.ey.y * v.y,
        )
    }

    /// Solves `A * x = b` for the full 3x3 system. A singular matrix yields zero.
    pub fn solve33(&self, b: Vec3) -> Vec3 {
        let mut det = self.ex.dot(self.ey.cross(self.ez));
        if det != 0.0 {
            det = 1.0 / det;
        }
        Vec3::new(
            det * b.dot(self.ey.cross(self.ez)),
            det * self.ex.dot(b.cross(self.ez)),
            det * self.ex.dot(self.ey.cross(b)),
        )
    }

    /// Solves `A * x = b` using only the upper 2x2 block.
    pub fn solve22(&self, b: Vec2) -> Vec2 {
        Mat22::new(self.ex.truncate(), self.ey.truncate()).solve(b)
    }

    /// Inverse of the upper 2x2 block, embedded in a 3x3 with a zero third row and column.
    pub fn inverse22(&self) -> Self {
        let inv = Mat22::new(self.ex.truncate(), self.ey.truncate()).inverse();
        Self {
            ex: inv.ex.extend(0.0),
            ey: inv.ey.extend(0.0),
            ez: Vec3::ZERO,
        }
    }

    /// Inverse of a symmetric matrix. A singular matrix inverts to zero.
    pub fn symmetric_inverse33(&self) -> Self {
        let mut det = self.ex.dot(self.ey.cross(self.ez));
        if det != 0.0 {
            det = 1.0 / det;
        }
        let (a11, a12, a13) = (self.ex.x, self.ey.x, self.ez.x);
        let (a22, a23) = (self.ey.y, self.ez.y);
        let a33 = self.ez.z;

        let ex = Vec3::new(
            det * (a22 * a33 - a23 * a23),
            det * (a13 * a23 - a12 * a33),
            det * (a12 * a23 - a13 * a22),
        );
        let ey = Vec3::new(ex.y, det * (a11 * a33 - a13 * a13), det * (a13 * a12 - a11 * a23));
        let ez = Vec3::new(ex.z, ey.z, det * (a11 * a22 - a12 * a12));
        Self { ex, ey, ez }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_solve22_matches_inverse() {
        let m = Mat22::new(Vec2::new(4.0, 1.0), Vec2::new(2.0, 3.0));
        let b = Vec2::new(1.0, -2.0);
        let x = m.solve(b);
        let y = m.inverse().transform(b);
        assert_relative_eq!(x.x, y.x, epsilon = 1e-6);
        assert_relative_eq!(x.y, y.y, epsilon = 1e-6);
        let back = m.transform(x);
        assert_relative_eq!(back.x, b.x, epsilon = 1e-5);
        assert_relative_eq!(back.y, b.y, epsilon = 1e-5);
    }

    #[test]
    fn test_singular_matrix_solves_to_zero() {
        let m = Mat22::ZERO;
        assert_eq!(m.solve(Vec2::new(1.0, 1.0)), Vec2::ZERO);
    }

    #[test]
    fn test_symmetric_inverse33() {
        let m = Mat33 {
            ex: Vec3::new(4.0, 1.0, 0.5),
            ey: Vec3::new(1.0, 3.0, 0.2),
            ez: Vec3::new(0.5, 0.2, 2.0),
        };
        let inv = m.symmetric_inverse33();
        let b = Vec3::new(1.0, 2.0, 3.0);
        let x = inv.transform(b);
        let y = m.solve33(b);
        assert_relative_eq!(x.x, y.x, epsilon = 1e-5);
        assert_relative_eq!(x.y, y.y, epsilon = 1e-5);
        assert_relative_eq!(x.z, y.z, epsilon = 1e-5);
    }
}
