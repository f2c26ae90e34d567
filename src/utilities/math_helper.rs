use glam::Vec2;

/// Machine epsilon used by the collision routines when testing for degenerate lengths.
pub const EPSILON: f32 = f32::EPSILON;

/// Clamps a value between a minimum and maximum value.
#[inline(always)]
pub fn clamp<T: PartialOrd>(value: T, min: T, max: T) -> T {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Returns the higher value of the two parameters.
#[inline(always)]
pub fn max<T: PartialOrd>(a: T, b: T) -> T {
    if a > b {
        a
    } else {
        b
    }
}

/// Returns the lower value of the two parameters.
#[inline(always)]
pub fn min<T: PartialOrd>(a: T, b: T) -> T {
    if a < b {
        a
    } else {
        b
    }
}

/// Returns -1 if the value is negative and 1 otherwise.
#[inline(always)]
pub fn binary_sign(x: f32) -> f32 {
    if x < 0.0 {
        -1.0
    } else {
        1.0
    }
}

/// 2D cross product of two vectors. The result is the z component of the 3D cross product.
#[inline(always)]
pub fn cross(a: Vec2, b: Vec2) -> f32 {
    a.x * b.y - a.y * b.x
}

/// Cross product of a vector and a scalar (z axis). Rotates the vector clockwise and scales it.
#[inline(always)]
pub fn cross_vs(a: Vec2, s: f32) -> Vec2 {
    Vec2::new(s * a.y, -s * a.x)
}

/// Cross product of a scalar (z axis) and a vector. Rotates the vector counterclockwise and scales it.
#[inline(always)]
pub fn cross_sv(s: f32, a: Vec2) -> Vec2 {
    Vec2::new(-s * a.y, s * a.x)
}

/// Normalizes the vector in place and returns its original length. Vectors shorter than
/// [`EPSILON`] are left untouched and report a length of zero.
#[inline(always)]
pub fn normalize(v: &mut Vec2) -> f32 {
    let length = v.length();
    if length < EPSILON {
        return 0.0;
    }
    *v *= 1.0 / length;
    length
}

/// Returns true if the value is neither NaN nor infinite.
#[inline(always)]
pub fn is_valid(x: f32) -> bool {
    x.is_finite()
}

/// Returns true if both components are neither NaN nor infinite.
#[inline(always)]
pub fn is_valid_vec2(v: Vec2) -> bool {
    v.x.is_finite() && v.y.is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross_products_agree_with_3d_convention() {
        let a = Vec2::new(1.0, 0.0);
        let b = Vec2::new(0.0, 1.0);
        assert_eq!(cross(a, b), 1.0);
        assert_eq!(cross(b, a), -1.0);
        assert_eq!(cross_sv(1.0, a), b);
        assert_eq!(cross_vs(b, 1.0), a);
    }

    #[test]
    fn test_normalize_short_vector_is_untouched() {
        let mut v = Vec2::new(1e-9, 0.0);
        assert_eq!(normalize(&mut v), 0.0);
        assert_eq!(v, Vec2::new(1e-9, 0.0));

        let mut w = Vec2::new(3.0, 4.0);
        assert_eq!(normalize(&mut w), 5.0);
        assert!((w.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(5.0, 0.0, 1.0), 1.0);
        assert_eq!(clamp(-5.0, 0.0, 1.0), 0.0);
        assert_eq!(clamp(0.5, 0.0, 1.0), 0.5);
    }
}
