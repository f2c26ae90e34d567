use glam::Vec2;

use super::ray::{RayCastInput, RayCastOutput};
use super::shape::ConvexShape;
use crate::physics::body_properties::{MassData, Transform};
use crate::physics::collision_detection::DistanceProxy;
use crate::physics::error::ShapeError;
use crate::physics::settings::{LINEAR_SLOP, MAX_POLYGON_VERTICES, POLYGON_RADIUS};
use crate::utilities::math_helper::{cross, cross_vs, EPSILON};
use crate::utilities::{BoundingBox, Rot};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Convex polygon with counterclockwise winding. Carries a skin of [`POLYGON_RADIUS`] so that
/// resting polygons keep a small gap between their cores.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PolygonShape {
    pub(crate) vertices: Vec<Vec2>,
    pub(crate) normals: Vec<Vec2>,
    pub(crate) centroid: Vec2,
    pub(crate) radius: f32,
}

impl PolygonShape {
    /// Builds the convex hull of `points`. Points closer than half the linear slop are welded.
    pub fn new(points: &[Vec2]) -> Result<Self, ShapeError> {
        if points.len() > MAX_POLYGON_VERTICES {
            return Err(ShapeError::TooManyVertices {
                count: points.len(),
                max: MAX_POLYGON_VERTICES,
            });
        }

        let weld_distance_squared = (0.5 * LINEAR_SLOP) * (0.5 * LINEAR_SLOP);
        let mut unique: Vec<Vec2> = Vec::with_capacity(points.len());
        for &p in points {
            if !p.is_finite() {
                return Err(ShapeError::InvalidDimension(f32::NAN));
            }
            if unique
                .iter()
                .all(|q| (p - *q).length_squared() >= weld_distance_squared)
            {
                unique.push(p);
            }
        }
        let hull = gift_wrap(&unique);
        if hull.len() < 3 {
            return Err(ShapeError::DegeneratePolygon(hull.len()));
        }
        Self::from_hull(hull)
    }

    /// Creates an axis aligned box centered on the body origin.
    pub fn new_box(half_width: f32, half_height: f32) -> Result<Self, ShapeError> {
        Self::new_oriented_box(half_width, half_height, Vec2::ZERO, 0.0)
    }

    /// Creates a box centered at `center` and rotated by `angle` in body space.
    pub fn new_oriented_box(
        half_width: f32,
        half_height: f32,
        center: Vec2,
        angle: f32,
    ) -> Result<Self, ShapeError> {
        for extent in [half_width, half_height] {
            if !extent.is_finite() || extent <= 0.0 {
                return Err(ShapeError::InvalidDimension(extent));
            }
        }
        let q = Rot::from_angle(angle);
        let corners = [
            Vec2::new(-half_width, -half_height),
            Vec2::new(half_width, -half_height),
            Vec2::new(half_width, half_height),
            Vec2::new(-half_width, half_height),
        ];
        let normals = [Vec2::NEG_Y, Vec2::X, Vec2::Y, Vec2::NEG_X];
        Ok(Self {
            vertices: corners.iter().map(|&v| q.apply(v) + center).collect(),
            normals: normals.iter().map(|&n| q.apply(n)).collect(),
            centroid: center,
            radius: POLYGON_RADIUS,
        })
    }

    /// Two sided polygon standing in for an edge so it can reuse the polygon clipper.
    pub(crate) fn from_segment(v1: Vec2, v2: Vec2, radius: f32) -> Self {
        let mut normal = cross_vs(v2 - v1, 1.0);
        normal = normal.normalize_or_zero();
        Self {
            vertices: vec![v1, v2],
            normals: vec![normal, -normal],
            centroid: 0.5 * (v1 + v2),
            radius,
        }
    }

    fn from_hull(vertices: Vec<Vec2>) -> Result<Self, ShapeError> {
        let count = vertices.len();
        let mut normals = Vec::with_capacity(count);
        for i in 0..count {
            let edge = vertices[(i + 1) % count] - vertices[i];
            if edge.length_squared() <= EPSILON * EPSILON {
                return Err(ShapeError::DegeneratePolygon(count));
            }
            normals.push(cross_vs(edge, 1.0).normalize());
        }
        let centroid = compute_centroid(&vertices);
        Ok(Self {
            vertices,
            normals,
            centroid,
            radius: POLYGON_RADIUS,
        })
    }

    #[inline]
    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    #[inline]
    pub fn normals(&self) -> &[Vec2] {
        &self.normals
    }

    #[inline]
    pub fn centroid(&self) -> Vec2 {
        self.centroid
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }
}

/// Gift wrapping hull. Returns the hull in counterclockwise order, or fewer than three points
/// when the input is collinear.
fn gift_wrap(points: &[Vec2]) -> Vec<Vec2> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    // Rightmost point, lowest y on ties, is always on the hull.
    let mut i0 = 0;
    let mut x0 = points[0].x;
    for (i, p) in points.iter().enumerate().skip(1) {
        if p.x > x0 || (p.x == x0 && p.y < points[i0].y) {
            i0 = i;
            x0 = p.x;
        }
    }

    let mut hull: Vec<usize> = Vec::with_capacity(n);
    let mut ih = i0;
    loop {
        if hull.len() > n {
            // Numerical trouble; bail out with what we have.
            return Vec::new();
        }
        hull.push(ih);

        let mut ie = 0;
        for j in 1..n {
            if ie == ih {
                ie = j;
                continue;
            }
            let r = points[ie] - points[ih];
            let v = points[j] - points[ih];
            let c = cross(r, v);
            if c < 0.0 {
                ie = j;
            }
            // Collinear: keep the farthest point.
            if c == 0.0 && v.length_squared() > r.length_squared() {
                ie = j;
            }
        }

        ih = ie;
        if ie == i0 {
            break;
        }
    }

    let hull: Vec<Vec2> = hull.into_iter().map(|i| points[i]).collect();
    let area2: f32 = (0..hull.len())
        .map(|i| cross(hull[i], hull[(i + 1) % hull.len()]))
        .sum();
    if area2.abs() <= EPSILON {
        return Vec::new();
    }
    hull
}

fn compute_centroid(vertices: &[Vec2]) -> Vec2 {
    let count = vertices.len();
    let origin = vertices[0];
    let mut center = Vec2::ZERO;
    let mut area = 0.0;
    const INV3: f32 = 1.0 / 3.0;
    for i in 0..count {
        let e1 = vertices[i] - origin;
        let e2 = vertices[(i + 1) % count] - origin;
        let triangle_area = 0.5 * cross(e1, e2);
        area += triangle_area;
        center += triangle_area * INV3 * (e1 + e2);
    }
    debug_assert!(area > EPSILON);
    center / area + origin
}

impl ConvexShape for PolygonShape {
    fn radius(&self) -> f32 {
        self.radius
    }

    fn compute_bounds(&self, transform: &Transform) -> BoundingBox {
        let mut lower = transform.apply(self.vertices[0]);
        let mut upper = lower;
        for &v in &self.vertices[1..] {
            let p = transform.apply(v);
            lower = lower.min(p);
            upper = upper.max(p);
        }
        BoundingBox::new(lower, upper).expanded(self.radius)
    }

    fn compute_mass(&self, density: f32) -> MassData {
        // Triangle fan about the first vertex keeps the integrals well conditioned.
        let count = self.vertices.len();
        let s = self.vertices[0];
        const INV3: f32 = 1.0 / 3.0;

        let mut center = Vec2::ZERO;
        let mut area = 0.0;
        let mut inertia = 0.0;
        for i in 0..count {
            let e1 = self.vertices[i] - s;
            let e2 = self.vertices[(i + 1) % count] - s;
            let d = cross(e1, e2);
            let triangle_area = 0.5 * d;
            area += triangle_area;
            center += triangle_area * INV3 * (e1 + e2);

            let int_x2 = e1.x * e1.x + e2.x * e1.x + e2.x * e2.x;
            let int_y2 = e1.y * e1.y + e2.y * e1.y + e2.y * e2.y;
            inertia += (0.25 * INV3 * d) * (int_x2 + int_y2);
        }

        let mass = density * area;
        center /= area;
        let world_center = center + s;
        // Inertia relative to the reference vertex, shifted to the body origin.
        let inertia = density * inertia + mass * (world_center.dot(world_center) - center.dot(center));
        MassData {
            mass,
            center: world_center,
            inertia,
        }
    }

    fn test_point(&self, transform: &Transform, point: Vec2) -> bool {
        let local = transform.apply_inverse(point);
        self.vertices
            .iter()
            .zip(&self.normals)
            .all(|(v, n)| n.dot(local - *v) <= 0.0)
    }

    fn ray_cast(&self, input: &RayCastInput, transform: &Transform) -> Option<RayCastOutput> {
        let p1 = transform.apply_inverse(input.p1);
        let p2 = transform.apply_inverse(input.p2);
        let d = p2 - p1;

        let mut lower = 0.0f32;
        let mut upper = input.max_fraction;
        let mut index = None;

        for (i, (v, n)) in self.vertices.iter().zip(&self.normals).enumerate() {
            // p = p1 + t * d, plane: dot(n, p - v) = 0
            let numerator = n.dot(*v - p1);
            let denominator = n.dot(d);
            if denominator == 0.0 {
                if numerator < 0.0 {
                    return None;
                }
            } else if denominator < 0.0 && numerator < lower * denominator {
                // Entering this half space.
                lower = numerator / denominator;
                index = Some(i);
            } else if denominator > 0.0 && numerator < upper * denominator {
                // Leaving this half space.
                upper = numerator / denominator;
            }
            if upper < lower {
                return None;
            }
        }

        index.map(|i| RayCastOutput {
            normal: transform.q.apply(self.normals[i]),
            fraction: lower,
        })
    }

    fn distance_proxy(&self) -> DistanceProxy<'_> {
        DistanceProxy {
            vertices: &self.vertices,
            radius: self.radius,
        }
    }
}
