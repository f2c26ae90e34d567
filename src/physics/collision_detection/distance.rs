use glam::Vec2;

use crate::physics::body_properties::Transform;
use crate::physics::settings::MAX_POLYGON_VERTICES;
use crate::utilities::math_helper::{cross, EPSILON};

/// Core geometry of a convex shape: a point, a segment or a polygon, plus a skin radius.
#[derive(Debug, Clone, Copy)]
pub struct DistanceProxy<'a> {
    /// Vertices in shape space, counterclockwise for polygons.
    pub vertices: &'a [Vec2],
    pub radius: f32,
}

impl DistanceProxy<'_> {
    /// Largest distance from `center` to any vertex. Bounds how far the core can sweep when
    /// the body rotates about `center`.
    pub fn max_extent_from(&self, center: Vec2) -> f32 {
        self.vertices
            .iter()
            .map(|v| (*v - center).length())
            .fold(0.0, f32::max)
    }
}

/// Closest points between two proxies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceOutput {
    /// Closest point on shape A.
    pub point_a: Vec2,
    /// Closest point on shape B.
    pub point_b: Vec2,
    /// Distance between the points. Zero when the cores overlap.
    pub distance: f32,
}

struct WorldVertices {
    points: [Vec2; MAX_POLYGON_VERTICES],
    count: usize,
}

impl WorldVertices {
    fn new(proxy: &DistanceProxy, xf: &Transform) -> Self {
        let mut points = [Vec2::ZERO; MAX_POLYGON_VERTICES];
        let count = proxy.vertices.len().min(MAX_POLYGON_VERTICES);
        for (dst, src) in points.iter_mut().zip(proxy.vertices) {
            *dst = xf.apply(*src);
        }
        Self { points, count }
    }

    #[inline]
    fn as_slice(&self) -> &[Vec2] {
        &self.points[..self.count]
    }

    /// Segments of the outline. A point has none, a segment has one.
    fn segments(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        let n = self.count;
        let segment_count = match n {
            0 | 1 => 0,
            2 => 1,
            _ => n,
        };
        (0..segment_count).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }

    /// Point strictly inside a counterclockwise polygon.
    fn contains(&self, p: Vec2) -> bool {
        if self.count < 3 {
            return false;
        }
        self.segments().all(|(a, b)| cross(b - a, p - a) > 0.0)
    }
}

#[inline]
fn closest_point_on_segment(p: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let e = b - a;
    let ee = e.dot(e);
    if ee <= EPSILON * EPSILON {
        return a;
    }
    let t = ((p - a).dot(e) / ee).clamp(0.0, 1.0);
    a + t * e
}

fn segment_intersection(a1: Vec2, a2: Vec2, b1: Vec2, b2: Vec2) -> Option<Vec2> {
    let r = a2 - a1;
    let s = b2 - b1;
    let denom = cross(r, s);
    if denom.abs() <= EPSILON {
        return None;
    }
    let t = cross(b1 - a1, s) / denom;
    let u = cross(b1 - a1, r) / denom;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(a1 + t * r)
    } else {
        None
    }
}

/// Computes the closest points between the cores of two convex proxies. When `use_radii` is
/// set the skins are subtracted, clamping at zero.
///
/// Works directly on the handful of vertices a proxy can carry: containment and edge crossing
/// tests detect overlap, otherwise the answer is the closest vertex to feature pair.
pub fn distance(
    proxy_a: &DistanceProxy,
    xf_a: &Transform,
    proxy_b: &DistanceProxy,
    xf_b: &Transform,
    use_radii: bool,
) -> DistanceOutput {
    let va = WorldVertices::new(proxy_a, xf_a);
    let vb = WorldVertices::new(proxy_b, xf_b);

    let mut output = core_distance(&va, &vb);

    if use_radii {
        let (ra, rb) = (proxy_a.radius, proxy_b.radius);
        if output.distance > ra + rb && output.distance > EPSILON {
            // Shapes are still separated once the skins are added: move the points onto the surfaces.
            let normal = (output.point_b - output.point_a) / output.distance;
            output.distance -= ra + rb;
            output.point_a += ra * normal;
            output.point_b -= rb * normal;
        } else {
            let p = 0.5 * (output.point_a + output.point_b);
            output.point_a = p;
            output.point_b = p;
            output.distance = 0.0;
        }
    }
    output
}

fn core_distance(va: &WorldVertices, vb: &WorldVertices) -> DistanceOutput {
    // Containment.
    for &p in va.as_slice() {
        if vb.contains(p) {
            return DistanceOutput { point_a: p, point_b: p, distance: 0.0 };
        }
    }
    for &p in vb.as_slice() {
        if va.contains(p) {
            return DistanceOutput { point_a: p, point_b: p, distance: 0.0 };
        }
    }

    // Crossing edges.
    for (a1, a2) in va.segments() {
        for (b1, b2) in vb.segments() {
            if let Some(p) = segment_intersection(a1, a2, b1, b2) {
                return DistanceOutput { point_a: p, point_b: p, distance: 0.0 };
            }
        }
    }

    // Separated: the minimum is attained at a vertex of one shape against a feature of the other.
    let mut best = DistanceOutput {
        point_a: va.points[0],
        point_b: vb.points[0],
        distance: (vb.points[0] - va.points[0]).length(),
    };
    let mut consider = |point_a: Vec2, point_b: Vec2| {
        let d = (point_b - point_a).length();
        if d < best.distance {
            best = DistanceOutput { point_a, point_b, distance: d };
        }
    };

    for &p in va.as_slice() {
        if vb.count == 1 {
            consider(p, vb.points[0]);
        }
        for (b1, b2) in vb.segments() {
            consider(p, closest_point_on_segment(p, b1, b2));
        }
    }
    for &p in vb.as_slice() {
        if va.count == 1 {
            consider(va.points[0], p);
        }
        for (a1, a2) in va.segments() {
            consider(closest_point_on_segment(p, a1, a2), p);
        }
    }
    best
}

/// Returns true if the two shapes, skins included, overlap.
pub fn test_overlap(
    proxy_a: &DistanceProxy,
    xf_a: &Transform,
    proxy_b: &DistanceProxy,
    xf_b: &Transform,
) -> bool {
    distance(proxy_a, xf_a, proxy_b, xf_b, true).distance < 10.0 * EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::collidables::{CircleShape, ConvexShape, EdgeShape, PolygonShape};
    use approx::assert_relative_eq;

    #[test]
    fn test_point_to_polygon() {
        let circle = CircleShape::new(0.5).unwrap();
        let square = PolygonShape::new_box(1.0, 1.0).unwrap();
        let xf_a = Transform::new(Vec2::new(3.0, 0.0), 0.0);
        let out = distance(
            &circle.distance_proxy(),
            &xf_a,
            &square.distance_proxy(),
            &Transform::IDENTITY,
            false,
        );
        assert_relative_eq!(out.distance, 2.0, epsilon = 1e-6);
        assert_relative_eq!(out.point_b.x, 1.0, epsilon = 1e-6);

        let out = distance(
            &circle.distance_proxy(),
            &xf_a,
            &square.distance_proxy(),
            &Transform::IDENTITY,
            true,
        );
        assert_relative_eq!(out.distance, 2.0 - 0.5 - square.radius(), epsilon = 1e-5);
    }

    #[test]
    fn test_overlapping_polygons_report_zero() {
        let a = PolygonShape::new_box(1.0, 1.0).unwrap();
        let b = PolygonShape::new_box(1.0, 1.0).unwrap();
        let xf_b = Transform::new(Vec2::new(1.5, 0.5), 0.4);
        let out = distance(&a.distance_proxy(), &Transform::IDENTITY, &b.distance_proxy(), &xf_b, false);
        assert_eq!(out.distance, 0.0);
        assert!(test_overlap(&a.distance_proxy(), &Transform::IDENTITY, &b.distance_proxy(), &xf_b));
    }

    #[test]
    fn test_crossing_segments_overlap() {
        let a = EdgeShape::new(Vec2::new(-1.0, 0.0), Vec2::new(1.0, 0.0)).unwrap();
        let b = EdgeShape::new(Vec2::new(0.0, -1.0), Vec2::new(0.0, 1.0)).unwrap();
        let out = distance(&a.distance_proxy(), &Transform::IDENTITY, &b.distance_proxy(), &Transform::IDENTITY, false);
        assert_eq!(out.distance, 0.0);
    }

    #[test]
    fn test_parallel_segments() {
        let a = EdgeShape::new(Vec2::new(-1.0, 0.0), Vec2::new(1.0, 0.0)).unwrap();
        let xf_b = Transform::new(Vec2::new(0.5, 2.0), 0.0);
        let out = distance(&a.distance_proxy(), &Transform::IDENTITY, &a.distance_proxy(), &xf_b, false);
        assert_relative_eq!(out.distance, 2.0, epsilon = 1e-6);
    }
}
