use glam::Vec2;

use super::contact_manifold::{ContactId, FeatureType, Manifold, ManifoldType};
use crate::physics::body_properties::Transform;
use crate::physics::collidables::PolygonShape;
use crate::physics::settings::LINEAR_SLOP;
use crate::utilities::math_helper::cross_vs;

/// Vertex produced while clipping the incident edge.
#[derive(Debug, Clone, Copy, Default)]
struct ClipVertex {
    v: Vec2,
    id: ContactId,
}

/// Finds the edge normal of `poly1` with the largest separation from `poly2`.
fn find_max_separation(
    poly1: &PolygonShape,
    xf1: &Transform,
    poly2: &PolygonShape,
    xf2: &Transform,
) -> (usize, f32) {
    let xf = Transform::mul_inverse(xf2, xf1);

    let mut best_index = 0;
    let mut max_separation = f32::MIN;
    for (i, (n1, v1)) in poly1.normals().iter().zip(poly1.vertices()).enumerate() {
        // Poly1 normal and vertex in poly2's frame.
        let n = xf.q.apply(*n1);
        let v1 = xf.apply(*v1);

        let si = poly2
            .vertices()
            .iter()
            .map(|v2| n.dot(*v2 - v1))
            .fold(f32::MAX, f32::min);
        if si > max_separation {
            max_separation = si;
            best_index = i;
        }
    }
    (best_index, max_separation)
}

fn find_incident_edge(
    poly1: &PolygonShape,
    xf1: &Transform,
    edge1: usize,
    poly2: &PolygonShape,
    xf2: &Transform,
) -> [ClipVertex; 2] {
    // Reference normal in poly2's frame.
    let normal1 = xf2.q.apply_inverse(xf1.q.apply(poly1.normals()[edge1]));

    // Incident edge is the most anti-parallel face on poly2.
    let mut index = 0;
    let mut min_dot = f32::MAX;
    for (i, n2) in poly2.normals().iter().enumerate() {
        let dot = normal1.dot(*n2);
        if dot < min_dot {
            min_dot = dot;
            index = i;
        }
    }

    let i1 = index;
    let i2 = (i1 + 1) % poly2.vertex_count();
    let make = |i: usize| ClipVertex {
        v: xf2.apply(poly2.vertices()[i]),
        id: ContactId {
            index_a: edge1 as u8,
            index_b: i as u8,
            type_a: FeatureType::Face,
            type_b: FeatureType::Vertex,
        },
    };
    [make(i1), make(i2)]
}

/// Sutherland-Hodgman clipping of a segment against a half plane.
fn clip_segment_to_line(
    v_in: &[ClipVertex; 2],
    normal: Vec2,
    offset: f32,
    vertex_index_a: usize,
) -> ([ClipVertex; 2], usize) {
    let mut v_out = [ClipVertex::default(); 2];
    let mut count = 0;

    let distance0 = normal.dot(v_in[0].v) - offset;
    let distance1 = normal.dot(v_in[1].v) - offset;

    if distance0 <= 0.0 {
        v_out[count] = v_in[0];
        count += 1;
    }
    if distance1 <= 0.0 {
        v_out[count] = v_in[1];
        count += 1;
    }

    // Points on opposite sides: add the intersection.
    if distance0 * distance1 < 0.0 && count < 2 {
        let interp = distance0 / (distance0 - distance1);
        v_out[count] = ClipVertex {
            v: v_in[0].v + interp * (v_in[1].v - v_in[0].v),
            id: ContactId {
                index_a: vertex_index_a as u8,
                index_b: v_in[0].id.index_b,
                type_a: FeatureType::Vertex,
                type_b: FeatureType::Face,
            },
        };
        count += 1;
    }
    (v_out, count)
}

/// Computes the manifold between two convex polygons.
///
/// Finds the axis of least penetration on either polygon, picks it as the reference face,
/// then clips the most anti-parallel face of the other polygon against the reference face's
/// side planes.
pub fn collide_polygons(
    poly_a: &PolygonShape,
    xf_a: &Transform,
    poly_b: &PolygonShape,
    xf_b: &Transform,
) -> Manifold {
    let mut manifold = Manifold::default();
    let total_radius = poly_a.radius + poly_b.radius;

    let (edge_a, separation_a) = find_max_separation(poly_a, xf_a, poly_b, xf_b);
    if separation_a > total_radius {
        return manifold;
    }
    let (edge_b, separation_b) = find_max_separation(poly_b, xf_b, poly_a, xf_a);
    if separation_b > total_radius {
        return manifold;
    }

    // Prefer A as the reference so manifolds stay stable when the separations tie.
    let tolerance = 0.1 * LINEAR_SLOP;
    let (poly1, xf1, poly2, xf2, edge1, flip) = if separation_b > separation_a + tolerance {
        manifold.manifold_type = ManifoldType::FaceB;
        (poly_b, xf_b, poly_a, xf_a, edge_b, true)
    } else {
        manifold.manifold_type = ManifoldType::FaceA;
        (poly_a, xf_a, poly_b, xf_b, edge_a, false)
    };

    let incident_edge = find_incident_edge(poly1, xf1, edge1, poly2, xf2);

    let count1 = poly1.vertex_count();
    let iv1 = edge1;
    let iv2 = (edge1 + 1) % count1;
    let mut v11 = poly1.vertices()[iv1];
    let mut v12 = poly1.vertices()[iv2];

    let local_tangent = (v12 - v11).normalize_or_zero();
    let local_normal = cross_vs(local_tangent, 1.0);
    let plane_point = 0.5 * (v11 + v12);

    let tangent = xf1.q.apply(local_tangent);
    let normal = cross_vs(tangent, 1.0);

    v11 = xf1.apply(v11);
    v12 = xf1.apply(v12);

    // Face offset and side plane offsets, extended by the skin.
    let front_offset = normal.dot(v11);
    let side_offset1 = -tangent.dot(v11) + total_radius;
    let side_offset2 = tangent.dot(v12) + total_radius;

    let (clip_points1, np) = clip_segment_to_line(&incident_edge, -tangent, side_offset1, iv1);
    if np < 2 {
        return manifold;
    }
    let (clip_points2, np) = clip_segment_to_line(&clip_points1, tangent, side_offset2, iv2);
    if np < 2 {
        return manifold;
    }

    manifold.local_normal = local_normal;
    manifold.local_point = plane_point;

    let mut point_count = 0;
    for clip in clip_points2.iter() {
        let separation = normal.dot(clip.v) - front_offset;
        if separation <= total_radius {
            let point = &mut manifold.points[point_count];
            point.local_point = xf2.apply_inverse(clip.v);
            point.id = if flip { clip.id.flipped() } else { clip.id };
            point_count += 1;
        }
    }
    manifold.point_count = point_count;
    manifold
}
