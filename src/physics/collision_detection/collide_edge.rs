use glam::Vec2;

use super::collide_polygon::collide_polygons;
use super::contact_manifold::{ContactId, FeatureType, Manifold, ManifoldType};
use crate::physics::body_properties::Transform;
use crate::physics::collidables::{CircleShape, EdgeShape, PolygonShape};

/// Computes the manifold between a two sided edge and a circle.
pub fn collide_edge_and_circle(
    edge_a: &EdgeShape,
    xf_a: &Transform,
    circle_b: &CircleShape,
    xf_b: &Transform,
) -> Manifold {
    let mut manifold = Manifold::default();

    // Circle center in the edge's frame.
    let q = xf_a.apply_inverse(xf_b.apply(circle_b.position));

    let a = edge_a.vertex1();
    let b = edge_a.vertex2();
    let e = b - a;

    // Barycentric coordinates.
    let u = e.dot(b - q);
    let v = e.dot(q - a);

    let radius = edge_a.radius + circle_b.radius;

    let vertex_hit = |manifold: &mut Manifold, p: Vec2, index: u8| -> bool {
        let d = q - p;
        if d.dot(d) > radius * radius {
            return false;
        }
        manifold.point_count = 1;
        manifold.manifold_type = ManifoldType::Circles;
        manifold.local_normal = Vec2::ZERO;
        manifold.local_point = p;
        manifold.points[0].id = ContactId {
            index_a: index,
            index_b: 0,
            type_a: FeatureType::Vertex,
            type_b: FeatureType::Vertex,
        };
        manifold.points[0].local_point = circle_b.position;
        true
    };

    // Region A.
    if v <= 0.0 {
        vertex_hit(&mut manifold, a, 0);
        return manifold;
    }

    // Region B.
    if u <= 0.0 {
        vertex_hit(&mut manifold, b, 1);
        return manifold;
    }

    // Region AB.
    let den = e.dot(e);
    debug_assert!(den > 0.0);
    let p = (1.0 / den) * (u * a + v * b);
    let d = q - p;
    if d.dot(d) > radius * radius {
        return manifold;
    }

    let mut n = Vec2::new(-e.y, e.x);
    if n.dot(q - a) < 0.0 {
        n = -n;
    }

    manifold.point_count = 1;
    manifold.manifold_type = ManifoldType::FaceA;
    manifold.local_normal = n.normalize_or_zero();
    manifold.local_point = a;
    manifold.points[0].id = ContactId {
        index_a: 0,
        index_b: 0,
        type_a: FeatureType::Face,
        type_b: FeatureType::Vertex,
    };
    manifold.points[0].local_point = circle_b.position;
    manifold
}

/// Computes the manifold between a two sided edge and a polygon by treating the edge as a
/// degenerate two vertex polygon.
pub fn collide_edge_and_polygon(
    edge_a: &EdgeShape,
    xf_a: &Transform,
    polygon_b: &PolygonShape,
    xf_b: &Transform,
) -> Manifold {
    let segment = PolygonShape::from_segment(edge_a.vertex1(), edge_a.vertex2(), edge_a.radius);
    collide_polygons(&segment, xf_a, polygon_b, xf_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::collision_detection::WorldManifold;
    use approx::assert_relative_eq;

    #[test]
    fn test_circle_on_edge_interior() {
        let edge = EdgeShape::new(Vec2::new(-10.0, 0.0), Vec2::new(10.0, 0.0)).unwrap();
        let ball = CircleShape::new(0.5).unwrap();
        let xf_b = Transform::new(Vec2::new(1.0, 0.5), 0.0);
        let manifold = collide_edge_and_circle(&edge, &Transform::IDENTITY, &ball, &xf_b);
        assert_eq!(manifold.point_count, 1);
        assert_eq!(manifold.manifold_type, ManifoldType::FaceA);
        assert_relative_eq!(manifold.local_normal.y, 1.0);

        // Same contact from underneath flips the normal.
        let below = Transform::new(Vec2::new(1.0, -0.5), 0.0);
        let manifold = collide_edge_and_circle(&edge, &Transform::IDENTITY, &ball, &below);
        assert_relative_eq!(manifold.local_normal.y, -1.0);
    }

    #[test]
    fn test_circle_past_edge_end_uses_vertex() {
        let edge = EdgeShape::new(Vec2::new(-1.0, 0.0), Vec2::new(1.0, 0.0)).unwrap();
        let ball = CircleShape::new(0.5).unwrap();
        let xf_b = Transform::new(Vec2::new(1.3, 0.1), 0.0);
        let manifold = collide_edge_and_circle(&edge, &Transform::IDENTITY, &ball, &xf_b);
        assert_eq!(manifold.point_count, 1);
        assert_eq!(manifold.manifold_type, ManifoldType::Circles);
        assert_eq!(manifold.points[0].id.index_a, 1);
    }

    #[test]
    fn test_box_on_edge() {
        let edge = EdgeShape::new(Vec2::new(-10.0, 0.0), Vec2::new(10.0, 0.0)).unwrap();
        let crate_box = PolygonShape::new_box(0.5, 0.5).unwrap();
        let xf_b = Transform::new(Vec2::new(0.0, 0.5), 0.0);
        let manifold = collide_edge_and_polygon(&edge, &Transform::IDENTITY, &crate_box, &xf_b);
        assert_eq!(manifold.point_count, 2);
        let world = WorldManifold::new(&manifold, &Transform::IDENTITY, edge.radius, &xf_b, crate_box.radius);
        assert_relative_eq!(world.normal.y, 1.0, epsilon = 1e-5);
    }
}
