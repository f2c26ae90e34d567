use super::contact_manifold::{ContactId, Manifold, ManifoldType};
use crate::physics::body_properties::Transform;
use crate::physics::collidables::{CircleShape, PolygonShape};
use crate::utilities::math_helper::EPSILON;

/// Computes the manifold between two circles.
pub fn collide_circles(
    circle_a: &CircleShape,
    xf_a: &Transform,
    circle_b: &CircleShape,
    xf_b: &Transform,
) -> Manifold {
    let mut manifold = Manifold::default();

    let p_a = xf_a.apply(circle_a.position);
    let p_b = xf_b.apply(circle_b.position);
    let distance_squared = (p_b - p_a).length_squared();
    let radius = circle_a.radius + circle_b.radius;
    if distance_squared > radius * radius {
        return manifold;
    }

    manifold.manifold_type = ManifoldType::Circles;
    manifold.local_point = circle_a.position;
    manifold.point_count = 1;
    manifold.points[0].local_point = circle_b.position;
    manifold.points[0].id = ContactId::default();
    manifold
}

/// Computes the manifold between a polygon and a circle.
pub fn collide_polygon_and_circle(
    polygon_a: &PolygonShape,
    xf_a: &Transform,
    circle_b: &CircleShape,
    xf_b: &Transform,
) -> Manifold {
    let mut manifold = Manifold::default();

    // Circle center in the polygon's frame.
    let c = xf_b.apply(circle_b.position);
    let c_local = xf_a.apply_inverse(c);

    // Find the face of minimum penetration.
    let radius = polygon_a.radius + circle_b.radius;
    let vertices = polygon_a.vertices();
    let normals = polygon_a.normals();
    let count = vertices.len();
    let mut normal_index = 0;
    let mut separation = f32::MIN;
    for i in 0..count {
        let s = normals[i].dot(c_local - vertices[i]);
        if s > radius {
            return manifold;
        }
        if s > separation {
            separation = s;
            normal_index = i;
        }
    }

    let v1 = vertices[normal_index];
    let v2 = vertices[(normal_index + 1) % count];

    // Center inside the polygon.
    if separation < EPSILON {
        manifold.point_count = 1;
        manifold.manifold_type = ManifoldType::FaceA;
        manifold.local_normal = normals[normal_index];
        manifold.local_point = 0.5 * (v1 + v2);
        manifold.points[0].local_point = circle_b.position;
        manifold.points[0].id = ContactId::default();
        return manifold;
    }

    // Voronoi regions of the reference face.
    let u1 = (c_local - v1).dot(v2 - v1);
    let u2 = (c_local - v2).dot(v1 - v2);
    if u1 <= 0.0 {
        if (c_local - v1).length_squared() > radius * radius {
            return manifold;
        }
        manifold.local_normal = (c_local - v1).normalize_or_zero();
        manifold.local_point = v1;
    } else if u2 <= 0.0 {
        if (c_local - v2).length_squared() > radius * radius {
            return manifold;
        }
        manifold.local_normal = (c_local - v2).normalize_or_zero();
        manifold.local_point = v2;
    } else {
        let face_center = 0.5 * (v1 + v2);
        let s = (c_local - face_center).dot(normals[normal_index]);
        if s > radius {
            return manifold;
        }
        manifold.local_normal = normals[normal_index];
        manifold.local_point = face_center;
    }

    manifold.point_count = 1;
    manifold.manifold_type = ManifoldType::FaceA;
    manifold.points[0].local_point = circle_b.position;
    manifold.points[0].id = ContactId::default();
    manifold
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::collision_detection::WorldManifold;
    use approx::assert_relative_eq;
    use glam::Vec2;

    #[test]
    fn test_overlapping_circles_produce_one_point() {
        let a = CircleShape::new(1.0).unwrap();
        let b = CircleShape::new(1.0).unwrap();
        let xf_a = Transform::IDENTITY;
        let xf_b = Transform::new(Vec2::new(1.5, 0.0), 0.0);
        let manifold = collide_circles(&a, &xf_a, &b, &xf_b);
        assert_eq!(manifold.point_count, 1);
        let world = WorldManifold::new(&manifold, &xf_a, 1.0, &xf_b, 1.0);
        assert_relative_eq!(world.normal.x, 1.0);
        assert_relative_eq!(world.separations[0], -0.5);
        assert_relative_eq!(world.points[0].x, 0.75);

        let far = Transform::new(Vec2::new(2.5, 0.0), 0.0);
        assert_eq!(collide_circles(&a, &xf_a, &b, &far).point_count, 0);
    }

    #[test]
    fn test_circle_resting_on_box_face() {
        let ground = PolygonShape::new_box(5.0, 0.5).unwrap();
        let ball = CircleShape::new(0.5).unwrap();
        let xf_a = Transform::IDENTITY;
        let xf_b = Transform::new(Vec2::new(0.3, 0.99), 0.0);
        let manifold = collide_polygon_and_circle(&ground, &xf_a, &ball, &xf_b);
        assert_eq!(manifold.point_count, 1);
        assert_eq!(manifold.manifold_type, ManifoldType::FaceA);
        assert_eq!(manifold.local_normal, Vec2::Y);
        let world = WorldManifold::new(&manifold, &xf_a, ground.radius, &xf_b, 0.5);
        assert_relative_eq!(world.separations[0], 0.99 - 0.5 - 0.5 - ground.radius, epsilon = 1e-5);
    }

    #[test]
    fn test_circle_near_box_corner_uses_vertex_normal() {
        let square = PolygonShape::new_box(1.0, 1.0).unwrap();
        let ball = CircleShape::new(0.5).unwrap();
        let xf_b = Transform::new(Vec2::new(1.3, 1.3), 0.0);
        let manifold = collide_polygon_and_circle(&square, &Transform::IDENTITY, &ball, &xf_b);
        assert_eq!(manifold.point_count, 1);
        assert_relative_eq!(manifold.local_normal.x, manifold.local_normal.y, epsilon = 1e-6);
        assert_eq!(manifold.local_point, Vec2::new(1.0, 1.0));
    }
}
