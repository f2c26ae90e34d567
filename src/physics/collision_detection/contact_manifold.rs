use glam::Vec2;

use crate::physics::body_properties::Transform;
use crate::physics::settings::MAX_MANIFOLD_POINTS;
use crate::utilities::math_helper::EPSILON;

/// Whether a contact feature is a vertex or a face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FeatureType {
    #[default]
    Vertex,
    Face,
}

/// Identifies the pair of features that produced a manifold point. Matching ids across steps
/// is what lets accumulated impulses carry over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ContactId {
    pub index_a: u8,
    pub index_b: u8,
    pub type_a: FeatureType,
    pub type_b: FeatureType,
}

impl ContactId {
    /// Swaps the roles of shape A and shape B.
    #[inline]
    pub fn flipped(self) -> Self {
        Self {
            index_a: self.index_b,
            index_b: self.index_a,
            type_a: self.type_b,
            type_b: self.type_a,
        }
    }
}

/// A manifold point. Its meaning depends on the manifold type:
/// the center of circle B for `Circles`, the clip point on B for `FaceA`, the clip point on A
/// for `FaceB`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ManifoldPoint {
    /// Point in the local frame of the body that does not own the reference face.
    pub local_point: Vec2,
    /// Accumulated non-penetration impulse.
    pub normal_impulse: f32,
    /// Accumulated friction impulse.
    pub tangent_impulse: f32,
    pub id: ContactId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ManifoldType {
    #[default]
    Circles,
    FaceA,
    FaceB,
}

/// Contact points for a touching pair, stored in body local coordinates so they survive small
/// motions of either body.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Manifold {
    pub points: [ManifoldPoint; MAX_MANIFOLD_POINTS],
    /// Unused for `Circles`; the face normal on the reference shape otherwise.
    pub local_normal: Vec2,
    /// Circle A center for `Circles`; a point on the reference face otherwise.
    pub local_point: Vec2,
    pub manifold_type: ManifoldType,
    pub point_count: usize,
}

impl Manifold {
    #[inline]
    pub fn points(&self) -> &[ManifoldPoint] {
        &self.points[..self.point_count]
    }
}

/// Manifold expressed in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WorldManifold {
    /// Points from shape A to shape B.
    pub normal: Vec2,
    /// Midpoints between the two surfaces.
    pub points: [Vec2; MAX_MANIFOLD_POINTS],
    /// Negative when overlapping.
    pub separations: [f32; MAX_MANIFOLD_POINTS],
}

impl WorldManifold {
    /// Evaluates the manifold for the given transforms and skin radii.
    pub fn new(
        manifold: &Manifold,
        xf_a: &Transform,
        radius_a: f32,
        xf_b: &Transform,
        radius_b: f32,
    ) -> Self {
        let mut world = WorldManifold::default();
        if manifold.point_count == 0 {
            return world;
        }

        match manifold.manifold_type {
            ManifoldType::Circles => {
                let mut normal = Vec2::X;
                let point_a = xf_a.apply(manifold.local_point);
                let point_b = xf_b.apply(manifold.points[0].local_point);
                if (point_b - point_a).length_squared() > EPSILON * EPSILON {
                    normal = (point_b - point_a).normalize();
                }
                let c_a = point_a + radius_a * normal;
                let c_b = point_b - radius_b * normal;
                world.normal = normal;
                world.points[0] = 0.5 * (c_a + c_b);
                world.separations[0] = (c_b - c_a).dot(normal);
            }
            ManifoldType::FaceA => {
                let normal = xf_a.q.apply(manifold.local_normal);
                let plane_point = xf_a.apply(manifold.local_point);
                for (i, point) in manifold.points().iter().enumerate() {
                    let clip_point = xf_b.apply(point.local_point);
                    let c_a = clip_point + (radius_a - (clip_point - plane_point).dot(normal)) * normal;
                    let c_b = clip_point - radius_b * normal;
                    world.points[i] = 0.5 * (c_a + c_b);
                    world.separations[i] = (c_b - c_a).dot(normal);
                }
                world.normal = normal;
            }
            ManifoldType::FaceB => {
                let normal = xf_b.q.apply(manifold.local_normal);
                let plane_point = xf_b.apply(manifold.local_point);
                for (i, point) in manifold.points().iter().enumerate() {
                    let clip_point = xf_a.apply(point.local_point);
                    let c_b = clip_point + (radius_b - (clip_point - plane_point).dot(normal)) * normal;
                    let c_a = clip_point - radius_a * normal;
                    world.points[i] = 0.5 * (c_a + c_b);
                    world.separations[i] = (c_a - c_b).dot(normal);
                }
                // Keep the normal pointing from A to B.
                world.normal = -normal;
            }
        }
        world
    }
}
