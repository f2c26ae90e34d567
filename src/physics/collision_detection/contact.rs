use super::collide_circle::{collide_circles, collide_polygon_and_circle};
use super::collide_edge::{collide_edge_and_circle, collide_edge_and_polygon};
use super::collide_polygon::collide_polygons;
use super::contact_manifold::{Manifold, WorldManifold};
use super::distance::test_overlap;
use crate::physics::body_properties::Transform;
use crate::physics::collidables::{ConvexShape, Shape, ShapeType};
use crate::physics::fixture::Fixture;
use crate::physics::handles::{BodyHandle, FixtureHandle};

/// Friction mixing: geometric mean, so a frictionless surface stays frictionless.
#[inline]
pub fn mix_friction(friction_a: f32, friction_b: f32) -> f32 {
    (friction_a * friction_b).sqrt()
}

/// Restitution mixing: the bouncier fixture wins.
#[inline]
pub fn mix_restitution(restitution_a: f32, restitution_b: f32) -> f32 {
    restitution_a.max(restitution_b)
}

/// Decides the fixture order for a shape pair. Returns `Some(true)` when the pair must be
/// swapped so the narrow phase sees a supported ordering, and `None` for pairs that never
/// collide (two edges).
pub(crate) fn pair_order(a: ShapeType, b: ShapeType) -> Option<bool> {
    use ShapeType::*;
    match (a, b) {
        (Circle, Circle) | (Polygon, Circle) | (Polygon, Polygon) | (Edge, Circle) | (Edge, Polygon) => {
            Some(false)
        }
        (Circle, Polygon) | (Circle, Edge) | (Polygon, Edge) => Some(true),
        (Edge, Edge) => None,
    }
}

/// Runs the narrow phase for an ordered shape pair.
pub(crate) fn evaluate(shape_a: &Shape, xf_a: &Transform, shape_b: &Shape, xf_b: &Transform) -> Manifold {
    match (shape_a, shape_b) {
        (Shape::Circle(a), Shape::Circle(b)) => collide_circles(a, xf_a, b, xf_b),
        (Shape::Polygon(a), Shape::Circle(b)) => collide_polygon_and_circle(a, xf_a, b, xf_b),
        (Shape::Polygon(a), Shape::Polygon(b)) => collide_polygons(a, xf_a, b, xf_b),
        (Shape::Edge(a), Shape::Circle(b)) => collide_edge_and_circle(a, xf_a, b, xf_b),
        (Shape::Edge(a), Shape::Polygon(b)) => collide_edge_and_polygon(a, xf_a, b, xf_b),
        _ => {
            debug_assert!(false, "unordered shape pair reached the narrow phase");
            Manifold::default()
        }
    }
}

/// Outcome of refreshing a contact's manifold.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ContactUpdate {
    pub was_touching: bool,
    pub touching: bool,
    pub sensor: bool,
    pub old_manifold: Manifold,
}

/// A persistent pairing of two fixture children whose broad-phase bounds overlap.
///
/// Contacts exist as long as the fat bounds overlap; they only take part in solving while
/// touching, enabled and not involving a sensor.
#[derive(Debug, Clone)]
pub struct Contact {
    pub(crate) fixture_a: FixtureHandle,
    pub(crate) fixture_b: FixtureHandle,
    pub(crate) child_a: usize,
    pub(crate) child_b: usize,
    pub(crate) body_a: BodyHandle,
    pub(crate) body_b: BodyHandle,

    pub(crate) manifold: Manifold,

    pub(crate) touching: bool,
    /// Reset to true on every update; pre-solve may clear it for one step.
    pub(crate) enabled: bool,
    /// The pair must be rerun through filtering before the next update.
    pub(crate) filter_flag: bool,
    pub(crate) island_flag: bool,
    /// `toi` holds a valid cached time of impact.
    pub(crate) toi_flag: bool,
    pub(crate) toi: f32,
    /// Time of impact events this contact took part in during the current step.
    pub(crate) toi_count: u32,

    pub(crate) friction: f32,
    pub(crate) restitution: f32,
    pub(crate) tangent_speed: f32,
}

impl Contact {
    pub(crate) fn new(
        fixture_a: FixtureHandle,
        child_a: usize,
        a: &Fixture,
        fixture_b: FixtureHandle,
        child_b: usize,
        b: &Fixture,
    ) -> Self {
        Self {
            fixture_a,
            fixture_b,
            child_a,
            child_b,
            body_a: a.body,
            body_b: b.body,
            manifold: Manifold::default(),
            touching: false,
            enabled: true,
            filter_flag: false,
            island_flag: false,
            toi_flag: false,
            toi: 1.0,
            toi_count: 0,
            friction: mix_friction(a.friction, b.friction),
            restitution: mix_restitution(a.restitution, b.restitution),
            tangent_speed: 0.0,
        }
    }

    #[inline]
    pub fn fixture_a(&self) -> FixtureHandle {
        self.fixture_a
    }

    #[inline]
    pub fn fixture_b(&self) -> FixtureHandle {
        self.fixture_b
    }

    #[inline]
    pub fn child_index_a(&self) -> usize {
        self.child_a
    }

    #[inline]
    pub fn child_index_b(&self) -> usize {
        self.child_b
    }

    #[inline]
    pub fn body_a(&self) -> BodyHandle {
        self.body_a
    }

    #[inline]
    pub fn body_b(&self) -> BodyHandle {
        self.body_b
    }

    /// The manifold in body local coordinates.
    #[inline]
    pub fn manifold(&self) -> &Manifold {
        &self.manifold
    }

    /// Evaluates the manifold in world coordinates for the given body transforms.
    pub fn world_manifold(&self, xf_a: &Transform, radius_a: f32, xf_b: &Transform, radius_b: f32) -> WorldManifold {
        WorldManifold::new(&self.manifold, xf_a, radius_a, xf_b, radius_b)
    }

    #[inline]
    pub fn is_touching(&self) -> bool {
        self.touching
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enables or disables the contact for the current step. Every update re-enables it; a
    /// [`ContactListener::pre_solve`](super::ContactListener::pre_solve) returning false disables it.
    pub fn set_enabled(&mut self, flag: bool) {
        self.enabled = flag;
    }

    #[inline]
    pub fn friction(&self) -> f32 {
        self.friction
    }

    /// Overrides the mixed friction. Persists until the contact is destroyed.
    pub fn set_friction(&mut self, friction: f32) {
        self.friction = friction;
    }

    pub fn reset_friction(&mut self, fixture_a: &Fixture, fixture_b: &Fixture) {
        self.friction = mix_friction(fixture_a.friction, fixture_b.friction);
    }

    #[inline]
    pub fn restitution(&self) -> f32 {
        self.restitution
    }

    pub fn set_restitution(&mut self, restitution: f32) {
        self.restitution = restitution;
    }

    pub fn reset_restitution(&mut self, fixture_a: &Fixture, fixture_b: &Fixture) {
        self.restitution = mix_restitution(fixture_a.restitution, fixture_b.restitution);
    }

    /// Target surface speed along the tangent, for conveyor belts.
    #[inline]
    pub fn tangent_speed(&self) -> f32 {
        self.tangent_speed
    }

    pub fn set_tangent_speed(&mut self, speed: f32) {
        self.tangent_speed = speed;
    }

    /// Time of impact events this contact took part in during the last step.
    #[inline]
    pub fn toi_count(&self) -> u32 {
        self.toi_count
    }

    /// Flags the contact for refiltering before its next update.
    #[inline]
    pub(crate) fn flag_for_filtering(&mut self) {
        self.filter_flag = true;
    }

    /// Recomputes the manifold, carrying accumulated impulses over to points whose feature ids
    /// persist. Sensors only test for overlap and keep an empty manifold.
    pub(crate) fn update(&mut self, a: &Fixture, xf_a: &Transform, b: &Fixture, xf_b: &Transform) -> ContactUpdate {
        let old_manifold = self.manifold;
        self.enabled = true;

        let was_touching = self.touching;
        let sensor = a.is_sensor || b.is_sensor;

        let touching = if sensor {
            self.manifold.point_count = 0;
            test_overlap(&a.shape.distance_proxy(), xf_a, &b.shape.distance_proxy(), xf_b)
        } else {
            self.manifold = evaluate(&a.shape, xf_a, &b.shape, xf_b);
            let count = self.manifold.point_count;
            for point in &mut self.manifold.points[..count] {
                point.normal_impulse = 0.0;
                point.tangent_impulse = 0.0;
                if let Some(old) = old_manifold.points().iter().find(|old| old.id == point.id) {
                    point.normal_impulse = old.normal_impulse;
                    point.tangent_impulse = old.tangent_impulse;
                }
            }
            count > 0
        };

        self.touching = touching;
        ContactUpdate {
            was_touching,
            touching,
            sensor,
            old_manifold,
        }
    }
}
