use glam::Vec2;

use super::body_description::{BodyDescription, BodyType};
use super::body_properties::{MassData, Sweep, Transform};
use super::collision_detection::BroadPhase;
use super::fixture::Fixture;
use super::handles::{BodyHandle, ContactHandle, FixtureHandle, JointHandle};
use crate::utilities::math_helper::{cross, cross_sv};
use crate::utilities::{Arena, Rot};

/// Adjacency entry linking a body to a contact and the body on its other side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactEdge {
    pub other: BodyHandle,
    pub contact: ContactHandle,
}

/// Adjacency entry linking a body to a joint. `other` is `None` for joints anchored to the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JointEdge {
    pub other: Option<BodyHandle>,
    pub joint: JointHandle,
    /// Copied from the joint; decides whether the two bodies may still collide.
    pub collide_connected: bool,
}

/// A rigid body. Bodies are created through the world and addressed by [`BodyHandle`].
#[derive(Debug, Clone)]
pub struct Body {
    pub(crate) body_type: BodyType,

    pub(crate) xf: Transform,
    pub(crate) sweep: Sweep,

    pub(crate) linear_velocity: Vec2,
    pub(crate) angular_velocity: f32,

    pub(crate) force: Vec2,
    pub(crate) torque: f32,

    pub(crate) mass: f32,
    pub(crate) inv_mass: f32,
    /// Rotational inertia about the center of mass.
    pub(crate) inertia: f32,
    pub(crate) inv_inertia: f32,

    pub(crate) linear_damping: f32,
    pub(crate) angular_damping: f32,
    pub(crate) gravity_scale: f32,
    pub(crate) ignore_gravity: bool,

    pub(crate) awake: bool,
    pub(crate) sleeping_allowed: bool,
    pub(crate) sleep_time: f32,
    pub(crate) bullet: bool,
    pub(crate) ignore_ccd: bool,
    pub(crate) fixed_rotation: bool,
    pub(crate) enabled: bool,

    /// Set once the body's pending add has been applied.
    pub(crate) in_world: bool,

    pub(crate) island_flag: bool,
    pub(crate) island_index: usize,

    pub(crate) fixtures: Vec<FixtureHandle>,
    pub(crate) contact_edges: Vec<ContactEdge>,
    pub(crate) joint_edges: Vec<JointEdge>,

    pub user_data: u64,
}

impl Body {
    pub(crate) fn new(description: &BodyDescription) -> Self {
        debug_assert!(description.is_valid());
        let xf = Transform::new(description.position, description.angle);
        let sweep = Sweep {
            local_center: Vec2::ZERO,
            c0: xf.p,
            c: xf.p,
            a0: description.angle,
            a: description.angle,
            alpha0: 0.0,
        };
        let dynamic = description.body_type == BodyType::Dynamic;
        let moving = description.body_type != BodyType::Static;
        Self {
            body_type: description.body_type,
            xf,
            sweep,
            linear_velocity: if moving { description.linear_velocity } else { Vec2::ZERO },
            angular_velocity: if moving { description.angular_velocity } else { 0.0 },
            force: Vec2::ZERO,
            torque: 0.0,
            // Dynamic bodies start with unit mass until fixtures with density arrive.
            mass: if dynamic { 1.0 } else { 0.0 },
            inv_mass: if dynamic { 1.0 } else { 0.0 },
            inertia: 0.0,
            inv_inertia: 0.0,
            linear_damping: description.linear_damping,
            angular_damping: description.angular_damping,
            gravity_scale: description.gravity_scale,
            ignore_gravity: description.ignore_gravity,
            awake: description.activity.awake && description.body_type != BodyType::Static,
            sleeping_allowed: description.activity.allow_sleep,
            sleep_time: 0.0,
            bullet: description.bullet,
            ignore_ccd: description.ignore_ccd,
            fixed_rotation: description.fixed_rotation,
            enabled: description.enabled,
            in_world: false,
            island_flag: false,
            island_index: 0,
            fixtures: Vec::new(),
            contact_edges: Vec::new(),
            joint_edges: Vec::new(),
            user_data: description.user_data,
        }
    }

    #[inline]
    pub fn body_type(&self) -> BodyType {
        self.body_type
    }

    /// Transform of the body origin.
    #[inline]
    pub fn transform(&self) -> &Transform {
        &self.xf
    }

    /// World position of the body origin.
    #[inline]
    pub fn position(&self) -> Vec2 {
        self.xf.p
    }

    #[inline]
    pub fn angle(&self) -> f32 {
        self.sweep.a
    }

    /// World position of the center of mass.
    #[inline]
    pub fn world_center(&self) -> Vec2 {
        self.sweep.c
    }

    /// Center of mass relative to the body origin.
    #[inline]
    pub fn local_center(&self) -> Vec2 {
        self.sweep.local_center
    }

    #[inline]
    pub fn sweep(&self) -> &Sweep {
        &self.sweep
    }

    /// Linear velocity of the center of mass.
    #[inline]
    pub fn linear_velocity(&self) -> Vec2 {
        self.linear_velocity
    }

    #[inline]
    pub fn angular_velocity(&self) -> f32 {
        self.angular_velocity
    }

    #[inline]
    pub fn force(&self) -> Vec2 {
        self.force
    }

    #[inline]
    pub fn torque(&self) -> f32 {
        self.torque
    }

    #[inline]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    #[inline]
    pub fn inverse_mass(&self) -> f32 {
        self.inv_mass
    }

    /// Rotational inertia about the body origin.
    #[inline]
    pub fn inertia(&self) -> f32 {
        self.inertia + self.mass * self.sweep.local_center.dot(self.sweep.local_center)
    }

    pub fn mass_data(&self) -> MassData {
        MassData {
            mass: self.mass,
            center: self.sweep.local_center,
            inertia: self.inertia(),
        }
    }

    #[inline]
    pub fn linear_damping(&self) -> f32 {
        self.linear_damping
    }

    pub fn set_linear_damping(&mut self, damping: f32) {
        debug_assert!(damping.is_finite() && damping >= 0.0);
        self.linear_damping = damping;
    }

    #[inline]
    pub fn angular_damping(&self) -> f32 {
        self.angular_damping
    }

    pub fn set_angular_damping(&mut self, damping: f32) {
        debug_assert!(damping.is_finite() && damping >= 0.0);
        self.angular_damping = damping;
    }

    #[inline]
    pub fn gravity_scale(&self) -> f32 {
        self.gravity_scale
    }

    pub fn set_gravity_scale(&mut self, scale: f32) {
        self.gravity_scale = scale;
    }

    #[inline]
    pub fn ignores_gravity(&self) -> bool {
        self.ignore_gravity
    }

    pub fn set_ignore_gravity(&mut self, flag: bool) {
        self.ignore_gravity = flag;
    }

    #[inline]
    pub fn is_awake(&self) -> bool {
        self.awake
    }

    #[inline]
    pub fn is_sleeping_allowed(&self) -> bool {
        self.sleeping_allowed
    }

    /// Disallowing sleep wakes the body.
    pub fn set_sleeping_allowed(&mut self, flag: bool) {
        self.sleeping_allowed = flag;
        if !flag {
            self.set_awake(true);
        }
    }

    /// Seconds the body has spent under the sleep tolerances.
    #[inline]
    pub fn sleep_time(&self) -> f32 {
        self.sleep_time
    }

    #[inline]
    pub fn is_bullet(&self) -> bool {
        self.bullet
    }

    pub fn set_bullet(&mut self, flag: bool) {
        self.bullet = flag;
    }

    #[inline]
    pub fn ignores_ccd(&self) -> bool {
        self.ignore_ccd
    }

    pub fn set_ignore_ccd(&mut self, flag: bool) {
        self.ignore_ccd = flag;
    }

    #[inline]
    pub fn is_fixed_rotation(&self) -> bool {
        self.fixed_rotation
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether the body's pending add has been applied by a step.
    #[inline]
    pub fn is_in_world(&self) -> bool {
        self.in_world
    }

    #[inline]
    pub fn fixtures(&self) -> &[FixtureHandle] {
        &self.fixtures
    }

    #[inline]
    pub fn contact_edges(&self) -> &[ContactEdge] {
        &self.contact_edges
    }

    #[inline]
    pub fn joint_edges(&self) -> &[JointEdge] {
        &self.joint_edges
    }

    /// Wakes or sleeps the body. Sleeping clears velocity, force and torque and resets the
    /// sleep timer. Static bodies never wake.
    pub fn set_awake(&mut self, flag: bool) {
        if self.body_type == BodyType::Static {
            return;
        }
        if flag {
            if !self.awake {
                self.awake = true;
                self.sleep_time = 0.0;
            }
        } else {
            self.awake = false;
            self.sleep_time = 0.0;
            self.linear_velocity = Vec2::ZERO;
            self.angular_velocity = 0.0;
            self.force = Vec2::ZERO;
            self.torque = 0.0;
        }
    }

    /// Sets the linear velocity of the center of mass. Ignored for static bodies.
    pub fn set_linear_velocity(&mut self, velocity: Vec2) {
        debug_assert!(velocity.is_finite());
        if self.body_type == BodyType::Static {
            return;
        }
        if velocity.dot(velocity) > 0.0 {
            self.set_awake(true);
        }
        self.linear_velocity = velocity;
    }

    /// Sets the angular velocity. Ignored for static bodies.
    pub fn set_angular_velocity(&mut self, omega: f32) {
        debug_assert!(omega.is_finite());
        if self.body_type == BodyType::Static {
            return;
        }
        if omega * omega > 0.0 {
            self.set_awake(true);
        }
        self.angular_velocity = omega;
    }

    /// Applies a force at a world point. Wakes the body when `wake` is set; a sleeping body
    /// that is not woken ignores the force.
    pub fn apply_force(&mut self, force: Vec2, point: Vec2, wake: bool) {
        debug_assert!(force.is_finite() && point.is_finite());
        if self.body_type != BodyType::Dynamic {
            return;
        }
        if wake {
            self.set_awake(true);
        }
        if self.awake {
            self.force += force;
            self.torque += cross(point - self.sweep.c, force);
        }
    }

    /// Applies a force at the center of mass.
    pub fn apply_force_to_center(&mut self, force: Vec2, wake: bool) {
        debug_assert!(force.is_finite());
        if self.body_type != BodyType::Dynamic {
            return;
        }
        if wake {
            self.set_awake(true);
        }
        if self.awake {
            self.force += force;
        }
    }

    pub fn apply_torque(&mut self, torque: f32, wake: bool) {
        debug_assert!(torque.is_finite());
        if self.body_type != BodyType::Dynamic {
            return;
        }
        if wake {
            self.set_awake(true);
        }
        if self.awake {
            self.torque += torque;
        }
    }

    /// Applies an impulse at a world point, changing velocity immediately.
    pub fn apply_linear_impulse(&mut self, impulse: Vec2, point: Vec2, wake: bool) {
        debug_assert!(impulse.is_finite() && point.is_finite());
        if self.body_type != BodyType::Dynamic {
            return;
        }
        if wake {
            self.set_awake(true);
        }
        if self.awake {
            self.linear_velocity += self.inv_mass * impulse;
            self.angular_velocity += self.inv_inertia * cross(point - self.sweep.c, impulse);
        }
    }

    pub fn apply_linear_impulse_to_center(&mut self, impulse: Vec2, wake: bool) {
        debug_assert!(impulse.is_finite());
        if self.body_type != BodyType::Dynamic {
            return;
        }
        if wake {
            self.set_awake(true);
        }
        if self.awake {
            self.linear_velocity += self.inv_mass * impulse;
        }
    }

    pub fn apply_angular_impulse(&mut self, impulse: f32, wake: bool) {
        debug_assert!(impulse.is_finite());
        if self.body_type != BodyType::Dynamic {
            return;
        }
        if wake {
            self.set_awake(true);
        }
        if self.awake {
            self.angular_velocity += self.inv_inertia * impulse;
        }
    }

    /// Overrides the mass properties. Ignored for non-dynamic bodies. A non-positive mass is
    /// replaced by one, and inertia is dropped for fixed rotation bodies.
    pub fn set_mass_data(&mut self, mass_data: &MassData) {
        if self.body_type != BodyType::Dynamic {
            return;
        }
        self.inv_inertia = 0.0;
        self.inertia = 0.0;
        self.mass = if mass_data.mass > 0.0 { mass_data.mass } else { 1.0 };
        self.inv_mass = 1.0 / self.mass;

        if mass_data.inertia > 0.0 && !self.fixed_rotation {
            self.inertia = mass_data.inertia - self.mass * mass_data.center.dot(mass_data.center);
            debug_assert!(self.inertia > 0.0);
            if self.inertia > 0.0 {
                self.inv_inertia = 1.0 / self.inertia;
            }
        }
        self.move_center(mass_data.center);
    }

    /// Recomputes mass properties from the densities of the given fixtures.
    pub(crate) fn reset_mass_data(&mut self, fixtures: &Arena<FixtureHandle, Fixture>) {
        self.mass = 0.0;
        self.inv_mass = 0.0;
        self.inertia = 0.0;
        self.inv_inertia = 0.0;

        if self.body_type != BodyType::Dynamic {
            self.sweep.local_center = Vec2::ZERO;
            self.sweep.c0 = self.xf.p;
            self.sweep.c = self.xf.p;
            self.sweep.a0 = self.sweep.a;
            return;
        }

        let mut local_center = Vec2::ZERO;
        let mut inertia = 0.0;
        for fixture in self.fixtures.iter().filter_map(|h| fixtures.get(*h)) {
            if fixture.density == 0.0 {
                continue;
            }
            let md = fixture.mass_data();
            self.mass += md.mass;
            local_center += md.mass * md.center;
            inertia += md.inertia;
        }

        if self.mass > 0.0 {
            self.inv_mass = 1.0 / self.mass;
            local_center *= self.inv_mass;
        } else {
            // Dynamic bodies always keep positive mass.
            self.mass = 1.0;
            self.inv_mass = 1.0;
        }

        if inertia > 0.0 && !self.fixed_rotation {
            // Shift to the center of mass.
            self.inertia = inertia - self.mass * local_center.dot(local_center);
            debug_assert!(self.inertia > 0.0);
            if self.inertia > 0.0 {
                self.inv_inertia = 1.0 / self.inertia;
            }
        }
        self.move_center(local_center);
    }

    /// Moves the center of mass, keeping the velocity of the origin consistent.
    fn move_center(&mut self, local_center: Vec2) {
        let old_center = self.sweep.c;
        self.sweep.local_center = local_center;
        self.sweep.c = self.xf.apply(local_center);
        self.sweep.c0 = self.sweep.c;
        self.linear_velocity += cross_sv(self.angular_velocity, self.sweep.c - old_center);
    }

    pub fn world_point(&self, local_point: Vec2) -> Vec2 {
        self.xf.apply(local_point)
    }

    pub fn world_vector(&self, local_vector: Vec2) -> Vec2 {
        self.xf.q.apply(local_vector)
    }

    pub fn local_point(&self, world_point: Vec2) -> Vec2 {
        self.xf.apply_inverse(world_point)
    }

    pub fn local_vector(&self, world_vector: Vec2) -> Vec2 {
        self.xf.q.apply_inverse(world_vector)
    }

    /// Velocity of a world point attached to the body.
    pub fn linear_velocity_from_world_point(&self, world_point: Vec2) -> Vec2 {
        self.linear_velocity + cross_sv(self.angular_velocity, world_point - self.sweep.c)
    }

    /// Velocity of a body-local point.
    pub fn linear_velocity_from_local_point(&self, local_point: Vec2) -> Vec2 {
        self.linear_velocity_from_world_point(self.world_point(local_point))
    }

    /// Whether a contact may exist between this body and `other`: at least one must be dynamic
    /// and no joint between them may forbid it.
    pub fn should_collide(&self, other_handle: BodyHandle, other: &Body) -> bool {
        if self.body_type != BodyType::Dynamic && other.body_type != BodyType::Dynamic {
            return false;
        }
        !self
            .joint_edges
            .iter()
            .any(|edge| edge.other == Some(other_handle) && !edge.collide_connected)
    }

    /// Places the body, resetting the sweep so no motion is interpolated.
    pub(crate) fn set_transform_internal(&mut self, position: Vec2, angle: f32) {
        self.xf = Transform::new(position, angle);
        self.sweep.c = self.xf.apply(self.sweep.local_center);
        self.sweep.a = angle;
        self.sweep.c0 = self.sweep.c;
        self.sweep.a0 = angle;
    }

    /// Recomputes the origin transform from the end of the sweep.
    #[inline]
    pub(crate) fn synchronize_transform(&mut self) {
        self.xf.q = Rot::from_angle(self.sweep.a);
        self.xf.p = self.sweep.c - self.xf.q.apply(self.sweep.local_center);
    }

    /// Moves the body to time `alpha` of the step and makes that pose the new sweep start.
    pub(crate) fn advance(&mut self, alpha: f32) {
        self.sweep.advance(alpha);
        self.sweep.c = self.sweep.c0;
        self.sweep.a = self.sweep.a0;
        self.synchronize_transform();
    }

    /// Transform at the start of the sweep.
    #[inline]
    pub(crate) fn start_transform(&self) -> Transform {
        let q = Rot::from_angle(self.sweep.a0);
        Transform {
            p: self.sweep.c0 - q.apply(self.sweep.local_center),
            q,
        }
    }

    /// Moves the broad-phase proxies of every fixture to cover the motion over the sweep.
    pub(crate) fn synchronize_fixtures(
        &self,
        fixtures: &mut Arena<FixtureHandle, Fixture>,
        broad_phase: &mut dyn BroadPhase,
    ) {
        let xf1 = self.start_transform();
        for handle in &self.fixtures {
            if let Some(fixture) = fixtures.get_mut(*handle) {
                fixture.synchronize(broad_phase, &xf1, &self.xf);
            }
        }
    }
}
