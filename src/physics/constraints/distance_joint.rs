use glam::Vec2;

use super::joint::{JointSolver, SolverBody, SolverData};
use super::spring_settings::SpringSettings;
use crate::physics::settings::{LINEAR_SLOP, MAX_LINEAR_CORRECTION};
use crate::utilities::math_helper::{clamp, cross, cross_sv};
use crate::utilities::Rot;

/// Keeps two anchor points at a fixed distance, like a massless rod.
///
/// With a non-rigid `spring` the rod becomes a damped spring and no position correction is done.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceJoint {
    pub local_anchor_a: Vec2,
    /// Anchor relative to body B's origin, or a world point when the joint has no body B.
    pub local_anchor_b: Vec2,
    /// Rest length. Must be at least the linear slop.
    pub length: f32,
    /// Rigid by default.
    pub spring: SpringSettings,

    impulse: f32,
    gamma: f32,
    bias: f32,

    a: SolverBody,
    b: SolverBody,
    u: Vec2,
    r_a: Vec2,
    r_b: Vec2,
    mass: f32,
}

impl DistanceJoint {
    pub fn new(local_anchor_a: Vec2, local_anchor_b: Vec2, length: f32) -> Self {
        Self {
            local_anchor_a,
            local_anchor_b,
            length,
            spring: SpringSettings::default(),
            impulse: 0.0,
            gamma: 0.0,
            bias: 0.0,
            a: SolverBody::WORLD,
            b: SolverBody::WORLD,
            u: Vec2::ZERO,
            r_a: Vec2::ZERO,
            r_b: Vec2::ZERO,
            mass: 0.0,
        }
    }

    #[must_use]
    pub fn with_spring(mut self, spring: SpringSettings) -> Self {
        self.spring = spring;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), &'static str> {
        if !self.length.is_finite() || self.length < LINEAR_SLOP {
            return Err("distance joint length must be finite and at least the linear slop");
        }
        if !self.spring.is_valid() {
            return Err("distance joint spring must be finite and nonnegative");
        }
        Ok(())
    }
}

impl JointSolver for DistanceJoint {
    fn init_velocity_constraints(&mut self, a: SolverBody, b: SolverBody, data: &mut SolverData) {
        self.a = a;
        self.b = b;

        let pos_a = data.position(&a);
        let pos_b = data.position(&b);
        let mut vel_a = data.velocity(&a);
        let mut vel_b = data.velocity(&b);

        self.r_a = Rot::from_angle(pos_a.a).apply(self.local_anchor_a - a.local_center);
        self.r_b = Rot::from_angle(pos_b.a).apply(self.local_anchor_b - b.local_center);
        self.u = pos_b.c + self.r_b - pos_a.c - self.r_a;

        let length = self.u.length();
        if length > LINEAR_SLOP {
            self.u /= length;
        } else {
            self.u = Vec2::ZERO;
        }

        let cr_a = cross(self.r_a, self.u);
        let cr_b = cross(self.r_b, self.u);
        let inv_mass = a.inv_mass + a.inv_i * cr_a * cr_a + b.inv_mass + b.inv_i * cr_b * cr_b;
        self.mass = if inv_mass != 0.0 { 1.0 / inv_mass } else { 0.0 };

        if !self.spring.is_rigid() && inv_mass != 0.0 {
            let c = length - self.length;
            let (gamma, beta) = self.spring.soft_coefficients(self.mass, data.step.dt);
            self.gamma = gamma;
            self.bias = c * beta;
            let inv_mass = inv_mass + self.gamma;
            self.mass = if inv_mass != 0.0 { 1.0 / inv_mass } else { 0.0 };
        } else {
            self.gamma = 0.0;
            self.bias = 0.0;
        }

        if data.step.warm_starting {
            self.impulse *= data.step.dt_ratio;
            let p = self.impulse * self.u;
            vel_a.v -= a.inv_mass * p;
            vel_a.w -= a.inv_i * cross(self.r_a, p);
            vel_b.v += b.inv_mass * p;
            vel_b.w += b.inv_i * cross(self.r_b, p);
        } else {
            self.impulse = 0.0;
        }

        data.set_velocity(&a, vel_a);
        data.set_velocity(&b, vel_b);
    }

    fn solve_velocity_constraints(&mut self, data: &mut SolverData) {
        let (a, b) = (self.a, self.b);
        let mut vel_a = data.velocity(&a);
        let mut vel_b = data.velocity(&b);

        let vp_a = vel_a.v + cross_sv(vel_a.w, self.r_a);
        let vp_b = vel_b.v + cross_sv(vel_b.w, self.r_b);
        let c_dot = self.u.dot(vp_b - vp_a);

        let impulse = -self.mass * (c_dot + self.bias + self.gamma * self.impulse);
        self.impulse += impulse;

        let p = impulse * self.u;
        vel_a.v -= a.inv_mass * p;
        vel_a.w -= a.inv_i * cross(self.r_a, p);
        vel_b.v += b.inv_mass * p;
        vel_b.w += b.inv_i * cross(self.r_b, p);

        data.set_velocity(&a, vel_a);
        data.set_velocity(&b, vel_b);
    }

    fn solve_position_constraints(&mut self, data: &mut SolverData) -> bool {
        if !self.spring.is_rigid() {
            return true;
        }

        let (a, b) = (self.a, self.b);
        let mut pos_a = data.position(&a);
        let mut pos_b = data.position(&b);

        let r_a = Rot::from_angle(pos_a.a).apply(self.local_anchor_a - a.local_center);
        let r_b = Rot::from_angle(pos_b.a).apply(self.local_anchor_b - b.local_center);
        let mut u = pos_b.c + r_b - pos_a.c - r_a;

        let length = u.length();
        if length > 0.0 {
            u /= length;
        }
        let c = clamp(length - self.length, -MAX_LINEAR_CORRECTION, MAX_LINEAR_CORRECTION);

        let p = -self.mass * c * u;
        pos_a.c -= a.inv_mass * p;
        pos_a.a -= a.inv_i * cross(r_a, p);
        pos_b.c += b.inv_mass * p;
        pos_b.a += b.inv_i * cross(r_b, p);

        data.set_position(&a, pos_a);
        data.set_position(&b, pos_b);

        c.abs() < LINEAR_SLOP
    }

    fn reaction_force(&self, inv_dt: f32) -> Vec2 {
        inv_dt * self.impulse * self.u
    }

    fn reaction_torque(&self, _inv_dt: f32) -> f32 {
        0.0
    }

    fn shift_origin(&mut self, new_origin: Vec2, world_anchored: bool) {
        if world_anchored {
            self.local_anchor_b -= new_origin;
        }
    }
}
