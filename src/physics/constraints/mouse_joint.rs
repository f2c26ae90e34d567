use glam::Vec2;

use super::joint::{JointSolver, SolverBody, SolverData};
use super::spring_settings::SpringSettings;
use crate::utilities::math_helper::{cross, cross_sv};
use crate::utilities::{Mat22, Rot};

/// Drags a point on a single body toward a world target with a soft, force limited spring.
///
/// The joint lives on body A and has no body B. Move the target with `World::set_mouse_target`
/// so the body is woken.
#[derive(Debug, Clone, PartialEq)]
pub struct MouseJoint {
    /// Point on the body, relative to its origin.
    pub local_anchor: Vec2,
    /// World point the anchor is pulled toward.
    pub target: Vec2,
    /// Largest force the joint applies.
    pub max_force: f32,
    pub spring: SpringSettings,

    impulse: Vec2,

    a: SolverBody,
    r_a: Vec2,
    mass: Mat22,
    gamma: f32,
    c: Vec2,
}

impl MouseJoint {
    /// Creates a joint grabbing the body at `local_anchor`, initially held in place at `target`.
    pub fn new(local_anchor: Vec2, target: Vec2, max_force: f32) -> Self {
        Self {
            local_anchor,
            target,
            max_force,
            spring: SpringSettings::new(5.0, 0.7),
            impulse: Vec2::ZERO,
            a: SolverBody::WORLD,
            r_a: Vec2::ZERO,
            mass: Mat22::ZERO,
            gamma: 0.0,
            c: Vec2::ZERO,
        }
    }

    #[must_use]
    pub fn with_spring(mut self, spring: SpringSettings) -> Self {
        self.spring = spring;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), &'static str> {
        if !self.max_force.is_finite() || self.max_force < 0.0 {
            return Err("mouse joint max force must be finite and nonnegative");
        }
        if !self.target.is_finite() {
            return Err("mouse joint target must be finite");
        }
        if !self.spring.is_valid() || self.spring.is_rigid() {
            return Err("mouse joint spring needs a positive frequency");
        }
        Ok(())
    }
}

impl JointSolver for MouseJoint {
    fn init_velocity_constraints(&mut self, a: SolverBody, _b: SolverBody, data: &mut SolverData) {
        self.a = a;

        let pos = data.position(&a);
        let mut vel = data.velocity(&a);

        let mass = if a.inv_mass > 0.0 { 1.0 / a.inv_mass } else { 0.0 };
        let (gamma, beta) = self.spring.soft_coefficients(mass, data.step.dt);
        self.gamma = gamma;

        self.r_a = Rot::from_angle(pos.a).apply(self.local_anchor - a.local_center);
        let (m, i, r) = (a.inv_mass, a.inv_i, self.r_a);
        let ex = Vec2::new(m + i * r.y * r.y + gamma, -i * r.x * r.y);
        let ey = Vec2::new(ex.y, m + i * r.x * r.x + gamma);
        self.mass = Mat22::new(ex, ey).inverse();

        self.c = beta * (pos.c + self.r_a - self.target);

        // A little rotational damping keeps a grabbed body from spinning forever.
        vel.w *= 0.98;

        if data.step.warm_starting {
            self.impulse *= data.step.dt_ratio;
            vel.v += a.inv_mass * self.impulse;
            vel.w += a.inv_i * cross(self.r_a, self.impulse);
        } else {
            self.impulse = Vec2::ZERO;
        }

        data.set_velocity(&a, vel);
    }

    fn solve_velocity_constraints(&mut self, data: &mut SolverData) {
        let a = self.a;
        let mut vel = data.velocity(&a);

        let c_dot = vel.v + cross_sv(vel.w, self.r_a);
        let mut impulse = self.mass.transform(-(c_dot + self.c + self.gamma * self.impulse));

        let old_impulse = self.impulse;
        self.impulse += impulse;
        let max_impulse = data.step.dt * self.max_force;
        if self.impulse.length_squared() > max_impulse * max_impulse {
            self.impulse *= max_impulse / self.impulse.length();
        }
        impulse = self.impulse - old_impulse;

        vel.v += a.inv_mass * impulse;
        vel.w += a.inv_i * cross(self.r_a, impulse);

        data.set_velocity(&a, vel);
    }

    fn solve_position_constraints(&mut self, _data: &mut SolverData) -> bool {
        true
    }

    fn reaction_force(&self, inv_dt: f32) -> Vec2 {
        inv_dt * self.impulse
    }

    fn reaction_torque(&self, _inv_dt: f32) -> f32 {
        0.0
    }

    fn shift_origin(&mut self, new_origin: Vec2, _world_anchored: bool) {
        self.target -= new_origin;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::body_properties::{Position, Velocity};
    use crate::physics::settings::WorldSettings;
    use crate::physics::solve_description::TimeStep;

    #[test]
    fn test_pulls_toward_target_within_force_limit() {
        let mut joint = MouseJoint::new(Vec2::ZERO, Vec2::new(10.0, 0.0), 5.0);
        let body = SolverBody {
            index: Some(0),
            local_center: Vec2::ZERO,
            inv_mass: 1.0,
            inv_i: 1.0,
        };
        let mut positions = [Position::default()];
        let mut velocities = [Velocity::default()];
        let dt = 1.0 / 60.0;
        let mut data = SolverData {
            step: TimeStep::new(dt, 0.0, &WorldSettings::default()),
            positions: &mut positions,
            velocities: &mut velocities,
        };
        joint.init_velocity_constraints(body, SolverBody::WORLD, &mut data);
        for _ in 0..8 {
            joint.solve_velocity_constraints(&mut data);
        }
        assert!(velocities[0].v.x > 0.0);
        assert!(velocities[0].v.x <= dt * 5.0 + 1e-5);
        assert!(joint.reaction_force(1.0 / dt).length() <= 5.0 + 1e-3);
    }

    #[test]
    fn test_shift_origin_moves_target() {
        let mut joint = MouseJoint::new(Vec2::ZERO, Vec2::new(1.0, 1.0), 1.0);
        joint.shift_origin(Vec2::new(1.0, 0.0), true);
        assert_eq!(joint.target, Vec2::new(0.0, 1.0));
    }

    #[test]
    fn test_rigid_spring_is_rejected() {
        let joint = MouseJoint::new(Vec2::ZERO, Vec2::ZERO, 1.0).with_spring(SpringSettings::default());
        assert!(joint.validate().is_err());
    }
}
