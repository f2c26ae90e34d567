use glam::Vec2;

use super::joint::{JointSolver, SolverBody, SolverData};
use super::motor_settings::MotorSettings;
use crate::physics::settings::{ANGULAR_SLOP, LINEAR_SLOP, MAX_ANGULAR_CORRECTION};
use crate::utilities::math_helper::{clamp, cross, cross_sv};
use crate::utilities::{Mat22, Rot};

/// Inclusive range the relative angle is kept within.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleLimits {
    pub lower: f32,
    pub upper: f32,
}

/// Pins a point on body B to a point on body A, leaving rotation about it free.
///
/// Optionally limits the relative angle and drives it with a torque bounded motor. The relative
/// angle is `angle_b - angle_a - reference_angle`, counterclockwise positive.
#[derive(Debug, Clone, PartialEq)]
pub struct RevoluteJoint {
    /// Anchor relative to body A's origin.
    pub local_anchor_a: Vec2,
    /// Anchor relative to body B's origin, or a world point when the joint has no body B.
    pub local_anchor_b: Vec2,
    /// Relative angle considered zero.
    pub reference_angle: f32,
    pub limits: Option<AngleLimits>,
    pub motor: Option<MotorSettings>,

    // Accumulated impulses.
    impulse: Vec2,
    motor_impulse: f32,
    lower_impulse: f32,
    upper_impulse: f32,

    // Solver temporaries.
    a: SolverBody,
    b: SolverBody,
    r_a: Vec2,
    r_b: Vec2,
    axial_mass: f32,
    angle: f32,
}

impl RevoluteJoint {
    pub fn new(local_anchor_a: Vec2, local_anchor_b: Vec2, reference_angle: f32) -> Self {
        Self {
            local_anchor_a,
            local_anchor_b,
            reference_angle,
            limits: None,
            motor: None,
            impulse: Vec2::ZERO,
            motor_impulse: 0.0,
            lower_impulse: 0.0,
            upper_impulse: 0.0,
            a: SolverBody::WORLD,
            b: SolverBody::WORLD,
            r_a: Vec2::ZERO,
            r_b: Vec2::ZERO,
            axial_mass: 0.0,
            angle: 0.0,
        }
    }

    #[must_use]
    pub fn with_limits(mut self, lower: f32, upper: f32) -> Self {
        self.limits = Some(AngleLimits { lower, upper });
        self
    }

    #[must_use]
    pub fn with_motor(mut self, speed: f32, max_torque: f32) -> Self {
        self.motor = Some(MotorSettings::new(speed, max_torque));
        self
    }

    /// Torque the motor applied during the last step.
    pub fn motor_torque(&self, inv_dt: f32) -> f32 {
        inv_dt * self.motor_impulse
    }

    pub(crate) fn validate(&self) -> Result<(), &'static str> {
        if let Some(limits) = self.limits {
            if !(limits.lower <= limits.upper) {
                return Err("revolute lower limit exceeds upper limit");
            }
        }
        if let Some(motor) = &self.motor {
            if !MotorSettings::validate(motor) {
                return Err("revolute motor settings must be finite with nonnegative torque");
            }
        }
        Ok(())
    }

    fn point_mass(&self) -> Mat22 {
        let (m_a, m_b, i_a, i_b) = (self.a.inv_mass, self.b.inv_mass, self.a.inv_i, self.b.inv_i);
        let (r_a, r_b) = (self.r_a, self.r_b);
        let ex = Vec2::new(
            m_a + m_b + r_a.y * r_a.y * i_a + r_b.y * r_b.y * i_b,
            -r_a.y * r_a.x * i_a - r_b.y * r_b.x * i_b,
        );
        let ey = Vec2::new(ex.y, m_a + m_b + r_a.x * r_a.x * i_a + r_b.x * r_b.x * i_b);
        Mat22::new(ex, ey)
    }
}

impl JointSolver for RevoluteJoint {
    fn init_velocity_constraints(&mut self, a: SolverBody, b: SolverBody, data: &mut SolverData) {
        self.a = a;
        self.b = b;

        let pos_a = data.position(&a);
        let pos_b = data.position(&b);
        let mut vel_a = data.velocity(&a);
        let mut vel_b = data.velocity(&b);

        let q_a = Rot::from_angle(pos_a.a);
        let q_b = Rot::from_angle(pos_b.a);
        self.r_a = q_a.apply(self.local_anchor_a - a.local_center);
        self.r_b = q_b.apply(self.local_anchor_b - b.local_center);

        let (m_a, m_b, i_a, i_b) = (a.inv_mass, b.inv_mass, a.inv_i, b.inv_i);

        // Both sides rotation locked: angular rows have no effective mass.
        let axial = i_a + i_b;
        let fixed_rotation = axial == 0.0;
        self.axial_mass = if axial > 0.0 { 1.0 / axial } else { 0.0 };
        self.angle = pos_b.a - pos_a.a - self.reference_angle;

        if self.motor.is_none() || fixed_rotation {
            self.motor_impulse = 0.0;
        }
        if self.limits.is_none() || fixed_rotation {
            self.lower_impulse = 0.0;
            self.upper_impulse = 0.0;
        }

        if data.step.warm_starting {
            let ratio = data.step.dt_ratio;
            self.impulse *= ratio;
            self.motor_impulse *= ratio;
            self.lower_impulse *= ratio;
            self.upper_impulse *= ratio;

            let axial_impulse = self.motor_impulse + self.lower_impulse - self.upper_impulse;
            let p = self.impulse;
            vel_a.v -= m_a * p;
            vel_a.w -= i_a * (cross(self.r_a, p) + axial_impulse);
            vel_b.v += m_b * p;
            vel_b.w += i_b * (cross(self.r_b, p) + axial_impulse);
        } else {
            self.impulse = Vec2::ZERO;
            self.motor_impulse = 0.0;
            self.lower_impulse = 0.0;
            self.upper_impulse = 0.0;
        }

        data.set_velocity(&a, vel_a);
        data.set_velocity(&b, vel_b);
    }

    fn solve_velocity_constraints(&mut self, data: &mut SolverData) {
        let (a, b) = (self.a, self.b);
        let mut vel_a = data.velocity(&a);
        let mut vel_b = data.velocity(&b);
        let (m_a, m_b, i_a, i_b) = (a.inv_mass, b.inv_mass, a.inv_i, b.inv_i);
        let fixed_rotation = i_a + i_b == 0.0;
        let h = data.step.dt;

        if let Some(motor) = self.motor.filter(|_| !fixed_rotation) {
            let c_dot = vel_b.w - vel_a.w - motor.speed;
            let impulse = -self.axial_mass * c_dot;
            let old = self.motor_impulse;
            let max_impulse = motor.max_impulse(h);
            self.motor_impulse = clamp(old + impulse, -max_impulse, max_impulse);
            let impulse = self.motor_impulse - old;
            vel_a.w -= i_a * impulse;
            vel_b.w += i_b * impulse;
        }

        if let Some(limits) = self.limits.filter(|_| !fixed_rotation) {
            // Lower limit. Speculative: allows approach up to the limit within this step.
            {
                let c = self.angle - limits.lower;
                let c_dot = vel_b.w - vel_a.w;
                let impulse = -self.axial_mass * (c_dot + c.max(0.0) * data.step.inv_dt);
                let new_impulse = (self.lower_impulse + impulse).max(0.0);
                let impulse = new_impulse - self.lower_impulse;
                self.lower_impulse = new_impulse;
                vel_a.w -= i_a * impulse;
                vel_b.w += i_b * impulse;
            }

            // Upper limit, with the sign of the constraint flipped.
            {
                let c = limits.upper - self.angle;
                let c_dot = vel_a.w - vel_b.w;
                let impulse = -self.axial_mass * (c_dot + c.max(0.0) * data.step.inv_dt);
                let new_impulse = (self.upper_impulse + impulse).max(0.0);
                let impulse = new_impulse - self.upper_impulse;
                self.upper_impulse = new_impulse;
                vel_a.w += i_a * impulse;
                vel_b.w -= i_b * impulse;
            }
        }

        // Point to point.
        let c_dot = vel_b.v + cross_sv(vel_b.w, self.r_b) - vel_a.v - cross_sv(vel_a.w, self.r_a);
        let impulse = self.point_mass().solve(-c_dot);
        self.impulse += impulse;

        vel_a.v -= m_a * impulse;
        vel_a.w -= i_a * cross(self.r_a, impulse);
        vel_b.v += m_b * impulse;
        vel_b.w += i_b * cross(self.r_b, impulse);

        data.set_velocity(&a, vel_a);
        data.set_velocity(&b, vel_b);
    }

    fn solve_position_constraints(&mut self, data: &mut SolverData) -> bool {
        let (a, b) = (self.a, self.b);
        let mut pos_a = data.position(&a);
        let mut pos_b = data.position(&b);
        let (m_a, m_b, i_a, i_b) = (a.inv_mass, b.inv_mass, a.inv_i, b.inv_i);
        let fixed_rotation = i_a + i_b == 0.0;

        let mut angular_error = 0.0;
        if let Some(limits) = self.limits.filter(|_| !fixed_rotation) {
            let angle = pos_b.a - pos_a.a - self.reference_angle;
            let c = if (limits.upper - limits.lower).abs() < 2.0 * ANGULAR_SLOP {
                // Limits nearly equal: treat as an equality.
                clamp(angle - limits.lower, -MAX_ANGULAR_CORRECTION, MAX_ANGULAR_CORRECTION)
            } else if angle <= limits.lower {
                clamp(angle - limits.lower + ANGULAR_SLOP, -MAX_ANGULAR_CORRECTION, 0.0)
            } else if angle >= limits.upper {
                clamp(angle - limits.upper - ANGULAR_SLOP, 0.0, MAX_ANGULAR_CORRECTION)
            } else {
                0.0
            };

            let limit_impulse = -self.axial_mass * c;
            pos_a.a -= i_a * limit_impulse;
            pos_b.a += i_b * limit_impulse;
            angular_error = c.abs();
        }

        let q_a = Rot::from_angle(pos_a.a);
        let q_b = Rot::from_angle(pos_b.a);
        self.r_a = q_a.apply(self.local_anchor_a - a.local_center);
        self.r_b = q_b.apply(self.local_anchor_b - b.local_center);

        let c = pos_b.c + self.r_b - pos_a.c - self.r_a;
        let position_error = c.length();

        let impulse = -self.point_mass().solve(c);
        pos_a.c -= m_a * impulse;
        pos_a.a -= i_a * cross(self.r_a, impulse);
        pos_b.c += m_b * impulse;
        pos_b.a += i_b * cross(self.r_b, impulse);

        data.set_position(&a, pos_a);
        data.set_position(&b, pos_b);

        position_error <= LINEAR_SLOP && angular_error <= ANGULAR_SLOP
    }

    fn reaction_force(&self, inv_dt: f32) -> Vec2 {
        inv_dt * self.impulse
    }

    fn reaction_torque(&self, inv_dt: f32) -> f32 {
        inv_dt * (self.motor_impulse + self.lower_impulse - self.upper_impulse)
    }

    fn shift_origin(&mut self, new_origin: Vec2, world_anchored: bool) {
        if world_anchored {
            self.local_anchor_b -= new_origin;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::body_properties::{Position, Velocity};
    use crate::physics::settings::WorldSettings;
    use crate::physics::solve_description::TimeStep;

    fn body(index: usize) -> SolverBody {
        SolverBody {
            index: Some(index),
            local_center: Vec2::ZERO,
            inv_mass: 1.0,
            inv_i: 1.0,
        }
    }

    #[test]
    fn test_pulls_drifting_anchor_back() {
        let mut joint = RevoluteJoint::new(Vec2::new(0.5, 0.0), Vec2::new(-0.5, 0.0), 0.0);
        let mut positions = [
            Position::default(),
            Position {
                c: Vec2::new(1.2, 0.0),
                a: 0.0,
            },
        ];
        let mut velocities = [Velocity::default(); 2];
        let mut data = SolverData {
            step: TimeStep::new(1.0 / 60.0, 60.0, &WorldSettings::default()),
            positions: &mut positions,
            velocities: &mut velocities,
        };
        joint.init_velocity_constraints(body(0), body(1), &mut data);
        let mut solved = false;
        for _ in 0..10 {
            solved = joint.solve_position_constraints(&mut data);
        }
        assert!(solved);
        let gap = (positions[1].c + Vec2::new(-0.5, 0.0)) - (positions[0].c + Vec2::new(0.5, 0.0));
        assert!(gap.length() <= LINEAR_SLOP);
    }

    #[test]
    fn test_motor_torque_is_bounded() {
        let mut joint = RevoluteJoint::new(Vec2::ZERO, Vec2::ZERO, 0.0).with_motor(10.0, 2.0);
        let mut positions = [Position::default(); 2];
        let mut velocities = [Velocity::default(); 2];
        let mut data = SolverData {
            step: TimeStep::new(0.5, 0.0, &WorldSettings::default()),
            positions: &mut positions,
            velocities: &mut velocities,
        };
        joint.init_velocity_constraints(body(0), body(1), &mut data);
        joint.solve_velocity_constraints(&mut data);
        // At most dt * max_torque of angular impulse.
        assert!((joint.reaction_torque(2.0) - 2.0).abs() < 1e-5);
        assert!((velocities[1].w - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_world_anchored_joint_uses_world_point() {
        let mut joint = RevoluteJoint::new(Vec2::ZERO, Vec2::new(3.0, 0.0), 0.0);
        let mut positions = [Position::default()];
        let mut velocities = [Velocity::default()];
        let mut data = SolverData {
            step: TimeStep::new(1.0 / 60.0, 0.0, &WorldSettings::default()),
            positions: &mut positions,
            velocities: &mut velocities,
        };
        joint.init_velocity_constraints(body(0), SolverBody::WORLD, &mut data);
        for _ in 0..20 {
            joint.solve_position_constraints(&mut data);
        }
        assert!((positions[0].c - Vec2::new(3.0, 0.0)).length() < 0.05);
    }

    #[test]
    fn test_inverted_limits_are_rejected() {
        assert!(RevoluteJoint::new(Vec2::ZERO, Vec2::ZERO, 0.0)
            .with_limits(1.0, -1.0)
            .validate()
            .is_err());
    }
}
