use glam::{Vec2, Vec3};

use super::joint::{JointSolver, SolverBody, SolverData};
use crate::physics::settings::{ANGULAR_SLOP, LINEAR_SLOP};
use crate::utilities::math_helper::{cross, cross_sv};
use crate::utilities::{Mat33, Rot};

/// Glues two bodies together: anchors coincide and the relative angle stays at the reference.
#[derive(Debug, Clone, PartialEq)]
pub struct WeldJoint {
    pub local_anchor_a: Vec2,
    /// Anchor relative to body B's origin, or a world point when the joint has no body B.
    pub local_anchor_b: Vec2,
    pub reference_angle: f32,

    // x, y: linear impulse. z: angular impulse.
    impulse: Vec3,

    a: SolverBody,
    b: SolverBody,
    r_a: Vec2,
    r_b: Vec2,
    mass: Mat33,
}

impl WeldJoint {
    pub fn new(local_anchor_a: Vec2, local_anchor_b: Vec2, reference_angle: f32) -> Self {
        Self {
            local_anchor_a,
            local_anchor_b,
            reference_angle,
            impulse: Vec3::ZERO,
            a: SolverBody::WORLD,
            b: SolverBody::WORLD,
            r_a: Vec2::ZERO,
            r_b: Vec2::ZERO,
            mass: Mat33::ZERO,
        }
    }

    fn effective_mass(&self, r_a: Vec2, r_b: Vec2) -> Mat33 {
        let (m_a, m_b, i_a, i_b) = (self.a.inv_mass, self.b.inv_mass, self.a.inv_i, self.b.inv_i);
        let ex = Vec3::new(
            m_a + m_b + r_a.y * r_a.y * i_a + r_b.y * r_b.y * i_b,
            -r_a.y * r_a.x * i_a - r_b.y * r_b.x * i_b,
            -r_a.y * i_a - r_b.y * i_b,
        );
        let ey = Vec3::new(
            ex.y,
            m_a + m_b + r_a.x * r_a.x * i_a + r_b.x * r_b.x * i_b,
            r_a.x * i_a + r_b.x * i_b,
        );
        let ez = Vec3::new(ex.z, ey.z, i_a + i_b);
        Mat33 { ex, ey, ez }
    }
}

impl JointSolver for WeldJoint {
    fn init_velocity_constraints(&mut self, a: SolverBody, b: SolverBody, data: &mut SolverData) {
        self.a = a;
        self.b = b;

        let pos_a = data.position(&a);
        let pos_b = data.position(&b);
        let mut vel_a = data.velocity(&a);
        let mut vel_b = data.velocity(&b);

        self.r_a = Rot::from_angle(pos_a.a).apply(self.local_anchor_a - a.local_center);
        self.r_b = Rot::from_angle(pos_b.a).apply(self.local_anchor_b - b.local_center);
        self.mass = self.effective_mass(self.r_a, self.r_b).symmetric_inverse33();

        if data.step.warm_starting {
            self.impulse *= data.step.dt_ratio;
            let p = self.impulse.truncate();
            vel_a.v -= a.inv_mass * p;
            vel_a.w -= a.inv_i * (cross(self.r_a, p) + self.impulse.z);
            vel_b.v += b.inv_mass * p;
            vel_b.w += b.inv_i * (cross(self.r_b, p) + self.impulse.z);
        } else {
            self.impulse = Vec3::ZERO;
        }

        data.set_velocity(&a, vel_a);
        data.set_velocity(&b, vel_b);
    }

    fn solve_velocity_constraints(&mut self, data: &mut SolverData) {
        let (a, b) = (self.a, self.b);
        let mut vel_a = data.velocity(&a);
        let mut vel_b = data.velocity(&b);

        let c_dot1 = vel_b.v + cross_sv(vel_b.w, self.r_b) - vel_a.v - cross_sv(vel_a.w, self.r_a);
        let c_dot2 = vel_b.w - vel_a.w;

        let impulse = -self.mass.transform(c_dot1.extend(c_dot2));
        self.impulse += impulse;

        let p = impulse.truncate();
        vel_a.v -= a.inv_mass * p;
        vel_a.w -= a.inv_i * (cross(self.r_a, p) + impulse.z);
        vel_b.v += b.inv_mass * p;
        vel_b.w += b.inv_i * (cross(self.r_b, p) + impulse.z);

        data.set_velocity(&a, vel_a);
        data.set_velocity(&b, vel_b);
    }

    fn solve_position_constraints(&mut self, data: &mut SolverData) -> bool {
        let (a, b) = (self.a, self.b);
        let mut pos_a = data.position(&a);
        let mut pos_b = data.position(&b);

        let r_a = Rot::from_angle(pos_a.a).apply(self.local_anchor_a - a.local_center);
        let r_b = Rot::from_angle(pos_b.a).apply(self.local_anchor_b - b.local_center);
        let k = self.effective_mass(r_a, r_b);

        let c1 = pos_b.c + r_b - pos_a.c - r_a;
        let c2 = pos_b.a - pos_a.a - self.reference_angle;
        let position_error = c1.length();
        let angular_error = c2.abs();

        // Without rotational freedom on either side only the point constraint is solvable.
        let impulse = if k.ez.z > 0.0 {
            -k.solve33(c1.extend(c2))
        } else {
            (-k.solve22(c1)).extend(0.0)
        };

        let p = impulse.truncate();
        pos_a.c -= a.inv_mass * p;
        pos_a.a -= a.inv_i * (cross(r_a, p) + impulse.z);
        pos_b.c += b.inv_mass * p;
        pos_b.a += b.inv_i * (cross(r_b, p) + impulse.z);

        data.set_position(&a, pos_a);
        data.set_position(&b, pos_b);

        position_error <= LINEAR_SLOP && angular_error <= ANGULAR_SLOP
    }

    fn reaction_force(&self, inv_dt: f32) -> Vec2 {
        inv_dt * self.impulse.truncate()
    }

    fn reaction_torque(&self, inv_dt: f32) -> f32 {
        inv_dt * self.impulse.z
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

    #[test]
    fn test_weld_to_world_stops_all_motion() {
        let mut joint = WeldJoint::new(Vec2::ZERO, Vec2::ZERO, 0.0);
        let body = SolverBody {
            index: Some(0),
            local_center: Vec2::ZERO,
            inv_mass: 1.0,
            inv_i: 2.0,
        };
        let mut positions = [Position::default()];
        let mut velocities = [Velocity {
            v: Vec2::new(1.0, -2.0),
            w: 3.0,
        }];
        let mut data = SolverData {
            step: TimeStep::new(1.0 / 60.0, 0.0, &WorldSettings::default()),
            positions: &mut positions,
            velocities: &mut velocities,
        };
        joint.init_velocity_constraints(body, SolverBody::WORLD, &mut data);
        joint.solve_velocity_constraints(&mut data);
        assert!(velocities[0].v.length() < 1e-5);
        assert!(velocities[0].w.abs() < 1e-5);
        // The body pushes against the world anchor, so B's reaction opposes its motion.
        assert!(joint.reaction_torque(60.0) > 0.0);
    }

    #[test]
    fn test_weld_restores_reference_angle() {
        let mut joint = WeldJoint::new(Vec2::ZERO, Vec2::ZERO, 0.0);
        let a = SolverBody {
            index: Some(0),
            local_center: Vec2::ZERO,
            inv_mass: 1.0,
            inv_i: 1.0,
        };
        let b = SolverBody { index: Some(1), ..a };
        let mut positions = [Position::default(), Position { c: Vec2::ZERO, a: 0.1 }];
        let mut velocities = [Velocity::default(); 2];
        let mut data = SolverData {
            step: TimeStep::new(1.0 / 60.0, 0.0, &WorldSettings::default()),
            positions: &mut positions,
            velocities: &mut velocities,
        };
        joint.init_velocity_constraints(a, b, &mut data);
        joint.solve_position_constraints(&mut data);
        assert!(joint.solve_position_constraints(&mut data));
        assert!((positions[1].a - positions[0].a).abs() < ANGULAR_SLOP);
    }
}
