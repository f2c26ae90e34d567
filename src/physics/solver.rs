//! Sequential impulse solver for contact constraints.
//!
//! Each touching contact becomes one velocity constraint (normal and friction rows per manifold
//! point) and one position constraint. Friction is solved before the normal rows because the
//! non-penetration rows matter more; the last rows solved carry the most weight.

use glam::Vec2;

use super::body::Body;
use super::body_properties::{Position, Transform, Velocity};
use super::collidables::ConvexShape;
use super::collision_detection::{Contact, ContactImpulse, Manifold, ManifoldType, WorldManifold};
use super::fixture::Fixture;
use super::handles::{BodyHandle, ContactHandle, FixtureHandle};
use super::settings::{WorldSettings, LINEAR_SLOP, MAX_LINEAR_CORRECTION, MAX_MANIFOLD_POINTS};
use super::solve_description::TimeStep;
use crate::utilities::math_helper::{clamp, cross, cross_sv, cross_vs, EPSILON};
use crate::utilities::{Arena, Rot};

#[derive(Debug, Clone, Copy, Default)]
struct VelocityConstraintPoint {
    r_a: Vec2,
    r_b: Vec2,
    normal_impulse: f32,
    tangent_impulse: f32,
    normal_mass: f32,
    tangent_mass: f32,
    velocity_bias: f32,
}

/// Velocity rows for one contact.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ContactVelocityConstraint {
    points: [VelocityConstraintPoint; MAX_MANIFOLD_POINTS],
    normal: Vec2,
    index_a: usize,
    index_b: usize,
    inv_mass_a: f32,
    inv_mass_b: f32,
    inv_i_a: f32,
    inv_i_b: f32,
    friction: f32,
    restitution: f32,
    tangent_speed: f32,
    point_count: usize,
    pub(crate) contact: ContactHandle,
}

impl ContactVelocityConstraint {
    /// Impulses accumulated during the solve, in the form handed to post-solve listeners.
    pub(crate) fn impulse(&self) -> ContactImpulse {
        let mut impulse = ContactImpulse {
            count: self.point_count,
            ..Default::default()
        };
        for (j, point) in self.points[..self.point_count].iter().enumerate() {
            impulse.normal_impulses[j] = point.normal_impulse;
            impulse.tangent_impulses[j] = point.tangent_impulse;
        }
        impulse
    }
}

/// Position rows for one contact. Keeps the local manifold so the separation can be measured
/// again after every correction.
#[derive(Debug, Clone, Copy)]
struct ContactPositionConstraint {
    manifold: Manifold,
    index_a: usize,
    index_b: usize,
    inv_mass_a: f32,
    inv_mass_b: f32,
    inv_i_a: f32,
    inv_i_b: f32,
    local_center_a: Vec2,
    local_center_b: Vec2,
    radius_a: f32,
    radius_b: f32,
}

/// Separation data for one manifold point at the current solver positions.
struct PositionSolverManifold {
    normal: Vec2,
    point: Vec2,
    separation: f32,
}

impl PositionSolverManifold {
    fn new(pc: &ContactPositionConstraint, xf_a: &Transform, xf_b: &Transform, index: usize) -> Self {
        let manifold = &pc.manifold;
        debug_assert!(manifold.point_count > 0);
        match manifold.manifold_type {
            ManifoldType::Circles => {
                let point_a = xf_a.apply(manifold.local_point);
                let point_b = xf_b.apply(manifold.points[0].local_point);
                let delta = point_b - point_a;
                let normal = if delta.length_squared() > EPSILON * EPSILON {
                    delta.normalize()
                } else {
                    Vec2::X
                };
                Self {
                    normal,
                    point: 0.5 * (point_a + point_b),
                    separation: delta.dot(normal) - pc.radius_a - pc.radius_b,
                }
            }
            ManifoldType::FaceA => {
                let normal = xf_a.q.apply(manifold.local_normal);
                let plane_point = xf_a.apply(manifold.local_point);
                let clip_point = xf_b.apply(manifold.points[index].local_point);
                Self {
                    normal,
                    point: clip_point,
                    separation: (clip_point - plane_point).dot(normal) - pc.radius_a - pc.radius_b,
                }
            }
            ManifoldType::FaceB => {
                let normal = xf_b.q.apply(manifold.local_normal);
                let plane_point = xf_b.apply(manifold.local_point);
                let clip_point = xf_a.apply(manifold.points[index].local_point);
                // Keep the normal pointing from A to B.
                Self {
                    normal: -normal,
                    point: clip_point,
                    separation: (clip_point - plane_point).dot(normal) - pc.radius_a - pc.radius_b,
                }
            }
        }
    }
}

#[inline]
fn solver_transform(position: &Position, local_center: Vec2) -> Transform {
    let q = Rot::from_angle(position.a);
    Transform {
        p: position.c - q.apply(local_center),
        q,
    }
}

/// Solves the contact constraints of one island.
#[derive(Debug)]
pub(crate) struct ContactSolver {
    baumgarte: f32,
    toi_baumgarte: f32,
    velocity_threshold: f32,
    pub(crate) velocity_constraints: Vec<ContactVelocityConstraint>,
    position_constraints: Vec<ContactPositionConstraint>,
}

impl ContactSolver {
    /// Builds constraints for the given touching contacts. Bodies must already carry their
    /// island indices. Warm starting impulses are scaled by the step's `dt_ratio`.
    pub(crate) fn new(
        step: TimeStep,
        settings: &WorldSettings,
        contact_handles: &[ContactHandle],
        contacts: &Arena<ContactHandle, Contact>,
        fixtures: &Arena<FixtureHandle, Fixture>,
        bodies: &Arena<BodyHandle, Body>,
    ) -> Self {
        let mut velocity_constraints = Vec::with_capacity(contact_handles.len());
        let mut position_constraints = Vec::with_capacity(contact_handles.len());

        for &handle in contact_handles {
            let contact = &contacts[handle];
            let radius_a = fixtures[contact.fixture_a].shape.radius();
            let radius_b = fixtures[contact.fixture_b].shape.radius();
            let body_a = &bodies[contact.body_a];
            let body_b = &bodies[contact.body_b];
            let manifold = contact.manifold;
            debug_assert!(manifold.point_count > 0);

            let mut vc = ContactVelocityConstraint {
                points: [VelocityConstraintPoint::default(); MAX_MANIFOLD_POINTS],
                normal: Vec2::ZERO,
                index_a: body_a.island_index,
                index_b: body_b.island_index,
                inv_mass_a: body_a.inv_mass,
                inv_mass_b: body_b.inv_mass,
                inv_i_a: body_a.inv_inertia,
                inv_i_b: body_b.inv_inertia,
                friction: contact.friction,
                restitution: contact.restitution,
                tangent_speed: contact.tangent_speed,
                point_count: manifold.point_count,
                contact: handle,
            };
            for (vcp, cp) in vc.points.iter_mut().zip(manifold.points()) {
                if step.warm_starting {
                    vcp.normal_impulse = step.dt_ratio * cp.normal_impulse;
                    vcp.tangent_impulse = step.dt_ratio * cp.tangent_impulse;
                }
            }
            velocity_constraints.push(vc);

            position_constraints.push(ContactPositionConstraint {
                manifold,
                index_a: body_a.island_index,
                index_b: body_b.island_index,
                inv_mass_a: body_a.inv_mass,
                inv_mass_b: body_b.inv_mass,
                inv_i_a: body_a.inv_inertia,
                inv_i_b: body_b.inv_inertia,
                local_center_a: body_a.sweep.local_center,
                local_center_b: body_b.sweep.local_center,
                radius_a,
                radius_b,
            });
        }

        Self {
            baumgarte: settings.baumgarte,
            toi_baumgarte: settings.toi_baumgarte,
            velocity_threshold: settings.velocity_threshold,
            velocity_constraints,
            position_constraints,
        }
    }

    /// Computes anchors, effective masses and restitution bias at the current positions.
    pub(crate) fn initialize_velocity_constraints(&mut self, positions: &[Position], velocities: &[Velocity]) {
        for (vc, pc) in self.velocity_constraints.iter_mut().zip(&self.position_constraints) {
            let (m_a, m_b, i_a, i_b) = (vc.inv_mass_a, vc.inv_mass_b, vc.inv_i_a, vc.inv_i_b);
            let (pos_a, pos_b) = (positions[vc.index_a], positions[vc.index_b]);
            let (vel_a, vel_b) = (velocities[vc.index_a], velocities[vc.index_b]);

            let xf_a = solver_transform(&pos_a, pc.local_center_a);
            let xf_b = solver_transform(&pos_b, pc.local_center_b);
            let world_manifold = WorldManifold::new(&pc.manifold, &xf_a, pc.radius_a, &xf_b, pc.radius_b);

            vc.normal = world_manifold.normal;
            let tangent = cross_vs(vc.normal, 1.0);

            for (j, vcp) in vc.points[..vc.point_count].iter_mut().enumerate() {
                vcp.r_a = world_manifold.points[j] - pos_a.c;
                vcp.r_b = world_manifold.points[j] - pos_b.c;

                let rn_a = cross(vcp.r_a, vc.normal);
                let rn_b = cross(vcp.r_b, vc.normal);
                let k_normal = m_a + m_b + i_a * rn_a * rn_a + i_b * rn_b * rn_b;
                vcp.normal_mass = if k_normal > 0.0 { 1.0 / k_normal } else { 0.0 };

                let rt_a = cross(vcp.r_a, tangent);
                let rt_b = cross(vcp.r_b, tangent);
                let k_tangent = m_a + m_b + i_a * rt_a * rt_a + i_b * rt_b * rt_b;
                vcp.tangent_mass = if k_tangent > 0.0 { 1.0 / k_tangent } else { 0.0 };

                // Restitution only above the threshold approach speed.
                vcp.velocity_bias = 0.0;
                let v_rel = vc.normal.dot(
                    vel_b.v + cross_sv(vel_b.w, vcp.r_b) - vel_a.v - cross_sv(vel_a.w, vcp.r_a),
                );
                if v_rel < -self.velocity_threshold {
                    vcp.velocity_bias = -vc.restitution * v_rel;
                }
            }
        }
    }

    /// Applies the cached impulses to the velocities.
    pub(crate) fn warm_start(&self, velocities: &mut [Velocity]) {
        for vc in &self.velocity_constraints {
            let tangent = cross_vs(vc.normal, 1.0);
            let mut vel_a = velocities[vc.index_a];
            let mut vel_b = velocities[vc.index_b];
            for vcp in &vc.points[..vc.point_count] {
                let p = vcp.normal_impulse * vc.normal + vcp.tangent_impulse * tangent;
                vel_a.w -= vc.inv_i_a * cross(vcp.r_a, p);
                vel_a.v -= vc.inv_mass_a * p;
                vel_b.w += vc.inv_i_b * cross(vcp.r_b, p);
                vel_b.v += vc.inv_mass_b * p;
            }
            velocities[vc.index_a] = vel_a;
            velocities[vc.index_b] = vel_b;
        }
    }

    pub(crate) fn solve_velocity_constraints(&mut self, velocities: &mut [Velocity]) {
        for vc in &mut self.velocity_constraints {
            let (m_a, m_b, i_a, i_b) = (vc.inv_mass_a, vc.inv_mass_b, vc.inv_i_a, vc.inv_i_b);
            let mut vel_a = velocities[vc.index_a];
            let mut vel_b = velocities[vc.index_b];
            let normal = vc.normal;
            let tangent = cross_vs(normal, 1.0);

            for vcp in &mut vc.points[..vc.point_count] {
                let dv = vel_b.v + cross_sv(vel_b.w, vcp.r_b) - vel_a.v - cross_sv(vel_a.w, vcp.r_a);
                let vt = dv.dot(tangent) - vc.tangent_speed;
                let lambda = vcp.tangent_mass * -vt;

                // Coulomb cone approximated by a box on the accumulated impulse.
                let max_friction = vc.friction * vcp.normal_impulse;
                let new_impulse = clamp(vcp.tangent_impulse + lambda, -max_friction, max_friction);
                let lambda = new_impulse - vcp.tangent_impulse;
                vcp.tangent_impulse = new_impulse;

                let p = lambda * tangent;
                vel_a.v -= m_a * p;
                vel_a.w -= i_a * cross(vcp.r_a, p);
                vel_b.v += m_b * p;
                vel_b.w += i_b * cross(vcp.r_b, p);
            }

            for vcp in &mut vc.points[..vc.point_count] {
                let dv = vel_b.v + cross_sv(vel_b.w, vcp.r_b) - vel_a.v - cross_sv(vel_a.w, vcp.r_a);
                let vn = dv.dot(normal);
                let lambda = -vcp.normal_mass * (vn - vcp.velocity_bias);

                let new_impulse = (vcp.normal_impulse + lambda).max(0.0);
                let lambda = new_impulse - vcp.normal_impulse;
                vcp.normal_impulse = new_impulse;

                let p = lambda * normal;
                vel_a.v -= m_a * p;
                vel_a.w -= i_a * cross(vcp.r_a, p);
                vel_b.v += m_b * p;
                vel_b.w += i_b * cross(vcp.r_b, p);
            }

            velocities[vc.index_a] = vel_a;
            velocities[vc.index_b] = vel_b;
        }
    }

    /// Copies the accumulated impulses back into the contact manifolds for warm starting.
    pub(crate) fn store_impulses(&self, contacts: &mut Arena<ContactHandle, Contact>) {
        for vc in &self.velocity_constraints {
            let Some(contact) = contacts.get_mut(vc.contact) else {
                continue;
            };
            for (point, vcp) in contact.manifold.points[..vc.point_count].iter_mut().zip(&vc.points) {
                point.normal_impulse = vcp.normal_impulse;
                point.tangent_impulse = vcp.tangent_impulse;
            }
        }
    }

    /// One pass of non-linear Gauss-Seidel over penetration. Returns true once the deepest
    /// penetration is within three slops.
    pub(crate) fn solve_position_constraints(&self, positions: &mut [Position]) -> bool {
        let min_separation = self.correct_positions(positions, self.baumgarte, None);
        // Overlap cannot be pushed much past -LINEAR_SLOP.
        min_separation >= -3.0 * LINEAR_SLOP
    }

    /// Position pass used by time of impact sub-steps. Only the two bodies of the impact move;
    /// everything else in the mini island is treated as fixed.
    pub(crate) fn solve_toi_position_constraints(
        &self,
        positions: &mut [Position],
        toi_index_a: usize,
        toi_index_b: usize,
    ) -> bool {
        let min_separation = self.correct_positions(positions, self.toi_baumgarte, Some((toi_index_a, toi_index_b)));
        min_separation >= -1.5 * LINEAR_SLOP
    }

    fn correct_positions(&self, positions: &mut [Position], baumgarte: f32, movable: Option<(usize, usize)>) -> f32 {
        let mut min_separation = 0.0f32;

        for pc in &self.position_constraints {
            let (mut m_a, mut i_a, mut m_b, mut i_b) = (pc.inv_mass_a, pc.inv_i_a, pc.inv_mass_b, pc.inv_i_b);
            if let Some((toi_a, toi_b)) = movable {
                if pc.index_a != toi_a && pc.index_a != toi_b {
                    m_a = 0.0;
                    i_a = 0.0;
                }
                if pc.index_b != toi_a && pc.index_b != toi_b {
                    m_b = 0.0;
                    i_b = 0.0;
                }
            }

            let mut pos_a = positions[pc.index_a];
            let mut pos_b = positions[pc.index_b];

            for j in 0..pc.manifold.point_count {
                let xf_a = solver_transform(&pos_a, pc.local_center_a);
                let xf_b = solver_transform(&pos_b, pc.local_center_b);
                let psm = PositionSolverManifold::new(pc, &xf_a, &xf_b, j);

                let r_a = psm.point - pos_a.c;
                let r_b = psm.point - pos_b.c;
                min_separation = min_separation.min(psm.separation);

                // Leave a slop of overlap so contacts stay warm, and cap the correction.
                let c = clamp(baumgarte * (psm.separation + LINEAR_SLOP), -MAX_LINEAR_CORRECTION, 0.0);

                let rn_a = cross(r_a, psm.normal);
                let rn_b = cross(r_b, psm.normal);
                let k = m_a + m_b + i_a * rn_a * rn_a + i_b * rn_b * rn_b;
                let impulse = if k > 0.0 { -c / k } else { 0.0 };
                let p = impulse * psm.normal;

                pos_a.c -= m_a * p;
                pos_a.a -= i_a * cross(r_a, p);
                pos_b.c += m_b * p;
                pos_b.a += i_b * cross(r_b, p);
            }

            positions[pc.index_a] = pos_a;
            positions[pc.index_b] = pos_b;
        }

        min_separation
    }
}
