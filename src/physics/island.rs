//! Per-island solve: integrate velocities, run the sequential impulse solver over contacts and
//! joints, integrate positions and put resting islands to sleep.

use glam::Vec2;
use tracing::{trace, warn};

use super::body::Body;
use super::body_description::BodyType;
use super::body_properties::{Position, Velocity};
use super::collision_detection::{Contact, ContactSinks};
use super::constraints::{Joint, SolverBody, SolverData};
use super::events::WorldEvent;
use super::fixture::Fixture;
use super::handles::{BodyHandle, ContactHandle, FixtureHandle, JointHandle};
use super::settings::WorldSettings;
use super::solve_description::TimeStep;
use super::solver::ContactSolver;
use crate::utilities::math_helper::clamp;
use crate::utilities::Arena;

/// World state an island reads and writes while solving.
pub(crate) struct IslandContext<'a> {
    pub bodies: &'a mut Arena<BodyHandle, Body>,
    pub fixtures: &'a Arena<FixtureHandle, Fixture>,
    pub contacts: &'a mut Arena<ContactHandle, Contact>,
    pub joints: &'a mut Arena<JointHandle, Joint>,
    pub sinks: ContactSinks<'a>,
}

/// A connected group of bodies with the contacts and joints between them.
///
/// Reused across islands and steps; `clear` keeps the allocations.
#[derive(Debug, Default)]
pub(crate) struct Island {
    pub(crate) bodies: Vec<BodyHandle>,
    pub(crate) contacts: Vec<ContactHandle>,
    pub(crate) joints: Vec<JointHandle>,
    positions: Vec<Position>,
    velocities: Vec<Velocity>,
}

impl Island {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn clear(&mut self) {
        self.bodies.clear();
        self.contacts.clear();
        self.joints.clear();
    }

    /// Adds a body and records its slot in the solver arrays.
    pub(crate) fn add_body(&mut self, handle: BodyHandle, body: &mut Body) {
        body.island_index = self.bodies.len();
        self.bodies.push(handle);
    }

    pub(crate) fn add_contact(&mut self, handle: ContactHandle) {
        self.contacts.push(handle);
    }

    pub(crate) fn add_joint(&mut self, handle: JointHandle) {
        self.joints.push(handle);
    }

    fn load_state(&mut self, bodies: &Arena<BodyHandle, Body>) {
        self.positions.clear();
        self.velocities.clear();
        for &handle in &self.bodies {
            let body = &bodies[handle];
            self.positions.push(Position {
                c: body.sweep.c,
                a: body.sweep.a,
            });
            self.velocities.push(Velocity {
                v: body.linear_velocity,
                w: body.angular_velocity,
            });
        }
    }

    /// Integrates positions, clamping the motion of a single step.
    fn integrate_positions(&mut self, h: f32, settings: &WorldSettings) {
        for (position, velocity) in self.positions.iter_mut().zip(self.velocities.iter_mut()) {
            let translation = h * velocity.v;
            if translation.length_squared() > settings.max_translation * settings.max_translation {
                velocity.v *= settings.max_translation / translation.length();
            }

            let rotation = h * velocity.w;
            if rotation * rotation > settings.max_rotation * settings.max_rotation {
                velocity.w *= settings.max_rotation / rotation.abs();
            }

            position.c += h * velocity.v;
            position.a += h * velocity.w;
        }
    }

    /// Copies solver state back into the bodies.
    fn store_state(&self, bodies: &mut Arena<BodyHandle, Body>) {
        for (i, &handle) in self.bodies.iter().enumerate() {
            let body = &mut bodies[handle];
            body.sweep.c = self.positions[i].c;
            body.sweep.a = self.positions[i].a;
            body.linear_velocity = self.velocities[i].v;
            body.angular_velocity = self.velocities[i].w;
            body.synchronize_transform();
        }
    }

    fn report(contact_solver: &ContactSolver, ctx: &mut IslandContext) {
        for vc in &contact_solver.velocity_constraints {
            if let Some(contact) = ctx.contacts.get(vc.contact) {
                ctx.sinks
                    .listener
                    .post_solve(vc.contact, contact, &vc.impulse(), ctx.sinks.commands);
            }
        }
    }

    /// Solves one island for a full step.
    pub(crate) fn solve(&mut self, step: &TimeStep, settings: &WorldSettings, ctx: &mut IslandContext) {
        let h = step.dt;

        self.positions.clear();
        self.velocities.clear();
        for &handle in &self.bodies {
            let body = &mut ctx.bodies[handle];
            let c = body.sweep.c;
            let a = body.sweep.a;
            let mut v = body.linear_velocity;
            let mut w = body.angular_velocity;

            body.sweep.c0 = c;
            body.sweep.a0 = a;

            if body.body_type == BodyType::Dynamic {
                let gravity = if body.ignore_gravity {
                    Vec2::ZERO
                } else {
                    body.gravity_scale * settings.gravity
                };
                v += h * (gravity + body.inv_mass * body.force);
                w += h * body.inv_inertia * body.torque;

                // First order expansion of exp(-h * damping), clamped to [0, 1] for large steps.
                v *= clamp(1.0 - h * body.linear_damping, 0.0, 1.0);
                w *= clamp(1.0 - h * body.angular_damping, 0.0, 1.0);
            }

            self.positions.push(Position { c, a });
            self.velocities.push(Velocity { v, w });
        }

        let mut contact_solver =
            ContactSolver::new(*step, settings, &self.contacts, ctx.contacts, ctx.fixtures, ctx.bodies);
        contact_solver.initialize_velocity_constraints(&self.positions, &self.velocities);
        if step.warm_starting {
            contact_solver.warm_start(&mut self.velocities);
        }

        let mut data = SolverData {
            step: *step,
            positions: &mut self.positions,
            velocities: &mut self.velocities,
        };

        for &handle in &self.joints {
            let joint = &mut ctx.joints[handle];
            let a = solver_body(ctx.bodies, Some(joint.body_a));
            let b = solver_body(ctx.bodies, joint.body_b);
            joint.kind.solver_mut().init_velocity_constraints(a, b, &mut data);
        }

        for _ in 0..step.velocity_iterations {
            for &handle in &self.joints {
                ctx.joints[handle].kind.solver_mut().solve_velocity_constraints(&mut data);
            }
            contact_solver.solve_velocity_constraints(data.velocities);
        }

        contact_solver.store_impulses(ctx.contacts);

        for &handle in &self.joints {
            let joint = &mut ctx.joints[handle];
            if joint.exceeds_breakpoint(step.inv_dt) {
                let reaction_force = joint.reaction_force(step.inv_dt);
                let reaction_torque = joint.reaction_torque(step.inv_dt);
                joint.enabled = false;
                warn!(joint = %handle, ?reaction_force, reaction_torque, "joint broke");
                ctx.sinks.events.push(WorldEvent::JointBroke {
                    joint: handle,
                    reaction_force,
                    reaction_torque,
                });
            }
        }

        self.integrate_positions(h, settings);

        let mut data = SolverData {
            step: *step,
            positions: &mut self.positions,
            velocities: &mut self.velocities,
        };

        let mut position_solved = false;
        for _ in 0..step.position_iterations {
            let contacts_okay = contact_solver.solve_position_constraints(data.positions);

            let mut joints_okay = true;
            for &handle in &self.joints {
                let joint_okay = ctx.joints[handle]
                    .kind
                    .solver_mut()
                    .solve_position_constraints(&mut data);
                joints_okay = joints_okay && joint_okay;
            }

            if contacts_okay && joints_okay {
                position_solved = true;
                break;
            }
        }

        self.store_state(ctx.bodies);
        Self::report(&contact_solver, ctx);

        if !settings.allow_sleep {
            return;
        }

        let mut min_sleep_time = f32::MAX;
        let linear_tolerance_squared = settings.linear_sleep_tolerance * settings.linear_sleep_tolerance;
        let angular_tolerance_squared = settings.angular_sleep_tolerance * settings.angular_sleep_tolerance;

        for &handle in &self.bodies {
            let body = &mut ctx.bodies[handle];
            if body.body_type == BodyType::Static {
                continue;
            }

            if !body.sleeping_allowed
                || body.angular_velocity * body.angular_velocity > angular_tolerance_squared
                || body.linear_velocity.length_squared() > linear_tolerance_squared
            {
                body.sleep_time = 0.0;
                min_sleep_time = 0.0;
            } else {
                body.sleep_time += h;
                min_sleep_time = min_sleep_time.min(body.sleep_time);
            }
        }

        if min_sleep_time >= settings.time_to_sleep && position_solved {
            trace!(bodies = self.bodies.len(), "island fell asleep");
            for &handle in &self.bodies {
                let body = &mut ctx.bodies[handle];
                if body.body_type == BodyType::Static {
                    continue;
                }
                body.set_awake(false);
                ctx.sinks.events.push(WorldEvent::BodySlept { body: handle });
            }
        }
    }

    /// Solves a time of impact mini island for the remainder of the step.
    ///
    /// Only the two bodies at `toi_index_a` and `toi_index_b` are moved by the position pass;
    /// their sweeps then restart at the resolved pose. Velocities are solved without warm
    /// starting and the impulses are not stored.
    pub(crate) fn solve_toi(
        &mut self,
        sub_step: &TimeStep,
        toi_index_a: usize,
        toi_index_b: usize,
        settings: &WorldSettings,
        ctx: &mut IslandContext,
    ) {
        debug_assert!(toi_index_a < self.bodies.len() && toi_index_b < self.bodies.len());

        self.load_state(ctx.bodies);

        let mut contact_solver =
            ContactSolver::new(*sub_step, settings, &self.contacts, ctx.contacts, ctx.fixtures, ctx.bodies);

        for _ in 0..sub_step.position_iterations {
            if contact_solver.solve_toi_position_constraints(&mut self.positions, toi_index_a, toi_index_b) {
                break;
            }
        }

        // The impact bodies restart their sweeps from the resolved pose.
        for index in [toi_index_a, toi_index_b] {
            let body = &mut ctx.bodies[self.bodies[index]];
            body.sweep.c0 = self.positions[index].c;
            body.sweep.a0 = self.positions[index].a;
        }

        contact_solver.initialize_velocity_constraints(&self.positions, &self.velocities);
        for _ in 0..sub_step.velocity_iterations {
            contact_solver.solve_velocity_constraints(&mut self.velocities);
        }

        self.integrate_positions(sub_step.dt, settings);
        self.store_state(ctx.bodies);
        Self::report(&contact_solver, ctx);
    }
}

fn solver_body(bodies: &Arena<BodyHandle, Body>, handle: Option<BodyHandle>) -> SolverBody {
    match handle.and_then(|handle| bodies.get(handle)) {
        Some(body) => SolverBody {
            index: Some(body.island_index),
            local_center: body.sweep.local_center,
            inv_mass: body.inv_mass,
            inv_i: body.inv_inertia,
        },
        None => SolverBody::WORLD,
    }
}
