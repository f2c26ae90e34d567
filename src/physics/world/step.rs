use glam::Vec2;
use tracing::{debug, trace};

use super::{sinks, World};
use crate::physics::body::Body;
use crate::physics::body_description::BodyType;
use crate::physics::island::IslandContext;
use crate::physics::simulation_profiler::stages;
use crate::physics::solve_description::TimeStep;

impl World {
    /// Advances the world by `dt` seconds.
    ///
    /// Queued commands are applied first. With `dt == 0` or a disabled world nothing else
    /// happens. Otherwise controllers run, contacts are refreshed, islands are solved and,
    /// with continuous physics enabled, fast bodies are sub-stepped to their time of impact.
    pub fn step(&mut self, dt: f32) {
        debug_assert!(dt.is_finite() && dt >= 0.0, "step duration must be finite and non-negative");
        self.profile.clear();
        self.profile.start(stages::STEP);

        self.profile.start(stages::APPLY_CHANGES);
        self.apply_changes();
        self.profile.end(stages::APPLY_CHANGES);

        if dt == 0.0 || !self.enabled {
            self.profile.end(stages::STEP);
            return;
        }

        if self.new_contacts {
            self.profile.start(stages::NEW_CONTACTS);
            self.contact_manager.find_new_contacts(&mut self.bodies, &self.fixtures);
            self.new_contacts = false;
            self.profile.end(stages::NEW_CONTACTS);
        }

        let step = TimeStep::new(dt, self.inv_dt0, &self.settings);

        self.profile.start(stages::CONTROLLERS);
        for entry in self.controllers.values_mut().filter(|entry| entry.active) {
            entry.controller.update(&mut self.bodies, dt);
        }
        self.profile.end(stages::CONTROLLERS);

        self.profile.start(stages::COLLIDE);
        self.contact_manager
            .collide(&mut self.bodies, &self.fixtures, &mut sinks!(self));
        self.profile.end(stages::COLLIDE);

        if self.step_complete {
            self.profile.start(stages::SOLVE);
            self.solve(&step);
            self.profile.end(stages::SOLVE);
        }

        if self.settings.continuous_physics {
            self.profile.start(stages::SOLVE_TOI);
            self.solve_toi(&step);
            self.profile.end(stages::SOLVE_TOI);
        }

        self.inv_dt0 = step.inv_dt;

        if self.settings.auto_clear_forces {
            self.clear_forces();
        }

        self.profile.awake_body_count = self
            .bodies
            .values()
            .filter(|body| body.awake && body.body_type != BodyType::Static)
            .count();
        self.profile.contact_count = self.contact_manager.contact_count();
        self.profile.joint_count = self.joints.values().filter(|joint| joint.enabled).count();
        self.profile.end(stages::STEP);

        debug!(
            islands = self.profile.island_count,
            largest_island = self.profile.largest_island,
            toi_events = self.profile.toi_events,
            awake = self.profile.awake_body_count,
            contacts = self.profile.contact_count,
            "step finished"
        );
    }

    /// Builds islands from the awake constraint graph and solves each one.
    fn solve(&mut self, step: &TimeStep) {
        for body in self.bodies.values_mut() {
            body.island_flag = false;
        }
        for contact in self.contact_manager.contacts.values_mut() {
            contact.island_flag = false;
        }
        for joint in self.joints.values_mut() {
            joint.island_flag = false;
        }

        let mut island = std::mem::take(&mut self.island);
        let mut stack = Vec::with_capacity(self.bodies.len());

        for seed in self.bodies.handles() {
            {
                let body = &self.bodies[seed];
                if body.island_flag
                    || !body.awake
                    || !body.enabled
                    || !body.in_world
                    || body.body_type == BodyType::Static
                {
                    continue;
                }
            }

            island.clear();
            stack.clear();
            stack.push(seed);
            self.bodies[seed].island_flag = true;

            // Depth first search over the constraint graph.
            while let Some(handle) = stack.pop() {
                let body = &mut self.bodies[handle];
                debug_assert!(body.enabled);
                island.add_body(handle, body);
                body.awake = true;

                // Static bodies are leaves so islands do not merge across the ground.
                if body.body_type == BodyType::Static {
                    continue;
                }

                for edge in self.bodies[handle].contact_edges.clone() {
                    let Some(contact) = self.contact_manager.contacts.get_mut(edge.contact) else {
                        continue;
                    };
                    if contact.island_flag || !contact.enabled || !contact.touching {
                        continue;
                    }
                    let sensor = self.fixtures.get(contact.fixture_a).map_or(true, |f| f.is_sensor)
                        || self.fixtures.get(contact.fixture_b).map_or(true, |f| f.is_sensor);
                    if sensor {
                        continue;
                    }

                    contact.island_flag = true;
                    island.add_contact(edge.contact);

                    let other = &mut self.bodies[edge.other];
                    if other.island_flag {
                        continue;
                    }
                    other.island_flag = true;
                    stack.push(edge.other);
                }

                for edge in self.bodies[handle].joint_edges.clone() {
                    let Some(joint) = self.joints.get_mut(edge.joint) else {
                        continue;
                    };
                    if joint.island_flag || !joint.enabled {
                        continue;
                    }
                    match edge.other {
                        Some(other_handle) => {
                            let other = &mut self.bodies[other_handle];
                            if !other.enabled {
                                continue;
                            }
                            joint.island_flag = true;
                            island.add_joint(edge.joint);
                            if !other.island_flag {
                                other.island_flag = true;
                                stack.push(other_handle);
                            }
                        }
                        None => {
                            joint.island_flag = true;
                            island.add_joint(edge.joint);
                        }
                    }
                }
            }

            self.profile.record_island(island.bodies.len());
            trace!(
                bodies = island.bodies.len(),
                contacts = island.contacts.len(),
                joints = island.joints.len(),
                "solving island"
            );

            let mut ctx = IslandContext {
                bodies: &mut self.bodies,
                fixtures: &self.fixtures,
                contacts: &mut self.contact_manager.contacts,
                joints: &mut self.joints,
                sinks: sinks!(self),
            };
            island.solve(step, &self.settings, &mut ctx);

            // Static bodies may take part in other islands.
            for &handle in &island.bodies {
                let body = &mut self.bodies[handle];
                if body.body_type == BodyType::Static {
                    body.island_flag = false;
                }
            }
        }

        island.clear();
        self.island = island;

        for body in self.bodies.values() {
            if !body.island_flag || body.body_type == BodyType::Static {
                continue;
            }
            body.synchronize_fixtures(&mut self.fixtures, &mut *self.contact_manager.broad_phase);
        }

        self.profile.start(stages::NEW_CONTACTS);
        self.contact_manager.find_new_contacts(&mut self.bodies, &self.fixtures);
        self.profile.end(stages::NEW_CONTACTS);
    }

    /// Zeroes accumulated forces and torques. Called after every step unless
    /// `auto_clear_forces` is off.
    pub fn clear_forces(&mut self) {
        for body in self.bodies.values_mut() {
            body.force = Vec2::ZERO;
            body.torque = 0.0;
        }
    }

    /// Moves the world origin, translating every body, joint anchor and proxy by
    /// `-new_origin`. Useful for large worlds.
    pub fn shift_origin(&mut self, new_origin: Vec2) {
        debug_assert!(new_origin.is_finite());
        for body in self.bodies.values_mut() {
            shift_body(body, new_origin);
        }
        for joint in self.joints.values_mut() {
            joint.shift_origin(new_origin);
        }
        self.contact_manager.broad_phase.shift_origin(new_origin);
        for fixture in self.fixtures.values_mut() {
            for proxy in &mut fixture.proxies {
                proxy.aabb.min -= new_origin;
                proxy.aabb.max -= new_origin;
            }
        }
    }
}

fn shift_body(body: &mut Body, new_origin: Vec2) {
    body.xf.p -= new_origin;
    body.sweep.c0 -= new_origin;
    body.sweep.c -= new_origin;
}
