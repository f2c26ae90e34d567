use tracing::trace;

use super::{sinks, World};
use crate::physics::body_description::BodyType;
use crate::physics::collidables::ConvexShape;
use crate::physics::collision_detection::{time_of_impact, ToiInput, ToiState};
use crate::physics::handles::ContactHandle;
use crate::physics::island::IslandContext;
use crate::physics::solve_description::TimeStep;

impl World {
    /// Sub-steps the earliest time of impact events of the step until none is left, or until
    /// the first one when sub-stepping.
    pub(super) fn solve_toi(&mut self, step: &TimeStep) {
        let mut island = std::mem::take(&mut self.island);
        island.clear();

        if self.step_complete {
            for body in self.bodies.values_mut() {
                body.island_flag = false;
                body.sweep.alpha0 = 0.0;
            }
            for contact in self.contact_manager.contacts.values_mut() {
                contact.toi_flag = false;
                contact.island_flag = false;
                contact.toi_count = 0;
                contact.toi = 1.0;
            }
        }

        let contact_capacity = self.settings.max_toi_contacts;
        let body_capacity = 2 * contact_capacity;

        loop {
            let Some((min_contact, min_alpha)) = self.find_min_toi_contact() else {
                self.step_complete = true;
                break;
            };
            if 1.0 - 10.0 * f32::EPSILON < min_alpha {
                self.step_complete = true;
                break;
            }

            let (handle_a, handle_b) = {
                let contact = &self.contact_manager.contacts[min_contact];
                (contact.body_a, contact.body_b)
            };
            let backup_a = self.bodies[handle_a].sweep;
            let backup_b = self.bodies[handle_b].sweep;
            self.bodies[handle_a].advance(min_alpha);
            self.bodies[handle_b].advance(min_alpha);

            // The shapes are now close enough for the manifold to see the impact.
            self.contact_manager
                .update_contact(min_contact, &mut self.bodies, &self.fixtures, &mut sinks!(self));
            let Some(contact) = self.contact_manager.contacts.get_mut(min_contact) else {
                break;
            };
            contact.toi_flag = false;
            contact.toi_count += 1;

            if !contact.enabled || !contact.touching {
                contact.enabled = false;
                for (handle, backup) in [(handle_a, backup_a), (handle_b, backup_b)] {
                    let body = &mut self.bodies[handle];
                    body.sweep = backup;
                    body.synchronize_transform();
                }
                continue;
            }
            contact.island_flag = true;

            island.clear();
            for handle in [handle_a, handle_b] {
                let body = &mut self.bodies[handle];
                body.set_awake(true);
                body.island_flag = true;
                island.add_body(handle, body);
            }
            island.add_contact(min_contact);

            // Pull in touching neighbours that the impact bodies cannot pass through.
            for handle in [handle_a, handle_b] {
                if self.bodies[handle].body_type != BodyType::Dynamic {
                    continue;
                }
                let bullet = self.bodies[handle].bullet;

                for edge in self.bodies[handle].contact_edges.clone() {
                    if island.bodies.len() == body_capacity || island.contacts.len() == contact_capacity {
                        break;
                    }
                    let Some(contact) = self.contact_manager.contacts.get(edge.contact) else {
                        continue;
                    };
                    if contact.island_flag {
                        continue;
                    }
                    let other = &self.bodies[edge.other];
                    if other.body_type == BodyType::Dynamic && !bullet && !other.bullet {
                        continue;
                    }
                    let sensor = self.fixtures.get(contact.fixture_a).map_or(true, |f| f.is_sensor)
                        || self.fixtures.get(contact.fixture_b).map_or(true, |f| f.is_sensor);
                    if sensor {
                        continue;
                    }

                    let backup = other.sweep;
                    if !other.island_flag {
                        self.bodies[edge.other].advance(min_alpha);
                    }

                    self.contact_manager
                        .update_contact(edge.contact, &mut self.bodies, &self.fixtures, &mut sinks!(self));
                    let Some(contact) = self.contact_manager.contacts.get_mut(edge.contact) else {
                        continue;
                    };
                    if !contact.enabled || !contact.touching {
                        let other = &mut self.bodies[edge.other];
                        other.sweep = backup;
                        other.synchronize_transform();
                        continue;
                    }

                    contact.island_flag = true;
                    island.add_contact(edge.contact);

                    let other = &mut self.bodies[edge.other];
                    if other.island_flag {
                        continue;
                    }
                    other.island_flag = true;
                    if other.body_type != BodyType::Static {
                        other.set_awake(true);
                    }
                    island.add_body(edge.other, other);
                }
            }

            let sub_step = TimeStep::sub_step((1.0 - min_alpha) * step.dt, step, &self.settings);
            let index_a = self.bodies[handle_a].island_index;
            let index_b = self.bodies[handle_b].island_index;
            trace!(
                contact = %min_contact,
                alpha = min_alpha,
                bodies = island.bodies.len(),
                "solving time of impact"
            );

            let mut ctx = IslandContext {
                bodies: &mut self.bodies,
                fixtures: &self.fixtures,
                contacts: &mut self.contact_manager.contacts,
                joints: &mut self.joints,
                sinks: sinks!(self),
            };
            island.solve_toi(&sub_step, index_a, index_b, &self.settings, &mut ctx);
            self.profile.record_toi_island(island.bodies.len());

            // Invalidate cached impacts of everything that moved.
            for &handle in &island.bodies {
                let body = &mut self.bodies[handle];
                body.island_flag = false;
                if body.body_type != BodyType::Dynamic {
                    continue;
                }
                body.synchronize_fixtures(&mut self.fixtures, &mut *self.contact_manager.broad_phase);
                for edge in &body.contact_edges {
                    if let Some(contact) = self.contact_manager.contacts.get_mut(edge.contact) {
                        contact.toi_flag = false;
                        contact.island_flag = false;
                    }
                }
            }

            self.contact_manager.find_new_contacts(&mut self.bodies, &self.fixtures);

            if self.settings.sub_stepping {
                self.step_complete = false;
                break;
            }
        }

        island.clear();
        self.island = island;
    }

    /// Finds the contact with the earliest time of impact in the remainder of the step.
    fn find_min_toi_contact(&mut self) -> Option<(ContactHandle, f32)> {
        let mut min_contact = None;
        let mut min_alpha = 1.0;

        for handle in self.contact_manager.contacts.handles() {
            let contact = &self.contact_manager.contacts[handle];
            if !contact.enabled || contact.toi_count > self.settings.max_sub_steps {
                continue;
            }

            let alpha = if contact.toi_flag {
                contact.toi
            } else {
                match self.compute_toi(handle) {
                    Some(alpha) => alpha,
                    None => continue,
                }
            };

            if alpha < min_alpha {
                min_contact = Some(handle);
                min_alpha = alpha;
            }
        }

        min_contact.map(|contact| (contact, min_alpha))
    }

    /// Computes and caches the impact time of one contact as a fraction of the whole step.
    /// Returns `None` for pairs that are not eligible for continuous collision.
    fn compute_toi(&mut self, handle: ContactHandle) -> Option<f32> {
        let contact = self.contact_manager.contacts.get(handle)?;
        let fixture_a = self.fixtures.get(contact.fixture_a)?;
        let fixture_b = self.fixtures.get(contact.fixture_b)?;
        if fixture_a.is_sensor || fixture_b.is_sensor {
            return None;
        }

        let (body_a, body_b) = self.bodies.get_pair_mut(contact.body_a, contact.body_b)?;
        let active_a = body_a.awake && body_a.body_type != BodyType::Static;
        let active_b = body_b.awake && body_b.body_type != BodyType::Static;
        if !active_a && !active_b {
            return None;
        }

        // Dynamic bodies only get continuous collision against bullets and non-dynamic bodies.
        let collide_a = (body_a.bullet || body_a.body_type != BodyType::Dynamic)
            && (fixture_a.ignore_ccd_with & fixture_b.filter.category_bits) == 0
            && !body_a.ignore_ccd;
        let collide_b = (body_b.bullet || body_b.body_type != BodyType::Dynamic)
            && (fixture_b.ignore_ccd_with & fixture_a.filter.category_bits) == 0
            && !body_b.ignore_ccd;
        if !collide_a && !collide_b {
            return None;
        }

        // Bring both sweeps to the same start time.
        let mut alpha0 = body_a.sweep.alpha0;
        if body_a.sweep.alpha0 < body_b.sweep.alpha0 {
            alpha0 = body_b.sweep.alpha0;
            body_a.sweep.advance(alpha0);
        } else if body_b.sweep.alpha0 < body_a.sweep.alpha0 {
            alpha0 = body_a.sweep.alpha0;
            body_b.sweep.advance(alpha0);
        }
        debug_assert!(alpha0 < 1.0);

        let output = time_of_impact(&ToiInput {
            proxy_a: fixture_a.shape.distance_proxy(),
            proxy_b: fixture_b.shape.distance_proxy(),
            sweep_a: body_a.sweep,
            sweep_b: body_b.sweep,
            t_max: 1.0,
        });

        let alpha = if output.state == ToiState::Touching {
            (alpha0 + (1.0 - alpha0) * output.t).min(1.0)
        } else {
            1.0
        };

        let contact = self.contact_manager.contacts.get_mut(handle)?;
        contact.toi = alpha;
        contact.toi_flag = true;
        Some(alpha)
    }
}
