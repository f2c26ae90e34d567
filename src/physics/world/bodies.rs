use glam::Vec2;
use tracing::{trace, warn};

use super::{sinks, World};
use crate::physics::body::Body;
use crate::physics::body_description::{BodyDescription, BodyType};
use crate::physics::constraints::{Joint, JointDescription, JointKind, MouseJoint, RevoluteJoint};
use crate::physics::error::{WorldError, WorldResult};
use crate::physics::fixture::{Filter, Fixture, FixtureDescription};
use crate::physics::handles::{BodyHandle, FixtureHandle, JointHandle};

impl World {
    /// Creates a body. It joins the simulation at the start of the next step.
    pub fn create_body(&mut self, description: BodyDescription) -> BodyHandle {
        debug_assert!(description.is_valid(), "body description has non-finite values");
        let handle = self.bodies.insert(Body::new(&description));
        self.commands.add_body(handle);
        trace!(body = %handle, body_type = ?description.body_type, "body created");
        handle
    }

    /// Queues removal of a body along with its fixtures, contacts and joints.
    pub fn remove_body(&mut self, handle: BodyHandle) -> WorldResult<()> {
        if !self.bodies.contains(handle) {
            return Err(WorldError::UnknownBody(handle));
        }
        self.commands.remove_body(handle)
    }

    /// Attaches a fixture. Mass is recomputed when the fixture has density.
    pub fn create_fixture(&mut self, body_handle: BodyHandle, description: FixtureDescription) -> WorldResult<FixtureHandle> {
        let body = self
            .bodies
            .get_mut(body_handle)
            .ok_or(WorldError::UnknownBody(body_handle))?;
        let has_density = description.density > 0.0;
        let handle = self.fixtures.insert(Fixture::new(body_handle, description));
        body.fixtures.push(handle);

        if body.in_world && body.enabled {
            let xf = body.xf;
            self.fixtures[handle].create_proxies(&mut *self.contact_manager.broad_phase, &xf, handle);
            self.new_contacts = true;
        }
        if has_density {
            body.reset_mass_data(&self.fixtures);
        }
        Ok(handle)
    }

    /// Detaches and destroys a fixture immediately, ending its contacts.
    pub fn destroy_fixture(&mut self, handle: FixtureHandle) -> WorldResult<()> {
        let body_handle = self
            .fixtures
            .get(handle)
            .ok_or(WorldError::UnknownFixture(handle))?
            .body;

        self.contact_manager
            .destroy_fixture_contacts(handle, body_handle, &mut self.bodies, &mut sinks!(self));

        if let Some(mut fixture) = self.fixtures.remove(handle) {
            fixture.destroy_proxies(&mut *self.contact_manager.broad_phase);
        }
        if let Some(body) = self.bodies.get_mut(body_handle) {
            body.fixtures.retain(|&f| f != handle);
            body.reset_mass_data(&self.fixtures);
        }
        Ok(())
    }

    /// Changes collision filtering. Existing contacts are refiltered during the next collide.
    pub fn set_filter(&mut self, handle: FixtureHandle, filter: Filter) -> WorldResult<()> {
        let fixture = self
            .fixtures
            .get_mut(handle)
            .ok_or(WorldError::UnknownFixture(handle))?;
        fixture.filter = filter;
        fixture.touch_proxies(&mut *self.contact_manager.broad_phase);
        if let Some(body) = self.bodies.get(fixture.body) {
            self.contact_manager.flag_fixture_for_filtering(body, handle);
        }
        Ok(())
    }

    /// Stops all collision between two bodies until restored.
    pub fn ignore_collision_between(&mut self, a: BodyHandle, b: BodyHandle) -> WorldResult<()> {
        for handle in [a, b] {
            if !self.bodies.contains(handle) {
                return Err(WorldError::UnknownBody(handle));
            }
        }
        if self.contact_manager.ignore_pair(a, b) {
            self.contact_manager.flag_pair_for_filtering(&self.bodies[a], b);
        }
        Ok(())
    }

    /// Undoes [`World::ignore_collision_between`].
    pub fn restore_collision_between(&mut self, a: BodyHandle, b: BodyHandle) -> WorldResult<()> {
        for handle in [a, b] {
            if !self.bodies.contains(handle) {
                return Err(WorldError::UnknownBody(handle));
            }
        }
        if self.contact_manager.restore_pair(a, b) {
            // Overlapping pairs are only reported for moved proxies.
            for &fixture in &self.bodies[a].fixtures {
                if let Some(fixture) = self.fixtures.get(fixture) {
                    fixture.touch_proxies(&mut *self.contact_manager.broad_phase);
                }
            }
            self.new_contacts = true;
        }
        Ok(())
    }

    /// Recomputes mass, center and inertia from the fixtures' densities.
    pub fn reset_mass_data(&mut self, handle: BodyHandle) -> WorldResult<()> {
        let body = self.bodies.get_mut(handle).ok_or(WorldError::UnknownBody(handle))?;
        body.reset_mass_data(&self.fixtures);
        let massless = body.fixtures.iter().all(|f| self.fixtures.get(*f).map_or(true, |f| f.density == 0.0));
        if body.body_type == BodyType::Dynamic && !body.fixtures.is_empty() && massless {
            warn!(body = %handle, "dynamic body has no fixture with density, using unit mass");
        }
        Ok(())
    }

    /// Changes the body type, resetting mass and dropping the body's contacts.
    pub fn set_body_type(&mut self, handle: BodyHandle, body_type: BodyType) -> WorldResult<()> {
        let body = self.bodies.get_mut(handle).ok_or(WorldError::UnknownBody(handle))?;
        if body.body_type == body_type {
            return Ok(());
        }
        body.body_type = body_type;
        body.reset_mass_data(&self.fixtures);

        if body_type == BodyType::Static {
            body.linear_velocity = Vec2::ZERO;
            body.angular_velocity = 0.0;
            body.sweep.a0 = body.sweep.a;
            body.sweep.c0 = body.sweep.c;
            body.awake = false;
            body.synchronize_fixtures(&mut self.fixtures, &mut *self.contact_manager.broad_phase);
        }

        body.set_awake(true);
        body.force = Vec2::ZERO;
        body.torque = 0.0;

        self.contact_manager
            .destroy_body_contacts(handle, &mut self.bodies, &mut sinks!(self));

        for &fixture in &self.bodies[handle].fixtures {
            if let Some(fixture) = self.fixtures.get(fixture) {
                fixture.touch_proxies(&mut *self.contact_manager.broad_phase);
            }
        }
        Ok(())
    }

    /// Teleports a body. Contacts are updated during the next step.
    pub fn set_transform(&mut self, handle: BodyHandle, position: Vec2, angle: f32) -> WorldResult<()> {
        debug_assert!(position.is_finite() && angle.is_finite());
        let body = self.bodies.get_mut(handle).ok_or(WorldError::UnknownBody(handle))?;
        body.set_transform_internal(position, angle);

        let xf = body.xf;
        for &fixture in &body.fixtures {
            if let Some(fixture) = self.fixtures.get_mut(fixture) {
                fixture.synchronize(&mut *self.contact_manager.broad_phase, &xf, &xf);
            }
        }
        self.new_contacts = true;
        Ok(())
    }

    /// Enables or disables a body. Disabled bodies have no proxies or contacts and are skipped
    /// by the solver; joints to them stay but are not solved.
    pub fn set_body_enabled(&mut self, handle: BodyHandle, flag: bool) -> WorldResult<()> {
        let body = self.bodies.get_mut(handle).ok_or(WorldError::UnknownBody(handle))?;
        if body.enabled == flag {
            return Ok(());
        }
        body.enabled = flag;
        if !body.in_world {
            return Ok(());
        }

        if flag {
            let xf = body.xf;
            for &fixture in &body.fixtures {
                if let Some(f) = self.fixtures.get_mut(fixture) {
                    f.create_proxies(&mut *self.contact_manager.broad_phase, &xf, fixture);
                }
            }
            self.new_contacts = true;
        } else {
            for &fixture in &body.fixtures {
                if let Some(f) = self.fixtures.get_mut(fixture) {
                    f.destroy_proxies(&mut *self.contact_manager.broad_phase);
                }
            }
            self.contact_manager
                .destroy_body_contacts(handle, &mut self.bodies, &mut sinks!(self));
        }
        Ok(())
    }

    /// Locks or unlocks rotation. Mass data is recomputed.
    pub fn set_fixed_rotation(&mut self, handle: BodyHandle, flag: bool) -> WorldResult<()> {
        let body = self.bodies.get_mut(handle).ok_or(WorldError::UnknownBody(handle))?;
        if body.fixed_rotation == flag {
            return Ok(());
        }
        body.fixed_rotation = flag;
        body.angular_velocity = 0.0;
        body.reset_mass_data(&self.fixtures);
        Ok(())
    }

    /// Creates a joint. It is solved from the next step on.
    pub fn create_joint(&mut self, description: JointDescription) -> WorldResult<JointHandle> {
        description
            .validate()
            .map_err(|reason| WorldError::InvalidJoint { reason })?;
        for handle in std::iter::once(description.body_a).chain(description.body_b) {
            if !self.bodies.contains(handle) {
                return Err(WorldError::UnknownBody(handle));
            }
        }
        let handle = self.joints.insert(Joint::new(description));
        self.commands.add_joint(handle);
        trace!(joint = %handle, "joint created");
        Ok(handle)
    }

    /// Queues removal of a joint. Both bodies are woken when it is removed.
    pub fn remove_joint(&mut self, handle: JointHandle) -> WorldResult<()> {
        if !self.joints.contains(handle) {
            return Err(WorldError::UnknownJoint(handle));
        }
        self.commands.remove_joint(handle)
    }

    /// Pins two bodies together at a world point. With `b` as `None` body `a` is pinned to the
    /// world.
    pub fn create_revolute_joint(
        &mut self,
        a: BodyHandle,
        b: Option<BodyHandle>,
        world_anchor: Vec2,
    ) -> WorldResult<JointHandle> {
        let body_a = self.bodies.get(a).ok_or(WorldError::UnknownBody(a))?;
        let local_a = body_a.local_point(world_anchor);
        let (local_b, reference_angle) = match b {
            Some(b) => {
                let body_b = self.bodies.get(b).ok_or(WorldError::UnknownBody(b))?;
                (body_b.local_point(world_anchor), body_b.angle() - body_a.angle())
            }
            None => (world_anchor, -body_a.angle()),
        };
        self.create_joint(JointDescription::new(
            a,
            b,
            RevoluteJoint::new(local_a, local_b, reference_angle),
        ))
    }

    /// Grabs a body at a world point, dragging it toward a target with at most `max_force`.
    pub fn create_mouse_joint(&mut self, body: BodyHandle, target: Vec2, max_force: f32) -> WorldResult<JointHandle> {
        let local_anchor = self
            .bodies
            .get(body)
            .ok_or(WorldError::UnknownBody(body))?
            .local_point(target);
        self.create_joint(JointDescription::new(
            body,
            None,
            MouseJoint::new(local_anchor, target, max_force),
        ))
    }

    /// Moves the target of a mouse joint and wakes its body.
    pub fn set_mouse_target(&mut self, handle: JointHandle, target: Vec2) -> WorldResult<()> {
        let joint = self.joints.get_mut(handle).ok_or(WorldError::UnknownJoint(handle))?;
        let JointKind::Mouse(mouse) = &mut joint.kind else {
            return Err(WorldError::InvalidJoint {
                reason: "only mouse joints have a target",
            });
        };
        mouse.target = target;
        if let Some(body) = self.bodies.get_mut(joint.body_a) {
            body.set_awake(true);
        }
        Ok(())
    }

    /// Enables or disables a joint, waking its bodies. A broken joint can be re-enabled.
    pub fn set_joint_enabled(&mut self, handle: JointHandle, flag: bool) -> WorldResult<()> {
        let joint = self.joints.get_mut(handle).ok_or(WorldError::UnknownJoint(handle))?;
        if joint.enabled == flag {
            return Ok(());
        }
        joint.enabled = flag;
        for body in std::iter::once(joint.body_a).chain(joint.body_b) {
            if let Some(body) = self.bodies.get_mut(body) {
                body.set_awake(true);
            }
        }
        Ok(())
    }
}
