//! The world owns every body, fixture, joint and controller, and advances them in time.
//!
//! Topology edits that add or remove bodies, joints and controllers are queued in a
//! [`CommandBuffer`] and applied at the start of the next [`World::step`]. Contact callbacks get
//! the same buffer, so they can request removals without touching the world mid-step.

mod bodies;
mod queries;
mod step;
mod toi;

use tracing::{debug, trace, warn};

pub use self::queries::RayHit;

use super::body::{Body, JointEdge};
use super::body_description::BodyDescription;
use super::collision_detection::{
    BroadPhase, Contact, ContactFilter, ContactListener, ContactManager, NoopContactListener, WorldManifold,
};
use super::commands::{Command, CommandBuffer};
use super::constraints::{Joint, JointDescription};
use super::controllers::Controller;
use super::error::{WorldError, WorldResult};
use super::events::WorldEvent;
use super::fixture::{Fixture, FixtureDescription};
use super::handles::{BodyHandle, ContactHandle, ControllerHandle, FixtureHandle, JointHandle};
use super::island::Island;
use super::settings::WorldSettings;
use super::simulation_profiler::StepProfile;
use crate::physics::collidables::ConvexShape;
use crate::utilities::Arena;

/// Builds the notification sinks from disjoint world fields.
macro_rules! sinks {
    ($world:ident) => {
        $crate::physics::collision_detection::ContactSinks {
            listener: &mut *$world.listener,
            events: &mut $world.events,
            commands: &mut $world.commands,
        }
    };
}
pub(crate) use sinks;

struct ControllerEntry {
    controller: Box<dyn Controller>,
    active: bool,
}

/// A 2D rigid body simulation.
pub struct World {
    settings: WorldSettings,
    bodies: Arena<BodyHandle, Body>,
    fixtures: Arena<FixtureHandle, Fixture>,
    joints: Arena<JointHandle, Joint>,
    controllers: Arena<ControllerHandle, ControllerEntry>,
    contact_manager: ContactManager,
    listener: Box<dyn ContactListener>,
    commands: CommandBuffer,
    events: Vec<WorldEvent>,
    island: Island,
    profile: StepProfile,
    /// Inverse of the previous step's duration, zero before the first step.
    inv_dt0: f32,
    /// False while sub-stepping has time of impact events left over from the last step.
    step_complete: bool,
    /// Set when proxies were created or moved outside a step.
    new_contacts: bool,
    enabled: bool,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("settings", &self.settings)
            .field("bodies", &self.bodies.len())
            .field("fixtures", &self.fixtures.len())
            .field("joints", &self.joints.len())
            .field("controllers", &self.controllers.len())
            .field("contacts", &self.contact_manager.contact_count())
            .field("pending_commands", &self.commands.len())
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl World {
    /// Creates an empty world with a dynamic tree broad phase.
    pub fn new(settings: WorldSettings) -> WorldResult<Self> {
        Self::with_contact_manager(settings, ContactManager::default())
    }

    /// Creates an empty world using the given broad phase.
    pub fn with_broad_phase(settings: WorldSettings, broad_phase: Box<dyn BroadPhase>) -> WorldResult<Self> {
        Self::with_contact_manager(settings, ContactManager::new(broad_phase))
    }

    fn with_contact_manager(settings: WorldSettings, contact_manager: ContactManager) -> WorldResult<Self> {
        settings.validate()?;
        debug!(gravity = ?settings.gravity, "world created");
        Ok(Self {
            settings,
            bodies: Arena::new(),
            fixtures: Arena::new(),
            joints: Arena::new(),
            controllers: Arena::new(),
            contact_manager,
            listener: Box::new(NoopContactListener),
            commands: CommandBuffer::new(),
            events: Vec::new(),
            island: Island::new(),
            profile: StepProfile::new(),
            inv_dt0: 0.0,
            step_complete: true,
            new_contacts: false,
            enabled: true,
        })
    }

    /// Replaces the contact listener.
    pub fn set_contact_listener(&mut self, listener: Box<dyn ContactListener>) {
        self.listener = listener;
    }

    /// Installs a user filter consulted after the fixture filters, or removes it.
    pub fn set_contact_filter(&mut self, filter: Option<Box<dyn ContactFilter>>) {
        self.contact_manager.filter = filter;
    }

    #[inline]
    pub fn settings(&self) -> &WorldSettings {
        &self.settings
    }

    /// Changes settings for subsequent steps.
    pub fn set_settings(&mut self, settings: WorldSettings) -> WorldResult<()> {
        settings.validate()?;
        self.settings = settings;
        Ok(())
    }

    #[inline]
    pub fn gravity(&self) -> glam::Vec2 {
        self.settings.gravity
    }

    pub fn set_gravity(&mut self, gravity: glam::Vec2) {
        debug_assert!(gravity.is_finite());
        self.settings.gravity = gravity;
    }

    /// A disabled world ignores `step`.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, flag: bool) {
        self.enabled = flag;
    }

    /// Counters and stage timings of the previous step.
    #[inline]
    pub fn profile(&self) -> &StepProfile {
        &self.profile
    }

    /// Removes and returns the events recorded since the last drain.
    pub fn drain_events(&mut self) -> impl Iterator<Item = WorldEvent> + '_ {
        self.events.drain(..)
    }

    /// Commands waiting for the next step.
    #[inline]
    pub fn pending_commands(&self) -> &CommandBuffer {
        &self.commands
    }

    #[inline]
    pub fn body(&self, handle: BodyHandle) -> Option<&Body> {
        self.bodies.get(handle)
    }

    /// Mutable access for velocities, forces, impulses and flags that need no broad phase
    /// update. Placement, type and enabled state changes go through the world.
    #[inline]
    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut Body> {
        self.bodies.get_mut(handle)
    }

    #[inline]
    pub fn fixture(&self, handle: FixtureHandle) -> Option<&Fixture> {
        self.fixtures.get(handle)
    }

    /// Mutable access to material and user data. Filtering changes go through
    /// [`World::set_filter`].
    #[inline]
    pub fn fixture_mut(&mut self, handle: FixtureHandle) -> Option<&mut Fixture> {
        self.fixtures.get_mut(handle)
    }

    #[inline]
    pub fn joint(&self, handle: JointHandle) -> Option<&Joint> {
        self.joints.get(handle)
    }

    #[inline]
    pub fn joint_mut(&mut self, handle: JointHandle) -> Option<&mut Joint> {
        self.joints.get_mut(handle)
    }

    #[inline]
    pub fn contact(&self, handle: ContactHandle) -> Option<&Contact> {
        self.contact_manager.contacts.get(handle)
    }

    /// Contacts can be disabled for the current step or have their material overridden.
    #[inline]
    pub fn contact_mut(&mut self, handle: ContactHandle) -> Option<&mut Contact> {
        self.contact_manager.contacts.get_mut(handle)
    }

    /// Manifold of a contact in world coordinates.
    pub fn world_manifold(&self, handle: ContactHandle) -> Option<WorldManifold> {
        let contact = self.contact_manager.contacts.get(handle)?;
        let fixture_a = self.fixtures.get(contact.fixture_a)?;
        let fixture_b = self.fixtures.get(contact.fixture_b)?;
        let body_a = self.bodies.get(contact.body_a)?;
        let body_b = self.bodies.get(contact.body_b)?;
        Some(contact.world_manifold(
            &body_a.xf,
            fixture_a.shape.radius(),
            &body_b.xf,
            fixture_b.shape.radius(),
        ))
    }

    pub fn bodies(&self) -> impl Iterator<Item = (BodyHandle, &Body)> {
        self.bodies.iter()
    }

    pub fn fixtures(&self) -> impl Iterator<Item = (FixtureHandle, &Fixture)> {
        self.fixtures.iter()
    }

    pub fn joints(&self) -> impl Iterator<Item = (JointHandle, &Joint)> {
        self.joints.iter()
    }

    pub fn contacts(&self) -> impl Iterator<Item = (ContactHandle, &Contact)> {
        self.contact_manager.contacts.iter()
    }

    /// Bodies owned by the world, including ones whose addition is still queued.
    #[inline]
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    #[inline]
    pub fn fixture_count(&self) -> usize {
        self.fixtures.len()
    }

    #[inline]
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }

    #[inline]
    pub fn contact_count(&self) -> usize {
        self.contact_manager.contact_count()
    }

    #[inline]
    pub fn proxy_count(&self) -> usize {
        self.contact_manager.broad_phase().proxy_count()
    }

    #[inline]
    pub fn contact_manager(&self) -> &ContactManager {
        &self.contact_manager
    }

    /// Queues a controller. It runs from the next step on.
    pub fn add_controller(&mut self, controller: impl Controller + 'static) -> ControllerHandle {
        let handle = self.controllers.insert(ControllerEntry {
            controller: Box::new(controller),
            active: false,
        });
        self.commands.add_controller(handle);
        handle
    }

    /// Queues removal of a controller.
    pub fn remove_controller(&mut self, handle: ControllerHandle) -> WorldResult<()> {
        if !self.controllers.contains(handle) {
            return Err(WorldError::UnknownController(handle));
        }
        self.commands.remove_controller(handle)
    }

    /// Applies queued commands in order. Commands naming entities that no longer exist are
    /// skipped with a warning.
    fn apply_changes(&mut self) {
        for command in self.commands.take() {
            match command {
                Command::AddBody(handle) => self.add_body_now(handle),
                Command::RemoveBody(handle) => self.remove_body_now(handle),
                Command::AddJoint(handle) => self.add_joint_now(handle),
                Command::RemoveJoint(handle) => self.remove_joint_now(handle),
                Command::AddController(handle) => match self.controllers.get_mut(handle) {
                    Some(entry) => entry.active = true,
                    None => warn!(controller = %handle, "skipping addition of removed controller"),
                },
                Command::RemoveController(handle) => {
                    if self.controllers.remove(handle).is_none() {
                        warn!(controller = %handle, "skipping removal of unknown controller");
                    }
                }
                Command::SpawnBody { description, fixtures } => self.spawn_body_now(&description, fixtures),
                Command::SpawnJoint(description) => self.spawn_joint_now(description),
            }
        }
    }

    fn add_body_now(&mut self, handle: BodyHandle) {
        let Some(body) = self.bodies.get_mut(handle) else {
            warn!(body = %handle, "skipping addition of removed body");
            return;
        };
        body.in_world = true;
        if body.enabled {
            let xf = body.xf;
            for &fixture_handle in &body.fixtures {
                if let Some(fixture) = self.fixtures.get_mut(fixture_handle) {
                    fixture.create_proxies(&mut *self.contact_manager.broad_phase, &xf, fixture_handle);
                }
            }
        }
        self.new_contacts = true;
    }

    fn spawn_body_now(&mut self, description: &BodyDescription, fixtures: Vec<FixtureDescription>) {
        let handle = self.bodies.insert(Body::new(description));
        for fixture in fixtures {
            if let Err(err) = self.create_fixture(handle, fixture) {
                warn!(body = %handle, %err, "dropping fixture of spawned body");
            }
        }
        self.add_body_now(handle);
        self.events.push(WorldEvent::BodySpawned { body: handle });
        trace!(body = %handle, "body spawned");
    }

    fn spawn_joint_now(&mut self, description: JointDescription) {
        if let Err(reason) = description.validate() {
            warn!(body_a = %description.body_a, reason, "dropping invalid spawned joint");
            return;
        }
        let bodies_live =
            self.bodies.contains(description.body_a) && description.body_b.map_or(true, |b| self.bodies.contains(b));
        if !bodies_live {
            warn!(body_a = %description.body_a, "dropping spawned joint whose body is gone");
            return;
        }
        let handle = self.joints.insert(Joint::new(description));
        self.add_joint_now(handle);
        self.events.push(WorldEvent::JointSpawned { joint: handle });
        trace!(joint = %handle, "joint spawned");
    }

    /// Removes a body with its joints, contacts and fixtures.
    fn remove_body_now(&mut self, handle: BodyHandle) {
        let Some(body) = self.bodies.get(handle) else {
            warn!(body = %handle, "skipping removal of unknown body");
            return;
        };
        let joints: Vec<JointHandle> = body.joint_edges.iter().map(|edge| edge.joint).collect();
        for joint in joints {
            self.remove_joint_now(joint);
        }

        self.contact_manager
            .destroy_body_contacts(handle, &mut self.bodies, &mut sinks!(self));

        let fixtures = std::mem::take(&mut self.bodies[handle].fixtures);
        for fixture_handle in fixtures {
            if let Some(mut fixture) = self.fixtures.remove(fixture_handle) {
                fixture.destroy_proxies(&mut *self.contact_manager.broad_phase);
            }
        }

        self.contact_manager.forget_body(handle);
        self.bodies.remove(handle);
        debug!(body = %handle, "body removed");
    }

    fn add_joint_now(&mut self, handle: JointHandle) {
        let Some(joint) = self.joints.get_mut(handle) else {
            warn!(joint = %handle, "skipping addition of removed joint");
            return;
        };
        let (body_a, body_b, collide_connected) = (joint.body_a, joint.body_b, joint.collide_connected);
        let bodies_live = self.bodies.contains(body_a) && body_b.map_or(true, |b| self.bodies.contains(b));
        if !bodies_live {
            warn!(joint = %handle, "dropping joint whose body was removed first");
            self.joints.remove(handle);
            return;
        }
        joint.in_world = true;

        self.bodies[body_a].joint_edges.push(JointEdge {
            other: body_b,
            joint: handle,
            collide_connected,
        });
        self.bodies[body_a].set_awake(true);
        if let Some(body_b) = body_b {
            let body = &mut self.bodies[body_b];
            body.joint_edges.push(JointEdge {
                other: Some(body_a),
                joint: handle,
                collide_connected,
            });
            body.set_awake(true);

            if !collide_connected {
                self.contact_manager.flag_pair_for_filtering(&self.bodies[body_a], body_b);
            }
        }
    }

    fn remove_joint_now(&mut self, handle: JointHandle) {
        let Some(joint) = self.joints.remove(handle) else {
            warn!(joint = %handle, "skipping removal of unknown joint");
            return;
        };

        for body_handle in std::iter::once(joint.body_a).chain(joint.body_b) {
            if let Some(body) = self.bodies.get_mut(body_handle) {
                body.joint_edges.retain(|edge| edge.joint != handle);
                body.set_awake(true);
            }
        }

        if !joint.collide_connected {
            if let (Some(body_a), Some(body_b)) = (self.bodies.get(joint.body_a), joint.body_b) {
                self.contact_manager.flag_pair_for_filtering(body_a, body_b);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::collidables::CircleShape;
    use crate::physics::constraints::RevoluteJoint;
    use glam::Vec2;

    #[test]
    fn test_invalid_settings_are_rejected() {
        let settings = WorldSettings {
            baumgarte: 2.0,
            ..Default::default()
        };
        assert!(matches!(
            World::new(settings),
            Err(WorldError::InvalidSettings { .. })
        ));
    }

    #[test]
    fn test_body_joins_world_on_next_step() {
        let mut world = World::new(WorldSettings::default()).unwrap();
        let body = world.create_body(BodyDescription::create_dynamic(Vec2::ZERO));
        world
            .create_fixture(body, FixtureDescription::new(CircleShape::new(0.5).unwrap()).with_density(1.0))
            .unwrap();
        assert!(!world.body(body).unwrap().is_in_world());
        assert_eq!(world.proxy_count(), 0);

        world.step(1.0 / 60.0);
        assert!(world.body(body).unwrap().is_in_world());
        assert_eq!(world.proxy_count(), 1);
    }

    #[test]
    fn test_removing_body_cascades() {
        let mut world = World::new(WorldSettings::default()).unwrap();
        let a = world.create_body(BodyDescription::create_dynamic(Vec2::ZERO));
        let b = world.create_body(BodyDescription::create_dynamic(Vec2::new(0.5, 0.0)));
        for body in [a, b] {
            world
                .create_fixture(body, FixtureDescription::new(CircleShape::new(0.5).unwrap()).with_density(1.0))
                .unwrap();
        }
        let joint = world
            .create_joint(
                JointDescription::new(a, Some(b), RevoluteJoint::new(Vec2::ZERO, Vec2::ZERO, 0.0))
                    .with_collide_connected(true),
            )
            .unwrap();
        world.step(1.0 / 60.0);
        assert_eq!(world.contact_count(), 1);

        world.remove_body(a).unwrap();
        assert_eq!(world.remove_body(a), Err(WorldError::BodyPendingRemoval(a)));
        world.step(1.0 / 60.0);

        assert!(world.body(a).is_none());
        assert!(world.joint(joint).is_none());
        assert_eq!(world.contact_count(), 0);
        assert_eq!(world.fixture_count(), 1);
        assert!(world.body(b).unwrap().joint_edges().is_empty());
        assert!(world.body(b).unwrap().contact_edges().is_empty());
    }

    #[test]
    fn test_unknown_handles_are_errors() {
        let mut world = World::new(WorldSettings::default()).unwrap();
        assert_eq!(
            world.remove_body(BodyHandle::new(4, 0)),
            Err(WorldError::UnknownBody(BodyHandle::new(4, 0)))
        );
        assert_eq!(
            world.remove_joint(JointHandle::new(0, 0)),
            Err(WorldError::UnknownJoint(JointHandle::new(0, 0)))
        );
        assert_eq!(
            world.remove_controller(ControllerHandle::new(1, 0)),
            Err(WorldError::UnknownController(ControllerHandle::new(1, 0)))
        );
    }

    #[test]
    fn test_stale_handles_do_not_reach_new_entities() {
        let mut world = World::new(WorldSettings::default()).unwrap();
        let anchor = world.create_body(BodyDescription::create_static(Vec2::ZERO));
        let old = world.create_body(BodyDescription::create_dynamic(Vec2::new(-4.0, 0.0)));
        let old_joint = world
            .create_joint(JointDescription::new(anchor, Some(old), RevoluteJoint::new(Vec2::ZERO, Vec2::ZERO, 0.0)))
            .unwrap();
        world.step(1.0 / 60.0);
        world.remove_body(old).unwrap();
        world.step(1.0 / 60.0);

        // The freed slots are reused by the next body and joint.
        let new = world.create_body(BodyDescription::create_static(Vec2::new(3.0, 0.0)));
        let new_joint = world
            .create_joint(JointDescription::new(anchor, Some(new), RevoluteJoint::new(Vec2::ZERO, Vec2::ZERO, 0.0)))
            .unwrap();
        assert_eq!(new.index(), old.index());
        assert_eq!(new_joint.index(), old_joint.index());
        assert_ne!(new, old);

        assert!(world.body(old).is_none());
        assert!(world.joint(old_joint).is_none());
        assert_eq!(world.remove_body(old), Err(WorldError::UnknownBody(old)));
        assert_eq!(world.remove_joint(old_joint), Err(WorldError::UnknownJoint(old_joint)));
        assert_eq!(
            world.create_fixture(old, FixtureDescription::new(CircleShape::new(0.5).unwrap())),
            Err(WorldError::UnknownBody(old))
        );

        world.step(1.0 / 60.0);
        assert_eq!(world.body(new).unwrap().position(), Vec2::new(3.0, 0.0));
        assert!(world.joint(new_joint).is_some());
    }
}
