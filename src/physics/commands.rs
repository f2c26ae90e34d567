use std::collections::HashSet;

use tracing::trace;

use super::body_description::BodyDescription;
use super::constraints::JointDescription;
use super::error::{WorldError, WorldResult};
use super::fixture::FixtureDescription;
use super::handles::{BodyHandle, ControllerHandle, JointHandle};

/// A deferred topology edit, applied at the start of the next step.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddBody(BodyHandle),
    RemoveBody(BodyHandle),
    AddJoint(JointHandle),
    RemoveJoint(JointHandle),
    AddController(ControllerHandle),
    RemoveController(ControllerHandle),
    /// A body built from scratch when the queue is applied, with its fixtures.
    SpawnBody {
        description: BodyDescription,
        fixtures: Vec<FixtureDescription>,
    },
    /// A joint built when the queue is applied.
    SpawnJoint(JointDescription),
}

/// Ordered queue of pending topology edits.
///
/// Adds of entities created through the world are recorded when it mints their handle, so an
/// entity can never be added twice. Contact callbacks, which cannot reach the world, spawn
/// bodies and joints from descriptions instead; their handles are minted when the queue is
/// applied and reported as `WorldEvent::BodySpawned` and `WorldEvent::JointSpawned`.
/// Removals may come from anywhere; a second removal of the same entity before the queue is
/// applied is rejected.
#[derive(Debug, Default)]
pub struct CommandBuffer {
    commands: Vec<Command>,
    pending_body_removals: HashSet<BodyHandle>,
    pending_joint_removals: HashSet<JointHandle>,
    pending_controller_removals: HashSet<ControllerHandle>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Pending commands in the order they will be applied.
    #[inline]
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Queues removal of a body together with its fixtures, contacts and joints.
    pub fn remove_body(&mut self, body: BodyHandle) -> WorldResult<()> {
        if !self.pending_body_removals.insert(body) {
            return Err(WorldError::BodyPendingRemoval(body));
        }
        trace!(%body, "queued body removal");
        self.commands.push(Command::RemoveBody(body));
        Ok(())
    }

    /// Queues removal of a joint.
    pub fn remove_joint(&mut self, joint: JointHandle) -> WorldResult<()> {
        if !self.pending_joint_removals.insert(joint) {
            return Err(WorldError::JointPendingRemoval(joint));
        }
        trace!(%joint, "queued joint removal");
        self.commands.push(Command::RemoveJoint(joint));
        Ok(())
    }

    /// Queues removal of a controller.
    pub fn remove_controller(&mut self, controller: ControllerHandle) -> WorldResult<()> {
        if !self.pending_controller_removals.insert(controller) {
            return Err(WorldError::ControllerPendingRemoval(controller));
        }
        self.commands.push(Command::RemoveController(controller));
        Ok(())
    }

    /// Queues creation of a body with the given fixtures.
    pub fn create_body(&mut self, description: BodyDescription, fixtures: impl IntoIterator<Item = FixtureDescription>) {
        debug_assert!(description.is_valid(), "body description has non-finite values");
        trace!(body_type = ?description.body_type, "queued body creation");
        self.commands.push(Command::SpawnBody {
            description,
            fixtures: fixtures.into_iter().collect(),
        });
    }

    /// Queues creation of a joint. It is validated when the queue is applied.
    pub fn create_joint(&mut self, description: JointDescription) {
        trace!(body_a = %description.body_a, "queued joint creation");
        self.commands.push(Command::SpawnJoint(description));
    }

    pub fn is_body_pending_removal(&self, body: BodyHandle) -> bool {
        self.pending_body_removals.contains(&body)
    }

    pub fn is_joint_pending_removal(&self, joint: JointHandle) -> bool {
        self.pending_joint_removals.contains(&joint)
    }

    pub(crate) fn add_body(&mut self, body: BodyHandle) {
        self.commands.push(Command::AddBody(body));
    }

    pub(crate) fn add_joint(&mut self, joint: JointHandle) {
        self.commands.push(Command::AddJoint(joint));
    }

    pub(crate) fn add_controller(&mut self, controller: ControllerHandle) {
        self.commands.push(Command::AddController(controller));
    }

    /// Takes every pending command and forgets the pending removal sets.
    pub(crate) fn take(&mut self) -> Vec<Command> {
        self.pending_body_removals.clear();
        self.pending_joint_removals.clear();
        self.pending_controller_removals.clear();
        std::mem::take(&mut self.commands)
    }
}
