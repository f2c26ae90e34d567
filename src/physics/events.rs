use glam::Vec2;

use super::handles::{BodyHandle, ContactHandle, FixtureHandle, JointHandle};

/// Something that happened during a step, recorded for the caller to drain afterwards with
/// `World::drain_events`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorldEvent {
    /// Two fixtures started touching.
    BeginContact {
        contact: ContactHandle,
        fixture_a: FixtureHandle,
        fixture_b: FixtureHandle,
    },
    /// Two fixtures stopped touching, or a touching contact was destroyed.
    EndContact {
        contact: ContactHandle,
        fixture_a: FixtureHandle,
        fixture_b: FixtureHandle,
    },
    /// A joint exceeded its breakpoint and was disabled.
    JointBroke {
        joint: JointHandle,
        reaction_force: Vec2,
        reaction_torque: f32,
    },
    /// A body was put to sleep along with the rest of its island.
    BodySlept { body: BodyHandle },
    /// A body queued with `CommandBuffer::create_body` joined the world.
    BodySpawned { body: BodyHandle },
    /// A joint queued with `CommandBuffer::create_joint` joined the world.
    JointSpawned { joint: JointHandle },
}
