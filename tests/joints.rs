//! Joints solved inside a stepping world.

use approx::assert_relative_eq;
use glam::Vec2;
use rust_planarphysics::collidables::CircleShape;
use rust_planarphysics::constraints::{DistanceJoint, JointDescription, RevoluteJoint};
use rust_planarphysics::{BodyDescription, BodyHandle, FixtureDescription, World, WorldEvent, WorldSettings};

const DT: f32 = 1.0 / 60.0;

fn weight(world: &mut World, position: Vec2) -> BodyHandle {
    let body = world.create_body(BodyDescription::create_dynamic(position));
    world
        .create_fixture(body, FixtureDescription::new(CircleShape::new(0.25).unwrap()).with_density(4.0))
        .unwrap();
    body
}

#[test]
fn test_hanging_pendulum_carries_its_weight() {
    let mut world = World::new(WorldSettings::default()).unwrap();
    let anchor = world.create_body(BodyDescription::create_static(Vec2::new(0.0, 5.0)));
    let bob = weight(&mut world, Vec2::new(0.0, 3.0));
    let joint = world
        .create_revolute_joint(anchor, Some(bob), Vec2::new(0.0, 5.0))
        .unwrap();

    for _ in 0..30 {
        world.step(DT);
    }

    let mass = world.body(bob).unwrap().mass();
    let reaction = world.joint(joint).unwrap().reaction_force(1.0 / DT);
    assert_relative_eq!(reaction.length(), mass * 10.0, max_relative = 0.01);
    assert!(reaction.x.abs() < 1e-3 * mass);

    let position = world.body(bob).unwrap().position();
    assert_relative_eq!(position.distance(Vec2::new(0.0, 5.0)), 2.0, epsilon = 0.01);
}

#[test]
fn test_joint_impulse_carries_over_steps_and_dt_changes() {
    let mut world = World::new(WorldSettings::default()).unwrap();
    let anchor = world.create_body(BodyDescription::create_static(Vec2::new(0.0, 5.0)));
    let bob = weight(&mut world, Vec2::new(0.0, 3.0));
    world.body_mut(bob).unwrap().set_sleeping_allowed(false);
    let joint = world
        .create_revolute_joint(anchor, Some(bob), Vec2::new(0.0, 5.0))
        .unwrap();

    for _ in 0..30 {
        world.step(DT);
    }
    let mass = world.body(bob).unwrap().mass();
    let before = world.joint(joint).unwrap().reaction_force(1.0 / DT);
    world.step(DT);
    let after = world.joint(joint).unwrap().reaction_force(1.0 / DT);
    assert_relative_eq!(before.y, after.y, max_relative = 1e-4);

    // A shorter step carries a proportionally smaller impulse for the same force.
    let half = 0.5 * DT;
    world.step(half);
    let reaction = world.joint(joint).unwrap().reaction_force(1.0 / half);
    assert_relative_eq!(reaction.length(), mass * 10.0, max_relative = 0.01);
    world.step(DT);
    let reaction = world.joint(joint).unwrap().reaction_force(1.0 / DT);
    assert_relative_eq!(reaction.length(), mass * 10.0, max_relative = 0.01);
}

#[test]
fn test_swinging_pendulum_keeps_length() {
    let mut world = World::new(WorldSettings::default()).unwrap();
    let bob = weight(&mut world, Vec2::new(3.0, 0.0));
    let rod = world
        .create_joint(JointDescription::new(
            bob,
            None,
            DistanceJoint::new(Vec2::ZERO, Vec2::ZERO, 3.0),
        ))
        .unwrap();

    let mut lowest = f32::MAX;
    for _ in 0..120 {
        world.step(DT);
        let position = world.body(bob).unwrap().position();
        lowest = lowest.min(position.y);
        assert_relative_eq!(position.length(), 3.0, epsilon = 0.02);
    }
    assert!(lowest < -2.9, "bob never swung through the bottom, lowest {lowest}");
    assert!(world.joint(rod).unwrap().is_enabled());
}

#[test]
fn test_overloaded_joint_breaks() {
    let mut world = World::new(WorldSettings::default()).unwrap();
    let bob = weight(&mut world, Vec2::new(0.0, -1.0));
    let mass = world.body(bob).unwrap().mass();
    let joint = world
        .create_joint(
            JointDescription::new(bob, None, RevoluteJoint::new(Vec2::new(0.0, 1.0), Vec2::ZERO, 0.0))
                .with_breakpoint(0.5 * mass * 10.0),
        )
        .unwrap();

    for _ in 0..5 {
        world.step(DT);
    }

    assert!(!world.joint(joint).unwrap().is_enabled());
    assert!(world
        .drain_events()
        .any(|event| matches!(event, WorldEvent::JointBroke { joint: broken, .. } if broken == joint)));
    // Once broken the bob falls freely.
    assert!(world.body(bob).unwrap().linear_velocity().y < -0.5);
}

#[test]
fn test_joint_removal_wakes_bodies() {
    let mut world = World::new(WorldSettings::default().zero_gravity()).unwrap();
    let a = weight(&mut world, Vec2::ZERO);
    let b = weight(&mut world, Vec2::new(1.0, 0.0));
    let joint = world
        .create_joint(JointDescription::new(a, Some(b), DistanceJoint::new(Vec2::ZERO, Vec2::ZERO, 1.0)))
        .unwrap();

    for _ in 0..60 {
        world.step(DT);
    }
    assert!(!world.body(a).unwrap().is_awake());
    assert!(!world.body(b).unwrap().is_awake());

    world.remove_joint(joint).unwrap();
    world.step(0.0);
    assert!(world.joint(joint).is_none());
    assert!(world.body(a).unwrap().is_awake());
    assert!(world.body(b).unwrap().is_awake());
    assert!(world.body(a).unwrap().joint_edges().is_empty());
}

#[test]
fn test_mouse_joint_drags_body_to_target() {
    let mut world = World::new(WorldSettings::default().zero_gravity()).unwrap();
    let body = weight(&mut world, Vec2::ZERO);
    let mass = world.body(body).unwrap().mass();
    let mouse = world.create_mouse_joint(body, Vec2::ZERO, 1000.0 * mass).unwrap();

    world.step(DT);
    world.set_mouse_target(mouse, Vec2::new(2.0, 1.0)).unwrap();
    for _ in 0..180 {
        world.step(DT);
    }

    let position = world.body(body).unwrap().position();
    assert!(position.distance(Vec2::new(2.0, 1.0)) < 0.05, "body at {position}");
}
