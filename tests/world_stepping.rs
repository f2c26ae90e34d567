//! End to end behaviour of the stepping pipeline through the public API.

use std::cell::{Cell, RefCell};
use std::f32::consts::PI;
use std::rc::Rc;

use approx::{assert_abs_diff_eq, assert_relative_eq};
use glam::Vec2;
use rust_planarphysics::collidables::{CircleShape, EdgeShape, PolygonShape};
use rust_planarphysics::collision_detection::{Contact, ContactImpulse, ContactListener, Manifold};
use rust_planarphysics::constraints::{DistanceJoint, JointDescription};
use rust_planarphysics::settings::LINEAR_SLOP;
use rust_planarphysics::{
    BodyDescription, BodyHandle, BodyType, CommandBuffer, ContactHandle, Filter, Fixture, FixtureDescription,
    FixtureHandle, World, WorldEvent, WorldSettings,
};

const DT: f32 = 1.0 / 60.0;

fn run(world: &mut World, steps: usize) {
    for _ in 0..steps {
        world.step(DT);
    }
}

fn ground_box(world: &mut World) -> BodyHandle {
    let ground = world.create_body(BodyDescription::create_static(Vec2::new(0.0, -0.5)));
    world
        .create_fixture(ground, FixtureDescription::new(PolygonShape::new_box(20.0, 0.5).unwrap()))
        .unwrap();
    ground
}

fn ball(world: &mut World, position: Vec2) -> BodyHandle {
    let body = world.create_body(BodyDescription::create_dynamic(position));
    world
        .create_fixture(body, FixtureDescription::new(CircleShape::new(0.5).unwrap()).with_density(1.0))
        .unwrap();
    body
}

#[test]
fn test_replay_is_bit_exact() {
    fn simulate() -> Vec<(Vec2, f32)> {
        let mut world = World::new(WorldSettings::default()).unwrap();
        ground_box(&mut world);
        let mut bodies = Vec::new();
        for i in 0..6 {
            let body = world.create_body(
                BodyDescription::create_dynamic(Vec2::new(0.3 * i as f32, 1.0 + 1.1 * i as f32)).with_angle(0.1 * i as f32),
            );
            world
                .create_fixture(body, FixtureDescription::new(PolygonShape::new_box(0.5, 0.5).unwrap()).with_density(1.0))
                .unwrap();
            bodies.push(body);
        }
        run(&mut world, 180);
        bodies
            .iter()
            .map(|&b| {
                let body = world.body(b).unwrap();
                (body.position(), body.angle())
            })
            .collect()
    }

    let first = simulate();
    let second = simulate();
    for ((p1, a1), (p2, a2)) in first.iter().zip(&second) {
        assert_eq!(p1.x.to_bits(), p2.x.to_bits());
        assert_eq!(p1.y.to_bits(), p2.y.to_bits());
        assert_eq!(a1.to_bits(), a2.to_bits());
    }
}

#[test]
fn test_static_body_never_moves() {
    let mut world = World::new(WorldSettings::default()).unwrap();
    let ground = ground_box(&mut world);
    ball(&mut world, Vec2::new(0.0, 3.0));
    world.step(DT);

    let body = world.body_mut(ground).unwrap();
    body.set_linear_velocity(Vec2::new(5.0, 5.0));
    body.apply_force_to_center(Vec2::new(100.0, 0.0), true);
    body.apply_linear_impulse_to_center(Vec2::new(0.0, 50.0), true);
    run(&mut world, 120);

    let body = world.body(ground).unwrap();
    assert_eq!(body.position(), Vec2::new(0.0, -0.5));
    assert_eq!(body.linear_velocity(), Vec2::ZERO);
    assert_eq!(body.angle(), 0.0);
}

#[test]
fn test_resting_circle_settles_and_sleeps() {
    let mut world = World::new(WorldSettings::default()).unwrap();
    let ground = world.create_body(BodyDescription::create_static(Vec2::ZERO));
    world
        .create_fixture(
            ground,
            FixtureDescription::new(EdgeShape::new(Vec2::new(-10.0, 0.0), Vec2::new(10.0, 0.0)).unwrap()),
        )
        .unwrap();
    let ball = ball(&mut world, Vec2::new(0.0, 2.0));

    run(&mut world, 300);

    let body = world.body(ball).unwrap();
    // Edges carry a polygon skin of two slops; contacts settle a slop inside it.
    assert_abs_diff_eq!(body.position().y, 0.5, epsilon = 2.0 * LINEAR_SLOP);
    assert_abs_diff_eq!(body.position().x, 0.0, epsilon = 1e-4);
    assert!(!body.is_awake());
    assert!(world
        .drain_events()
        .any(|event| event == WorldEvent::BodySlept { body: ball }));
}

#[test]
fn test_sleep_waits_for_time_to_sleep() {
    let settings = WorldSettings::default().zero_gravity().with_time_to_sleep(0.5);
    let mut world = World::new(settings).unwrap();
    let body = world.create_body(BodyDescription::create_dynamic(Vec2::ZERO));

    // Half a second of stillness at 60 Hz is 30 steps, accumulated in f32.
    run(&mut world, 29);
    assert!(world.body(body).unwrap().is_awake());
    run(&mut world, 2);
    assert!(!world.body(body).unwrap().is_awake());
    assert_eq!(world.profile().awake_body_count, 0);
}

#[test]
fn test_sleeping_disallowed_keeps_body_awake() {
    let mut world = World::new(WorldSettings::default().zero_gravity()).unwrap();
    let body = world.create_body(BodyDescription::create_dynamic(Vec2::ZERO));
    world.body_mut(body).unwrap().set_sleeping_allowed(false);
    run(&mut world, 120);
    assert!(world.body(body).unwrap().is_awake());
}

#[test]
fn test_islands_do_not_merge_through_ground() {
    let mut world = World::new(WorldSettings::default()).unwrap();
    ground_box(&mut world);
    ball(&mut world, Vec2::new(-4.0, 0.49));
    ball(&mut world, Vec2::new(0.0, 0.49));
    ball(&mut world, Vec2::new(0.9, 0.49));

    world.step(DT);
    world.step(DT);

    // The two touching balls share an island, the third is alone.
    assert_eq!(world.profile().island_count, 2);
    assert_eq!(world.profile().largest_island, 3);
}

#[test]
fn test_filters_reject_pairs() {
    let mut world = World::new(WorldSettings::default().zero_gravity()).unwrap();
    let add = |world: &mut World, x: f32, filter: Filter| {
        let body = world.create_body(BodyDescription::create_dynamic(Vec2::new(x, 0.0)));
        world
            .create_fixture(
                body,
                FixtureDescription::new(CircleShape::new(0.5).unwrap())
                    .with_density(1.0)
                    .with_filter(filter),
            )
            .unwrap()
    };

    // Same negative group never collides.
    let group = Filter {
        group_index: -3,
        ..Default::default()
    };
    add(&mut world, 0.0, group);
    add(&mut world, 0.5, group);

    // Category not in the other's mask.
    add(
        &mut world,
        10.0,
        Filter {
            category_bits: 0x0002,
            mask_bits: !0x0004,
            group_index: 0,
        },
    );
    add(
        &mut world,
        10.5,
        Filter {
            category_bits: 0x0004,
            ..Default::default()
        },
    );

    run(&mut world, 5);
    assert_eq!(world.contact_count(), 0);

    // Default filters collide until the user filter says otherwise.
    add(&mut world, 20.0, Filter::default());
    add(&mut world, 20.5, Filter::default());
    world.step(DT);
    assert_eq!(world.contact_count(), 1);

    world.set_contact_filter(Some(Box::new(
        |_: FixtureHandle, _: &Fixture, _: FixtureHandle, _: &Fixture| false,
    )));
    add(&mut world, 30.0, Filter::default());
    add(&mut world, 30.5, Filter::default());
    world.step(DT);
    assert_eq!(world.contact_count(), 1);
}

#[test]
fn test_warm_started_impulses_carry_weight() {
    let mut world = World::new(WorldSettings::default()).unwrap();
    ground_box(&mut world);
    let crate_body = world.create_body(BodyDescription::create_dynamic(Vec2::new(0.0, 0.52)));
    world
        .create_fixture(
            crate_body,
            FixtureDescription::new(PolygonShape::new_box(0.5, 0.5).unwrap()).with_density(1.0),
        )
        .unwrap();

    run(&mut world, 120);

    let mass = world.body(crate_body).unwrap().mass();
    let (_, contact) = world.contacts().next().unwrap();
    assert!(contact.is_touching());
    assert_eq!(contact.manifold().point_count, 2);
    let total: f32 = contact.manifold().points().iter().map(|p| p.normal_impulse).sum();
    assert_relative_eq!(total, mass * 10.0 * DT, max_relative = 0.05);
}

#[test]
fn test_begin_and_end_events_are_recorded() {
    let mut world = World::new(WorldSettings::default()).unwrap();
    ground_box(&mut world);
    let ball = ball(&mut world, Vec2::new(0.0, 1.5));

    let mut began = false;
    for _ in 0..120 {
        world.step(DT);
        began |= world
            .drain_events()
            .any(|event| matches!(event, WorldEvent::BeginContact { .. }));
    }
    assert!(began);

    world.remove_body(ball).unwrap();
    world.step(DT);
    assert!(world
        .drain_events()
        .any(|event| matches!(event, WorldEvent::EndContact { .. })));
    assert_eq!(world.contact_count(), 0);
}

struct RemoveOnTouch {
    target: BodyHandle,
}

impl ContactListener for RemoveOnTouch {
    fn begin_contact(&mut self, _handle: ContactHandle, contact: &Contact, commands: &mut CommandBuffer) {
        if contact.body_a() == self.target || contact.body_b() == self.target {
            // A second touch in the same step is already queued.
            let _ = commands.remove_body(self.target);
        }
    }
}

#[test]
fn test_listener_removal_applies_next_step() {
    let mut world = World::new(WorldSettings::default()).unwrap();
    ground_box(&mut world);
    let ball = ball(&mut world, Vec2::new(0.0, 0.45));
    world.set_contact_listener(Box::new(RemoveOnTouch { target: ball }));

    world.step(DT);
    assert!(world.body(ball).is_some());
    assert!(world.pending_commands().is_body_pending_removal(ball));

    world.step(DT);
    assert!(world.body(ball).is_none());
    assert!(world.pending_commands().is_empty());
}

#[test]
fn test_bullet_stops_at_thin_dynamic_plate() {
    let mut world = World::new(WorldSettings::default().zero_gravity()).unwrap();
    let plate = world.create_body(BodyDescription::create_dynamic(Vec2::new(10.0, 0.0)));
    world
        .create_fixture(plate, FixtureDescription::new(PolygonShape::new_box(0.05, 2.0).unwrap()).with_density(50.0))
        .unwrap();
    let bullet = world.create_body(
        BodyDescription::create_dynamic(Vec2::new(0.5, 0.0))
            .with_velocity(Vec2::new(120.0, 0.0), 0.0)
            .as_bullet(),
    );
    world
        .create_fixture(bullet, FixtureDescription::new(CircleShape::new(0.1).unwrap()).with_density(1.0))
        .unwrap();

    run(&mut world, 10);

    let bullet_x = world.body(bullet).unwrap().position().x;
    let plate_x = world.body(plate).unwrap().position().x;
    assert!(bullet_x < plate_x, "bullet at {bullet_x} passed plate at {plate_x}");
}

fn resting_crate(world: &mut World) -> BodyHandle {
    let crate_body = world.create_body(BodyDescription::create_dynamic(Vec2::new(0.0, 0.52)));
    world
        .create_fixture(
            crate_body,
            FixtureDescription::new(PolygonShape::new_box(0.5, 0.5).unwrap()).with_density(1.0),
        )
        .unwrap();
    world.body_mut(crate_body).unwrap().set_sleeping_allowed(false);
    crate_body
}

fn normal_impulse_sum(world: &World) -> f32 {
    let (_, contact) = world.contacts().next().unwrap();
    contact.manifold().points().iter().map(|p| p.normal_impulse).sum()
}

#[test]
fn test_warm_start_is_continuous_across_steps_and_scaled_by_dt_ratio() {
    let mut world = World::new(WorldSettings::default()).unwrap();
    ground_box(&mut world);
    let crate_body = resting_crate(&mut world);
    run(&mut world, 120);
    let mass = world.body(crate_body).unwrap().mass();

    let before = normal_impulse_sum(&world);
    world.step(DT);
    let after = normal_impulse_sum(&world);
    assert_relative_eq!(before, after, max_relative = 1e-3);

    // Halving the step halves the carried impulse along with the load it has to carry.
    world.step(0.5 * DT);
    assert_relative_eq!(normal_impulse_sum(&world), mass * 10.0 * 0.5 * DT, max_relative = 0.05);
    world.step(0.5 * DT);
    assert_relative_eq!(normal_impulse_sum(&world), mass * 10.0 * 0.5 * DT, max_relative = 0.05);
}

/// Lets everything pass through one platform fixture while counting the vetoes.
struct GhostPlatform {
    platform: FixtureHandle,
    vetoes: Rc<Cell<usize>>,
}

impl ContactListener for GhostPlatform {
    fn pre_solve(
        &mut self,
        _handle: ContactHandle,
        contact: &mut Contact,
        _old_manifold: &Manifold,
        _commands: &mut CommandBuffer,
    ) -> bool {
        if contact.fixture_a() == self.platform || contact.fixture_b() == self.platform {
            self.vetoes.set(self.vetoes.get() + 1);
            return false;
        }
        true
    }
}

#[test]
fn test_pre_solve_veto_lets_bodies_pass_through() {
    let mut world = World::new(WorldSettings::default()).unwrap();
    let platform_body = world.create_body(BodyDescription::create_static(Vec2::ZERO));
    let platform = world
        .create_fixture(platform_body, FixtureDescription::new(PolygonShape::new_box(2.0, 0.1).unwrap()))
        .unwrap();
    let solid_body = world.create_body(BodyDescription::create_static(Vec2::new(10.0, 0.0)));
    world
        .create_fixture(solid_body, FixtureDescription::new(PolygonShape::new_box(2.0, 0.1).unwrap()))
        .unwrap();
    let ghost = ball(&mut world, Vec2::new(0.0, 2.0));
    let resting = ball(&mut world, Vec2::new(10.0, 2.0));

    let vetoes = Rc::new(Cell::new(0));
    world.set_contact_listener(Box::new(GhostPlatform {
        platform,
        vetoes: Rc::clone(&vetoes),
    }));

    run(&mut world, 120);

    assert!(vetoes.get() > 0);
    assert!(world.body(ghost).unwrap().position().y < -1.0);
    // Contacts the listener accepts still hold.
    assert!(world.body(resting).unwrap().position().y > 0.5);
}

/// Keeps the impulses reported for the last solved contact.
struct ImpulseRecorder {
    last: Rc<RefCell<Option<ContactImpulse>>>,
    calls: Rc<Cell<usize>>,
}

impl ContactListener for ImpulseRecorder {
    fn post_solve(
        &mut self,
        _handle: ContactHandle,
        _contact: &Contact,
        impulse: &ContactImpulse,
        _commands: &mut CommandBuffer,
    ) {
        *self.last.borrow_mut() = Some(*impulse);
        self.calls.set(self.calls.get() + 1);
    }
}

#[test]
fn test_post_solve_reports_applied_impulses() {
    let mut world = World::new(WorldSettings::default()).unwrap();
    ground_box(&mut world);
    let crate_body = resting_crate(&mut world);
    let last = Rc::new(RefCell::new(None));
    let calls = Rc::new(Cell::new(0));
    world.set_contact_listener(Box::new(ImpulseRecorder {
        last: Rc::clone(&last),
        calls: Rc::clone(&calls),
    }));

    run(&mut world, 120);

    // One resting contact, reported once per step after it first touches.
    assert!(calls.get() > 100);
    let impulse = last.take().unwrap();
    assert_eq!(impulse.count, 2);
    let total: f32 = impulse.normal_impulses[..impulse.count].iter().sum();
    let mass = world.body(crate_body).unwrap().mass();
    assert_relative_eq!(total, mass * 10.0 * DT, max_relative = 0.05);
    assert_relative_eq!(total, normal_impulse_sum(&world), max_relative = 1e-6);
}

#[test]
fn test_sensor_reports_overlap_without_response() {
    let mut world = World::new(WorldSettings::default()).unwrap();
    let gate = world.create_body(BodyDescription::create_static(Vec2::ZERO));
    let sensor = world
        .create_fixture(gate, FixtureDescription::new(PolygonShape::new_box(2.0, 0.5).unwrap()).as_sensor())
        .unwrap();
    let ball = ball(&mut world, Vec2::new(0.0, 3.0));

    let mut began = false;
    let mut ended = false;
    for _ in 0..120 {
        world.step(DT);
        for event in world.drain_events() {
            match event {
                WorldEvent::BeginContact { fixture_a, fixture_b, .. } => {
                    began |= fixture_a == sensor || fixture_b == sensor;
                }
                WorldEvent::EndContact { fixture_a, fixture_b, .. } => {
                    ended |= fixture_a == sensor || fixture_b == sensor;
                }
                _ => {}
            }
        }
    }

    assert!(began);
    assert!(ended);
    let body = world.body(ball).unwrap();
    assert!(body.position().y < -5.0);
    // Free fall, untouched by the sensor.
    assert_relative_eq!(body.linear_velocity().y, -10.0 * 120.0 * DT, max_relative = 1e-3);
}

fn shoot(world: &mut World, position: Vec2, speed: f32) -> BodyHandle {
    let body = world.create_body(BodyDescription::create_dynamic(position).with_velocity(Vec2::new(speed, 0.0), 0.0));
    world
        .create_fixture(body, FixtureDescription::new(CircleShape::new(0.1).unwrap()).with_density(1.0))
        .unwrap();
    body
}

fn static_box(world: &mut World, position: Vec2, half_width: f32, half_height: f32) -> BodyHandle {
    let body = world.create_body(BodyDescription::create_static(position));
    world
        .create_fixture(
            body,
            FixtureDescription::new(PolygonShape::new_box(half_width, half_height).unwrap()),
        )
        .unwrap();
    body
}

#[test]
fn test_sub_stepping_takes_one_impact_per_step() {
    let settings = WorldSettings::default().zero_gravity().with_sub_stepping(true);
    let mut world = World::new(settings).unwrap();
    static_box(&mut world, Vec2::new(10.0, 0.0), 0.05, 2.0);
    let ball = shoot(&mut world, Vec2::new(0.5, 0.0), 120.0);
    world.body_mut(ball).unwrap().set_sleeping_allowed(false);

    let mut history = Vec::new();
    for _ in 0..30 {
        world.step(DT);
        let profile = world.profile();
        history.push((profile.toi_events, profile.island_count));
        assert!(world.body(ball).unwrap().position().x < 10.0);
    }

    assert!(history.iter().all(|&(events, _)| events <= 1));
    let first = history.iter().position(|&(events, _)| events == 1).unwrap();
    for pair in history[first..].windows(2) {
        let ((events, _), (_, islands)) = (pair[0], pair[1]);
        if events == 1 {
            // The interrupted step resumes from its time of impact without a regular solve.
            assert_eq!(islands, 0);
        } else {
            assert!(islands > 0);
        }
    }
    // The sequence of impacts ends and regular stepping resumes.
    assert!(history[first..].iter().any(|&(events, islands)| events == 0 && islands > 0));
}

#[test]
fn test_max_sub_steps_caps_impacts_per_contact() {
    let mut settings = WorldSettings::default().zero_gravity();
    settings.max_sub_steps = 0;
    let mut world = World::new(settings).unwrap();
    static_box(&mut world, Vec2::new(-1.0, 0.0), 0.05, 2.0);
    static_box(&mut world, Vec2::new(1.0, 0.0), 0.05, 2.0);
    let body = world.create_body(BodyDescription::create_dynamic(Vec2::ZERO).with_velocity(Vec2::new(200.0, 0.0), 0.0));
    world
        .create_fixture(
            body,
            FixtureDescription::new(CircleShape::new(0.1).unwrap())
                .with_density(1.0)
                .with_restitution(1.0),
        )
        .unwrap();

    let mut total = 0;
    for _ in 0..30 {
        world.step(DT);
        // One impact per wall contact at most.
        assert!(world.profile().toi_events <= 2);
        total += world.profile().toi_events;
    }
    assert!(total > 0);
}

#[test]
fn test_max_toi_contacts_bounds_impact_islands() {
    fn largest_toi_island(max_toi_contacts: usize) -> usize {
        let mut settings = WorldSettings::default().zero_gravity();
        settings.max_toi_contacts = max_toi_contacts;
        let mut world = World::new(settings).unwrap();
        // A ball sliding along a floor into a thin wall.
        static_box(&mut world, Vec2::new(10.0, -0.5), 11.0, 0.5);
        static_box(&mut world, Vec2::new(10.0, 2.0), 0.05, 2.0);
        shoot(&mut world, Vec2::new(0.5, 0.1), 120.0);

        let mut largest = 0;
        for _ in 0..10 {
            world.step(DT);
            largest = largest.max(world.profile().largest_toi_island);
        }
        largest
    }

    // The floor contact joins the impact island when there is room for it.
    assert_eq!(largest_toi_island(32), 3);
    assert_eq!(largest_toi_island(1), 2);
}

#[test]
fn test_kinematic_body_pushes_dynamic_bodies() {
    let mut world = World::new(WorldSettings::default().zero_gravity()).unwrap();
    let pusher = world.create_body(BodyDescription::create_kinematic(Vec2::new(0.0, 1.0), Vec2::new(2.0, 0.0)));
    world
        .create_fixture(pusher, FixtureDescription::new(PolygonShape::new_box(0.5, 0.5).unwrap()).with_density(1.0))
        .unwrap();
    let pushed = world.create_body(BodyDescription::create_dynamic(Vec2::new(2.0, 1.0)));
    world
        .create_fixture(pushed, FixtureDescription::new(PolygonShape::new_box(0.5, 0.5).unwrap()).with_density(1.0))
        .unwrap();

    run(&mut world, 120);

    let kinematic = world.body(pusher).unwrap();
    assert_eq!(kinematic.linear_velocity(), Vec2::new(2.0, 0.0));
    assert_eq!(kinematic.mass(), 0.0);
    assert_abs_diff_eq!(kinematic.position().x, 4.0, epsilon = 1e-3);
    let dynamic_x = world.body(pushed).unwrap().position().x;
    assert!(dynamic_x > kinematic.position().x + 0.9, "pushed box at {dynamic_x}");
}

#[test]
fn test_kinematic_body_ignores_gravity_and_statics() {
    let mut world = World::new(WorldSettings::default()).unwrap();
    ground_box(&mut world);
    let pusher = world.create_body(BodyDescription::create_kinematic(Vec2::new(-5.0, 0.0), Vec2::new(1.0, 0.0)));
    world
        .create_fixture(pusher, FixtureDescription::new(PolygonShape::new_box(0.5, 0.5).unwrap()))
        .unwrap();

    run(&mut world, 60);

    let body = world.body(pusher).unwrap();
    assert_eq!(body.linear_velocity(), Vec2::new(1.0, 0.0));
    assert_abs_diff_eq!(body.position().y, 0.0);
    assert!(world.contacts().all(|(_, contact)| {
        let a = world.body(contact.body_a()).unwrap().body_type();
        let b = world.body(contact.body_b()).unwrap().body_type();
        a == BodyType::Dynamic || b == BodyType::Dynamic
    }));
    assert_eq!(world.contact_count(), 0);
}

/// Drops a second ball and tethers the first one on its first touch.
struct SpawnOnTouch {
    target: BodyHandle,
    spawned: bool,
}

impl ContactListener for SpawnOnTouch {
    fn begin_contact(&mut self, _handle: ContactHandle, contact: &Contact, commands: &mut CommandBuffer) {
        if self.spawned || (contact.body_a() != self.target && contact.body_b() != self.target) {
            return;
        }
        self.spawned = true;
        commands.create_body(
            BodyDescription::create_dynamic(Vec2::new(5.0, 5.0)),
            [FixtureDescription::new(CircleShape::new(0.25).unwrap()).with_density(2.0)],
        );
        commands.create_joint(JointDescription::new(
            self.target,
            None,
            DistanceJoint::new(Vec2::ZERO, Vec2::new(0.0, 5.45), 5.0),
        ));
    }
}

#[test]
fn test_listener_spawns_apply_next_step() {
    let mut world = World::new(WorldSettings::default()).unwrap();
    ground_box(&mut world);
    let ball = ball(&mut world, Vec2::new(0.0, 0.45));
    world.set_contact_listener(Box::new(SpawnOnTouch {
        target: ball,
        spawned: false,
    }));

    world.step(DT);
    assert_eq!(world.body_count(), 2);
    assert_eq!(world.joint_count(), 0);
    assert_eq!(world.pending_commands().len(), 2);
    world.drain_events().for_each(drop);

    world.step(DT);
    assert!(world.pending_commands().is_empty());
    assert_eq!(world.body_count(), 3);
    assert_eq!(world.joint_count(), 1);
    assert_eq!(world.proxy_count(), 3);

    let events: Vec<_> = world.drain_events().collect();
    let spawned = events
        .iter()
        .find_map(|event| match event {
            WorldEvent::BodySpawned { body } => Some(*body),
            _ => None,
        })
        .unwrap();
    let joint = events
        .iter()
        .find_map(|event| match event {
            WorldEvent::JointSpawned { joint } => Some(*joint),
            _ => None,
        })
        .unwrap();

    let body = world.body(spawned).unwrap();
    assert_eq!(body.body_type(), BodyType::Dynamic);
    assert_eq!(body.fixtures().len(), 1);
    assert_relative_eq!(body.mass(), 2.0 * PI * 0.0625, max_relative = 1e-5);
    // Spawned bodies take part in the step that created them.
    assert!(body.position().y < 5.0);
    assert!(world.joint(joint).is_some());
}
