//! A 2D rigid body physics engine core.
//!
//! A [`World`] owns bodies with attached fixtures and the joints between them. Each call to
//! [`World::step`] applies queued topology changes, refreshes contacts, partitions the awake
//! bodies into islands solved with sequential impulses, sub-steps fast movers to their time of
//! impact and puts resting islands to sleep.
//!
//! ```
//! use glam::Vec2;
//! use rust_planarphysics::collidables::{CircleShape, PolygonShape};
//! use rust_planarphysics::{BodyDescription, FixtureDescription, World, WorldSettings};
//!
//! let mut world = World::new(WorldSettings::default()).unwrap();
//! let ground = world.create_body(BodyDescription::create_static(Vec2::ZERO));
//! world
//!     .create_fixture(ground, FixtureDescription::new(PolygonShape::new_box(10.0, 0.5).unwrap()))
//!     .unwrap();
//! let ball = world.create_body(BodyDescription::create_dynamic(Vec2::new(0.0, 4.0)));
//! world
//!     .create_fixture(ball, FixtureDescription::new(CircleShape::new(0.5).unwrap()).with_density(1.0))
//!     .unwrap();
//!
//! for _ in 0..120 {
//!     world.step(1.0 / 60.0);
//! }
//! assert!(world.body(ball).unwrap().position().y < 4.0);
//! ```

pub mod physics;
pub mod utilities;

pub use physics::*;
