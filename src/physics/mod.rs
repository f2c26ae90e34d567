mod body;
pub use self::body::{Body, ContactEdge, JointEdge};

mod body_description;
pub use self::body_description::{BodyActivityDescription, BodyDescription, BodyType};

mod body_properties;
pub use self::body_properties::{MassData, Position, Sweep, Transform, Velocity};

pub mod collidables;
pub mod collision_detection;

mod commands;
pub use self::commands::{Command, CommandBuffer};

pub mod constraints;
pub mod controllers;

mod error;
pub use self::error::{ShapeError, WorldError, WorldResult};

mod events;
pub use self::events::WorldEvent;

mod fixture;
pub use self::fixture::{Filter, Fixture, FixtureDescription, FixtureProxy};

mod handles;
pub use self::handles::{BodyHandle, ContactHandle, ControllerHandle, FixtureHandle, JointHandle};

mod island;

pub mod settings;
pub use self::settings::WorldSettings;

mod simulation_profiler;
pub use self::simulation_profiler::{stages, StepProfile};

mod solve_description;
pub use self::solve_description::TimeStep;

mod solver;

pub mod trees;

mod world;
pub use self::world::{RayHit, World};
