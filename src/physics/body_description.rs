use glam::Vec2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How a body participates in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BodyType {
    /// Zero velocity, infinite mass, never integrated.
    #[default]
    Static,
    /// Moved by its velocity only; infinite mass.
    Kinematic,
    /// Fully simulated, positive mass.
    Dynamic,
}

/// Describes the thresholds and flags controlling a body's sleep behavior.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyActivityDescription {
    /// Whether the body may fall asleep.
    pub allow_sleep: bool,
    /// Whether the body starts awake.
    pub awake: bool,
}

impl Default for BodyActivityDescription {
    fn default() -> Self {
        Self {
            allow_sleep: true,
            awake: true,
        }
    }
}

/// Describes a body's initial state.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BodyDescription {
    pub body_type: BodyType,
    /// World position of the body origin.
    pub position: Vec2,
    /// World angle in radians.
    pub angle: f32,
    /// Linear velocity of the origin.
    pub linear_velocity: Vec2,
    pub angular_velocity: f32,
    /// Reduces linear velocity each step. Usually in [0, 0.1].
    pub linear_damping: f32,
    /// Reduces angular velocity each step. Usually in [0, 0.1].
    pub angular_damping: f32,
    /// Sleeping settings for the body.
    pub activity: BodyActivityDescription,
    /// Prevents rotation. Useful for characters.
    pub fixed_rotation: bool,
    /// Treats the body as a fast mover: continuous collision runs against other dynamic bodies too.
    pub bullet: bool,
    /// Opts the body out of continuous collision entirely.
    pub ignore_ccd: bool,
    /// Disabled bodies have no proxies and take no part in stepping.
    pub enabled: bool,
    /// Multiplier on world gravity.
    pub gravity_scale: f32,
    /// Skip world gravity.
    pub ignore_gravity: bool,
    pub user_data: u64,
}

impl Default for BodyDescription {
    fn default() -> Self {
        Self {
            body_type: BodyType::Static,
            position: Vec2::ZERO,
            angle: 0.0,
            linear_velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            linear_damping: 0.0,
            angular_damping: 0.0,
            activity: BodyActivityDescription::default(),
            fixed_rotation: false,
            bullet: false,
            ignore_ccd: false,
            enabled: true,
            gravity_scale: 1.0,
            ignore_gravity: false,
            user_data: 0,
        }
    }
}

impl BodyDescription {
    /// Creates a dynamic body description at rest.
    #[inline(always)]
    pub fn create_dynamic(position: Vec2) -> Self {
        Self {
            body_type: BodyType::Dynamic,
            position,
            ..Default::default()
        }
    }

    /// Creates a kinematic body description moving with the given velocity.
    #[inline(always)]
    pub fn create_kinematic(position: Vec2, linear_velocity: Vec2) -> Self {
        Self {
            body_type: BodyType::Kinematic,
            position,
            linear_velocity,
            ..Default::default()
        }
    }

    /// Creates a static body description.
    #[inline(always)]
    pub fn create_static(position: Vec2) -> Self {
        Self {
            body_type: BodyType::Static,
            position,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = angle;
        self
    }

    #[must_use]
    pub fn with_velocity(mut self, linear: Vec2, angular: f32) -> Self {
        self.linear_velocity = linear;
        self.angular_velocity = angular;
        self
    }

    #[must_use]
    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    #[must_use]
    pub fn with_activity(mut self, activity: BodyActivityDescription) -> Self {
        self.activity = activity;
        self
    }

    #[must_use]
    pub fn as_bullet(mut self) -> Self {
        self.bullet = true;
        self
    }

    #[must_use]
    pub fn with_fixed_rotation(mut self) -> Self {
        self.fixed_rotation = true;
        self
    }

    #[must_use]
    pub fn with_gravity_scale(mut self, scale: f32) -> Self {
        self.gravity_scale = scale;
        self
    }

    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    #[must_use]
    pub fn with_user_data(mut self, user_data: u64) -> Self {
        self.user_data = user_data;
        self
    }

    /// Whether every numeric field is finite and damping is non-negative.
    pub fn is_valid(&self) -> bool {
        self.position.is_finite()
            && self.angle.is_finite()
            && self.linear_velocity.is_finite()
            && self.angular_velocity.is_finite()
            && self.linear_damping.is_finite()
            && self.linear_damping >= 0.0
            && self.angular_damping.is_finite()
            && self.angular_damping >= 0.0
            && self.gravity_scale.is_finite()
    }
}
