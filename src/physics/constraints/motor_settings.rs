#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Defines the shared behavior of joint motors: a target relative speed reached with a bounded
/// force or torque.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MotorSettings {
    /// Target relative speed, in radians per second for angular motors.
    pub speed: f32,
    /// Maximum force or torque the motor can apply.
    pub maximum_force: f32,
}

impl MotorSettings {
    /// Defines settings for a motor constraint.
    ///
    /// * `speed` - Target relative speed.
    /// * `maximum_force` - Maximum force or torque the motor can apply.
    #[inline(always)]
    pub fn new(speed: f32, maximum_force: f32) -> Self {
        let settings = Self { speed, maximum_force };
        debug_assert!(Self::validate(&settings), "motor settings must be finite with nonnegative force");
        settings
    }

    /// Checks that the settings are finite and the force bound nonnegative.
    #[inline(always)]
    pub fn validate(settings: &MotorSettings) -> bool {
        settings.speed.is_finite() && settings.maximum_force.is_finite() && settings.maximum_force >= 0.0
    }

    /// Largest impulse the motor may apply over `dt`.
    #[inline(always)]
    pub fn max_impulse(&self, dt: f32) -> f32 {
        dt * self.maximum_force
    }
}
