//! Tuning constants and per-world configuration.
//!
//! Geometric tolerances are compile time constants because shapes bake them in when they are
//! built. Everything that only the stepping pipeline reads lives in [`WorldSettings`].

use glam::Vec2;

use super::error::{WorldError, WorldResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Collision and constraint tolerance, in meters.
pub const LINEAR_SLOP: f32 = 0.005;

/// Angular tolerance for constraints, in radians (2 degrees).
pub const ANGULAR_SLOP: f32 = 2.0 / 180.0 * std::f32::consts::PI;

/// Skin radius around polygons and edges. Keeps resting polygons from touching core to core.
pub const POLYGON_RADIUS: f32 = 2.0 * LINEAR_SLOP;

/// Maximum number of points in a contact manifold.
pub const MAX_MANIFOLD_POINTS: usize = 2;

/// Maximum number of vertices on a convex polygon.
pub const MAX_POLYGON_VERTICES: usize = 8;

/// Margin added to proxy bounds in the broad phase so small motions do not reinsert the proxy.
pub const AABB_EXTENSION: f32 = 0.1;

/// Predicts proxy movement: fat bounds are stretched by this multiple of the displacement.
pub const AABB_MULTIPLIER: f32 = 2.0;

/// Largest position correction applied per position iteration.
pub const MAX_LINEAR_CORRECTION: f32 = 0.2;

/// Largest angular correction applied per position iteration (8 degrees).
pub const MAX_ANGULAR_CORRECTION: f32 = 8.0 / 180.0 * std::f32::consts::PI;

/// Configuration read by the stepping pipeline.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WorldSettings {
    /// Gravity applied to dynamic bodies, scaled per body.
    pub gravity: Vec2,
    /// Velocity iterations per step.
    pub velocity_iterations: u32,
    /// Position iterations per step.
    pub position_iterations: u32,
    /// Position iterations used by each time of impact sub-step.
    pub toi_position_iterations: u32,
    /// Seed the solver with last step's impulses.
    pub warm_starting: bool,
    /// Run the time of impact pass after the discrete solve.
    pub continuous_physics: bool,
    /// Stop after the first time of impact event each step. Debug aid.
    pub sub_stepping: bool,
    /// Zero accumulated forces and torques at the end of every step.
    pub auto_clear_forces: bool,
    /// Allow islands to fall asleep.
    pub allow_sleep: bool,
    /// Seconds a body must stay under the sleep tolerances before its island may sleep.
    pub time_to_sleep: f32,
    /// Linear speed under which a body counts as resting.
    pub linear_sleep_tolerance: f32,
    /// Angular speed under which a body counts as resting.
    pub angular_sleep_tolerance: f32,
    /// Maximum translation of a body per step.
    pub max_translation: f32,
    /// Maximum rotation of a body per step.
    pub max_rotation: f32,
    /// Fraction of overlap resolved per position iteration.
    pub baumgarte: f32,
    /// Baumgarte factor used while resolving time of impact events.
    pub toi_baumgarte: f32,
    /// Approach speed below which collisions are treated as inelastic.
    pub velocity_threshold: f32,
    /// Maximum number of time of impact events a single contact may take part in per step.
    pub max_sub_steps: u32,
    /// Maximum number of contacts gathered into a time of impact island.
    pub max_toi_contacts: usize,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, -10.0),
            velocity_iterations: 8,
            position_iterations: 3,
            toi_position_iterations: 20,
            warm_starting: true,
            continuous_physics: true,
            sub_stepping: false,
            auto_clear_forces: true,
            allow_sleep: true,
            time_to_sleep: 0.5,
            linear_sleep_tolerance: 0.01,
            angular_sleep_tolerance: 2.0 / 180.0 * std::f32::consts::PI,
            max_translation: 2.0,
            max_rotation: 0.5 * std::f32::consts::PI,
            baumgarte: 0.2,
            toi_baumgarte: 0.75,
            velocity_threshold: 1.0,
            max_sub_steps: 8,
            max_toi_contacts: 32,
        }
    }
}

impl WorldSettings {
    /// Settings tuned for a 60 Hz game loop. Same as the defaults.
    #[must_use]
    pub fn realtime() -> Self {
        Self::default()
    }

    /// More iterations and tighter sleep tolerances, for stacking and offline simulation.
    #[must_use]
    pub fn high_accuracy() -> Self {
        Self {
            velocity_iterations: 20,
            position_iterations: 10,
            linear_sleep_tolerance: 0.005,
            ..Default::default()
        }
    }

    /// Set the gravity.
    #[must_use]
    pub fn with_gravity(mut self, gravity: Vec2) -> Self {
        self.gravity = gravity;
        self
    }

    /// Disable gravity.
    #[must_use]
    pub fn zero_gravity(mut self) -> Self {
        self.gravity = Vec2::ZERO;
        self
    }

    /// Set velocity and position iteration counts.
    #[must_use]
    pub fn with_iterations(mut self, velocity_iterations: u32, position_iterations: u32) -> Self {
        self.velocity_iterations = velocity_iterations;
        self.position_iterations = position_iterations;
        self
    }

    #[must_use]
    pub fn with_warm_starting(mut self, enabled: bool) -> Self {
        self.warm_starting = enabled;
        self
    }

    #[must_use]
    pub fn with_continuous_physics(mut self, enabled: bool) -> Self {
        self.continuous_physics = enabled;
        self
    }

    #[must_use]
    pub fn with_sub_stepping(mut self, enabled: bool) -> Self {
        self.sub_stepping = enabled;
        self
    }

    #[must_use]
    pub fn with_auto_clear_forces(mut self, enabled: bool) -> Self {
        self.auto_clear_forces = enabled;
        self
    }

    #[must_use]
    pub fn with_sleeping(mut self, enabled: bool) -> Self {
        self.allow_sleep = enabled;
        self
    }

    #[must_use]
    pub fn with_time_to_sleep(mut self, seconds: f32) -> Self {
        self.time_to_sleep = seconds;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> WorldResult<()> {
        if !self.gravity.is_finite() {
            return Err(WorldError::InvalidSettings {
                reason: format!("gravity must be finite, got {}", self.gravity),
            });
        }
        if self.velocity_iterations == 0 {
            return Err(WorldError::InvalidSettings {
                reason: "velocity_iterations must be positive".to_string(),
            });
        }
        if self.max_toi_contacts == 0 {
            return Err(WorldError::InvalidSettings {
                reason: "max_toi_contacts must be positive".to_string(),
            });
        }
        if self.toi_position_iterations == 0 {
            return Err(WorldError::InvalidSettings {
                reason: "toi_position_iterations must be positive".to_string(),
            });
        }
        for (name, value) in [
            ("time_to_sleep", self.time_to_sleep),
            ("linear_sleep_tolerance", self.linear_sleep_tolerance),
            ("angular_sleep_tolerance", self.angular_sleep_tolerance),
            ("max_translation", self.max_translation),
            ("max_rotation", self.max_rotation),
            ("velocity_threshold", self.velocity_threshold),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(WorldError::InvalidSettings {
                    reason: format!("{name} must be finite and non-negative, got {value}"),
                });
            }
        }
        for (name, value) in [
            ("baumgarte", self.baumgarte),
            ("toi_baumgarte", self.toi_baumgarte),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(WorldError::InvalidSettings {
                    reason: format!("{name} must lie in [0, 1], got {value}"),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_defaults_are_valid() {
        let settings = WorldSettings::default();
        assert!(settings.validate().is_ok());
        assert_relative_eq!(settings.gravity.y, -10.0);
        assert_eq!(settings.max_sub_steps, 8);
        assert_eq!(settings.max_toi_contacts, 32);
        assert!(WorldSettings::high_accuracy().validate().is_ok());
    }

    #[test]
    fn test_builder_chain() {
        let settings = WorldSettings::default()
            .zero_gravity()
            .with_iterations(4, 2)
            .with_continuous_physics(false);
        assert_eq!(settings.gravity, Vec2::ZERO);
        assert_eq!(settings.velocity_iterations, 4);
        assert_eq!(settings.position_iterations, 2);
        assert!(!settings.continuous_physics);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let settings = WorldSettings {
            baumgarte: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(WorldError::InvalidSettings { .. })
        ));
        let settings = WorldSettings::default().with_gravity(Vec2::new(f32::NAN, 0.0));
        assert!(settings.validate().is_err());
        let settings = WorldSettings {
            max_toi_contacts: 0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }
}
