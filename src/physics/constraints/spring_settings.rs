use std::f32::consts::PI;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Frequency and damping of a soft constraint.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpringSettings {
    /// Target number of undamped oscillations per unit of time, scaled by 2 * PI.
    pub angular_frequency: f32,
    /// Twice the ratio of the spring's actual damping to its critical damping.
    pub twice_damping_ratio: f32,
}

impl SpringSettings {
    /// Constructs a new spring settings instance.
    ///
    /// # Arguments
    /// * `frequency` - Target number of undamped oscillations per unit of time.
    /// * `damping_ratio` - Ratio of the spring's actual damping to its critical damping. 0 is
    ///   undamped, 1 is critically damped.
    #[inline(always)]
    pub fn new(frequency: f32, damping_ratio: f32) -> Self {
        let settings = Self {
            angular_frequency: frequency * 2.0 * PI,
            twice_damping_ratio: damping_ratio * 2.0,
        };
        debug_assert!(settings.is_valid(), "spring settings must be finite and nonnegative");
        settings
    }

    /// Gets the target number of undamped oscillations per unit of time.
    #[inline(always)]
    pub fn frequency(&self) -> f32 {
        self.angular_frequency / (2.0 * PI)
    }

    /// Sets the target number of undamped oscillations per unit of time.
    #[inline(always)]
    pub fn set_frequency(&mut self, value: f32) {
        self.angular_frequency = value * (2.0 * PI);
    }

    /// Gets the ratio of the spring's actual damping to its critical damping.
    #[inline(always)]
    pub fn damping_ratio(&self) -> f32 {
        self.twice_damping_ratio / 2.0
    }

    /// Sets the ratio of the spring's actual damping to its critical damping.
    #[inline(always)]
    pub fn set_damping_ratio(&mut self, value: f32) {
        self.twice_damping_ratio = value * 2.0;
    }

    /// A zero frequency means the constraint is rigid.
    #[inline(always)]
    pub fn is_rigid(&self) -> bool {
        self.angular_frequency <= 0.0
    }

    #[inline(always)]
    pub fn is_valid(&self) -> bool {
        self.angular_frequency.is_finite()
            && self.angular_frequency >= 0.0
            && self.twice_damping_ratio.is_finite()
            && self.twice_damping_ratio >= 0.0
    }

    /// Computes the softness terms for an effective `mass` over a step of `dt`.
    ///
    /// Returns `(gamma, beta)`: `gamma` is added to the inverse effective mass and scales the
    /// accumulated impulse feedback, `beta` converts position error into a velocity bias.
    pub fn soft_coefficients(&self, mass: f32, dt: f32) -> (f32, f32) {
        let omega = self.angular_frequency;
        let damping = mass * self.twice_damping_ratio * omega;
        let stiffness = mass * omega * omega;
        let gamma = dt * (damping + dt * stiffness);
        let gamma = if gamma != 0.0 { 1.0 / gamma } else { 0.0 };
        (gamma, dt * stiffness * gamma)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_frequency_round_trip() {
        let mut settings = SpringSettings::new(5.0, 0.7);
        assert_relative_eq!(settings.frequency(), 5.0, epsilon = 1e-5);
        assert_relative_eq!(settings.damping_ratio(), 0.7);
        settings.set_frequency(0.0);
        assert!(settings.is_rigid());
    }

    #[test]
    fn test_rigid_spring_has_no_softness() {
        let (gamma, beta) = SpringSettings::default().soft_coefficients(2.0, 1.0 / 60.0);
        assert_eq!(gamma, 0.0);
        assert_eq!(beta, 0.0);
        let (gamma, beta) = SpringSettings::new(4.0, 0.5).soft_coefficients(2.0, 1.0 / 60.0);
        assert!(gamma > 0.0);
        // Position error is never corrected faster than in one step.
        assert!(beta > 0.0 && beta < 60.0);
    }
}
