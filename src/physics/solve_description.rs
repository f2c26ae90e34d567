use super::settings::WorldSettings;

/// Describes one pass of the solver: a full step or a time of impact sub-step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeStep {
    /// Duration of the pass in seconds.
    pub dt: f32,
    /// Inverse duration, zero when `dt` is zero.
    pub inv_dt: f32,
    /// `dt` of the previous step divided by this one's. Scales warm started impulses.
    pub dt_ratio: f32,
    /// Number of velocity iterations.
    pub velocity_iterations: u32,
    /// Number of position iterations.
    pub position_iterations: u32,
    /// Whether accumulated impulses seed the solver.
    pub warm_starting: bool,
}

impl TimeStep {
    /// Creates the description of a full step.
    ///
    /// # Arguments
    /// * `dt` - Step duration.
    /// * `inv_dt0` - Inverse duration of the previous step, zero if there was none.
    /// * `settings` - Iteration counts and warm starting come from here.
    pub fn new(dt: f32, inv_dt0: f32, settings: &WorldSettings) -> Self {
        let inv_dt = if dt > 0.0 { 1.0 / dt } else { 0.0 };
        Self {
            dt,
            inv_dt,
            dt_ratio: inv_dt0 * dt,
            velocity_iterations: settings.velocity_iterations,
            position_iterations: settings.position_iterations,
            warm_starting: settings.warm_starting,
        }
    }

    /// Creates the description of a time of impact sub-step covering `dt` seconds.
    /// Sub-steps never warm start.
    pub fn sub_step(dt: f32, base: &TimeStep, settings: &WorldSettings) -> Self {
        Self {
            dt,
            inv_dt: if dt > 0.0 { 1.0 / dt } else { 0.0 },
            dt_ratio: 1.0,
            velocity_iterations: base.velocity_iterations,
            position_iterations: settings.toi_position_iterations,
            warm_starting: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_against_previous_step() {
        let settings = WorldSettings::default();
        let step = TimeStep::new(1.0 / 120.0, 60.0, &settings);
        assert!((step.dt_ratio - 0.5).abs() < 1e-6);
        let first = TimeStep::new(1.0 / 60.0, 0.0, &settings);
        assert_eq!(first.dt_ratio, 0.0);
        let sub = TimeStep::sub_step(0.25 / 60.0, &first, &settings);
        assert!(!sub.warm_starting);
        assert_eq!(sub.position_iterations, settings.toi_position_iterations);
    }
}
