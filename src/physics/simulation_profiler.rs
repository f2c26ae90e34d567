#[cfg(feature = "profile")]
use std::collections::HashMap;
#[cfg(feature = "profile")]
use std::time::Instant;

/// Stage names recorded by `World::step`.
pub mod stages {
    pub const STEP: &str = "step";
    pub const APPLY_CHANGES: &str = "apply_changes";
    pub const CONTROLLERS: &str = "controllers";
    pub const COLLIDE: &str = "collide";
    pub const SOLVE: &str = "solve";
    pub const SOLVE_TOI: &str = "solve_toi";
    pub const NEW_CONTACTS: &str = "new_contacts";
}

/// What happened during the previous step.
///
/// Counts are always gathered. Wall clock stage timings are only recorded with the `profile`
/// feature enabled; otherwise `stage_time` reports -1 for every stage.
#[derive(Debug, Clone, Default)]
pub struct StepProfile {
    /// Islands solved in the regular solve.
    pub island_count: usize,
    /// Body count of the largest island.
    pub largest_island: usize,
    /// Time of impact sub-steps taken.
    pub toi_events: usize,
    /// Body count of the largest time of impact island, bounded by twice `max_toi_contacts`.
    pub largest_toi_island: usize,
    /// Awake non-static bodies after the step.
    pub awake_body_count: usize,
    /// Live contacts after the step.
    pub contact_count: usize,
    /// Enabled joints after the step.
    pub joint_count: usize,

    #[cfg(feature = "profile")]
    stages: HashMap<&'static str, f64>,
    #[cfg(feature = "profile")]
    start_timestamps: HashMap<&'static str, Instant>,
}

impl StepProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets the time in seconds the last execution of the given stage took.
    /// If no stage matching the given key ran, returns -1.
    pub fn stage_time(&self, _stage: &'static str) -> f64 {
        #[cfg(feature = "profile")]
        {
            if let Some(&time) = self.stages.get(_stage) {
                return time;
            }
        }
        -1.0
    }

    /// Starts timing a stage.
    pub(crate) fn start(&mut self, _stage: &'static str) {
        #[cfg(feature = "profile")]
        {
            debug_assert!(
                !self.start_timestamps.contains_key(_stage),
                "cannot start a stage that has already been started"
            );
            self.start_timestamps.insert(_stage, Instant::now());
        }
    }

    /// Ends timing a stage and accumulates the elapsed time.
    pub(crate) fn end(&mut self, _stage: &'static str) {
        #[cfg(feature = "profile")]
        {
            let end_time = Instant::now();
            debug_assert!(
                self.start_timestamps.contains_key(_stage),
                "to end a stage, it must currently be active"
            );
            if let Some(start_time) = self.start_timestamps.remove(_stage) {
                let elapsed = end_time.duration_since(start_time).as_secs_f64();
                *self.stages.entry(_stage).or_insert(0.0) += elapsed;
            }
        }
    }

    /// Forgets the previous step: counts go to zero and stage times are dropped.
    pub(crate) fn clear(&mut self) {
        self.island_count = 0;
        self.largest_island = 0;
        self.toi_events = 0;
        self.largest_toi_island = 0;
        self.awake_body_count = 0;
        self.contact_count = 0;
        self.joint_count = 0;
        #[cfg(feature = "profile")]
        {
            debug_assert!(
                self.start_timestamps.is_empty(),
                "some stage was left unended from the previous step"
            );
            self.stages.clear();
        }
    }

    pub(crate) fn record_island(&mut self, body_count: usize) {
        self.island_count += 1;
        self.largest_island = self.largest_island.max(body_count);
    }

    pub(crate) fn record_toi_island(&mut self, body_count: usize) {
        self.toi_events += 1;
        self.largest_toi_island = self.largest_toi_island.max(body_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_islands_track_largest() {
        let mut profile = StepProfile::new();
        profile.record_island(3);
        profile.record_island(7);
        profile.record_island(2);
        assert_eq!(profile.island_count, 3);
        assert_eq!(profile.largest_island, 7);
        profile.record_toi_island(2);
        profile.record_toi_island(4);
        assert_eq!(profile.toi_events, 2);
        assert_eq!(profile.largest_toi_island, 4);
        profile.clear();
        assert_eq!(profile.island_count, 0);
        assert_eq!(profile.largest_toi_island, 0);
    }

    #[cfg(not(feature = "profile"))]
    #[test]
    fn test_stage_times_absent_without_feature() {
        let mut profile = StepProfile::new();
        profile.start(stages::SOLVE);
        profile.end(stages::SOLVE);
        assert_eq!(profile.stage_time(stages::SOLVE), -1.0);
    }

    #[cfg(feature = "profile")]
    #[test]
    fn test_stage_times_accumulate() {
        let mut profile = StepProfile::new();
        profile.start(stages::SOLVE);
        profile.end(stages::SOLVE);
        assert!(profile.stage_time(stages::SOLVE) >= 0.0);
        assert_eq!(profile.stage_time(stages::COLLIDE), -1.0);
    }
}
