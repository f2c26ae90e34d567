use super::distance::{distance, DistanceProxy};
use crate::physics::body_properties::Sweep;
use crate::physics::settings::LINEAR_SLOP;
use crate::utilities::math_helper::EPSILON;

/// Upper bound on conservative advancement iterations.
pub const MAX_TOI_ITERATIONS: usize = 30;

/// Input for [`time_of_impact`].
#[derive(Debug, Clone, Copy)]
pub struct ToiInput<'a> {
    pub proxy_a: DistanceProxy<'a>,
    pub proxy_b: DistanceProxy<'a>,
    pub sweep_a: Sweep,
    pub sweep_b: Sweep,
    /// Sweep interval to search, in [0, 1].
    pub t_max: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToiState {
    Unknown,
    /// Iteration budget ran out before a conclusion.
    Failed,
    /// The cores already overlap at the start of the interval.
    Overlapped,
    /// The shapes reach the target separation at `t`.
    Touching,
    /// The shapes stay apart for the whole interval.
    Separated,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToiOutput {
    pub state: ToiState,
    pub t: f32,
}

/// Computes the upper bound of the sweep interval at which the shapes first come within a
/// target separation slightly inside their skins.
///
/// Uses conservative advancement: at each iterate, the current gap divided by an upper bound on
/// the closing speed along the separating direction gives a time step that cannot overshoot.
/// The target keeps a little overlap (three linear slops inside the combined skins) so the
/// contact that follows produces a manifold.
pub fn time_of_impact(input: &ToiInput) -> ToiOutput {
    let mut sweep_a = input.sweep_a;
    let mut sweep_b = input.sweep_b;
    sweep_a.normalize();
    sweep_b.normalize();

    let total_radius = input.proxy_a.radius + input.proxy_b.radius;
    let target = LINEAR_SLOP.max(total_radius - 3.0 * LINEAR_SLOP);
    let tolerance = 0.25 * LINEAR_SLOP;
    debug_assert!(target > tolerance);

    // Motion over the remaining interval, in units of beta.
    let translation_a = sweep_a.c - sweep_a.c0;
    let translation_b = sweep_b.c - sweep_b.c0;
    let angular_a = (sweep_a.a - sweep_a.a0).abs() * input.proxy_a.max_extent_from(sweep_a.local_center);
    let angular_b = (sweep_b.a - sweep_b.a0).abs() * input.proxy_b.max_extent_from(sweep_b.local_center);

    let t_max = input.t_max;
    let mut t = 0.0f32;

    for _ in 0..MAX_TOI_ITERATIONS {
        let xf_a = sweep_a.transform_at(t);
        let xf_b = sweep_b.transform_at(t);
        let output = distance(&input.proxy_a, &xf_a, &input.proxy_b, &xf_b, false);

        // Cores overlapping: give up on continuous collision.
        if output.distance <= 0.0 {
            return ToiOutput {
                state: ToiState::Overlapped,
                t,
            };
        }

        if output.distance < target + tolerance {
            return ToiOutput {
                state: ToiState::Touching,
                t,
            };
        }

        // Closing speed bound along the separating direction.
        let normal = (output.point_b - output.point_a) / output.distance;
        let closing = (translation_a - translation_b).dot(normal) + angular_a + angular_b;
        if closing <= EPSILON {
            return ToiOutput {
                state: ToiState::Separated,
                t: t_max,
            };
        }

        t += (output.distance - target) / closing;
        if t >= t_max {
            return ToiOutput {
                state: ToiState::Separated,
                t: t_max,
            };
        }
    }

    ToiOutput {
        state: ToiState::Failed,
        t,
    }
}
