//! Controllers run once per step, after pending changes are applied and before collision, and
//! may adjust body forces and velocities.

use glam::Vec2;

use super::body::Body;
use super::body_description::BodyType;
use super::handles::BodyHandle;
use crate::utilities::Arena;

/// Per-step hook with access to every body.
pub trait Controller {
    fn update(&mut self, bodies: &mut Arena<BodyHandle, Body>, dt: f32);
}

fn is_controllable(body: &Body) -> bool {
    body.in_world && body.enabled && body.body_type == BodyType::Dynamic
}

/// Caps linear and angular speed.
#[derive(Debug, Clone, PartialEq)]
pub struct VelocityLimitController {
    /// Largest linear speed, `None` for no limit.
    pub max_linear_velocity: Option<f32>,
    /// Largest angular speed, `None` for no limit.
    pub max_angular_velocity: Option<f32>,
    /// Bodies to limit. Empty limits every body.
    pub bodies: Vec<BodyHandle>,
}

impl VelocityLimitController {
    pub fn new(max_linear_velocity: Option<f32>, max_angular_velocity: Option<f32>) -> Self {
        Self {
            max_linear_velocity,
            max_angular_velocity,
            bodies: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_bodies(mut self, bodies: Vec<BodyHandle>) -> Self {
        self.bodies = bodies;
        self
    }

    fn limit(&self, body: &mut Body) {
        if let Some(max) = self.max_linear_velocity {
            let speed_squared = body.linear_velocity.length_squared();
            if speed_squared > max * max {
                body.linear_velocity *= max / speed_squared.sqrt();
            }
        }
        if let Some(max) = self.max_angular_velocity {
            if body.angular_velocity.abs() > max {
                body.angular_velocity = max.copysign(body.angular_velocity);
            }
        }
    }
}

impl Controller for VelocityLimitController {
    fn update(&mut self, bodies: &mut Arena<BodyHandle, Body>, _dt: f32) {
        if self.bodies.is_empty() {
            for body in bodies.values_mut().filter(|body| is_controllable(body)) {
                self.limit(body);
            }
        } else {
            for &handle in &self.bodies {
                if let Some(body) = bodies.get_mut(handle).filter(|body| is_controllable(body)) {
                    self.limit(body);
                }
            }
        }
    }
}

/// A fixed attractor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravitySource {
    pub position: Vec2,
    /// Acceleration scale: a body at distance `r` is pulled with `strength * mass / r^2`.
    pub strength: f32,
}

/// Pulls bodies toward point sources with inverse square falloff.
#[derive(Debug, Clone, PartialEq)]
pub struct PointGravityController {
    pub sources: Vec<GravitySource>,
    /// Distances below this are clamped to it, keeping the pull finite.
    pub min_radius: f32,
    /// Bodies farther than this from a source are not pulled by it.
    pub max_radius: f32,
}

impl PointGravityController {
    pub fn new(min_radius: f32, max_radius: f32) -> Self {
        Self {
            sources: Vec::new(),
            min_radius,
            max_radius,
        }
    }

    pub fn add_source(&mut self, position: Vec2, strength: f32) {
        self.sources.push(GravitySource { position, strength });
    }
}

impl Controller for PointGravityController {
    fn update(&mut self, bodies: &mut Arena<BodyHandle, Body>, _dt: f32) {
        let min_squared = self.min_radius * self.min_radius;
        let max_squared = self.max_radius * self.max_radius;
        for body in bodies.values_mut() {
            if !is_controllable(body) || !body.awake {
                continue;
            }
            for source in &self.sources {
                let d = source.position - body.world_center();
                let r_squared = d.length_squared();
                if r_squared > max_squared || r_squared <= f32::EPSILON {
                    continue;
                }
                let magnitude = source.strength * body.mass / r_squared.max(min_squared);
                body.apply_force_to_center(magnitude * d / r_squared.sqrt(), false);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::body_description::BodyDescription;

    fn live_body(description: BodyDescription) -> Body {
        let mut body = Body::new(&description);
        body.in_world = true;
        body
    }

    #[test]
    fn test_velocity_limit_caps_speed() {
        let mut bodies = Arena::new();
        let fast = bodies.insert(live_body(
            BodyDescription::create_dynamic(Vec2::ZERO).with_velocity(Vec2::new(30.0, 40.0), -9.0),
        ));
        let mut controller = VelocityLimitController::new(Some(5.0), Some(2.0));
        controller.update(&mut bodies, 1.0 / 60.0);

        let body = &bodies[fast];
        assert!((body.linear_velocity().length() - 5.0).abs() < 1e-5);
        assert_eq!(body.angular_velocity(), -2.0);
    }

    #[test]
    fn test_velocity_limit_only_touches_listed_bodies() {
        let mut bodies = Arena::new();
        let listed = bodies.insert(live_body(
            BodyDescription::create_dynamic(Vec2::ZERO).with_velocity(Vec2::new(10.0, 0.0), 0.0),
        ));
        let other = bodies.insert(live_body(
            BodyDescription::create_dynamic(Vec2::ZERO).with_velocity(Vec2::new(10.0, 0.0), 0.0),
        ));
        let mut controller = VelocityLimitController::new(Some(1.0), None).with_bodies(vec![listed]);
        controller.update(&mut bodies, 1.0 / 60.0);
        assert_eq!(bodies[listed].linear_velocity().x, 1.0);
        assert_eq!(bodies[other].linear_velocity().x, 10.0);
    }

    #[test]
    fn test_point_gravity_pulls_toward_source() {
        let mut bodies = Arena::new();
        let near = bodies.insert(live_body(BodyDescription::create_dynamic(Vec2::new(2.0, 0.0))));
        let far = bodies.insert(live_body(BodyDescription::create_dynamic(Vec2::new(50.0, 0.0))));
        let fixed = bodies.insert(live_body(BodyDescription::create_static(Vec2::new(1.0, 0.0))));

        let mut controller = PointGravityController::new(0.5, 10.0);
        controller.add_source(Vec2::ZERO, 8.0);
        controller.update(&mut bodies, 1.0 / 60.0);

        // Unit mass at distance 2: 8 / 4.
        assert!((bodies[near].force() - Vec2::new(-2.0, 0.0)).length() < 1e-5);
        assert_eq!(bodies[far].force(), Vec2::ZERO);
        assert_eq!(bodies[fixed].force(), Vec2::ZERO);
    }
}
