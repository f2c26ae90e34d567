use glam::Vec2;

use super::World;
use crate::physics::collidables::RayCastInput;
use crate::physics::handles::FixtureHandle;
use crate::utilities::BoundingBox;

/// A fixture hit by [`World::ray_cast`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub fixture: FixtureHandle,
    /// World space hit point.
    pub point: Vec2,
    /// Surface normal at the hit point.
    pub normal: Vec2,
    /// Position of the hit along the segment, 0 at `p1` and 1 at `p2`.
    pub fraction: f32,
}

impl World {
    /// Visits fixtures whose fat bounds overlap `aabb`. The callback returns false to stop.
    ///
    /// Fat bounds are conservative, so a reported fixture may not actually overlap the box.
    pub fn query_aabb(&self, aabb: &BoundingBox, mut callback: impl FnMut(FixtureHandle) -> bool) {
        let broad_phase = self.contact_manager.broad_phase();
        broad_phase.query(aabb, &mut |proxy| match broad_phase.proxy_data(proxy) {
            Some(data) => callback(data.fixture),
            None => true,
        });
    }

    /// Casts a segment from `p1` to `p2` through the world.
    ///
    /// The callback controls the cast through its return value:
    /// * `-1` ignores the hit and continues.
    /// * `0` terminates the cast.
    /// * a fraction clips the segment to that point, so only closer hits are reported after.
    /// * `1` continues unclipped.
    ///
    /// Hits are reported in no particular order.
    pub fn ray_cast(&self, p1: Vec2, p2: Vec2, mut callback: impl FnMut(RayHit) -> f32) {
        let broad_phase = self.contact_manager.broad_phase();
        let input = RayCastInput::new(p1, p2);
        broad_phase.ray_cast(&input, &mut |sub_input, proxy| {
            let Some(data) = broad_phase.proxy_data(proxy) else {
                return sub_input.max_fraction;
            };
            let Some(fixture) = self.fixtures.get(data.fixture) else {
                return sub_input.max_fraction;
            };
            let Some(body) = self.bodies.get(fixture.body) else {
                return sub_input.max_fraction;
            };
            match fixture.ray_cast(sub_input, &body.xf) {
                Some(output) => callback(RayHit {
                    fixture: data.fixture,
                    point: (1.0 - output.fraction) * sub_input.p1 + output.fraction * sub_input.p2,
                    normal: output.normal,
                    fraction: output.fraction,
                }),
                None => sub_input.max_fraction,
            }
        });
    }

    /// Convenience over [`World::ray_cast`] returning the closest hit.
    pub fn ray_cast_closest(&self, p1: Vec2, p2: Vec2) -> Option<RayHit> {
        let mut closest = None;
        self.ray_cast(p1, p2, |hit| {
            closest = Some(hit);
            hit.fraction
        });
        closest
    }

    /// Finds a fixture containing `point`, if any.
    pub fn test_point(&self, point: Vec2) -> Option<FixtureHandle> {
        let aabb = BoundingBox::new(point, point);
        let mut found = None;
        self.query_aabb(&aabb, |handle| {
            let hit = self
                .fixtures
                .get(handle)
                .and_then(|fixture| Some((fixture, self.bodies.get(fixture.body)?)))
                .is_some_and(|(fixture, body)| fixture.test_point(&body.xf, point));
            if hit {
                found = Some(handle);
            }
            !hit
        });
        found
    }
}

#[cfg(test)]
mod tests {
    use crate::physics::body_description::BodyDescription;
    use crate::physics::collidables::{CircleShape, PolygonShape};
    use crate::physics::fixture::FixtureDescription;
    use crate::physics::settings::WorldSettings;
    use crate::physics::world::World;
    use crate::utilities::BoundingBox;
    use approx::assert_relative_eq;
    use glam::Vec2;

    fn row_of_boxes() -> (World, Vec<crate::physics::handles::FixtureHandle>) {
        let mut world = World::new(WorldSettings::default()).unwrap();
        let mut fixtures = Vec::new();
        for x in [2.0, 5.0, 8.0] {
            let body = world.create_body(BodyDescription::create_static(Vec2::new(x, 0.0)));
            fixtures.push(
                world
                    .create_fixture(body, FixtureDescription::new(PolygonShape::new_box(0.5, 0.5).unwrap()))
                    .unwrap(),
            );
        }
        world.step(0.0);
        (world, fixtures)
    }

    #[test]
    fn test_query_aabb_finds_overlapping() {
        let (world, fixtures) = row_of_boxes();
        let mut found = Vec::new();
        world.query_aabb(&BoundingBox::new(Vec2::new(4.0, -1.0), Vec2::new(9.0, 1.0)), |fixture| {
            found.push(fixture);
            true
        });
        found.sort_by_key(|f| f.index());
        assert_eq!(found, vec![fixtures[1], fixtures[2]]);
    }

    #[test]
    fn test_closest_ray_hit() {
        let (world, fixtures) = row_of_boxes();
        let hit = world.ray_cast_closest(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0)).unwrap();
        assert_eq!(hit.fixture, fixtures[0]);
        assert_relative_eq!(hit.point.x, 1.5, epsilon = 1e-5);
        assert_relative_eq!(hit.fraction, 0.15, epsilon = 1e-5);
        assert_relative_eq!(hit.normal.x, -1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_ray_cast_terminate_and_ignore() {
        let (world, _) = row_of_boxes();
        let mut hits = 0;
        world.ray_cast(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), |_| {
            hits += 1;
            0.0
        });
        assert_eq!(hits, 1);

        let mut hits = 0;
        world.ray_cast(Vec2::new(0.0, 0.0), Vec2::new(10.0, 0.0), |_| {
            hits += 1;
            -1.0
        });
        assert_eq!(hits, 3);
    }

    #[test]
    fn test_point_inside_circle() {
        let mut world = World::new(WorldSettings::default()).unwrap();
        let body = world.create_body(BodyDescription::create_static(Vec2::new(1.0, 1.0)));
        let fixture = world
            .create_fixture(body, FixtureDescription::new(CircleShape::new(0.5).unwrap()))
            .unwrap();
        world.step(0.0);
        assert_eq!(world.test_point(Vec2::new(1.2, 1.1)), Some(fixture));
        assert_eq!(world.test_point(Vec2::new(1.6, 1.0)), None);
    }
}
