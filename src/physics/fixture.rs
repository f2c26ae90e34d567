use glam::Vec2;

use super::body_properties::{MassData, Transform};
use super::collidables::{ConvexShape, RayCastInput, RayCastOutput, Shape};
use super::collision_detection::{BroadPhase, ProxyData, ProxyId};
use super::handles::{BodyHandle, FixtureHandle};
use crate::utilities::BoundingBox;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Collision filtering data.
///
/// Two fixtures in the same nonzero group always collide (positive group) or never collide
/// (negative group). Otherwise each fixture's category must be accepted by the other's mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Filter {
    /// Categories this fixture belongs to.
    pub category_bits: u32,
    /// Categories this fixture accepts collisions with.
    pub mask_bits: u32,
    /// Group override; zero means no group.
    pub group_index: i16,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            category_bits: 0x0001,
            mask_bits: u32::MAX,
            group_index: 0,
        }
    }
}

impl Filter {
    /// Evaluates the group, category and mask rules for a pair.
    #[inline]
    pub fn should_collide(a: &Filter, b: &Filter) -> bool {
        if a.group_index == b.group_index && a.group_index != 0 {
            return a.group_index > 0;
        }
        (a.mask_bits & b.category_bits) != 0 && (a.category_bits & b.mask_bits) != 0
    }
}

/// Describes a fixture to attach to a body.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FixtureDescription {
    pub shape: Shape,
    /// Coulomb friction coefficient, usually in [0, 1].
    pub friction: f32,
    /// Bounciness, usually in [0, 1].
    pub restitution: f32,
    /// Mass per unit area.
    pub density: f32,
    /// Sensors detect overlap but never produce a collision response.
    pub is_sensor: bool,
    pub filter: Filter,
    /// Categories this fixture skips continuous collision against.
    pub ignore_ccd_with: u32,
    pub user_data: u64,
}

impl FixtureDescription {
    /// Creates a description with default material properties: friction 0.2, no restitution,
    /// zero density.
    pub fn new(shape: impl Into<Shape>) -> Self {
        Self {
            shape: shape.into(),
            friction: 0.2,
            restitution: 0.0,
            density: 0.0,
            is_sensor: false,
            filter: Filter::default(),
            ignore_ccd_with: 0,
            user_data: 0,
        }
    }

    #[must_use]
    pub fn with_density(mut self, density: f32) -> Self {
        self.density = density;
        self
    }

    #[must_use]
    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    #[must_use]
    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub fn as_sensor(mut self) -> Self {
        self.is_sensor = true;
        self
    }

    #[must_use]
    pub fn with_user_data(mut self, user_data: u64) -> Self {
        self.user_data = user_data;
        self
    }
}

/// Broad-phase bookkeeping for one child of a fixture's shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixtureProxy {
    /// Tight bounds at the last synchronization, swept over the step.
    pub aabb: BoundingBox,
    pub child_index: usize,
    pub proxy_id: ProxyId,
}

/// A shape attached to a body, with material and filtering properties.
#[derive(Debug, Clone)]
pub struct Fixture {
    pub(crate) body: BodyHandle,
    pub(crate) shape: Shape,
    pub(crate) density: f32,
    pub(crate) friction: f32,
    pub(crate) restitution: f32,
    pub(crate) is_sensor: bool,
    pub(crate) filter: Filter,
    pub(crate) ignore_ccd_with: u32,
    pub(crate) proxies: Vec<FixtureProxy>,
    pub user_data: u64,
}

impl Fixture {
    pub(crate) fn new(body: BodyHandle, description: FixtureDescription) -> Self {
        debug_assert!(description.density >= 0.0 && description.density.is_finite());
        debug_assert!(description.friction >= 0.0 && description.friction.is_finite());
        Self {
            body,
            shape: description.shape,
            density: description.density,
            friction: description.friction,
            restitution: description.restitution,
            is_sensor: description.is_sensor,
            filter: description.filter,
            ignore_ccd_with: description.ignore_ccd_with,
            proxies: Vec::new(),
            user_data: description.user_data,
        }
    }

    #[inline]
    pub fn body(&self) -> BodyHandle {
        self.body
    }

    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    #[inline]
    pub fn density(&self) -> f32 {
        self.density
    }

    #[inline]
    pub fn friction(&self) -> f32 {
        self.friction
    }

    /// Changes friction for contacts created from now on.
    pub fn set_friction(&mut self, friction: f32) {
        self.friction = friction;
    }

    #[inline]
    pub fn restitution(&self) -> f32 {
        self.restitution
    }

    /// Changes restitution for contacts created from now on.
    pub fn set_restitution(&mut self, restitution: f32) {
        self.restitution = restitution;
    }

    #[inline]
    pub fn is_sensor(&self) -> bool {
        self.is_sensor
    }

    #[inline]
    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    #[inline]
    pub fn ignore_ccd_with(&self) -> u32 {
        self.ignore_ccd_with
    }

    /// Broad-phase proxies, one per shape child while the body is in the world and enabled.
    #[inline]
    pub fn proxies(&self) -> &[FixtureProxy] {
        &self.proxies
    }

    /// Bounds of a child as of the last synchronization.
    pub fn aabb(&self, child_index: usize) -> Option<BoundingBox> {
        self.proxies
            .iter()
            .find(|p| p.child_index == child_index)
            .map(|p| p.aabb)
    }

    pub fn mass_data(&self) -> MassData {
        self.shape.compute_mass(self.density)
    }

    pub fn test_point(&self, transform: &Transform, point: Vec2) -> bool {
        self.shape.test_point(transform, point)
    }

    pub fn ray_cast(&self, input: &RayCastInput, transform: &Transform) -> Option<RayCastOutput> {
        self.shape.ray_cast(input, transform)
    }

    pub(crate) fn create_proxies(
        &mut self,
        broad_phase: &mut dyn BroadPhase,
        transform: &Transform,
        handle: FixtureHandle,
    ) {
        debug_assert!(self.proxies.is_empty());
        for child_index in 0..self.shape.child_count() {
            let aabb = self.shape.compute_bounds(transform);
            let proxy_id = broad_phase.create_proxy(
                aabb,
                ProxyData {
                    fixture: handle,
                    child_index,
                },
            );
            self.proxies.push(FixtureProxy {
                aabb,
                child_index,
                proxy_id,
            });
        }
    }

    pub(crate) fn destroy_proxies(&mut self, broad_phase: &mut dyn BroadPhase) {
        for proxy in self.proxies.drain(..) {
            broad_phase.destroy_proxy(proxy.proxy_id);
        }
    }

    /// Moves every proxy to cover the swept bounds from `transform1` to `transform2`.
    pub(crate) fn synchronize(
        &mut self,
        broad_phase: &mut dyn BroadPhase,
        transform1: &Transform,
        transform2: &Transform,
    ) {
        for proxy in &mut self.proxies {
            let aabb1 = self.shape.compute_bounds(transform1);
            let aabb2 = self.shape.compute_bounds(transform2);
            proxy.aabb = BoundingBox::create_merged(&aabb1, &aabb2);
            let displacement = aabb2.center() - aabb1.center();
            broad_phase.move_proxy(proxy.proxy_id, proxy.aabb, displacement);
        }
    }

    /// Flags every proxy so pairs are reconsidered on the next update.
    pub(crate) fn touch_proxies(&self, broad_phase: &mut dyn BroadPhase) {
        for proxy in &self.proxies {
            broad_phase.touch_proxy(proxy.proxy_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_groups_override_masks() {
        let a = Filter {
            group_index: -1,
            ..Default::default()
        };
        assert!(!Filter::should_collide(&a, &a));

        let b = Filter {
            group_index: 2,
            mask_bits: 0,
            ..Default::default()
        };
        assert!(Filter::should_collide(&b, &b));
    }

    #[test]
    fn test_filter_category_and_mask_must_agree() {
        let player = Filter {
            category_bits: 0x2,
            mask_bits: 0x4,
            group_index: 0,
        };
        let wall = Filter {
            category_bits: 0x4,
            mask_bits: 0xFFFF,
            group_index: 0,
        };
        let ghost = Filter {
            category_bits: 0x8,
            mask_bits: 0xFFFF,
            group_index: 0,
        };
        assert!(Filter::should_collide(&player, &wall));
        assert!(!Filter::should_collide(&player, &ghost));
        assert!(!Filter::should_collide(&player, &player));
    }
}
