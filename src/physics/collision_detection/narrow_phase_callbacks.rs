use super::contact::Contact;
use super::contact_manifold::Manifold;
use crate::physics::commands::CommandBuffer;
use crate::physics::fixture::Fixture;
use crate::physics::handles::{ContactHandle, FixtureHandle};
use crate::physics::settings::MAX_MANIFOLD_POINTS;

/// Impulses the solver applied to a contact during the last solve, one entry per manifold point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContactImpulse {
    pub normal_impulses: [f32; MAX_MANIFOLD_POINTS],
    pub tangent_impulses: [f32; MAX_MANIFOLD_POINTS],
    pub count: usize,
}

/// Defines handlers for contact events raised while the world steps.
///
/// Handlers run synchronously on the stepping thread. They cannot touch the world's collections
/// directly; removals go through the provided [`CommandBuffer`] and take effect at the start of
/// the next step.
pub trait ContactListener {
    /// Called when two fixtures begin to touch.
    fn begin_contact(&mut self, _handle: ContactHandle, _contact: &Contact, _commands: &mut CommandBuffer) {}

    /// Called when two fixtures cease to touch, including when a touching contact is destroyed.
    fn end_contact(&mut self, _handle: ContactHandle, _contact: &Contact, _commands: &mut CommandBuffer) {}

    /// Called after a touching manifold is computed and before the solver consumes it.
    /// Returning false skips the contact for the current step only. The contact may also be
    /// adjusted here, e.g. its friction or restitution.
    ///
    /// # Arguments
    /// * `contact` - The contact, carrying the freshly computed manifold.
    /// * `old_manifold` - The manifold from the previous update.
    fn pre_solve(
        &mut self,
        _handle: ContactHandle,
        _contact: &mut Contact,
        _old_manifold: &Manifold,
        _commands: &mut CommandBuffer,
    ) -> bool {
        true
    }

    /// Called after the solver finished with a contact, with the impulses it applied.
    fn post_solve(
        &mut self,
        _handle: ContactHandle,
        _contact: &Contact,
        _impulse: &ContactImpulse,
        _commands: &mut CommandBuffer,
    ) {
    }
}

/// Listener that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopContactListener;

impl ContactListener for NoopContactListener {}

/// User veto over new pairs. Runs after the category, mask and group rules have accepted the
/// pair, and again whenever a contact is flagged for refiltering.
pub trait ContactFilter {
    fn should_collide(
        &self,
        fixture_a: FixtureHandle,
        a: &Fixture,
        fixture_b: FixtureHandle,
        b: &Fixture,
    ) -> bool;
}

impl<F> ContactFilter for F
where
    F: Fn(FixtureHandle, &Fixture, FixtureHandle, &Fixture) -> bool,
{
    fn should_collide(
        &self,
        fixture_a: FixtureHandle,
        a: &Fixture,
        fixture_b: FixtureHandle,
        b: &Fixture,
    ) -> bool {
        self(fixture_a, a, fixture_b, b)
    }
}
