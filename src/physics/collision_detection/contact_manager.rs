use std::collections::HashSet;

use tracing::trace;

use super::broad_phase::{BroadPhase, DynamicTreeBroadPhase, ProxyData};
use super::contact::{pair_order, Contact};
use super::narrow_phase_callbacks::{ContactFilter, ContactListener};
use crate::physics::body::{Body, ContactEdge};
use crate::physics::body_description::BodyType;
use crate::physics::commands::CommandBuffer;
use crate::physics::events::WorldEvent;
use crate::physics::fixture::{Filter, Fixture};
use crate::physics::handles::{BodyHandle, ContactHandle, FixtureHandle};
use crate::utilities::Arena;

/// Where contact notifications go while the world steps.
pub(crate) struct ContactSinks<'a> {
    pub listener: &'a mut dyn ContactListener,
    pub events: &'a mut Vec<WorldEvent>,
    pub commands: &'a mut CommandBuffer,
}

/// Normalizes a body pair so lookups do not depend on argument order.
#[inline]
fn body_pair(a: BodyHandle, b: BodyHandle) -> (BodyHandle, BodyHandle) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Owns the broad phase and the set of contacts, keeping the contact graph in step with proxy
/// overlaps.
pub struct ContactManager {
    pub(crate) broad_phase: Box<dyn BroadPhase>,
    pub(crate) contacts: Arena<ContactHandle, Contact>,
    pub(crate) filter: Option<Box<dyn ContactFilter>>,
    ignored_pairs: HashSet<(BodyHandle, BodyHandle)>,
}

impl std::fmt::Debug for ContactManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContactManager")
            .field("proxy_count", &self.broad_phase.proxy_count())
            .field("contact_count", &self.contacts.len())
            .field("ignored_pairs", &self.ignored_pairs.len())
            .finish()
    }
}

impl Default for ContactManager {
    fn default() -> Self {
        Self::new(Box::new(DynamicTreeBroadPhase::new()))
    }
}

impl ContactManager {
    pub fn new(broad_phase: Box<dyn BroadPhase>) -> Self {
        Self {
            broad_phase,
            contacts: Arena::new(),
            filter: None,
            ignored_pairs: HashSet::new(),
        }
    }

    #[inline]
    pub fn contact_count(&self) -> usize {
        self.contacts.len()
    }

    #[inline]
    pub fn broad_phase(&self) -> &dyn BroadPhase {
        self.broad_phase.as_ref()
    }

    /// Stops any contact from forming between two bodies.
    pub(crate) fn ignore_pair(&mut self, a: BodyHandle, b: BodyHandle) -> bool {
        self.ignored_pairs.insert(body_pair(a, b))
    }

    pub(crate) fn restore_pair(&mut self, a: BodyHandle, b: BodyHandle) -> bool {
        self.ignored_pairs.remove(&body_pair(a, b))
    }

    pub(crate) fn forget_body(&mut self, body: BodyHandle) {
        self.ignored_pairs.retain(|&(a, b)| a != body && b != body);
    }

    pub fn is_pair_ignored(&self, a: BodyHandle, b: BodyHandle) -> bool {
        self.ignored_pairs.contains(&body_pair(a, b))
    }

    /// Filter rules shared by pair creation and refiltering: group/category/mask, the ignore
    /// list, then the user filter.
    fn passes_filters(
        &self,
        fixture_a: FixtureHandle,
        a: &Fixture,
        fixture_b: FixtureHandle,
        b: &Fixture,
    ) -> bool {
        if !Filter::should_collide(&a.filter, &b.filter) {
            return false;
        }
        if self.is_pair_ignored(a.body, b.body) {
            return false;
        }
        match &self.filter {
            Some(filter) => filter.should_collide(fixture_a, a, fixture_b, b),
            None => true,
        }
    }

    /// Pulls new overlapping pairs from the broad phase and creates contacts for accepted ones.
    pub(crate) fn find_new_contacts(
        &mut self,
        bodies: &mut Arena<BodyHandle, Body>,
        fixtures: &Arena<FixtureHandle, Fixture>,
    ) {
        let mut pairs = Vec::new();
        self.broad_phase.update_pairs(&mut |a, b| pairs.push((a, b)));
        for (a, b) in pairs {
            self.add_pair(a, b, bodies, fixtures);
        }
    }

    fn add_pair(
        &mut self,
        proxy_a: ProxyData,
        proxy_b: ProxyData,
        bodies: &mut Arena<BodyHandle, Body>,
        fixtures: &Arena<FixtureHandle, Fixture>,
    ) {
        let (Some(fixture_a), Some(fixture_b)) = (fixtures.get(proxy_a.fixture), fixtures.get(proxy_b.fixture))
        else {
            return;
        };
        let body_a_handle = fixture_a.body;
        let body_b_handle = fixture_b.body;

        // Fixtures on the same body never collide.
        if body_a_handle == body_b_handle {
            return;
        }

        let Some(swap) = pair_order(fixture_a.shape.shape_type(), fixture_b.shape.shape_type()) else {
            return;
        };

        let (Some(body_a), Some(body_b)) = (bodies.get(body_a_handle), bodies.get(body_b_handle)) else {
            return;
        };

        // Skip pairs that already have a contact.
        let exists = body_b.contact_edges.iter().any(|edge| {
            if edge.other != body_a_handle {
                return false;
            }
            let Some(contact) = self.contacts.get(edge.contact) else {
                return false;
            };
            let same = contact.fixture_a == proxy_a.fixture
                && contact.fixture_b == proxy_b.fixture
                && contact.child_a == proxy_a.child_index
                && contact.child_b == proxy_b.child_index;
            let flipped = contact.fixture_a == proxy_b.fixture
                && contact.fixture_b == proxy_a.fixture
                && contact.child_a == proxy_b.child_index
                && contact.child_b == proxy_a.child_index;
            same || flipped
        });
        if exists {
            return;
        }

        // Static and kinematic pairs, and joints that forbid collision.
        if !body_b.should_collide(body_a_handle, body_a) {
            return;
        }

        if !self.passes_filters(proxy_a.fixture, fixture_a, proxy_b.fixture, fixture_b) {
            return;
        }

        let (proxy_a, fixture_a, proxy_b, fixture_b) = if swap {
            (proxy_b, fixture_b, proxy_a, fixture_a)
        } else {
            (proxy_a, fixture_a, proxy_b, fixture_b)
        };

        let contact = Contact::new(
            proxy_a.fixture,
            proxy_a.child_index,
            fixture_a,
            proxy_b.fixture,
            proxy_b.child_index,
            fixture_b,
        );
        let body_a_handle = contact.body_a;
        let body_b_handle = contact.body_b;
        let handle = self.contacts.insert(contact);
        trace!(contact = %handle, fixture_a = %proxy_a.fixture, fixture_b = %proxy_b.fixture, "contact created");

        if let Some(body) = bodies.get_mut(body_a_handle) {
            body.contact_edges.push(ContactEdge {
                other: body_b_handle,
                contact: handle,
            });
        }
        if let Some(body) = bodies.get_mut(body_b_handle) {
            body.contact_edges.push(ContactEdge {
                other: body_a_handle,
                contact: handle,
            });
        }
    }

    /// Removes a contact from the graph, reporting the end of touch if it was touching.
    pub(crate) fn destroy(
        &mut self,
        handle: ContactHandle,
        bodies: &mut Arena<BodyHandle, Body>,
        sinks: &mut ContactSinks,
    ) {
        let Some(contact) = self.contacts.remove(handle) else {
            return;
        };
        trace!(contact = %handle, touching = contact.touching, "contact destroyed");

        if contact.touching {
            sinks.listener.end_contact(handle, &contact, sinks.commands);
            sinks.events.push(WorldEvent::EndContact {
                contact: handle,
                fixture_a: contact.fixture_a,
                fixture_b: contact.fixture_b,
            });
        }

        for body_handle in [contact.body_a, contact.body_b] {
            if let Some(body) = bodies.get_mut(body_handle) {
                body.contact_edges.retain(|edge| edge.contact != handle);
            }
        }
    }

    /// Destroys every contact touching the given body.
    pub(crate) fn destroy_body_contacts(
        &mut self,
        body: BodyHandle,
        bodies: &mut Arena<BodyHandle, Body>,
        sinks: &mut ContactSinks,
    ) {
        let edges: Vec<ContactHandle> = match bodies.get(body) {
            Some(b) => b.contact_edges.iter().map(|edge| edge.contact).collect(),
            None => return,
        };
        for contact in edges {
            self.destroy(contact, bodies, sinks);
        }
    }

    /// Destroys every contact involving the given fixture.
    pub(crate) fn destroy_fixture_contacts(
        &mut self,
        fixture: FixtureHandle,
        body: BodyHandle,
        bodies: &mut Arena<BodyHandle, Body>,
        sinks: &mut ContactSinks,
    ) {
        let edges: Vec<ContactHandle> = match bodies.get(body) {
            Some(b) => b
                .contact_edges
                .iter()
                .map(|edge| edge.contact)
                .filter(|c| {
                    self.contacts
                        .get(*c)
                        .is_some_and(|contact| contact.fixture_a == fixture || contact.fixture_b == fixture)
                })
                .collect(),
            None => return,
        };
        for contact in edges {
            self.destroy(contact, bodies, sinks);
        }
    }

    /// Refreshes every contact: refilters flagged pairs, drops pairs whose fat bounds separated
    /// and recomputes manifolds for pairs with at least one active body.
    pub(crate) fn collide(
        &mut self,
        bodies: &mut Arena<BodyHandle, Body>,
        fixtures: &Arena<FixtureHandle, Fixture>,
        sinks: &mut ContactSinks,
    ) {
        for handle in self.contacts.handles() {
            let Some(contact) = self.contacts.get(handle) else {
                continue;
            };
            let (handle_a, handle_b) = (contact.fixture_a, contact.fixture_b);
            let (child_a, child_b) = (contact.child_a, contact.child_b);
            let (body_a_handle, body_b_handle) = (contact.body_a, contact.body_b);
            let filter_flag = contact.filter_flag;

            let (Some(fixture_a), Some(fixture_b)) = (fixtures.get(handle_a), fixtures.get(handle_b)) else {
                self.destroy(handle, bodies, sinks);
                continue;
            };
            let (Some(body_a), Some(body_b)) = (bodies.get(body_a_handle), bodies.get(body_b_handle)) else {
                self.destroy(handle, bodies, sinks);
                continue;
            };

            if filter_flag {
                if !body_b.should_collide(body_a_handle, body_a)
                    || !self.passes_filters(handle_a, fixture_a, handle_b, fixture_b)
                {
                    self.destroy(handle, bodies, sinks);
                    continue;
                }
                if let Some(contact) = self.contacts.get_mut(handle) {
                    contact.filter_flag = false;
                }
            }

            let active_a = body_a.awake && body_a.body_type != BodyType::Static;
            let active_b = body_b.awake && body_b.body_type != BodyType::Static;
            // Neither body can move, so the manifold cannot change.
            if !active_a && !active_b {
                continue;
            }

            let proxy_a = fixture_a.proxies.iter().find(|p| p.child_index == child_a);
            let proxy_b = fixture_b.proxies.iter().find(|p| p.child_index == child_b);
            let overlap = match (proxy_a, proxy_b) {
                (Some(a), Some(b)) => self.broad_phase.test_overlap(a.proxy_id, b.proxy_id),
                _ => false,
            };
            if !overlap {
                self.destroy(handle, bodies, sinks);
                continue;
            }

            self.update_contact(handle, bodies, fixtures, sinks);
        }
    }

    /// Recomputes one contact's manifold, waking both bodies on a touch change and raising the
    /// begin, end and pre-solve notifications.
    pub(crate) fn update_contact(
        &mut self,
        handle: ContactHandle,
        bodies: &mut Arena<BodyHandle, Body>,
        fixtures: &Arena<FixtureHandle, Fixture>,
        sinks: &mut ContactSinks,
    ) {
        let Some(contact) = self.contacts.get_mut(handle) else {
            return;
        };
        let (Some(fixture_a), Some(fixture_b)) = (fixtures.get(contact.fixture_a), fixtures.get(contact.fixture_b))
        else {
            return;
        };
        let (Some(xf_a), Some(xf_b)) = (
            bodies.get(contact.body_a).map(|b| b.xf),
            bodies.get(contact.body_b).map(|b| b.xf),
        ) else {
            return;
        };

        let update = contact.update(fixture_a, &xf_a, fixture_b, &xf_b);

        if update.touching != update.was_touching {
            for body in [contact.body_a, contact.body_b] {
                if let Some(body) = bodies.get_mut(body) {
                    body.set_awake(true);
                }
            }
        }

        if !update.was_touching && update.touching {
            sinks.listener.begin_contact(handle, contact, sinks.commands);
            sinks.events.push(WorldEvent::BeginContact {
                contact: handle,
                fixture_a: contact.fixture_a,
                fixture_b: contact.fixture_b,
            });
        }

        if update.was_touching && !update.touching {
            sinks.listener.end_contact(handle, contact, sinks.commands);
            sinks.events.push(WorldEvent::EndContact {
                contact: handle,
                fixture_a: contact.fixture_a,
                fixture_b: contact.fixture_b,
            });
        }

        if !update.sensor
            && update.touching
            && !sinks
                .listener
                .pre_solve(handle, contact, &update.old_manifold, sinks.commands)
        {
            contact.set_enabled(false);
        }
    }

    /// Flags every contact of `body` that involves `fixture` for refiltering.
    pub(crate) fn flag_fixture_for_filtering(&mut self, body: &Body, fixture: FixtureHandle) {
        for edge in &body.contact_edges {
            if let Some(contact) = self.contacts.get_mut(edge.contact) {
                if contact.fixture_a == fixture || contact.fixture_b == fixture {
                    contact.flag_for_filtering();
                }
            }
        }
    }

    /// Flags every contact between `body` and `other` for refiltering.
    pub(crate) fn flag_pair_for_filtering(&mut self, body: &Body, other: BodyHandle) {
        for edge in body.contact_edges.iter().filter(|edge| edge.other == other) {
            if let Some(contact) = self.contacts.get_mut(edge.contact) {
                contact.flag_for_filtering();
            }
        }
    }
}
