use glam::Vec2;

use crate::physics::collidables::RayCastInput;
use crate::physics::handles::FixtureHandle;
use crate::physics::trees::Tree;
use crate::utilities::BoundingBox;

/// Identifies a proxy inside a broad phase.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ProxyId(pub u32);

impl std::fmt::Display for ProxyId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "ProxyId<{}>", self.0)
    }
}

/// Data stored with each proxy: which fixture child it bounds.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ProxyData {
    pub fixture: FixtureHandle,
    pub child_index: usize,
}

/// Interface the contact manager uses to find candidate pairs.
///
/// Implementations keep fat bounds per proxy, remember which proxies moved since the last
/// [`BroadPhase::update_pairs`] call, and report each overlapping candidate pair involving a
/// moved proxy exactly once per call, in a deterministic order.
pub trait BroadPhase {
    fn create_proxy(&mut self, aabb: BoundingBox, data: ProxyData) -> ProxyId;

    fn destroy_proxy(&mut self, proxy: ProxyId);

    /// Updates a proxy with new tight bounds. `displacement` predicts further motion.
    fn move_proxy(&mut self, proxy: ProxyId, aabb: BoundingBox, displacement: Vec2);

    /// Marks a proxy as moved so its pairs are reconsidered on the next update.
    fn touch_proxy(&mut self, proxy: ProxyId);

    fn fat_aabb(&self, proxy: ProxyId) -> BoundingBox;

    fn proxy_data(&self, proxy: ProxyId) -> Option<ProxyData>;

    /// Whether the fat bounds of two proxies overlap.
    fn test_overlap(&self, a: ProxyId, b: ProxyId) -> bool;

    fn proxy_count(&self) -> usize;

    /// Reports new candidate pairs and clears the moved set.
    fn update_pairs(&mut self, callback: &mut dyn FnMut(ProxyData, ProxyData));

    /// Visits proxies whose fat bounds overlap `aabb`. Returning false stops the query.
    fn query(&self, aabb: &BoundingBox, callback: &mut dyn FnMut(ProxyId) -> bool);

    /// Casts a segment. See [`Tree::ray_cast`] for the callback protocol.
    fn ray_cast(&self, input: &RayCastInput, callback: &mut dyn FnMut(&RayCastInput, ProxyId) -> f32);

    /// Translates all bounds so that `new_origin` becomes the origin.
    fn shift_origin(&mut self, new_origin: Vec2);
}

/// Broad phase backed by a single dynamic tree.
#[derive(Debug, Default)]
pub struct DynamicTreeBroadPhase {
    tree: Tree<ProxyData>,
    move_buffer: Vec<ProxyId>,
    pair_buffer: Vec<(ProxyId, ProxyId)>,
}

impl DynamicTreeBroadPhase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Height of the underlying tree.
    pub fn tree_height(&self) -> i32 {
        self.tree.height()
    }

    fn buffer_move(&mut self, proxy: ProxyId) {
        self.move_buffer.push(proxy);
    }

    fn unbuffer_move(&mut self, proxy: ProxyId) {
        self.move_buffer.retain(|p| *p != proxy);
    }
}

impl BroadPhase for DynamicTreeBroadPhase {
    fn create_proxy(&mut self, aabb: BoundingBox, data: ProxyData) -> ProxyId {
        let proxy = ProxyId(self.tree.create_proxy(aabb, data));
        self.buffer_move(proxy);
        proxy
    }

    fn destroy_proxy(&mut self, proxy: ProxyId) {
        self.unbuffer_move(proxy);
        self.tree.destroy_proxy(proxy.0);
    }

    fn move_proxy(&mut self, proxy: ProxyId, aabb: BoundingBox, displacement: Vec2) {
        if self.tree.move_proxy(proxy.0, aabb, displacement) {
            self.buffer_move(proxy);
        }
    }

    fn touch_proxy(&mut self, proxy: ProxyId) {
        self.buffer_move(proxy);
    }

    fn fat_aabb(&self, proxy: ProxyId) -> BoundingBox {
        self.tree.fat_aabb(proxy.0)
    }

    fn proxy_data(&self, proxy: ProxyId) -> Option<ProxyData> {
        self.tree.user_data(proxy.0)
    }

    fn test_overlap(&self, a: ProxyId, b: ProxyId) -> bool {
        BoundingBox::intersects(&self.tree.fat_aabb(a.0), &self.tree.fat_aabb(b.0))
    }

    fn proxy_count(&self) -> usize {
        self.tree.proxy_count()
    }

    fn update_pairs(&mut self, callback: &mut dyn FnMut(ProxyData, ProxyData)) {
        self.pair_buffer.clear();

        for &query_proxy in &self.move_buffer {
            let Some(_) = self.tree.user_data(query_proxy.0) else {
                continue;
            };
            let fat = self.tree.fat_aabb(query_proxy.0);
            let tree = &self.tree;
            let pairs = &mut self.pair_buffer;
            tree.query(&fat, |other| {
                if other == query_proxy.0 {
                    return true;
                }
                // Both moved: only the lower id reports, so the pair is not added twice.
                if tree.was_moved(other) && other > query_proxy.0 {
                    return true;
                }
                let pair = (ProxyId(other.min(query_proxy.0)), ProxyId(other.max(query_proxy.0)));
                pairs.push(pair);
                true
            });
        }

        for &proxy in &self.move_buffer {
            self.tree.clear_moved(proxy.0);
        }
        self.move_buffer.clear();

        self.pair_buffer.sort_unstable();
        self.pair_buffer.dedup();

        for &(a, b) in &self.pair_buffer {
            if let (Some(data_a), Some(data_b)) = (self.tree.user_data(a.0), self.tree.user_data(b.0)) {
                callback(data_a, data_b);
            }
        }
    }

    fn query(&self, aabb: &BoundingBox, callback: &mut dyn FnMut(ProxyId) -> bool) {
        self.tree.query(aabb, |id| callback(ProxyId(id)));
    }

    fn ray_cast(&self, input: &RayCastInput, callback: &mut dyn FnMut(&RayCastInput, ProxyId) -> f32) {
        self.tree.ray_cast(input, |sub, id| callback(sub, ProxyId(id)));
    }

    fn shift_origin(&mut self, new_origin: Vec2) {
        self.tree.shift_origin(new_origin);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(i: u32) -> ProxyData {
        ProxyData {
            fixture: FixtureHandle::new(i, 0),
            child_index: 0,
        }
    }

    fn square(x: f32) -> BoundingBox {
        BoundingBox::new(Vec2::new(x, 0.0), Vec2::new(x + 1.0, 1.0))
    }

    #[test]
    fn test_pairs_reported_once() {
        let mut bp = DynamicTreeBroadPhase::new();
        bp.create_proxy(square(0.0), data(0));
        bp.create_proxy(square(0.5), data(1));
        bp.create_proxy(square(10.0), data(2));

        let mut pairs = Vec::new();
        bp.update_pairs(&mut |a, b| pairs.push((a.fixture.index(), b.fixture.index())));
        assert_eq!(pairs.len(), 1);
        let (a, b) = pairs[0];
        assert_eq!((a.min(b), a.max(b)), (0, 1));

        // Nothing moved, nothing new.
        pairs.clear();
        bp.update_pairs(&mut |a, b| pairs.push((a.fixture.index(), b.fixture.index())));
        assert!(pairs.is_empty());
    }

    #[test]
    fn test_moving_into_overlap_reports_pair() {
        let mut bp = DynamicTreeBroadPhase::new();
        let _a = bp.create_proxy(square(0.0), data(0));
        let b = bp.create_proxy(square(5.0), data(1));
        bp.update_pairs(&mut |_, _| panic!("no overlap yet"));

        bp.move_proxy(b, square(0.8), Vec2::new(-4.2, 0.0));
        let mut count = 0;
        bp.update_pairs(&mut |_, _| count += 1);
        assert_eq!(count, 1);
        assert_eq!(bp.proxy_count(), 2);
    }

    #[test]
    fn test_destroyed_proxy_is_forgotten() {
        let mut bp = DynamicTreeBroadPhase::new();
        let a = bp.create_proxy(square(0.0), data(0));
        bp.create_proxy(square(0.5), data(1));
        bp.destroy_proxy(a);
        let mut count = 0;
        bp.update_pairs(&mut |_, _| count += 1);
        assert_eq!(count, 0);
    }
}
