use glam::Vec2;

use crate::physics::collidables::RayCastInput;
use crate::physics::settings::{AABB_EXTENSION, AABB_MULTIPLIER};
use crate::utilities::math_helper::cross_sv;
use crate::utilities::BoundingBox;

/// Null node sentinel.
pub const NULL_NODE: u32 = u32::MAX;

/// A node in the dynamic tree. Leaves carry user data; internal nodes carry merged bounds.
#[derive(Clone, Debug)]
struct Node<T> {
    /// Fat bounds for leaves, merged bounds of the children otherwise.
    aabb: BoundingBox,
    parent: u32,
    child1: u32,
    child2: u32,
    /// Leaf = 0, free node = -1.
    height: i32,
    user_data: Option<T>,
    /// Set when the leaf was reinserted since the last pair update.
    moved: bool,
}

impl<T> Node<T> {
    fn free() -> Self {
        Self {
            aabb: BoundingBox::default(),
            parent: NULL_NODE,
            child1: NULL_NODE,
            child2: NULL_NODE,
            height: -1,
            user_data: None,
            moved: false,
        }
    }

    #[inline(always)]
    fn is_leaf(&self) -> bool {
        self.child1 == NULL_NODE
    }
}

/// Dynamic bounding volume hierarchy over fattened proxy bounds.
///
/// Proxies are leaves. Fat bounds absorb small motions so that moving a proxy usually does not
/// touch the tree. Insertion picks the sibling by a surface area heuristic and the tree is kept
/// balanced with rotations on the way back up.
#[derive(Clone, Debug)]
pub struct Tree<T: Copy> {
    nodes: Vec<Node<T>>,
    free_list: Vec<u32>,
    root: u32,
    proxy_count: usize,
    margin: f32,
}

impl<T: Copy> Default for Tree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy> Tree<T> {
    /// Creates a tree using the default fat margin.
    pub fn new() -> Self {
        Self::with_margin(AABB_EXTENSION)
    }

    /// Creates a tree whose leaves are fattened by `margin` on every side.
    pub fn with_margin(margin: f32) -> Self {
        Self {
            nodes: Vec::new(),
            free_list: Vec::new(),
            root: NULL_NODE,
            proxy_count: 0,
            margin,
        }
    }

    /// Number of live proxies.
    #[inline]
    pub fn proxy_count(&self) -> usize {
        self.proxy_count
    }

    /// Height of the root, or zero for an empty tree.
    pub fn height(&self) -> i32 {
        if self.root == NULL_NODE {
            0
        } else {
            self.nodes[self.root as usize].height
        }
    }

    /// Fat bounds stored for the proxy.
    #[inline]
    pub fn fat_aabb(&self, proxy_id: u32) -> BoundingBox {
        self.nodes[proxy_id as usize].aabb
    }

    /// User data stored with the proxy.
    #[inline]
    pub fn user_data(&self, proxy_id: u32) -> Option<T> {
        self.nodes.get(proxy_id as usize).and_then(|n| n.user_data)
    }

    #[inline]
    pub fn was_moved(&self, proxy_id: u32) -> bool {
        self.nodes[proxy_id as usize].moved
    }

    #[inline]
    pub fn clear_moved(&mut self, proxy_id: u32) {
        if let Some(node) = self.nodes.get_mut(proxy_id as usize) {
            node.moved = false;
        }
    }

    /// Creates a proxy for the tight bounds `aabb`. Returns its id.
    pub fn create_proxy(&mut self, aabb: BoundingBox, user_data: T) -> u32 {
        let id = self.allocate_node();
        {
            let node = &mut self.nodes[id as usize];
            node.aabb = aabb.expanded(self.margin);
            node.user_data = Some(user_data);
            node.height = 0;
            node.moved = true;
        }
        self.insert_leaf(id);
        self.proxy_count += 1;
        id
    }

    pub fn destroy_proxy(&mut self, proxy_id: u32) {
        debug_assert!(self.nodes[proxy_id as usize].is_leaf());
        self.remove_leaf(proxy_id);
        self.free_node(proxy_id);
        self.proxy_count -= 1;
    }

    /// Moves a proxy with a swept bounds. If the new bounds escape the fat bounds (or the fat
    /// bounds have grown far too large), the proxy is reinserted and true is returned.
    pub fn move_proxy(&mut self, proxy_id: u32, aabb: BoundingBox, displacement: Vec2) -> bool {
        debug_assert!(self.nodes[proxy_id as usize].is_leaf());

        // Extend the fat bounds in the direction of motion.
        let mut fat = aabb.expanded(self.margin);
        let d = AABB_MULTIPLIER * displacement;
        if d.x < 0.0 {
            fat.min.x += d.x;
        } else {
            fat.max.x += d.x;
        }
        if d.y < 0.0 {
            fat.min.y += d.y;
        } else {
            fat.max.y += d.y;
        }

        let tree_aabb = self.nodes[proxy_id as usize].aabb;
        if tree_aabb.contains(&aabb) {
            // Still contained, but refit if the stored bounds are much too large.
            let huge = fat.expanded(4.0 * self.margin);
            if huge.contains(&tree_aabb) {
                return false;
            }
        }

        self.remove_leaf(proxy_id);
        self.nodes[proxy_id as usize].aabb = fat;
        self.insert_leaf(proxy_id);
        self.nodes[proxy_id as usize].moved = true;
        true
    }

    /// Calls `callback` for every proxy whose fat bounds overlap `aabb`. Returning false from the
    /// callback stops the query.
    pub fn query(&self, aabb: &BoundingBox, mut callback: impl FnMut(u32) -> bool) {
        if self.root == NULL_NODE {
            return;
        }
        let mut stack = Vec::with_capacity(64);
        stack.push(self.root);
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id as usize];
            if !BoundingBox::intersects(&node.aabb, aabb) {
                continue;
            }
            if node.is_leaf() {
                if !callback(id) {
                    return;
                }
            } else {
                stack.push(node.child1);
                stack.push(node.child2);
            }
        }
    }

    /// Casts a segment against the proxies. The callback receives the current input and a proxy
    /// id and returns the new max fraction: 0 terminates, a value below the current fraction
    /// clips the segment, and the current fraction continues unchanged.
    pub fn ray_cast(&self, input: &RayCastInput, mut callback: impl FnMut(&RayCastInput, u32) -> f32) {
        if self.root == NULL_NODE {
            return;
        }
        let p1 = input.p1;
        let p2 = input.p2;
        let r = (p2 - p1).normalize_or_zero();
        if r == Vec2::ZERO {
            return;
        }

        // Separating axis for the segment: |dot(v, p1 - c)| > dot(|v|, h)
        let v = cross_sv(1.0, r);
        let abs_v = v.abs();

        let mut max_fraction = input.max_fraction;
        let mut segment_aabb = BoundingBox::from_points(p1, p1 + max_fraction * (p2 - p1));

        let mut stack = Vec::with_capacity(64);
        stack.push(self.root);
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id as usize];
            if !BoundingBox::intersects(&node.aabb, &segment_aabb) {
                continue;
            }

            let c = node.aabb.center();
            let h = node.aabb.extents();
            let separation = v.dot(p1 - c).abs() - abs_v.dot(h);
            if separation > 0.0 {
                continue;
            }

            if node.is_leaf() {
                let sub_input = RayCastInput { p1, p2, max_fraction };
                let value = callback(&sub_input, id);
                if value == 0.0 {
                    return;
                }
                if value > 0.0 && value < max_fraction {
                    max_fraction = value;
                    segment_aabb = BoundingBox::from_points(p1, p1 + max_fraction * (p2 - p1));
                }
            } else {
                stack.push(node.child1);
                stack.push(node.child2);
            }
        }
    }

    /// Translates every node by `-new_origin`.
    pub fn shift_origin(&mut self, new_origin: Vec2) {
        for node in self.nodes.iter_mut().filter(|n| n.height >= 0) {
            node.aabb = node.aabb.translated(-new_origin);
        }
    }

    fn allocate_node(&mut self) -> u32 {
        match self.free_list.pop() {
            Some(id) => {
                self.nodes[id as usize] = Node::free();
                id
            }
            None => {
                self.nodes.push(Node::free());
                (self.nodes.len() - 1) as u32
            }
        }
    }

    fn free_node(&mut self, id: u32) {
        self.nodes[id as usize] = Node::free();
        self.free_list.push(id);
    }

    fn insert_leaf(&mut self, leaf: u32) {
        if self.root == NULL_NODE {
            self.root = leaf;
            self.nodes[leaf as usize].parent = NULL_NODE;
            return;
        }

        // Find the best sibling.
        let leaf_aabb = self.nodes[leaf as usize].aabb;
        let mut index = self.root;
        while !self.nodes[index as usize].is_leaf() {
            let node = &self.nodes[index as usize];
            let (child1, child2) = (node.child1, node.child2);

            let area = node.aabb.perimeter();
            let combined_area = BoundingBox::create_merged(&node.aabb, &leaf_aabb).perimeter();

            // Cost of creating a new parent for this node and the new leaf.
            let cost = 2.0 * combined_area;
            // Minimum cost of pushing the leaf further down the tree.
            let inheritance_cost = 2.0 * (combined_area - area);

            let cost1 = self.descend_cost(child1, &leaf_aabb) + inheritance_cost;
            let cost2 = self.descend_cost(child2, &leaf_aabb) + inheritance_cost;

            if cost < cost1 && cost < cost2 {
                break;
            }
            index = if cost1 < cost2 { child1 } else { child2 };
        }
        let sibling = index;

        // Create a new parent.
        let old_parent = self.nodes[sibling as usize].parent;
        let new_parent = self.allocate_node();
        {
            let sibling_node = &self.nodes[sibling as usize];
            let aabb = BoundingBox::create_merged(&leaf_aabb, &sibling_node.aabb);
            let height = sibling_node.height + 1;
            let node = &mut self.nodes[new_parent as usize];
            node.parent = old_parent;
            node.aabb = aabb;
            node.height = height;
            node.child1 = sibling;
            node.child2 = leaf;
        }
        self.nodes[sibling as usize].parent = new_parent;
        self.nodes[leaf as usize].parent = new_parent;

        if old_parent != NULL_NODE {
            let parent = &mut self.nodes[old_parent as usize];
            if parent.child1 == sibling {
                parent.child1 = new_parent;
            } else {
                parent.child2 = new_parent;
            }
        } else {
            self.root = new_parent;
        }

        self.refit_upwards(self.nodes[leaf as usize].parent);
    }

    fn descend_cost(&self, child: u32, leaf_aabb: &BoundingBox) -> f32 {
        let node = &self.nodes[child as usize];
        let merged = BoundingBox::create_merged(leaf_aabb, &node.aabb).perimeter();
        if node.is_leaf() {
            merged
        } else {
            merged - node.aabb.perimeter()
        }
    }

    fn remove_leaf(&mut self, leaf: u32) {
        if leaf == self.root {
            self.root = NULL_NODE;
            return;
        }

        let parent = self.nodes[leaf as usize].parent;
        let grand_parent = self.nodes[parent as usize].parent;
        let sibling = {
            let p = &self.nodes[parent as usize];
            if p.child1 == leaf {
                p.child2
            } else {
                p.child1
            }
        };

        if grand_parent != NULL_NODE {
            // Destroy the parent and connect the sibling to the grandparent.
            {
                let g = &mut self.nodes[grand_parent as usize];
                if g.child1 == parent {
                    g.child1 = sibling;
                } else {
                    g.child2 = sibling;
                }
            }
            self.nodes[sibling as usize].parent = grand_parent;
            self.free_node(parent);
            self.refit_upwards(grand_parent);
        } else {
            self.root = sibling;
            self.nodes[sibling as usize].parent = NULL_NODE;
            self.free_node(parent);
        }
        self.nodes[leaf as usize].parent = NULL_NODE;
    }

    /// Walks from `index` to the root, balancing and refitting each ancestor.
    fn refit_upwards(&mut self, mut index: u32) {
        while index != NULL_NODE {
            index = self.balance(index);
            let (child1, child2) = {
                let n = &self.nodes[index as usize];
                (n.child1, n.child2)
            };
            let h1 = self.nodes[child1 as usize].height;
            let h2 = self.nodes[child2 as usize].height;
            let aabb = BoundingBox::create_merged(
                &self.nodes[child1 as usize].aabb,
                &self.nodes[child2 as usize].aabb,
            );
            let node = &mut self.nodes[index as usize];
            node.height = 1 + h1.max(h2);
            node.aabb = aabb;
            index = node.parent;
        }
    }

    /// Performs a left or right rotation if node A is imbalanced. Returns the new subtree root.
    fn balance(&mut self, i_a: u32) -> u32 {
        let (a_leaf, a_height) = {
            let a = &self.nodes[i_a as usize];
            (a.is_leaf(), a.height)
        };
        if a_leaf || a_height < 2 {
            return i_a;
        }

        let i_b = self.nodes[i_a as usize].child1;
        let i_c = self.nodes[i_a as usize].child2;
        let balance = self.nodes[i_c as usize].height - self.nodes[i_b as usize].height;

        if balance > 1 {
            self.rotate_up(i_a, i_c, i_b, false)
        } else if balance < -1 {
            self.rotate_up(i_a, i_b, i_c, true)
        } else {
            i_a
        }
    }

    /// Lifts `i_up` (a child of `i_a`) above `i_a`. `i_keep` is A's other child, which stays.
    /// `up_is_child1` says which slot of A the lifted child occupied.
    fn rotate_up(&mut self, i_a: u32, i_up: u32, i_keep: u32, up_is_child1: bool) -> u32 {
        let i_f = self.nodes[i_up as usize].child1;
        let i_g = self.nodes[i_up as usize].child2;

        // Swap A and the lifted node.
        let a_parent = self.nodes[i_a as usize].parent;
        self.nodes[i_up as usize].child1 = i_a;
        self.nodes[i_up as usize].parent = a_parent;
        self.nodes[i_a as usize].parent = i_up;

        // A's old parent should point at the lifted node.
        if a_parent != NULL_NODE {
            let p = &mut self.nodes[a_parent as usize];
            if p.child1 == i_a {
                p.child1 = i_up;
            } else {
                p.child2 = i_up;
            }
        } else {
            self.root = i_up;
        }

        // The taller grandchild stays with the lifted node, the shorter one moves under A.
        let (stay, moved) = if self.nodes[i_f as usize].height > self.nodes[i_g as usize].height {
            (i_f, i_g)
        } else {
            (i_g, i_f)
        };
        self.nodes[i_up as usize].child2 = stay;
        if up_is_child1 {
            self.nodes[i_a as usize].child1 = moved;
        } else {
            self.nodes[i_a as usize].child2 = moved;
        }
        self.nodes[moved as usize].parent = i_a;

        let a_aabb = BoundingBox::create_merged(&self.nodes[i_keep as usize].aabb, &self.nodes[moved as usize].aabb);
        let a_height = 1 + self.nodes[i_keep as usize].height.max(self.nodes[moved as usize].height);
        self.nodes[i_a as usize].aabb = a_aabb;
        self.nodes[i_a as usize].height = a_height;

        let up_aabb = BoundingBox::create_merged(&a_aabb, &self.nodes[stay as usize].aabb);
        let up_height = 1 + a_height.max(self.nodes[stay as usize].height);
        self.nodes[i_up as usize].aabb = up_aabb;
        self.nodes[i_up as usize].height = up_height;

        i_up
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f32, y: f32) -> BoundingBox {
        BoundingBox::new(Vec2::new(x, y), Vec2::new(x + 1.0, y + 1.0))
    }

    #[test]
    fn test_insert_and_query() {
        let mut tree = Tree::new();
        let a = tree.create_proxy(square(0.0, 0.0), 10u32);
        let _b = tree.create_proxy(square(5.0, 0.0), 11u32);
        let mut hits = Vec::new();
        tree.query(&BoundingBox::new(Vec2::new(0.5, 0.5), Vec2::new(0.6, 0.6)), |id| {
            hits.push(id);
            true
        });
        assert_eq!(hits, vec![a]);
        assert_eq!(tree.user_data(a), Some(10));
    }

    #[test]
    fn test_remove_keeps_others_queryable() {
        let mut tree = Tree::new();
        let ids: Vec<u32> = (0..8).map(|i| tree.create_proxy(square(i as f32 * 2.0, 0.0), i)).collect();
        tree.destroy_proxy(ids[3]);
        assert_eq!(tree.proxy_count(), 7);
        let mut count = 0;
        tree.query(&BoundingBox::new(Vec2::new(-1.0, -1.0), Vec2::new(100.0, 2.0)), |_| {
            count += 1;
            true
        });
        assert_eq!(count, 7);
    }

    #[test]
    fn test_small_move_stays_in_fat_bounds() {
        let mut tree = Tree::new();
        let id = tree.create_proxy(square(0.0, 0.0), 0u32);
        assert!(!tree.move_proxy(id, square(0.01, 0.0), Vec2::new(0.01, 0.0)));
        assert!(tree.move_proxy(id, square(3.0, 0.0), Vec2::new(3.0, 0.0)));
        // Fat bounds are stretched along the displacement.
        assert!(tree.fat_aabb(id).max.x >= 4.0 + 2.0 * 3.0);
    }

    #[test]
    fn test_tree_stays_balanced() {
        let mut tree = Tree::new();
        for i in 0..64 {
            tree.create_proxy(square(i as f32 * 2.0, 0.0), i);
        }
        // A degenerate chain would be 64 deep.
        assert!(tree.height() <= 12);
        let mut count = 0;
        tree.query(&BoundingBox::new(Vec2::new(-1.0, -1.0), Vec2::new(200.0, 2.0)), |_| {
            count += 1;
            true
        });
        assert_eq!(count, 64);
    }

    #[test]
    fn test_ray_cast_clips_to_nearest() {
        let mut tree = Tree::new();
        let near = tree.create_proxy(square(2.0, -0.5), 0u32);
        let _far = tree.create_proxy(square(6.0, -0.5), 1u32);
        let off = tree.create_proxy(square(4.0, 5.0), 2u32);
        let input = RayCastInput::new(Vec2::ZERO, Vec2::new(10.0, 0.0));
        let mut visited = Vec::new();
        tree.ray_cast(&input, |sub, id| {
            visited.push(id);
            // Clip at the proxy's left face.
            let fraction = tree.fat_aabb(id).min.x / 10.0;
            fraction.min(sub.max_fraction)
        });
        assert!(visited.contains(&near));
        assert!(!visited.contains(&off));
    }
}
