use std::fmt;
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

use crate::utilities::memory::IdPool;

/// Typed index into an [`Arena`]: a slot index plus the generation of the slot when the handle
/// was minted.
pub trait ArenaHandle: Copy + Eq + fmt::Debug {
    fn from_parts(index: u32, generation: u32) -> Self;
    fn index(self) -> u32;
    fn generation(self) -> u32;
}

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot storage addressed by stable handles. Removed slots are recycled through an [`IdPool`]
/// and their generation is bumped, so handles to removed values never resolve to a later
/// occupant. Iteration always walks slots in ascending index order so that traversal is
/// deterministic.
pub struct Arena<H: ArenaHandle, T> {
    slots: Vec<Slot<T>>,
    ids: IdPool,
    len: usize,
    _handle: PhantomData<H>,
}

impl<H: ArenaHandle, T> Default for Arena<H, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: ArenaHandle, T: fmt::Debug> fmt::Debug for Arena<H, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<H: ArenaHandle, T> Arena<H, T> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            ids: IdPool::new(capacity),
            len: 0,
            _handle: PhantomData,
        }
    }

    /// Number of occupied slots.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Stores a value and returns its handle.
    pub fn insert(&mut self, value: T) -> H {
        self.insert_with(|_| value)
    }

    /// Stores the value produced by `create`, which receives the handle the value will live under.
    pub fn insert_with(&mut self, create: impl FnOnce(H) -> T) -> H {
        let index = self.ids.take();
        let slot = index as usize;
        if slot == self.slots.len() {
            self.slots.push(Slot {
                generation: 0,
                value: None,
            });
        }
        let entry = &mut self.slots[slot];
        debug_assert!(entry.value.is_none());
        let handle = H::from_parts(index, entry.generation);
        entry.value = Some(create(handle));
        self.len += 1;
        handle
    }

    /// Removes and returns the value stored under the handle, if any.
    pub fn remove(&mut self, handle: H) -> Option<T> {
        let entry = self.slots.get_mut(handle.index() as usize)?;
        if entry.generation != handle.generation() {
            return None;
        }
        let value = entry.value.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        self.ids.return_id(handle.index());
        self.len -= 1;
        Some(value)
    }

    #[inline(always)]
    pub fn contains(&self, handle: H) -> bool {
        self.get(handle).is_some()
    }

    #[inline(always)]
    pub fn get(&self, handle: H) -> Option<&T> {
        let entry = self.slots.get(handle.index() as usize)?;
        if entry.generation != handle.generation() {
            return None;
        }
        entry.value.as_ref()
    }

    #[inline(always)]
    pub fn get_mut(&mut self, handle: H) -> Option<&mut T> {
        let entry = self.slots.get_mut(handle.index() as usize)?;
        if entry.generation != handle.generation() {
            return None;
        }
        entry.value.as_mut()
    }

    /// Borrows two distinct slots mutably at once.
    pub fn get_pair_mut(&mut self, a: H, b: H) -> Option<(&mut T, &mut T)> {
        let (ia, ib) = (a.index() as usize, b.index() as usize);
        if ia == ib || !self.contains(a) || !self.contains(b) {
            return None;
        }
        if ia < ib {
            let (low, high) = self.slots.split_at_mut(ib);
            Some((low[ia].value.as_mut()?, high[0].value.as_mut()?))
        } else {
            let (low, high) = self.slots.split_at_mut(ia);
            Some((high[0].value.as_mut()?, low[ib].value.as_mut()?))
        }
    }

    /// Iterates occupied slots in ascending handle order.
    pub fn iter(&self) -> impl Iterator<Item = (H, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, slot)| {
            slot.value
                .as_ref()
                .map(|v| (H::from_parts(i as u32, slot.generation), v))
        })
    }

    /// Iterates occupied slots mutably in ascending handle order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (H, &mut T)> {
        self.slots.iter_mut().enumerate().filter_map(|(i, slot)| {
            let generation = slot.generation;
            slot.value
                .as_mut()
                .map(|v| (H::from_parts(i as u32, generation), v))
        })
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().filter_map(|slot| slot.value.as_ref())
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots.iter_mut().filter_map(|slot| slot.value.as_mut())
    }

    /// Snapshot of the live handles, for loops that mutate the arena while walking it.
    pub fn handles(&self) -> Vec<H> {
        self.iter().map(|(h, _)| h).collect()
    }

    /// Drops every value. Generations survive so that handles minted before the clear stay
    /// invalid.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            if slot.value.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
        }
        self.ids.clear();
        let slot_count = self.slots.len() as u32;
        for _ in 0..slot_count {
            self.ids.take();
        }
        for index in (0..slot_count).rev() {
            self.ids.return_id(index);
        }
        self.len = 0;
    }
}

impl<H: ArenaHandle, T> Index<H> for Arena<H, T> {
    type Output = T;

    #[inline(always)]
    fn index(&self, handle: H) -> &T {
        match self.get(handle) {
            Some(value) => value,
            None => panic!("stale handle {:?}", handle),
        }
    }
}

impl<H: ArenaHandle, T> IndexMut<H> for Arena<H, T> {
    #[inline(always)]
    fn index_mut(&mut self, handle: H) -> &mut T {
        match self.get_mut(handle) {
            Some(value) => value,
            None => panic!("stale handle {:?}", handle),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct Key(u32, u32);

    impl ArenaHandle for Key {
        fn from_parts(index: u32, generation: u32) -> Self {
            Key(index, generation)
        }
        fn index(self) -> u32 {
            self.0
        }
        fn generation(self) -> u32 {
            self.1
        }
    }

    #[test]
    fn test_insert_remove_reuses_slots() {
        let mut arena: Arena<Key, &str> = Arena::new();
        let a = arena.insert("a");
        let b = arena.insert("b");
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.remove(a), Some("a"));
        assert_eq!(arena.remove(a), None);
        assert!(!arena.contains(a));
        let c = arena.insert("c");
        assert_eq!(c.index(), a.index());
        assert_ne!(c, a);
        assert_eq!(arena[b], "b");
        assert_eq!(arena[c], "c");
    }

    #[test]
    fn test_stale_handle_does_not_reach_new_occupant() {
        let mut arena: Arena<Key, &str> = Arena::new();
        let old = arena.insert("old");
        arena.remove(old);
        let new = arena.insert("new");

        assert!(arena.get(old).is_none());
        assert!(arena.get_mut(old).is_none());
        assert_eq!(arena.remove(old), None);
        assert_eq!(arena[new], "new");
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_clear_invalidates_handles() {
        let mut arena: Arena<Key, u32> = Arena::new();
        let a = arena.insert(1);
        let b = arena.insert(2);
        arena.clear();
        assert!(arena.is_empty());
        let c = arena.insert(3);
        let d = arena.insert(4);
        assert!(!arena.contains(a));
        assert!(!arena.contains(b));
        assert_eq!(arena[c], 3);
        assert_eq!(arena[d], 4);
        assert_eq!((c.index(), d.index()), (0, 1));
    }

    #[test]
    fn test_iteration_is_ordered_by_handle() {
        let mut arena: Arena<Key, u32> = Arena::new();
        let keys: Vec<Key> = (0..5).map(|i| arena.insert(i)).collect();
        arena.remove(keys[1]);
        arena.remove(keys[3]);
        let seen: Vec<u32> = arena.iter().map(|(k, _)| k.0).collect();
        assert_eq!(seen, vec![0, 2, 4]);
    }

    #[test]
    fn test_get_pair_mut() {
        let mut arena: Arena<Key, u32> = Arena::new();
        let a = arena.insert(1);
        let b = arena.insert(2);
        {
            let (x, y) = arena.get_pair_mut(b, a).unwrap();
            std::mem::swap(x, y);
        }
        assert_eq!(arena[a], 2);
        assert_eq!(arena[b], 1);
        assert!(arena.get_pair_mut(a, a).is_none());
    }
}
