/// Manages a pool of identifier values. Grabbing an id from the pool picks a number that has been
/// picked and returned before, or if none of those are available, the minimum value greater
/// than any existing id.
#[derive(Debug, Clone, Default)]
pub struct IdPool {
    next_index: u32,
    available_ids: Vec<u32>,
}

impl IdPool {
    /// Creates a new IdPool with the given initial capacity for returned ids.
    pub fn new(initial_capacity: usize) -> Self {
        IdPool {
            next_index: 0,
            available_ids: Vec::with_capacity(initial_capacity),
        }
    }

    /// Gets the highest value which any index claimed thus far could possibly have.
    /// `None` if nothing has ever been claimed.
    #[inline(always)]
    pub fn highest_possibly_claimed_id(&self) -> Option<u32> {
        self.next_index.checked_sub(1)
    }

    /// Gets the number of previously returned ids waiting in the pool.
    #[inline(always)]
    pub fn available_id_count(&self) -> usize {
        self.available_ids.len()
    }

    /// Takes an id from the pool.
    #[inline(always)]
    pub fn take(&mut self) -> u32 {
        match self.available_ids.pop() {
            Some(id) => id,
            None => {
                let id = self.next_index;
                self.next_index += 1;
                id
            }
        }
    }

    /// Returns an id to the pool.
    #[inline(always)]
    pub fn return_id(&mut self, id: u32) {
        debug_assert!(id < self.next_index, "Returned id was never taken.");
        debug_assert!(
            !self.available_ids.contains(&id),
            "Id returned to the pool twice."
        );
        self.available_ids.push(id);
    }

    /// Resets the IdPool.
    pub fn clear(&mut self) {
        self.next_index = 0;
        self.available_ids.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_reuses_returned_ids() {
        let mut pool = IdPool::new(4);
        assert_eq!(pool.highest_possibly_claimed_id(), None);
        let a = pool.take();
        let b = pool.take();
        assert_eq!((a, b), (0, 1));
        pool.return_id(a);
        assert_eq!(pool.available_id_count(), 1);
        assert_eq!(pool.take(), 0);
        assert_eq!(pool.take(), 2);
        assert_eq!(pool.highest_possibly_claimed_id(), Some(2));
    }
}
