//! Dense small-integer id allocator with a free list and a monotonic
//! watermark, mirroring the reference implementation's `idm_t`: `new_id`
//! prefers a freed id over growing the watermark; `del` shrinks the
//! watermark when the freed id was the topmost one, otherwise it is pushed
//! to the free list.

/// Sentinel returned by fallible lookups: "no id".
pub const MISS: u32 = u32::MAX;

#[derive(Debug, Default)]
pub struct IdManager {
    free: Vec<u32>,
    last: u32,
}

impl IdManager {
    pub fn new() -> Self {
        IdManager { free: Vec::new(), last: 0 }
    }

    /// Smallest unused id, preferring the free list over the watermark.
    pub fn new_id(&mut self) -> u32 {
        match self.free.pop() {
            Some(id) => id,
            None => {
                let id = self.last;
                self.last += 1;
                id
            }
        }
    }

    /// Returns `id` to the pool. Returns `true` if the watermark moved
    /// (id was the topmost allocated one), `false` if it was pushed onto
    /// the free list instead.
    pub fn del(&mut self, id: u32) -> bool {
        if self.last <= id {
            true
        } else if id + 1 == self.last {
            self.last -= 1;
            true
        } else {
            self.free.push(id);
            false
        }
    }

    /// Reserves `n` as allocated. If `n` is already below the watermark
    /// this just makes sure it is not sitting on the free list (used when a
    /// caller wants to force a specific slot number, e.g. associations
    /// aligning a secondary's slot with its primary's). If `n` is beyond the
    /// watermark, every id in `[watermark, n)` is pushed to the free list
    /// and the watermark becomes `n + 1`.
    pub fn push_to(&mut self, n: u32) -> u32 {
        if self.last > n {
            if let Some(pos) = self.free.iter().position(|&x| x == n) {
                self.free.remove(pos);
            }
            return MISS;
        }
        for i in self.last..n {
            self.free.push(i);
        }
        self.last = n + 1;
        n
    }

    /// Releases the free list; the watermark is left untouched.
    pub fn drop_free(&mut self) {
        self.free.clear();
    }

    pub fn watermark(&self) -> u32 {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_sequentially() {
        let mut idm = IdManager::new();
        assert_eq!(idm.new_id(), 0);
        assert_eq!(idm.new_id(), 1);
        assert_eq!(idm.new_id(), 2);
    }

    #[test]
    fn reuses_freed_ids() {
        let mut idm = IdManager::new();
        let a = idm.new_id();
        let _b = idm.new_id();
        idm.del(a);
        assert_eq!(idm.new_id(), a);
    }

    #[test]
    fn deleting_topmost_shrinks_watermark() {
        let mut idm = IdManager::new();
        idm.new_id();
        idm.new_id();
        let c = idm.new_id();
        assert!(idm.del(c));
        assert_eq!(idm.watermark(), c);
    }

    #[test]
    fn deleting_non_topmost_keeps_watermark() {
        let mut idm = IdManager::new();
        let a = idm.new_id();
        idm.new_id();
        idm.new_id();
        assert!(!idm.del(a));
        assert_eq!(idm.watermark(), 3);
    }

    #[test]
    fn push_to_reserves_a_range() {
        let mut idm = IdManager::new();
        assert_eq!(idm.push_to(4), 4);
        assert_eq!(idm.watermark(), 5);
        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(idm.new_id());
        }
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }

    #[test]
    fn push_to_below_watermark_unreserves_a_free_id() {
        let mut idm = IdManager::new();
        let a = idm.new_id();
        idm.new_id();
        idm.del(a);
        assert_eq!(idm.push_to(a), MISS);
        // a must no longer be handed out by new_id, since push_to claimed it.
        let seen: Vec<u32> = (0..2).map(|_| idm.new_id()).collect();
        assert!(!seen.contains(&a));
    }
}
