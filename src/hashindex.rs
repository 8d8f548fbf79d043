//! Per-table open-addressed array of slot numbers (the "id -> n" map):
//! fixed power-of-two capacity, linear probing. This module only tracks the
//! probe array itself; it asks its caller (`Engine`) for the key stored at a
//! given slot number so it stays decoupled from the payload store.

use crate::idm::MISS;

/// Result of walking a probe chain for a key's hash.
pub enum Probe {
    /// A live entry matching the key was found at this probe id.
    Found(u32),
    /// An empty (MISS) cell was found at this probe id; an insert would go
    /// here.
    Empty(u32),
    /// All `capacity` probes were exhausted without a match or a hole.
    Full,
}

pub struct HashIndex {
    idmap: Vec<u32>,
    mask: u32,
}

impl HashIndex {
    pub fn new(capacity: u32) -> Self {
        assert!(capacity.is_power_of_two(), "qmap: capacity must be a power of two");
        HashIndex { idmap: vec![MISS; capacity as usize], mask: capacity - 1 }
    }

    pub fn capacity(&self) -> u32 {
        self.mask + 1
    }

    pub fn slot_at(&self, id: u32) -> u32 {
        self.idmap[id as usize]
    }

    pub fn set(&mut self, id: u32, n: u32) {
        self.idmap[id as usize] = n;
    }

    pub fn clear_id(&mut self, id: u32) {
        self.idmap[id as usize] = MISS;
    }

    /// Walks the probe chain starting at `hash & mask`. `key_at(n)` reports
    /// whether the live key at slot `n` matches the target (`Some(bool)`),
    /// or `None` when the hash-index cell still points at `n` but that
    /// slot's key has been cleared (a deleted entry with a probe chain that
    /// still runs through it) -- the walk keeps going past those rather than
    /// stopping.
    pub fn locate<K>(&self, hash: u32, mut key_at: K) -> Probe
    where
        K: FnMut(u32) -> Option<bool>,
    {
        let capacity = self.capacity();
        let mut id = hash & self.mask;
        for _ in 0..capacity {
            let n = self.idmap[id as usize];
            if n == MISS {
                return Probe::Empty(id);
            }
            if let Some(true) = key_at(n) {
                return Probe::Found(id);
            }
            id = (id + 1) & self.mask;
        }
        Probe::Full
    }
}
