//! Polymorphic type registry. Each registered type is a record of a fixed
//! length or a measure callback, a hash callback, and a comparator. Four
//! built-in types are preinstalled in a fixed order and their ids are
//! public constants; user code can register further fixed-length (`reg`)
//! or variable-length (`mreg`) types and later override a comparator
//! (`cmp_set`).

use std::cmp::Ordering;
use std::hash::Hasher;
use std::mem;
use std::sync::Arc;

use siphasher::sip::SipHasher13;

/// Id of a registered type, returned by `reg`/`mreg` and the built-in
/// constants below.
pub type TypeId = u32;

/// Sentinel returned when the registry is full.
pub const MISS: TypeId = u32::MAX;

/// Built-in: pointer-sized, default hash and byte-wise comparator.
pub const PTR: TypeId = 0;
/// Built-in: 4-byte handle, identity hash, numeric comparator.
pub const HNDL: TypeId = 1;
/// Built-in: nul-terminated string, default hash, prefix-before-nul
/// comparator.
pub const STR: TypeId = 2;
/// Built-in: 4-byte little-endian integer, default hash, numeric
/// comparator.
pub const U32: TypeId = 3;

/// Variable-length type callback: byte length of the value starting at
/// `data`.
pub type MeasureFn = Arc<dyn Fn(&[u8]) -> u32 + Send + Sync>;
/// 32-bit hash of a key or value's bytes.
pub type HashFn = Arc<dyn Fn(&[u8]) -> u32 + Send + Sync>;
/// Orders two values of the same type.
pub type CmpFn = Arc<dyn Fn(&[u8], &[u8]) -> Ordering + Send + Sync>;

enum Length {
    Fixed(u32),
    Measured(MeasureFn),
}

struct TypeRecord {
    length: Length,
    hash: HashFn,
    cmp: CmpFn,
}

/// Default 32-bit non-cryptographic hash, seeded with a fixed constant so
/// runs are reproducible across processes (no ASLR-derived randomness, the
/// way `SipHasher13::new_with_keys` is used here rather than a
/// randomly-seeded `RandomState`).
pub fn default_hash(data: &[u8]) -> u32 {
    let mut hasher = SipHasher13::new_with_keys(0x746d_7171_2d71_6d61, 0x7020_6861_7368_6b79);
    hasher.write(data);
    let h = hasher.finish();
    (h ^ (h >> 32)) as u32
}

fn default_cmp(a: &[u8], b: &[u8]) -> Ordering {
    a.cmp(b)
}

fn handle_hash(data: &[u8]) -> u32 {
    u32::from_le_bytes([data[0], data[1], data[2], data[3]])
}

fn int_cmp(a: &[u8], b: &[u8]) -> Ordering {
    let av = u32::from_le_bytes([a[0], a[1], a[2], a[3]]);
    let bv = u32::from_le_bytes([b[0], b[1], b[2], b[3]]);
    av.cmp(&bv)
}

fn str_measure(data: &[u8]) -> u32 {
    match data.iter().position(|&b| b == 0) {
        Some(nul) => (nul + 1) as u32,
        None => data.len() as u32,
    }
}

fn str_cmp(a: &[u8], b: &[u8]) -> Ordering {
    let a_str = a.split(|&b| b == 0).next().unwrap_or(a);
    let b_str = b.split(|&b| b == 0).next().unwrap_or(b);
    a_str.cmp(b_str)
}

/// Fixed-capacity table of registered types, preloaded with the four
/// built-ins in a stable order.
pub struct TypeRegistry {
    types: Vec<TypeRecord>,
    capacity: usize,
}

impl TypeRegistry {
    /// Builds a registry with room for `capacity` types (built-ins count
    /// against it) and preinstalls PTR, HNDL, STR, U32 in that order.
    pub fn new(capacity: usize) -> Self {
        let mut reg = TypeRegistry { types: Vec::with_capacity(capacity), capacity };
        let ptr_id = reg.install(Length::Fixed(mem::size_of::<usize>() as u32), Arc::new(default_hash), Arc::new(default_cmp));
        debug_assert_eq!(ptr_id, PTR);
        let hndl_id = reg.install(Length::Fixed(4), Arc::new(handle_hash), Arc::new(int_cmp));
        debug_assert_eq!(hndl_id, HNDL);
        let str_id = reg.install(Length::Measured(Arc::new(str_measure)), Arc::new(default_hash), Arc::new(str_cmp));
        debug_assert_eq!(str_id, STR);
        let u32_id = reg.install(Length::Fixed(4), Arc::new(default_hash), Arc::new(int_cmp));
        debug_assert_eq!(u32_id, U32);
        reg
    }

    fn install(&mut self, length: Length, hash: HashFn, cmp: CmpFn) -> TypeId {
        let id = self.types.len() as u32;
        self.types.push(TypeRecord { length, hash, cmp });
        id
    }

    /// Registers a fixed-length type, installing the default hash and
    /// comparator. Returns `MISS` and logs a one-line warning when the
    /// registry is full.
    pub fn reg(&mut self, len: u32) -> TypeId {
        if self.types.len() >= self.capacity {
            log::warn!("qmap: type registry full, reg({}) rejected", len);
            return MISS;
        }
        self.install(Length::Fixed(len), Arc::new(default_hash), Arc::new(default_cmp))
    }

    /// Registers a variable-length type via its measure callback.
    pub fn mreg(&mut self, measure: MeasureFn) -> TypeId {
        if self.types.len() >= self.capacity {
            log::warn!("qmap: type registry full, mreg() rejected");
            return MISS;
        }
        self.install(Length::Measured(measure), Arc::new(default_hash), Arc::new(default_cmp))
    }

    /// Overwrites the comparator for an already-registered type, including
    /// the built-ins. Out-of-range type ids are a no-op.
    pub fn cmp_set(&mut self, type_id: TypeId, cmp: CmpFn) {
        if let Some(rec) = self.types.get_mut(type_id as usize) {
            rec.cmp = cmp;
        }
    }

    /// Byte length of `data` under `type_id`: the registered fixed length,
    /// or the measure callback's result for a variable-length type. For a
    /// fixed-length type `data` is accepted but never read.
    pub fn len_of(&self, type_id: TypeId, data: &[u8]) -> u32 {
        match &self.types[type_id as usize].length {
            Length::Fixed(n) => *n,
            Length::Measured(m) => m(data),
        }
    }

    /// Whether `type_id` was registered with a measure callback rather
    /// than a fixed length.
    pub fn is_variable(&self, type_id: TypeId) -> bool {
        matches!(self.types[type_id as usize].length, Length::Measured(_))
    }

    /// Hashes `data` under `type_id`'s hash callback.
    pub fn hash_of(&self, type_id: TypeId, data: &[u8]) -> u32 {
        (self.types[type_id as usize].hash)(data)
    }

    /// Orders `a` and `b` under `type_id`'s comparator.
    pub fn compare(&self, type_id: TypeId, a: &[u8], b: &[u8]) -> Ordering {
        (self.types[type_id as usize].cmp)(a, b)
    }
}
