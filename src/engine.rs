//! The engine: one value holding every table, cursor, and the type
//! registry, with the public operations from `spec.md` §6 as inherent
//! methods. Tables and cursors reference each other only through integer
//! handles (never Rust references), the same way the original global
//! arrays of small integers are re-architected into one explicit value per
//! the design note in `spec.md` §9.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cursor::CursorState;
use crate::file::FileRecord;
use crate::hashindex::{HashIndex, Probe};
use crate::idm::{IdManager, MISS};
use crate::sorted::SortedIndex;
use crate::types::{TypeId, TypeRegistry};

/// `open()` flag: a `None` key in `put` mints a fresh slot number and uses
/// it as the key.
pub const AUTO_INDEX: u32 = 1;
/// `open()` flag: also open a second, swapped, primary-get table at
/// `handle + 1` and associate it with the default callback.
pub const MIRROR: u32 = 1 << 1;
/// `open()`/table flag: `get`/`next` on this table return the primary's key
/// rather than its value.
pub const PRIMARY_GET: u32 = 1 << 2;
/// `open()` flag: maintain the sorted index for range seeks and ordered
/// iteration.
pub const SORTED: u32 = 1 << 3;

/// `iter()` flag requesting range-iteration semantics (`spec.md` §4.8).
pub const RANGE: u32 = 1;

/// Derives a secondary's key from the association tree root's `(key,
/// value)` pair.
pub type AssocFn = Arc<dyn Fn(&[u8], &[u8]) -> Vec<u8> + Send + Sync>;

struct Slot {
    key: Vec<u8>,
    /// Unused and always empty on a secondary table; secondaries never own
    /// payload bytes (`spec.md` §3 "Ownership").
    value: Vec<u8>,
}

pub(crate) struct TableState {
    pub key_type: TypeId,
    pub value_type: TypeId,
    pub flags: u32,
    pub phd: u32,
    pub linked: Vec<u32>,
    assoc_cb: Option<AssocFn>,
    pub idm: IdManager,
    pub index: HashIndex,
    slots: Vec<Option<Slot>>,
    pub sorted: SortedIndex,
    pub count: u32,
    pub dbid: u32,
    pub filename: Option<PathBuf>,
    pub database: Option<String>,
    pub persistent: bool,
}

/// One engine value holding the type registry, every open table, every open
/// cursor, and the file/database registries. Callers own an `Engine`
/// explicitly; there is no process-wide default instance (`spec.md` §9).
pub struct Engine {
    pub(crate) types: TypeRegistry,
    pub(crate) tables: Vec<Option<TableState>>,
    table_idm: IdManager,
    cursors: Vec<Option<CursorState>>,
    cursor_idm: IdManager,
    pub(crate) files: HashMap<PathBuf, FileRecord>,
    pub(crate) table_lookup: HashMap<(PathBuf, u32), u32>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Builds an engine with a default type-registry capacity.
    pub fn new() -> Self {
        Self::with_type_capacity(64)
    }

    /// Like `new`, but with an explicit type-registry capacity (the four
    /// built-ins count against it).
    pub fn with_type_capacity(type_capacity: usize) -> Self {
        Engine {
            types: TypeRegistry::new(type_capacity),
            tables: Vec::new(),
            table_idm: IdManager::new(),
            cursors: Vec::new(),
            cursor_idm: IdManager::new(),
            files: HashMap::new(),
            table_lookup: HashMap::new(),
        }
    }

    // ---- type registry -------------------------------------------------

    /// Registers a fixed-length type. Returns `types::MISS` if the
    /// registry is full.
    pub fn reg(&mut self, len: u32) -> TypeId {
        self.types.reg(len)
    }

    /// Registers a variable-length type via its measure callback. Returns
    /// `types::MISS` if the registry is full.
    pub fn mreg(&mut self, measure: crate::types::MeasureFn) -> TypeId {
        self.types.mreg(measure)
    }

    /// Overwrites the comparator of an already-registered type, including
    /// a built-in.
    pub fn cmp_set(&mut self, type_id: TypeId, cmp: crate::types::CmpFn) {
        self.types.cmp_set(type_id, cmp)
    }

    /// Byte length of `data` under `type_id`.
    pub fn len_of(&self, type_id: TypeId, data: &[u8]) -> u32 {
        self.types.len_of(type_id, data)
    }

    // ---- table handle bookkeeping --------------------------------------

    pub(crate) fn table(&self, hd: u32) -> &TableState {
        self.tables[hd as usize].as_ref().expect("qmap: bad table handle")
    }

    pub(crate) fn table_mut(&mut self, hd: u32) -> &mut TableState {
        self.tables[hd as usize].as_mut().expect("qmap: bad table handle")
    }

    fn ensure_table_len(&mut self, hd: u32) {
        if self.tables.len() <= hd as usize {
            self.tables.resize_with(hd as usize + 1, || None);
        }
    }

    fn ensure_cursor_len(&mut self, cur: u32) {
        if self.cursors.len() <= cur as usize {
            self.cursors.resize_with(cur as usize + 1, || None);
        }
    }

    // ---- open / close ----------------------------------------------------

    /// Opens a table. `mask` must be one less than a power of two; capacity
    /// is `mask + 1`. See the `*_FLAG` constants for `open_flags`.
    pub fn open(
        &mut self, filename: Option<&std::path::Path>, database: Option<&str>, key_type: TypeId,
        value_type: TypeId, mask: u32, open_flags: u32,
    ) -> u32 {
        let capacity = mask.checked_add(1).expect("qmap: mask overflow");
        assert!(capacity.is_power_of_two(), "qmap: mask must be one less than a power of two");
        let hd = self.open_low_level(key_type, value_type, capacity, open_flags);
        if open_flags & MIRROR != 0 {
            let mirror_hd = self.open_low_level(value_type, key_type, capacity, PRIMARY_GET);
            debug_assert_eq!(mirror_hd, hd + 1, "qmap: mirror handle must immediately follow its primary");
            self.assoc(mirror_hd, hd, None);
        }
        if let Some(path) = filename {
            let db = database.unwrap_or("");
            self.bind_file(hd, path, db);
        }
        hd
    }

    fn open_low_level(&mut self, key_type: TypeId, value_type: TypeId, capacity: u32, open_flags: u32) -> u32 {
        let hd = self.table_idm.new_id();
        self.ensure_table_len(hd);
        let mut slots = Vec::with_capacity(capacity as usize);
        slots.resize_with(capacity as usize, || None);
        self.tables[hd as usize] = Some(TableState {
            key_type,
            value_type,
            flags: open_flags,
            phd: hd,
            linked: Vec::new(),
            assoc_cb: None,
            idm: IdManager::new(),
            index: HashIndex::new(capacity),
            slots,
            sorted: SortedIndex::new(),
            count: 0,
            dbid: MISS,
            filename: None,
            database: None,
            persistent: false,
        });
        hd
    }

    /// Deletes every entry, closes every associated secondary, then
    /// releases the table's own handle and arrays.
    pub fn close(&mut self, hd: u32) {
        self.drop_table(hd);
        let linked = self.table(hd).linked.clone();
        for ahd in linked {
            self.close(ahd);
        }
        self.free_table(hd);
    }

    fn free_table(&mut self, hd: u32) {
        let phd = self.table(hd).phd;
        let filename = self.table(hd).filename.clone();
        let dbid = self.table(hd).dbid;
        if phd != hd {
            if let Some(parent) = self.tables[phd as usize].as_mut() {
                parent.linked.retain(|&x| x != hd);
            }
        }
        if let Some(path) = filename {
            if let Some(rec) = self.files.get_mut(&path) {
                rec.tables.retain(|&x| x != hd);
            }
            self.table_lookup.remove(&(path, dbid));
        }
        self.tables[hd as usize] = None;
        self.table_idm.del(hd);
    }

    // ---- association ------------------------------------------------------

    /// Adds `sec` to `pri`'s association list and records `cb`. A `None`
    /// callback defaults to "secondary key = primary value".
    pub fn assoc(&mut self, sec: u32, pri: u32, cb: Option<AssocFn>) {
        let cb = cb.unwrap_or_else(|| Arc::new(|_key: &[u8], value: &[u8]| value.to_vec()) as AssocFn);
        {
            let table = self.table_mut(sec);
            table.phd = pri;
            table.assoc_cb = Some(cb);
        }
        self.table_mut(pri).linked.push(sec);
    }

    fn root_of(&self, hd: u32) -> u32 {
        let mut cur = hd;
        loop {
            let phd = self.table(cur).phd;
            if phd == cur {
                return cur;
            }
            cur = phd;
        }
    }

    // ---- hashing / comparison helpers --------------------------------------

    fn locate(&self, hd: u32, hash: u32, key: &[u8]) -> Probe {
        let table = self.table(hd);
        let key_type = table.key_type;
        table.index.locate(hash, |n| match &table.slots[n as usize] {
            None => None,
            Some(slot) => Some(self.types.compare(key_type, &slot.key, key) == Ordering::Equal),
        })
    }

    fn key_at(&self, hd: u32, n: u32) -> &[u8] {
        &self.table(hd).slots[n as usize].as_ref().expect("qmap: slot not live").key
    }

    /// Resolves a slot's value according to the table's perspective: a
    /// primary-get secondary returns the primary's key; otherwise the
    /// primary's value is returned (which for the table itself, when it is
    /// its own primary, is simply its own value).
    fn value_at(&self, hd: u32, n: u32) -> &[u8] {
        let table = self.table(hd);
        if table.flags & PRIMARY_GET != 0 {
            self.key_at(table.phd, n)
        } else {
            let primary = self.table(table.phd);
            &primary.slots[n as usize].as_ref().expect("qmap: slot not live").value
        }
    }

    fn ensure_sorted(&mut self, hd: u32) {
        let idx = hd as usize;
        if !self.tables[idx].as_ref().expect("qmap: bad table handle").sorted.is_dirty() {
            return;
        }
        let types = &self.types;
        let table = self.tables[idx].as_mut().expect("qmap: bad table handle");
        let key_type = table.key_type;
        let watermark = table.idm.watermark();
        let slots = &table.slots;
        table.sorted.rebuild(
            watermark,
            |n| slots[n as usize].is_some(),
            |a, b| {
                let ka = &slots[a as usize].as_ref().unwrap().key;
                let kb = &slots[b as usize].as_ref().unwrap().key;
                types.compare(key_type, ka, kb)
            },
        );
    }

    // ---- get ---------------------------------------------------------------

    /// Zero-copy lookup: the returned slice borrows the engine and is
    /// invalidated by the mutations listed in `spec.md` §5 (the Rust borrow
    /// checker enforces this at compile time rather than at runtime).
    pub fn get_ref(&self, hd: u32, key: &[u8]) -> Option<&[u8]> {
        let n = self.find_slot(hd, key)?;
        Some(self.value_at(hd, n))
    }

    /// Copy-returning convenience over `get_ref`.
    pub fn get(&self, hd: u32, key: &[u8]) -> Option<Vec<u8>> {
        self.get_ref(hd, key).map(|v| v.to_vec())
    }

    fn find_slot(&self, hd: u32, key: &[u8]) -> Option<u32> {
        let table = self.table(hd);
        let hash = self.types.hash_of(table.key_type, key);
        match self.locate(hd, hash, key) {
            Probe::Found(id) => Some(table.index.slot_at(id)),
            _ => None,
        }
    }

    // ---- put -----------------------------------------------------------------

    /// Puts `(key, value)` into a primary table. With `AUTO_INDEX` set and
    /// `key = None`, a fresh slot number is minted and returned as the id;
    /// otherwise returns the probe id of the stored entry. Every linked
    /// secondary (transitively) is kept in lockstep by slot number.
    pub fn put(&mut self, hd: u32, key: Option<&[u8]>, value: &[u8]) -> u32 {
        let (id, n) = self.put_low(hd, key, value, None);
        let root_key = self.key_at(hd, n).to_vec();
        let root_value = self.value_at_primary(hd, n).to_vec();
        self.cascade_put(hd, n, &root_key, &root_value);
        id
    }

    fn value_at_primary(&self, hd: u32, n: u32) -> &[u8] {
        &self.table(hd).slots[n as usize].as_ref().expect("qmap: slot not live").value
    }

    fn cascade_put(&mut self, hd: u32, n: u32, root_key: &[u8], root_value: &[u8]) {
        let linked = self.table(hd).linked.clone();
        for ahd in linked {
            let cb = self.table(ahd).assoc_cb.clone().expect("qmap: secondary missing association callback");
            let skey = cb(root_key, root_value);
            self.put_low(ahd, Some(&skey), &[], Some(n));
            self.cascade_put(ahd, n, root_key, root_value);
        }
    }

    /// Returns `(id, n)`. `forced_n`, when set, is used internally by
    /// `cascade_put` to align a secondary's slot number with its primary's.
    fn put_low(&mut self, hd: u32, key: Option<&[u8]>, value: &[u8], forced_n: Option<u32>) -> (u32, u32) {
        let key_type = self.table(hd).key_type;

        let (id, resolved_n, key_bytes): (u32, Option<u32>, Vec<u8>) = match key {
            Some(k) => {
                let hash = self.types.hash_of(key_type, k);
                match self.locate(hd, hash, k) {
                    Probe::Found(id) => {
                        let n = self.table(hd).index.slot_at(id);
                        (id, Some(n), k.to_vec())
                    }
                    Probe::Empty(id) => (id, None, k.to_vec()),
                    Probe::Full => panic!("qmap: put on a full table"),
                }
            }
            None => {
                assert!(
                    self.table(hd).flags & AUTO_INDEX != 0,
                    "qmap: a None key requires a table opened with AUTO_INDEX"
                );
                let n = self.table_mut(hd).idm.new_id();
                (n, Some(n), n.to_le_bytes().to_vec())
            }
        };

        let n = match forced_n {
            Some(n) => {
                self.table_mut(hd).idm.push_to(n);
                n
            }
            None => resolved_n.unwrap_or_else(|| self.table_mut(hd).idm.new_id()),
        };

        // A forced slot number can disagree with where the key was actually
        // found (two primaries sharing one secondary key under the default
        // association callback). The old slot must be retired here, or it
        // stays live but hash-unreachable forever.
        if let Some(old_n) = resolved_n {
            if old_n != n {
                let table = self.table_mut(hd);
                if table.slots[old_n as usize].take().is_some() {
                    table.count -= 1;
                }
                table.idm.del(old_n);
                table.sorted.mark_dirty();
            }
        }

        let capacity = self.table(hd).index.capacity();
        assert!(n < capacity, "qmap: capacity reached");

        let table = self.table_mut(hd);
        let is_primary = table.phd == hd;
        let was_live = table.slots[n as usize].is_some();
        let slot = table.slots[n as usize].get_or_insert_with(|| Slot { key: Vec::new(), value: Vec::new() });
        reuse_write(&mut slot.key, &key_bytes);
        if is_primary {
            reuse_write(&mut slot.value, value);
        }
        table.index.set(id, n);
        table.sorted.mark_dirty();
        if !was_live {
            table.count += 1;
        }

        (id, n)
    }

    // ---- delete / drop --------------------------------------------------------

    /// Deletes the slot matching `key`, cascading top-down through the
    /// entire association tree rooted at this table's primary.
    pub fn del(&mut self, hd: u32, key: &[u8]) {
        if let Some(n) = self.find_slot(hd, key) {
            let root = self.root_of(hd);
            self.del_topdown(root, n);
        }
    }

    /// Deletes every live slot on `hd`, cascading each one top-down.
    pub fn drop_table(&mut self, hd: u32) {
        let root = self.root_of(hd);
        let watermark = self.table(hd).idm.watermark();
        let live_ns: Vec<u32> =
            (0..watermark).filter(|&n| self.table(hd).slots[n as usize].is_some()).collect();
        for n in live_ns {
            self.del_topdown(root, n);
        }
    }

    fn del_topdown(&mut self, hd: u32, n: u32) {
        let linked = self.table(hd).linked.clone();
        for ahd in linked {
            self.del_topdown(ahd, n);
        }
        let key_bytes = match self.table(hd).slots[n as usize].as_ref() {
            Some(slot) => slot.key.clone(),
            None => return, // already cleared by an earlier pass
        };
        let key_type = self.table(hd).key_type;
        let hash = self.types.hash_of(key_type, &key_bytes);
        let id = match self.locate(hd, hash, &key_bytes) {
            Probe::Found(id) => id,
            _ => {
                log::error!("qmap: delete could not relocate a live slot's id, index left inconsistent");
                return;
            }
        };
        let table = self.table_mut(hd);
        table.slots[n as usize] = None;
        table.index.clear_id(id);
        table.sorted.mark_dirty();
        table.idm.del(n);
        table.count -= 1;
    }

    // ---- cursor machine --------------------------------------------------------

    /// Opens a cursor. `key = None` always yields a full-table walk.
    /// `range` requests range semantics (§4.8): on a table opened with
    /// `SORTED`, the walk starts at the binary-search position in key
    /// order; otherwise it is a linear "≥ key" filter in slot-number order.
    pub fn iter(&mut self, hd: u32, key: Option<&[u8]>, iter_flags: u32) -> u32 {
        let range = iter_flags & RANGE != 0;
        let state = self.build_cursor(hd, key, range);
        let cur = self.cursor_idm.new_id();
        self.ensure_cursor_len(cur);
        self.cursors[cur as usize] = Some(state);
        cur
    }

    fn build_cursor(&mut self, hd: u32, key: Option<&[u8]>, range: bool) -> CursorState {
        match key {
            None => CursorState { table: hd, pos: 0, sorted_pos: None, anchor: None, range, point: false, done: false },
            Some(k) if !range => {
                let pos = self.find_slot(hd, k).unwrap_or(MISS);
                CursorState {
                    table: hd,
                    pos,
                    sorted_pos: None,
                    anchor: Some(k.to_vec()),
                    range: false,
                    point: true,
                    done: pos == MISS,
                }
            }
            Some(k) => {
                let sorted = self.table(hd).flags & SORTED != 0;
                if sorted {
                    self.ensure_sorted(hd);
                    let table = self.table(hd);
                    let key_type = table.key_type;
                    let (pos, _exact) =
                        table.sorted.bsearch(|n| self.types.compare(key_type, self.key_at(hd, n), k));
                    CursorState {
                        table: hd,
                        pos: 0,
                        sorted_pos: Some(pos),
                        anchor: Some(k.to_vec()),
                        range: true,
                        point: false,
                        done: false,
                    }
                } else {
                    CursorState {
                        table: hd,
                        pos: 0,
                        sorted_pos: None,
                        anchor: Some(k.to_vec()),
                        range: true,
                        point: false,
                        done: false,
                    }
                }
            }
        }
    }

    /// Advances the cursor and returns the next `(key, value)` pair, or
    /// `None` at the end. The cursor is auto-released on natural
    /// exhaustion, matching `fin`'s idempotent-after-end contract.
    pub fn next(&mut self, cur: u32) -> Option<(Vec<u8>, Vec<u8>)> {
        let state = self.cursors.get(cur as usize)?.as_ref()?;
        if state.done {
            return None;
        }
        let hd = state.table;
        let result = if state.point {
            self.next_point(cur, hd)
        } else if let Some(sorted_pos) = state.sorted_pos {
            self.next_sorted(cur, hd, sorted_pos)
        } else if state.range {
            self.next_unsorted_range(cur, hd)
        } else {
            self.next_full_scan(cur, hd)
        };
        if result.is_none() {
            self.fin(cur);
        }
        result
    }

    fn next_point(&mut self, cur: u32, hd: u32) -> Option<(Vec<u8>, Vec<u8>)> {
        let pos = self.cursors[cur as usize].as_ref().unwrap().pos;
        self.cursors[cur as usize].as_mut().unwrap().done = true;
        if pos == MISS {
            return None;
        }
        Some((self.key_at(hd, pos).to_vec(), self.value_at(hd, pos).to_vec()))
    }

    fn next_full_scan(&mut self, cur: u32, hd: u32) -> Option<(Vec<u8>, Vec<u8>)> {
        let watermark = self.table(hd).idm.watermark();
        loop {
            let pos = self.cursors[cur as usize].as_ref().unwrap().pos;
            if pos >= watermark {
                return None;
            }
            self.cursors[cur as usize].as_mut().unwrap().pos += 1;
            if self.table(hd).slots[pos as usize].is_some() {
                return Some((self.key_at(hd, pos).to_vec(), self.value_at(hd, pos).to_vec()));
            }
        }
    }

    fn next_unsorted_range(&mut self, cur: u32, hd: u32) -> Option<(Vec<u8>, Vec<u8>)> {
        let watermark = self.table(hd).idm.watermark();
        let key_type = self.table(hd).key_type;
        let anchor = self.cursors[cur as usize].as_ref().unwrap().anchor.clone();
        loop {
            let pos = self.cursors[cur as usize].as_ref().unwrap().pos;
            if pos >= watermark {
                return None;
            }
            self.cursors[cur as usize].as_mut().unwrap().pos += 1;
            let is_match = match &self.table(hd).slots[pos as usize] {
                None => false,
                Some(slot) => match &anchor {
                    Some(anchor_key) => self.types.compare(key_type, &slot.key, anchor_key) != Ordering::Less,
                    None => true,
                },
            };
            if is_match {
                return Some((self.key_at(hd, pos).to_vec(), self.value_at(hd, pos).to_vec()));
            }
        }
    }

    fn next_sorted(&mut self, cur: u32, hd: u32, idx: usize) -> Option<(Vec<u8>, Vec<u8>)> {
        let order_len = self.table(hd).sorted.as_slice().len();
        if idx >= order_len {
            return None;
        }
        let n = self.table(hd).sorted.as_slice()[idx];
        self.cursors[cur as usize].as_mut().unwrap().sorted_pos = Some(idx + 1);
        Some((self.key_at(hd, n).to_vec(), self.value_at(hd, n).to_vec()))
    }

    /// Releases a cursor. Idempotent after natural end or an earlier `fin`.
    pub fn fin(&mut self, cur: u32) {
        if let Some(slot) = self.cursors.get_mut(cur as usize) {
            if slot.is_some() {
                *slot = None;
                self.cursor_idm.del(cur);
            }
        }
    }

    /// Number of live entries in `hd`.
    pub fn len(&self, hd: u32) -> u32 {
        self.table(hd).count
    }

    /// Whether `hd` has no live entries.
    pub fn is_empty(&self, hd: u32) -> bool {
        self.len(hd) == 0
    }

    /// Raw `(key, value)` borrow of slot `n` on `hd`, used by the file
    /// layer to encode a table's live entries without going through the
    /// key/value type-registry indirection `get`/`next` use.
    pub(crate) fn raw_slot(&self, hd: u32, n: u32) -> Option<(&[u8], &[u8])> {
        let slot = self.table(hd).slots[n as usize].as_ref()?;
        Some((&slot.key, &slot.value))
    }

    /// Looks up an already-open table by (filename, database), the registry
    /// mirror `spec.md` §2 component 9 describes.
    pub fn find_table(&self, filename: &std::path::Path, database: &str) -> Option<u32> {
        let dbid = crate::file::dbid_of(database);
        self.table_lookup.get(&(filename.to_path_buf(), dbid)).copied()
    }

    /// Internal consistency checker, a direct translation of the reference
    /// crate's own `is_valid`: every live slot must probe back to its own
    /// slot number from its key's hash, and the live count must match the
    /// number of live slots actually found. Logs one `log::error!` per
    /// violation instead of `println!`.
    pub fn is_valid(&self) -> bool {
        let mut valid = true;
        for hd in 0..self.tables.len() as u32 {
            if self.tables[hd as usize].is_none() {
                continue;
            }
            let table = self.table(hd);
            let key_type = table.key_type;
            let watermark = table.idm.watermark();
            let mut live = 0u32;
            for n in 0..watermark {
                let key = match self.raw_slot(hd, n) {
                    Some((key, _)) => key,
                    None => continue,
                };
                live += 1;
                let hash = self.types.hash_of(key_type, key);
                match self.locate(hd, hash, key) {
                    Probe::Found(id) if self.table(hd).index.slot_at(id) == n => (),
                    _ => {
                        log::error!("qmap: table {} slot {} is hash-unreachable from its own key", hd, n);
                        valid = false;
                    }
                }
            }
            if live != self.table(hd).count {
                log::error!(
                    "qmap: table {} live-slot count mismatch, expected {}, found {}",
                    hd,
                    self.table(hd).count,
                    live
                );
                valid = false;
            }
        }
        valid
    }
}

/// Allocation-reuse write: reuses the existing heap allocation whenever its
/// capacity already fits `data` (`spec.md` §4.4); otherwise replaces it.
fn reuse_write(buf: &mut Vec<u8>, data: &[u8]) {
    if data.len() <= buf.capacity() {
        buf.clear();
        buf.extend_from_slice(data);
    } else {
        *buf = data.to_vec();
    }
}
