//! Cursor records. A cursor is one of four iteration modes selected at
//! creation time by (key, range flag) and the owning table's `SORTED` flag;
//! see `Engine::iter`/`Engine::next` for the actual walk, which needs access
//! to the owning table's hash and sorted indexes and so lives on `Engine`.

pub struct CursorState {
    pub table: u32,
    /// Slot-number walk position for full-scan and unsorted-range modes, or
    /// the single matching slot (or MISS) for a point cursor.
    pub pos: u32,
    /// Index into the table's sorted array, for a range cursor on a sorted
    /// table. `None` for every other mode.
    pub sorted_pos: Option<usize>,
    pub anchor: Option<Vec<u8>>,
    pub range: bool,
    pub point: bool,
    pub done: bool,
}
