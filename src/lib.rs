#![warn(missing_docs)]
//! Embeddable associative-container engine with typed keys, secondary
//! indexes and mmap-backed persistence.
//!
//! A [`Engine`] holds a registry of key/value types, any number of open
//! tables, and any number of open cursors. Tables are plain hash maps by
//! default; `open`'s flags turn on auto-indexing, a reverse-lookup mirror,
//! or a maintained sort order for range queries. Tables can be chained into
//! an association graph with `assoc`, so that a `put`/`del` on the root
//! cascades into every derived secondary index. A table opened with a
//! filename is replayed from and persisted back to a shared multi-database
//! file via `mmap`.
//!
//! There is no process-wide default engine and no internal locking: an
//! `Engine` is a single value owned by its caller, and every operation
//! takes `&mut self` or `&self` the way any other in-process data
//! structure would (`spec.md` §5 names this explicitly: no two operations
//! may run concurrently against the same engine).

mod cursor;
mod engine;
mod error;
mod file;
mod hashindex;
mod idm;
mod sorted;
mod types;

pub use engine::{Engine, AssocFn, AUTO_INDEX, MIRROR, PRIMARY_GET, RANGE, SORTED};
pub use error::Error;
pub use types::{CmpFn, HashFn, MeasureFn, TypeId, HNDL, PTR, STR, U32};

#[cfg(test)]
mod smoke_tests;
