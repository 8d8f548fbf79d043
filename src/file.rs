//! Mmap-backed multi-database file persistence. One file may hold several
//! tables' entries back to back, each tagged with a `dbid` hash of its
//! database name, per `spec.md` §4.10. Loading maps the file read-only and
//! replays matching entries through `put`; saving recomputes the file's
//! size from every persistent primary table, truncates, maps writable, and
//! rewrites every block.
//!
//! `size` is specified as a native `usize`; this crate fixes it at 64 bits
//! on disk so a file written on one platform loads on another.

use std::collections::hash_map::Entry as HEntry;
use std::convert::TryInto;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use memmap::{Mmap, MmapMut};

use crate::engine::Engine;
use crate::error::Error;
use crate::types::default_hash;

const HEADER_LEN: usize = 4 + 8;

pub(crate) struct FileRecord {
    pub tables: Vec<u32>,
}

pub(crate) fn dbid_of(database: &str) -> u32 {
    default_hash(database.as_bytes())
}

impl Engine {
    /// Associates `hd` with `path`/`database`, then loads any matching
    /// entries already on disk. Missing files are not an error.
    pub(crate) fn bind_file(&mut self, hd: u32, path: &Path, database: &str) {
        let dbid = dbid_of(database);
        let path_buf = path.to_path_buf();
        {
            let table = self.table_mut(hd);
            table.filename = Some(path_buf.clone());
            table.database = Some(database.to_string());
            table.persistent = true;
            table.dbid = dbid;
        }
        match self.files.entry(path_buf.clone()) {
            HEntry::Occupied(mut e) => e.get_mut().tables.push(hd),
            HEntry::Vacant(e) => {
                e.insert(FileRecord { tables: vec![hd] });
            }
        }
        self.table_lookup.insert((path_buf.clone(), dbid), hd);
        if path_buf.exists() {
            if let Err(e) = self.load_file(hd, &path_buf) {
                log::error!("qmap: failed to load {}: {}", path_buf.display(), e);
            }
        }
    }

    fn load_file(&mut self, hd: u32, path: &Path) -> Result<(), Error> {
        let file = OpenOptions::new().read(true).open(path)?;
        file.lock_shared()?;
        let mmap = unsafe { Mmap::map(&file)? };
        let data = &mmap[..];
        let my_dbid = self.table(hd).dbid;
        let key_type = self.table(hd).key_type;
        let value_type = self.table(hd).value_type;
        let mut pos = 0usize;
        while pos + HEADER_LEN <= data.len() {
            let dbid = u32::from_le_bytes(data[pos..pos + 4].try_into().unwrap());
            // `size` covers entries only (spec.md §4.10): the block's full
            // length past the header also carries the 4-byte `count` field.
            let size = u64::from_le_bytes(data[pos + 4..pos + 12].try_into().unwrap()) as usize;
            let block_start = pos + HEADER_LEN;
            let block_len = 4 + size;
            if block_start + block_len > data.len() {
                return Err(Error::WrongHeader);
            }
            if dbid == my_dbid {
                self.replay_block(hd, &data[block_start..block_start + block_len], key_type, value_type);
            } else {
                log::debug!("qmap: skipping database block {:#x} while loading for {:#x}", dbid, my_dbid);
            }
            pos = block_start + block_len;
        }
        Ok(())
    }

    fn replay_block(&mut self, hd: u32, block: &[u8], key_type: u32, value_type: u32) {
        if block.len() < 4 {
            return;
        }
        let count = u32::from_le_bytes(block[0..4].try_into().unwrap());
        let mut pos = 4usize;
        for _ in 0..count {
            let klen = self.types.len_of(key_type, &block[pos..]) as usize;
            let key = &block[pos..pos + klen];
            pos += klen;
            let vlen = self.types.len_of(value_type, &block[pos..]) as usize;
            let value = &block[pos..pos + vlen];
            pos += vlen;
            self.put(hd, Some(key), value);
        }
    }

    /// Writes every persistent primary table back to its bound file.
    /// Non-persistent tables (secondaries, mirrors) are skipped: their
    /// content is reconstructed by association cascade during the next
    /// load of their primary.
    pub fn save(&mut self) -> Result<(), Error> {
        let paths: Vec<PathBuf> = self.files.keys().cloned().collect();
        for path in paths {
            self.save_file(&path)?;
        }
        Ok(())
    }

    fn save_file(&mut self, path: &Path) -> Result<(), Error> {
        let tables = self.files.get(path).expect("qmap: file record vanished").tables.clone();
        let mut blocks: Vec<Vec<u8>> = Vec::new();
        for &hd in &tables {
            let table = self.table(hd);
            if table.phd != hd || !table.persistent {
                continue;
            }
            blocks.push(self.encode_block(hd));
        }
        let total: u64 = blocks.iter().map(|b| b.len() as u64).sum();

        let file = OpenOptions::new().read(true).write(true).create(true).open(path)?;
        file.lock_exclusive()?;
        file.set_len(total)?;
        if total == 0 {
            return Ok(());
        }
        let mut mmap = unsafe { MmapMut::map_mut(&file)? };
        let mut cursor = &mut mmap[..];
        for block in &blocks {
            cursor.write_all(block)?;
        }
        mmap.flush()?;
        log::info!("qmap: saved {} database(s), {} bytes, to {}", blocks.len(), total, path.display());
        Ok(())
    }

    /// Encodes one `dbid size count entry*` block for a persistent primary
    /// table.
    fn encode_block(&self, hd: u32) -> Vec<u8> {
        let table = self.table(hd);
        let dbid = table.dbid;
        let mut payload = Vec::new();
        payload.extend_from_slice(&table.count.to_le_bytes());
        let watermark = table.idm.watermark();
        for n in 0..watermark {
            if let Some((key, value)) = self.live_entry(hd, n) {
                payload.extend_from_slice(key);
                payload.extend_from_slice(value);
            }
        }
        // `size` is the entries' byte length only, not the `count` field
        // carried alongside them in `payload` (spec.md §4.10).
        let size = (payload.len() - 4) as u64;
        let mut block = Vec::with_capacity(HEADER_LEN + payload.len());
        block.extend_from_slice(&dbid.to_le_bytes());
        block.extend_from_slice(&size.to_le_bytes());
        block.extend_from_slice(&payload);
        block
    }

    fn live_entry(&self, hd: u32, n: u32) -> Option<(&[u8], &[u8])> {
        self.raw_slot(hd, n)
    }
}
