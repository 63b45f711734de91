//! A skip list paired with the WAL that backs it.
//!
//! A Memtable is the write path's primary target before eventual flush to
//! an SST: every insert is durably appended to its WAL before it becomes
//! visible in its skip list, so readers never observe an insert whose WAL
//! record isn't on disk yet. Once it reaches `memtable_size_in_bytes`
//! (accounted either via the skip list's own size tracking or the WAL's
//! writable offset, whichever trips first — see [`Self::is_full`]), the
//! [`crate::workspace::Workspace`] that owns it rotates it into the
//! immutable list and opens a fresh one.
//!
//! # Thread Safety
//!
//! A `Memtable` is shared behind a lock at the [`crate::workspace::Workspace`]
//! level, not internally: its skip list is safe for concurrent readers and a
//! single writer, and its WAL serialises writers on its own file handle.
//!
//! # Example
//!
//! ```ignore
//! use ferrisdb_storage::config::StorageConfig;
//! use ferrisdb_storage::memtable::{Memtable, Value, VersionedKey};
//!
//! let config = StorageConfig::default().with_db_directory("/tmp/ferrisdb");
//! let memtable = Memtable::new(0, &config)?;
//!
//! memtable.put_or_update(VersionedKey::new(b"HDD".to_vec(), 1), Value::new(b"Hard disk".to_vec()))?;
//! let (value, version) = memtable.get(b"HDD", 5).unwrap();
//! assert_eq!(value.bytes(), b"Hard disk");
//! # Ok::<(), ferrisdb_core::Error>(())
//! ```

use super::skiplist::SkipList;
use super::value::Value;
use super::versioned_key::VersionedKey;
use crate::config::StorageConfig;
use crate::wal::{Entry, Wal};
use ferrisdb_core::Result;

pub struct Memtable {
    file_id: u64,
    skiplist: SkipList,
    wal: Wal,
    memtable_size_in_bytes: u64,
}

impl Memtable {
    /// Opens (or creates) the WAL for `file_id` under `config.db_directory`
    /// and pairs it with a fresh, empty skip list.
    ///
    /// # Arguments
    ///
    /// * `file_id` - unique identifier for this memtable's WAL file; the
    ///   caller (the [`crate::workspace::Workspace`]) hands out a fresh one
    ///   on every rotation.
    /// * `config` - supplies the WAL directory, sync mode, and the
    ///   rotation-size threshold this memtable checks in [`Self::is_full`].
    ///
    /// # Errors
    ///
    /// Returns an error if the WAL file cannot be created or opened.
    pub fn new(file_id: u64, config: &StorageConfig) -> Result<Self> {
        Ok(Self {
            file_id,
            skiplist: SkipList::new(),
            wal: Wal::open(file_id, &config.db_directory, config.wal_sync_mode)?,
            memtable_size_in_bytes: config.memtable_size_in_bytes,
        })
    }

    pub fn file_id(&self) -> u64 {
        self.file_id
    }

    /// Appends `(key, value)` to the WAL, then inserts it into the skip
    /// list. A WAL write failure leaves the memtable in an undefined state
    /// (see `ferrisdb_core::Error::ShortWrite`) and is propagated as-is —
    /// the skip list insert never runs in that case.
    pub fn put_or_update(&self, key: VersionedKey, value: Value) -> Result<()> {
        self.wal.write(&Entry::new(key.encode(), value.encode()))?;
        self.skiplist.put_or_update(key, value);
        Ok(())
    }

    /// Equivalent to `put_or_update(key, Value::tombstone())`.
    pub fn delete(&self, key: VersionedKey) -> Result<()> {
        self.put_or_update(key, Value::tombstone())
    }

    pub fn get(&self, raw_key: &[u8], version: u64) -> Option<(Value, u64)> {
        self.skiplist.get(raw_key, version)
    }

    /// True once the skip list's accounted size or the WAL's writable
    /// offset has reached `memtable_size_in_bytes`, whichever trips first.
    pub fn is_full(&self) -> bool {
        self.skiplist.size() as u64 >= self.memtable_size_in_bytes
            || self.wal.current_writable_offset() >= self.memtable_size_in_bytes
    }

    /// Deletes this memtable's WAL file. Called once the memtable has been
    /// flushed to an SST (flush itself is out of scope here).
    pub fn remove_wal(&self) {
        self.wal.remove();
    }
}
