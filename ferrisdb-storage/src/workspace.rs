//! One active memtable plus a growing list of immutable ones.
//!
//! Reads walk memtables newest-first (active, then immutables from most to
//! least recently rotated out) so a key's latest version is found without
//! scanning the whole history. Rotation moves the active memtable into the
//! immutable list and installs a fresh one once it's full.

use crate::config::StorageConfig;
use crate::memtable::{Memtable, Value, VersionedKey};
use ferrisdb_core::Result;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

pub struct Workspace {
    config: StorageConfig,
    active_memtable: Mutex<Memtable>,
    immutable_memtables: Mutex<Vec<Memtable>>,
    next_file_id: AtomicU64,
}

impl Workspace {
    pub fn new(config: StorageConfig) -> Result<Self> {
        let active_memtable = Memtable::new(0, &config)?;
        Ok(Self {
            config,
            active_memtable: Mutex::new(active_memtable),
            immutable_memtables: Mutex::new(Vec::new()),
            next_file_id: AtomicU64::new(1),
        })
    }

    /// Writes `(key, value)` to the active memtable, rotating first if it's
    /// full. Called only from the transaction executor, so callers never
    /// race each other here — see `crate::txn::TransactionExecutor`.
    pub fn put_or_update(&self, key: VersionedKey, value: Value) -> Result<()> {
        self.ensure_room()?;
        self.active_memtable.lock().put_or_update(key, value)
    }

    pub fn delete(&self, key: VersionedKey) -> Result<()> {
        self.ensure_room()?;
        self.active_memtable.lock().delete(key)
    }

    /// Returns the value for the largest version `<= key.version()`, if
    /// any. A memtable's exact-version hit short-circuits the scan;
    /// otherwise every memtable is checked and the greatest version found
    /// wins, since a key's versions can be split across the active
    /// memtable and one or more immutable ones.
    ///
    /// SST levels are not consulted — out of scope for this crate (see
    /// `crate::sstable`).
    pub fn get(&self, key: &VersionedKey) -> Option<(Value, u64)> {
        let active = self.active_memtable.lock();
        let immutables = self.immutable_memtables.lock();

        let mut best: Option<(Value, u64)> = None;
        for memtable in std::iter::once(&*active).chain(immutables.iter().rev()) {
            if let Some((value, version)) = memtable.get(key.key(), key.version()) {
                if version == key.version() {
                    return Some((value, version));
                }
                if best.as_ref().map(|(_, v)| version > *v).unwrap_or(true) {
                    best = Some((value, version));
                }
            }
        }
        best
    }

    fn ensure_room(&self) -> Result<()> {
        let mut active = self.active_memtable.lock();
        if !active.is_full() {
            return Ok(());
        }
        let file_id = self.next_file_id.fetch_add(1, Ordering::Relaxed);
        let fresh = Memtable::new(file_id, &self.config)?;
        let rotated_out = std::mem::replace(&mut *active, fresh);
        self.immutable_memtables.lock().push(rotated_out);
        Ok(())
    }

    /// Removes every memtable's WAL file. Called on shutdown, once nothing
    /// further needs to be replayed from them.
    pub fn remove_all_wal(&self) {
        self.active_memtable.lock().remove_wal();
        for memtable in self.immutable_memtables.lock().iter() {
            memtable.remove_wal();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn workspace(dir: &TempDir, memtable_size_in_bytes: u64) -> Workspace {
        let config = StorageConfig {
            db_directory: dir.path().to_path_buf(),
            memtable_size_in_bytes,
            ..StorageConfig::default()
        };
        Workspace::new(config).unwrap()
    }

    #[test]
    fn put_then_get_round_trips_through_the_active_memtable() {
        let dir = TempDir::new().unwrap();
        let workspace = workspace(&dir, 32 * 1024 * 1024);

        workspace
            .put_or_update(VersionedKey::new(b"HDD".to_vec(), 1), Value::new(b"Hard disk".to_vec()))
            .unwrap();

        let (value, version) = workspace
            .get(&VersionedKey::new(b"HDD".to_vec(), 5))
            .unwrap();
        assert_eq!(value.bytes(), b"Hard disk");
        assert_eq!(version, 1);
    }

    #[test]
    fn rotation_moves_the_active_memtable_into_immutables_and_reads_still_see_it() {
        let dir = TempDir::new().unwrap();
        let workspace = workspace(&dir, 20);

        workspace
            .put_or_update(
                VersionedKey::new(b"HDD".to_vec(), 1),
                Value::new(b"Hard disk drive".to_vec()),
            )
            .unwrap();
        assert!(workspace.active_memtable.lock().is_full());

        workspace
            .put_or_update(VersionedKey::new(b"SSD".to_vec(), 2), Value::new(b"Fast".to_vec()))
            .unwrap();

        assert_eq!(workspace.immutable_memtables.lock().len(), 1);
        let (old_value, old_version) = workspace
            .get(&VersionedKey::new(b"HDD".to_vec(), 5))
            .unwrap();
        assert_eq!(old_value.bytes(), b"Hard disk drive");
        assert_eq!(old_version, 1);

        let (new_value, new_version) = workspace
            .get(&VersionedKey::new(b"SSD".to_vec(), 5))
            .unwrap();
        assert_eq!(new_value.bytes(), b"Fast");
        assert_eq!(new_version, 2);
    }

    #[test]
    fn get_returns_the_largest_version_not_exceeding_the_requested_snapshot() {
        let dir = TempDir::new().unwrap();
        let workspace = workspace(&dir, 32 * 1024 * 1024);

        workspace
            .put_or_update(VersionedKey::new(b"k".to_vec(), 1), Value::new(b"v1".to_vec()))
            .unwrap();
        workspace
            .put_or_update(VersionedKey::new(b"k".to_vec(), 5), Value::new(b"v5".to_vec()))
            .unwrap();

        let (value, version) = workspace.get(&VersionedKey::new(b"k".to_vec(), 3)).unwrap();
        assert_eq!(value.bytes(), b"v1");
        assert_eq!(version, 1);
    }

    #[test]
    fn get_misses_a_key_never_written() {
        let dir = TempDir::new().unwrap();
        let workspace = workspace(&dir, 32 * 1024 * 1024);
        assert!(workspace.get(&VersionedKey::new(b"nope".to_vec(), 10)).is_none());
    }
}
