//! Configuration for the storage engine.

use ferrisdb_core::SyncMode;
use std::path::PathBuf;

/// Tunable parameters for a [`crate::StorageEngine`].
///
/// # Example
///
/// ```
/// use ferrisdb_storage::StorageConfig;
///
/// let config = StorageConfig {
///     db_directory: "./data".into(),
///     memtable_size_in_bytes: 4 * 1024 * 1024,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory holding WAL (and eventually SST) files. Required — the
    /// default is a relative `.` only so `StorageConfig::default()` is
    /// usable in tests without forcing every caller to set it.
    pub db_directory: PathBuf,

    /// Rotation threshold: a memtable is full once either its skip list's
    /// accounted size or its WAL's writable offset reaches this many
    /// bytes.
    pub memtable_size_in_bytes: u64,

    /// Size of the fixed buffer an SST block builder fills before it must
    /// be finished.
    pub sstable_block_size_in_bytes: u32,

    /// Durability level for WAL appends.
    pub wal_sync_mode: SyncMode,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_directory: PathBuf::from("."),
            memtable_size_in_bytes: 32 * 1024 * 1024,
            sstable_block_size_in_bytes: 4096,
            wal_sync_mode: SyncMode::Normal,
        }
    }
}

impl StorageConfig {
    pub fn with_db_directory(mut self, db_directory: impl Into<PathBuf>) -> Self {
        self.db_directory = db_directory.into();
        self
    }

    pub fn with_memtable_size_in_bytes(mut self, size: u64) -> Self {
        self.memtable_size_in_bytes = size;
        self
    }
}
