//! Storage engine for FerrisDB
//!
//! An embeddable key-value storage engine providing snapshot-isolation
//! transactions over a multi-version in-memory store backed by a
//! per-memtable write-ahead log.
//!
//! - **Write-Ahead Log (WAL)**: Ensures durability of writes
//! - **MemTable**: In-memory write buffer using a skip list, keyed by
//!   `(raw key, commit timestamp)`
//! - **Workspace**: One active memtable plus the immutable ones rotated out
//!   of it, read newest-first
//! - **Oracle / Transaction Executor**: Timestamp allocation, SSI conflict
//!   detection, and a singular update queue applying commits in order
//! - **SSTable block**: Sorted, binary-searchable block builder/iterator
//!   for eventual on-disk flush
//!
//! # Architecture
//!
//! ```text
//! Write path:
//! ReadWriteTransaction::commit → Oracle (timestamp + SSI check)
//!   → TransactionExecutor → Workspace → active Memtable (WAL, then skip list)
//!
//! Read path:
//! Transaction::get → Workspace::get → active memtable, then immutables,
//!   newest first, returning the largest version <= the snapshot timestamp
//! ```
//!
//! # Example
//!
//! ```no_run
//! use ferrisdb_storage::{StorageConfig, StorageEngine};
//!
//! let config = StorageConfig::default().with_db_directory("./data");
//! let engine = StorageEngine::open(config).unwrap();
//!
//! let mut txn = engine.begin_read_write();
//! txn.put_or_update(b"HDD".to_vec(), b"Hard disk".to_vec()).unwrap();
//! txn.commit().unwrap();
//!
//! let reader = engine.begin_readonly();
//! assert_eq!(reader.get(b"HDD"), Some(b"Hard disk".to_vec()));
//! ```

pub mod codec;
pub mod config;
pub mod memtable;
pub mod sstable;
pub mod storage_engine;
pub mod txn;
pub mod wal;
pub mod workspace;

pub use config::StorageConfig;
pub use storage_engine::StorageEngine;
pub use txn::{ReadWriteTransaction, ReadonlyTransaction};
