//! Read-only and read-write transaction handles.
//!
//! Both variants carry a `beginTimestamp` taken from the [`Oracle`] at
//! construction, so every read they issue is answered against a fixed
//! snapshot of the workspace regardless of what commits afterward.

use super::batch::Batch;
use super::oracle::Oracle;
use crate::memtable::{Value, VersionedKey};
use crate::workspace::Workspace;
use ferrisdb_core::{Error, Key, Result};
use std::sync::Arc;

/// A snapshot-isolated, read-only view of the workspace as of the moment it
/// was created.
pub struct ReadonlyTransaction {
    oracle: Arc<Oracle>,
    workspace: Arc<Workspace>,
    begin_timestamp: u64,
}

impl ReadonlyTransaction {
    pub(crate) fn new(oracle: Arc<Oracle>, workspace: Arc<Workspace>) -> Self {
        let begin_timestamp = oracle.begin_timestamp();
        Self {
            oracle,
            workspace,
            begin_timestamp,
        }
    }

    pub fn begin_timestamp(&self) -> u64 {
        self.begin_timestamp
    }

    /// Returns the value for `key` visible at this transaction's snapshot,
    /// or `None` if it was never written or has since been deleted at or
    /// before this snapshot.
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        let versioned = VersionedKey::new(key.to_vec(), self.begin_timestamp);
        self.workspace
            .get(&versioned)
            .map(|(value, _)| value.into_bytes())
    }

    /// Releases this transaction's snapshot, letting the begin watermark
    /// advance past it. Equivalent to dropping the transaction; provided
    /// explicitly so callers can signal intent without relying on scope
    /// exit.
    pub fn finish(self) {}
}

impl Drop for ReadonlyTransaction {
    fn drop(&mut self) {
        self.oracle.finish_begin_timestamp(self.begin_timestamp);
    }
}

/// A read-write transaction: reads observe this transaction's own pending
/// writes before falling through to the workspace snapshot, and `commit`
/// goes through the oracle's SSI conflict check.
pub struct ReadWriteTransaction {
    oracle: Arc<Oracle>,
    workspace: Arc<Workspace>,
    begin_timestamp: u64,
    batch: Batch,
    reads: Vec<Key>,
    committed: bool,
}

impl ReadWriteTransaction {
    pub(crate) fn new(oracle: Arc<Oracle>, workspace: Arc<Workspace>) -> Self {
        let begin_timestamp = oracle.begin_timestamp();
        Self {
            oracle,
            workspace,
            begin_timestamp,
            batch: Batch::new(),
            reads: Vec::new(),
            committed: false,
        }
    }

    pub fn begin_timestamp(&self) -> u64 {
        self.begin_timestamp
    }

    /// Checks the local batch first, so a transaction observes its own
    /// writes without waiting for commit. A pending tombstone reports
    /// `None`, same as a committed delete would.
    ///
    /// A key already present in the batch is *not* added to `reads` — this
    /// matches the source behaviour described in spec.md §9 and can
    /// under-report conflicts for a key a transaction reads after writing
    /// it in the same transaction. It is preserved deliberately rather
    /// than "fixed": the transaction's own write always commits with a
    /// higher timestamp than such a read could have conflicted on anyway.
    pub fn get(&mut self, key: &[u8]) -> Option<Vec<u8>> {
        if let Some(value) = self.batch.get(key) {
            return if value.is_deleted() {
                None
            } else {
                Some(value.bytes().to_vec())
            };
        }

        self.reads.push(key.to_vec());
        let versioned = VersionedKey::new(key.to_vec(), self.begin_timestamp);
        self.workspace
            .get(&versioned)
            .map(|(value, _)| value.into_bytes())
    }

    /// Stages `(key, value)` for this transaction's batch. Fails with
    /// [`Error::DuplicateKeyInBatch`] if `key` already has a pending write.
    pub fn put_or_update(&mut self, key: Key, value: Vec<u8>) -> Result<()> {
        self.batch.add(key, Value::new(value))
    }

    /// Stages a tombstone for `key`. Equivalent to `put_or_update` with a
    /// deleted value.
    pub fn delete(&mut self, key: Key) -> Result<()> {
        self.batch.add(key, Value::tombstone())
    }

    /// Acquires a commit timestamp from the oracle (subject to an SSI
    /// conflict check against `self.reads`) and hands the batch to the
    /// transaction executor. Fails immediately with
    /// [`Error::EmptyTransaction`] if nothing was staged, and with
    /// [`Error::Conflict`] if a key this transaction read was written by
    /// another transaction that committed after this one began.
    ///
    /// On success, blocks until the executor has applied every pair in the
    /// batch before returning.
    pub fn commit(mut self) -> Result<()> {
        if self.batch.is_empty() {
            return Err(Error::EmptyTransaction);
        }

        let batch = std::mem::take(&mut self.batch);
        let done = self.oracle.commit(self.begin_timestamp, &self.reads, batch)?;
        self.committed = true;

        done.recv()
            .map_err(|_| Error::StorageEngine("transaction executor shut down".to_string()))?
    }
}

impl Drop for ReadWriteTransaction {
    fn drop(&mut self) {
        // `commit` already finished the begin mark (via `Oracle::commit`)
        // on the success path; only an uncommitted/aborted transaction
        // needs it finished here.
        if !self.committed {
            self.oracle.finish_begin_timestamp(self.begin_timestamp);
        }
    }
}
