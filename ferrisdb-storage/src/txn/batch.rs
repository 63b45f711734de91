//! Pending writes for a single read-write transaction.

use crate::memtable::Value;
use crossbeam::channel::{self, Receiver, Sender};
use ferrisdb_core::{Error, Key, Result};

/// Ordered, duplicate-free list of pending `(key, value)` pairs for one
/// not-yet-committed transaction. A pending value may itself be a
/// tombstone, which is how `ReadWriteTransaction::delete` is represented.
#[derive(Debug, Default, Clone)]
pub struct Batch {
    pairs: Vec<(Key, Value)>,
}

impl Batch {
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Records `(key, value)`. Fails with
    /// [`ferrisdb_core::Error::DuplicateKeyInBatch`] if `key` is already
    /// pending.
    pub fn add(&mut self, key: Key, value: Value) -> Result<()> {
        if self.pairs.iter().any(|(k, _)| k == &key) {
            return Err(Error::DuplicateKeyInBatch);
        }
        self.pairs.push((key, value));
        Ok(())
    }

    /// The pending value for `key`, if this batch has one — used by
    /// `ReadWriteTransaction::get` to observe the transaction's own writes.
    pub fn get(&self, key: &[u8]) -> Option<&Value> {
        self.pairs
            .iter()
            .find(|(k, _)| k.as_slice() == key)
            .map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// All pending pairs, in insertion order.
    pub fn all_pairs(&self) -> &[(Key, Value)] {
        &self.pairs
    }

    /// Wraps this batch with its assigned commit timestamp, ready for
    /// submission to the [`super::TransactionExecutor`].
    pub fn into_timestamped(
        self,
        commit_timestamp: u64,
        commit_callback: impl FnOnce() + Send + 'static,
    ) -> (TimestampedBatch, Receiver<Result<()>>) {
        let (done_tx, done_rx) = channel::bounded(1);
        (
            TimestampedBatch {
                pairs: self.pairs,
                commit_timestamp,
                commit_callback: Box::new(commit_callback),
                done: done_tx,
            },
            done_rx,
        )
    }
}

/// A [`Batch`] that has been assigned a commit timestamp and is ready for
/// the executor to apply. Consumed exactly once.
pub struct TimestampedBatch {
    pairs: Vec<(Key, Value)>,
    commit_timestamp: u64,
    commit_callback: Box<dyn FnOnce() + Send>,
    done: Sender<Result<()>>,
}

impl TimestampedBatch {
    pub fn commit_timestamp(&self) -> u64 {
        self.commit_timestamp
    }

    pub fn pairs(&self) -> &[(Key, Value)] {
        &self.pairs
    }

    /// Consumes the batch, running its commit callback and reporting
    /// `result` on the one-shot done channel.
    pub fn finish(self, result: Result<()>) {
        (self.commit_callback)();
        let _ = self.done.send(result);
    }
}
