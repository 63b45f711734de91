//! Timestamp authority and Serializable Snapshot Isolation conflict
//! detector.
//!
//! The smallest commit timestamp ever handed out is 1; the smallest
//! snapshot (begin timestamp) ever handed out is 0 — `next_timestamp`
//! starts at 1 and a begin timestamp is always `next_timestamp - 1`.

use super::batch::{Batch, TimestampedBatch};
use super::executor::TransactionExecutor;
use super::watermark::WaterMark;
use crossbeam::channel::Receiver;
use ferrisdb_core::{Error, Key, Result};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

struct CommittedTransaction {
    commit_timestamp: u64,
    write_keys: HashSet<Key>,
}

struct State {
    next_timestamp: u64,
    committed_transactions: Vec<CommittedTransaction>,
}

pub struct Oracle {
    state: Mutex<State>,
    /// Serialises commit-timestamp allocation with submission to the
    /// executor, so the executor always receives batches in ascending
    /// commit-timestamp order. Held for the duration of `commit`.
    executor_lock: Mutex<()>,
    begin_mark: WaterMark,
    commit_mark: Arc<WaterMark>,
    executor: TransactionExecutor,
}

impl Oracle {
    pub fn new(executor: TransactionExecutor) -> Self {
        Self {
            state: Mutex::new(State {
                next_timestamp: 1,
                committed_transactions: Vec::new(),
            }),
            executor_lock: Mutex::new(()),
            begin_mark: WaterMark::new(),
            commit_mark: Arc::new(WaterMark::new()),
            executor,
        }
    }

    /// The current begin-safe snapshot time. Blocks until every commit at
    /// or before that timestamp is visible in the workspace, so a reader
    /// never misses a commit that logically happened before it began.
    pub fn begin_timestamp(&self) -> u64 {
        let begin_ts = {
            let state = self.state.lock();
            state.next_timestamp - 1
        };
        self.commit_mark.wait_for(begin_ts);
        self.begin_mark.begin(begin_ts);
        begin_ts
    }

    pub fn finish_begin_timestamp(&self, begin_ts: u64) {
        self.begin_mark.finish(begin_ts);
    }

    /// Checks `reads` against recently committed write sets, allocates a
    /// commit timestamp if there's no conflict, and submits `batch` to the
    /// executor. Holds `executor_lock` for the whole call so this
    /// transaction's batch reaches the executor before any transaction
    /// that allocates a later commit timestamp.
    pub fn commit(
        &self,
        begin_ts: u64,
        reads: &[Key],
        batch: Batch,
    ) -> Result<Receiver<Result<()>>> {
        let _executor_guard = self.executor_lock.lock();

        let commit_ts = {
            let mut state = self.state.lock();

            let max_begin_ts = self.begin_mark.done_till();
            state
                .committed_transactions
                .retain(|tx| tx.commit_timestamp > max_begin_ts);

            for committed in &state.committed_transactions {
                if committed.commit_timestamp <= begin_ts {
                    continue;
                }
                if reads.iter().any(|key| committed.write_keys.contains(key)) {
                    return Err(Error::Conflict);
                }
            }

            self.begin_mark.finish(begin_ts);

            let commit_ts = state.next_timestamp;
            state.next_timestamp += 1;

            if !batch.is_empty() {
                let write_keys = batch.all_pairs().iter().map(|(k, _)| k.clone()).collect();
                state.committed_transactions.push(CommittedTransaction {
                    commit_timestamp: commit_ts,
                    write_keys,
                });
            }

            self.commit_mark.begin(commit_ts);
            commit_ts
        };

        let commit_mark = Arc::clone(&self.commit_mark);
        let (timestamped, done) = batch.into_timestamped(commit_ts, move || {
            commit_mark.finish(commit_ts);
        });
        self.executor.submit(timestamped);

        Ok(done)
    }

    pub fn committed_transaction_count(&self) -> usize {
        self.state.lock().committed_transactions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::memtable::Value;
    use crate::workspace::Workspace;
    use tempfile::TempDir;

    fn oracle(dir: &TempDir) -> Oracle {
        let config = StorageConfig {
            db_directory: dir.path().to_path_buf(),
            ..StorageConfig::default()
        };
        let workspace = Arc::new(Workspace::new(config).unwrap());
        Oracle::new(TransactionExecutor::new(workspace))
    }

    #[test]
    fn begin_timestamp_starts_at_zero() {
        let dir = TempDir::new().unwrap();
        let oracle = oracle(&dir);
        assert_eq!(oracle.begin_timestamp(), 0);
    }

    #[test]
    fn first_commit_gets_timestamp_one() {
        let dir = TempDir::new().unwrap();
        let oracle = oracle(&dir);

        let begin_ts = oracle.begin_timestamp();
        let mut batch = Batch::new();
        batch
            .add(b"HDD".to_vec(), Value::new(b"Hard disk".to_vec()))
            .unwrap();

        let done = oracle.commit(begin_ts, &[], batch).unwrap();
        done.recv().unwrap().unwrap();

        assert_eq!(oracle.begin_timestamp(), 1);
    }

    #[test]
    fn second_transaction_gets_the_next_commit_timestamp() {
        let dir = TempDir::new().unwrap();
        let oracle = oracle(&dir);

        let begin_ts = oracle.begin_timestamp();
        let mut first = Batch::new();
        first
            .add(b"HDD".to_vec(), Value::new(b"Hard disk".to_vec()))
            .unwrap();
        oracle.commit(begin_ts, &[], first).unwrap().recv().unwrap().unwrap();

        let begin_ts = oracle.begin_timestamp();
        let mut second = Batch::new();
        second
            .add(b"SSD".to_vec(), Value::new(b"Solid state".to_vec()))
            .unwrap();
        let done = oracle.commit(begin_ts, &[], second).unwrap();
        let commit_ts_channel_result = done.recv().unwrap();
        assert!(commit_ts_channel_result.is_ok());
        assert_eq!(oracle.begin_timestamp(), 2);
    }

    #[test]
    fn a_later_transaction_that_read_a_concurrently_committed_key_conflicts() {
        let dir = TempDir::new().unwrap();
        let oracle = oracle(&dir);

        let begin_ts = oracle.begin_timestamp();
        let mut writer = Batch::new();
        writer
            .add(b"HDD".to_vec(), Value::new(b"Hard disk".to_vec()))
            .unwrap();
        oracle.commit(begin_ts, &[], writer).unwrap().recv().unwrap().unwrap();
        assert_eq!(oracle.committed_transaction_count(), 1);

        let reader_begin_ts = 0;
        let err = oracle
            .commit(reader_begin_ts, &[b"HDD".to_vec()], Batch::new())
            .unwrap_err();
        assert!(matches!(err, Error::Conflict));
    }
}
