//! Singular Update Queue: one thread applies every commit, serially, in the
//! order it was submitted.
//!
//! Because [`super::Oracle::executor_lock`] is held across commit-timestamp
//! allocation and submission, submission order equals ascending commit
//! timestamp — so a single consuming thread is enough to guarantee the
//! workspace only ever sees writes in commit-ts order.

use super::batch::TimestampedBatch;
use crate::memtable::VersionedKey;
use crate::workspace::Workspace;
use crossbeam::channel::{self, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;

pub struct TransactionExecutor {
    sender: Sender<TimestampedBatch>,
    worker: Option<JoinHandle<()>>,
}

impl TransactionExecutor {
    /// Spawns the single consuming thread. Called once for the lifetime of
    /// a `Workspace`.
    pub fn new(workspace: Arc<Workspace>) -> Self {
        let (sender, receiver) = channel::bounded::<TimestampedBatch>(0);

        let worker = std::thread::spawn(move || {
            for batch in receiver {
                let result = Self::apply(&workspace, &batch);
                batch.finish(result);
            }
        });

        Self {
            sender,
            worker: Some(worker),
        }
    }

    /// Sends `batch` to the executor thread and blocks until it's accepted
    /// (the channel is unbuffered, mirroring the source's blocking send).
    pub fn submit(&self, batch: TimestampedBatch) {
        // The channel only closes once this executor is dropped, at which
        // point nothing should still be submitting to it.
        let _ = self.sender.send(batch);
    }

    fn apply(workspace: &Workspace, batch: &TimestampedBatch) -> ferrisdb_core::Result<()> {
        for (key, value) in batch.pairs() {
            let versioned_key = VersionedKey::new(key.clone(), batch.commit_timestamp());
            workspace.put_or_update(versioned_key, value.clone())?;
        }
        Ok(())
    }
}

impl Drop for TransactionExecutor {
    fn drop(&mut self) {
        // Dropping `sender` closes the channel, ending the worker's `for`
        // loop.
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::memtable::Value;
    use tempfile::TempDir;

    fn workspace(dir: &TempDir) -> Arc<Workspace> {
        let config = StorageConfig {
            db_directory: dir.path().to_path_buf(),
            ..StorageConfig::default()
        };
        Arc::new(Workspace::new(config).unwrap())
    }

    #[test]
    fn applies_a_batch_to_the_workspace() {
        let dir = TempDir::new().unwrap();
        let workspace = workspace(&dir);
        let executor = TransactionExecutor::new(Arc::clone(&workspace));

        let mut batch = super::super::batch::Batch::new();
        batch
            .add(b"HDD".to_vec(), Value::new(b"Hard disk".to_vec()))
            .unwrap();
        batch
            .add(b"isolation".to_vec(), Value::new(b"Snapshot".to_vec()))
            .unwrap();
        let (timestamped, done) = batch.into_timestamped(1, || {});

        executor.submit(timestamped);
        done.recv().unwrap().unwrap();

        let (value, _) = workspace
            .get(&VersionedKey::new(b"HDD".to_vec(), 1))
            .unwrap();
        assert_eq!(value.bytes(), b"Hard disk");
    }

    #[test]
    fn invokes_the_commit_callback_after_applying() {
        let dir = TempDir::new().unwrap();
        let workspace = workspace(&dir);
        let executor = TransactionExecutor::new(Arc::clone(&workspace));

        let callback_workspace = Arc::clone(&workspace);
        let mut batch = super::super::batch::Batch::new();
        batch
            .add(b"HDD".to_vec(), Value::new(b"Hard disk".to_vec()))
            .unwrap();
        let (timestamped, done) = batch.into_timestamped(1, move || {
            callback_workspace
                .put_or_update(VersionedKey::new(b"commit".to_vec(), 1), Value::new(b"applied".to_vec()))
                .unwrap();
        });

        executor.submit(timestamped);
        done.recv().unwrap().unwrap();

        let (value, _) = workspace
            .get(&VersionedKey::new(b"commit".to_vec(), 1))
            .unwrap();
        assert_eq!(value.bytes(), b"applied");
    }

    #[test]
    fn applies_two_batches_in_submission_order() {
        let dir = TempDir::new().unwrap();
        let workspace = workspace(&dir);
        let executor = TransactionExecutor::new(Arc::clone(&workspace));

        let mut first = super::super::batch::Batch::new();
        first
            .add(b"HDD".to_vec(), Value::new(b"Hard disk".to_vec()))
            .unwrap();
        let (first_timestamped, first_done) = first.into_timestamped(1, || {});
        executor.submit(first_timestamped);
        first_done.recv().unwrap().unwrap();

        let mut second = super::super::batch::Batch::new();
        second
            .add(b"HDD".to_vec(), Value::new(b"Hard disk drive".to_vec()))
            .unwrap();
        let (second_timestamped, second_done) = second.into_timestamped(3, || {});
        executor.submit(second_timestamped);
        second_done.recv().unwrap().unwrap();

        let (value, version) = workspace
            .get(&VersionedKey::new(b"HDD".to_vec(), 3))
            .unwrap();
        assert_eq!(value.bytes(), b"Hard disk drive");
        assert_eq!(version, 3);
    }
}
