//! The embeddable engine: wires a [`Workspace`] together with an [`Oracle`]
//! and its [`TransactionExecutor`] behind the public transaction API.

use crate::txn::{Oracle, ReadWriteTransaction, ReadonlyTransaction, TransactionExecutor};
use crate::workspace::Workspace;
use crate::StorageConfig;
use ferrisdb_core::Result;
use std::sync::Arc;

/// An open storage engine. Every transaction it hands out shares the same
/// underlying [`Workspace`] and [`Oracle`]; callers are expected to share
/// one `StorageEngine` per `db_directory` rather than open it twice.
pub struct StorageEngine {
    workspace: Arc<Workspace>,
    oracle: Arc<Oracle>,
}

impl StorageEngine {
    /// Opens (or creates) a storage engine rooted at `config.db_directory`,
    /// starting its transaction executor.
    pub fn open(config: StorageConfig) -> Result<Self> {
        let workspace = Arc::new(Workspace::new(config)?);
        let executor = TransactionExecutor::new(Arc::clone(&workspace));
        let oracle = Arc::new(Oracle::new(executor));
        log::info!("storage engine opened");
        Ok(Self { workspace, oracle })
    }

    /// Begins a read-only transaction pinned to the current commit
    /// snapshot. Every read it issues observes every commit that completed
    /// before this call returns, and none that complete afterward.
    pub fn begin_readonly(&self) -> ReadonlyTransaction {
        ReadonlyTransaction::new(Arc::clone(&self.oracle), Arc::clone(&self.workspace))
    }

    /// Begins a read-write transaction. Writes are buffered locally until
    /// `commit`, at which point they are checked for SSI conflicts and
    /// applied atomically at a single new commit timestamp.
    pub fn begin_read_write(&self) -> ReadWriteTransaction {
        ReadWriteTransaction::new(Arc::clone(&self.oracle), Arc::clone(&self.workspace))
    }
}
