//! Error types for FerrisDB
//!
//! This module defines the error types used throughout FerrisDB.

use thiserror::Error;

/// The main error type for FerrisDB operations
#[derive(Error, Debug)]
pub enum Error {
    /// An I/O error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Fewer bytes were written than requested; the WAL is now in an
    /// undefined state and should be treated as fatal for the process.
    #[error("short write to WAL: {0}")]
    ShortWrite(String),

    /// Truncated or corrupt bytes were found while decoding an entry,
    /// a versioned key, or a value.
    #[error("decode error: {0}")]
    Decode(String),

    /// The requested key was not found
    #[error("key not found")]
    KeyNotFound,

    /// Data corruption was detected
    #[error("corruption detected: {0}")]
    Corruption(String),

    /// A storage engine error occurred
    #[error("storage engine error: {0}")]
    StorageEngine(String),

    /// The same raw key was added twice to a single transaction's batch.
    #[error("duplicate key in batch")]
    DuplicateKeyInBatch,

    /// `ReadWriteTransaction::commit` was called with no pending writes.
    #[error("cannot commit an empty transaction")]
    EmptyTransaction,

    /// Serializable Snapshot Isolation detected a read-write conflict;
    /// the caller should retry from a fresh snapshot.
    #[error("transaction conflict, retry from a fresh snapshot")]
    Conflict,
}

/// A specialized Result type for FerrisDB operations
pub type Result<T> = std::result::Result<T, Error>;
