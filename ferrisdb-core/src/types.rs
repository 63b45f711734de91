//! Core types used throughout FerrisDB
//!
//! This module contains the fundamental data types that form the basis
//! of FerrisDB's data model and configuration.

/// A raw user key, represented as a byte vector.
pub type Key = Vec<u8>;

/// A timestamp for MVCC (Multi-Version Concurrency Control).
///
/// Doubles as the unit of commit/begin ordering handed out by the
/// transaction oracle: timestamp `0` is a valid snapshot (begin) timestamp
/// but is never handed out as a commit timestamp.
pub type Timestamp = u64;

/// Synchronization modes for write-ahead logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// No synchronization (fastest, least durable).
    None,
    /// Normal synchronization (flush to OS buffer).
    Normal,
    /// Full synchronization (flush and fsync to disk).
    Full,
}
