//! Core types and traits for FerrisDB
//!
//! This crate contains the fundamental types and error handling used throughout
//! the FerrisDB project. It provides:
//!
//! - Common error types with [`Error`] and [`Result`]
//! - Basic data types like [`Key`] and [`Timestamp`]
//! - [`SyncMode`] for WAL durability configuration
//!
//! # Example
//!
//! ```
//! use ferrisdb_core::{Key, Timestamp};
//!
//! let key: Key = b"user:123".to_vec();
//! let version: Timestamp = 1;
//! ```

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
