//! Write-ahead log: one append-only file per memtable, replayed by a
//! streaming reader.
//!
//! Every memtable insert is durably appended here before it becomes visible
//! in the skip list (see [`crate::memtable`]). The WAL has no knowledge of
//! `VersionedKey`/`Value` — it frames two opaque byte strings per
//! [`Entry`]; the memtable is responsible for encoding/decoding them.

mod entry;
mod reader;
mod writer;

pub use entry::Entry;
pub use reader::WalIterator;
pub use writer::Wal;
