//! Streaming reader over a WAL file, replayed one [`Entry`] at a time.

use super::entry::Entry;
use ferrisdb_core::Result;
use std::fs::{File, OpenOptions};
use std::io::BufReader;
use std::path::Path;

pub struct WalIterator {
    reader: BufReader<File>,
}

impl WalIterator {
    /// Opens `path` read-only and positions at its start.
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().read(true).open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
        })
    }

    /// Reads the next entry. `Ok(None)` signals a clean end-of-log, not an
    /// error. A [`ferrisdb_core::Error::Decode`] means the log is truncated
    /// mid-record; replay should stop at the last successfully returned
    /// entry.
    pub fn next(&mut self) -> Result<Option<Entry>> {
        Entry::decode_from(&mut self.reader)
    }
}
