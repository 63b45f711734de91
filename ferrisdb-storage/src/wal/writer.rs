//! Append-only durable log: one `{directory}/{file_id}.wal` per memtable.

use super::entry::Entry;
use ferrisdb_core::{Error, Result, SyncMode};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

fn wal_path(directory: &Path, file_id: u64) -> PathBuf {
    directory.join(format!("{file_id}.wal"))
}

/// The writable side of a WAL file. A given file is never written and read
/// through the same handle: use [`Wal::iterator`] or
/// [`super::WalIterator::open`] to replay it.
///
/// # Thread Safety
///
/// `Wal` is safe to share across threads: the file handle sits behind a
/// `Mutex` so concurrent writers are serialised, and the writable-offset
/// counter is a plain atomic so [`Wal::current_writable_offset`] never
/// needs to take that lock.
///
/// # Example
///
/// ```ignore
/// use ferrisdb_storage::wal::{Entry, Wal};
/// use ferrisdb_core::SyncMode;
///
/// let wal = Wal::open(0, "/tmp/ferrisdb".as_ref(), SyncMode::Normal)?;
/// wal.write(&Entry::new(b"key".to_vec(), b"value".to_vec()))?;
/// # Ok::<(), ferrisdb_core::Error>(())
/// ```
pub struct Wal {
    file: Mutex<File>,
    path: PathBuf,
    offset: AtomicU64,
    sync_mode: SyncMode,
}

impl Wal {
    /// Creates (or opens for append) `{directory}/{file_id}.wal`.
    ///
    /// # Arguments
    ///
    /// * `file_id` - identifies which memtable this WAL belongs to; the
    ///   file is named `{file_id}.wal`.
    /// * `directory` - directory the file lives in; created if missing.
    /// * `sync_mode` - durability level applied on every [`Wal::write`].
    ///
    /// # Errors
    ///
    /// Returns an error if `directory` cannot be created or the file
    /// cannot be opened.
    pub fn open(file_id: u64, directory: &Path, sync_mode: SyncMode) -> Result<Self> {
        std::fs::create_dir_all(directory)?;
        let path = wal_path(directory, file_id);
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)?;
        let offset = file.metadata()?.len();
        log::debug!("opened WAL {} at offset {}", path.display(), offset);
        Ok(Self {
            file: Mutex::new(file),
            path,
            offset: AtomicU64::new(offset),
            sync_mode,
        })
    }

    /// Encodes `entry` and appends it. A short write (fewer bytes written
    /// than requested) is reported as [`Error::ShortWrite`] and leaves the
    /// memtable holding this WAL in an undefined state. Durability beyond
    /// that point follows `sync_mode`: `None` leaves bytes in the OS
    /// buffer, `Normal` flushes them out of our own buffer, `Full` also
    /// fsyncs.
    pub fn write(&self, entry: &Entry) -> Result<()> {
        let encoded = entry.encode();
        let mut file = self.file.lock();
        let written = file.write(&encoded)?;
        if written < encoded.len() {
            return Err(Error::ShortWrite(format!(
                "wrote {} of {} bytes to {}",
                written,
                encoded.len(),
                self.path.display()
            )));
        }
        match self.sync_mode {
            SyncMode::None => {}
            SyncMode::Normal => file.flush()?,
            SyncMode::Full => {
                file.flush()?;
                file.sync_all()?;
            }
        }
        self.offset.fetch_add(written as u64, Ordering::Relaxed);
        Ok(())
    }

    /// Sum of bytes successfully written since `open`.
    pub fn current_writable_offset(&self) -> u64 {
        self.offset.load(Ordering::Relaxed)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens a fresh read-only handle over this WAL's file and returns a
    /// streaming [`super::WalIterator`] over it.
    pub fn iterator(&self) -> Result<super::WalIterator> {
        super::WalIterator::open(&self.path)
    }

    /// Best-effort delete of the underlying file.
    pub fn remove(&self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            log::warn!("failed to remove WAL file {}: {e}", self.path.display());
        }
    }
}
