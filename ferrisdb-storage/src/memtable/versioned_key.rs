//! MVCC key: a raw user key paired with a commit timestamp.
//!
//! `VersionedKey` is the key type stored in the skip list. Ordering is
//! lexicographic on the raw key first, then ascending on the version, so a
//! forward scan of a single user key visits its versions oldest-first.

use crate::codec;
use ferrisdb_core::{Key, Result, Timestamp};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedKey {
    key: Key,
    version: Timestamp,
}

impl VersionedKey {
    pub fn new(key: Key, version: Timestamp) -> Self {
        Self { key, version }
    }

    /// The sentinel key used for the skip list's head node: empty key,
    /// version 0, sorts before every real entry.
    pub fn sentinel() -> Self {
        Self {
            key: Vec::new(),
            version: 0,
        }
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn version(&self) -> Timestamp {
        self.version
    }

    /// Lexicographic on `key`, then ascending on `version`.
    pub fn compare(&self, other: &Self) -> Ordering {
        match self.key.cmp(&other.key) {
            Ordering::Equal => self.version.cmp(&other.version),
            ord => ord,
        }
    }

    /// True iff the raw key bytes match exactly (version is ignored).
    pub fn matches_key_prefix(&self, raw: &[u8]) -> bool {
        self.key.as_slice() == raw
    }

    /// `len(key) + 8`, used for memtable size accounting.
    pub fn size(&self) -> usize {
        self.key.len() + 8
    }

    /// Encodes as `version: u64 LE || key bytes`. Length framing is external
    /// (the WAL header carries it).
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(8 + self.key.len());
        codec::put_u64_le(&mut buf, self.version);
        buf.extend_from_slice(&self.key);
        buf
    }

    /// Decodes a `version || key` buffer produced by [`Self::encode`].
    /// Fails with [`ferrisdb_core::Error::Decode`] if shorter than 8 bytes.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let version = codec::get_u64_le(buf)?;
        let key = buf[8..].to_vec();
        Ok(Self { key, version })
    }
}
