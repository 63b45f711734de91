//! The value half of an MVCC entry: a byte payload plus a tombstone bit.
//!
//! A deleted value carries empty bytes and the tombstone flag set; physical
//! removal never happens inside the memtable, only logical masking.

use ferrisdb_core::Result;

const DELETED_MASK: u8 = 0x01;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value {
    bytes: Vec<u8>,
    deleted: u8,
}

impl Value {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes, deleted: 0 }
    }

    pub fn tombstone() -> Self {
        Self {
            bytes: Vec::new(),
            deleted: DELETED_MASK,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted & DELETED_MASK == DELETED_MASK
    }

    /// `len(bytes) + 1`, used for memtable size accounting.
    pub fn size(&self) -> usize {
        self.bytes.len() + 1
    }

    /// Encodes as `tombstone: u8 || bytes`.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(1 + self.bytes.len());
        buf.push(self.deleted);
        buf.extend_from_slice(&self.bytes);
        buf
    }

    /// Decodes a `tombstone || bytes` buffer produced by [`Self::encode`].
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.is_empty() {
            return Err(ferrisdb_core::Error::Decode(
                "value buffer missing tombstone byte".to_string(),
            ));
        }
        Ok(Self {
            deleted: buf[0],
            bytes: buf[1..].to_vec(),
        })
    }
}
