//! WAL record framing: an 8-byte header followed by key and value bytes.
//!
//! ```text
//! +----------------+------------------+-----+-------+
//! | keyLength (4B) | valueLength (4B) | key | value |
//! +----------------+------------------+-----+-------+
//! ```
//!
//! Keys written by the memtable are encoded `VersionedKey`s; values are
//! encoded `Value`s. The WAL itself is agnostic to that — it only frames
//! two opaque byte strings.

use crate::codec;
use ferrisdb_core::Result;
use std::io::Read;

const HEADER_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    key: Vec<u8>,
    value: Vec<u8>,
}

impl Entry {
    pub fn new(key: Vec<u8>, value: Vec<u8>) -> Self {
        Self { key, value }
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn into_parts(self) -> (Vec<u8>, Vec<u8>) {
        (self.key, self.value)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(HEADER_LEN + self.key.len() + self.value.len());
        codec::put_u32_le(&mut buf, self.key.len() as u32);
        codec::put_u32_le(&mut buf, self.value.len() as u32);
        buf.extend_from_slice(&self.key);
        buf.extend_from_slice(&self.value);
        buf
    }

    /// Decodes a full `header || key || value` buffer produced by
    /// [`Self::encode`]. Used by tests asserting the round-trip law; the
    /// streaming reader in [`crate::wal::WalIterator`] decodes the header
    /// and body separately instead, since it reads from a file.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let key_len = codec::get_u32_le(&buf[0..4])? as usize;
        let value_len = codec::get_u32_le(&buf[4..8])? as usize;
        if buf.len() < HEADER_LEN + key_len + value_len {
            return Err(ferrisdb_core::Error::Decode(
                "WAL entry shorter than its header declares".to_string(),
            ));
        }
        let key = buf[HEADER_LEN..HEADER_LEN + key_len].to_vec();
        let value = buf[HEADER_LEN + key_len..HEADER_LEN + key_len + value_len].to_vec();
        Ok(Self { key, value })
    }

    /// Reads one entry from a streaming reader: the 8-byte header first,
    /// then `key_length` and `value_length` bytes. Returns `Ok(None)` if
    /// the reader is at a clean end-of-file (zero bytes read for the
    /// header) — this is the WAL's normal end-of-log condition, not an
    /// error. A header that is only partially present, or a key/value
    /// region shorter than the header declares, is a [`Decode`] error: the
    /// log was truncated mid-record and replay should stop here.
    ///
    /// [`Decode`]: ferrisdb_core::Error::Decode
    pub fn decode_from<R: Read>(reader: &mut R) -> Result<Option<Self>> {
        let mut header = [0u8; HEADER_LEN];
        let mut read_so_far = 0;
        loop {
            match reader.read(&mut header[read_so_far..]) {
                Ok(0) => break,
                Ok(n) => read_so_far += n,
                Err(e) => return Err(e.into()),
            }
            if read_so_far == HEADER_LEN {
                break;
            }
        }
        if read_so_far == 0 {
            return Ok(None);
        }
        if read_so_far < HEADER_LEN {
            return Err(ferrisdb_core::Error::Decode(
                "WAL header truncated".to_string(),
            ));
        }

        let key_len = codec::get_u32_le(&header[0..4])? as usize;
        let value_len = codec::get_u32_le(&header[4..8])? as usize;

        let mut key = vec![0u8; key_len];
        reader
            .read_exact(&mut key)
            .map_err(|_| ferrisdb_core::Error::Decode("WAL key truncated".to_string()))?;
        let mut value = vec![0u8; value_len];
        reader
            .read_exact(&mut value)
            .map_err(|_| ferrisdb_core::Error::Decode("WAL value truncated".to_string()))?;

        Ok(Some(Self { key, value }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trips() {
        let entry = Entry::new(b"user:123".to_vec(), b"John Doe".to_vec());
        assert_eq!(Entry::decode(&entry.encode()).unwrap(), entry);
    }

    #[test]
    fn decode_from_reads_exactly_one_entry_and_reports_clean_eof() {
        let entry = Entry::new(b"HDD".to_vec(), b"Hard disk".to_vec());
        let mut cursor = std::io::Cursor::new(entry.encode());

        let decoded = Entry::decode_from(&mut cursor).unwrap().unwrap();
        assert_eq!(decoded, entry);
        assert!(Entry::decode_from(&mut cursor).unwrap().is_none());
    }

    #[test]
    fn decode_from_rejects_truncated_record() {
        let entry = Entry::new(b"HDD".to_vec(), b"Hard disk".to_vec());
        let mut encoded = entry.encode();
        encoded.truncate(encoded.len() - 2);
        let mut cursor = std::io::Cursor::new(encoded);

        assert!(Entry::decode_from(&mut cursor).is_err());
    }
}
