//! Sorted block format for eventual on-disk SST storage.
//!
//! A block is a fixed-size buffer (`sstable_block_size_in_bytes`, default
//! 4096) filled with encoded `(VersionedKey, Value)` entries followed by an
//! offset trailer, so a reader can binary-search it without decoding every
//! entry in front of the one it wants.
//!
//! # Entry Format
//!
//! ```text
//! +-------------------+------------------+-----+-------+
//! | 2 bytes entrySize | 2 bytes key size | key | value |
//! +-------------------+------------------+-----+-------+
//! ```
//!
//! `entrySize` is the whole entry's length including its own 4-byte header.
//! `key` is an encoded [`crate::memtable::VersionedKey`]; `value` is an
//! encoded [`crate::memtable::Value`].
//!
//! # Block Format
//!
//! ```text
//! +-------------------+---------------------+--------------------+
//! | Entry1            | Entry2              | Entry3             |
//! +-------------------+---------------------+--------------------+
//! | List of begin offsets for each entry    | Entry count        |
//! | (4 bytes each)                          | (4 bytes)           |
//! +------------------------------------------+--------------------+
//! ```
//!
//! Index blocks, footer blocks, multi-block files, and persisting a block
//! to disk are out of scope here — only the in-memory builder and
//! binary-search iterator are implemented.

use crate::codec;
use crate::memtable::{Value, VersionedKey};
use ferrisdb_core::Result;
use std::cmp::Ordering;

/// `u16 entrySize` + `u16 keySize`.
const ENTRY_HEADER_SIZE: usize = 4;

struct EntryHeader {
    entry_size: u16,
    key_size: u16,
}

impl EntryHeader {
    fn new(key_len: usize, value_len: usize) -> Self {
        Self {
            entry_size: (ENTRY_HEADER_SIZE + key_len + value_len) as u16,
            key_size: key_len as u16,
        }
    }

    fn encode(&self) -> [u8; ENTRY_HEADER_SIZE] {
        let mut buf = [0u8; ENTRY_HEADER_SIZE];
        buf[0..2].copy_from_slice(&self.entry_size.to_le_bytes());
        buf[2..4].copy_from_slice(&self.key_size.to_le_bytes());
        buf
    }

    fn decode_from(buf: &[u8]) -> Result<Self> {
        Ok(Self {
            entry_size: codec::get_u16_le(&buf[0..2])?,
            key_size: codec::get_u16_le(&buf[2..4])?,
        })
    }
}

/// A single fixed-capacity block under construction. Entries are appended
/// in whatever order the caller supplies; a caller building a sorted SST is
/// expected to add entries in key order, but `Block` itself does not check.
pub struct Block {
    buffer: Vec<u8>,
    capacity: usize,
    entry_begin_offsets: Vec<u32>,
    end_offset: usize,
    first_key: Option<VersionedKey>,
}

impl Block {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0u8; capacity],
            capacity,
            entry_begin_offsets: Vec::new(),
            end_offset: 0,
            first_key: None,
        }
    }

    pub fn first_key(&self) -> Option<&VersionedKey> {
        self.first_key.as_ref()
    }

    pub fn len(&self) -> usize {
        self.entry_begin_offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entry_begin_offsets.is_empty()
    }

    fn would_overflow(&self, key: &VersionedKey, value: &Value) -> bool {
        let entry_len = ENTRY_HEADER_SIZE + key.size() + value.size();
        let trailer_len = (self.entry_begin_offsets.len() + 1) * 4 + 4;
        self.end_offset + entry_len + trailer_len > self.capacity
    }

    fn append(&mut self, part: &[u8]) {
        let start = self.end_offset;
        self.end_offset += part.len();
        self.buffer[start..self.end_offset].copy_from_slice(part);
    }
}

/// Appends entries to a [`Block`], finishing it with the offset trailer
/// once full or once the caller is done.
pub struct BlockBuilder {
    block: Block,
}

impl BlockBuilder {
    pub fn new(block_size_in_bytes: usize) -> Self {
        Self {
            block: Block::new(block_size_in_bytes),
        }
    }

    /// Returns `false` without mutating the block if appending `(key,
    /// value)` would overflow its fixed capacity — the caller should
    /// finish this block and start a fresh one.
    pub fn add(&mut self, key: VersionedKey, value: Value) -> bool {
        if self.block.would_overflow(&key, &value) {
            return false;
        }
        let encoded_key = key.encode();
        let encoded_value = value.encode();
        if self.block.first_key.is_none() {
            self.block.first_key = Some(key);
        }
        self.block
            .entry_begin_offsets
            .push(self.block.end_offset as u32);
        let header = EntryHeader::new(encoded_key.len(), encoded_value.len());
        self.block.append(&header.encode());
        self.block.append(&encoded_key);
        self.block.append(&encoded_value);
        true
    }

    /// Writes the offset trailer and returns the finished block, truncated
    /// to exactly the bytes written.
    pub fn finish(mut self) -> Block {
        let entry_count = self.block.entry_begin_offsets.len() as u32;
        for offset in &self.block.entry_begin_offsets {
            self.block.append(&offset.to_le_bytes());
        }
        self.block.append(&entry_count.to_le_bytes());
        self.block.buffer.truncate(self.block.end_offset);
        self.block
    }
}

/// Binary-search iterator over a finished [`Block`].
pub struct BlockIterator<'a> {
    block: &'a Block,
    key: Option<VersionedKey>,
    value: Option<Value>,
}

impl<'a> BlockIterator<'a> {
    pub fn new(block: &'a Block) -> Self {
        Self {
            block,
            key: None,
            value: None,
        }
    }

    pub fn key(&self) -> Option<&VersionedKey> {
        self.key.as_ref()
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn is_valid(&self) -> bool {
        self.key.is_some()
    }

    /// Positions at the smallest entry whose key compares `>= target`, or
    /// invalidates the iterator if every entry in the block compares
    /// smaller than `target`.
    pub fn seek(&mut self, target: &VersionedKey) {
        let total = self.block.entry_begin_offsets.len();
        let mut lo = 0usize;
        let mut hi = total;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            self.initialize_at(mid);
            let found = self
                .key
                .as_ref()
                .expect("mid is within bounds so initialize_at always sets key");
            if found.compare(target) != Ordering::Less {
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }
        self.initialize_at(lo);
    }

    fn initialize_at(&mut self, index: usize) {
        if index >= self.block.entry_begin_offsets.len() {
            self.key = None;
            self.value = None;
            return;
        }
        let entry_begin_offset = self.block.entry_begin_offsets[index] as usize;
        let header = EntryHeader::decode_from(&self.block.buffer[entry_begin_offset..])
            .expect("a block's own buffer always holds a well-formed header at a recorded offset");
        let entry_end = entry_begin_offset + header.entry_size as usize;
        let key_value_bytes = &self.block.buffer[entry_begin_offset..entry_end];
        let key_start = ENTRY_HEADER_SIZE;
        let key_end = key_start + header.key_size as usize;
        let key = VersionedKey::decode(&key_value_bytes[key_start..key_end])
            .expect("a block's own buffer always holds a well-formed key at a recorded offset");
        let value = Value::decode(&key_value_bytes[key_end..])
            .expect("a block's own buffer always holds a well-formed value at a recorded offset");
        self.key = Some(key);
        self.value = Some(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kv(key: &[u8], version: u64, value: &[u8]) -> (VersionedKey, Value) {
        (
            VersionedKey::new(key.to_vec(), version),
            Value::new(value.to_vec()),
        )
    }

    #[test]
    fn builds_and_iterates_entries_in_insertion_order() {
        let mut builder = BlockBuilder::new(4096);
        let (k1, v1) = kv(b"HDD", 1, b"Hard disk");
        let (k2, v2) = kv(b"SSD", 1, b"Solid state");
        assert!(builder.add(k1.clone(), v1));
        assert!(builder.add(k2, v2));
        let block = builder.finish();

        assert_eq!(block.len(), 2);
        assert_eq!(block.first_key(), Some(&k1));

        let mut iter = BlockIterator::new(&block);
        iter.seek(&VersionedKey::new(b"HDD".to_vec(), 1));
        assert!(iter.is_valid());
        assert_eq!(iter.key().unwrap().key(), b"HDD");
        assert_eq!(iter.value().unwrap().bytes(), b"Hard disk");
    }

    #[test]
    fn seek_finds_the_smallest_key_greater_or_equal() {
        let mut builder = BlockBuilder::new(4096);
        let (k1, v1) = kv(b"a", 1, b"1");
        let (k2, v2) = kv(b"c", 1, b"3");
        let (k3, v3) = kv(b"e", 1, b"5");
        builder.add(k1, v1);
        builder.add(k2, v2);
        builder.add(k3, v3);
        let block = builder.finish();

        let mut iter = BlockIterator::new(&block);
        iter.seek(&VersionedKey::new(b"b".to_vec(), 1));
        assert!(iter.is_valid());
        assert_eq!(iter.key().unwrap().key(), b"c");
        assert_eq!(iter.value().unwrap().bytes(), b"3");
    }

    #[test]
    fn seek_past_the_last_key_is_invalid() {
        let mut builder = BlockBuilder::new(4096);
        let (k1, v1) = kv(b"a", 1, b"1");
        builder.add(k1, v1);
        let block = builder.finish();

        let mut iter = BlockIterator::new(&block);
        iter.seek(&VersionedKey::new(b"z".to_vec(), 1));
        assert!(!iter.is_valid());
    }

    #[test]
    fn add_refuses_once_the_block_would_overflow_its_capacity() {
        let mut builder = BlockBuilder::new(32);
        let mut added = 0;
        for i in 0..100u64 {
            let (key, value) = kv(b"k", i, b"some value bytes");
            if builder.add(key, value) {
                added += 1;
            } else {
                break;
            }
        }
        assert!(added < 100);
        assert!(added >= 1);
    }
}
