//! Little-endian primitive packing shared by [`crate::memtable`], [`crate::wal`],
//! and [`crate::sstable`].
//!
//! Every on-disk/on-wire integer in this crate is little-endian; this module
//! is the single place that encodes/decodes them so the framing code in each
//! component only deals with whole records.

use bytes::{Buf, BufMut};
use ferrisdb_core::{Error, Result};

/// Appends `value` to `buf` as 2 little-endian bytes.
pub fn put_u16_le(buf: &mut impl BufMut, value: u16) {
    buf.put_u16_le(value);
}

/// Appends `value` to `buf` as 4 little-endian bytes.
pub fn put_u32_le(buf: &mut impl BufMut, value: u32) {
    buf.put_u32_le(value);
}

/// Appends `value` to `buf` as 8 little-endian bytes.
pub fn put_u64_le(buf: &mut impl BufMut, value: u64) {
    buf.put_u64_le(value);
}

/// Reads a 2-byte little-endian integer, failing with [`Error::Decode`] if
/// fewer than 2 bytes remain.
pub fn get_u16_le(buf: &[u8]) -> Result<u16> {
    if buf.len() < 2 {
        return Err(Error::Decode("expected 2 bytes for u16".to_string()));
    }
    Ok((&buf[..2]).get_u16_le())
}

/// Reads a 4-byte little-endian integer, failing with [`Error::Decode`] if
/// fewer than 4 bytes remain.
pub fn get_u32_le(buf: &[u8]) -> Result<u32> {
    if buf.len() < 4 {
        return Err(Error::Decode("expected 4 bytes for u32".to_string()));
    }
    Ok((&buf[..4]).get_u32_le())
}

/// Reads an 8-byte little-endian integer, failing with [`Error::Decode`] if
/// fewer than 8 bytes remain.
pub fn get_u64_le(buf: &[u8]) -> Result<u64> {
    if buf.len() < 8 {
        return Err(Error::Decode("expected 8 bytes for u64".to_string()));
    }
    Ok((&buf[..8]).get_u64_le())
}
