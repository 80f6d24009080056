//! Record layout: `[len: u16 le][payload][0]`.

use bytes::{Buf, BufMut};

/// Bytes taken by the length prefix.
pub const HEADER_LEN: usize = size_of::<u16>();

/// Bytes a record occupies on top of its payload (prefix and terminator).
pub const RECORD_OVERHEAD: usize = HEADER_LEN + 1;

/// Largest payload a record can hold.
pub const MAX_STRING_LEN: usize = u16::MAX as usize;

/// Total arena footprint of a record with `len` payload bytes.
#[inline]
pub(crate) const fn record_size(len: usize) -> usize {
    len + RECORD_OVERHEAD
}

/// Reads the payload length of the record starting at `offset`.
#[inline]
pub(crate) fn read_len(buf: &[u8], offset: usize) -> usize {
    let mut header = &buf[offset..offset + HEADER_LEN];
    header.get_u16_le() as usize
}

/// Writes the length prefix and terminator of a record at `offset`.
///
/// The payload bytes in between are left untouched.
#[inline]
pub(crate) fn write_frame(buf: &mut [u8], offset: usize, len: usize) {
    debug_assert!(len <= MAX_STRING_LEN);
    let mut header = &mut buf[offset..offset + HEADER_LEN];
    header.put_u16_le(len as u16);
    buf[offset + HEADER_LEN + len] = 0;
}
