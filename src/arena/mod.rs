//! The arena: one contiguous buffer of length-prefixed records.
//!
//! Offset 0 always holds the sentinel, an empty record shared by every empty
//! handle. Records are appended at `data_size`; bytes of records that were
//! erased, relocated or shrunk stay behind as garbage until the next
//! compaction copies the live records into a fresh arena.
//!
//! The arena only does the byte bookkeeping. Which record goes where is
//! decided by the allocation policy in [`crate::pool`].

mod record;

pub use record::{HEADER_LEN, MAX_STRING_LEN, RECORD_OVERHEAD};
pub(crate) use record::record_size;

use std::fmt;
use std::ops::Range;

use crate::error::{PoolError, Result};
use crate::table::Offset;

/// Offset of the shared empty record.
pub(crate) const SENTINEL: usize = 0;

pub(crate) struct Arena {
    /// Fully initialized; `buf.len()` is the capacity.
    buf: Vec<u8>,
    /// Bytes in use, garbage included.
    data_size: usize,
    /// Bytes owned by no handle.
    garbage_size: usize,
    /// Offset of the most recently appended record.
    top: usize,
}

impl Arena {
    /// An arena with no buffer behind it.
    pub(crate) const fn unallocated() -> Self {
        Self {
            buf: Vec::new(),
            data_size: 0,
            garbage_size: 0,
            top: SENTINEL,
        }
    }

    /// Allocates a zeroed arena of `capacity` bytes holding only the sentinel.
    pub(crate) fn with_capacity(capacity: usize) -> Result<Self> {
        let capacity = capacity.max(RECORD_OVERHEAD);
        if capacity > Offset::MAX as usize {
            return Err(PoolError::OutOfMemory {
                requested: capacity,
            });
        }

        let mut buf = Vec::new();
        buf.try_reserve_exact(capacity)
            .map_err(|_| PoolError::OutOfMemory {
                requested: capacity,
            })?;
        buf.resize(capacity, 0);

        // A zeroed buffer already spells the sentinel: length 0, terminator 0.
        Ok(Self {
            buf,
            data_size: RECORD_OVERHEAD,
            garbage_size: 0,
            top: SENTINEL,
        })
    }

    pub(crate) fn is_allocated(&self) -> bool {
        !self.buf.is_empty()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub(crate) fn data_size(&self) -> usize {
        self.data_size
    }

    pub(crate) fn garbage_size(&self) -> usize {
        self.garbage_size
    }

    /// Bytes held by reachable records, sentinel included.
    pub(crate) fn live_bytes(&self) -> usize {
        self.data_size - self.garbage_size
    }

    /// Bytes a compacted copy of this arena would occupy.
    pub(crate) fn footprint(&self) -> usize {
        self.live_bytes().max(RECORD_OVERHEAD)
    }

    pub(crate) fn top(&self) -> usize {
        self.top
    }

    /// Whether `additional` more bytes fit after `data_size`.
    pub(crate) fn has_room(&self, additional: usize) -> bool {
        self.data_size + additional <= self.capacity()
    }

    /// Payload length of the record at `offset`.
    pub(crate) fn len_at(&self, offset: usize) -> usize {
        if offset == SENTINEL {
            return 0;
        }
        record::read_len(&self.buf, offset)
    }

    /// Byte range of the payload of the record at `offset`.
    pub(crate) fn payload_range(&self, offset: usize) -> Range<usize> {
        let start = offset + HEADER_LEN;
        start..start + self.len_at(offset)
    }

    pub(crate) fn payload(&self, offset: usize) -> &[u8] {
        if offset == SENTINEL {
            return &[];
        }
        &self.buf[self.payload_range(offset)]
    }

    pub(crate) fn payload_mut(&mut self, offset: usize) -> &mut [u8] {
        let range = self.payload_range(offset);
        &mut self.buf[range]
    }

    /// Raw arena bytes.
    pub(crate) fn bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Reserves a record of `size` bytes at the end and makes it the top.
    ///
    /// Capacity must have been checked by the caller.
    pub(crate) fn push_record(&mut self, size: usize) -> usize {
        debug_assert!(self.has_room(size));
        let offset = self.data_size;
        self.top = offset;
        self.data_size += size;
        offset
    }

    /// Resizes the top record in place to `size` bytes.
    pub(crate) fn resize_top(&mut self, size: usize) {
        debug_assert!(self.top + size <= self.capacity());
        self.data_size = self.top + size;
    }

    pub(crate) fn add_garbage(&mut self, bytes: usize) {
        self.garbage_size += bytes;
        debug_assert!(self.garbage_size <= self.data_size);
    }

    /// Copies `src` into the arena at `dest`.
    pub(crate) fn write_at(&mut self, dest: usize, src: &[u8]) {
        self.buf[dest..dest + src.len()].copy_from_slice(src);
    }

    /// Copies a range of the arena onto itself. Overlap is allowed.
    pub(crate) fn copy_within(&mut self, src: Range<usize>, dest: usize) {
        self.buf.copy_within(src, dest);
    }

    /// Stamps the length prefix and terminator of the record at `offset`.
    pub(crate) fn frame(&mut self, offset: usize, len: usize) {
        record::write_frame(&mut self.buf, offset, len);
    }

    /// Appends a copy of the whole record at `offset` of `from`.
    ///
    /// Used by compaction; capacity must have been checked by the caller.
    pub(crate) fn copy_record_from(&mut self, from: &Arena, offset: usize) -> usize {
        let size = record_size(from.len_at(offset));
        let dest = self.push_record(size);
        self.buf[dest..dest + size].copy_from_slice(&from.buf[offset..offset + size]);
        dest
    }

    /// Forgets every record but the sentinel. Capacity is kept.
    pub(crate) fn clear(&mut self) {
        if self.is_allocated() {
            self.data_size = RECORD_OVERHEAD;
        }
        self.garbage_size = 0;
        self.top = SENTINEL;
    }
}

impl fmt::Debug for Arena {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Arena")
            .field("capacity", &self.capacity())
            .field("data_size", &self.data_size)
            .field("garbage_size", &self.garbage_size)
            .field("top", &self.top)
            .finish()
    }
}
