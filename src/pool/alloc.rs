//! Allocation policy: decide where a write lands.
//!
//! For a handle `h` receiving `len` payload bytes:
//!
//! 1. `h` is empty: append a new record at the tail.
//! 2. `h` is the top record: grow or shrink it in place. If it no longer
//!    fits, compact with `h` copied last so it is still on top afterwards.
//! 3. `h`'s record is large enough: overwrite it in place. The unused rest of
//!    the old record is counted as garbage right away.
//! 4. Otherwise the old record becomes garbage and a new one is appended,
//!    compacting first if the arena is full.
//!
//! Rules 2 and 3 keep incremental building and same-size overwrites away from
//! the O(n) compactor.
//!
//! Writes whose bytes come from the pool itself capture those bytes as arena
//! ranges before allocating. If the allocation compacted, the previous arena
//! is parked in `retired` and the ranges are read from there; it is dropped as
//! soon as the write is done.

use crate::arena::{HEADER_LEN, MAX_STRING_LEN, SENTINEL, record_size};
use crate::error::{PoolError, Result};

use super::Pool;
use super::compact::Keep;

/// One piece of the payload of a write.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Source<'a> {
    /// Bytes from outside the pool.
    External(&'a [u8]),
    /// Bytes `start..start + len` of the arena as it was before allocating.
    Stored { start: usize, len: usize },
}

impl Source<'_> {
    fn len(&self) -> usize {
        match *self {
            Source::External(bytes) => bytes.len(),
            Source::Stored { len, .. } => len,
        }
    }
}

impl Pool {
    /// Stores the concatenation of `parts` as the content of `handle`.
    pub(super) fn write(&mut self, handle: usize, parts: &[Source<'_>]) -> Result<()> {
        self.check_writable(handle)?;

        let len = parts
            .iter()
            .fold(0usize, |total, part| total.saturating_add(part.len()));
        if len > MAX_STRING_LEN {
            return Err(PoolError::StringTooLong {
                len,
                max: MAX_STRING_LEN,
            });
        }

        let count = self.table.count();
        self.table.ensure(handle, self.config.handle_slack())?;

        if len == 0 {
            self.erase(handle);
            return Ok(());
        }

        let offset = match self.allocate(handle, len) {
            Ok(offset) => offset,
            Err(e) => {
                self.table.restore_count(count);
                return Err(e);
            }
        };

        let mut cursor = offset + HEADER_LEN;
        for part in parts {
            match *part {
                Source::External(bytes) => self.arena.write_at(cursor, bytes),
                Source::Stored { len: 0, .. } => {}
                Source::Stored { start, len } => match &self.retired {
                    Some(old) => self.arena.write_at(cursor, &old.bytes()[start..start + len]),
                    None => self.arena.copy_within(start..start + len, cursor),
                },
            }
            cursor += part.len();
        }
        self.arena.frame(offset, len);

        // The copy is done; nothing can point into the old arena any more.
        self.retired = None;
        Ok(())
    }

    /// Reserves room for a `len`-byte payload for `handle` and returns the
    /// record offset. `handle` must be addressable and `len` non-zero.
    fn allocate(&mut self, handle: usize, len: usize) -> Result<usize> {
        debug_assert!(self.retired.is_none());
        let size = record_size(len);
        let current = self.table.get(handle).unwrap_or(SENTINEL);

        if current != SENTINEL {
            let old_size = record_size(self.arena.len_at(current));

            if current == self.arena.top() {
                if current + size > self.arena.capacity() {
                    let needed = self.arena.live_bytes() - old_size + size;
                    self.retired = Some(self.compact_into(needed, Keep::PinLast(handle))?);
                }
                self.arena.resize_top(size);
                return Ok(self.arena.top());
            }

            if old_size >= size {
                self.arena.add_garbage(old_size - size);
                return Ok(current);
            }

            if self.arena.has_room(size) {
                self.arena.add_garbage(old_size);
            } else {
                let needed = self.arena.live_bytes() - old_size + size;
                self.retired = Some(self.compact_into(needed, Keep::Drop(handle))?);
            }
            self.generation += 1;
        } else if !self.arena.has_room(size) {
            let needed = self.arena.footprint() + size;
            self.retired = Some(self.compact_into(needed, Keep::All)?);
        }

        let offset = self.arena.push_record(size);
        self.table.set(handle, offset);
        Ok(offset)
    }

    /// Turns `handle`'s record into garbage and points it at the sentinel.
    pub(super) fn erase(&mut self, handle: usize) {
        match self.table.get(handle) {
            Some(offset) if offset != SENTINEL => {
                let size = record_size(self.arena.len_at(offset));
                self.arena.add_garbage(size);
                self.table.set(handle, SENTINEL);
                self.generation += 1;
            }
            _ => {}
        }
    }
}
