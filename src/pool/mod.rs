//! The string pool: handle-addressed byte strings in one compacting arena.
//!
//! - [`Pool`] - Owns the arena and the handle table, exposes the handle API
//! - [`PoolStats`] - Snapshot of the pool's byte accounting
//! - [`Ticket`] - Checked reference to a handle that detects relocation
//!
//! # Example
//!
//! ```
//! use strpool::Pool;
//!
//! let mut pool = Pool::new();
//! pool.assign(4, b"Hello ")?;
//! pool.append(4, b"Dolly")?;
//! pool.copy(5, 4)?;
//!
//! assert_eq!(pool.get(5)?, b"Hello Dolly");
//! assert_eq!(pool.find(5, b"Doll")?, Some(6));
//! assert_eq!(pool.count(), 6);
//! # Ok::<(), strpool::PoolError>(())
//! ```

mod alloc;
mod compact;

use std::cmp::Ordering;
use std::fmt;
use std::io;

use bytes::Bytes;

use crate::arena::{Arena, HEADER_LEN, SENTINEL};
use crate::buffer::Staged;
use crate::config::PoolConfig;
use crate::entry::Entry;
use crate::error::{PoolError, Result};
use crate::table::HandleTable;
use crate::util;

use alloc::Source;

/// A pool of variable-length byte strings addressed by integer handles.
///
/// All strings live back to back in a single arena. Handles are chosen by
/// the caller and need not be dense: writing handle 20 makes handles 0
/// through 19 readable as empty strings. Space is reclaimed by compaction,
/// which happens only when a write does not fit.
///
/// # Borrowing
///
/// Slices returned by [`Pool::get`] borrow the pool, so they cannot outlive a
/// write that might move the strings. Code that needs to remember a string
/// across writes keeps its handle, or a [`Ticket`] when it must detect that
/// the pool moved records in between.
///
/// # Thread Safety
///
/// A pool is owned by one thread at a time. Every mutation takes `&mut self`;
/// no internal synchronization exists.
pub struct Pool {
    arena: Arena,
    /// Arena replaced by a compaction during the current write.
    retired: Option<Arena>,
    table: HandleTable,
    config: PoolConfig,
    generation: u64,
    compactions: u64,
}

/// Byte accounting of a [`Pool`] at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    /// Arena capacity in bytes.
    pub capacity: usize,
    /// Arena bytes in use, garbage included.
    pub data_size: usize,
    /// Arena bytes owned by no handle.
    pub garbage_size: usize,
    /// `data_size - garbage_size`.
    pub live_bytes: usize,
    /// 1 + highest handle ever written.
    pub handles: usize,
    /// Allocated handle slots.
    pub handle_capacity: usize,
    /// Compactions performed so far.
    pub compactions: u64,
    /// Current generation.
    pub generation: u64,
}

/// A checked reference to a handle.
///
/// A ticket remembers the pool generation it was issued at. The generation
/// advances whenever records move or disappear: compaction, relocation,
/// erasure, [`Pool::clear`] and [`Pool::release`]. [`Pool::resolve`] refuses
/// tickets from an older generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    handle: usize,
    generation: u64,
}

impl Ticket {
    /// The handle this ticket refers to.
    pub fn handle(&self) -> usize {
        self.handle
    }

    /// Generation the ticket was issued at.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Pool {
    /// Creates an empty pool with the default configuration.
    ///
    /// Nothing is allocated until the first write.
    pub const fn new() -> Self {
        Self::from_config(PoolConfig::DEFAULT)
    }

    /// Creates an empty pool with a custom configuration.
    ///
    /// # Errors
    ///
    /// [`PoolError::InvalidConfig`] if `config` does not validate.
    pub fn with_config(config: PoolConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_config(config))
    }

    const fn from_config(config: PoolConfig) -> Self {
        Self {
            arena: Arena::unallocated(),
            retired: None,
            table: HandleTable::new(),
            config,
            generation: 0,
            compactions: 0,
        }
    }

    /// Returns the configuration used by this pool.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// 1 + the highest handle ever written.
    ///
    /// Every handle below this reads successfully, as an empty string if it
    /// was never assigned.
    pub fn count(&self) -> usize {
        self.table.count()
    }

    /// Current generation, see [`Ticket`].
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns the current byte accounting.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            capacity: self.arena.capacity(),
            data_size: self.arena.data_size(),
            garbage_size: self.arena.garbage_size(),
            live_bytes: self.arena.live_bytes(),
            handles: self.table.count(),
            handle_capacity: self.table.capacity(),
            compactions: self.compactions,
            generation: self.generation,
        }
    }

    /// Iterates over `(handle, bytes)` for every handle below [`Pool::count`].
    ///
    /// ```
    /// use strpool::Pool;
    ///
    /// let mut pool = Pool::new();
    /// pool.assign(1, b"one")?;
    /// let all: Vec<_> = pool.iter().collect();
    /// assert_eq!(all, vec![(0, &b""[..]), (1, &b"one"[..])]);
    /// # Ok::<(), strpool::PoolError>(())
    /// ```
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[u8])> + '_ {
        self.table
            .iter()
            .map(|(handle, offset)| (handle, self.arena.payload(offset)))
    }

    /// Returns an accessor bound to `handle`.
    pub fn entry(&mut self, handle: usize) -> Entry<'_> {
        Entry::new(self, handle)
    }

    //
    // Reads
    //

    /// Offset of a readable handle.
    fn offset(&self, handle: usize) -> Result<usize> {
        self.table.get(handle).ok_or(PoolError::InvalidHandle {
            handle,
            limit: self.table.count(),
        })
    }

    /// Length of the string at `handle`.
    ///
    /// # Errors
    ///
    /// [`PoolError::InvalidHandle`] if `handle >= count()`.
    pub fn len(&self, handle: usize) -> Result<usize> {
        Ok(self.arena.len_at(self.offset(handle)?))
    }

    /// Returns true if the string at `handle` is empty.
    pub fn is_empty(&self, handle: usize) -> Result<bool> {
        Ok(self.offset(handle)? == SENTINEL)
    }

    /// The bytes of the string at `handle`.
    ///
    /// # Errors
    ///
    /// [`PoolError::InvalidHandle`] if `handle >= count()`.
    pub fn get(&self, handle: usize) -> Result<&[u8]> {
        Ok(self.arena.payload(self.offset(handle)?))
    }

    /// An owned copy of the string at `handle`.
    pub fn to_bytes(&self, handle: usize) -> Result<Bytes> {
        self.get(handle).map(Bytes::copy_from_slice)
    }

    /// The byte at position `index` of the string at `handle`.
    ///
    /// # Errors
    ///
    /// [`PoolError::InvalidHandle`] for an unknown handle,
    /// [`PoolError::OutOfBounds`] if `index` is not below the length.
    pub fn byte_at(&self, handle: usize, index: usize) -> Result<u8> {
        let bytes = self.get(handle)?;
        bytes.get(index).copied().ok_or(PoolError::OutOfBounds {
            end: index.saturating_add(1),
            len: bytes.len(),
        })
    }

    /// Position of the first occurrence of `needle` in the string at
    /// `handle`, or `None`. An empty needle matches at 0.
    pub fn find(&self, handle: usize, needle: &[u8]) -> Result<Option<usize>> {
        Ok(util::find_subsequence(self.get(handle)?, needle))
    }

    /// Compares two strings byte-wise.
    pub fn compare(&self, a: usize, b: usize) -> Result<Ordering> {
        Ok(self.get(a)?.cmp(self.get(b)?))
    }

    /// Writes the string at `handle` to `sink` and returns the byte count.
    ///
    /// # Errors
    ///
    /// [`PoolError::InvalidHandle`] for an unknown handle, [`PoolError::Io`]
    /// if the sink fails.
    pub fn write_to<W: io::Write>(&self, handle: usize, mut sink: W) -> Result<usize> {
        let bytes = self.get(handle)?;
        sink.write_all(bytes)?;
        Ok(bytes.len())
    }

    /// Issues a [`Ticket`] for a readable handle.
    pub fn ticket(&self, handle: usize) -> Result<Ticket> {
        self.offset(handle)?;
        Ok(Ticket {
            handle,
            generation: self.generation,
        })
    }

    /// Reads through a ticket.
    ///
    /// # Errors
    ///
    /// [`PoolError::StaleTicket`] if records moved since the ticket was
    /// issued, [`PoolError::InvalidHandle`] if the pool was released.
    pub fn resolve(&self, ticket: &Ticket) -> Result<&[u8]> {
        if ticket.generation != self.generation {
            return Err(PoolError::StaleTicket {
                handle: ticket.handle,
                issued: ticket.generation,
                current: self.generation,
            });
        }
        self.get(ticket.handle)
    }

    //
    // Writes
    //

    fn check_writable(&self, handle: usize) -> Result<()> {
        if handle >= self.config.max_handles() {
            return Err(PoolError::InvalidHandle {
                handle,
                limit: self.config.max_handles(),
            });
        }
        Ok(())
    }

    /// Arena range of a handle's payload, for writes that copy from it.
    fn stored(&self, handle: usize) -> Result<Source<'static>> {
        let (start, len) = self.stored_range(handle)?;
        Ok(Source::Stored { start, len })
    }

    fn stored_range(&self, handle: usize) -> Result<(usize, usize)> {
        let offset = self.offset(handle)?;
        Ok((offset + HEADER_LEN, self.arena.len_at(offset)))
    }

    /// Sets the string at `handle` to `bytes`. Empty `bytes` erase it.
    ///
    /// Handles above `count()` become addressable; the ones in between read
    /// as empty.
    ///
    /// # Errors
    ///
    /// - [`PoolError::InvalidHandle`] if `handle` exceeds the configured limit
    /// - [`PoolError::StringTooLong`] if `bytes` is longer than 65535
    /// - [`PoolError::OutOfMemory`] if the arena cannot grow
    pub fn assign(&mut self, handle: usize, bytes: &[u8]) -> Result<()> {
        self.write(handle, &[Source::External(bytes)])
    }

    /// Sets the string at `handle` to `bytes` up to, not including, the first
    /// zero byte.
    pub fn assign_until_nul(&mut self, handle: usize, bytes: &[u8]) -> Result<()> {
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        self.assign(handle, &bytes[..end])
    }

    /// Appends `bytes` to the string at `handle`.
    ///
    /// Repeated appends to the most recently written handle grow it in place.
    pub fn append(&mut self, handle: usize, bytes: &[u8]) -> Result<()> {
        if bytes.is_empty() {
            return self.touch(handle);
        }
        match self.table.get(handle) {
            Some(_) => {
                let own = self.stored(handle)?;
                self.write(handle, &[own, Source::External(bytes)])
            }
            None => self.assign(handle, bytes),
        }
    }

    /// Sets the string at `dest` to a copy of the string at `src`.
    pub fn copy(&mut self, dest: usize, src: usize) -> Result<()> {
        let source = self.stored(src)?;
        self.write(dest, &[source])
    }

    /// Appends the string at `src` to the string at `dest`. `src` may equal
    /// `dest`.
    pub fn append_from(&mut self, dest: usize, src: usize) -> Result<()> {
        let source = self.stored(src)?;
        match self.table.get(dest) {
            Some(_) => {
                let own = self.stored(dest)?;
                self.write(dest, &[own, source])
            }
            None => self.write(dest, &[source]),
        }
    }

    /// Sets the string at `dest` to `len` bytes of `source` starting at
    /// `start`.
    ///
    /// # Errors
    ///
    /// [`PoolError::OutOfBounds`] if `start + len` exceeds `source.len()`.
    pub fn substring(&mut self, dest: usize, source: &[u8], start: usize, len: usize) -> Result<()> {
        let range = util::checked_range(start, len, source.len())?;
        self.assign(dest, &source[range])
    }

    /// Sets the string at `dest` to `len` bytes of the string at `src`
    /// starting at `start`. `src` may equal `dest`.
    ///
    /// # Errors
    ///
    /// [`PoolError::InvalidHandle`] for an unknown `src`,
    /// [`PoolError::OutOfBounds`] if `start + len` exceeds its length.
    pub fn substring_of(&mut self, dest: usize, src: usize, start: usize, len: usize) -> Result<()> {
        let (base, src_len) = self.stored_range(src)?;
        let range = util::checked_range(start, len, src_len)?;
        self.write(
            dest,
            &[Source::Stored {
                start: base + range.start,
                len: range.len(),
            }],
        )
    }

    /// Overwrites the byte at `index` of the string at `handle`.
    ///
    /// The string never moves, so this cannot fail for lack of memory.
    ///
    /// # Errors
    ///
    /// [`PoolError::InvalidHandle`] for an unknown handle,
    /// [`PoolError::OutOfBounds`] if `index` is not below the length.
    pub fn set_byte(&mut self, handle: usize, index: usize, byte: u8) -> Result<()> {
        let offset = self.offset(handle)?;
        let len = self.arena.len_at(offset);
        if index >= len {
            return Err(PoolError::OutOfBounds {
                end: index.saturating_add(1),
                len,
            });
        }
        self.arena.payload_mut(offset)[index] = byte;
        Ok(())
    }

    /// Sets the string at `handle` to formatted output.
    ///
    /// Output is rendered into a staging buffer of
    /// [`PoolConfig::format_capacity`] bytes first. To format with arguments
    /// borrowed from this same pool, use [`pool_format!`](crate::pool_format).
    ///
    /// # Errors
    ///
    /// [`PoolError::FormatTooLong`] if the output does not fit the staging
    /// buffer; the string at `handle` is left unchanged.
    pub fn format(&mut self, handle: usize, args: fmt::Arguments<'_>) -> Result<()> {
        let staged = Staged::new(self.config.format_capacity(), args)?;
        self.assign(handle, staged.as_bytes())
    }

    /// Makes `handle` addressable without changing its content.
    fn touch(&mut self, handle: usize) -> Result<()> {
        self.check_writable(handle)?;
        self.table.ensure(handle, self.config.handle_slack())
    }

    //
    // Capacity
    //

    /// Ensures that `additional` more bytes of records fit without
    /// compacting.
    pub fn reserve(&mut self, additional: usize) -> Result<()> {
        if self.arena.is_allocated() && self.arena.has_room(additional) {
            return Ok(());
        }
        let needed = self.arena.footprint().saturating_add(additional);
        self.compact_into(needed, compact::Keep::All)?;
        Ok(())
    }

    /// Ensures the handle table has slots for `handles` handles.
    ///
    /// This does not change [`Pool::count`].
    pub fn reserve_handles(&mut self, handles: usize) -> Result<()> {
        if handles > self.config.max_handles() {
            return Err(PoolError::InvalidHandle {
                handle: handles - 1,
                limit: self.config.max_handles(),
            });
        }
        self.table.grow_to(handles, self.config.handle_slack())
    }

    /// Empties every string. Capacity and [`Pool::count`] are kept.
    pub fn clear(&mut self) {
        self.table.clear();
        self.arena.clear();
        self.generation += 1;
    }

    /// Empties the pool and releases both buffers.
    pub fn release(&mut self) {
        self.arena = Arena::unallocated();
        self.retired = None;
        self.table.release();
        self.generation += 1;
        tracing::debug!("pool released");
    }
}

impl Default for Pool {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("arena", &self.arena)
            .field("count", &self.table.count())
            .field("generation", &self.generation)
            .field("compactions", &self.compactions)
            .finish_non_exhaustive()
    }
}
