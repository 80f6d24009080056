//! Handle-bound accessor.
//!
//! [`Entry`] pins one handle of a [`Pool`] and exposes the per-string
//! operations without repeating the handle on every call. It holds the pool
//! mutably, so no other borrow of the pool can exist while it is alive.

use std::fmt;
use std::io;

use bytes::Bytes;

use crate::error::Result;
use crate::pool::{Pool, Ticket};

/// Mutable view of a single handle.
///
/// Reads on a handle that was never written fail with
/// [`PoolError::InvalidHandle`](crate::PoolError::InvalidHandle), exactly as
/// on the pool. The first write makes the handle addressable.
///
/// # Example
///
/// ```
/// use strpool::Pool;
///
/// let mut pool = Pool::new();
/// let mut greeting = pool.entry(0);
/// greeting.assign(b"Hello ")?;
/// greeting.append(b"Dolly")?;
/// greeting.set_byte(6, b'M')?;
///
/// assert_eq!(greeting.as_bytes()?, b"Hello Molly");
/// assert_eq!(greeting.find(b"Mol")?, Some(6));
/// # Ok::<(), strpool::PoolError>(())
/// ```
pub struct Entry<'a> {
    pool: &'a mut Pool,
    handle: usize,
}

impl<'a> Entry<'a> {
    pub(crate) fn new(pool: &'a mut Pool, handle: usize) -> Self {
        Self { pool, handle }
    }

    /// The handle this entry is bound to.
    pub fn handle(&self) -> usize {
        self.handle
    }

    /// Length of the string.
    pub fn len(&self) -> Result<usize> {
        self.pool.len(self.handle)
    }

    /// Returns true if the string is empty.
    pub fn is_empty(&self) -> Result<bool> {
        self.pool.is_empty(self.handle)
    }

    /// The bytes of the string.
    pub fn as_bytes(&self) -> Result<&[u8]> {
        self.pool.get(self.handle)
    }

    /// An owned copy of the string.
    pub fn to_bytes(&self) -> Result<Bytes> {
        self.pool.to_bytes(self.handle)
    }

    /// The byte at `index`.
    pub fn byte_at(&self, index: usize) -> Result<u8> {
        self.pool.byte_at(self.handle, index)
    }

    /// Position of the first occurrence of `needle`.
    pub fn find(&self, needle: &[u8]) -> Result<Option<usize>> {
        self.pool.find(self.handle, needle)
    }

    /// Writes the string to `sink`.
    pub fn write_to<W: io::Write>(&self, sink: W) -> Result<usize> {
        self.pool.write_to(self.handle, sink)
    }

    /// Issues a [`Ticket`] for this handle.
    pub fn ticket(&self) -> Result<Ticket> {
        self.pool.ticket(self.handle)
    }

    /// Replaces the string with `bytes`.
    pub fn assign(&mut self, bytes: &[u8]) -> Result<()> {
        self.pool.assign(self.handle, bytes)
    }

    /// Replaces the string with `bytes` up to the first zero byte.
    pub fn assign_until_nul(&mut self, bytes: &[u8]) -> Result<()> {
        self.pool.assign_until_nul(self.handle, bytes)
    }

    /// Appends `bytes`.
    pub fn append(&mut self, bytes: &[u8]) -> Result<()> {
        self.pool.append(self.handle, bytes)
    }

    /// Overwrites the byte at `index`.
    pub fn set_byte(&mut self, index: usize, byte: u8) -> Result<()> {
        self.pool.set_byte(self.handle, index, byte)
    }

    /// Cuts the string down to `len` bytes starting at `start`.
    pub fn assign_substring(&mut self, start: usize, len: usize) -> Result<()> {
        self.pool.substring_of(self.handle, self.handle, start, len)
    }

    /// Replaces the string with formatted output.
    pub fn format(&mut self, args: fmt::Arguments<'_>) -> Result<()> {
        self.pool.format(self.handle, args)
    }
}

impl fmt::Debug for Entry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("handle", &self.handle)
            .field("len", &self.pool.len(self.handle).ok())
            .finish()
    }
}
