//! Bounded staging buffer for formatted writes, recycled per thread.

use std::cell::RefCell;
use std::fmt;

use crate::error::{PoolError, Result};

/// Capacity reserved for a fresh staging buffer.
pub const DEFAULT_BUFFER_SIZE: usize = 1024;

/// Maximum number of buffers to keep per thread.
pub const MAX_POOL_SIZE: usize = 4;

/// Formatted output rendered into a bounded buffer, ready to be stored.
///
/// The bytes are produced before the destination pool is touched, so the
/// format arguments may borrow from that same pool:
///
/// ```
/// use strpool::{Pool, Staged};
///
/// let mut pool = Pool::new();
/// pool.assign(0, b"world")?;
///
/// let staged = Staged::new(80, format_args!(
///     "hello {}",
///     String::from_utf8_lossy(pool.get(0)?)
/// ))?;
/// pool.assign(1, staged.as_bytes())?;
///
/// assert_eq!(pool.get(1)?, b"hello world");
/// # Ok::<(), strpool::PoolError>(())
/// ```
pub struct Staged {
    data: Vec<u8>,
    limit: usize,
    overflowed: bool,
}

impl Staged {
    /// Renders `args`, failing if the output exceeds `limit` bytes.
    ///
    /// # Errors
    ///
    /// [`PoolError::FormatTooLong`] on overflow, [`PoolError::Fmt`] if a
    /// `Display` impl reports an error of its own.
    pub fn new(limit: usize, args: fmt::Arguments<'_>) -> Result<Self> {
        let mut staged = Self::take(limit);
        match fmt::Write::write_fmt(&mut staged, args) {
            Ok(()) => Ok(staged),
            Err(_) if staged.overflowed => Err(PoolError::FormatTooLong { max: limit }),
            Err(e) => Err(PoolError::Fmt(e)),
        }
    }

    /// Takes a buffer from the thread-local pool or creates a new one.
    fn take(limit: usize) -> Self {
        let data = THREAD_BUFFER_POOL
            .with(|pool| pool.borrow_mut().pop())
            .unwrap_or_else(|| Vec::with_capacity(DEFAULT_BUFFER_SIZE.min(limit)));
        Self {
            data,
            limit,
            overflowed: false,
        }
    }

    /// The rendered bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Length of the rendered output.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if nothing was rendered.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Write for Staged {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        if self.data.len() + s.len() > self.limit {
            self.overflowed = true;
            return Err(fmt::Error);
        }
        self.data.extend_from_slice(s.as_bytes());
        Ok(())
    }
}

impl fmt::Debug for Staged {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Staged")
            .field("len", &self.data.len())
            .field("limit", &self.limit)
            .finish()
    }
}

impl Drop for Staged {
    fn drop(&mut self) {
        // Return the buffer to the pool if it's not too large
        if self.data.capacity() <= DEFAULT_BUFFER_SIZE * 2 {
            self.data.clear();
            THREAD_BUFFER_POOL.with(|pool| {
                let mut pool = pool.borrow_mut();
                if pool.len() < MAX_POOL_SIZE {
                    pool.push(std::mem::take(&mut self.data));
                }
            });
        }
    }
}

// Thread-local buffer pool
thread_local! {
    static THREAD_BUFFER_POOL: RefCell<Vec<Vec<u8>>> = const { RefCell::new(Vec::new()) };
}
