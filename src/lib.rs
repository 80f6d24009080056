//! strpool
//!
//! A compacting arena for variable-length byte strings.
//!
//! `strpool` stores many small strings back to back in one contiguous buffer
//! and addresses them by integer handles chosen by the caller. It is meant
//! for workloads that create, grow and rewrite lots of short strings, where a
//! heap allocation per string would dominate:
//!
//! - symbol and identifier tables
//! - report and log line builders
//! - interned labels in long-running services
//!
//! The crate intentionally:
//! - does NOT interpret encodings; strings are bytes
//! - does NOT synchronize; a pool belongs to one thread at a time
//! - does NOT hand out references that survive a write
//!
//! Each string is stored as a record `[u16 length][payload][0]`. Offset 0
//! holds an empty sentinel record shared by every empty handle. Appending to
//! the most recently written string grows it in place, an overwrite that fits
//! reuses the old record, and everything else is appended at the tail. Dead records are reclaimed by compaction when a write does
//! not fit, so the arena grows geometrically and compacts O(log n) times.
//!
//! # Example
//!
//! ```
//! use strpool::{Pool, pool_format};
//!
//! let mut pool = Pool::new();
//! pool.assign(4, b"Hello ")?;
//! pool.append(4, b"Dolly")?;
//! pool.copy(5, 4)?;
//! pool.append(4, b"!")?;
//!
//! assert_eq!(pool.get(4)?, b"Hello Dolly!");
//! assert_eq!(pool.get(5)?, b"Hello Dolly");
//! assert_eq!(pool.find(5, b"Doll")?, Some(6));
//!
//! pool.substring_of(7, 4, 6, 5)?;
//! assert_eq!(pool.get(7)?, b"Dolly");
//!
//! pool_format!(pool, 8, "{} has {} bytes", String::from_utf8_lossy(pool.get(7)?), pool.len(7)?)?;
//! assert_eq!(pool.get(8)?, b"Dolly has 5 bytes");
//! # Ok::<(), strpool::PoolError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod arena;
mod config;
mod entry;
mod error;
mod pool;

mod buffer; // internal (thread-local staging reuse)
mod table; // internal handle -> offset map
mod util;

//
// Public surface
//

pub use arena::{HEADER_LEN, MAX_STRING_LEN, RECORD_OVERHEAD};
pub use buffer::Staged;
pub use config::{
    DEFAULT_FORMAT_CAPACITY, DEFAULT_HANDLE_SLACK, DEFAULT_INITIAL_CAPACITY, DEFAULT_MAX_HANDLES,
    PoolConfig,
};
pub use entry::Entry;
pub use error::{PoolError, Result};
pub use pool::{Pool, PoolStats, Ticket};

/// Formats into a pool handle.
///
/// Unlike [`Pool::format`], the arguments may borrow from the same pool: the
/// output is rendered into a [`Staged`] buffer before the pool is borrowed
/// mutably. Evaluates to [`Result<()>`](crate::Result).
///
/// ```
/// use strpool::{Pool, pool_format};
///
/// let mut pool = Pool::new();
/// pool.assign(0, b"x")?;
/// pool_format!(pool, 0, "{}{}", pool.len(0)?, String::from_utf8_lossy(pool.get(0)?))?;
/// assert_eq!(pool.get(0)?, b"1x");
/// # Ok::<(), strpool::PoolError>(())
/// ```
#[macro_export]
macro_rules! pool_format {
    ($pool:expr, $handle:expr, $($arg:tt)*) => {{
        // Borrows taken by the arguments end with this statement.
        let staged = $crate::Staged::new($pool.config().format_capacity(), ::std::format_args!($($arg)*));
        match staged {
            ::std::result::Result::Ok(staged) => $pool.assign($handle, staged.as_bytes()),
            ::std::result::Result::Err(e) => ::std::result::Result::Err(e),
        }
    }};
}
