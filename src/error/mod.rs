//! Error types for strpool.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PoolError>;

/// Errors that can occur during pool operations.
///
/// Every check that can fail runs before the pool writes a single byte, so an
/// `Err` never leaves a record half-written.
#[derive(Debug, Error)]
pub enum PoolError {
    /// The handle was read before ever being written, or exceeds the
    /// configured handle limit.
    #[error("invalid handle: {handle} (limit {limit})")]
    InvalidHandle {
        /// The handle that was rejected.
        handle: usize,
        /// Handles must be strictly below this value.
        limit: usize,
    },

    /// A position or range reached past the end of a string.
    #[error("out of bounds: {end} exceeds length {len}")]
    OutOfBounds {
        /// One past the last byte that was requested.
        end: usize,
        /// Length of the string that was indexed.
        len: usize,
    },

    /// The resulting payload would not fit the 16-bit length field.
    #[error("string too long: {len} bytes (max {max})")]
    StringTooLong {
        /// The length that was attempted.
        len: usize,
        /// The maximum payload length.
        max: usize,
    },

    /// Formatted output overflowed the staging buffer.
    #[error("formatted string too long: more than {max} bytes")]
    FormatTooLong {
        /// Capacity of the staging buffer.
        max: usize,
    },

    /// A buffer could not be allocated.
    #[error("memory allocation failed: {requested} bytes")]
    OutOfMemory {
        /// Size of the allocation that failed, in bytes.
        requested: usize,
    },

    /// A ticket was resolved after the pool moved its records.
    #[error("stale ticket for handle {handle}: issued at generation {issued}, pool is at {current}")]
    StaleTicket {
        /// The handle the ticket was issued for.
        handle: usize,
        /// Generation when the ticket was issued.
        issued: u64,
        /// Generation of the pool now.
        current: u64,
    },

    /// A `Display` impl failed while rendering a formatted write.
    #[error("formatting failed")]
    Fmt(#[source] std::fmt::Error),

    /// Invalid configuration parameter.
    #[error("invalid config: {message}")]
    InvalidConfig {
        /// Description of what was invalid.
        message: &'static str,
    },

    /// An I/O error occurred while writing a string to a sink.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
