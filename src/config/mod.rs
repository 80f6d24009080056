//! Configuration for pool growth behavior.
//!
//! [`PoolConfig`] controls how much head-room the pool reserves whenever it
//! grows, how large formatted strings may get, and how many handles a single
//! pool is allowed to address.
//!
//! # Example
//!
//! ```
//! use strpool::PoolConfig;
//!
//! // Custom growth slack
//! let config = PoolConfig::new(16 * 1024, 256, 511)?;
//!
//! // Builder pattern
//! let config = PoolConfig::default()
//!     .with_max_handles(4096)
//!     .with_format_capacity(255);
//! assert!(config.validate().is_ok());
//!
//! # Ok::<(), strpool::PoolError>(())
//! ```

use crate::arena::MAX_STRING_LEN;
use crate::error::{PoolError, Result};

/// Default minimum arena head-room reserved on every compaction (4 KiB).
pub const DEFAULT_INITIAL_CAPACITY: usize = 4 * 1024;

/// Default number of extra handle slots added on every table growth.
pub const DEFAULT_HANDLE_SLACK: usize = 1024;

/// Default capacity of the staging buffer used by formatted writes.
pub const DEFAULT_FORMAT_CAPACITY: usize = 1023;

/// Default upper bound on the number of handles (16 Mi).
pub const DEFAULT_MAX_HANDLES: usize = 16 * 1024 * 1024;

/// Tuning parameters for a [`Pool`](crate::Pool).
///
/// - `initial_capacity` - Bytes of slack added to twice the live size on every
///   compaction. The first write allocates at least this much.
/// - `handle_slack` - Extra slots added to twice the table size whenever the
///   handle table grows.
/// - `format_capacity` - Largest string a formatted write may produce.
/// - `max_handles` - Handles must be strictly below this value.
///
/// All values must be non-zero, and `format_capacity` must fit a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolConfig {
    initial_capacity: usize,
    handle_slack: usize,
    format_capacity: usize,
    max_handles: usize,
}

impl PoolConfig {
    /// The default configuration, usable in `const` contexts.
    pub const DEFAULT: Self = Self {
        initial_capacity: DEFAULT_INITIAL_CAPACITY,
        handle_slack: DEFAULT_HANDLE_SLACK,
        format_capacity: DEFAULT_FORMAT_CAPACITY,
        max_handles: DEFAULT_MAX_HANDLES,
    };

    /// Creates a new configuration with the default handle limit.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfig`] if any value is zero or
    /// `format_capacity` exceeds the maximum string length.
    ///
    /// # Example
    ///
    /// ```
    /// use strpool::PoolConfig;
    ///
    /// let config = PoolConfig::new(8192, 64, 1023)?;
    /// assert_eq!(config.initial_capacity(), 8192);
    /// # Ok::<(), strpool::PoolError>(())
    /// ```
    pub fn new(initial_capacity: usize, handle_slack: usize, format_capacity: usize) -> Result<Self> {
        let config = Self {
            initial_capacity,
            handle_slack,
            format_capacity,
            max_handles: DEFAULT_MAX_HANDLES,
        };
        config.validate()?;
        Ok(config)
    }

    /// Sets the arena growth slack.
    ///
    /// Note: This does not validate the configuration. Use [`PoolConfig::validate`]
    /// to check if the configuration is valid.
    pub fn with_initial_capacity(mut self, bytes: usize) -> Self {
        self.initial_capacity = bytes;
        self
    }

    /// Sets the handle table growth slack.
    pub fn with_handle_slack(mut self, slots: usize) -> Self {
        self.handle_slack = slots;
        self
    }

    /// Sets the staging capacity for formatted writes.
    ///
    /// # Example
    ///
    /// ```
    /// use strpool::PoolConfig;
    ///
    /// let config = PoolConfig::default().with_format_capacity(80);
    /// assert_eq!(config.format_capacity(), 80);
    /// ```
    pub fn with_format_capacity(mut self, bytes: usize) -> Self {
        self.format_capacity = bytes;
        self
    }

    /// Sets the handle limit.
    pub fn with_max_handles(mut self, handles: usize) -> Self {
        self.max_handles = handles;
        self
    }

    /// Returns the arena growth slack.
    pub fn initial_capacity(&self) -> usize {
        self.initial_capacity
    }

    /// Returns the handle table growth slack.
    pub fn handle_slack(&self) -> usize {
        self.handle_slack
    }

    /// Returns the staging capacity for formatted writes.
    pub fn format_capacity(&self) -> usize {
        self.format_capacity
    }

    /// Returns the handle limit.
    pub fn max_handles(&self) -> usize {
        self.max_handles
    }

    /// Validates the current configuration.
    ///
    /// # Example
    ///
    /// ```
    /// use strpool::PoolConfig;
    ///
    /// let config = PoolConfig::default().with_handle_slack(0);
    /// assert!(config.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<()> {
        if self.initial_capacity == 0 || self.handle_slack == 0 {
            return Err(PoolError::InvalidConfig {
                message: "growth slack must be non-zero",
            });
        }

        if self.format_capacity == 0 {
            return Err(PoolError::InvalidConfig {
                message: "format_capacity must be non-zero",
            });
        }

        if self.format_capacity > MAX_STRING_LEN {
            return Err(PoolError::InvalidConfig {
                message: "format_capacity cannot exceed the maximum string length",
            });
        }

        if self.max_handles == 0 {
            return Err(PoolError::InvalidConfig {
                message: "max_handles must be non-zero",
            });
        }

        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
