//! Staging for formatted writes.
//!
//! Formatted output is rendered into a bounded, thread-locally recycled
//! buffer before it is stored, so a formatted write never allocates in the
//! common case and never touches the pool until the output is known to fit.

mod pool;

pub use pool::Staged;
