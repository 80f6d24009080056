//! Internal utility functions and helpers.
//!
//! This module contains small helper functions used throughout the crate.
//! It is an implementation detail and not part of the public API.

use std::ops::Range;

use crate::error::{PoolError, Result};

/// Position of the first occurrence of `needle` in `haystack`.
///
/// An empty needle matches at 0.
pub(crate) fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// `start..start + len`, checked against a string of `total` bytes.
pub(crate) fn checked_range(start: usize, len: usize, total: usize) -> Result<Range<usize>> {
    match start.checked_add(len) {
        Some(end) if end <= total => Ok(start..end),
        end => Err(PoolError::OutOfBounds {
            end: end.unwrap_or(usize::MAX),
            len: total,
        }),
    }
}
