//! Compaction: copy every live record into a fresh arena.
//!
//! Records are copied in handle order, which also restores locality for
//! callers that walk handles sequentially. Two handles can be treated
//! specially by the write that triggered the compaction:
//!
//! - a *pinned* handle is copied last, so it ends up as the new top record and
//!   can keep growing in place;
//! - a *dropped* handle is not copied at all and comes out empty, because the
//!   triggering write is about to give it a new record anyway.

use crate::arena::{Arena, SENTINEL};
use crate::error::Result;
use crate::table::HandleTable;

use super::Pool;

/// Special treatment for one handle during a compaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Keep {
    /// Copy every live record in handle order.
    All,
    /// Copy this handle's record after all others.
    PinLast(usize),
    /// Do not copy this handle's record; leave it empty.
    Drop(usize),
}

/// Copies the live records of `from` into a new arena of `capacity` bytes and
/// rewrites the table to point into it.
///
/// The new arena is allocated before anything is touched, so a failed
/// allocation leaves `table` as it was.
fn copy_live(from: &Arena, table: &mut HandleTable, capacity: usize, keep: Keep) -> Result<Arena> {
    let mut to = Arena::with_capacity(capacity)?;

    for (handle, slot) in table.slots_mut().iter_mut().enumerate() {
        let offset = *slot as usize;
        if offset == SENTINEL {
            continue;
        }
        match keep {
            Keep::PinLast(pinned) if pinned == handle => continue,
            Keep::Drop(dropped) if dropped == handle => {
                *slot = SENTINEL as _;
                continue;
            }
            _ => {}
        }
        *slot = to.copy_record_from(from, offset) as _;
    }

    if let Keep::PinLast(pinned) = keep {
        if let Some(offset) = table.get(pinned).filter(|&offset| offset != SENTINEL) {
            let moved = to.copy_record_from(from, offset);
            table.set(pinned, moved);
        }
    }

    Ok(to)
}

impl Pool {
    /// Replaces the arena with a compacted one able to hold `needed` bytes.
    ///
    /// The new capacity is `max(needed, 2 * live + slack)`. Returns the
    /// previous arena, which the caller keeps alive for as long as it still
    /// reads from it.
    pub(super) fn compact_into(&mut self, needed: usize, keep: Keep) -> Result<Arena> {
        let live = self.arena.live_bytes();
        let slack = self.config.initial_capacity();
        let capacity = needed.max(live.saturating_mul(2).saturating_add(slack));

        let fresh = copy_live(&self.arena, &mut self.table, capacity, keep)?;
        let old = std::mem::replace(&mut self.arena, fresh);

        if old.is_allocated() {
            self.compactions += 1;
            self.generation += 1;
            tracing::debug!(
                old_capacity = old.capacity(),
                new_capacity = self.arena.capacity(),
                reclaimed = old.garbage_size(),
                live = self.arena.data_size(),
                generation = self.generation,
                "arena compacted"
            );
        } else {
            tracing::debug!(capacity = self.arena.capacity(), "arena allocated");
        }

        Ok(old)
    }

    /// Compacts the arena now, discarding all garbage.
    ///
    /// Afterwards `garbage_size` is 0 and `data_size` is exactly the size of
    /// the live records plus the sentinel. Does nothing on a pool that has
    /// not allocated yet.
    ///
    /// # Errors
    ///
    /// [`PoolError::OutOfMemory`](crate::PoolError::OutOfMemory) if the new
    /// arena cannot be allocated. The pool is unchanged in that case.
    pub fn compact(&mut self) -> Result<()> {
        if !self.arena.is_allocated() {
            return Ok(());
        }
        let needed = self.arena.footprint();
        self.compact_into(needed, Keep::All)?;
        Ok(())
    }
}
