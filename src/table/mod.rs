//! Grow-only table mapping handles to arena offsets.
//!
//! Slot `h` holds the byte offset of handle `h`'s record, or `0` when the
//! handle is empty (offset 0 is the shared sentinel record). The table never
//! shrinks; it is only discarded as a whole by [`HandleTable::release`].

use crate::error::{PoolError, Result};

/// Offsets are stored as `u32` to keep a slot at 4 bytes.
pub(crate) type Offset = u32;

#[derive(Debug, Default)]
pub(crate) struct HandleTable {
    /// Always fully initialized: `slots.len()` is the table capacity.
    slots: Vec<Offset>,
    /// 1 + highest handle ever written.
    count: usize,
}

impl HandleTable {
    pub(crate) const fn new() -> Self {
        Self {
            slots: Vec::new(),
            count: 0,
        }
    }

    /// Number of addressable handles, i.e. 1 + the highest handle written.
    pub(crate) fn count(&self) -> usize {
        self.count
    }

    /// Number of allocated slots.
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Makes `handle` addressable and counts it as used.
    ///
    /// Growth goes to `max(handle + 1, 2 * capacity + slack)`; existing slots
    /// are preserved and new ones start empty.
    pub(crate) fn ensure(&mut self, handle: usize, slack: usize) -> Result<()> {
        if handle >= self.slots.len() {
            let wanted = handle
                .checked_add(1)
                .ok_or(PoolError::OutOfMemory { requested: usize::MAX })?;
            self.grow_to(wanted, slack)?;
        }
        self.count = self.count.max(handle + 1);
        Ok(())
    }

    /// Undoes a count bump from [`HandleTable::ensure`] after a failed write.
    ///
    /// Slots between `count` and the current count are still empty then.
    pub(crate) fn restore_count(&mut self, count: usize) {
        debug_assert!(self.slots[count.min(self.count)..self.count].iter().all(|&s| s == 0));
        self.count = self.count.min(count);
    }

    /// Grows capacity to at least `slots` without touching `count`.
    pub(crate) fn grow_to(&mut self, slots: usize, slack: usize) -> Result<()> {
        let old = self.slots.len();
        if slots <= old {
            return Ok(());
        }

        let target = slots.max(old.saturating_mul(2).saturating_add(slack));
        let additional = target - old;
        self.slots
            .try_reserve_exact(additional)
            .map_err(|_| PoolError::OutOfMemory {
                requested: target.saturating_mul(size_of::<Offset>()),
            })?;
        self.slots.resize(target, 0);

        tracing::trace!(from = old, to = target, "handle table grown");
        Ok(())
    }

    /// Offset of `handle`, or `None` if the handle was never addressed.
    pub(crate) fn get(&self, handle: usize) -> Option<usize> {
        if handle < self.count {
            Some(self.slots[handle] as usize)
        } else {
            None
        }
    }

    /// Points `handle` at `offset`. The handle must already be addressable.
    pub(crate) fn set(&mut self, handle: usize, offset: usize) {
        debug_assert!(handle < self.count);
        debug_assert!(offset <= Offset::MAX as usize);
        self.slots[handle] = offset as Offset;
    }

    /// `(handle, offset)` for every addressable handle, in handle order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.slots[..self.count]
            .iter()
            .enumerate()
            .map(|(handle, &offset)| (handle, offset as usize))
    }

    /// Slots of all addressable handles, in handle order.
    pub(crate) fn slots_mut(&mut self) -> &mut [Offset] {
        &mut self.slots[..self.count]
    }

    /// Empties every handle. Capacity and count are kept.
    pub(crate) fn clear(&mut self) {
        self.slots[..self.count].fill(0);
    }

    /// Drops the backing storage entirely.
    pub(crate) fn release(&mut self) {
        self.slots = Vec::new();
        self.count = 0;
    }
}
