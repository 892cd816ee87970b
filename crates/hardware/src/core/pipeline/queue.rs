//! Bounded micro-op queues.
//!
//! Two of these exist: "current", executed one stage per cycle behind a
//! cursor, and "next", filled by the decoder for the instruction in the
//! fetch stage. Slots below the cursor have already been consumed (taken
//! and returned to the pool); a `None` at the cursor means the recipe is
//! exhausted and the queues swap.

use super::MAX_INST_LEN;
use super::pool::{ControlPool, Handle};

/// Bounded ordered sequence of checked-out control words.
#[derive(Clone, Copy, Debug, Default)]
pub struct MicroOpQueue {
    slots: [Option<Handle>; MAX_INST_LEN],
}

impl MicroOpQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a control word at the first free slot.
    ///
    /// # Panics
    ///
    /// Panics if the queue is full, meaning a recipe exceeded [`MAX_INST_LEN`].
    pub fn push(&mut self, handle: Handle) {
        for slot in &mut self.slots {
            if slot.is_none() {
                *slot = Some(handle);
                return;
            }
        }
        unreachable!("micro-op queue overflow: recipe longer than MAX_INST_LEN");
    }

    /// The handle at a position, if still queued.
    #[inline]
    pub fn get(&self, idx: usize) -> Option<Handle> {
        self.slots.get(idx).copied().flatten()
    }

    /// Removes and returns the handle at a position.
    #[inline]
    pub fn take(&mut self, idx: usize) -> Option<Handle> {
        self.slots.get_mut(idx).and_then(Option::take)
    }

    /// Frees every queued control word from `start` onward back to the pool.
    pub fn flush_from(&mut self, pool: &mut ControlPool, start: usize) {
        for slot in self.slots.iter_mut().skip(start) {
            if let Some(handle) = slot.take() {
                pool.free(handle);
            }
        }
    }

    /// Frees every queued control word back to the pool.
    pub fn flush_all(&mut self, pool: &mut ControlPool) {
        self.flush_from(pool, 0);
    }
}
