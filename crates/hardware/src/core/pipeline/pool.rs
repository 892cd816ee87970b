//! Bounded control-word arena.
//!
//! The decoder checks control words out per stage and the cycle loop
//! returns each one the moment its stage completes, so the pool's bound
//! (both queues full) is a hard invariant: running out means the decoder
//! generated an over-long recipe, which is a bug, not a runtime condition.
//! Handles carry a generation counter so a stale handle (freed and
//! reissued slot) is caught in debug builds instead of silently aliasing.

use super::control::Control;

/// Checkout handle into a [`ControlPool`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Handle {
    index: u16,
    generation: u16,
}

/// Fixed-capacity arena of control words with a free list.
#[derive(Clone, Debug)]
pub struct ControlPool {
    slots: Vec<Control>,
    generations: Vec<u16>,
    free: Vec<u16>,
}

impl ControlPool {
    /// Creates a pool with the given capacity, all slots free.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![Control::default(); capacity],
            generations: vec![0; capacity],
            free: (0..capacity as u16).rev().collect(),
        }
    }

    /// Checks out a zeroed control word.
    ///
    /// # Panics
    ///
    /// Panics if the pool is exhausted: the decoder violated the recipe
    /// length invariant.
    pub fn alloc(&mut self) -> Handle {
        let index = self
            .free
            .pop()
            .unwrap_or_else(|| unreachable!("control pool exhausted: decoder recipe too long"));
        self.slots[usize::from(index)] = Control::default();
        Handle {
            index,
            generation: self.generations[usize::from(index)],
        }
    }

    /// Borrows the control word behind a handle.
    #[inline]
    pub fn get(&self, handle: Handle) -> &Control {
        debug_assert_eq!(
            self.generations[usize::from(handle.index)],
            handle.generation,
            "stale control handle"
        );
        &self.slots[usize::from(handle.index)]
    }

    /// Mutably borrows the control word behind a handle.
    #[inline]
    pub fn get_mut(&mut self, handle: Handle) -> &mut Control {
        debug_assert_eq!(
            self.generations[usize::from(handle.index)],
            handle.generation,
            "stale control handle"
        );
        &mut self.slots[usize::from(handle.index)]
    }

    /// Returns a control word to the pool.
    pub fn free(&mut self, handle: Handle) {
        let idx = usize::from(handle.index);
        debug_assert_eq!(self.generations[idx], handle.generation, "double free");
        self.generations[idx] = self.generations[idx].wrapping_add(1);
        self.free.push(handle.index);
    }

    /// Number of control words currently checked out.
    pub fn outstanding(&self) -> usize {
        self.slots.len() - self.free.len()
    }
}
