//! Duplicate suppression for flooded route requests.
//!
//! A direct-mapped cache of `(originator, RREQ id)` pairs. Each originator
//! hashes to one slot and a new pair simply overwrites whatever was there.
//! Lookups are O(1) and the memory cost is fixed, at the price of forgetting
//! a pair when another originator lands on the same slot. A forgotten pair
//! lets one duplicate through, which bounds a broadcast storm just as well.

use crate::addr::Address;

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
struct Slot {
    orig: Address,
    id: u32,
}

/// Direct-mapped `(originator, RREQ id)` cache with `N` slots.
#[derive(Debug)]
pub struct ForwardCache<const N: usize> {
    slots: [Option<Slot>; N],
}

impl<const N: usize> Default for ForwardCache<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> ForwardCache<N> {
    /// Creates an empty cache.
    pub const fn new() -> Self {
        const { assert!(N > 0, "forward cache needs at least one slot") };
        Self { slots: [None; N] }
    }

    /// Whether `(orig, id)` is the pair last recorded in `orig`'s slot.
    pub fn lookup(&self, orig: &Address, id: u32) -> bool {
        self.slots[orig.slot(N)] == Some(Slot { orig: *orig, id })
    }

    /// Records `(orig, id)`, overwriting the slot's previous pair.
    pub fn add(&mut self, orig: Address, id: u32) {
        self.slots[orig.slot(N)] = Some(Slot { orig, id });
    }
}
