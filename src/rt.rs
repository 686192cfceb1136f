//! Bounded route cache with least-recently-used eviction.
//!
//! The [`RouteTable`] maps a destination address to the neighbour that leads
//! towards it. Its capacity is fixed at compile time; once it is full, adding a
//! new destination evicts the entry that was touched longest ago.
//!
//! Entries are kept in recency order, most recently used first. Every scan
//! is linear, which is the cheapest option at the handful of entries an
//! embedded node can afford.
//!
//! Routes that are known to be broken are *flagged* rather than removed, so
//! that [`RouteTable::lookup_any`] can still report the last sequence number
//! seen for them while [`RouteTable::lookup`] hides them.
//!
//! ## Example
//!
//! ```rust
//! use uaodv::addr::Address;
//! use uaodv::rt::RouteTable;
//!
//! let mut table: RouteTable<2> = RouteTable::new();
//! let a = Address::new(10, 0, 0, 1);
//! let b = Address::new(10, 0, 0, 2);
//! let c = Address::new(10, 0, 0, 3);
//!
//! let _ = table.add(a, a, 0, 1);
//! let _ = table.add(b, a, 1, 1);
//! let _ = table.add(c, a, 1, 1);
//!
//! // `a` was touched longest ago and got evicted.
//! assert!(table.lookup(&a).is_none());
//! assert_eq!(table.len(), 2);
//! ```

use heapless::Vec;

use crate::addr::Address;

/// Compares two sequence numbers the RFC 3561 way.
///
/// Positive if `a` is newer than `b`, zero if equal, negative if older. The
/// difference is taken modulo 2^32, so numbers keep ordering across wraparound.
pub fn scmp32(a: u32, b: u32) -> i32 {
    a.wrapping_sub(b) as i32
}

/// What the node knows about reaching one destination.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct RouteEntry {
    /// The destination this entry leads to.
    pub destination: Address,
    /// Neighbour to hand packets for `destination` to.
    pub next_hop: Address,
    /// Destination sequence number, host order.
    pub sequence_number: u32,
    /// Hops from here to `destination`.
    pub hop_count: u8,
    /// Set once a route error reported the route broken.
    pub is_bad: bool,
}

/// Fixed-capacity route cache, most recently used entry first.
#[derive(Debug)]
pub struct RouteTable<const N: usize> {
    entries: Vec<RouteEntry, N>,
}

impl<const N: usize> Default for RouteTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RouteTable<N> {
    /// Creates an empty table.
    pub const fn new() -> Self {
        const { assert!(N > 0, "route table needs at least one entry") };
        Self {
            entries: Vec::new(),
        }
    }

    fn position(&self, dest: &Address) -> Option<usize> {
        self.entries.iter().position(|e| e.destination == *dest)
    }

    /// Inserts or refreshes the route to `dest` and makes it the most recently used.
    ///
    /// An existing entry for `dest` is unlinked and reused. Otherwise, when
    /// the table is full, the least recently used entry makes room. The new
    /// entry always starts out good.
    ///
    /// # Returns
    /// The entry as stored, for reading back the route just installed.
    pub fn add(&mut self, dest: Address, next_hop: Address, hop_count: u8, seqno: u32) -> &RouteEntry {
        if let Some(pos) = self.position(&dest) {
            let _ = self.entries.remove(pos);
        } else if self.entries.is_full() {
            if let Some(evicted) = self.entries.pop() {
                net_trace!("route to {} evicted", evicted.destination);
            }
        }

        let entry = RouteEntry {
            destination: dest,
            next_hop,
            sequence_number: seqno,
            hop_count,
            is_bad: false,
        };
        if let Err(entry) = self.entries.insert(0, entry) {
            net_warn!("route table full, route to {} dropped", entry.destination);
        }
        // Either the insert succeeded or the table is full; N > 0 both ways.
        &self.entries[0]
    }

    /// Finds the entry for `dest`, broken or not. Does not change recency.
    pub fn lookup_any(&self, dest: &Address) -> Option<&RouteEntry> {
        self.entries.iter().find(|e| e.destination == *dest)
    }

    /// Finds a usable entry for `dest`. Broken routes are reported as absent.
    pub fn lookup(&self, dest: &Address) -> Option<&RouteEntry> {
        self.lookup_any(dest).filter(|e| !e.is_bad)
    }

    /// Promotes the entry for `dest` to most recently used.
    ///
    /// Returns `false` if the table has no entry for `dest`.
    pub fn touch(&mut self, dest: &Address) -> bool {
        match self.position(dest) {
            Some(0) => true,
            Some(pos) => {
                let entry = self.entries.remove(pos);
                if let Err(entry) = self.entries.insert(0, entry) {
                    net_warn!("route to {} lost while promoting", entry.destination);
                }
                true
            }
            None => false,
        }
    }

    /// Flags the route to `dest` as broken, keeping it in place.
    ///
    /// # Returns
    /// The entry's sequence number, or `None` if `dest` is unknown.
    pub fn mark_bad(&mut self, dest: &Address) -> Option<u32> {
        let entry = self.entries.iter_mut().find(|e| e.destination == *dest)?;
        entry.is_bad = true;
        Some(entry.sequence_number)
    }

    /// Drops the entry for `dest`, if any.
    pub fn remove(&mut self, dest: &Address) -> Option<RouteEntry> {
        let pos = self.position(dest)?;
        Some(self.entries.remove(pos))
    }

    /// Drops every entry.
    pub fn flush_all(&mut self) {
        self.entries.clear();
    }

    /// Iterates over the entries, most recently used first.
    pub fn iter(&self) -> impl Iterator<Item = &RouteEntry> {
        self.entries.iter()
    }

    /// Number of entries, broken ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries.
    pub const fn capacity(&self) -> usize {
        N
    }
}
