//! Network addresses as seen by the routing layer.
//!
//! uAODV only ever compares, copies and hashes addresses, so [`Address`] is
//! an opaque 4-byte value. It converts to and from [`core::net::Ipv4Addr`]
//! for integrators that run on an IPv4 stack.

use core::fmt;
use core::net::Ipv4Addr;

/// A 4-byte network address.
#[derive(PartialEq, Eq, Clone, Copy, Default, Hash, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Address(pub [u8; 4]);

impl Address {
    /// The all-ones link-local broadcast address.
    pub const BROADCAST: Address = Address([0xff; 4]);

    /// The all-zeroes address.
    pub const UNSPECIFIED: Address = Address([0; 4]);

    /// Builds an address from its four octets, most significant first.
    pub const fn new(a: u8, b: u8, c: u8, d: u8) -> Self {
        Address([a, b, c, d])
    }

    /// Returns the four octets of the address.
    pub const fn octets(&self) -> [u8; 4] {
        self.0
    }

    /// Whether this is the broadcast address.
    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }

    /// Slot index for a direct-mapped cache of `slots` entries.
    ///
    /// Only the two low octets take part, which is enough to spread the nodes
    /// of a single subnet.
    pub(crate) fn slot(&self, slots: usize) -> usize {
        (self.0[2] as usize + self.0[3] as usize) % slots
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}.{}", self.0[0], self.0[1], self.0[2], self.0[3])
    }
}

impl From<[u8; 4]> for Address {
    fn from(octets: [u8; 4]) -> Self {
        Address(octets)
    }
}

impl From<Address> for [u8; 4] {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

impl From<Ipv4Addr> for Address {
    fn from(addr: Ipv4Addr) -> Self {
        Address(addr.octets())
    }
}

impl From<Address> for Ipv4Addr {
    fn from(addr: Address) -> Self {
        Ipv4Addr::from(addr.0)
    }
}
