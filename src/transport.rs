//! The datagram service the routing engine sends through.
//!
//! uAODV messages ride as UDP payloads on port
//! [`UAODV_UDP_PORT`](crate::consts::UAODV_UDP_PORT). Route requests and
//! route errors are link-local broadcasts with an explicit TTL; route replies
//! and acknowledgements are unicast to the next hop only.
//!
//! Receiving is the host's job: hand every payload that arrives on the port
//! to [`Uaodv::on_datagram`](crate::engine::Uaodv::on_datagram).

use crate::addr::Address;

/// Outgoing half of the UDP socket(s) used by the engine.
pub trait Transport {
    /// Error reported by a failed send.
    type Error;

    /// Broadcasts `payload` to all neighbours with an IP TTL of `ttl`.
    fn broadcast(&mut self, payload: &[u8], ttl: u8) -> Result<(), Self::Error>;

    /// Sends `payload` to the neighbour `next_hop` only.
    fn unicast(&mut self, next_hop: Address, payload: &[u8]) -> Result<(), Self::Error>;
}
