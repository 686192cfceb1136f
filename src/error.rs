//! Error type for decoding uAODV messages.

use thiserror::Error;

/// Why an incoming datagram could not be understood.
///
/// The engine never hands these to its caller; a datagram that fails to decode is
/// counted and dropped. They are public so that integrators decoding messages
/// themselves (e.g. for sniffing) can tell failures apart.
#[derive(Error, PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Error {
    /// The datagram is shorter than its message type requires.
    #[error("truncated message: {len} bytes, need {expected}")]
    Truncated {
        /// Bytes received.
        len: usize,
        /// Bytes the message type requires.
        expected: usize,
    },
    /// The type byte is not one of RREQ, RREP, RERR or RREP-ACK.
    #[error("unknown message type {0}")]
    UnknownType(u8),
    /// A RERR that lists no unreachable destination.
    #[error("route error without destinations")]
    EmptyRouteError,
}
