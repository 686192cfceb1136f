//! Constants used across the uAODV protocol implementation.
//!
//! This module defines the wire-level message discriminants and flag bits,
//! the fixed message sizes, and the default tuning knobs of the routing engine.
//!
//! These values follow RFC 3561 message layouts, trimmed down to what a
//! micro implementation actually sends and understands.
//!
//! ## Key Concepts
//!
//! - **Types**: The first byte of every message selects RREQ, RREP, RERR or RREP-ACK.
//! - **Flags**: The second byte carries per-message flag bits, most significant bit first.
//! - **Lengths**: Every message this crate emits has a fixed size.
//! - **Defaults**: Table capacities, rate limits and TTLs used by [`Config::new`](crate::engine::Config::new).

/// UDP port every uAODV message is sent to and received on.
pub const UAODV_UDP_PORT: u16 = 654;

/// Message type of a Route Request.
pub const UAODV_RREQ_TYPE: u8 = 1;

/// Message type of a Route Reply.
pub const UAODV_RREP_TYPE: u8 = 2;

/// Message type of a Route Error.
pub const UAODV_RERR_TYPE: u8 = 3;

/// Message type of a Route Reply Acknowledgement.
pub const UAODV_RREP_ACK_TYPE: u8 = 4;

/// RREQ flag: multicast join.
pub const UAODV_RREQ_JOIN: u8 = 0x80;

/// RREQ flag: multicast repair.
pub const UAODV_RREQ_REPAIR: u8 = 0x40;

/// RREQ flag: an intermediate node answering on the destination's behalf
/// should also notify the destination.
pub const UAODV_RREQ_GRATUITOUS: u8 = 0x20;

/// RREQ flag: only the destination itself may answer.
pub const UAODV_RREQ_DESTONLY: u8 = 0x10;

/// RREQ flag: the originator has no known sequence number for the destination.
pub const UAODV_RREQ_UNKSEQNO: u8 = 0x08;

/// RREP flag: multicast repair.
pub const UAODV_RREP_REPAIR: u8 = 0x80;

/// RREP flag: the sender asks for a RREP-ACK.
pub const UAODV_RREP_ACK: u8 = 0x40;

/// RERR flag: the upstream node repaired the link locally, do not delete the route.
pub const UAODV_RERR_NODELETE: u8 = 0x80;

/// RERR flag (non-standard): the reporter does not know the destination's sequence number.
pub const UAODV_RERR_UNKNOWN: u8 = 0x40;

/// Encoded size of a RREQ, in bytes.
pub const UAODV_RREQ_LEN: usize = 24;

/// Encoded size of a RREP, in bytes.
pub const UAODV_RREP_LEN: usize = 20;

/// Size of the fixed RERR header, before the unreachable destination list.
pub const UAODV_RERR_HEADER_LEN: usize = 4;

/// Size of one `{address, sequence number}` pair in a RERR.
pub const UAODV_RERR_UNREACH_LEN: usize = 8;

/// Encoded size of a single-destination RERR, in bytes.
pub const UAODV_RERR_LEN: usize = UAODV_RERR_HEADER_LEN + UAODV_RERR_UNREACH_LEN;

/// Encoded size of a RREP-ACK, in bytes.
pub const UAODV_RREP_ACK_LEN: usize = 2;

/// Default number of route table entries.
pub const UAODV_NUM_RT_ENTRIES: usize = 8;

/// Default number of forward cache slots.
pub const UAODV_NUM_FWCACHE: usize = 16;

/// Default maximum number of RREQs originated per second.
///
/// RFC 3561 allows 10; a power of two keeps the tick arithmetic exact on
/// most clocks.
pub const UAODV_RREQ_RATELIMIT: u32 = 8;

/// Default TTL of self-originated broadcasts.
pub const UAODV_NET_DIAMETER: u8 = 20;

/// Route lifetime advertised in every RREP. Routes never expire here.
pub const UAODV_MY_ROUTE_TIMEOUT: u32 = 0xffff;

/// Default number of clock ticks between posting a command and draining it
/// from [`on_timer_tick`](crate::engine::Uaodv::on_timer_tick).
pub const UAODV_POLL_DELAY: u32 = 2;
