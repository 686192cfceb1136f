//! Encoding and decoding of uAODV control messages.
//!
//! Every message starts with a one-byte type. All multi-byte fields are sent
//! in network byte order; the structs here hold them in host order and the
//! conversion happens only in [`Message::decode`] and the `to_bytes` methods.
//!
//! ## Layouts
//!
//! | Message  | Bytes |
//! |----------|-------|
//! | RREQ     | type, flags, reserved, hop count, RREQ id (4), dest (4), dest seqno (4), orig (4), orig seqno (4) |
//! | RREP     | type, flags, prefix size, hop count, dest (4), dest seqno (4), orig (4), lifetime (4) |
//! | RERR     | type, flags, reserved, dest count, then `dest count` × {addr (4), seqno (4)} |
//! | RREP-ACK | type, reserved |
//!
//! ## Limitations
//!
//! - Bytes trailing a RREQ or RREP (RFC 3561 extensions) are ignored
//! - Only the first unreachable destination of a RERR is decoded; re-encoding
//!   always produces a single-destination RERR

use crate::addr::Address;
use crate::consts::{
    UAODV_RERR_HEADER_LEN, UAODV_RERR_LEN, UAODV_RERR_TYPE, UAODV_RREP_ACK_LEN,
    UAODV_RREP_ACK_TYPE, UAODV_RREP_LEN, UAODV_RREP_TYPE, UAODV_RREQ_LEN, UAODV_RREQ_TYPE,
};
use crate::error::Error;

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn read_addr(bytes: &[u8], at: usize) -> Address {
    Address([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn check_len(bytes: &[u8], expected: usize) -> Result<(), Error> {
    if bytes.len() < expected {
        return Err(Error::Truncated {
            len: bytes.len(),
            expected,
        });
    }
    Ok(())
}

/// A Route Request, flooded to discover a route to `dest_addr`.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct RouteRequest {
    /// `UAODV_RREQ_*` flag bits.
    pub flags: u8,
    /// Hops travelled so far.
    pub hop_count: u8,
    /// Per-originator request id, used for duplicate suppression.
    pub rreq_id: u32,
    /// The node a route is wanted to.
    pub dest_addr: Address,
    /// Latest sequence number the originator knows for `dest_addr`.
    pub dest_seqno: u32,
    /// The node asking.
    pub orig_addr: Address,
    /// The originator's own sequence number.
    pub orig_seqno: u32,
}

impl RouteRequest {
    /// Serializes to the wire layout.
    pub fn to_bytes(&self) -> [u8; UAODV_RREQ_LEN] {
        let mut bytes = [0u8; UAODV_RREQ_LEN];
        bytes[0] = UAODV_RREQ_TYPE;
        bytes[1] = self.flags;
        bytes[2] = 0; // Reserved
        bytes[3] = self.hop_count;
        bytes[4..8].copy_from_slice(&self.rreq_id.to_be_bytes());
        bytes[8..12].copy_from_slice(&self.dest_addr.0);
        bytes[12..16].copy_from_slice(&self.dest_seqno.to_be_bytes());
        bytes[16..20].copy_from_slice(&self.orig_addr.0);
        bytes[20..24].copy_from_slice(&self.orig_seqno.to_be_bytes());
        bytes
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        check_len(bytes, UAODV_RREQ_LEN)?;
        Ok(Self {
            flags: bytes[1],
            hop_count: bytes[3],
            rreq_id: read_u32(bytes, 4),
            dest_addr: read_addr(bytes, 8),
            dest_seqno: read_u32(bytes, 12),
            orig_addr: read_addr(bytes, 16),
            orig_seqno: read_u32(bytes, 20),
        })
    }
}

/// A Route Reply, unicast hop by hop back to `orig_addr`.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct RouteReply {
    /// `UAODV_RREP_*` flag bits.
    pub flags: u8,
    /// Subnet prefix size, unused by this implementation.
    pub prefix_sz: u8,
    /// Hops from the replying node to `dest_addr`.
    pub hop_count: u8,
    /// The node the reply describes a route to. Broadcast for a HELLO.
    pub dest_addr: Address,
    /// Sequence number of `dest_addr`.
    pub dest_seqno: u32,
    /// The node that asked for the route.
    pub orig_addr: Address,
    /// Route lifetime.
    pub lifetime: u32,
}

impl RouteReply {
    /// Serializes to the wire layout.
    pub fn to_bytes(&self) -> [u8; UAODV_RREP_LEN] {
        let mut bytes = [0u8; UAODV_RREP_LEN];
        bytes[0] = UAODV_RREP_TYPE;
        bytes[1] = self.flags;
        bytes[2] = self.prefix_sz;
        bytes[3] = self.hop_count;
        bytes[4..8].copy_from_slice(&self.dest_addr.0);
        bytes[8..12].copy_from_slice(&self.dest_seqno.to_be_bytes());
        bytes[12..16].copy_from_slice(&self.orig_addr.0);
        bytes[16..20].copy_from_slice(&self.lifetime.to_be_bytes());
        bytes
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        check_len(bytes, UAODV_RREP_LEN)?;
        Ok(Self {
            flags: bytes[1],
            prefix_sz: bytes[2],
            hop_count: bytes[3],
            dest_addr: read_addr(bytes, 4),
            dest_seqno: read_u32(bytes, 8),
            orig_addr: read_addr(bytes, 12),
            lifetime: read_u32(bytes, 16),
        })
    }
}

/// A Route Error reporting one unreachable destination.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct RouteError {
    /// `UAODV_RERR_*` flag bits.
    pub flags: u8,
    /// The destination that became unreachable.
    pub addr: Address,
    /// Its last known sequence number, 0 if unknown.
    pub seqno: u32,
}

impl RouteError {
    /// Serializes to the wire layout, with a destination count of one.
    pub fn to_bytes(&self) -> [u8; UAODV_RERR_LEN] {
        let mut bytes = [0u8; UAODV_RERR_LEN];
        bytes[0] = UAODV_RERR_TYPE;
        bytes[1] = self.flags;
        bytes[2] = 0; // Reserved
        bytes[3] = 1;
        bytes[4..8].copy_from_slice(&self.addr.0);
        bytes[8..12].copy_from_slice(&self.seqno.to_be_bytes());
        bytes
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        check_len(bytes, UAODV_RERR_HEADER_LEN)?;
        if bytes[3] == 0 {
            return Err(Error::EmptyRouteError);
        }
        check_len(bytes, UAODV_RERR_LEN)?;
        Ok(Self {
            flags: bytes[1],
            addr: read_addr(bytes, UAODV_RERR_HEADER_LEN),
            seqno: read_u32(bytes, UAODV_RERR_HEADER_LEN + 4),
        })
    }
}

/// Serializes a RREP-ACK.
pub fn rrep_ack_bytes() -> [u8; UAODV_RREP_ACK_LEN] {
    [UAODV_RREP_ACK_TYPE, 0]
}

/// Any uAODV control message.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Message {
    /// Route Request
    Rreq(RouteRequest),
    /// Route Reply
    Rrep(RouteReply),
    /// Route Error
    Rerr(RouteError),
    /// Route Reply Acknowledgement
    RrepAck,
}

impl Message {
    /// Parses a received UDP payload.
    pub fn decode(bytes: &[u8]) -> Result<Self, Error> {
        check_len(bytes, 1)?;
        match bytes[0] {
            UAODV_RREQ_TYPE => RouteRequest::from_bytes(bytes).map(Message::Rreq),
            UAODV_RREP_TYPE => RouteReply::from_bytes(bytes).map(Message::Rrep),
            UAODV_RERR_TYPE => RouteError::from_bytes(bytes).map(Message::Rerr),
            UAODV_RREP_ACK_TYPE => check_len(bytes, UAODV_RREP_ACK_LEN).map(|()| Message::RrepAck),
            other => Err(Error::UnknownType(other)),
        }
    }
}
