//! The uAODV protocol engine.
//!
//! This module provides the [`Uaodv`] struct, which runs the route discovery
//! and maintenance side of AODV on top of a datagram [`Transport`] and a tick
//! [`Clock`]. It owns the node's [`RouteTable`] and [`ForwardCache`] and is
//! the only thing that mutates them.
//!
//! The engine is event driven and never blocks. The host feeds it:
//!
//! - [`on_datagram()`](Uaodv::on_datagram) for every payload received on the uAODV port
//! - [`on_timer_tick()`](Uaodv::on_timer_tick) periodically, or
//!   [`on_poll()`](Uaodv::on_poll) when the transport is ready to send
//!
//! and asks it for routes through [`request_route_to()`](Uaodv::request_route_to),
//! which answers from the cache or schedules a rate-limited route request and
//! returns [`nb::Error::WouldBlock`] until a reply has come in.
//!
//! ## Example
//!
//! ```rust,ignore
//! use uaodv::engine::{Config, Uaodv};
//!
//! let config = Config::new(Address::new(10, 0, 0, 1), CLOCK_HZ);
//! let mut node: Uaodv<_, _> = Uaodv::new(udp, clock, config);
//!
//! loop {
//!     if let Some((payload, sender, ttl)) = udp.recv() {
//!         node.on_datagram(payload, sender, ttl);
//!     }
//!     node.on_timer_tick();
//!     if let Ok(route) = node.request_route_to(peer) {
//!         forward(packet, route.next_hop);
//!     }
//! }
//! ```
//!
//! ## Design Notes
//!
//! Routes never time out. A route stops being used only when it is evicted
//! from the table, or when a route error (or [`bad_dest()`](Uaodv::bad_dest))
//! flags it as broken.

use core::convert::Infallible;

use crate::addr::Address;
use crate::consts::{
    UAODV_MY_ROUTE_TIMEOUT, UAODV_NET_DIAMETER, UAODV_NUM_FWCACHE, UAODV_NUM_RT_ENTRIES,
    UAODV_POLL_DELAY, UAODV_RERR_UNKNOWN, UAODV_RREP_ACK, UAODV_RREQ_DESTONLY,
    UAODV_RREQ_RATELIMIT, UAODV_RREQ_UNKSEQNO,
};
use crate::fwcache::ForwardCache;
use crate::msg::{Message, RouteError, RouteReply, RouteRequest, rrep_ack_bytes};
use crate::rt::{RouteEntry, RouteTable, scmp32};
use crate::timer::{Clock, Ticks, Timer, rate_limit_ticks};
use crate::transport::Transport;

/// Tuning knobs of a [`Uaodv`] engine.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// This node's address.
    pub address: Address,
    /// Minimum ticks between two accepted route requests.
    pub rreq_interval: Ticks,
    /// Ticks between posting a command and [`Uaodv::on_timer_tick`] sending it.
    pub poll_delay: Ticks,
    /// TTL of self-originated broadcasts.
    pub net_diameter: u8,
    /// Answer HELLO messages with a route reply advertising this node.
    pub answer_hello: bool,
    /// Link admission filter for RREQ and HELLO senders. `None` admits everyone.
    ///
    /// Stands in for radio quality checks: return `false` for a sender whose
    /// link is too weak to carry a route.
    pub admit: Option<fn(Address) -> bool>,
}

impl Config {
    /// Default configuration for a node at `address` whose clock runs at `clock_hz`.
    ///
    /// # Arguments
    /// - `address`: this node's address
    /// - `clock_hz`: ticks per second of the [`Clock`] handed to the engine
    ///
    /// # Returns
    /// A configuration allowing 8 route requests per second, a network
    /// diameter of 20 hops, no HELLO replies and no admission filter.
    pub const fn new(address: Address, clock_hz: u32) -> Self {
        Self {
            address,
            rreq_interval: rate_limit_ticks(clock_hz, UAODV_RREQ_RATELIMIT),
            poll_delay: UAODV_POLL_DELAY,
            net_diameter: UAODV_NET_DIAMETER,
            answer_hello: false,
            admit: None,
        }
    }

    /// Overrides the minimum gap between route requests.
    pub const fn with_rreq_interval(mut self, ticks: Ticks) -> Self {
        self.rreq_interval = ticks;
        self
    }

    /// Overrides the delay between posting a command and sending it.
    pub const fn with_poll_delay(mut self, ticks: Ticks) -> Self {
        self.poll_delay = ticks;
        self
    }

    /// Overrides the TTL of self-originated broadcasts.
    pub const fn with_net_diameter(mut self, ttl: u8) -> Self {
        self.net_diameter = ttl;
        self
    }

    /// Enables or disables HELLO replies.
    pub const fn with_hello_replies(mut self, enabled: bool) -> Self {
        self.answer_hello = enabled;
        self
    }

    /// Installs a link admission filter.
    pub const fn with_admission_filter(mut self, admit: fn(Address) -> bool) -> Self {
        self.admit = Some(admit);
        self
    }
}

/// The single piece of work the engine may have queued for its next poll.
///
/// Posting a new command replaces a pending one; a pending route request
/// becomes a no-op if the route shows up before it is drained.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
pub enum Command {
    ///   Nothing to send.
    #[default]
    None,
    ///   Broadcast a route request for the address.
    SendRreq(Address),
    ///   Broadcast a route error for `dest`, last known as `seqno` (0 if unknown).
    SendRerr {
        /// The unreachable destination.
        dest: Address,
        /// Its last known sequence number.
        seqno: u32,
    },
}

/// A micro AODV routing engine.
///
/// ## Type Parameters
///
/// - `T`: the [`Transport`] control messages are sent through
/// - `C`: the [`Clock`] used for rate limiting and command scheduling
/// - `ROUTES`: route table capacity (default 8)
/// - `FWCACHE`: forward cache slots (default 16)
///
/// ## Notes
///
/// - There is exactly one engine per node. Use [`crate::timer`] helpers to share it
///   with an interrupt handler.
/// - All counters saturate instead of wrapping.
#[derive(Debug)]
pub struct Uaodv<
    T,
    C,
    const ROUTES: usize = UAODV_NUM_RT_ENTRIES,
    const FWCACHE: usize = UAODV_NUM_FWCACHE,
> where
    T: Transport,
    C: Clock,
{
    /// The transport control messages go out on
    pub transport: T,
    clock: C,
    config: Config,
    routes: RouteTable<ROUTES>,
    fwcache: ForwardCache<FWCACHE>,
    my_seqno: u32,
    rreq_id: u32,
    command: Command,
    next_rreq: Timer,
    settle: Timer,

    /// Counter of messages handed to the transport successfully.
    pub tx_good: u32,

    /// Counter of messages the transport refused.
    pub tx_bad: u32,

    /// Counter of received datagrams that decoded as uAODV messages.
    pub rx_good: u32,

    /// Counter of received datagrams that failed to decode.
    pub rx_bad: u32,
}

impl<T, C, const ROUTES: usize, const FWCACHE: usize> Uaodv<T, C, ROUTES, FWCACHE>
where
    T: Transport,
    C: Clock,
{
    /// Creates an engine with empty caches and a sequence number of 0.
    ///
    /// # Arguments
    /// - `transport`: where outgoing control messages are sent
    /// - `clock`: tick source, running at the rate `config` was built for
    /// - `config`: see [`Config::new`]
    pub fn new(transport: T, clock: C, config: Config) -> Self {
        Self {
            transport,
            clock,
            config,
            routes: RouteTable::new(),
            fwcache: ForwardCache::new(),
            my_seqno: 0,
            rreq_id: 0,
            command: Command::None,
            next_rreq: Timer::new(),
            settle: Timer::new(),
            tx_good: 0,
            tx_bad: 0,
            rx_good: 0,
            rx_bad: 0,
        }
    }

    /// This node's address.
    pub fn address(&self) -> Address {
        self.config.address
    }

    /// The configuration the engine runs with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// This node's current sequence number.
    pub fn sequence_number(&self) -> u32 {
        self.my_seqno
    }

    /// Id of the last route request this node originated.
    pub fn rreq_id(&self) -> u32 {
        self.rreq_id
    }

    /// Restores the sequence number and RREQ id saved before a reboot.
    ///
    /// Without this, a rebooted node starts from 0 and relies on the
    /// reboot rule in RREQ handling to catch up.
    pub fn restore(&mut self, seqno: u32, rreq_id: u32) {
        self.my_seqno = seqno;
        self.rreq_id = rreq_id;
    }

    /// Read access to the route table.
    pub fn routes(&self) -> &RouteTable<ROUTES> {
        &self.routes
    }

    /// The command waiting for the next poll.
    pub fn pending(&self) -> Command {
        self.command
    }

    /// Whether a command is waiting to be sent.
    pub fn needs_poll(&self) -> bool {
        self.command != Command::None
    }

    /// Returns a usable route to `dest`, or schedules route discovery.
    ///
    /// A cached good route is promoted in the LRU order and returned at once.
    /// Otherwise a route request for `dest` is queued, unless one was queued
    /// less than `rreq_interval` ticks ago or another command is still
    /// pending. Either way the caller gets [`nb::Error::WouldBlock`] and
    /// should ask again later.
    pub fn request_route_to(&mut self, dest: Address) -> nb::Result<RouteEntry, Infallible> {
        if let Some(route) = self.routes.lookup(&dest).copied() {
            let _ = self.routes.touch(&dest);
            return Ok(route);
        }

        // Broadcast protocols must be rate-limited.
        let now = self.clock.now();
        if !self.next_rreq.expired(now) || self.command != Command::None {
            return Err(nb::Error::WouldBlock);
        }

        self.post(Command::SendRreq(dest), now);
        self.next_rreq.set(now, self.config.rreq_interval);
        Err(nb::Error::WouldBlock)
    }

    /// Reports that packets to `dest` can no longer be delivered.
    ///
    /// Flags the cached route (if any) as broken and queues a route error,
    /// replacing whatever command was pending.
    pub fn bad_dest(&mut self, dest: Address) {
        let seqno = self.routes.mark_bad(&dest).unwrap_or(0);
        net_debug!("bad destination {} seq={}", dest, seqno);
        let now = self.clock.now();
        self.post(Command::SendRerr { dest, seqno }, now);
    }

    fn post(&mut self, command: Command, now: Ticks) {
        self.command = command;
        self.settle.set(now, self.config.poll_delay);
    }

    /// Sends the pending command once the poll delay has passed.
    pub fn on_timer_tick(&mut self) {
        if self.command != Command::None && self.settle.expired(self.clock.now()) {
            self.on_poll();
        }
    }

    /// Sends the pending command now, if there is one.
    pub fn on_poll(&mut self) {
        match core::mem::take(&mut self.command) {
            Command::None => {}
            Command::SendRreq(dest) => {
                if self.routes.lookup(&dest).is_none() {
                    self.send_rreq(dest);
                } else {
                    net_trace!("route to {} appeared, RREQ dropped", dest);
                }
            }
            Command::SendRerr { dest, seqno } => self.send_rerr(dest, seqno),
        }
    }

    /// Stops the engine: drops the pending command and every route.
    pub fn shutdown(&mut self) {
        self.command = Command::None;
        self.routes.flush_all();
    }

    /// Handles one datagram received on the uAODV port.
    ///
    /// # Arguments
    /// - `payload`: the UDP payload
    /// - `sender`: IP source address, i.e. the neighbour that sent it
    /// - `ttl`: remaining TTL of the carrying IP datagram
    ///
    /// Malformed payloads are counted in `rx_bad` and dropped.
    pub fn on_datagram(&mut self, payload: &[u8], sender: Address, ttl: u8) {
        let message = match Message::decode(payload) {
            Ok(message) => message,
            Err(err) => {
                self.rx_bad = self.rx_bad.saturating_add(1);
                net_debug!("dropping datagram from {}: {}", sender, err);
                return;
            }
        };
        self.rx_good = self.rx_good.saturating_add(1);

        match message {
            Message::Rreq(rm) => self.handle_incoming_rreq(rm, sender, ttl),
            Message::Rrep(rm) => self.handle_incoming_rrep(rm, sender),
            Message::Rerr(rm) => self.handle_incoming_rerr(rm, sender),
            Message::RrepAck => net_trace!("RREP-ACK from {}", sender),
        }
    }

    fn admits(&self, sender: Address) -> bool {
        self.config.admit.is_none_or(|admit| admit(sender))
    }

    fn handle_incoming_rreq(&mut self, mut rm: RouteRequest, sender: Address, ttl: u8) {
        let me = self.config.address;
        net_trace!(
            "RREQ from {} ttl={} orig={} seq={} hops={} dest={} seq={}",
            sender,
            ttl,
            rm.orig_addr,
            rm.orig_seqno,
            rm.hop_count,
            rm.dest_addr,
            rm.dest_seqno
        );

        if rm.orig_addr == me {
            return; // RREQ looped back
        }
        if !self.admits(sender) {
            net_debug!("RREQ from {} not admitted", sender);
            return;
        }

        // New or better reverse route?
        let reverse = match self.routes.lookup(&rm.orig_addr).copied() {
            Some(rt)
                if scmp32(rm.orig_seqno, rt.sequence_number) < 0
                    || (scmp32(rm.orig_seqno, rt.sequence_number) == 0
                        && rm.hop_count >= rt.hop_count) =>
            {
                rt
            }
            _ => {
                net_debug!("reverse route to {} via {}", rm.orig_addr, sender);
                *self
                    .routes
                    .add(rm.orig_addr, sender, rm.hop_count, rm.orig_seqno)
            }
        };

        // Can we answer on the destination's behalf?
        let forward = if rm.dest_addr == me || rm.flags & UAODV_RREQ_DESTONLY != 0 {
            None
        } else {
            self.routes.lookup(&rm.dest_addr).copied().filter(|fw| {
                rm.flags & UAODV_RREQ_UNKSEQNO != 0
                    || scmp32(fw.sequence_number, rm.dest_seqno) >= 0
            })
        };

        if let Some(fw) = forward {
            net_debug!("RREQ for known route to {}", rm.dest_addr);
            self.send_rrep(
                rm.dest_addr,
                reverse.next_hop,
                rm.orig_addr,
                fw.sequence_number,
                fw.hop_count.saturating_add(1),
            );
        } else if rm.dest_addr == me {
            self.my_seqno = self.my_seqno.wrapping_add(1);
            if rm.flags & UAODV_RREQ_UNKSEQNO == 0 && scmp32(self.my_seqno, rm.dest_seqno) < 0 {
                // We must have rebooted.
                net_debug!("sequence number {} -> {}", self.my_seqno, rm.dest_seqno.wrapping_add(1));
                self.my_seqno = rm.dest_seqno.wrapping_add(1);
            }
            self.send_rrep(me, reverse.next_hop, rm.orig_addr, self.my_seqno, 0);
        } else if ttl > 1 {
            if self.fwcache.lookup(&rm.orig_addr, rm.rreq_id) {
                net_trace!("RREQ {} from {} already forwarded", rm.rreq_id, rm.orig_addr);
                return;
            }
            self.fwcache.add(rm.orig_addr, rm.rreq_id);

            rm.hop_count = rm.hop_count.saturating_add(1);
            net_trace!("RREQ fwd ttl={}", ttl - 1);
            self.broadcast(&rm.to_bytes(), ttl - 1);
        } else {
            net_trace!("RREQ from {} out of hops", rm.orig_addr);
        }
    }

    fn handle_incoming_rrep(&mut self, mut rm: RouteReply, sender: Address) {
        let me = self.config.address;
        net_trace!(
            "RREP from {} dest={} seq={} hops={} orig={}",
            sender,
            rm.dest_addr,
            rm.dest_seqno,
            rm.hop_count,
            rm.orig_addr
        );

        if rm.dest_addr.is_broadcast() {
            if self.config.answer_hello && self.admits(sender) {
                net_debug!("answering HELLO from {}", sender);
                self.send_rrep(me, sender, rm.orig_addr, self.my_seqno, 0);
            }
            return;
        }

        // New forward route? A broken one counts as absent.
        let fresher = match self.routes.lookup(&rm.dest_addr) {
            None => true,
            Some(rt) => scmp32(rm.dest_seqno, rt.sequence_number) > 0,
        };
        if fresher {
            net_debug!("forward route to {} via {}", rm.dest_addr, sender);
            let _ = self
                .routes
                .add(rm.dest_addr, sender, rm.hop_count, rm.dest_seqno);
        }

        if rm.orig_addr == me {
            net_debug!("route to {} complete", rm.dest_addr);
            if rm.flags & UAODV_RREP_ACK != 0 {
                self.unicast(sender, &rrep_ack_bytes());
            }
            return;
        }

        let Some(rt) = self.routes.lookup(&rm.orig_addr).copied() else {
            net_debug!("no route back to {}, RREP dropped", rm.orig_addr);
            return;
        };
        rm.hop_count = rm.hop_count.saturating_add(1);
        rm.flags &= !UAODV_RREP_ACK;
        net_trace!("RREP fwd to {}", rt.next_hop);
        self.unicast(rt.next_hop, &rm.to_bytes());
    }

    fn handle_incoming_rerr(&mut self, mut rm: RouteError, sender: Address) {
        net_trace!("RERR from {} unreach={} seq={}", sender, rm.addr, rm.seqno);

        if rm.addr == self.config.address {
            return;
        }
        let Some(rt) = self.routes.lookup_any(&rm.addr).copied() else {
            return;
        };
        if rt.next_hop != sender {
            net_trace!("RERR for {} does not use {}", rm.addr, sender);
            return;
        }
        if rm.flags & UAODV_RERR_UNKNOWN != 0
            || rm.seqno == 0
            || scmp32(rt.sequence_number, rm.seqno) <= 0
        {
            let _ = self.routes.mark_bad(&rm.addr);
            if rm.flags & UAODV_RERR_UNKNOWN != 0 {
                rm.flags &= !UAODV_RERR_UNKNOWN;
                rm.seqno = rt.sequence_number;
            }
            net_debug!("RERR rebroadcast for {}", rm.addr);
            self.broadcast(&rm.to_bytes(), self.config.net_diameter);
        }
    }

    fn send_rreq(&mut self, dest: Address) {
        let dest_seqno = self.routes.lookup_any(&dest).map_or(0, |rt| rt.sequence_number);
        self.rreq_id = self.rreq_id.wrapping_add(1);
        self.my_seqno = self.my_seqno.wrapping_add(1);

        let rm = RouteRequest {
            flags: if dest_seqno == 0 { UAODV_RREQ_UNKSEQNO } else { 0 },
            hop_count: 0,
            rreq_id: self.rreq_id,
            dest_addr: dest,
            dest_seqno,
            orig_addr: self.config.address,
            orig_seqno: self.my_seqno,
        };
        net_debug!("send RREQ for {} id={}", dest, self.rreq_id);
        self.broadcast(&rm.to_bytes(), self.config.net_diameter);
    }

    fn send_rrep(&mut self, dest: Address, next_hop: Address, orig: Address, seqno: u32, hop_count: u8) {
        let rm = RouteReply {
            flags: 0,
            prefix_sz: 0,
            hop_count,
            dest_addr: dest,
            dest_seqno: seqno,
            orig_addr: orig,
            lifetime: UAODV_MY_ROUTE_TIMEOUT,
        };
        net_debug!("send RREP orig={} hops={} via {}", orig, hop_count, next_hop);
        self.unicast(next_hop, &rm.to_bytes());
    }

    fn send_rerr(&mut self, dest: Address, seqno: u32) {
        let rm = RouteError {
            flags: if seqno == 0 { UAODV_RERR_UNKNOWN } else { 0 },
            addr: dest,
            seqno,
        };
        net_debug!("send RERR for {}", dest);
        self.broadcast(&rm.to_bytes(), self.config.net_diameter);
    }

    fn broadcast(&mut self, payload: &[u8], ttl: u8) {
        match self.transport.broadcast(payload, ttl) {
            Ok(()) => self.tx_good = self.tx_good.saturating_add(1),
            Err(_) => {
                self.tx_bad = self.tx_bad.saturating_add(1);
                net_warn!("broadcast of {} bytes failed", payload.len());
            }
        }
    }

    fn unicast(&mut self, next_hop: Address, payload: &[u8]) {
        match self.transport.unicast(next_hop, payload) {
            Ok(()) => self.tx_good = self.tx_good.saturating_add(1),
            Err(_) => {
                self.tx_bad = self.tx_bad.saturating_add(1);
                net_warn!("unicast to {} failed", next_hop);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{UAODV_RREQ_LEN, UAODV_RREP_ACK_TYPE};
    use crate::testing::{ManualClock, RecordingTransport, Sent};

    // 128 Hz gives an RREQ interval of 16 ticks.
    const CLOCK_HZ: u32 = 128;

    type Node = Uaodv<RecordingTransport, ManualClock>;

    fn a(last: u8) -> Address {
        Address::new(10, 0, 0, last)
    }

    fn node_with(config: Config) -> (Node, ManualClock) {
        let clock = ManualClock::default();
        let node = Uaodv::new(RecordingTransport::default(), clock.clone(), config);
        (node, clock)
    }

    fn node(last: u8) -> (Node, ManualClock) {
        node_with(Config::new(a(last), CLOCK_HZ))
    }

    fn rreq(orig: Address, orig_seqno: u32, hop_count: u8, dest: Address) -> RouteRequest {
        RouteRequest {
            flags: UAODV_RREQ_UNKSEQNO,
            hop_count,
            rreq_id: 1,
            dest_addr: dest,
            dest_seqno: 0,
            orig_addr: orig,
            orig_seqno,
        }
    }

    fn rrep(dest: Address, dest_seqno: u32, hop_count: u8, orig: Address) -> RouteReply {
        RouteReply {
            flags: 0,
            prefix_sz: 0,
            hop_count,
            dest_addr: dest,
            dest_seqno,
            orig_addr: orig,
            lifetime: UAODV_MY_ROUTE_TIMEOUT,
        }
    }

    /// Installs a route on `node` the way a RREP addressed to it would.
    fn learn(node: &mut Node, dest: Address, via: Address, hops: u8, seqno: u32) {
        let me = node.address();
        node.on_datagram(&rrep(dest, seqno, hops, me).to_bytes(), via, 1);
        assert!(node.transport.take().is_empty());
    }

    fn route(node: &Node, dest: Address) -> (Address, u8, u32) {
        let rt = node.routes().lookup(&dest).expect("no route");
        (rt.next_hop, rt.hop_count, rt.sequence_number)
    }

    #[test]
    fn test_engine_initialization() {
        let (node, _) = node(1);
        assert_eq!(node.address(), a(1));
        assert_eq!(node.sequence_number(), 0);
        assert_eq!(node.rreq_id(), 0);
        assert_eq!(node.config().rreq_interval, 16);
        assert_eq!(node.config().net_diameter, 20);
        assert!(node.routes().is_empty());
        assert!(!node.needs_poll());
    }

    #[test]
    fn test_reverse_route_freshness() {
        let (mut node, _) = node(1);
        let x = a(9);
        let elsewhere = a(50);

        node.on_datagram(&rreq(x, 5, 3, elsewhere).to_bytes(), a(2), 1);
        assert_eq!(route(&node, x), (a(2), 3, 5));

        // same sequence number, fewer hops
        node.on_datagram(&rreq(x, 5, 2, elsewhere).to_bytes(), a(3), 1);
        assert_eq!(route(&node, x), (a(3), 2, 5));

        // same sequence number, same hops
        node.on_datagram(&rreq(x, 5, 2, elsewhere).to_bytes(), a(4), 1);
        assert_eq!(route(&node, x), (a(3), 2, 5));

        // older sequence number, even if shorter
        node.on_datagram(&rreq(x, 4, 1, elsewhere).to_bytes(), a(4), 1);
        assert_eq!(route(&node, x), (a(3), 2, 5));

        // newer sequence number wins regardless of hops
        node.on_datagram(&rreq(x, 6, 5, elsewhere).to_bytes(), a(4), 1);
        assert_eq!(route(&node, x), (a(4), 5, 6));

        // out of hops, so none of these were forwarded
        assert!(node.transport.take().is_empty());
    }

    #[test]
    fn test_rreq_looped_back_is_ignored() {
        let (mut node, _) = node(1);
        node.on_datagram(&rreq(a(1), 3, 1, a(5)).to_bytes(), a(2), 10);
        assert!(node.routes().is_empty());
        assert!(node.transport.take().is_empty());
    }

    #[test]
    fn test_rreq_admission_filter() {
        fn only_even(sender: Address) -> bool {
            sender.0[3] % 2 == 0
        }
        let config = Config::new(a(1), CLOCK_HZ).with_admission_filter(only_even);
        let (mut node, _) = node_with(config);

        node.on_datagram(&rreq(a(9), 1, 1, a(1)).to_bytes(), a(3), 10);
        assert!(node.routes().is_empty());
        assert!(node.transport.take().is_empty());

        node.on_datagram(&rreq(a(9), 1, 1, a(1)).to_bytes(), a(4), 10);
        assert_eq!(route(&node, a(9)), (a(4), 1, 1));
        assert_eq!(node.transport.take().len(), 1);
    }

    #[test]
    fn test_rreq_for_self_replies_with_fresh_seqno() {
        let (mut node, _) = node(1);
        node.restore(10, 0);

        let mut rm = rreq(a(9), 1, 2, a(1));
        rm.flags = 0;
        rm.dest_seqno = 15;
        node.on_datagram(&rm.to_bytes(), a(2), 10);

        // 16, not 11: an earlier incarnation already advertised 15.
        assert_eq!(node.sequence_number(), 16);
        let sent = node.transport.take();
        assert_eq!(sent.len(), 1);
        let Sent::Unicast { next_hop, .. } = &sent[0] else {
            panic!("RREP must be unicast");
        };
        assert_eq!(*next_hop, a(2));
        assert_eq!(
            sent[0].message(),
            Message::Rrep(rrep(a(1), 16, 0, a(9)))
        );
    }

    #[test]
    fn test_rreq_for_self_unknown_seqno_bumps_by_one() {
        let (mut node, _) = node(1);
        node.restore(10, 0);

        let mut rm = rreq(a(9), 1, 0, a(1));
        rm.dest_seqno = 15;
        node.on_datagram(&rm.to_bytes(), a(9), 10);

        assert_eq!(node.sequence_number(), 11);
        let sent = node.transport.take();
        assert_eq!(sent[0].message(), Message::Rrep(rrep(a(1), 11, 0, a(9))));
    }

    #[test]
    fn test_rreq_answered_from_fresh_cache() {
        let (mut node, _) = node(1);
        learn(&mut node, a(5), a(3), 2, 7);

        let mut rm = rreq(a(9), 1, 1, a(5));
        rm.flags = 0;
        rm.dest_seqno = 7;
        node.on_datagram(&rm.to_bytes(), a(2), 10);

        let sent = node.transport.take();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0],
            Sent::Unicast {
                next_hop: a(2),
                payload: rrep(a(5), 7, 3, a(9)).to_bytes().to_vec(),
            }
        );
    }

    #[test]
    fn test_rreq_unknown_seqno_answered_from_cache() {
        let (mut node, _) = node(1);
        learn(&mut node, a(5), a(3), 2, 7);

        node.on_datagram(&rreq(a(9), 1, 1, a(5)).to_bytes(), a(2), 10);
        let sent = node.transport.take();
        assert_eq!(sent[0].message(), Message::Rrep(rrep(a(5), 7, 3, a(9))));
    }

    #[test]
    fn test_rreq_stale_cache_is_forwarded() {
        let (mut node, _) = node(1);
        learn(&mut node, a(5), a(3), 2, 7);

        let mut rm = rreq(a(9), 1, 1, a(5));
        rm.flags = 0;
        rm.dest_seqno = 8;
        node.on_datagram(&rm.to_bytes(), a(2), 10);

        let sent = node.transport.take();
        assert_eq!(sent.len(), 1);
        assert!(matches!(sent[0], Sent::Broadcast { ttl: 9, .. }));
    }

    #[test]
    fn test_rreq_destination_only_is_forwarded() {
        let (mut node, _) = node(1);
        learn(&mut node, a(5), a(3), 2, 7);

        let mut rm = rreq(a(9), 1, 1, a(5));
        rm.flags |= UAODV_RREQ_DESTONLY;
        node.on_datagram(&rm.to_bytes(), a(2), 10);

        let sent = node.transport.take();
        assert_eq!(sent.len(), 1);
        assert!(matches!(sent[0], Sent::Broadcast { .. }));
    }

    #[test]
    fn test_rreq_forwarded_once() {
        let (mut node, _) = node(1);
        let rm = rreq(a(9), 1, 2, a(5));

        node.on_datagram(&rm.to_bytes(), a(2), 6);
        node.on_datagram(&rm.to_bytes(), a(3), 6);

        let sent = node.transport.take();
        assert_eq!(sent.len(), 1);
        let Sent::Broadcast { payload, ttl } = &sent[0] else {
            panic!("RREQ must be rebroadcast");
        };
        assert_eq!(*ttl, 5);
        assert_eq!(payload.len(), UAODV_RREQ_LEN);
        let mut expected = rm;
        expected.hop_count = 3;
        assert_eq!(sent[0].message(), Message::Rreq(expected));

        // A new request id from the same originator goes through again.
        let mut next = rm;
        next.rreq_id = 2;
        next.orig_seqno = 2;
        node.on_datagram(&next.to_bytes(), a(2), 6);
        assert_eq!(node.transport.take().len(), 1);
    }

    #[test]
    fn test_rreq_out_of_hops_dropped() {
        let (mut node, _) = node(1);
        node.on_datagram(&rreq(a(9), 1, 2, a(5)).to_bytes(), a(2), 1);
        node.on_datagram(&rreq(a(8), 1, 2, a(5)).to_bytes(), a(2), 0);
        assert!(node.transport.take().is_empty());
        // the reverse route is still learned
        assert_eq!(route(&node, a(9)), (a(2), 2, 1));
    }

    #[test]
    fn test_rrep_installs_forward_route() {
        let (mut node, _) = node(1);
        learn(&mut node, a(5), a(3), 2, 7);
        assert_eq!(route(&node, a(5)), (a(3), 2, 7));

        // Equal sequence number never refreshes a forward route, even if shorter.
        learn(&mut node, a(5), a(4), 1, 7);
        assert_eq!(route(&node, a(5)), (a(3), 2, 7));

        learn(&mut node, a(5), a(4), 4, 8);
        assert_eq!(route(&node, a(5)), (a(4), 4, 8));
    }

    #[test]
    fn test_rrep_ack_requested() {
        let (mut node, _) = node(1);
        let mut rm = rrep(a(5), 3, 0, a(1));
        rm.flags = UAODV_RREP_ACK;
        node.on_datagram(&rm.to_bytes(), a(5), 1);

        let sent = node.transport.take();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0],
            Sent::Unicast {
                next_hop: a(5),
                payload: [UAODV_RREP_ACK_TYPE, 0].to_vec(),
            }
        );
        assert_eq!(sent[0].message(), Message::RrepAck);
    }

    #[test]
    fn test_rrep_relayed_towards_originator() {
        let (mut node, _) = node(2);
        learn(&mut node, a(1), a(1), 0, 4);

        let mut rm = rrep(a(5), 3, 1, a(1));
        rm.flags = UAODV_RREP_ACK;
        node.on_datagram(&rm.to_bytes(), a(3), 1);

        assert_eq!(route(&node, a(5)), (a(3), 1, 3));
        let sent = node.transport.take();
        assert_eq!(
            sent,
            [Sent::Unicast {
                next_hop: a(1),
                payload: rrep(a(5), 3, 2, a(1)).to_bytes().to_vec(),
            }]
        );
    }

    #[test]
    fn test_rrep_without_reverse_route_dropped() {
        let (mut node, _) = node(2);
        node.on_datagram(&rrep(a(5), 3, 1, a(1)).to_bytes(), a(3), 1);
        assert!(node.transport.take().is_empty());
        // the forward route is still learned
        assert_eq!(route(&node, a(5)), (a(3), 1, 3));
    }

    #[test]
    fn test_hello_ignored_by_default() {
        let (mut node, _) = node(1);
        node.on_datagram(&rrep(Address::BROADCAST, 4, 0, a(7)).to_bytes(), a(7), 1);
        assert!(node.routes().is_empty());
        assert!(node.transport.take().is_empty());
    }

    #[test]
    fn test_hello_answered_when_enabled() {
        let (mut node, _) = node_with(Config::new(a(1), CLOCK_HZ).with_hello_replies(true));
        node.restore(3, 0);
        node.on_datagram(&rrep(Address::BROADCAST, 4, 0, a(7)).to_bytes(), a(7), 1);

        assert!(node.routes().is_empty());
        let sent = node.transport.take();
        assert_eq!(
            sent,
            [Sent::Unicast {
                next_hop: a(7),
                payload: rrep(a(1), 3, 0, a(7)).to_bytes().to_vec(),
            }]
        );
    }

    #[test]
    fn test_rerr_only_from_current_next_hop() {
        let (mut node, _) = node(1);
        learn(&mut node, a(5), a(3), 2, 7);

        let rm = RouteError {
            flags: 0,
            addr: a(5),
            seqno: 7,
        };
        node.on_datagram(&rm.to_bytes(), a(4), 1);
        assert!(node.transport.take().is_empty());
        assert!(node.routes().lookup(&a(5)).is_some());

        node.on_datagram(&rm.to_bytes(), a(3), 1);
        assert!(node.routes().lookup(&a(5)).is_none());
        assert!(node.routes().lookup_any(&a(5)).unwrap().is_bad);
        assert_eq!(
            node.transport.take(),
            [Sent::Broadcast {
                payload: rm.to_bytes().to_vec(),
                ttl: 20,
            }]
        );
    }

    #[test]
    fn test_rerr_older_than_route_ignored() {
        let (mut node, _) = node(1);
        learn(&mut node, a(5), a(3), 2, 7);

        let rm = RouteError {
            flags: 0,
            addr: a(5),
            seqno: 6,
        };
        node.on_datagram(&rm.to_bytes(), a(3), 1);
        assert!(node.routes().lookup(&a(5)).is_some());
        assert!(node.transport.take().is_empty());
    }

    #[test]
    fn test_rerr_zero_seqno_accepted() {
        let (mut node, _) = node(1);
        learn(&mut node, a(5), a(3), 2, 7);

        let rm = RouteError {
            flags: 0,
            addr: a(5),
            seqno: 0,
        };
        node.on_datagram(&rm.to_bytes(), a(3), 1);

        assert!(node.routes().lookup(&a(5)).is_none());
        assert!(node.routes().lookup_any(&a(5)).unwrap().is_bad);
        assert_eq!(
            node.transport.take(),
            [Sent::Broadcast {
                payload: rm.to_bytes().to_vec(),
                ttl: 20,
            }]
        );
    }

    #[test]
    fn test_broken_route_repaired_by_equal_seqno_reply() {
        let (mut node, _) = node(1);
        learn(&mut node, a(5), a(3), 2, 7);
        node.bad_dest(a(5));
        node.on_poll();
        let _ = node.transport.take();

        assert!(node.request_route_to(a(5)).is_err());
        node.on_poll();
        let Message::Rreq(rm) = node.transport.take()[0].message() else {
            panic!("expected a RREQ");
        };
        assert_eq!(rm.dest_seqno, 7);

        // a neighbour with a good seq 7 route answers
        learn(&mut node, a(5), a(4), 3, 7);
        assert_eq!(route(&node, a(5)), (a(4), 3, 7));
        let route = node.request_route_to(a(5)).unwrap();
        assert_eq!(route.next_hop, a(4));
        assert!(!node.needs_poll());
    }

    #[test]
    fn test_rerr_unknown_seqno_filled_in() {
        let (mut node, _) = node(1);
        learn(&mut node, a(5), a(3), 2, 7);

        let rm = RouteError {
            flags: UAODV_RERR_UNKNOWN,
            addr: a(5),
            seqno: 0,
        };
        node.on_datagram(&rm.to_bytes(), a(3), 1);

        assert!(node.routes().lookup(&a(5)).is_none());
        let sent = node.transport.take();
        assert_eq!(
            sent[0].message(),
            Message::Rerr(RouteError {
                flags: 0,
                addr: a(5),
                seqno: 7,
            })
        );
    }

    #[test]
    fn test_rerr_about_self_ignored() {
        let (mut node, _) = node(1);
        let rm = RouteError {
            flags: 0,
            addr: a(1),
            seqno: 0,
        };
        node.on_datagram(&rm.to_bytes(), a(3), 1);
        assert!(node.transport.take().is_empty());
    }

    #[test]
    fn test_request_route_sends_one_rreq() {
        let (mut node, _) = node(1);

        assert_eq!(node.request_route_to(a(5)), Err(nb::Error::WouldBlock));
        assert_eq!(node.pending(), Command::SendRreq(a(5)));
        node.on_poll();
        assert!(!node.needs_poll());

        let sent = node.transport.take();
        assert_eq!(sent.len(), 1);
        assert!(matches!(sent[0], Sent::Broadcast { ttl: 20, .. }));
        assert_eq!(
            sent[0].message(),
            Message::Rreq(RouteRequest {
                flags: UAODV_RREQ_UNKSEQNO,
                hop_count: 0,
                rreq_id: 1,
                dest_addr: a(5),
                dest_seqno: 0,
                orig_addr: a(1),
                orig_seqno: 1,
            })
        );
        assert_eq!(node.sequence_number(), 1);
        assert_eq!(node.rreq_id(), 1);
    }

    #[test]
    fn test_request_route_rate_limited() {
        let (mut node, clock) = node(1);

        assert!(node.request_route_to(a(5)).is_err());
        node.on_poll();
        clock.advance(15);
        assert!(node.request_route_to(a(5)).is_err());
        assert!(!node.needs_poll());
        node.on_poll();
        assert_eq!(node.transport.take().len(), 1);

        clock.advance(1);
        assert!(node.request_route_to(a(5)).is_err());
        assert!(node.needs_poll());
        node.on_poll();
        assert_eq!(node.transport.take().len(), 1);
    }

    #[test]
    fn test_request_route_waits_for_pending_command() {
        let (mut node, clock) = node(1);
        node.bad_dest(a(7));
        assert!(node.request_route_to(a(5)).is_err());
        assert!(matches!(node.pending(), Command::SendRerr { .. }));

        node.on_poll();
        clock.advance(1);
        assert!(node.request_route_to(a(5)).is_err());
        assert_eq!(node.pending(), Command::SendRreq(a(5)));
    }

    #[test]
    fn test_request_route_returns_cached_route() {
        let (mut node, _) = node(1);
        learn(&mut node, a(5), a(3), 2, 7);
        learn(&mut node, a(6), a(3), 2, 7);

        let route = node.request_route_to(a(5)).unwrap();
        assert_eq!(route.next_hop, a(3));
        assert!(!node.needs_poll());
        // promoted to most recently used
        assert_eq!(node.routes().iter().next().unwrap().destination, a(5));
    }

    #[test]
    fn test_pending_rreq_dropped_when_route_appears() {
        let (mut node, _) = node(1);
        assert!(node.request_route_to(a(5)).is_err());
        learn(&mut node, a(5), a(3), 2, 7);
        node.on_poll();
        assert!(node.transport.take().is_empty());
        assert_eq!(node.rreq_id(), 0);
    }

    #[test]
    fn test_timer_tick_waits_for_poll_delay() {
        let (mut node, clock) = node(1);
        assert!(node.request_route_to(a(5)).is_err());

        node.on_timer_tick();
        clock.advance(1);
        node.on_timer_tick();
        assert!(node.transport.take().is_empty());

        clock.advance(1);
        node.on_timer_tick();
        assert_eq!(node.transport.take().len(), 1);
        assert!(!node.needs_poll());
    }

    #[test]
    fn test_bad_dest_known_route() {
        let (mut node, _) = node(1);
        learn(&mut node, a(5), a(3), 2, 7);
        assert!(node.request_route_to(a(6)).is_err());

        // replaces the pending RREQ
        node.bad_dest(a(5));
        assert!(node.routes().lookup(&a(5)).is_none());
        assert_eq!(
            node.pending(),
            Command::SendRerr {
                dest: a(5),
                seqno: 7
            }
        );

        node.on_poll();
        let sent = node.transport.take();
        assert_eq!(
            sent,
            [Sent::Broadcast {
                payload: RouteError {
                    flags: 0,
                    addr: a(5),
                    seqno: 7,
                }
                .to_bytes()
                .to_vec(),
                ttl: 20,
            }]
        );
    }

    #[test]
    fn test_bad_dest_unknown_route() {
        let (mut node, _) = node(1);
        node.bad_dest(a(5));
        node.on_poll();
        let sent = node.transport.take();
        assert_eq!(
            sent[0].message(),
            Message::Rerr(RouteError {
                flags: UAODV_RERR_UNKNOWN,
                addr: a(5),
                seqno: 0,
            })
        );
    }

    #[test]
    fn test_rreq_carries_last_known_seqno() {
        let (mut node, clock) = node(1);
        learn(&mut node, a(5), a(3), 2, 7);
        node.bad_dest(a(5));
        node.on_poll();
        let _ = node.transport.take();

        clock.advance(16);
        assert!(node.request_route_to(a(5)).is_err());
        node.on_poll();
        let sent = node.transport.take();
        let Message::Rreq(rm) = sent[0].message() else {
            panic!("expected a RREQ");
        };
        assert_eq!(rm.flags, 0);
        assert_eq!(rm.dest_seqno, 7);
    }

    #[test]
    fn test_counters() {
        let (mut node, _) = node(1);
        node.on_datagram(&[], a(2), 1);
        node.on_datagram(&[7, 0, 0, 0], a(2), 1);
        assert_eq!(node.rx_bad, 2);
        assert_eq!(node.rx_good, 0);

        node.transport.fail = true;
        node.on_datagram(&rreq(a(9), 1, 0, a(1)).to_bytes(), a(9), 1);
        assert_eq!(node.rx_good, 1);
        assert_eq!(node.tx_bad, 1);
        assert_eq!(node.tx_good, 0);

        node.transport.fail = false;
        node.bad_dest(a(9));
        node.on_poll();
        assert_eq!(node.tx_good, 1);
    }

    #[test]
    fn test_shutdown_flushes_state() {
        let (mut node, _) = node(1);
        learn(&mut node, a(5), a(3), 2, 7);
        assert!(node.request_route_to(a(6)).is_err());

        node.shutdown();
        assert!(node.routes().is_empty());
        assert!(!node.needs_poll());
        node.on_poll();
        assert!(node.transport.take().is_empty());
    }

    /// Hands everything `from` sent to `to`, as the radio would.
    fn deliver(from: &mut Node, to: &mut Node, ttl: u8) -> usize {
        let sender = from.address();
        let sent = from.transport.take();
        for msg in &sent {
            to.on_datagram(msg.payload(), sender, ttl);
        }
        sent.len()
    }

    #[test]
    fn test_three_node_route_discovery() {
        let (mut node_a, _) = node(1);
        let (mut node_b, _) = node(2);
        let (mut node_c, _) = node(3);
        let (a_addr, b_addr, c_addr) = (a(1), a(2), a(3));

        assert!(node_a.request_route_to(c_addr).is_err());
        node_a.on_poll();
        let sent = node_a.transport.sent.clone();
        assert_eq!(
            sent[0].message(),
            Message::Rreq(RouteRequest {
                flags: UAODV_RREQ_UNKSEQNO,
                hop_count: 0,
                rreq_id: 1,
                dest_addr: c_addr,
                dest_seqno: 0,
                orig_addr: a_addr,
                orig_seqno: 1,
            })
        );

        // A -> B: B has no route to C and forwards
        assert_eq!(deliver(&mut node_a, &mut node_b, 20), 1);
        let forwarded = node_b.transport.sent.clone();
        let Message::Rreq(fw) = forwarded[0].message() else {
            panic!("B must forward the RREQ");
        };
        assert_eq!(fw.hop_count, 1);

        // B -> C: C is the destination and replies to B
        assert_eq!(deliver(&mut node_b, &mut node_c, 19), 1);
        assert_eq!(node_c.sequence_number(), 1);
        assert_eq!(route(&node_c, a_addr), (b_addr, 1, 1));
        let reply = node_c.transport.sent.clone();
        assert!(matches!(reply[0], Sent::Unicast { next_hop, .. } if next_hop == b_addr));
        assert_eq!(reply[0].message(), Message::Rrep(rrep(c_addr, 1, 0, a_addr)));

        // C -> B: B relays to A
        assert_eq!(deliver(&mut node_c, &mut node_b, 1), 1);
        assert_eq!(route(&node_b, c_addr), (c_addr, 0, 1));
        let relayed = node_b.transport.sent.clone();
        assert!(matches!(relayed[0], Sent::Unicast { next_hop, .. } if next_hop == a_addr));

        // B -> A: route complete
        assert_eq!(deliver(&mut node_b, &mut node_a, 1), 1);
        assert!(node_a.transport.take().is_empty());
        let route = node_a.request_route_to(c_addr).unwrap();
        assert_eq!(route.next_hop, b_addr);
        assert_eq!(route.hop_count, 1);
        assert_eq!(route.sequence_number, 1);
        assert!(!node_a.needs_poll());
        node_a.on_poll();
        assert!(node_a.transport.take().is_empty());
    }
}
