//! # uaodv
//!
//! A portable, no_std Rust implementation of micro AODV (uAODV), the reactive
//! ad hoc routing protocol of RFC 3561 trimmed down for small wireless nodes.
//!
//! The crate only does route discovery and maintenance. Forwarding data
//! packets is left to the host's IP layer, which asks the engine for a next
//! hop and reports back when a destination turns out to be unreachable.
//!
//! This crate implements:
//! - a bounded LRU route cache with "bad route" marking ([`rt::RouteTable`])
//! - a direct-mapped duplicate filter for forwarded requests ([`fwcache::ForwardCache`])
//! - RREQ / RREP / RERR handling and rate-limited route discovery ([`engine::Uaodv`])
//! - the big-endian wire format of all control messages ([`msg`])
//!
//! ## Crate features
//! | Feature               | Description |
//! |-----------------------|-------------|
//! | `std`                 | Disables `#![no_std]` |
//! | `delay-loop`          | Drives the engine from a blocking `embedded_hal::delay::DelayNs` loop |
//! | `timer-isr` (default) | Shares the engine with a timer interrupt through `critical_section` |
//! | `defmt-0-3`           | Uses `defmt` logging |
//! | `log`                 | Uses `log` logging |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use uaodv::{Address, Config, Uaodv};
//!
//! let mut node: Uaodv<_, _> = Uaodv::new(udp, clock, Config::new(MY_ADDR, CLOCK_HZ));
//! loop {
//!     while let Some((payload, sender, ttl)) = udp.recv() {
//!         node.on_datagram(payload, sender, ttl);
//!     }
//!     node.on_timer_tick();
//!     match node.request_route_to(peer) {
//!         Ok(route) => send_data(route.next_hop),
//!         Err(nb::Error::WouldBlock) => {}
//!     }
//! }
//! ```
//!
//! Or, share it with a timer interrupt:
//!
//! ```rust,ignore
//! uaodv::init_uaodv!(UdpTx, SysTick);
//!
//! #[interrupt]
//! fn TIM2() {
//!     uaodv::tick_uaodv!();
//! }
//! ```
//!
//! ## Integration Notes
//!
//! - Control messages travel as UDP payloads on port 654
//! - Only one engine should exist per node
//! - Routes never expire on their own; report failed deliveries through
//!   [`Uaodv::bad_dest`](engine::Uaodv::bad_dest)
//!
//! --
//! Designed for `#![no_std]` use in resource-constrained embedded environments.

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]

#![cfg_attr(not(feature = "std"), no_std)]

#[macro_use]
mod fmt;

#[cfg(feature = "timer-isr")]
pub use critical_section;

pub use heapless;
pub use nb;

pub mod addr;
pub mod consts;
pub mod engine;
pub mod error;
pub mod fwcache;
pub mod msg;
pub mod rt;
pub mod timer;
pub mod transport;

#[cfg(test)]
mod testing;

pub use addr::Address;
pub use engine::{Command, Config, Uaodv};
pub use error::Error;
pub use rt::{RouteEntry, RouteTable};
pub use transport::Transport;
