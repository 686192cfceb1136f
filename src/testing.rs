//! Test doubles for the engine's collaborators.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::vec::Vec;

use crate::addr::Address;
use crate::msg::Message;
use crate::timer::{Clock, Ticks};
use crate::transport::Transport;

/// One message handed to [`RecordingTransport`].
#[derive(PartialEq, Eq, Clone, Debug)]
pub(crate) enum Sent {
    Broadcast { payload: Vec<u8>, ttl: u8 },
    Unicast { next_hop: Address, payload: Vec<u8> },
}

impl Sent {
    pub(crate) fn payload(&self) -> &[u8] {
        match self {
            Sent::Broadcast { payload, .. } | Sent::Unicast { payload, .. } => payload,
        }
    }

    pub(crate) fn message(&self) -> Message {
        Message::decode(self.payload()).expect("engine sent an undecodable message")
    }
}

/// Records every send; fails them all while `fail` is set.
#[derive(Default, Debug)]
pub(crate) struct RecordingTransport {
    pub(crate) sent: Vec<Sent>,
    pub(crate) fail: bool,
}

impl RecordingTransport {
    pub(crate) fn take(&mut self) -> Vec<Sent> {
        core::mem::take(&mut self.sent)
    }
}

impl Transport for RecordingTransport {
    type Error = ();

    fn broadcast(&mut self, payload: &[u8], ttl: u8) -> Result<(), ()> {
        if self.fail {
            return Err(());
        }
        self.sent.push(Sent::Broadcast {
            payload: payload.to_vec(),
            ttl,
        });
        Ok(())
    }

    fn unicast(&mut self, next_hop: Address, payload: &[u8]) -> Result<(), ()> {
        if self.fail {
            return Err(());
        }
        self.sent.push(Sent::Unicast {
            next_hop,
            payload: payload.to_vec(),
        });
        Ok(())
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Clone, Default, Debug)]
pub(crate) struct ManualClock(Arc<AtomicU32>);

impl ManualClock {
    pub(crate) fn advance(&self, ticks: Ticks) {
        let _ = self.0.fetch_add(ticks, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Ticks {
        self.0.load(Ordering::SeqCst)
    }
}
