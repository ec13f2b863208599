//! Delivery of accepted frame payloads.
use std::collections::HashMap;
use std::fmt::Debug;

use tracing::{debug, trace};

use crate::spacepacket::{self, Apid, PrimaryHeader};

/// Receives the payload of every frame that passes its integrity check.
pub trait Router {
    fn route(&mut self, payload: &[u8]);
}

impl<F> Router for F
where
    F: FnMut(&[u8]),
{
    fn route(&mut self, payload: &[u8]) {
        self(payload);
    }
}

type Handler<'a> = Box<dyn FnMut(&[u8]) + 'a>;

/// [Router] that dispatches space packet payloads to a handler registered for the
/// packet's APID.
///
/// Idle packets are dropped. Payloads too short to be a space packet, or whose APID has no
/// handler, are counted as unrouted.
///
/// # Examples
/// ```
/// use satframe::router::{ApidRouter, Router};
/// use satframe::spacepacket::{apid, wrap};
///
/// let mut count = 0;
/// let mut router = ApidRouter::new().with_handler(apid::ADCS, |_: &[u8]| count += 1);
///
/// router.route(&wrap(apid::ADCS, &[0x01], 0).unwrap());
/// router.route(&wrap(apid::EPS, &[0x01], 0).unwrap());
/// assert_eq!(router.unrouted_count(), 1);
/// drop(router);
///
/// assert_eq!(count, 1);
/// ```
#[derive(Default)]
pub struct ApidRouter<'a> {
    handlers: HashMap<Apid, Handler<'a>>,
    idle: u64,
    unrouted: u64,
}

impl<'a> ApidRouter<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `apid`, replacing any existing handler.
    pub fn register<F>(&mut self, apid: Apid, handler: F)
    where
        F: FnMut(&[u8]) + 'a,
    {
        let apid = apid & spacepacket::APID_MASK;
        if self.handlers.insert(apid, Box::new(handler)).is_some() {
            debug!(apid, "replaced handler");
        }
    }

    #[must_use]
    pub fn with_handler<F>(mut self, apid: Apid, handler: F) -> Self
    where
        F: FnMut(&[u8]) + 'a,
    {
        self.register(apid, handler);
        self
    }

    /// Number of idle packets dropped.
    #[must_use]
    pub fn idle_count(&self) -> u64 {
        self.idle
    }

    /// Number of payloads dropped because they had no handler.
    #[must_use]
    pub fn unrouted_count(&self) -> u64 {
        self.unrouted
    }
}

impl Router for ApidRouter<'_> {
    fn route(&mut self, payload: &[u8]) {
        if payload.len() < PrimaryHeader::LEN {
            debug!(len = payload.len(), "payload too short for a space packet");
            self.unrouted += 1;
            return;
        }
        let apid = spacepacket::source_id(payload);
        if apid == spacepacket::apid::IDLE {
            trace!("dropping idle packet");
            self.idle += 1;
            return;
        }
        match self.handlers.get_mut(&apid) {
            Some(handler) => handler(payload),
            None => {
                debug!(apid, "no handler for apid");
                self.unrouted += 1;
            }
        }
    }
}

impl Debug for ApidRouter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut apids: Vec<&Apid> = self.handlers.keys().collect();
        apids.sort();
        f.debug_struct("ApidRouter")
            .field("apids", &apids)
            .field("idle", &self.idle)
            .field("unrouted", &self.unrouted)
            .finish()
    }
}
