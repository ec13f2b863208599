#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{Outcome, ParserContext};
use crate::router::Router;

/// Running totals for a [Channel].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChannelStats {
    /// Bytes pushed into the channel
    pub bytes: u64,
    /// Frames that passed their integrity check and were routed
    pub accepted: u64,
    /// Frames dropped due to a checksum mismatch
    pub rejected: u64,
}

/// A receive channel: a [ParserContext] whose accepted payloads are delivered to a
/// [Router].
///
/// # Examples
/// ```
/// use satframe::frame::{encode, Channel};
///
/// let mut received: Vec<Vec<u8>> = Vec::new();
/// let mut channel = Channel::new(|payload: &[u8]| received.push(payload.to_vec()));
/// channel.extend(&encode(&[0xb2, 15]).unwrap().to_bytes());
/// assert_eq!(channel.stats().accepted, 1);
/// drop(channel);
///
/// assert_eq!(received, vec![vec![0xb2, 15]]);
/// ```
#[derive(Debug)]
pub struct Channel<R>
where
    R: Router,
{
    ctx: ParserContext,
    router: R,
    stats: ChannelStats,
}

impl<R> Channel<R>
where
    R: Router,
{
    pub fn new(router: R) -> Self {
        Self::with_context(ParserContext::new(), router)
    }

    /// Create a channel using a pre-configured context, e.g., one with an idle timeout.
    pub fn with_context(ctx: ParserContext, router: R) -> Self {
        Channel {
            ctx,
            router,
            stats: ChannelStats::default(),
        }
    }

    /// Push a single byte, routing the payload if it completes a valid frame.
    pub fn push(&mut self, byte: u8) -> Outcome<'_> {
        self.stats.bytes += 1;
        let outcome = self.ctx.push(byte);
        deliver(&outcome, &mut self.router, &mut self.stats);
        outcome
    }

    /// Push a single byte received at `now_ms`. See [ParserContext::push_at].
    pub fn push_at(&mut self, byte: u8, now_ms: u64) -> Outcome<'_> {
        self.stats.bytes += 1;
        let outcome = self.ctx.push_at(byte, now_ms);
        deliver(&outcome, &mut self.router, &mut self.stats);
        outcome
    }

    /// Push all of `dat`, returning the number of frames accepted.
    pub fn extend(&mut self, dat: &[u8]) -> usize {
        dat.iter()
            .filter(|b| matches!(self.push(**b), Outcome::Accepted(_)))
            .count()
    }

    /// Abandon any frame in flight. Counters are kept.
    pub fn reset(&mut self) {
        self.ctx.reset();
    }

    #[must_use]
    pub fn stats(&self) -> ChannelStats {
        self.stats
    }

    #[must_use]
    pub fn context(&self) -> &ParserContext {
        &self.ctx
    }

    #[must_use]
    pub fn router(&self) -> &R {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut R {
        &mut self.router
    }

    pub fn into_router(self) -> R {
        self.router
    }
}

fn deliver<R>(outcome: &Outcome<'_>, router: &mut R, stats: &mut ChannelStats)
where
    R: Router,
{
    match outcome {
        Outcome::Accepted(payload) => {
            stats.accepted += 1;
            trace!(len = payload.len(), "routing frame payload");
            router.route(payload);
        }
        Outcome::Rejected { .. } => stats.rejected += 1,
        Outcome::Incomplete => {}
    }
}
