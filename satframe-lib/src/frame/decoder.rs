use tracing::{debug, trace};
use typed_builder::TypedBuilder;

use super::{frame_crc, MAX_LENGTH, MAX_PAYLOAD, SYNC};

/// Decoder state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum State {
    /// Discarding bytes until a sync byte is seen.
    #[default]
    SearchingForStart,
    ReadingLength,
    ReadingPayload,
    /// Collecting the two CRC bytes, high byte first.
    VerifyingCrc,
}

/// Result of pushing a single byte into a [ParserContext].
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome<'a> {
    /// More bytes are needed. Also returned for bytes discarded while synchronizing.
    Incomplete,
    /// A complete frame passed its integrity check.
    Accepted(&'a [u8]),
    /// A complete frame failed its integrity check and was dropped.
    Rejected { computed: u16, received: u16 },
}

/// Incremental, byte-at-a-time frame decoder for a single logical channel.
///
/// Leading noise is discarded until a sync byte is found. A length byte outside of
/// `1..=MAX_PAYLOAD` drops back to searching, and the decoder always returns to searching
/// once both CRC bytes of a frame have been read, whether the frame was good or not.
/// Feeding any byte sequence can therefore never leave the decoder stuck.
///
/// A context is an owned value; use one per channel.
///
/// # Examples
/// ```
/// use satframe::frame::{encode, Outcome, ParserContext};
///
/// let frame = encode(&[0x01, 0x02, 0x03]).unwrap();
/// let mut stream = vec![0xff, 0x00];
/// stream.extend(frame.to_bytes());
///
/// let mut ctx = ParserContext::new();
/// let mut found = Vec::new();
/// for b in stream {
///     if let Outcome::Accepted(payload) = ctx.push(b) {
///         found.push(payload.to_vec());
///     }
/// }
/// assert_eq!(found, vec![vec![0x01, 0x02, 0x03]]);
/// ```
///
/// With an idle timeout, a frame interrupted for longer than the timeout is abandoned
/// when the next byte arrives via [ParserContext::push_at]:
/// ```
/// use satframe::frame::{ParserContext, State};
///
/// let mut ctx = ParserContext::builder().idle_timeout_ms(50).build();
/// ctx.push_at(0xaa, 0);
/// assert_eq!(ctx.state(), State::ReadingLength);
/// ctx.push_at(0x01, 100);
/// assert_eq!(ctx.state(), State::SearchingForStart);
/// ```
#[derive(Debug, Clone, TypedBuilder)]
pub struct ParserContext {
    /// Reset a partially read frame if no byte arrives within this many milliseconds.
    /// Only applies to [ParserContext::push_at].
    #[builder(default, setter(strip_option))]
    idle_timeout_ms: Option<u64>,

    #[builder(default, setter(skip))]
    state: State,
    #[builder(default = [0u8; MAX_PAYLOAD], setter(skip))]
    buf: [u8; MAX_PAYLOAD],
    // expected payload length from the length byte
    #[builder(default, setter(skip))]
    length: u8,
    // next payload index to fill
    #[builder(default, setter(skip))]
    filled: u8,
    #[builder(default, setter(skip))]
    crc_idx: u8,
    #[builder(default, setter(skip))]
    received_crc: u16,
    #[builder(default, setter(skip))]
    last_byte_ms: Option<u64>,
}

impl Default for ParserContext {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl ParserContext {
    /// Create a context in [State::SearchingForStart] with no idle timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> State {
        self.state
    }

    #[must_use]
    pub fn idle_timeout_ms(&self) -> Option<u64> {
        self.idle_timeout_ms
    }

    /// Number of payload bytes read so far for the frame in flight.
    #[must_use]
    pub fn filled(&self) -> usize {
        usize::from(self.filled)
    }

    /// Return to [State::SearchingForStart], abandoning any frame in flight.
    pub fn reset(&mut self) {
        self.state = State::SearchingForStart;
        self.buf = [0u8; MAX_PAYLOAD];
        self.length = 0;
        self.filled = 0;
        self.crc_idx = 0;
        self.received_crc = 0;
        self.last_byte_ms = None;
    }

    fn transition(&mut self, next: State) {
        trace!(from = ?self.state, to = ?next, "parser state");
        self.state = next;
    }

    /// Consume a single byte.
    ///
    /// An accepted payload borrows from this context and remains valid until the next
    /// byte is pushed.
    pub fn push(&mut self, byte: u8) -> Outcome<'_> {
        match self.state {
            State::SearchingForStart => {
                if byte == SYNC {
                    self.buf = [0u8; MAX_PAYLOAD];
                    self.length = 0;
                    self.transition(State::ReadingLength);
                }
            }
            State::ReadingLength => {
                if (1..=MAX_LENGTH).contains(&byte) {
                    self.length = byte;
                    self.filled = 0;
                    self.transition(State::ReadingPayload);
                } else {
                    trace!(length = byte, "invalid frame length; resynchronizing");
                    self.transition(State::SearchingForStart);
                }
            }
            State::ReadingPayload => {
                self.buf[usize::from(self.filled)] = byte;
                self.filled += 1;
                if self.filled >= self.length {
                    self.crc_idx = 0;
                    self.received_crc = 0;
                    self.transition(State::VerifyingCrc);
                }
            }
            State::VerifyingCrc => {
                if self.crc_idx == 0 {
                    self.received_crc = u16::from(byte) << 8;
                    self.crc_idx += 1;
                } else {
                    self.received_crc |= u16::from(byte);
                    // Unconditional, so a bad frame can never wedge the decoder
                    self.transition(State::SearchingForStart);

                    let received = self.received_crc;
                    let computed = frame_crc(self.length, &self.buf[..usize::from(self.length)]);
                    if computed == received {
                        return Outcome::Accepted(&self.buf[..usize::from(self.length)]);
                    }
                    debug!(
                        length = self.length,
                        computed,
                        received,
                        "frame failed crc check; dropping"
                    );
                    self.buf = [0u8; MAX_PAYLOAD];
                    return Outcome::Rejected { computed, received };
                }
            }
        }
        Outcome::Incomplete
    }

    /// Like [ParserContext::push], but first resets a frame in flight if the idle timeout
    /// has elapsed since the previous byte. `now_ms` must come from a monotonic source.
    pub fn push_at(&mut self, byte: u8, now_ms: u64) -> Outcome<'_> {
        if let (Some(timeout), Some(last)) = (self.idle_timeout_ms, self.last_byte_ms) {
            let idle = now_ms.saturating_sub(last);
            if self.state != State::SearchingForStart && idle > timeout {
                debug!(state = ?self.state, idle_ms = idle, "parser idle timeout; resetting");
                self.reset();
            }
        }
        self.last_byte_ms = Some(now_ms);
        self.push(byte)
    }
}
