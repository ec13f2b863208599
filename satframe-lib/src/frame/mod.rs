//! Radio link framing.
//!
//! A frame wraps 1 to [MAX_PAYLOAD] bytes of payload between a sync byte, a length
//! byte and a big-endian CRC-16/CCITT-FALSE:
//!
//! ```text
//! +------+--------+-----------------+--------+--------+
//! | 0xAA | length | payload         | crc hi | crc lo |
//! +------+--------+-----------------+--------+--------+
//! ```
//!
//! The CRC covers the sync byte, the length byte and the payload.
mod channel;
mod decoder;
mod reader;

pub use channel::*;
pub use decoder::*;
pub use reader::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{crc, Error, Result};

/// Frame synchronization byte.
pub const SYNC: u8 = 0xaa;
/// Maximum number of payload bytes in a single frame.
pub const MAX_PAYLOAD: usize = 64;
// MAX_PAYLOAD as it appears on the wire.
const MAX_LENGTH: u8 = 64;

/// Checksum over the portion of a frame covered by its CRC, i.e., the sync byte, the
/// length byte and the payload.
///
/// This is the only place the covered range is assembled; both [encode] and
/// [ParserContext] go through here.
#[must_use]
pub fn frame_crc(length: u8, payload: &[u8]) -> u16 {
    let mut digest = crc::digest();
    digest.update(&[SYNC, length]);
    digest.update(payload);
    digest.finalize()
}

/// A single link frame.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Frame {
    pub sync: u8,
    /// Number of payload bytes
    pub length: u8,
    pub payload: Vec<u8>,
    /// Checksum computed by [frame_crc]
    pub crc: u16,
}

impl Frame {
    /// Number of bytes preceding the payload
    pub const HEADER_LEN: usize = 2;
    /// Number of checksum bytes following the payload
    pub const CRC_LEN: usize = 2;
    /// Total non-payload bytes in a frame
    pub const OVERHEAD: usize = Self::HEADER_LEN + Self::CRC_LEN;

    /// Length of this frame on the wire.
    #[must_use]
    pub fn wire_len(&self) -> usize {
        Self::OVERHEAD + self.payload.len()
    }

    /// Serialize to wire bytes.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.wire_len());
        buf.push(self.sync);
        buf.push(self.length);
        buf.extend_from_slice(&self.payload);
        buf.extend_from_slice(&self.crc.to_be_bytes());
        buf
    }

    /// Serialize into `out`, returning the number of bytes written.
    ///
    /// # Errors
    /// [Error::NotEnoughData] if `out` cannot hold the whole frame.
    pub fn write_into(&self, out: &mut [u8]) -> Result<usize> {
        let n = self.wire_len();
        if out.len() < n {
            return Err(Error::NotEnoughData {
                actual: out.len(),
                minimum: n,
            });
        }
        out[0] = self.sync;
        out[1] = self.length;
        out[Self::HEADER_LEN..n - Self::CRC_LEN].copy_from_slice(&self.payload);
        out[n - Self::CRC_LEN..n].copy_from_slice(&self.crc.to_be_bytes());
        Ok(n)
    }

    /// Strictly decode a single frame that starts at the first byte of `dat`. Any bytes
    /// following the frame are ignored.
    ///
    /// Use [ParserContext] to decode frames from a stream that may contain noise.
    ///
    /// # Errors
    /// [Error::InvalidSync] or [Error::InvalidLength] for malformed headers,
    /// [Error::NotEnoughData] if `dat` is truncated and [Error::ChecksumMismatch] if the
    /// frame fails its integrity check.
    pub fn decode(dat: &[u8]) -> Result<Frame> {
        if dat.len() < Self::HEADER_LEN {
            return Err(Error::NotEnoughData {
                actual: dat.len(),
                minimum: Self::OVERHEAD + 1,
            });
        }
        if dat[0] != SYNC {
            return Err(Error::InvalidSync(dat[0]));
        }
        let length = dat[1];
        if length == 0 || length > MAX_LENGTH {
            return Err(Error::InvalidLength(length));
        }
        let n = Self::OVERHEAD + usize::from(length);
        if dat.len() < n {
            return Err(Error::NotEnoughData {
                actual: dat.len(),
                minimum: n,
            });
        }

        let payload = &dat[Self::HEADER_LEN..n - Self::CRC_LEN];
        let received = u16::from_be_bytes([dat[n - 2], dat[n - 1]]);
        let computed = frame_crc(length, payload);
        if computed != received {
            return Err(Error::ChecksumMismatch { computed, received });
        }

        Ok(Frame {
            sync: SYNC,
            length,
            payload: payload.to_vec(),
            crc: received,
        })
    }
}

/// Encode `payload` into a [Frame].
///
/// # Errors
/// [Error::EmptyPayload] if `payload` is empty, or [Error::PayloadTooLarge] if it is
/// longer than [MAX_PAYLOAD]. Such frames could never be accepted by a decoder.
///
/// # Examples
/// ```
/// use satframe::frame::{encode, SYNC};
///
/// let frame = encode(&[0xde, 0xad, 0xbe, 0xef]).unwrap();
/// assert_eq!(frame.sync, SYNC);
/// assert_eq!(frame.length, 4);
/// assert_eq!(frame.crc, 0x246b);
/// ```
pub fn encode(payload: &[u8]) -> Result<Frame> {
    if payload.is_empty() {
        return Err(Error::EmptyPayload);
    }
    let length = u8::try_from(payload.len())
        .ok()
        .filter(|n| *n <= MAX_LENGTH)
        .ok_or(Error::PayloadTooLarge {
            actual: payload.len(),
            max: MAX_PAYLOAD,
        })?;

    Ok(Frame {
        sync: SYNC,
        length,
        payload: payload.to_vec(),
        crc: frame_crc(length, payload),
    })
}
