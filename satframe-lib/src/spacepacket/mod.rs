//! CCSDS space packets.
//!
//! Telemetry packets built here always carry a secondary header holding an 8 byte
//! big-endian mission elapsed time in milliseconds, followed by the user data:
//!
//! ```text
//! +----------------------+----------------------+-----------------+
//! | primary header (6)   | mission time (8)     | user data       |
//! +----------------------+----------------------+-----------------+
//! ```
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::time::TimeSource;
use crate::{Error, Result};

pub type Apid = u16;

/// Mask for the 11 APID bits of the packet identifier.
pub const APID_MASK: Apid = 0x7ff;

/// APIDs assigned to the on-board subsystems.
pub mod apid {
    use super::Apid;

    /// Attitude determination and control
    pub const ADCS: Apid = 0x010;
    /// Electrical power
    pub const EPS: Apid = 0x020;
    /// Fault detection, isolation and recovery
    pub const FDIR: Apid = 0x030;
    /// Command and data handling
    pub const CDHS: Apid = 0x040;
    /// Housekeeping
    pub const HK: Apid = 0x050;
    pub const ARCHIVE: Apid = 0x060;
    pub const PAYLOAD: Apid = 0x070;
    /// Idle/fill packets. These carry no telemetry.
    pub const IDLE: Apid = 0x7ff;
}

/// Sequence flags of a packet that is not part of a packet group, i.e., standalone.
pub const SEQ_UNSEGMENTED: u8 = 3;

/// CCSDS Primary Header
///
/// The primary header format is common to all CCSDS space packets.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PrimaryHeader {
    pub version: u8,
    pub type_flag: u8,
    pub has_secondary_header: bool,
    pub apid: Apid,
    /// Defines a packets grouping. Always [SEQ_UNSEGMENTED] for wrapped packets.
    pub sequence_flags: u8,
    pub sequence_id: u16,
    /// Number of bytes following the primary header, minus 1
    pub len_minus1: u16,
}

impl PrimaryHeader {
    /// Size of a ``PrimaryHeader``
    pub const LEN: usize = 6;

    /// Header of an unsegmented telemetry packet with a secondary header.
    #[must_use]
    pub fn telemetry(apid: Apid, len_minus1: u16) -> Self {
        PrimaryHeader {
            version: 0,
            type_flag: 1,
            has_secondary_header: true,
            apid: apid & APID_MASK,
            sequence_flags: SEQ_UNSEGMENTED,
            sequence_id: 0,
            len_minus1,
        }
    }

    /// Decode from bytes. Returns `None` if there are not enough bytes to construct the
    /// header.
    #[must_use]
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < Self::LEN {
            return None;
        }
        let d1 = u16::from_be_bytes([buf[0], buf[1]]);
        let d2 = u16::from_be_bytes([buf[2], buf[3]]);
        let d3 = u16::from_be_bytes([buf[4], buf[5]]);

        Some(PrimaryHeader {
            version: (d1 >> 13 & 0x7) as u8,
            type_flag: (d1 >> 12 & 0x1) as u8,
            has_secondary_header: (d1 >> 11 & 0x1) == 1,
            apid: (d1 & APID_MASK),
            sequence_flags: (d2 >> 14 & 0x3) as u8,
            sequence_id: (d2 & 0x3fff),
            len_minus1: d3,
        })
    }

    /// Encode to big-endian wire bytes. Fields wider than their bit allocation are
    /// truncated.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        let d1 = (u16::from(self.version) & 0x7) << 13
            | (u16::from(self.type_flag) & 0x1) << 12
            | u16::from(self.has_secondary_header) << 11
            | (self.apid & APID_MASK);
        let d2 = (u16::from(self.sequence_flags) & 0x3) << 14 | (self.sequence_id & 0x3fff);

        let mut buf = [0u8; Self::LEN];
        buf[..2].copy_from_slice(&d1.to_be_bytes());
        buf[2..4].copy_from_slice(&d2.to_be_bytes());
        buf[4..].copy_from_slice(&self.len_minus1.to_be_bytes());
        buf
    }

    /// Total packet length indicated by this header.
    #[must_use]
    pub fn packet_len(&self) -> usize {
        Self::LEN + usize::from(self.len_minus1) + 1
    }
}

/// Secondary header holding the mission elapsed time the packet was created.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SecondaryHeader {
    /// Milliseconds since the mission epoch
    pub mission_time_ms: u64,
}

impl SecondaryHeader {
    /// Size of a ``SecondaryHeader``
    pub const LEN: usize = 8;

    /// Decode from the bytes immediately following the primary header. Returns `None` if
    /// there are not enough bytes.
    #[must_use]
    pub fn decode(buf: &[u8]) -> Option<Self> {
        let bytes: [u8; Self::LEN] = buf.get(..Self::LEN)?.try_into().ok()?;
        Some(SecondaryHeader {
            mission_time_ms: u64::from_be_bytes(bytes),
        })
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::LEN] {
        self.mission_time_ms.to_be_bytes()
    }
}

/// Packet represents a single CCSDS space packet and its associated data.
///
/// # Example
/// ```
/// use satframe::spacepacket::{apid, wrap, Packet};
///
/// let dat = wrap(apid::HK, &[0x01, 0x02], 1_000).unwrap();
/// let packet = Packet::decode(&dat).unwrap();
///
/// assert_eq!(packet.header.apid, apid::HK);
/// assert_eq!(packet.secondary_header().unwrap().mission_time_ms, 1_000);
/// assert_eq!(packet.user_data(), &[0x01, 0x02]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Packet {
    /// All packets have a primary header
    pub header: PrimaryHeader,
    /// All packet bytes, including header and user data
    pub data: Vec<u8>,
}

impl Packet {
    /// Decode from bytes. Returns `None` if there are not enough bytes to construct the
    /// header or if there are not enough bytes to construct the [Packet] of the length
    /// indicated by the header. Bytes beyond that length are not included.
    #[must_use]
    pub fn decode(dat: &[u8]) -> Option<Packet> {
        let header = PrimaryHeader::decode(dat)?;
        let data = dat.get(..header.packet_len())?;
        Some(Packet {
            header,
            data: data.to_vec(),
        })
    }

    #[must_use]
    pub fn is_standalone(&self) -> bool {
        self.header.sequence_flags == SEQ_UNSEGMENTED
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.header.apid == apid::IDLE
    }

    /// The secondary header, if the primary header flags one and the packet is long
    /// enough to hold it.
    #[must_use]
    pub fn secondary_header(&self) -> Option<SecondaryHeader> {
        if !self.header.has_secondary_header {
            return None;
        }
        SecondaryHeader::decode(&self.data[PrimaryHeader::LEN..])
    }

    /// User data following the headers.
    #[must_use]
    pub fn user_data(&self) -> &[u8] {
        let offset = if self.header.has_secondary_header {
            PrimaryHeader::LEN + SecondaryHeader::LEN
        } else {
            PrimaryHeader::LEN
        };
        self.data.get(offset..).unwrap_or_default()
    }
}

/// Total length of a packet wrapping `data_len` bytes of user data.
#[must_use]
pub fn packet_len(data_len: usize) -> usize {
    PrimaryHeader::LEN + SecondaryHeader::LEN + data_len
}

/// Wrap `data` in a telemetry packet for `apid` timestamped `now_ms`, writing it into
/// `out` and returning the number of bytes written.
///
/// Only the low 11 bits of `apid` are used.
///
/// # Errors
/// [Error::Overflow] if `data` is too long for the packet length field, or
/// [Error::NotEnoughData] if `out` cannot hold the packet.
pub fn wrap_into(apid: Apid, data: &[u8], now_ms: u64, out: &mut [u8]) -> Result<usize> {
    let len_minus1 = (SecondaryHeader::LEN + data.len())
        .checked_sub(1)
        .and_then(|n| u16::try_from(n).ok())
        .ok_or(Error::Overflow)?;
    let total = packet_len(data.len());
    if out.len() < total {
        return Err(Error::NotEnoughData {
            actual: out.len(),
            minimum: total,
        });
    }

    let header = PrimaryHeader::telemetry(apid, len_minus1);
    let secondary = SecondaryHeader {
        mission_time_ms: now_ms,
    };
    out[..PrimaryHeader::LEN].copy_from_slice(&header.to_bytes());
    out[PrimaryHeader::LEN..PrimaryHeader::LEN + SecondaryHeader::LEN]
        .copy_from_slice(&secondary.to_bytes());
    out[PrimaryHeader::LEN + SecondaryHeader::LEN..total].copy_from_slice(data);

    trace!(apid = header.apid, len = total, now_ms, "wrapped packet");
    Ok(total)
}

/// Wrap `data` in a telemetry packet for `apid` timestamped `now_ms`.
///
/// # Errors
/// [Error::Overflow] if `data` is too long for the packet length field.
///
/// # Examples
/// ```
/// use satframe::spacepacket::{apid, wrap};
///
/// let pkt = wrap(apid::ADCS, &[0xde, 0xad, 0xbe, 0xef], 0).unwrap();
/// assert_eq!(&pkt[..6], &[0x18, 0x10, 0xc0, 0x00, 0x00, 0x0b]);
/// ```
pub fn wrap(apid: Apid, data: &[u8], now_ms: u64) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; packet_len(data.len())];
    wrap_into(apid, data, now_ms, &mut buf)?;
    Ok(buf)
}

/// Wrap `data` timestamped with the current time from `clock`.
///
/// # Errors
/// See [wrap].
pub fn wrap_now<T>(apid: Apid, data: &[u8], clock: &T) -> Result<Vec<u8>>
where
    T: TimeSource + ?Sized,
{
    wrap(apid, data, clock.now_ms())
}

fn packet_id(buf: &[u8]) -> Option<u16> {
    match buf {
        [a, b, ..] => Some(u16::from_be_bytes([*a, *b])),
        _ => None,
    }
}

/// APID of the packet in `buf`, or 0 if `buf` is too short to contain one.
#[must_use]
pub fn source_id(buf: &[u8]) -> Apid {
    packet_id(buf).map_or(0, |id| id & APID_MASK)
}

/// Whether the packet in `buf` flags a secondary header. False if `buf` is too short to
/// tell.
#[must_use]
pub fn has_secondary_header(buf: &[u8]) -> bool {
    packet_id(buf).is_some_and(|id| id >> 11 & 0x1 == 1)
}

/// Whether the packet in `buf` is an idle packet.
#[must_use]
pub fn is_idle(buf: &[u8]) -> bool {
    buf.len() >= 2 && source_id(buf) == apid::IDLE
}

/// Mission elapsed time in milliseconds from the secondary header of the packet in `buf`.
#[must_use]
pub fn mission_time(buf: &[u8]) -> Option<u64> {
    if !has_secondary_header(buf) {
        return None;
    }
    SecondaryHeader::decode(buf.get(PrimaryHeader::LEN..)?).map(|h| h.mission_time_ms)
}

/// User data of the packet in `buf`, bounded by the length in its primary header.
#[must_use]
pub fn user_data(buf: &[u8]) -> Option<&[u8]> {
    let header = PrimaryHeader::decode(buf)?;
    let start = if header.has_secondary_header {
        PrimaryHeader::LEN + SecondaryHeader::LEN
    } else {
        PrimaryHeader::LEN
    };
    buf.get(start..header.packet_len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::TickClock;

    #[test]
    fn test_wrap() {
        let pkt = wrap(apid::ADCS, &[0xde, 0xad, 0xbe, 0xef], 0).unwrap();

        assert_eq!(pkt.len(), 18);
        assert_eq!(&pkt[0..2], &[0x18, 0x10]);
        assert_eq!(&pkt[2..4], &[0xc0, 0x00]);
        assert_eq!(&pkt[4..6], &[0x00, 0x0b]);
        assert_eq!(&pkt[6..14], &[0u8; 8]);
        assert_eq!(&pkt[14..], &[0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn test_wrapped_header_fields() {
        let pkt = wrap(apid::CDHS, &[0x01, 0x02, 0x03], 42).unwrap();
        let header = PrimaryHeader::decode(&pkt).unwrap();

        assert_eq!(header, PrimaryHeader::telemetry(apid::CDHS, 10));
        assert_eq!(header.sequence_flags, SEQ_UNSEGMENTED);
        assert_eq!(header.to_bytes(), [0x18, 0x40, 0xc0, 0x00, 0x00, 0x0a]);
        assert_eq!(
            SecondaryHeader::decode(&pkt[PrimaryHeader::LEN..]),
            Some(SecondaryHeader {
                mission_time_ms: 42
            })
        );
    }

    #[test]
    fn test_decode_segmented_header() {
        // last packet of a group, sequence count 5
        let dat = [0x08, 0x20, 0x80, 0x05, 0x00, 0x08];
        let header = PrimaryHeader::decode(&dat).unwrap();

        assert_eq!(header.sequence_flags, 2);
        assert_eq!(header.sequence_id, 5);
        assert_ne!(header.sequence_flags, SEQ_UNSEGMENTED);
        assert_eq!(header.to_bytes(), dat);
    }

    #[test]
    fn test_wrap_masks_apid() {
        let pkt = wrap(0xf810, &[0x01], 0).unwrap();
        assert_eq!(&pkt[..2], &[0x18, 0x10]);
        assert_eq!(source_id(&pkt), 0x010);
    }

    #[test]
    fn test_wrap_timestamp_after_100_ticks() {
        let clock = TickClock::new();
        for _ in 0..100 {
            clock.tick();
        }
        let pkt = wrap_now(apid::HK, &[0x00], &clock).unwrap();

        assert_eq!(pkt[13], 0x64);
        assert_eq!(pkt[12], 0x00);
        assert_eq!(mission_time(&pkt), Some(100));
    }

    #[test]
    fn test_wrap_timestamp_is_big_endian() {
        let pkt = wrap(apid::EPS, &[], 0x0102_0304_0506_0708).unwrap();
        assert_eq!(&pkt[6..14], &[1, 2, 3, 4, 5, 6, 7, 8]);
        // empty user data still has the secondary header
        assert_eq!(&pkt[4..6], &[0x00, 0x07]);
        assert_eq!(user_data(&pkt), Some(&[][..]));
    }

    #[test]
    fn test_wrap_into() {
        let mut buf = [0u8; 32];
        let n = wrap_into(apid::FDIR, &[0x01, 0x02], 9, &mut buf).unwrap();
        assert_eq!(n, 16);
        assert_eq!(&buf[..n], &wrap(apid::FDIR, &[0x01, 0x02], 9).unwrap()[..]);

        let mut short = [0u8; 15];
        assert!(matches!(
            wrap_into(apid::FDIR, &[0x01, 0x02], 9, &mut short),
            Err(Error::NotEnoughData {
                actual: 15,
                minimum: 16
            })
        ));
    }

    #[test]
    fn test_wrap_overflow() {
        let max = vec![0u8; usize::from(u16::MAX) + 1 - SecondaryHeader::LEN];
        let pkt = wrap(apid::ARCHIVE, &max, 0).unwrap();
        assert_eq!(&pkt[4..6], &[0xff, 0xff]);

        let too_big = vec![0u8; max.len() + 1];
        assert!(matches!(
            wrap(apid::ARCHIVE, &too_big, 0),
            Err(Error::Overflow)
        ));
    }

    #[test]
    fn test_short_buffers_are_safe() {
        assert_eq!(source_id(&[]), 0);
        assert_eq!(source_id(&[0x18]), 0);
        assert!(!has_secondary_header(&[]));
        assert!(!has_secondary_header(&[0x18]));
        assert!(!is_idle(&[]));
        assert_eq!(mission_time(&[0x18, 0x10, 0xc0, 0x00, 0x00, 0x0b, 0x00]), None);
        assert_eq!(user_data(&[0x18, 0x10, 0xc0]), None);
        assert!(Packet::decode(&[0x18, 0x10, 0xc0, 0x00, 0x00, 0x0b]).is_none());
    }

    #[test]
    fn test_source_id_and_flag() {
        let dat = [0x0d, 0x59];
        assert_eq!(source_id(&dat), 1369);
        assert!(has_secondary_header(&dat));

        let dat = [0x05, 0x59];
        assert_eq!(source_id(&dat), 1369);
        assert!(!has_secondary_header(&dat));

        assert!(is_idle(&[0x1f, 0xff]));
    }

    #[test]
    fn test_decode_header() {
        let dat: [u8; 6] = [
            // bytes from a SNPP CrIS packet
            0xd, 0x59, 0xd2, 0xab, 0xa, 0x8f,
        ];
        let ph = PrimaryHeader::decode(&dat).unwrap();

        assert_eq!(ph.version, 0);
        assert_eq!(ph.type_flag, 0);
        assert!(ph.has_secondary_header);
        assert_eq!(ph.apid, 1369);
        assert_eq!(ph.sequence_flags, 3);
        assert_eq!(ph.sequence_id, 4779);
        assert_eq!(ph.len_minus1, 2703);
        assert_eq!(ph.to_bytes(), dat);
    }

    #[test]
    fn test_decode_wrapped_packet() {
        let mut dat = wrap(apid::PAYLOAD, &[0x10, 0x20, 0x30], 77).unwrap();
        dat.push(0xee);

        let packet = Packet::decode(&dat).unwrap();
        assert_eq!(packet.header.version, 0);
        assert_eq!(packet.header.type_flag, 1);
        assert!(packet.header.has_secondary_header);
        assert_eq!(packet.header.apid, apid::PAYLOAD);
        assert!(packet.is_standalone());
        assert!(!packet.is_idle());
        assert_eq!(packet.header.sequence_id, 0);
        assert_eq!(packet.data.len(), 17);
        assert_eq!(packet.secondary_header().unwrap().to_bytes(), 77u64.to_be_bytes());
        assert_eq!(packet.user_data(), &[0x10, 0x20, 0x30]);
        assert_eq!(user_data(&dat), Some(&[0x10, 0x20, 0x30][..]));
    }

    #[test]
    fn test_packet_without_secondary_header() {
        let dat = [0x05, 0x59, 0xc0, 0x00, 0x00, 0x01, 0xaa, 0xbb];
        let packet = Packet::decode(&dat).unwrap();

        assert!(packet.secondary_header().is_none());
        assert_eq!(packet.user_data(), &[0xaa, 0xbb]);
        assert_eq!(mission_time(&dat), None);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_headers_serde() {
        let header = PrimaryHeader::telemetry(apid::EPS, 9);
        let json = serde_json::to_value(header).unwrap();
        assert_eq!(json["apid"], 32);
        assert_eq!(json["has_secondary_header"], true);
        assert_eq!(json["sequence_flags"], 3);
        let zult: PrimaryHeader = serde_json::from_value(json).unwrap();
        assert_eq!(zult, header);

        let packet = Packet::decode(&wrap(apid::EPS, &[0x01, 0x02], 5).unwrap()).unwrap();
        let json = serde_json::to_string(&packet).unwrap();
        let zult: Packet = serde_json::from_str(&json).unwrap();
        assert_eq!(zult, packet);
        assert_eq!(
            zult.secondary_header(),
            Some(SecondaryHeader { mission_time_ms: 5 })
        );
    }
}
