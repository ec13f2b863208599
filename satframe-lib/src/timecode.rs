//! Conversion of packet mission elapsed time to absolute time.
use hifitime::{Duration, Epoch};

use crate::spacepacket::{self, PrimaryHeader, SecondaryHeader};
use crate::{Error, Result};

/// Decodes the secondary header mission time of a space packet into an [Epoch] relative to
/// the mission epoch.
#[derive(Debug, Clone, Copy)]
pub struct MissionTimeDecoder {
    epoch: Epoch,
}

impl MissionTimeDecoder {
    /// Create a decoder for mission time measured from `epoch`.
    #[must_use]
    pub fn new(epoch: Epoch) -> Self {
        Self { epoch }
    }

    #[must_use]
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Absolute time of `met_ms` milliseconds of mission elapsed time.
    #[must_use]
    pub fn epoch_of(&self, met_ms: u64) -> Epoch {
        self.epoch + Duration::compose(0, 0, 0, 0, 0, met_ms, 0, 0)
    }

    /// Decode the time of the packet in `pkt`.
    ///
    /// # Errors
    /// [Error::NotEnoughData] if `pkt` is too short to hold both headers, or
    /// [Error::NoSecondaryHeader] if the packet does not flag a secondary header.
    ///
    /// # Examples
    /// ```
    /// use hifitime::Epoch;
    /// use satframe::spacepacket::{apid, wrap};
    /// use satframe::timecode::MissionTimeDecoder;
    ///
    /// let epoch = Epoch::from_gregorian_utc_at_midnight(2024, 1, 1);
    /// let decoder = MissionTimeDecoder::new(epoch);
    /// let pkt = wrap(apid::HK, &[0x00], 60_000).unwrap();
    ///
    /// assert_eq!(
    ///     decoder.decode_time(&pkt).unwrap(),
    ///     Epoch::from_gregorian_utc_hms(2024, 1, 1, 0, 1, 0)
    /// );
    /// ```
    pub fn decode_time(&self, pkt: &[u8]) -> Result<Epoch> {
        let minimum = PrimaryHeader::LEN + SecondaryHeader::LEN;
        if pkt.len() < minimum {
            return Err(Error::NotEnoughData {
                actual: pkt.len(),
                minimum,
            });
        }
        if !spacepacket::has_secondary_header(pkt) {
            return Err(Error::NoSecondaryHeader);
        }
        let met = spacepacket::mission_time(pkt).ok_or(Error::NoSecondaryHeader)?;
        Ok(self.epoch_of(met))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spacepacket::{apid, wrap};

    fn decoder() -> MissionTimeDecoder {
        MissionTimeDecoder::new(Epoch::from_gregorian_utc_at_midnight(2024, 1, 1))
    }

    #[test]
    fn test_epoch_of() {
        let expected = Epoch::from_gregorian_utc(2024, 1, 1, 0, 0, 1, 500_000_000);
        assert_eq!(decoder().epoch_of(1_500), expected);
        assert_eq!(decoder().epoch_of(0), decoder().epoch());
    }

    #[test]
    fn test_decode_time() {
        let pkt = wrap(apid::ADCS, &[0x01, 0x02], 86_400_000).unwrap();
        let zult = decoder().decode_time(&pkt).unwrap();
        assert_eq!(zult, Epoch::from_gregorian_utc_at_midnight(2024, 1, 2));
    }

    #[test]
    fn test_decode_time_errors() {
        let pkt = wrap(apid::ADCS, &[0x01], 0).unwrap();
        assert!(matches!(
            decoder().decode_time(&pkt[..13]),
            Err(Error::NotEnoughData {
                actual: 13,
                minimum: 14
            })
        ));

        let mut pkt = pkt;
        // clear the secondary header flag
        pkt[0] &= !0x08;
        assert!(matches!(
            decoder().decode_time(&pkt),
            Err(Error::NoSecondaryHeader)
        ));
    }
}
