//! CRC-16 checksum shared by the frame encoder and decoder.
use crc::{Crc, Digest, CRC_16_IBM_3740};

// CRC-16/CCITT-FALSE, catalogued as CRC-16/IBM-3740: MSB-first, polynomial 0x1021,
// initial register 0xffff, no reflection and no final xor.
static CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_3740);

/// Compute the CRC-16/CCITT-FALSE checksum of `dat`.
///
/// # Examples
/// ```
/// assert_eq!(satframe::crc::crc16(b"123456789"), 0x29b1);
/// ```
#[must_use]
pub fn crc16(dat: &[u8]) -> u16 {
    CRC16.checksum(dat)
}

/// Start an incremental checksum for data that is not contiguous in memory.
#[must_use]
pub fn digest() -> Digest<'static, u16> {
    CRC16.digest()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use test_case::test_case;

    // Bit-at-a-time form of the algorithm, used to check the table driven one.
    fn bitwise(dat: &[u8]) -> u16 {
        let mut reg: u16 = 0xffff;
        for b in dat {
            reg ^= u16::from(*b) << 8;
            for _ in 0..8 {
                if reg & 0x8000 == 0 {
                    reg <<= 1;
                } else {
                    reg = (reg << 1) ^ 0x1021;
                }
            }
        }
        reg
    }

    #[test_case(b"123456789", 0x29b1; "check string")]
    #[test_case(&[0x01, 0x02, 0x03], 0xadad; "short command")]
    #[test_case(&[0xaa, 0x04, 0xde, 0xad, 0xbe, 0xef], 0x246b; "frame header and payload")]
    #[test_case(&[], 0xffff; "empty is initial register")]
    fn test_vectors(dat: &[u8], expected: u16) {
        assert_eq!(crc16(dat), expected, "got {:#06x}", crc16(dat));
    }

    #[test]
    fn catalogued_parameters() {
        let alg = &CRC_16_IBM_3740;
        assert_eq!(alg.poly, 0x1021);
        assert_eq!(alg.init, 0xffff);
        assert!(!alg.refin && !alg.refout);
        assert_eq!(alg.xorout, 0x0000);
        assert_eq!(crc16(b"123456789"), alg.check);
    }

    #[test]
    fn digest_matches_oneshot() {
        let dat = b"123456789";
        let mut digest = digest();
        digest.update(&dat[..4]);
        digest.update(&dat[4..]);
        assert_eq!(digest.finalize(), crc16(dat));
    }

    #[test]
    fn table_matches_bitwise() {
        let mut rng = rand::thread_rng();
        for len in 0..128 {
            let dat: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
            assert_eq!(crc16(&dat), bitwise(&dat), "mismatch for {dat:?}");
        }
    }
}
