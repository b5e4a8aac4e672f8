//! Checksum for link lines.
//!
//! Every message carries a CRC-8/SMBUS checksum of the payload bytes
//! between the prefix letter and the `*` delimiter, rendered as two
//! uppercase hex digits. The prefix, delimiter and line terminator are
//! outside the checksummed span.

use crc::{Crc, CRC_8_SMBUS};

/// Shared table-driven CRC-8/SMBUS instance. The serializer pulls
/// incremental digests off this; the parser checksums whole payloads.
pub(crate) const CRC8: Crc<u8> = Crc::<u8>::new(&CRC_8_SMBUS);

/// Checksum of a complete payload slice.
#[inline]
#[must_use]
pub fn calculate_crc8(data: &[u8]) -> u8 {
    CRC8.checksum(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_payload_checksum() {
        // A bare ping has an empty checksummed span
        assert_eq!(calculate_crc8(&[]), 0x00);
    }

    #[test]
    fn test_digest_matches_batch() {
        let payload = b"T:50";
        let mut digest = CRC8.digest();
        for &b in payload {
            digest.update(&[b]);
        }
        assert_eq!(digest.finalize(), calculate_crc8(payload));
    }
}
