//! CRC32 checksums for row-batches
//!
//! Every decoded row-batch is verified; a mismatch is a fatal decode
//! condition for the invocation.

use crc32fast::Hasher;

/// Computes the CRC32 (IEEE) of `data`
pub fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

pub fn verify_checksum(data: &[u8], expected: u32) -> bool {
    compute_checksum(data) == expected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_detects_bit_flip() {
        let mut data = b"row batch bytes".to_vec();
        let original = compute_checksum(&data);
        data[4] ^= 0x10;
        assert!(!verify_checksum(&data, original));
        assert_eq!(compute_checksum(b"row batch bytes"), original);
    }
}
