//! Additive 8-bit checksum

/// Wrapping sum of all payload bytes
///
/// The same function generates outbound checksums and verifies inbound
/// ones. An empty payload sums to 0.
pub fn checksum(payload: &[u8]) -> u8 {
    payload.iter().fold(0u8, |sum, &byte| sum.wrapping_add(byte))
}
