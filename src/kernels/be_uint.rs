//! Big-endian unsigned integer reassembly for field widths without a native
//! Rust type, such as the 6-byte nanosecond timestamp of the tagged feed.

/// Reassembles a 6-byte big-endian unsigned integer.
#[inline]
pub fn read_u48(bytes: [u8; 6]) -> u64 {
    let mut padded = [0u8; 8];
    padded[2..].copy_from_slice(&bytes);
    u64::from_be_bytes(padded)
}
