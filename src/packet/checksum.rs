//! # Additive Checksum
//!
//! Single-byte integrity trailer for outbound command frames.
//!
//! **Algorithm**: sum of all bytes, modulo 256
//! **Initial Value**: 0x00

/// Calculate the additive checksum of `data`
///
/// # Arguments
///
/// * `data` - Byte slice to checksum (bytes 0-14 of a command frame)
///
/// # Returns
///
/// * `u8` - Sum of all bytes modulo 256
///
/// # Examples
///
/// ```
/// use colmi_ring::packet::checksum::additive_checksum;
///
/// assert_eq!(additive_checksum(&[0x69, 0x01, 0x01]), 0x6B);
/// ```
pub const fn additive_checksum(data: &[u8]) -> u8 {
    let mut sum: u8 = 0;
    let mut i = 0;

    while i < data.len() {
        sum = sum.wrapping_add(data[i]);
        i += 1;
    }

    sum
}

/// Check that the last byte of `frame` is the checksum of everything before it
///
/// Returns `false` for an empty slice.
pub fn verify_checksum(frame: &[u8]) -> bool {
    match frame.split_last() {
        Some((&trailer, body)) => additive_checksum(body) == trailer,
        None => false,
    }
}
