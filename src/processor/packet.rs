//! # Packet Parser
//!
//! Decodes the sensor datagram layout into two raw channel readings.
//!
//! ## Wire Layout
//!
//! | Bytes | Field | Encoding |
//! |-------|-------|----------|
//! | 0-1 | Left clutch | `u16`, little-endian, 12-bit ADC value |
//! | 2-3 | Right clutch | `u16`, little-endian, 12-bit ADC value |
//! | 4.. | (ignored) | |
//!
//! Values above the 12-bit range are clamped to [`RAW_MAX`], not rejected.

use crate::error::{BridgeError, Result};

/// Minimum datagram size carrying both channels.
pub const PACKET_MIN_SIZE: usize = 4;

/// Largest raw reading the sensor ADC produces (12-bit).
pub const RAW_MAX: u16 = 4095;

/// One decoded sample from the sensor device.
///
/// Both readings are guaranteed to lie within `0..=RAW_MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawSample {
    /// Left clutch paddle reading.
    pub left_raw: u16,
    /// Right clutch paddle reading.
    pub right_raw: u16,
}

impl RawSample {
    /// Creates a sample, clamping both readings to the 12-bit range.
    #[must_use]
    pub fn new(left_raw: u16, right_raw: u16) -> Self {
        Self {
            left_raw: left_raw.min(RAW_MAX),
            right_raw: right_raw.min(RAW_MAX),
        }
    }
}

/// Parse a received datagram into a [`RawSample`].
///
/// # Arguments
///
/// * `buffer` - Receive buffer holding the datagram
/// * `length` - Number of valid bytes in `buffer`
///
/// # Errors
///
/// - `InvalidArgument` if `length` exceeds the buffer
/// - `InvalidSize` if `length` is shorter than [`PACKET_MIN_SIZE`]
///
/// # Examples
///
/// ```
/// use clutch_bridge::processor::packet::parse;
///
/// let sample = parse(&[0x00, 0x10, 0xFF, 0x0F], 4)?;
/// assert_eq!(sample.left_raw, 4095); // 0x1000 clamped
/// assert_eq!(sample.right_raw, 4095);
/// # Ok::<(), clutch_bridge::error::BridgeError>(())
/// ```
pub fn parse(buffer: &[u8], length: usize) -> Result<RawSample> {
    if length > buffer.len() {
        return Err(BridgeError::InvalidArgument(format!(
            "length {} exceeds buffer of {} bytes",
            length,
            buffer.len()
        )));
    }

    if length < PACKET_MIN_SIZE {
        return Err(BridgeError::InvalidSize {
            expected: PACKET_MIN_SIZE,
            actual: length,
        });
    }

    let left = u16::from_le_bytes([buffer[0], buffer[1]]);
    let right = u16::from_le_bytes([buffer[2], buffer[3]]);

    Ok(RawSample::new(left, right))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_lengths_are_invalid_size() {
        let buffer = [0u8; 8];
        for length in 0..PACKET_MIN_SIZE {
            match parse(&buffer, length) {
                Err(BridgeError::InvalidSize { expected, actual }) => {
                    assert_eq!(expected, 4);
                    assert_eq!(actual, length);
                }
                other => panic!("Expected InvalidSize for length {}, got {:?}", length, other),
            }
        }
    }

    #[test]
    fn test_length_beyond_buffer_is_invalid_argument() {
        let buffer = [0u8; 4];
        assert!(matches!(parse(&buffer, 5), Err(BridgeError::InvalidArgument(_))));
        assert!(matches!(parse(&[], 4), Err(BridgeError::InvalidArgument(_))));
    }

    #[test]
    fn test_little_endian_decode() {
        let sample = parse(&[0x34, 0x02, 0xE8, 0x03], 4).unwrap();
        assert_eq!(sample.left_raw, 0x0234);
        assert_eq!(sample.right_raw, 1000);
    }

    #[test]
    fn test_clamps_scenario_a() {
        let sample = parse(&[0x00, 0x10, 0xFF, 0x0F], 4).unwrap();
        assert_eq!(sample.left_raw, 4095, "0x1000 should clamp to 4095");
        assert_eq!(sample.right_raw, 4095, "0x0FFF needs no clamp");
    }

    #[test]
    fn test_clamps_every_out_of_range_value() {
        for value in [4096u16, 5000, 0x8000, u16::MAX] {
            let bytes = value.to_le_bytes();
            let sample = parse(&[bytes[0], bytes[1], bytes[0], bytes[1]], 4).unwrap();
            assert_eq!(sample.left_raw, RAW_MAX);
            assert_eq!(sample.right_raw, RAW_MAX);
        }
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let sample = parse(&[0x01, 0x00, 0x02, 0x00, 0xFF, 0xFF, 0xFF], 7).unwrap();
        assert_eq!(sample, RawSample { left_raw: 1, right_raw: 2 });
    }

    #[test]
    fn test_length_shorter_than_buffer_uses_prefix() {
        // Only the declared length is considered valid
        let buffer = [0x01, 0x00, 0x02, 0x00, 0x00, 0x00];
        assert!(parse(&buffer, 3).is_err());
        assert!(parse(&buffer, 4).is_ok());
    }

    #[test]
    fn test_raw_sample_new_clamps() {
        let sample = RawSample::new(9000, 12);
        assert_eq!(sample.left_raw, 4095);
        assert_eq!(sample.right_raw, 12);
    }
}
