//! # Normalizer
//!
//! Maps a raw reading through calibration bounds into an output scale.
//!
//! All arithmetic is integer and truncating, so the same input always yields
//! the same output on every platform.

use super::calibration::{CalibrationBounds, ChannelRange};

/// Which paddle a reading belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Left,
    Right,
}

/// Maps a raw reading through one channel range.
///
/// - Uncalibrated: `raw` is returned unchanged.
/// - `raw <= min` maps to `0`, `raw >= max` maps to `output_scale`.
/// - Otherwise `(raw - min) * output_scale / (max - min)`, truncated.
///
/// # Examples
///
/// ```
/// use clutch_bridge::processor::calibration::ChannelRange;
/// use clutch_bridge::processor::normalize::normalize_channel;
///
/// let range = ChannelRange { min: 500, max: 3000 };
/// assert_eq!(normalize_channel(500, range, true, 4095), 0);
/// assert_eq!(normalize_channel(1750, range, true, 4095), 2047);
/// assert_eq!(normalize_channel(3000, range, true, 4095), 4095);
/// assert_eq!(normalize_channel(1750, range, false, 4095), 1750);
/// ```
#[must_use]
pub fn normalize_channel(raw: u16, range: ChannelRange, calibrated: bool, output_scale: u16) -> u16 {
    if !calibrated {
        return raw;
    }

    if raw <= range.min {
        return 0;
    }

    if raw >= range.max {
        return output_scale;
    }

    if range.max > range.min {
        let offset = u32::from(raw - range.min);
        let span = u32::from(range.max - range.min);
        // offset < span, so the quotient stays below output_scale
        (offset * u32::from(output_scale) / span) as u16
    } else {
        // min < raw < max cannot hold for a zero-width range, so the checks
        // above always return first. Pass the reading through regardless.
        raw
    }
}

/// Maps a raw reading through the range of `channel` in `bounds`.
#[must_use]
pub fn normalize(raw: u16, bounds: &CalibrationBounds, channel: Channel, output_scale: u16) -> u16 {
    let range = match channel {
        Channel::Left => bounds.left(),
        Channel::Right => bounds.right(),
    };
    normalize_channel(raw, range, bounds.calibrated, output_scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_bounds() -> CalibrationBounds {
        CalibrationBounds::calibrated(500, 3000, 500, 3000)
    }

    #[test]
    fn test_uncalibrated_is_identity() {
        let bounds = CalibrationBounds::full_range();
        for raw in [0u16, 1, 2047, 4095] {
            assert_eq!(normalize(raw, &bounds, Channel::Left, 65535), raw);
            assert_eq!(normalize(raw, &bounds, Channel::Right, 255), raw);
        }
    }

    #[test]
    fn test_scenario_c() {
        let bounds = scenario_bounds();
        assert_eq!(normalize(500, &bounds, Channel::Left, 4095), 0);
        assert_eq!(normalize(3000, &bounds, Channel::Left, 4095), 4095);
        assert_eq!(normalize(1750, &bounds, Channel::Left, 4095), 2047);
    }

    #[test]
    fn test_clamps_outside_bounds() {
        let bounds = scenario_bounds();
        assert_eq!(normalize(0, &bounds, Channel::Right, 4095), 0);
        assert_eq!(normalize(499, &bounds, Channel::Right, 4095), 0);
        assert_eq!(normalize(3001, &bounds, Channel::Right, 4095), 4095);
        assert_eq!(normalize(4095, &bounds, Channel::Right, 4095), 4095);
    }

    #[test]
    fn test_endpoints_for_many_ranges() {
        for (min, max) in [(0u16, 1u16), (0, 4095), (100, 101), (2000, 2100), (4094, 4095)] {
            let range = ChannelRange { min, max };
            for scale in [255u16, 4095, 65535] {
                assert_eq!(normalize_channel(min, range, true, scale), 0);
                assert_eq!(normalize_channel(max, range, true, scale), scale);
            }
        }
    }

    #[test]
    fn test_monotonic_non_decreasing() {
        let range = ChannelRange { min: 321, max: 3777 };
        for scale in [4095u16, 65535] {
            let mut previous = 0;
            for raw in 0..=4095u16 {
                let value = normalize_channel(raw, range, true, scale);
                assert!(value >= previous, "raw {} produced {} after {}", raw, value, previous);
                assert!(value <= scale);
                previous = value;
            }
        }
    }

    #[test]
    fn test_sixteen_bit_scale_no_overflow() {
        let range = ChannelRange { min: 0, max: 4095 };
        assert_eq!(normalize_channel(4094, range, true, 65535), 65518);
    }

    #[test]
    fn test_truncates_toward_zero() {
        let range = ChannelRange { min: 0, max: 3 };
        // 1 * 10 / 3 = 3.33 -> 3, 2 * 10 / 3 = 6.66 -> 6
        assert_eq!(normalize_channel(1, range, true, 10), 3);
        assert_eq!(normalize_channel(2, range, true, 10), 6);
    }

    #[test]
    fn test_zero_width_range() {
        let range = ChannelRange { min: 1000, max: 1000 };
        assert_eq!(normalize_channel(1000, range, true, 4095), 0);
        assert_eq!(normalize_channel(999, range, true, 4095), 0);
        assert_eq!(normalize_channel(1001, range, true, 4095), 4095);
    }

    #[test]
    fn test_inverted_range_from_empty_session() {
        // min = 4095, max = 0: every reading is <= min
        let bounds = CalibrationBounds::calibrated(4095, 0, 4095, 0);
        for raw in [0u16, 2000, 4095] {
            assert_eq!(normalize(raw, &bounds, Channel::Left, 4095), 0);
        }
    }

    #[test]
    fn test_channels_use_their_own_range() {
        let bounds = CalibrationBounds::calibrated(0, 1000, 1000, 2000);
        assert_eq!(normalize(1000, &bounds, Channel::Left, 4095), 4095);
        assert_eq!(normalize(1000, &bounds, Channel::Right, 4095), 0);
    }
}
