//! # HID Report Layouts
//!
//! Encodes a pair of calibrated clutch values into the body of a host HID
//! report. The pipeline normalizes into [`ReportLayout::output_scale`], so
//! each layout receives values already in its own range.
//!
//! | Layout | Scale | Body |
//! |--------|-------|------|
//! | `buttons` | 4095 | `u8` buttons (bit0 left, bit1 right) |
//! | `dual_axis_12` | 4095 | id `0x01`, `u16` buttons, `u16` left, `u16` right |
//! | `dual_axis_16` | 65535 | id `0x01`, `u16` buttons, `u16` left, `u16` right |
//! | `mixed` | 65535 | `u8` buttons (bit0 left), `u16` right |
//!
//! All multi-byte fields are little-endian.

use bytes::{BufMut, Bytes, BytesMut};
use serde::Deserialize;
use std::fmt;

/// Report ID used by the dual-axis layouts.
pub const REPORT_ID_GAMEPAD: u8 = 0x01;

/// Output scale of the 12-bit layouts.
pub const SCALE_12_BIT: u16 = 4095;

/// Output scale of the 16-bit layouts.
pub const SCALE_16_BIT: u16 = u16::MAX;

/// Button bit for the left paddle.
pub const BUTTON_LEFT: u8 = 1 << 0;

/// Button bit for the right paddle.
pub const BUTTON_RIGHT: u8 = 1 << 1;

/// Selectable HID report layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportLayout {
    /// Both paddles as digital buttons.
    Buttons,
    /// Two 12-bit axes.
    #[default]
    #[serde(rename = "dual_axis_12")]
    DualAxis12,
    /// Two 16-bit axes.
    #[serde(rename = "dual_axis_16")]
    DualAxis16,
    /// Left paddle as a button, right paddle as a 16-bit axis.
    Mixed,
}

impl fmt::Display for ReportLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReportLayout::Buttons => "buttons",
            ReportLayout::DualAxis12 => "dual_axis_12",
            ReportLayout::DualAxis16 => "dual_axis_16",
            ReportLayout::Mixed => "mixed",
        };
        f.write_str(name)
    }
}

impl ReportLayout {
    /// Output scale the pipeline should normalize into for this layout.
    #[must_use]
    pub fn output_scale(&self) -> u16 {
        match self {
            ReportLayout::Buttons | ReportLayout::DualAxis12 => SCALE_12_BIT,
            ReportLayout::DualAxis16 | ReportLayout::Mixed => SCALE_16_BIT,
        }
    }

    /// Size of an encoded report body in bytes.
    #[must_use]
    pub fn report_len(&self) -> usize {
        match self {
            ReportLayout::Buttons => 1,
            ReportLayout::DualAxis12 | ReportLayout::DualAxis16 => 7,
            ReportLayout::Mixed => 3,
        }
    }

    /// Whether `value` counts as a pressed paddle in this layout.
    ///
    /// A paddle is pressed when it is past half of the output scale.
    #[must_use]
    pub fn is_pressed(&self, value: u16) -> bool {
        value > self.output_scale() / 2
    }

    /// Encodes a `(left, right)` pair into a report body.
    ///
    /// Values above the layout scale are clamped.
    ///
    /// # Examples
    ///
    /// ```
    /// use clutch_bridge::hid::report::ReportLayout;
    ///
    /// let report = ReportLayout::DualAxis12.encode(0x0123, 4095);
    /// assert_eq!(&report[..], &[0x01, 0x00, 0x00, 0x23, 0x01, 0xFF, 0x0F]);
    /// ```
    #[must_use]
    pub fn encode(&self, left: u16, right: u16) -> Bytes {
        let scale = self.output_scale();
        let left = left.min(scale);
        let right = right.min(scale);

        let mut report = BytesMut::with_capacity(self.report_len());
        match self {
            ReportLayout::Buttons => {
                report.put_u8(self.button_bits(left, right));
            }
            ReportLayout::DualAxis12 | ReportLayout::DualAxis16 => {
                report.put_u8(REPORT_ID_GAMEPAD);
                report.put_u16_le(0);
                report.put_u16_le(left);
                report.put_u16_le(right);
            }
            ReportLayout::Mixed => {
                let buttons = if self.is_pressed(left) { BUTTON_LEFT } else { 0 };
                report.put_u8(buttons);
                report.put_u16_le(right);
            }
        }

        report.freeze()
    }

    fn button_bits(&self, left: u16, right: u16) -> u8 {
        let mut bits = 0;
        if self.is_pressed(left) {
            bits |= BUTTON_LEFT;
        }
        if self.is_pressed(right) {
            bits |= BUTTON_RIGHT;
        }
        bits
    }
}
