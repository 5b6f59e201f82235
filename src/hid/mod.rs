//! # HID Module
//!
//! Host-side report framing for the calibrated clutch values.
//!
//! This module handles:
//! - The selectable report layouts (buttons, 12-bit axes, 16-bit axes, mixed)
//! - The output scale each layout expects
//! - Encoding a value pair into a report body

pub mod report;

pub use report::ReportLayout;
