//! # Clutch Bridge Library
//!
//! Present wireless clutch paddle telemetry to a host as calibrated game
//! controller axes.
//!
//! This library provides the calibration and normalization core, plus the
//! adapters the binary uses around it: a UDP datagram receiver on the sensor
//! side and a serial link to a USB HID gadget on the host side.

pub mod bridge;
pub mod config;
pub mod control;
pub mod error;
pub mod hid;
pub mod link;
pub mod processor;
pub mod receiver;
