//! # Processor Module
//!
//! Calibration and normalization core.
//!
//! This module handles:
//! - Decoding sensor datagrams into raw 12-bit readings
//! - Timed or manually stopped min/max capture sessions
//! - Mapping raw readings through calibration bounds into an output scale
//! - Packet and byte statistics
//!
//! Nothing here performs I/O; the receive loop calls
//! [`pipeline::IngestPipeline::ingest`] once per datagram.

pub mod calibration;
pub mod normalize;
pub mod packet;
pub mod pipeline;
pub mod stats;

pub use calibration::{CalibrationBounds, CalibrationEngine, CalibrationStatus};
pub use packet::RawSample;
pub use pipeline::IngestPipeline;
