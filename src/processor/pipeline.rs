//! # Ingest Pipeline
//!
//! Runs one datagram through validation, statistics, parsing, calibration
//! capture and normalization, and returns the two calibrated channel values.
//!
//! The pipeline is shared as `Arc<IngestPipeline>` between the receive loop,
//! the status task and the operator console. Every method takes `&self`.
//!
//! ## Usage
//!
//! ```
//! use std::time::Instant;
//! use clutch_bridge::processor::pipeline::IngestPipeline;
//!
//! let pipeline = IngestPipeline::new(4095);
//! let (left, right) = pipeline.ingest(&[0xE8, 0x03, 0xD0, 0x07], 4, Instant::now())?;
//! assert_eq!((left, right), (1000, 2000)); // uncalibrated passthrough
//! assert_eq!(pipeline.get_stats(), (1, 4));
//! # Ok::<(), clutch_bridge::error::BridgeError>(())
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::calibration::{CalibrationBounds, CalibrationEngine, CalibrationStatus};
use super::normalize::{normalize, Channel};
use super::packet::{self, PACKET_MIN_SIZE};
use super::stats::StatsCollector;
use crate::error::{BridgeError, Result};

/// Datagram-to-output-pair pipeline with its calibration engine and counters.
#[derive(Debug)]
pub struct IngestPipeline {
    engine: CalibrationEngine,
    stats: Mutex<StatsCollector>,
    initialized: AtomicBool,
    output_scale: u16,
}

impl IngestPipeline {
    /// Creates an initialized pipeline normalizing into `0..=output_scale`.
    #[must_use]
    pub fn new(output_scale: u16) -> Self {
        Self {
            engine: CalibrationEngine::new(),
            stats: Mutex::new(StatsCollector::new()),
            initialized: AtomicBool::new(true),
            output_scale,
        }
    }

    fn lock_stats(&self) -> MutexGuard<'_, StatsCollector> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Output scale calibrated values are mapped into.
    #[must_use]
    pub fn output_scale(&self) -> u16 {
        self.output_scale
    }

    /// Calibration engine driven by this pipeline.
    #[must_use]
    pub fn engine(&self) -> &CalibrationEngine {
        &self.engine
    }

    /// (Re)initializes the pipeline, zeroing the statistics.
    ///
    /// Does nothing if the pipeline is already initialized.
    pub fn init(&self) {
        if self.initialized.load(Ordering::Acquire) {
            warn!("Ingest pipeline already initialized");
            return;
        }

        self.lock_stats().clear();
        self.initialized.store(true, Ordering::Release);
        info!("Ingest pipeline initialized");
    }

    /// Stops accepting datagrams until [`init`](Self::init) is called again.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` if the pipeline is already deinitialized.
    pub fn deinit(&self) -> Result<()> {
        if !self.initialized.swap(false, Ordering::AcqRel) {
            warn!("Ingest pipeline not initialized");
            return Err(BridgeError::NotInitialized);
        }

        info!("Ingest pipeline deinitialized");
        Ok(())
    }

    /// Whether the pipeline accepts datagrams.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Processes one datagram.
    ///
    /// # Arguments
    ///
    /// * `raw_bytes` - Receive buffer
    /// * `length` - Number of valid bytes in `raw_bytes`
    /// * `now` - Arrival time, used for the calibration deadline
    ///
    /// # Returns
    ///
    /// * `Result<(u16, u16)>` - Calibrated (left, right) values
    ///
    /// # Errors
    ///
    /// - `NotInitialized` if the pipeline is deinitialized
    /// - `InvalidArgument` if `length` exceeds the buffer
    /// - `InvalidSize` if `length` is below 4 bytes
    pub fn ingest(&self, raw_bytes: &[u8], length: usize, now: Instant) -> Result<(u16, u16)> {
        if !self.is_initialized() {
            return Err(BridgeError::NotInitialized);
        }

        if length > raw_bytes.len() {
            return Err(BridgeError::InvalidArgument(format!(
                "length {} exceeds buffer of {} bytes",
                length,
                raw_bytes.len()
            )));
        }

        if length < PACKET_MIN_SIZE {
            return Err(BridgeError::InvalidSize {
                expected: PACKET_MIN_SIZE,
                actual: length,
            });
        }

        let total_packets = {
            let mut stats = self.lock_stats();
            stats.record(length);
            stats.snapshot().total_packets
        };

        let sample = packet::parse(raw_bytes, length)?;
        self.engine.feed(sample, now);

        let bounds = self.engine.get_bounds();
        let left = normalize(sample.left_raw, &bounds, Channel::Left, self.output_scale);
        let right = normalize(sample.right_raw, &bounds, Channel::Right, self.output_scale);

        debug!(
            "Packet #{} - Left: {} -> {}, Right: {} -> {}",
            total_packets, sample.left_raw, left, sample.right_raw, right
        );

        Ok((left, right))
    }

    /// Opens a calibration session of `duration`.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyInProgress` if a session is open.
    pub fn start_calibration(&self, duration: Duration) -> Result<()> {
        self.engine.start(duration)
    }

    /// Closes the open calibration session and returns the committed bounds.
    ///
    /// # Errors
    ///
    /// Returns `NotActive` if no session is open.
    pub fn stop_calibration(&self) -> Result<CalibrationBounds> {
        self.engine.stop()
    }

    #[must_use]
    pub fn is_calibrating(&self) -> bool {
        self.engine.is_capturing()
    }

    #[must_use]
    pub fn get_calibration(&self) -> CalibrationBounds {
        self.engine.get_bounds()
    }

    pub fn set_calibration(&self, bounds: CalibrationBounds) {
        self.engine.set_bounds(bounds);
    }

    pub fn reset_calibration(&self) {
        self.engine.reset();
    }

    #[must_use]
    pub fn calibration_status(&self) -> CalibrationStatus {
        self.engine.status()
    }

    /// Returns `(total_packets, total_bytes)`.
    #[must_use]
    pub fn get_stats(&self) -> (u32, u32) {
        let stats = self.lock_stats().snapshot();
        (stats.total_packets, stats.total_bytes)
    }
}
