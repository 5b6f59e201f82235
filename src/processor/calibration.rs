//! # Calibration Engine
//!
//! Captures the real travel of each clutch paddle and holds the resulting
//! bounds used by the normalizer.
//!
//! ## State Machine
//!
//! ```text
//!            start()                  timeout (on feed) / stop()
//!   Idle ───────────────► Capturing ─────────────────────────────► Calibrated
//!    ▲                        ▲                                        │
//!    │ reset()                └──────────────── start() ───────────────┘
//!    └──────────────── (from any state) ───────────────────────────────
//! ```
//!
//! A session starts with captured extrema `min = 4095, max = 0` so the first
//! sample always widens the range. The deadline is only checked when a sample
//! arrives: with no traffic a session never completes on its own.
//!
//! ## Concurrency
//!
//! Bounds and session sit behind a single mutex. Every operation takes the
//! lock once, so readers never see a half-committed set of extrema.
//!
//! ## Usage
//!
//! ```
//! use std::time::{Duration, Instant};
//! use clutch_bridge::processor::calibration::CalibrationEngine;
//! use clutch_bridge::processor::packet::RawSample;
//!
//! let engine = CalibrationEngine::new();
//! let t0 = Instant::now();
//! engine.start_at(Duration::from_millis(1000), t0)?;
//!
//! engine.feed(RawSample::new(500, 800), t0);
//! engine.feed(RawSample::new(3000, 2900), t0 + Duration::from_millis(1000));
//!
//! let bounds = engine.get_bounds();
//! assert!(bounds.calibrated);
//! assert_eq!((bounds.left_min, bounds.left_max), (500, 3000));
//! # Ok::<(), clutch_bridge::error::BridgeError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::packet::{RawSample, RAW_MAX};
use crate::error::{BridgeError, Result};

/// Min/max pair for a single channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelRange {
    pub min: u16,
    pub max: u16,
}

/// Calibration bounds for both channels.
///
/// While `calibrated` is false the bounds span the full native range and the
/// normalizer passes raw readings through. Once calibrated, `min` is not
/// guaranteed to be below `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationBounds {
    pub left_min: u16,
    pub left_max: u16,
    pub right_min: u16,
    pub right_max: u16,
    pub calibrated: bool,
}

impl Default for CalibrationBounds {
    fn default() -> Self {
        Self::full_range()
    }
}

impl CalibrationBounds {
    /// Uncalibrated bounds covering `0..=4095` on both channels.
    #[must_use]
    pub const fn full_range() -> Self {
        Self {
            left_min: 0,
            left_max: RAW_MAX,
            right_min: 0,
            right_max: RAW_MAX,
            calibrated: false,
        }
    }

    /// Calibrated bounds with explicit extrema.
    #[must_use]
    pub const fn calibrated(left_min: u16, left_max: u16, right_min: u16, right_max: u16) -> Self {
        Self {
            left_min,
            left_max,
            right_min,
            right_max,
            calibrated: true,
        }
    }

    /// Left channel range.
    #[must_use]
    pub fn left(&self) -> ChannelRange {
        ChannelRange {
            min: self.left_min,
            max: self.left_max,
        }
    }

    /// Right channel range.
    #[must_use]
    pub fn right(&self) -> ChannelRange {
        ChannelRange {
            min: self.right_min,
            max: self.right_max,
        }
    }
}

/// Coarse engine state, for status reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationStatus {
    /// No session open, bounds are the uncalibrated full range.
    Idle,
    /// A capture session is open.
    Capturing,
    /// No session open, bounds hold a calibrated range.
    Calibrated,
}

impl std::fmt::Display for CalibrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CalibrationStatus::Idle => "idle",
            CalibrationStatus::Capturing => "capturing",
            CalibrationStatus::Calibrated => "calibrated",
        };
        f.write_str(name)
    }
}

/// An open capture window.
#[derive(Debug, Clone, Copy)]
struct CalibrationSession {
    start_time: Instant,
    duration: Duration,
    captured_left_min: u16,
    captured_left_max: u16,
    captured_right_min: u16,
    captured_right_max: u16,
}

impl CalibrationSession {
    fn new(duration: Duration, start_time: Instant) -> Self {
        Self {
            start_time,
            duration,
            captured_left_min: RAW_MAX,
            captured_left_max: 0,
            captured_right_min: RAW_MAX,
            captured_right_max: 0,
        }
    }

    fn widen(&mut self, sample: RawSample) {
        self.captured_left_min = self.captured_left_min.min(sample.left_raw);
        self.captured_left_max = self.captured_left_max.max(sample.left_raw);
        self.captured_right_min = self.captured_right_min.min(sample.right_raw);
        self.captured_right_max = self.captured_right_max.max(sample.right_raw);
    }

    fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.start_time)
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.elapsed(now) >= self.duration
    }

    fn to_bounds(&self) -> CalibrationBounds {
        CalibrationBounds::calibrated(
            self.captured_left_min,
            self.captured_left_max,
            self.captured_right_min,
            self.captured_right_max,
        )
    }
}

#[derive(Debug)]
struct EngineState {
    bounds: CalibrationBounds,
    session: Option<CalibrationSession>,
}

/// Owns calibration bounds and the capture session.
///
/// All methods take `&self`; share the engine between the receive path and
/// control callers with an `Arc`.
#[derive(Debug)]
pub struct CalibrationEngine {
    state: Mutex<EngineState>,
}

impl Default for CalibrationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CalibrationEngine {
    /// Creates an idle, uncalibrated engine.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(EngineState {
                bounds: CalibrationBounds::full_range(),
                session: None,
            }),
        }
    }

    // The guarded state is plain data assigned whole, so a panic elsewhere
    // cannot leave it half-written.
    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Opens a capture session starting now.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyInProgress` if a session is already open.
    pub fn start(&self, duration: Duration) -> Result<()> {
        self.start_at(duration, Instant::now())
    }

    /// Opens a capture session starting at `now`.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyInProgress` if a session is already open.
    pub fn start_at(&self, duration: Duration, now: Instant) -> Result<()> {
        let mut state = self.lock();
        if state.session.is_some() {
            return Err(BridgeError::AlreadyInProgress);
        }

        state.session = Some(CalibrationSession::new(duration, now));
        info!("Calibration started ({} ms)", duration.as_millis());
        Ok(())
    }

    /// Feeds a sample into the open session, if any.
    ///
    /// Widens the captured extrema, then completes the session when `now` is
    /// at or past its deadline. Returns `true` if this call completed it.
    pub fn feed(&self, sample: RawSample, now: Instant) -> bool {
        let mut state = self.lock();
        let Some(session) = state.session.as_mut() else {
            return false;
        };

        session.widen(sample);

        if !session.is_expired(now) {
            return false;
        }

        let bounds = session.to_bounds();
        state.bounds = bounds;
        state.session = None;
        info!(
            "Calibration complete - Left: {}..{}, Right: {}..{}",
            bounds.left_min, bounds.left_max, bounds.right_min, bounds.right_max
        );
        true
    }

    /// Closes the open session and commits what it captured.
    ///
    /// With no samples fed the committed bounds are `min = 4095, max = 0`.
    ///
    /// # Errors
    ///
    /// Returns `NotActive` if no session is open.
    pub fn stop(&self) -> Result<CalibrationBounds> {
        let mut state = self.lock();
        let session = state.session.take().ok_or(BridgeError::NotActive)?;

        let bounds = session.to_bounds();
        state.bounds = bounds;
        info!(
            "Calibration stopped - Left: {}..{}, Right: {}..{}",
            bounds.left_min, bounds.left_max, bounds.right_min, bounds.right_max
        );
        Ok(bounds)
    }

    /// Snapshot of the current bounds.
    #[must_use]
    pub fn get_bounds(&self) -> CalibrationBounds {
        self.lock().bounds
    }

    /// Overwrites the bounds. An open session keeps running.
    pub fn set_bounds(&self, bounds: CalibrationBounds) {
        self.lock().bounds = bounds;
        debug!("Calibration bounds set: {:?}", bounds);
    }

    /// Restores full-range uncalibrated bounds and cancels any session.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.bounds = CalibrationBounds::full_range();
        if state.session.take().is_some() {
            info!("Calibration reset (open session cancelled)");
        } else {
            info!("Calibration reset");
        }
    }

    /// Whether a capture session is open.
    #[must_use]
    pub fn is_capturing(&self) -> bool {
        self.lock().session.is_some()
    }

    /// Current coarse state.
    #[must_use]
    pub fn status(&self) -> CalibrationStatus {
        let state = self.lock();
        if state.session.is_some() {
            CalibrationStatus::Capturing
        } else if state.bounds.calibrated {
            CalibrationStatus::Calibrated
        } else {
            CalibrationStatus::Idle
        }
    }

    /// Elapsed and total time of the open session, if any.
    #[must_use]
    pub fn session_progress(&self, now: Instant) -> Option<(Duration, Duration)> {
        self.lock()
            .session
            .as_ref()
            .map(|session| (session.elapsed(now), session.duration))
    }
}
