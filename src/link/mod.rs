//! # Host Link Module
//!
//! Delivers HID report bodies to the USB gadget that presents the bridge to
//! the host as a game controller.
//!
//! This module handles:
//! - Opening the gadget's serial device (configured path, then common defaults)
//! - Framing each report body (`0xA5`, length, body)
//! - Tracking whether the last write reached the gadget
//!
//! Write failures are returned to the caller and never retried here.

pub mod port_trait;

use bytes::{BufMut, Bytes, BytesMut};
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info, warn};

use crate::error::{BridgeError, Result};
use port_trait::{ReportSink, SerialPortIO, TokioSerialPort};

/// Sync byte opening every framed report
pub const LINK_SYNC_BYTE: u8 = 0xA5;

/// Largest report body a frame can carry (length is one byte)
pub const LINK_MAX_BODY: usize = u8::MAX as usize;

/// Fallback device paths tried after the configured one
const DEFAULT_DEVICE_PATHS: &[&str] = &[
    "/dev/ttyACM0", // USB CDC gadgets
    "/dev/ttyUSB0", // USB-to-serial adapters
];

/// Wraps a report body in a link frame.
///
/// # Errors
///
/// Returns `InvalidArgument` if the body exceeds [`LINK_MAX_BODY`] bytes.
pub fn frame_report(body: &[u8]) -> Result<Bytes> {
    let length = u8::try_from(body.len()).map_err(|_| {
        BridgeError::InvalidArgument(format!("report body of {} bytes is too long", body.len()))
    })?;

    let mut frame = BytesMut::with_capacity(2 + body.len());
    frame.put_u8(LINK_SYNC_BYTE);
    frame.put_u8(length);
    frame.put_slice(body);
    Ok(frame.freeze())
}

/// Serial link to the HID gadget
pub struct HostLink {
    port: Box<dyn SerialPortIO>,
    device_path: String,
    connected: bool,
}

impl std::fmt::Debug for HostLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostLink")
            .field("device_path", &self.device_path)
            .field("connected", &self.connected)
            .finish_non_exhaustive()
    }
}

impl HostLink {
    /// Open the gadget link, trying `preferred` first and then the defaults.
    ///
    /// # Errors
    ///
    /// Returns `SerialPortNotFound` if no candidate device can be opened
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use clutch_bridge::link::HostLink;
    ///
    /// let link = HostLink::open("/dev/ttyACM1", 115_200)?;
    /// println!("Connected to {}", link.device_path());
    /// # Ok::<(), clutch_bridge::error::BridgeError>(())
    /// ```
    pub fn open(preferred: &str, baud_rate: u32) -> Result<Self> {
        let paths = candidate_paths(preferred);
        let paths: Vec<&str> = paths.iter().map(String::as_str).collect();
        Self::open_with_paths(&paths, baud_rate)
    }

    /// Open the first device in `paths` that accepts the connection.
    ///
    /// # Errors
    ///
    /// Returns `SerialPortNotFound` listing every path tried
    pub fn open_with_paths(paths: &[&str], baud_rate: u32) -> Result<Self> {
        for path in paths {
            debug!("Trying to open serial port: {}", path);

            match Self::open_port(path, baud_rate) {
                Ok(port) => {
                    info!("Successfully opened HID gadget at {}", path);
                    return Ok(Self::with_port(Box::new(TokioSerialPort::new(port)), path));
                }
                Err(e) => {
                    warn!("Failed to open {}: {}", path, e);
                    continue;
                }
            }
        }

        Err(BridgeError::SerialPortNotFound(paths.join(", ")))
    }

    /// Build a link over an already opened port.
    pub fn with_port(port: Box<dyn SerialPortIO>, device_path: &str) -> Self {
        Self {
            port,
            device_path: device_path.to_string(),
            connected: true,
        }
    }

    /// Open a specific serial port, 8N1 without flow control
    fn open_port(path: &str, baud_rate: u32) -> Result<tokio_serial::SerialStream> {
        let port = tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| BridgeError::Serial(format!("Failed to open {}: {}", path, e)))?;

        Ok(port)
    }

    /// Get the device path of the opened serial port
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    async fn write_frame(&mut self, frame: &[u8]) -> Result<()> {
        self.port
            .write_all(frame)
            .await
            .map_err(|e| BridgeError::Serial(format!("Failed to write report: {}", e)))?;

        self.port
            .flush()
            .await
            .map_err(|e| BridgeError::Serial(format!("Failed to flush serial port: {}", e)))?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl ReportSink for HostLink {
    async fn send_report(&mut self, report: &[u8]) -> Result<()> {
        let frame = frame_report(report)?;
        let result = self.write_frame(&frame).await;

        if result.is_ok() != self.connected {
            self.connected = result.is_ok();
            info!(
                "Host link {}",
                if self.connected { "reconnected" } else { "not accepting reports" }
            );
        }

        result?;
        debug!("Sent HID report ({} bytes)", report.len());
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

/// Configured path first, then defaults not already listed
fn candidate_paths(preferred: &str) -> Vec<String> {
    let mut paths = Vec::with_capacity(1 + DEFAULT_DEVICE_PATHS.len());
    if !preferred.is_empty() {
        paths.push(preferred.to_string());
    }
    for path in DEFAULT_DEVICE_PATHS {
        if *path != preferred {
            paths.push((*path).to_string());
        }
    }
    paths
}
