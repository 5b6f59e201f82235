//! Trait abstractions for the host link to enable testing

use async_trait::async_trait;
use std::io;

use crate::error::Result;

/// Trait for serial port I/O operations
#[async_trait]
pub trait SerialPortIO: Send {
    /// Write all data to the port
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Flush the output buffer
    async fn flush(&mut self) -> io::Result<()>;
}

/// Destination for encoded HID report bodies.
///
/// A failed send is reported to the caller but is not fatal: the next report
/// supersedes the dropped one.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReportSink: Send {
    /// Deliver one report body to the host
    async fn send_report(&mut self, report: &[u8]) -> Result<()>;

    /// Whether the last delivery attempt succeeded
    fn is_connected(&self) -> bool;
}

/// Wrapper around tokio_serial::SerialStream that implements SerialPortIO
pub struct TokioSerialPort {
    port: tokio_serial::SerialStream,
}

impl TokioSerialPort {
    pub fn new(port: tokio_serial::SerialStream) -> Self {
        Self { port }
    }
}

#[async_trait]
impl SerialPortIO for TokioSerialPort {
    async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        use tokio::io::AsyncWriteExt;
        self.port.write_all(data).await
    }

    async fn flush(&mut self) -> io::Result<()> {
        use tokio::io::AsyncWriteExt;
        self.port.flush().await
    }
}
