//! # Bridge
//!
//! Connects the ingest pipeline to the host link: each accepted datagram is
//! ingested, encoded in the active report layout and sent to the sink.
//!
//! Nothing on this path is fatal. A rejected datagram is logged and dropped;
//! a failed send is logged and the report discarded, since the next datagram
//! supersedes it.

use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::hid::ReportLayout;
use crate::link::port_trait::ReportSink;
use crate::processor::IngestPipeline;

/// Datagram-to-report forwarding
pub struct Bridge<S: ReportSink> {
    pipeline: Arc<IngestPipeline>,
    layout: ReportLayout,
    sink: S,
    reports_sent: u64,
    send_failures: u64,
}

impl<S: ReportSink> Bridge<S> {
    /// Creates a bridge. The pipeline should normalize into `layout.output_scale()`.
    pub fn new(pipeline: Arc<IngestPipeline>, layout: ReportLayout, sink: S) -> Self {
        if pipeline.output_scale() != layout.output_scale() {
            warn!(
                "Pipeline output scale {} does not match {} layout scale {}",
                pipeline.output_scale(),
                layout,
                layout.output_scale()
            );
        }

        Self {
            pipeline,
            layout,
            sink,
            reports_sent: 0,
            send_failures: 0,
        }
    }

    /// Processes one datagram and forwards the resulting report.
    ///
    /// Returns the encoded report, or `None` if the datagram was rejected.
    /// A report is returned even when the send failed.
    pub async fn handle_datagram(
        &mut self,
        sender: SocketAddr,
        bytes: &[u8],
        length: usize,
        now: Instant,
    ) -> Option<Bytes> {
        let (left, right) = match self.pipeline.ingest(bytes, length, now) {
            Ok(values) => values,
            Err(e) => {
                warn!("Failed to process datagram from {}: {}", sender, e);
                return None;
            }
        };

        let report = self.layout.encode(left, right);
        match self.sink.send_report(&report).await {
            Ok(()) => self.reports_sent += 1,
            Err(e) => {
                self.send_failures += 1;
                debug!("Failed to send HID report: {}", e);
            }
        }

        Some(report)
    }

    /// Logs a one-shot status summary.
    pub fn log_status(&self) {
        let (packets, bytes) = self.pipeline.get_stats();
        info!("=== System Status ===");
        info!("Calibration: {}", self.pipeline.calibration_status());
        info!(
            "Host link: {}",
            if self.sink.is_connected() { "Connected" } else { "Disconnected" }
        );
        info!("Packets processed: {}", packets);
        info!("Total bytes: {}", bytes);
        info!("Reports sent: {} ({} failed)", self.reports_sent, self.send_failures);
    }

    pub fn pipeline(&self) -> &Arc<IngestPipeline> {
        &self.pipeline
    }

    pub fn layout(&self) -> ReportLayout {
        self.layout
    }

    pub fn reports_sent(&self) -> u64 {
        self.reports_sent
    }

    pub fn send_failures(&self) -> u64 {
        self.send_failures
    }
}
