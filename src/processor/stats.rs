//! # Packet Statistics
//!
//! Diagnostic counters for processed datagrams. Both counters wrap on overflow.

/// Snapshot of processed traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    pub total_packets: u32,
    pub total_bytes: u32,
}

/// Counts packets and bytes.
#[derive(Debug, Default)]
pub struct StatsCollector {
    stats: Stats,
}

impl StatsCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one packet of `byte_count` bytes.
    pub fn record(&mut self, byte_count: usize) {
        self.stats.total_packets = self.stats.total_packets.wrapping_add(1);
        // Truncation matches the wrapping counter width
        self.stats.total_bytes = self.stats.total_bytes.wrapping_add(byte_count as u32);
    }

    /// Current counters.
    #[must_use]
    pub fn snapshot(&self) -> Stats {
        self.stats
    }

    /// Zeroes both counters.
    pub fn clear(&mut self) {
        self.stats = Stats::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_counts() {
        let mut stats = StatsCollector::new();
        stats.record(4);
        stats.record(10);
        assert_eq!(stats.snapshot(), Stats { total_packets: 2, total_bytes: 14 });
    }

    #[test]
    fn test_counters_wrap() {
        let mut stats = StatsCollector {
            stats: Stats {
                total_packets: u32::MAX,
                total_bytes: u32::MAX - 1,
            },
        };
        stats.record(4);
        assert_eq!(stats.snapshot(), Stats { total_packets: 0, total_bytes: 2 });
    }

    #[test]
    fn test_clear() {
        let mut stats = StatsCollector::new();
        stats.record(8);
        stats.clear();
        assert_eq!(stats.snapshot(), Stats::default());
    }
}
