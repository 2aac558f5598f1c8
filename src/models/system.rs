/// One sampling round's readings.
///
/// Each reading is `None` when the tool was unavailable or its output failed
/// to parse this tick. `None` is never the same thing as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricSample {
    /// 1-minute load average.
    pub load: Option<f64>,
    /// CPU usage percent (0..=100).
    pub cpu_pct: Option<f64>,
    /// Memory usage percent (0..=100).
    pub mem_pct: Option<f64>,
    /// Combined rx+tx throughput across non-loopback interfaces, KB/s.
    pub net_rate_kb_s: Option<f64>,
}

impl MetricSample {
    /// True when no channel produced a reading.
    pub fn is_empty(&self) -> bool {
        self.load.is_none()
            && self.cpu_pct.is_none()
            && self.mem_pct.is_none()
            && self.net_rate_kb_s.is_none()
    }
}

/// Human-readable info lines shown under the summary row.
///
/// Empty strings mean "nothing to show"; the renderer keeps the row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SystemInfo {
    pub snapshot: String,
    pub disk: String,
    pub net: String,
}
