//! Bounded per-metric history feeding the sparklines.

use std::collections::VecDeque;

use crate::constants::HISTORY_LENGTH;
use crate::models::MetricSample;

/// Fixed-capacity FIFO of readings for one metric channel.
#[derive(Debug, Clone)]
pub struct Ring {
    values: VecDeque<f64>,
    capacity: usize,
}

impl Ring {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append `value`, dropping the oldest entries beyond capacity.
    pub fn push(&mut self, value: f64) {
        self.values.push_back(value);
        while self.values.len() > self.capacity {
            self.values.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Most recent reading, if any.
    pub fn latest(&self) -> Option<f64> {
        self.values.back().copied()
    }

    /// Largest reading, if any.
    pub fn max(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }

    /// Readings, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }
}

impl Default for Ring {
    fn default() -> Self {
        Self::with_capacity(HISTORY_LENGTH)
    }
}

/// Four independent rings, one per metric.
///
/// Channels grow only when their reading is present, so they may differ in
/// length and age.
#[derive(Debug, Clone, Default)]
pub struct MetricHistory {
    pub load: Ring,
    pub cpu: Ring,
    pub mem: Ring,
    pub net: Ring,
}

impl MetricHistory {
    pub fn append(&mut self, sample: &MetricSample) {
        let channels = [
            (&mut self.load, sample.load),
            (&mut self.cpu, sample.cpu_pct),
            (&mut self.mem, sample.mem_pct),
            (&mut self.net, sample.net_rate_kb_s),
        ];
        for (ring, reading) in channels {
            if let Some(value) = reading {
                ring.push(value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_sample(v: f64) -> MetricSample {
        MetricSample {
            load: Some(v),
            cpu_pct: Some(v),
            mem_pct: Some(v),
            net_rate_kb_s: Some(v),
        }
    }

    #[test]
    fn ring_len_is_min_of_appends_and_capacity() {
        for k in 0..(HISTORY_LENGTH * 2) {
            let mut ring = Ring::default();
            for i in 0..k {
                ring.push(i as f64);
            }
            assert_eq!(ring.len(), k.min(HISTORY_LENGTH));
            if k > 0 {
                assert_eq!(ring.latest(), Some((k - 1) as f64));
            }
        }
    }

    #[test]
    fn ring_drops_oldest_first() {
        let mut ring = Ring::with_capacity(3);
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            ring.push(v);
        }
        assert_eq!(ring.iter().collect::<Vec<_>>(), vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn ring_max_and_empty() {
        let mut ring = Ring::with_capacity(5);
        assert!(ring.is_empty());
        assert_eq!(ring.max(), None);
        assert_eq!(ring.latest(), None);
        ring.push(2.0);
        ring.push(7.5);
        ring.push(1.0);
        assert_eq!(ring.max(), Some(7.5));
    }

    #[test]
    fn append_full_sample_grows_all_channels() {
        let mut h = MetricHistory::default();
        h.append(&full_sample(1.0));
        assert_eq!(h.load.latest(), Some(1.0));
        assert_eq!(h.cpu.latest(), Some(1.0));
        assert_eq!(h.mem.latest(), Some(1.0));
        assert_eq!(h.net.latest(), Some(1.0));
    }

    #[test]
    fn append_trims_to_history_length() {
        let mut h = MetricHistory::default();
        for i in 0..41 {
            h.append(&full_sample(i as f64));
        }
        assert_eq!(h.load.len(), HISTORY_LENGTH);
        assert_eq!(h.net.latest(), Some(40.0));
    }

    #[test]
    fn missing_readings_leave_channels_untouched() {
        let mut h = MetricHistory::default();
        h.append(&full_sample(10.0));
        h.append(&MetricSample {
            cpu_pct: Some(20.0),
            ..Default::default()
        });
        assert_eq!(h.cpu.len(), 2);
        assert_eq!(h.load.len(), 1);
        assert_eq!(h.mem.len(), 1);
        assert_eq!(h.net.len(), 1);
        assert_eq!(h.mem.latest(), Some(10.0));
        assert_eq!(h.cpu.latest(), Some(20.0));
    }

    #[test]
    fn empty_sample_is_a_no_op() {
        let mut h = MetricHistory::default();
        h.append(&MetricSample::default());
        assert!(h.load.is_empty() && h.cpu.is_empty() && h.mem.is_empty() && h.net.is_empty());
    }
}
