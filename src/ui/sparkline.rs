//! Text sparklines and the one-line metrics summary.

use crate::constants::SPARK_LEVELS;
use crate::monitor::history::{MetricHistory, Ring};
use crate::utils::format_rate;

/// One glyph per value, scaled linearly from `min..=max` onto the palette.
/// Values outside the range are clamped.
pub fn sparkline(values: impl IntoIterator<Item = f64>, min: f64, max: f64) -> String {
    let max = if max <= min { min + 1.0 } else { max };
    let top = SPARK_LEVELS.len() - 1;
    values
        .into_iter()
        .map(|v| {
            let v = if v.is_nan() { min } else { v.clamp(min, max) };
            let idx = ((v - min) / (max - min) * top as f64) as usize;
            SPARK_LEVELS[idx.min(top)]
        })
        .collect()
}

/// Upper bound for unbounded channels: the history maximum, at least 1.
fn auto_scale(ring: &Ring) -> f64 {
    ring.max().unwrap_or(0.0).max(1.0)
}

/// `LOAD <spark> 0.52  |  CPU <spark> 12%  |  ...`. Channels without
/// history are left out.
pub fn summary_line(history: &MetricHistory) -> String {
    let mut parts = Vec::with_capacity(4);
    if let Some(latest) = history.load.latest() {
        parts.push(format!(
            "LOAD {} {:.2}",
            sparkline(history.load.iter(), 0.0, auto_scale(&history.load)),
            latest
        ));
    }
    if let Some(latest) = history.cpu.latest() {
        parts.push(format!(
            "CPU {} {:.0}%",
            sparkline(history.cpu.iter(), 0.0, 100.0),
            latest
        ));
    }
    if let Some(latest) = history.mem.latest() {
        parts.push(format!(
            "MEM {} {:.0}%",
            sparkline(history.mem.iter(), 0.0, 100.0),
            latest
        ));
    }
    if let Some(latest) = history.net.latest() {
        parts.push(format!(
            "NET {} {}",
            sparkline(history.net.iter(), 0.0, auto_scale(&history.net)),
            format_rate(latest)
        ));
    }
    if parts.is_empty() {
        "METRICS unavailable (missing commands)".to_string()
    } else {
        parts.join("  |  ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MetricSample;

    #[test]
    fn sparkline_levels() {
        assert_eq!(sparkline([0.0, 50.0, 100.0], 0.0, 100.0), " =@");
        assert_eq!(sparkline(Vec::<f64>::new(), 0.0, 100.0), "");
    }

    #[test]
    fn sparkline_clamps_out_of_range() {
        assert_eq!(sparkline([-5.0, 250.0], 0.0, 100.0), " @");
    }

    #[test]
    fn sparkline_degenerate_range() {
        // max <= min widens to min + 1.
        assert_eq!(sparkline([3.0, 4.0], 3.0, 3.0), " @");
    }

    #[test]
    fn sparkline_one_glyph_per_value() {
        let values: Vec<f64> = (0..30).map(f64::from).collect();
        assert_eq!(sparkline(values, 0.0, 29.0).chars().count(), 30);
    }

    #[test]
    fn summary_empty_history() {
        assert_eq!(
            summary_line(&MetricHistory::default()),
            "METRICS unavailable (missing commands)"
        );
    }

    #[test]
    fn summary_full() {
        let mut h = MetricHistory::default();
        h.append(&MetricSample {
            load: Some(0.5),
            cpu_pct: Some(12.4),
            mem_pct: Some(40.0),
            net_rate_kb_s: Some(3.0),
        });
        // Load scales to max(1, 0.5) = 1, so 0.5 lands mid-palette.
        assert_eq!(
            summary_line(&h),
            "LOAD = 0.50  |  CPU . 12%  |  MEM - 40%  |  NET @ 3KB/s"
        );
    }

    #[test]
    fn summary_skips_missing_channels() {
        let mut h = MetricHistory::default();
        h.append(&MetricSample {
            mem_pct: Some(99.0),
            net_rate_kb_s: Some(2048.0),
            ..Default::default()
        });
        let line = summary_line(&h);
        assert!(line.starts_with("MEM "));
        assert!(line.ends_with("2.0MB/s"));
        assert!(!line.contains("LOAD") && !line.contains("CPU"));
    }
}
