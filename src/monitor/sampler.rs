//! Metric samplers: parser fallback chains plus the network rate baseline.
//!
//! Each metric has an ordered list of [`Candidate`] sources. The first one
//! whose tool is present, runs successfully, and parses wins; when none do,
//! the reading is `None` for this tick.

use std::time::{Duration, Instant};

use tracing::debug;

use super::host::Host;
use super::parsers;
use crate::constants::{MPSTAT_TIMEOUT_MS, QUICK_COMMAND_TIMEOUT_MS};
use crate::models::{MetricSample, SystemInfo};
use crate::utils::format_rate;

/// Where a candidate reads its text from.
#[derive(Debug, Clone, Copy)]
pub enum Source {
    /// A pseudo-file such as `/proc/net/dev`.
    File(&'static str),
    /// A command; `argv[0]` must be available on the host.
    Command {
        argv: &'static [&'static str],
        timeout_ms: u64,
    },
}

/// One entry of a fallback chain.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<T: 'static> {
    pub source: Source,
    pub parse: fn(&str) -> Option<T>,
}

impl<T> Candidate<T> {
    fn read(&self, host: &dyn Host) -> Option<String> {
        match self.source {
            Source::File(path) => host.read_file(path),
            Source::Command { argv, timeout_ms } => {
                let tool = argv.first()?;
                if !host.tool_available(tool) {
                    debug!(tool, "tool not available");
                    return None;
                }
                host.run(argv, Duration::from_millis(timeout_ms))
                    .map_err(|e| debug!(error = %e, "probe command failed"))
                    .ok()
            }
        }
    }

    fn evaluate(&self, host: &dyn Host) -> Option<T> {
        let text = self.read(host)?;
        let parsed = (self.parse)(&text);
        if parsed.is_none() {
            debug!(source = ?self.source, "output did not parse");
        }
        parsed
    }
}

/// Evaluate a fallback chain top to bottom.
pub fn first_match<T>(host: &dyn Host, candidates: &[Candidate<T>]) -> Option<T> {
    candidates.iter().find_map(|c| c.evaluate(host))
}

const fn quick(argv: &'static [&'static str]) -> Source {
    Source::Command {
        argv,
        timeout_ms: QUICK_COMMAND_TIMEOUT_MS,
    }
}

pub const LOAD_CANDIDATES: &[Candidate<f64>] = &[Candidate {
    source: quick(&["uptime"]),
    parse: parsers::parse_load_avg,
}];

pub const CPU_CANDIDATES: &[Candidate<f64>] = &[
    Candidate {
        source: quick(&["vmstat"]),
        parse: parsers::cpu_from_vmstat,
    },
    Candidate {
        source: Source::Command {
            argv: &["mpstat", "1", "1"],
            timeout_ms: MPSTAT_TIMEOUT_MS,
        },
        parse: parsers::cpu_from_mpstat,
    },
];

pub const MEM_CANDIDATES: &[Candidate<f64>] = &[Candidate {
    source: quick(&["free", "-m"]),
    parse: parsers::mem_from_free,
}];

pub const NET_CANDIDATES: &[Candidate<u64>] = &[
    Candidate {
        source: Source::File("/proc/net/dev"),
        parse: parsers::sum_net_bytes_proc,
    },
    Candidate {
        source: quick(&["netstat", "-ib"]),
        parse: parsers::sum_net_bytes_netstat,
    },
];

pub const IFACE_CANDIDATES: &[Candidate<String>] = &[
    Candidate {
        source: Source::File("/proc/net/dev"),
        parse: parsers::first_iface_proc,
    },
    Candidate {
        source: quick(&["netstat", "-ib"]),
        parse: parsers::first_iface_netstat,
    },
];

pub const UPTIME_CANDIDATES: &[Candidate<String>] = &[Candidate {
    source: quick(&["uptime"]),
    parse: parsers::parse_uptime_short,
}];

pub const DISK_CANDIDATES: &[Candidate<String>] = &[Candidate {
    source: quick(&["df", "-h", "/"]),
    parse: parsers::disk_summary,
}];

/// Baseline for turning monotonically increasing byte counters into a rate.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetRateState {
    baseline: Option<(u64, Instant)>,
}

impl NetRateState {
    /// Record `total_bytes` seen at `now` and return KB/s since the previous
    /// observation.
    ///
    /// The first observation, a counter that went backwards, or a
    /// non-positive interval re-baseline and return `None`.
    pub fn observe(&mut self, total_bytes: u64, now: Instant) -> Option<f64> {
        let (prev_total, prev_at) = self.baseline.replace((total_bytes, now))?;
        if total_bytes < prev_total {
            debug!(prev_total, total_bytes, "network counters went backwards");
            return None;
        }
        let secs = now.checked_duration_since(prev_at)?.as_secs_f64();
        if secs <= 0.0 {
            return None;
        }
        Some((total_bytes - prev_total) as f64 / 1024.0 / secs)
    }

    pub fn is_cold(&self) -> bool {
        self.baseline.is_none()
    }
}

/// Sampling context. Owns the only piece of state that survives between
/// ticks.
#[derive(Debug, Clone, Default)]
pub struct Sampler {
    net: NetRateState,
}

impl Sampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take one reading of every metric.
    pub fn sample(&mut self, host: &dyn Host) -> MetricSample {
        self.sample_with_clock(host, Instant::now)
    }

    /// Like [`Sampler::sample`], reading time from `clock`.
    pub fn sample_with_clock(&mut self, host: &dyn Host, clock: impl Fn() -> Instant) -> MetricSample {
        MetricSample {
            load: first_match(host, LOAD_CANDIDATES),
            cpu_pct: first_match(host, CPU_CANDIDATES),
            mem_pct: first_match(host, MEM_CANDIDATES),
            net_rate_kb_s: self.net_rate(host, clock),
        }
    }

    /// Network throughput in KB/s, `None` on a cold or reset baseline or
    /// when no interface data is available.
    ///
    /// The counters are stamped right after they are read.
    pub fn net_rate(&mut self, host: &dyn Host, clock: impl Fn() -> Instant) -> Option<f64> {
        let total = first_match(host, NET_CANDIDATES)?;
        self.net.observe(total, clock())
    }

    /// Take one reading and derive the info lines from it.
    pub fn sample_with_system(&mut self, host: &dyn Host) -> (MetricSample, SystemInfo) {
        let sample = self.sample(host);
        let system = system_info(host, &sample);
        (sample, system)
    }
}

fn fmt_pct(v: Option<f64>) -> String {
    v.map(|v| format!("{:.0}%", v)).unwrap_or_else(|| "--%".to_string())
}

/// Info lines: snapshot, root filesystem usage, primary interface rate.
pub fn system_info(host: &dyn Host, sample: &MetricSample) -> SystemInfo {
    let uptime = first_match(host, UPTIME_CANDIDATES).unwrap_or_else(|| "unknown".to_string());
    let load = sample
        .load
        .map(|l| format!("{:.2}", l))
        .unwrap_or_else(|| "--".to_string());
    let snapshot = format!(
        "Snapshot: CPU {}  MEM {}  LOAD {}  UPTIME {}",
        fmt_pct(sample.cpu_pct),
        fmt_pct(sample.mem_pct),
        load,
        uptime
    );

    let disk = first_match(host, DISK_CANDIDATES)
        .map(|d| format!("Disk: {}", d))
        .unwrap_or_default();

    let net = sample
        .net_rate_kb_s
        .map(|rate| {
            let iface = first_match(host, IFACE_CANDIDATES).unwrap_or_else(|| "iface".to_string());
            format!("Net: {} {}", iface, format_rate(rate))
        })
        .unwrap_or_default();

    SystemInfo {
        snapshot,
        disk,
        net,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::host::fake::FakeHost;
    use crate::monitor::host::CommandError;

    const VMSTAT: &str = "\
procs -----------memory---------- ---swap-- -----io---- -system-- ------cpu-----
 r  b   swpd   free   buff  cache   si   so    bi    bo   in   cs us sy id wa st
 1  0      0 812344 120400 2400112    0    0     5    12  110  220  2  1 97  0  0
";

    const MPSTAT: &str = "\
Linux 6.1.0 (host)

10:00:01 AM  CPU    %usr   %nice    %sys %iowait    %irq   %soft  %steal  %guest  %gnice   %idle
Average:     all    10.00    0.00    0.00    0.00    0.00    0.00    0.00    0.00    0.00   80.00
";

    fn net_dev(rx: u64, tx: u64) -> String {
        format!(
            "    lo: 999 1 0 0 0 0 0 0 999 1 0 0 0 0 0 0\n  eth0: {} 1 0 0 0 0 0 0 {} 1 0 0 0 0 0 0\n",
            rx, tx
        )
    }

    // ── NetRateState ──────────────────────────────────────────────

    #[test]
    fn net_rate_cold_baseline_is_none() {
        let mut state = NetRateState::default();
        assert!(state.is_cold());
        assert_eq!(state.observe(1000, Instant::now()), None);
        assert!(!state.is_cold());
    }

    #[test]
    fn net_rate_between_two_samples() {
        let mut state = NetRateState::default();
        let t0 = Instant::now();
        state.observe(10_000, t0);
        let rate = state.observe(10_000 + 20_480, t0 + Duration::from_secs(2)).unwrap();
        assert!((rate - 10.0).abs() < 1e-9);
    }

    #[test]
    fn net_rate_counter_reset_rebaselines() {
        let mut state = NetRateState::default();
        let t0 = Instant::now();
        state.observe(50_000, t0);
        assert_eq!(state.observe(1_000, t0 + Duration::from_secs(1)), None);
        // The reset value is the new baseline.
        let rate = state.observe(1_000 + 1024, t0 + Duration::from_secs(2)).unwrap();
        assert!((rate - 1.0).abs() < 1e-9);
    }

    #[test]
    fn net_rate_zero_elapsed_is_none() {
        let mut state = NetRateState::default();
        let t0 = Instant::now();
        state.observe(100, t0);
        assert_eq!(state.observe(200, t0), None);
    }

    #[test]
    fn net_rate_unchanged_counter_is_zero() {
        let mut state = NetRateState::default();
        let t0 = Instant::now();
        state.observe(100, t0);
        assert_eq!(state.observe(100, t0 + Duration::from_secs(1)), Some(0.0));
    }

    // ── fallback chains ───────────────────────────────────────────

    #[test]
    fn cpu_prefers_vmstat() {
        let host = FakeHost::new()
            .with_command(&["vmstat"], VMSTAT)
            .with_command(&["mpstat", "1", "1"], MPSTAT);
        assert_eq!(first_match(&host, CPU_CANDIDATES), Some(3.0));
    }

    #[test]
    fn cpu_falls_back_to_mpstat_when_vmstat_absent() {
        let host = FakeHost::new().with_command(&["mpstat", "1", "1"], MPSTAT);
        assert_eq!(first_match(&host, CPU_CANDIDATES), Some(20.0));
    }

    #[test]
    fn cpu_falls_back_when_vmstat_output_is_garbage() {
        let host = FakeHost::new()
            .with_command(&["vmstat"], "vmstat: not supported\n\n")
            .with_command(&["mpstat", "1", "1"], MPSTAT);
        assert_eq!(first_match(&host, CPU_CANDIDATES), Some(20.0));
    }

    #[test]
    fn cpu_falls_back_when_vmstat_fails_to_run() {
        let host = FakeHost::new()
            .with_broken_tool("vmstat")
            .with_command(&["mpstat", "1", "1"], MPSTAT);
        assert_eq!(first_match(&host, CPU_CANDIDATES), Some(20.0));
    }

    #[test]
    fn cpu_none_when_all_candidates_fail() {
        assert_eq!(first_match(&FakeHost::new(), CPU_CANDIDATES), None);
    }

    #[test]
    fn net_falls_back_to_netstat() {
        let netstat = "\
Name  Mtu   Network   Address            Ipkts Ierrs Ibytes Opkts Oerrs Obytes Coll
en0   1500  <Link#4>  aa:bb:cc:dd:ee:ff  1     0     700    1     0     300    0
";
        let host = FakeHost::new().with_command(&["netstat", "-ib"], netstat);
        assert_eq!(first_match(&host, NET_CANDIDATES), Some(1000));
    }

    // ── Sampler ───────────────────────────────────────────────────

    #[test]
    fn sampler_reports_rate_on_second_tick() {
        let mut sampler = Sampler::new();
        let t0 = Instant::now();

        let host = FakeHost::new().with_file("/proc/net/dev", &net_dev(1000, 1000));
        assert_eq!(sampler.net_rate(&host, || t0), None);

        let host = FakeHost::new().with_file("/proc/net/dev", &net_dev(1000 + 2048, 1000 + 2048));
        let rate = sampler.net_rate(&host, || t0 + Duration::from_secs(4)).unwrap();
        assert!((rate - 1.0).abs() < 1e-9);
    }

    #[test]
    fn sampler_without_interface_data_is_none_and_keeps_baseline() {
        let mut sampler = Sampler::new();
        let t0 = Instant::now();
        let with_data = FakeHost::new().with_file("/proc/net/dev", &net_dev(0, 0));
        sampler.net_rate(&with_data, || t0);

        assert_eq!(sampler.net_rate(&FakeHost::new(), || t0 + Duration::from_secs(1)), None);

        let later = FakeHost::new().with_file("/proc/net/dev", &net_dev(1024, 1024));
        let rate = sampler.net_rate(&later, || t0 + Duration::from_secs(2)).unwrap();
        assert!((rate - 1.0).abs() < 1e-9);
    }

    /// Host on a virtual clock: every command costs `delay`, and the
    /// interface counter grows by exactly 1 KB per second.
    struct SlowHost {
        elapsed: std::cell::Cell<Duration>,
        delay: std::cell::Cell<Duration>,
    }

    impl Host for SlowHost {
        fn tool_available(&self, _name: &str) -> bool {
            true
        }

        fn run(&self, argv: &[&str], _timeout: Duration) -> Result<String, CommandError> {
            self.elapsed.set(self.elapsed.get() + self.delay.get());
            Err(CommandError::NotFound(argv[0].to_string()))
        }

        fn read_file(&self, path: &str) -> Option<String> {
            if path != "/proc/net/dev" {
                return None;
            }
            let bytes = self.elapsed.get().as_secs() * 1024;
            Some(net_dev(bytes, 0))
        }
    }

    #[test]
    fn net_rate_is_stamped_at_counter_read() {
        let host = SlowHost {
            elapsed: std::cell::Cell::new(Duration::ZERO),
            delay: std::cell::Cell::new(Duration::ZERO),
        };
        let t0 = Instant::now();
        let clock = || t0 + host.elapsed.get();
        let mut sampler = Sampler::new();

        assert_eq!(sampler.sample_with_clock(&host, clock).net_rate_kb_s, None);

        // Commands before the network read now take 1s each.
        host.elapsed.set(host.elapsed.get() + Duration::from_secs(2));
        host.delay.set(Duration::from_secs(1));
        let rate = sampler.sample_with_clock(&host, clock).net_rate_kb_s.unwrap();
        assert!((rate - 1.0).abs() < 1e-9, "rate {}", rate);
    }

    #[test]
    fn sample_with_nothing_installed_is_empty() {
        let mut sampler = Sampler::new();
        assert!(sampler.sample(&FakeHost::new()).is_empty());
    }

    #[test]
    fn sample_collects_each_channel() {
        let host = FakeHost::new()
            .with_command(&["uptime"], "10:00 up 1 day, load average: 0.50, 0.40, 0.30")
            .with_command(&["vmstat"], VMSTAT)
            .with_command(&["free", "-m"], "Mem: 1000 500 500\n");
        let sample = Sampler::new().sample(&host);
        assert_eq!(sample.load, Some(0.5));
        assert_eq!(sample.cpu_pct, Some(3.0));
        assert_eq!(sample.mem_pct, Some(50.0));
        assert_eq!(sample.net_rate_kb_s, None);
    }

    // ── system_info ───────────────────────────────────────────────

    #[test]
    fn system_info_lines() {
        let host = FakeHost::new()
            .with_command(&["uptime"], " 10:00:00 up 2 days,  3:04,  1 user,  load average: 0.10, 0.20, 0.30")
            .with_command(
                &["df", "-h", "/"],
                "Filesystem Size Used Avail Use% Mounted\n/dev/sda1 50G 20G 28G 42% /\n",
            )
            .with_file("/proc/net/dev", &net_dev(0, 0));
        let sample = MetricSample {
            load: Some(0.1),
            cpu_pct: Some(12.4),
            mem_pct: None,
            net_rate_kb_s: Some(1536.0),
        };
        let info = system_info(&host, &sample);
        assert_eq!(
            info.snapshot,
            "Snapshot: CPU 12%  MEM --%  LOAD 0.10  UPTIME 2 days,  3:04"
        );
        assert_eq!(info.disk, "Disk: / 50G used 20G (42%)");
        assert_eq!(info.net, "Net: eth0 1.5MB/s");
    }

    #[test]
    fn system_info_degrades_to_blank_lines() {
        let info = system_info(&FakeHost::new(), &MetricSample::default());
        assert_eq!(info.snapshot, "Snapshot: CPU --%  MEM --%  LOAD --  UPTIME unknown");
        assert!(info.disk.is_empty());
        assert!(info.net.is_empty());
    }
}
