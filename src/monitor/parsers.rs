//! Text parsers for the output of classic Unix diagnostic tools.
//!
//! Every function here is pure: it takes the captured text and returns
//! `None` when the text does not have the expected shape. None of them
//! panic on malformed input.

use std::collections::HashSet;

/// Parse a trimmed decimal number.
pub fn parse_float(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok()
}

/// Interfaces whose name starts with `lo` (lo, lo0, ...) are loopback.
pub fn is_loopback(iface: &str) -> bool {
    iface.starts_with("lo")
}

/// Convert an idle percentage into a usage percentage clamped to 0..=100.
pub fn usage_from_idle(idle: f64) -> f64 {
    (100.0 - idle).clamp(0.0, 100.0)
}

/// Position of `name` in a header row.
fn column_index(header: &[&str], name: &str) -> Option<usize> {
    header.iter().position(|h| *h == name)
}

/// The last two non-blank lines of `out`, tokenized as (header, values).
///
/// Returns `None` when there are fewer than two such lines or when the two
/// rows have different token counts.
fn tail_header_values(out: &str) -> Option<(Vec<&str>, Vec<&str>)> {
    let mut rows = out
        .lines()
        .rev()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.split_whitespace().collect::<Vec<_>>());
    let values = rows.next()?;
    let header = rows.next()?;
    if header.len() != values.len() {
        return None;
    }
    Some((header, values))
}

/// First 1-minute load average from `uptime`.
///
/// Handles both `load average: 0.52, 0.58, 0.59` (Linux) and
/// `load averages: 1.23 1.45 1.67` (BSD/macOS).
pub fn parse_load_avg(out: &str) -> Option<f64> {
    let line = out.trim();
    let idx = line.find("load average")?;
    let rest = &line[idx..];
    let after_label = rest
        .split([':', ','])
        .filter(|p| !p.trim().is_empty())
        .nth(1)?;
    let first = after_label.split_whitespace().next()?;
    parse_float(first)
}

/// Short uptime (e.g. `3 days, 4:05`) from `uptime`.
pub fn parse_uptime_short(out: &str) -> Option<String> {
    let line = out.trim();
    let idx = line.find(" up ")?;
    let mut part = &line[idx + 4..];
    if let Some(cut) = part.find("load average") {
        part = &part[..cut];
    }
    if let Some(cut) = part.find(" user") {
        part = &part[..cut];
        // Drop the user count that precedes " user(s)".
        if let Some(comma) = part.rfind(',') {
            part = &part[..comma];
        }
    }
    let short = part.trim_matches(|c| c == ' ' || c == ',');
    if short.is_empty() {
        None
    } else {
        Some(short.to_string())
    }
}

/// CPU usage from `vmstat`: the `id` column of the last header/value pair.
pub fn cpu_from_vmstat(out: &str) -> Option<f64> {
    if out.trim().lines().count() < 3 {
        return None;
    }
    let (header, values) = tail_header_values(out)?;
    let idx = column_index(&header, "id")?;
    let idle = parse_float(values[idx])?;
    Some(usage_from_idle(idle))
}

/// CPU usage from `mpstat 1 1`: the last `all` row, idle is the last field.
pub fn cpu_from_mpstat(out: &str) -> Option<f64> {
    for line in out.trim().lines().rev() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("Linux") {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 5 || !fields[1].eq_ignore_ascii_case("all") {
            continue;
        }
        if let Some(idle) = fields.last().and_then(|f| parse_float(f)) {
            return Some(usage_from_idle(idle));
        }
    }
    None
}

/// Memory usage percent from the `Mem:` line of `free -m`.
pub fn mem_from_free(out: &str) -> Option<f64> {
    let line = out.lines().find(|l| l.starts_with("Mem:"))?;
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 3 {
        return None;
    }
    let total = parse_float(fields[1])?;
    if total == 0.0 {
        return None;
    }
    let used = parse_float(fields[2])?;
    Some(used / total * 100.0)
}

/// Split a `/proc/net/dev` line into (interface, counters).
fn proc_net_dev_line(line: &str) -> Option<(&str, Vec<&str>)> {
    let (iface, rest) = line.split_once(':')?;
    Some((iface.trim(), rest.split_whitespace().collect()))
}

/// Sum of rx+tx bytes over non-loopback interfaces in `/proc/net/dev`.
///
/// `None` when no interface contributed.
pub fn sum_net_bytes_proc(data: &str) -> Option<u64> {
    let mut total: u64 = 0;
    let mut found = false;
    for line in data.lines() {
        let Some((iface, fields)) = proc_net_dev_line(line) else {
            continue;
        };
        if is_loopback(iface) || fields.len() < 16 {
            continue;
        }
        let (Ok(rx), Ok(tx)) = (fields[0].parse::<u64>(), fields[8].parse::<u64>()) else {
            continue;
        };
        total = total.saturating_add(rx.saturating_add(tx));
        found = true;
    }
    found.then_some(total)
}

/// First non-loopback interface listed in `/proc/net/dev`.
pub fn first_iface_proc(data: &str) -> Option<String> {
    data.lines()
        .filter_map(proc_net_dev_line)
        .map(|(iface, _)| iface)
        .find(|iface| !iface.is_empty() && !is_loopback(iface))
        .map(str::to_string)
}

/// Column positions in a `netstat -ib` header.
struct NetstatColumns {
    name: usize,
    ibytes: usize,
    obytes: usize,
    width: usize,
}

fn netstat_columns(header: &str) -> Option<NetstatColumns> {
    let header: Vec<&str> = header.split_whitespace().collect();
    Some(NetstatColumns {
        name: column_index(&header, "Name")?,
        ibytes: column_index(&header, "Ibytes")?,
        obytes: column_index(&header, "Obytes")?,
        width: header.len(),
    })
}

/// Sum of Ibytes+Obytes over non-loopback interfaces in `netstat -ib`.
///
/// Rows whose token count differs from the header are skipped, and each
/// interface is counted once (its first, link-level row).
pub fn sum_net_bytes_netstat(out: &str) -> Option<u64> {
    let mut lines = out.trim().lines();
    let cols = netstat_columns(lines.next()?)?;
    let mut seen = HashSet::new();
    let mut total: u64 = 0;
    let mut found = false;
    for line in lines {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != cols.width {
            continue;
        }
        let iface = fields[cols.name];
        if is_loopback(iface) || seen.contains(iface) {
            continue;
        }
        let (Ok(ib), Ok(ob)) = (
            fields[cols.ibytes].parse::<u64>(),
            fields[cols.obytes].parse::<u64>(),
        ) else {
            continue;
        };
        seen.insert(iface);
        total = total.saturating_add(ib.saturating_add(ob));
        found = true;
    }
    found.then_some(total)
}

/// First non-loopback interface in `netstat -ib`.
pub fn first_iface_netstat(out: &str) -> Option<String> {
    let mut lines = out.trim().lines();
    let header: Vec<&str> = lines.next()?.split_whitespace().collect();
    let idx = column_index(&header, "Name")?;
    lines
        .filter_map(|l| l.split_whitespace().nth(idx))
        .find(|iface| !is_loopback(iface))
        .map(str::to_string)
}

/// `/ <size> used <used> (<pct>)` from `df -h /`.
pub fn disk_summary(out: &str) -> Option<String> {
    let line = out.trim().lines().nth(1)?;
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 5 {
        return None;
    }
    Some(format!("/ {} used {} ({})", fields[1], fields[2], fields[4]))
}
