//! Application-wide constants.
//!
//! Centralizes intervals, timeouts, capacities and paths so the sampling
//! pipeline and the UI agree on the same numbers.

use std::path::PathBuf;

// ── Timing ────────────────────────────────────────────────────────
/// Minimum allowed refresh interval (ms) for tabs and metrics.
pub const MIN_REFRESH_MS: u64 = 250;
/// Default refresh interval (ms) when neither tab nor config sets one.
pub const DEFAULT_REFRESH_MS: u64 = 5000;
/// Event poll timeout (ms) -- how often the UI checks for input.
pub const EVENT_POLL_MS: u64 = 50;
/// Spinner frame interval (ms).
pub const SPINNER_INTERVAL_MS: u64 = 200;
/// Timeout for a tab's command.
pub const TAB_COMMAND_TIMEOUT_MS: u64 = 4000;
/// Timeout for quick probe commands (uptime, vmstat, free, df, netstat).
pub const QUICK_COMMAND_TIMEOUT_MS: u64 = 2000;
/// Timeout for `mpstat 1 1`, which samples for a full second.
pub const MPSTAT_TIMEOUT_MS: u64 = 3000;
/// Poll step while waiting on a child process.
pub const CHILD_POLL_MS: u64 = 10;

// ── Capacities ────────────────────────────────────────────────────
/// Samples kept per metric channel for sparklines.
pub const HISTORY_LENGTH: usize = 30;
/// Rows scrolled by PageUp/PageDown in the content pane.
pub const PAGE_SIZE: usize = 10;

// ── Layout ────────────────────────────────────────────────────────
/// Rows used by everything except the content pane's inner area.
pub const FIXED_ROWS: u16 = 9;
/// Horizontal padding added by every tab bar cell style (1 left, 1 right).
pub const TAB_CELL_PADDING: usize = 2;
/// Text of the overflow marker cell.
pub const OVERFLOW_MARKER: &str = " … ";

// ── Spinner Animation ─────────────────────────────────────────────
/// Spinner frames shown in the footer.
pub const SPINNER_CHARS: &[&str] = &["|", "/", "-", "\\"];

// ── Sparklines ────────────────────────────────────────────────────
/// Glyph palette, lowest to highest.
pub const SPARK_LEVELS: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

// ── Environment ───────────────────────────────────────────────────
/// Explicit config file path.
pub const ENV_CONFIG: &str = "PERFMON_CONFIG";
/// Starting theme override.
pub const ENV_THEME: &str = "PERFMON_THEME";
/// Log filter directive (tracing EnvFilter syntax).
pub const ENV_LOG: &str = "PERFMON_LOG";

// ── Paths ─────────────────────────────────────────────────────────

/// Returns the user's home directory, falling back to /tmp.
pub fn home_dir() -> PathBuf {
    PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string()))
}

/// Returns `~/.config/perfmon/`.
pub fn config_dir() -> PathBuf {
    home_dir().join(".config").join("perfmon")
}

/// Returns `~/.config/perfmon/config.toml`.
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Returns `./perfmon.toml`, the working-directory fallback.
pub fn local_config_path() -> PathBuf {
    PathBuf::from("perfmon.toml")
}

/// Returns `~/.config/perfmon/themes/<name>.toml`.
pub fn custom_theme_path(name: &str) -> PathBuf {
    config_dir().join("themes").join(format!("{}.toml", name))
}

/// Returns `~/.local/share/perfmon/`.
pub fn data_dir() -> PathBuf {
    home_dir().join(".local").join("share").join("perfmon")
}

/// Returns `~/.local/share/perfmon/perfmon.log`.
pub fn log_file_path() -> PathBuf {
    data_dir().join("perfmon.log")
}
