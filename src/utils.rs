//! Shared utility functions used across modules.

use crate::constants::SPINNER_CHARS;

/// Get the spinner character for the current tick.
pub fn spinner_char(tick: u64) -> &'static str {
    SPINNER_CHARS[(tick % SPINNER_CHARS.len() as u64) as usize]
}

/// Format a KB/s rate: whole KB/s below 1024, otherwise MB/s with one
/// decimal.
pub fn format_rate(kb_s: f64) -> String {
    if kb_s < 1024.0 {
        format!("{:.0}KB/s", kb_s)
    } else {
        format!("{:.1}MB/s", kb_s / 1024.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spinner_char_cycles() {
        assert_eq!(spinner_char(0), "|");
        assert_eq!(spinner_char(1), "/");
        assert_eq!(spinner_char(2), "-");
        assert_eq!(spinner_char(3), "\\");
        assert_eq!(spinner_char(4), "|");
    }

    #[test]
    fn format_rate_boundaries() {
        assert_eq!(format_rate(0.0), "0KB/s");
        assert_eq!(format_rate(512.4), "512KB/s");
        assert_eq!(format_rate(1023.0), "1023KB/s");
        assert_eq!(format_rate(1024.0), "1.0MB/s");
        assert_eq!(format_rate(1536.0), "1.5MB/s");
    }
}
