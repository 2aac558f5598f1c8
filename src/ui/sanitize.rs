//! Strip terminal control sequences that would fight the dashboard for the
//! screen (cursor motion, clears, scroll regions) while keeping SGR colors.

const ESC: u8 = 0x1b;

fn is_param(b: u8) -> bool {
    b.is_ascii_digit() || b == b';' || b == b'?'
}

fn is_final(b: u8) -> bool {
    (0x40..=0x7e).contains(&b)
}

/// Length of a removable CSI sequence starting at `bytes[start]`, if any.
///
/// Removable means `ESC [ params final` with `final != 'm'`.
fn removable_csi_len(bytes: &[u8], start: usize) -> Option<usize> {
    if bytes.get(start + 1) != Some(&b'[') {
        return None;
    }
    let mut i = start + 2;
    while i < bytes.len() && is_param(bytes[i]) {
        i += 1;
    }
    let last = *bytes.get(i)?;
    (is_final(last) && last != b'm').then_some(i + 1 - start)
}

/// Remove every non-SGR CSI sequence. Anything that is not a complete
/// sequence is left as it was.
pub fn sanitize(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut copied = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == ESC {
            if let Some(len) = removable_csi_len(bytes, i) {
                // ESC and the sequence are ASCII, so both cuts fall on char
                // boundaries.
                out.push_str(&input[copied..i]);
                i += len;
                copied = i;
                continue;
            }
        }
        i += 1;
    }
    out.push_str(&input[copied..]);
    out
}
