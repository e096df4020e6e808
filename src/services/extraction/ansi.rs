//! Terminal escape sequence removal for raw CI logs.
//!
//! CI front-ends colorize their output, which breaks the line-anchored
//! outcome patterns. Only complete sequences are removed; anything that does
//! not parse as one is copied through untouched.

use std::sync::LazyLock;

use regex::bytes::Regex;

/// ESC followed by a 7-bit C1 (Fe) byte, or a CSI sequence:
/// `ESC [`, parameter bytes, intermediate bytes, one final byte.
static ESCAPE_SEQUENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1B(?:[@-Z\\-_]|\[[0-?]*[ -/]*[@-~])").expect("escape sequence pattern is valid")
});

const ESC: u8 = 0x1B;

/// Strip escape sequences from raw log bytes and decode to text.
///
/// Invalid UTF-8 is replaced rather than rejected.
pub fn normalize(raw: &[u8]) -> String {
    if !raw.contains(&ESC) {
        return String::from_utf8_lossy(raw).into_owned();
    }
    let cleaned = ESCAPE_SEQUENCE.replace_all(raw, &b""[..]);
    String::from_utf8_lossy(&cleaned).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_unchanged() {
        let text = "line one\nline two ✓\n\n  indented\ttab\r\n";
        assert_eq!(normalize(text.as_bytes()), text);
    }

    #[test]
    fn test_strips_color_codes() {
        let raw = b"\x1b[1m\x1b[32mray/tests/test_a.py::test_x PASSED\x1b[0m\n";
        assert_eq!(normalize(raw), "ray/tests/test_a.py::test_x PASSED\n");
    }

    #[test]
    fn test_strips_fe_and_csi_with_intermediates() {
        // ESC M (reverse index), ESC [ ? 25 l (hide cursor), ESC [ 1 ; 2 SP q
        let raw = b"a\x1bMb\x1b[?25lc\x1b[1;2 qd";
        assert_eq!(normalize(raw), "abcd");
    }

    #[test]
    fn test_preserves_newlines_between_sequences() {
        let raw = b"\x1b[31mred\x1b[0m\n\x1b[32mgreen\x1b[0m\n";
        assert_eq!(normalize(raw), "red\ngreen\n");
    }

    #[test]
    fn test_malformed_sequences_are_copied_through() {
        // Lone ESC at end and ESC followed by a byte outside the Fe range.
        let raw = b"keep\x1b\x1b\x7fthis\x1b";
        assert_eq!(normalize(raw), "keep\x1b\x1b\x7fthis\x1b");
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let raw = b"ok \xff\x1b[0m done";
        assert_eq!(normalize(raw), "ok \u{FFFD} done");
    }
}
