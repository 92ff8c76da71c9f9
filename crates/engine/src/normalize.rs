//! Text normalization applied before segmentation.
//!
//! Fragment line numbers and content refer to the normalized text, so this
//! is the single place where the raw bytes are touched.

/// Zero-width characters (including the BOM) removed everywhere
const ZERO_WIDTH: &[char] = &['\u{FEFF}', '\u{200B}', '\u{200C}', '\u{200D}', '\u{2060}'];

/// Normalize a document for segmentation
///
/// Strips the BOM and zero-width characters, drops control characters other
/// than `\n`, `\t`, and `\r`, and trims trailing whitespace from every
/// line. CRLF endings collapse to LF as a consequence of the trailing trim;
/// the segmenter never has to guess about `\r`.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        let (body, had_newline) = match line.strip_suffix('\n') {
            Some(body) => (body, true),
            None => (line, false),
        };
        let cleaned: String = body
            .chars()
            .filter(|c| !ZERO_WIDTH.contains(c) && (!c.is_control() || *c == '\t' || *c == '\r'))
            .collect();
        out.push_str(cleaned.trim_end());
        if had_newline {
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_strips_bom_and_zero_width() {
        assert_eq!(normalize("\u{FEFF}fn main() {}\n"), "fn main() {}\n");
        assert_eq!(normalize("let x\u{200B} = 1;\n"), "let x = 1;\n");
    }

    #[test]
    fn test_crlf_collapses_to_lf() {
        assert_eq!(normalize("a\r\nb\r\n"), "a\nb\n");
    }

    #[test]
    fn test_trailing_whitespace_trimmed_per_line() {
        assert_eq!(normalize("def f():   \n    return 1\t\n"), "def f():\n    return 1\n");
    }

    #[test]
    fn test_control_characters_dropped_but_tabs_kept() {
        assert_eq!(normalize("a\x07b\n\tc\n"), "ab\n\tc\n");
    }

    #[test]
    fn test_idempotent() {
        let raw = "\u{FEFF}x = 1  \r\ny = 2\n";
        let once = normalize(raw);
        assert_eq!(normalize(&once), once);
    }
}
