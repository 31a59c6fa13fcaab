// ============================================================
// Layer 4 — Text Normalisation
// ============================================================
// Corpus XML and JSON records arrive with indentation, line
// breaks, tabs and non-breaking spaces baked into the text.
// Every string that becomes a question or a context goes
// through `normalize_whitespace` first:
//
//   "  Tome\n\t paracetamol\u{00A0} a cada 8 horas "
//       → "Tome paracetamol a cada 8 horas"
//
// Runs of Unicode whitespace collapse to a single ASCII space
// and both ends are trimmed.
//
// Reference: Rust Book §8 (Strings in Rust)

/// Collapse every run of whitespace into one space and trim the ends.
pub fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_multiple_spaces() {
        assert_eq!(normalize_whitespace("hello   world"), "hello world");
    }

    #[test]
    fn test_trims_edges() {
        assert_eq!(normalize_whitespace("  hello world  "), "hello world");
    }

    #[test]
    fn test_newlines_and_tabs_become_spaces() {
        assert_eq!(normalize_whitespace("line1\n\n\t line2\r\nline3"), "line1 line2 line3");
    }

    #[test]
    fn test_non_breaking_space_is_whitespace() {
        assert_eq!(normalize_whitespace("8\u{00A0}horas"), "8 horas");
    }

    #[test]
    fn test_empty_and_blank() {
        assert_eq!(normalize_whitespace(""), "");
        assert_eq!(normalize_whitespace(" \n\t "), "");
    }
}
