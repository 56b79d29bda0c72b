//! Backslash-escape helpers shared by the scanners.

/// Whether the byte at `idx` is escaped, i.e. preceded by an odd number of
/// contiguous backslashes at or after `floor`.
pub fn is_escaped(text: &str, idx: usize, floor: usize) -> bool {
    let bytes = text.as_bytes();
    let mut count = 0;
    let mut i = idx;
    while i > floor && bytes[i - 1] == b'\\' {
        count += 1;
        i -= 1;
    }
    count % 2 == 1
}

/// First unescaped occurrence of `needle` in `text[from..end]`.
pub fn find_unescaped(text: &str, from: usize, end: usize, needle: u8) -> Option<usize> {
    let bytes = text.as_bytes();
    (from..end).find(|&i| bytes[i] == needle && !is_escaped(text, i, from))
}

/// Index of the unescaped `}` balancing the `{` just before `from`.
pub fn find_closing_brace(text: &str, from: usize, end: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    for i in from..end {
        match bytes[i] {
            b'{' if !is_escaped(text, i, from) => depth += 1,
            b'}' if !is_escaped(text, i, from) => {
                if depth == 0 {
                    return Some(i);
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    None
}

/// Finds a closing line `delim` at the start of a line, searching from the
/// newline at `newline_idx`. Returns the index of the newline preceding it.
pub fn find_line_delimiter(text: &str, newline_idx: usize, end: usize, delim: &str) -> Option<usize> {
    let mut needle = String::with_capacity(delim.len() + 1);
    needle.push('\n');
    needle.push_str(delim);
    text.get(newline_idx..end)?
        .find(&needle)
        .map(|rel| newline_idx + rel)
}

/// Drops the backslash of every escape sequence, keeping the escaped char.
/// A trailing lone backslash is kept.
pub fn unescape_markup(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some(next) => out.push(next),
                None => out.push('\\'),
            }
        } else {
            out.push(ch);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_escaped_counts_contiguous_backslashes() {
        assert!(is_escaped(r"a\}", 2, 0));
        assert!(!is_escaped(r"a\\}", 3, 0));
        assert!(is_escaped(r"a\\\}", 4, 0));
        assert!(!is_escaped("}", 0, 0));
    }

    #[test]
    fn test_is_escaped_respects_floor() {
        // backslash before the floor belongs to an enclosing construct
        assert!(!is_escaped(r"\}", 1, 1));
    }

    #[test]
    fn test_find_unescaped_skips_escaped_pipe() {
        let text = r"a\|b|c";
        assert_eq!(find_unescaped(text, 0, text.len(), b'|'), Some(4));
    }

    #[test]
    fn test_find_closing_brace_balances_nested() {
        let text = "{a{b}c}d";
        assert_eq!(find_closing_brace(text, 1, text.len()), Some(6));
        let text = r"{a\}b}";
        assert_eq!(find_closing_brace(text, 1, text.len()), Some(5));
        assert_eq!(find_closing_brace("{abc", 1, 4), None);
    }

    #[test]
    fn test_find_line_delimiter() {
        let text = "~x\nbody\n~x~";
        assert_eq!(find_line_delimiter(text, 2, text.len(), "~x~"), Some(7));
        let text = "~x\n~x~";
        assert_eq!(find_line_delimiter(text, 2, text.len(), "~x~"), Some(2));
        assert_eq!(find_line_delimiter("~x\nbody", 2, 7, "~x~"), None);
    }

    #[test]
    fn test_unescape_markup() {
        assert_eq!(unescape_markup(r"a\|b\\c\"), r"a|b\c\");
    }
}
