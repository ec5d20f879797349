//! Text utilities shared by the tokenizer and interpreter.
//!
//! These are plain functions over `&str` with no state. Whitespace follows the
//! tokenizer's definition: any character at or below the ASCII space.

/// Returns true for the characters treated as whitespace in tags and
/// standalone detection.
#[inline]
pub fn is_blank(c: char) -> bool {
    c <= ' '
}

/// Returns true for `\n` and `\r`.
#[inline]
pub fn is_line_break(c: char) -> bool {
    c == '\n' || c == '\r'
}

/// Escapes the characters that are significant in HTML.
///
/// # Example
///
/// ```rust
/// use mustang::escape_html;
///
/// assert_eq!(escape_html("A&B"), "A&amp;B");
/// assert_eq!(escape_html("<a href=\"x\">"), "&lt;a href=&quot;x&quot;&gt;");
/// ```
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Strips leading and trailing whitespace (every character `<= ' '`).
pub fn trim(text: &str) -> &str {
    text.trim_matches(is_blank)
}

/// Prefixes every line of `text` that has content with `prefix`.
///
/// Empty lines are left alone, as is the position after a trailing line
/// break. `\r\n` counts as a single break.
///
/// # Example
///
/// ```rust
/// use mustang::indent;
///
/// assert_eq!(indent("a\n\nb\n", "  "), "  a\n\n  b\n");
/// ```
pub fn indent(text: &str, prefix: &str) -> String {
    if prefix.is_empty() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len() + prefix.len());
    let mut at_line_start = true;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if at_line_start && !is_line_break(c) {
            out.push_str(prefix);
        }
        at_line_start = false;
        out.push(c);

        match c {
            // the following '\n' completes this break
            '\r' if chars.peek() == Some(&'\n') => {}
            '\r' | '\n' => at_line_start = true,
            _ => {}
        }
    }

    out
}

/// Counts line breaks, treating `\r\n` as one.
pub fn count_line_breaks(text: &str) -> usize {
    let mut count = 0;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\n' => count += 1,
            '\r' => {
                count += 1;
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            _ => {}
        }
    }
    count
}
