//! Utility submodule
//!
//! Small helpers shared by the data model and the transcoder: identifier
//! generation, slugs and TypeScript string literal handling

use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

static NON_SLUG_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("slug pattern is valid"));

/// Generate unique ID
pub fn generate_uuid() -> String {
    Uuid::new_v4().to_string()
}

/// Render a name as a lowercase, dash-separated file name fragment
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    let slug = NON_SLUG_CHARS.replace_all(&lowered, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "unnamed".to_string()
    } else {
        slug.to_string()
    }
}

/// Render text as a single-quoted TypeScript string literal
pub fn to_single_quoted(text: &str) -> String {
    let mut result = String::with_capacity(text.len() + 2);
    result.push('\'');
    for c in text.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '\'' => result.push_str("\\'"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            '\u{2028}' => result.push_str("\\u2028"),
            '\u{2029}' => result.push_str("\\u2029"),
            c if c.is_control() => result.push_str(&format!("\\u{:04x}", c as u32)),
            c => result.push(c),
        }
    }
    result.push('\'');
    result
}

/// Decode the escape sequences of a JavaScript string literal body (quotes
/// already removed). Returns None if an escape sequence is invalid.
pub fn unescape_js_string(body: &str) -> Option<String> {
    let mut result = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next()? {
            'n' => result.push('\n'),
            'r' => result.push('\r'),
            't' => result.push('\t'),
            'b' => result.push('\u{0008}'),
            'f' => result.push('\u{000c}'),
            'v' => result.push('\u{000b}'),
            '0' => result.push('\0'),
            // Line continuation
            '\n' => {}
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            'x' => {
                let hex: String = chars.by_ref().take(2).collect();
                if hex.len() != 2 {
                    return None;
                }
                result.push(char::from_u32(u32::from_str_radix(&hex, 16).ok()?)?);
            }
            'u' => {
                let code = if chars.peek() == Some(&'{') {
                    chars.next();
                    let hex: String = chars.by_ref().take_while(|c| *c != '}').collect();
                    u32::from_str_radix(&hex, 16).ok()?
                } else {
                    let hex: String = chars.by_ref().take(4).collect();
                    if hex.len() != 4 {
                        return None;
                    }
                    let high = u32::from_str_radix(&hex, 16).ok()?;
                    if (0xD800..0xDC00).contains(&high) {
                        // Surrogate pair written as two \u escapes
                        if chars.next() != Some('\\') || chars.next() != Some('u') {
                            return None;
                        }
                        let hex: String = chars.by_ref().take(4).collect();
                        let low = u32::from_str_radix(&hex, 16).ok()?;
                        0x10000 + ((high - 0xD800) << 10) + (low.checked_sub(0xDC00)?)
                    } else {
                        high
                    }
                };
                result.push(char::from_u32(code)?);
            }
            other => result.push(other),
        }
    }
    Some(result)
}

/// Prefix each non-empty line with `indent`.  Lines flagged in `verbatim`
/// (by line index) are left untouched.
pub fn indent_lines(text: &str, indent: &str, verbatim: &[bool]) -> String {
    text.split('\n')
        .enumerate()
        .map(|(index, line)| {
            if line.is_empty() || verbatim.get(index).copied().unwrap_or(false) {
                line.to_string()
            } else {
                format!("{indent}{line}")
            }
        })
        .collect::<Vec<String>>()
        .join("\n")
}

/// Remove `indent` from the start of each line that carries it, except
/// lines flagged in `verbatim`
pub fn dedent_lines(text: &str, indent: &str, verbatim: &[bool]) -> String {
    if indent.is_empty() {
        return text.to_string();
    }
    text.split('\n')
        .enumerate()
        .map(|(index, line)| {
            if verbatim.get(index).copied().unwrap_or(false) {
                line
            } else {
                line.strip_prefix(indent).unwrap_or(line)
            }
        })
        .collect::<Vec<&str>>()
        .join("\n")
}

/// Return the leading whitespace of the line containing byte offset `at`
pub fn line_indentation(text: &str, at: usize) -> &str {
    let line_start = text[..at].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line = &text[line_start..];
    let width = line
        .find(|c: char| c != ' ' && c != '\t')
        .unwrap_or(line.len());
    &line[..width]
}
