//! Helper functions shared by the block scanner, the inline tokenizer and
//! the renderers.

use lazy_static::lazy_static;
use std::collections::HashMap;

/// Return the normalized form of a link label: leading/trailing whitespace
/// trimmed and internal whitespace runs collapsed to a single space.
/// Case folding is applied by the `UniCase` keys of the definition map.
pub fn normalize_label(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut in_whitespace = false;
    for ch in label.trim().chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                out.push(' ');
            }
            in_whitespace = true;
        } else {
            out.push(ch);
            in_whitespace = false;
        }
    }
    out
}

/// Check if the text only contains backslash-escaped `open`/`close`
/// characters or properly paired ones.
pub fn is_paired(text: &str, open: char, close: char) -> bool {
    let mut count = 0usize;
    let mut escape = false;
    for c in text.chars() {
        if escape {
            escape = false;
        } else if c == '\\' {
            escape = true;
        } else if c == open {
            count += 1;
        } else if c == close {
            if count == 0 {
                return false;
            }
            count -= 1;
        }
    }
    count == 0
}

/// Outcome of [`find_next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindResult {
    /// A target character was found at the given byte index.
    Found(usize),
    /// A disallowed character was found first.
    Forbidden(usize),
    /// Neither was found before `end`.
    NotFound,
}

/// Find the next unescaped occurrence of any character in `targets`,
/// honoring backslash escapes. Characters in `disallowed` abort the search.
/// All target characters are ASCII so the scan can proceed bytewise.
pub fn find_next(
    text: &str,
    targets: &str,
    start: usize,
    end: Option<usize>,
    disallowed: &str,
) -> FindResult {
    let bytes = text.as_bytes();
    let end = end.unwrap_or(bytes.len());
    let mut i = start;
    let mut escaped = false;
    while i < end {
        let c = bytes[i];
        if escaped {
            escaped = false;
        } else if c.is_ascii() && targets.contains(c as char) {
            return FindResult::Found(i);
        } else if c.is_ascii() && disallowed.contains(c as char) {
            return FindResult::Forbidden(i);
        } else if c == b'\\' {
            escaped = true;
        }
        i += 1;
    }
    FindResult::NotFound
}

/// Split the given text at the first run of spaces or tabs, returning
/// `(start, delimiter, remaining)`. If no spaces are found the latter two
/// are empty.
pub fn partition_by_spaces(text: &str) -> (&str, &str, &str) {
    let mut start = None;
    for (i, c) in text.char_indices() {
        match (c == ' ' || c == '\t', start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => return (&text[..s], &text[s..i], &text[i..]),
            _ => {}
        }
    }
    match start {
        Some(s) => (&text[..s], &text[s..], ""),
        None => (text, "", ""),
    }
}

/// Expand tabs to the next 4-column stop. Line breaks reset the column.
pub fn expand_tabs(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut col = 0usize;
    for ch in line.chars() {
        match ch {
            '\t' => {
                let pad = 4 - col % 4;
                for _ in 0..pad {
                    out.push(' ');
                }
                col += pad;
            }
            '\n' | '\r' => {
                out.push(ch);
                col = 0;
            }
            _ => {
                out.push(ch);
                col += 1;
            }
        }
    }
    out
}

/// Remove backslashes that escape ASCII punctuation, leaving the escaped
/// character itself.
pub fn strip_backslash(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some(&next) if next.is_ascii_punctuation() => {
                    out.push(next);
                    chars.next();
                }
                _ => out.push(c),
            }
        } else {
            out.push(c);
        }
    }
    out
}

lazy_static! {
    /// The commonly used named character references. Numeric references are
    /// decoded in full; names outside this table stay literal text.
    static ref NAMED_ENTITIES: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        for (name, value) in [
            ("amp", "&"),
            ("lt", "<"),
            ("gt", ">"),
            ("quot", "\""),
            ("apos", "'"),
            ("nbsp", "\u{a0}"),
            ("copy", "\u{a9}"),
            ("reg", "\u{ae}"),
            ("trade", "\u{2122}"),
            ("hellip", "\u{2026}"),
            ("mdash", "\u{2014}"),
            ("ndash", "\u{2013}"),
            ("lsquo", "\u{2018}"),
            ("rsquo", "\u{2019}"),
            ("ldquo", "\u{201c}"),
            ("rdquo", "\u{201d}"),
            ("laquo", "\u{ab}"),
            ("raquo", "\u{bb}"),
            ("times", "\u{d7}"),
            ("divide", "\u{f7}"),
            ("plusmn", "\u{b1}"),
            ("frac12", "\u{bd}"),
            ("frac14", "\u{bc}"),
            ("frac34", "\u{be}"),
            ("sup1", "\u{b9}"),
            ("sup2", "\u{b2}"),
            ("sup3", "\u{b3}"),
            ("micro", "\u{b5}"),
            ("para", "\u{b6}"),
            ("sect", "\u{a7}"),
            ("deg", "\u{b0}"),
            ("middot", "\u{b7}"),
            ("bull", "\u{2022}"),
            ("dagger", "\u{2020}"),
            ("Dagger", "\u{2021}"),
            ("permil", "\u{2030}"),
            ("prime", "\u{2032}"),
            ("Prime", "\u{2033}"),
            ("larr", "\u{2190}"),
            ("uarr", "\u{2191}"),
            ("rarr", "\u{2192}"),
            ("darr", "\u{2193}"),
            ("harr", "\u{2194}"),
            ("infin", "\u{221e}"),
            ("ne", "\u{2260}"),
            ("le", "\u{2264}"),
            ("ge", "\u{2265}"),
            ("minus", "\u{2212}"),
            ("radic", "\u{221a}"),
            ("sim", "\u{223c}"),
            ("asymp", "\u{2248}"),
            ("equiv", "\u{2261}"),
            ("oplus", "\u{2295}"),
            ("otimes", "\u{2297}"),
            ("perp", "\u{22a5}"),
            ("sdot", "\u{22c5}"),
            ("cent", "\u{a2}"),
            ("pound", "\u{a3}"),
            ("yen", "\u{a5}"),
            ("euro", "\u{20ac}"),
            ("szlig", "\u{df}"),
            ("agrave", "\u{e0}"),
            ("aacute", "\u{e1}"),
            ("auml", "\u{e4}"),
            ("ccedil", "\u{e7}"),
            ("egrave", "\u{e8}"),
            ("eacute", "\u{e9}"),
            ("euml", "\u{eb}"),
            ("iacute", "\u{ed}"),
            ("iuml", "\u{ef}"),
            ("ntilde", "\u{f1}"),
            ("oacute", "\u{f3}"),
            ("ouml", "\u{f6}"),
            ("uacute", "\u{fa}"),
            ("uuml", "\u{fc}"),
        ] {
            m.insert(name, value);
        }
        m
    };
}

/// Try to decode a character reference starting at `start` (which must point
/// at `&`). Returns the decoded text and the byte index past the `;`.
pub fn decode_entity_at(text: &str, start: usize) -> Option<(String, usize)> {
    let rest = &text[start..];
    debug_assert!(rest.starts_with('&'));
    let body = &rest[1..];
    let semi = body.find(';')?;
    let name = &body[..semi];
    if name.is_empty() || semi > 32 {
        return None;
    }
    let end = start + 1 + semi + 1;
    if let Some(digits) = name.strip_prefix('#') {
        let (digits, radix) = match digits
            .strip_prefix('x')
            .or_else(|| digits.strip_prefix('X'))
        {
            Some(hex) => (hex, 16),
            None => (digits, 10),
        };
        if digits.is_empty() || digits.len() > 7 {
            return None;
        }
        if !digits.chars().all(|c| c.is_digit(radix)) {
            return None;
        }
        let code = u32::from_str_radix(digits, radix).unwrap_or(0);
        let ch = match code {
            0 => '\u{fffd}',
            c => char::from_u32(c).unwrap_or('\u{fffd}'),
        };
        return Some((ch.to_string(), end));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    NAMED_ENTITIES
        .get(name)
        .map(|value| (value.to_string(), end))
}

/// Decode the character references the engine understands, leaving any
/// unrecognized ones untouched.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    while i < text.len() {
        if text.as_bytes()[i] == b'&' {
            if let Some((decoded, end)) = decode_entity_at(text, i) {
                out.push_str(&decoded);
                i = end;
                continue;
            }
        }
        let ch = text[i..].chars().next().expect("char boundary");
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}
