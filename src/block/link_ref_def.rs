//! Link reference definitions: `[label]: destination "title"`.
//!
//! A definition registers with the document's label map and produces no
//! rendered output. The first definition of a label wins. A definition
//! whose final line lacks a terminating newline is not a definition; the
//! lines stay paragraph content.

use crate::ast::{Block, LinkRef};
use crate::block::DocState;
use crate::helpers::{normalize_label, strip_backslash};
use crate::source::Source;
use lazy_static::lazy_static;
use regex::Regex;
use unicase::UniCase;

lazy_static! {
    static ref DEF_START: Regex = Regex::new(r"\A {0,3}\[").expect("def start regex");
}

pub fn try_parse(source: &mut Source, doc: &mut DocState) -> Option<Block> {
    let matched = source.expect_re(&DEF_START)?;
    let bracket = matched.span(0)?.1 - 1;
    let (label, dest, title, end) = {
        let text = source.text();
        parse_def(text, bracket)?
    };
    let normalized = normalize_label(&label);
    let key = UniCase::new(normalized.clone());
    doc.link_ref_defs.entry(key).or_insert_with(|| LinkRef {
        label: normalized,
        dest: dest.clone(),
        title: title.clone(),
    });
    source.set_pos(end);
    Some(Block::LinkRefDef { label, dest, title })
}

type Def = (String, String, Option<String>, usize);

fn parse_def(text: &str, start: usize) -> Option<Def> {
    let (label, label_end) = parse_link_label(text, start)?;
    if text.as_bytes().get(label_end) != Some(&b':') {
        return None;
    }
    let i = skip_separator(text, label_end + 1);
    let (dest, dest_end) = parse_link_dest(text, i)?;

    let mut title: Option<String> = None;
    let mut title_span = (dest_end, dest_end);
    let j = skip_separator(text, dest_end);
    if j > dest_end {
        if let Some((parsed, title_end)) = parse_link_title(text, j) {
            title = Some(parsed);
            title_span = (j, title_end);
        }
    }

    let after = dest_end.max(title_span.1);
    let line_end = text[after..].find('\n').map(|k| after + k)?;
    if text[after..line_end].trim().is_empty() {
        return Some((label, dest, title, line_end + 1));
    }
    if title.is_some() && text[dest_end..title_span.0].contains('\n') {
        // Trailing garbage after a next-line title: keep the definition but
        // drop the title, ending at the destination's line.
        let dest_line_end = text[dest_end..].find('\n').map(|k| dest_end + k)?;
        return Some((label, dest, None, dest_line_end + 1));
    }
    None
}

/// The inner text of a `[label]` and the index past the closing bracket.
/// Labels may not contain unescaped brackets and need one non-space
/// character.
pub fn parse_link_label(text: &str, start: usize) -> Option<(String, usize)> {
    debug_assert_eq!(text.as_bytes().get(start), Some(&b'['));
    match crate::helpers::find_next(text, "]", start + 1, None, "[") {
        crate::helpers::FindResult::Found(close) => {
            let content = &text[start + 1..close];
            if content.trim().is_empty() {
                return None;
            }
            Some((content.to_string(), close + 1))
        }
        _ => None,
    }
}

/// Skip spaces and tabs around at most one newline.
fn skip_separator(text: &str, start: usize) -> usize {
    let bytes = text.as_bytes();
    let mut i = start;
    let mut seen_newline = false;
    while i < bytes.len() {
        match bytes[i] {
            b' ' | b'\t' => i += 1,
            b'\n' if !seen_newline => {
                seen_newline = true;
                i += 1;
            }
            _ => break,
        }
    }
    i
}

/// A link destination: either `<...>` or a run without whitespace with
/// balanced parentheses. Backslash escapes are resolved.
pub fn parse_link_dest(text: &str, start: usize) -> Option<(String, usize)> {
    if text.as_bytes().get(start) == Some(&b'<') {
        let mut i = start + 1;
        let mut escaped = false;
        while i < text.len() {
            let ch = text[i..].chars().next()?;
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '\n' || ch == '<' {
                return None;
            } else if ch == '>' {
                return Some((strip_backslash(&text[start + 1..i]), i + 1));
            }
            i += ch.len_utf8();
        }
        None
    } else {
        let mut i = start;
        let mut open = 0u32;
        let mut escaped = false;
        while i < text.len() {
            let ch = text[i..].chars().next()?;
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '(' {
                open += 1;
            } else if ch.is_whitespace() {
                break;
            } else if ch == ')' {
                if open == 0 {
                    break;
                }
                open -= 1;
            }
            i += ch.len_utf8();
        }
        if open != 0 || i == start {
            return None;
        }
        Some((strip_backslash(&text[start..i]), i))
    }
}

/// A link title in double quotes, single quotes or parentheses. The
/// parenthesized form forbids an unescaped opening parenthesis inside.
pub fn parse_link_title(text: &str, start: usize) -> Option<(String, usize)> {
    let open = *text.as_bytes().get(start)?;
    let close = match open {
        b'"' => '"',
        b'\'' => '\'',
        b'(' => ')',
        _ => return None,
    };
    let mut i = start + 1;
    let mut escaped = false;
    while i < text.len() {
        let ch = text[i..].chars().next()?;
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if open == b'(' && ch == '(' {
            return None;
        } else if ch == close {
            return Some((strip_backslash(&text[start + 1..i]), i + 1));
        }
        i += ch.len_utf8();
    }
    None
}
