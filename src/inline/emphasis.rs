//! The delimiter algorithm: emphasis, strong emphasis, links and images.
//!
//! A single left-to-right scan deposits delimiter runs of `*`/`_` and the
//! brackets `[`/`![`, skipping backslash escapes and code spans. Every `]`
//! triggers the link/image lookup; the remaining delimiters are paired by
//! `process_emphasis` using the flanking and mod-3 rules.

use crate::ast::LinkRefDefs;
use crate::block::link_ref_def;
use crate::helpers::{is_paired, normalize_label, strip_backslash};
use crate::inline::patterns;
use crate::inline::scan::code_span_at;
use crate::inline::{InlineMatch, LinkLike, MatchPayload};
use unicase::UniCase;
use unicode_categories::UnicodeCategories;

/// Unicode punctuation in the CommonMark sense: general categories P and S.
fn is_punctuation(c: char) -> bool {
    c.is_punctuation() || c.is_symbol()
}

#[derive(Debug, Clone)]
struct Delimiter {
    start: usize,
    end: usize,
    content: String,
    active: bool,
    can_open: bool,
    can_close: bool,
    is_bracket: bool,
}

impl Delimiter {
    fn bracket(start: usize, end: usize, content: &str) -> Self {
        Delimiter {
            start,
            end,
            content: content.to_string(),
            active: true,
            can_open: false,
            can_close: false,
            is_bracket: true,
        }
    }

    fn run(start: usize, end: usize, text: &str) -> Self {
        let mut delimiter = Delimiter {
            start,
            end,
            content: text[start..end].to_string(),
            active: true,
            can_open: false,
            can_close: false,
            is_bracket: false,
        };
        let marker = delimiter.content.chars().next().expect("non-empty run");
        let left = delimiter.is_left_flanking(text);
        let right = delimiter.is_right_flanking(text);
        if marker == '*' {
            delimiter.can_open = left;
            delimiter.can_close = right;
        } else {
            // Intra-word emphasis is forbidden for underscores.
            delimiter.can_open = left && (!right || delimiter.preceded_by_punct(text));
            delimiter.can_close = right && (!left || delimiter.followed_by_punct(text));
        }
        delimiter
    }

    fn prev_char(&self, text: &str) -> Option<char> {
        text[..self.start].chars().next_back()
    }

    fn next_char(&self, text: &str) -> Option<char> {
        text[self.end..].chars().next()
    }

    fn preceded_by_punct(&self, text: &str) -> bool {
        self.prev_char(text).map_or(false, is_punctuation)
    }

    fn followed_by_punct(&self, text: &str) -> bool {
        self.next_char(text).map_or(false, is_punctuation)
    }

    fn is_left_flanking(&self, text: &str) -> bool {
        let next = self.next_char(text);
        let prev = self.prev_char(text);
        (next.map_or(false, |c| !c.is_whitespace()))
            && (!self.followed_by_punct(text)
                || self.start == 0
                || self.preceded_by_punct(text)
                || prev.map_or(false, |c| c.is_whitespace()))
    }

    fn is_right_flanking(&self, text: &str) -> bool {
        let prev = self.prev_char(text);
        let next = self.next_char(text);
        (prev.map_or(false, |c| !c.is_whitespace()))
            && (!self.preceded_by_punct(text)
                || self.end == text.len()
                || self.followed_by_punct(text)
                || next.map_or(false, |c| c.is_whitespace()))
    }

    /// The mod-3 closure rule: runs whose combined length is a multiple of
    /// three cannot pair unless both lengths already are.
    fn closed_by(&self, other: &Delimiter) -> bool {
        !(self.content.chars().next() != other.content.chars().next()
            || ((self.can_open && self.can_close) || (other.can_open && other.can_close))
                && (self.content.len() + other.content.len()) % 3 == 0
                && !(self.content.len() % 3 == 0 && other.content.len() % 3 == 0))
    }

    /// Use up `n` characters from this run; true means the run is spent.
    fn shrink(&mut self, n: usize, from_left: bool) -> bool {
        if self.content.len() <= n {
            return true;
        }
        if from_left {
            self.start += n;
        } else {
            self.end -= n;
        }
        self.content = self.content[n..].to_string();
        false
    }
}

/// Find links, images and emphasis in the text.
pub fn find_links_or_emphs(text: &str, defs: &LinkRefDefs) -> Vec<InlineMatch> {
    let bytes = text.as_bytes();
    let mut delimiters: Vec<Delimiter> = Vec::new();
    let mut matches: Vec<InlineMatch> = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        if c == b'\\' {
            i += 1;
            if let Some(ch) = text[i..].chars().next() {
                i += ch.len_utf8();
            }
        } else if c == b'`' && (i == 0 || bytes[i - 1] != b'`') {
            match code_span_at(text, i) {
                Some((end, _, _)) => i = end,
                None => i += 1,
            }
        } else if c == b']' {
            match look_for_image_or_link(text, &mut delimiters, i, defs, &mut matches) {
                Some(found) => {
                    i = found.end;
                    matches.push(found);
                }
                None => i += 1,
            }
        } else if c == b'!' && bytes.get(i + 1) == Some(&b'[') {
            delimiters.push(Delimiter::bracket(i, i + 2, "!["));
            i += 2;
        } else if c == b'[' {
            delimiters.push(Delimiter::bracket(i, i + 1, "["));
            i += 1;
        } else if c == b'*' || c == b'_' {
            let mut end = i;
            while bytes.get(end) == Some(&c) {
                end += 1;
            }
            delimiters.push(Delimiter::run(i, end, text));
            i = end;
        } else {
            i += text[i..].chars().next().map_or(1, |ch| ch.len_utf8());
        }
    }
    process_emphasis(&mut delimiters, None, &mut matches);
    matches
}

/// Pair a `]` with the nearest bracket opener and try the inline and
/// reference link forms. On success the enclosed delimiters are resolved
/// and, for links, earlier `[` openers are deactivated so links do not
/// nest.
fn look_for_image_or_link(
    text: &str,
    delimiters: &mut Vec<Delimiter>,
    close: usize,
    defs: &LinkRefDefs,
    matches: &mut Vec<InlineMatch>,
) -> Option<InlineMatch> {
    let opener = (0..delimiters.len()).rev().find(|&i| delimiters[i].is_bracket)?;
    let (label_start, label_end) = (delimiters[opener].end, close);
    let is_image = delimiters[opener].content == "![";

    let resolved = if delimiters[opener].active && is_paired(&text[label_start..label_end], '[', ']')
    {
        expect_inline_link(text, close + 1).or_else(|| {
            expect_reference_link(text, close + 1, &text[label_start..label_end], defs)
        })
    } else {
        None
    };

    match resolved {
        Some((dest, title, end)) => {
            let found = InlineMatch {
                start: delimiters[opener].start,
                end,
                inner_start: label_start,
                inner_end: label_end,
                parse_children: true,
                payload: MatchPayload::LinkLike(if is_image {
                    LinkLike::Image { dest, title }
                } else {
                    LinkLike::Link { dest, title }
                }),
            };
            process_emphasis(delimiters, Some(opener), matches);
            if !is_image {
                for delimiter in delimiters[..opener].iter_mut() {
                    if delimiter.is_bracket && delimiter.content == "[" {
                        delimiter.active = false;
                    }
                }
            }
            delimiters.remove(opener);
            Some(found)
        }
        None => {
            delimiters.remove(opener);
            None
        }
    }
}

/// `(dest "title")` directly after the closing bracket.
fn expect_inline_link(text: &str, start: usize) -> Option<(String, Option<String>, usize)> {
    if text.as_bytes().get(start) != Some(&b'(') {
        return None;
    }
    let mut i = skip_whitespace(text, start + 1);
    let (dest, dest_end) = if let Some(m) = patterns::LINK_DEST_ANGLE.find(&text[i..]) {
        let raw = m.as_str();
        let inner = &raw[1..raw.len() - 1];
        (strip_backslash(inner), i + m.end())
    } else {
        if text.as_bytes().get(i) == Some(&b'<') {
            return None;
        }
        let (raw, end) = scan_bare_dest(text, i)?;
        (strip_backslash(raw), end)
    };
    i = dest_end;

    let mut title = None;
    let after_ws = skip_whitespace(text, i);
    let mut closing_at = after_ws;
    if after_ws > i {
        if let Some((parsed, title_end)) = link_ref_def::parse_link_title(text, after_ws) {
            title = Some(parsed);
            closing_at = skip_whitespace(text, title_end);
        }
    }
    if text.as_bytes().get(closing_at) != Some(&b')') {
        return None;
    }
    Some((dest, title, closing_at + 1))
}

/// A bare destination: no whitespace, parentheses balanced. May be empty.
fn scan_bare_dest(text: &str, start: usize) -> Option<(&str, usize)> {
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
    if open != 0 {
        return None;
    }
    Some((&text[start..i], i))
}

fn skip_whitespace(text: &str, start: usize) -> usize {
    let mut i = start;
    while let Some(ch) = text[i..].chars().next() {
        if !ch.is_whitespace() {
            break;
        }
        i += ch.len_utf8();
    }
    i
}

/// Full, collapsed or shortcut reference links, resolved against the
/// document's definitions.
fn expect_reference_link(
    text: &str,
    start: usize,
    link_text: &str,
    defs: &LinkRefDefs,
) -> Option<(String, Option<String>, usize)> {
    let explicit = patterns::OPTIONAL_LABEL.find(&text[start..]);
    let mut label = link_text;
    if let Some(m) = &explicit {
        let inner = &m.as_str()[1..m.as_str().len() - 1];
        if !inner.is_empty() {
            label = inner;
        }
    }
    let def = defs.get(&UniCase::new(normalize_label(label)))?;
    let end = explicit.map_or(start, |m| start + m.end());
    Some((def.dest.clone(), def.title.clone(), end))
}

fn next_closer(delimiters: &[Delimiter], bound: Option<usize>) -> Option<usize> {
    let from = bound.map_or(0, |b| b + 1);
    (from..delimiters.len()).find(|&i| delimiters[i].can_close)
}

fn nearest_opener(delimiters: &[Delimiter], higher: usize, lower: Option<usize>) -> Option<usize> {
    let from = lower.map_or(0, |l| l + 1);
    (from..higher)
        .rev()
        .find(|&i| delimiters[i].can_open && delimiters[i].closed_by(&delimiters[higher]))
}

/// Pair closers with openers from the given stack bottom upward, emitting
/// emphasis and strong-emphasis matches and consuming the paired runs.
fn process_emphasis(
    delimiters: &mut Vec<Delimiter>,
    stack_bottom: Option<usize>,
    matches: &mut Vec<InlineMatch>,
) {
    let mut star_bottom = stack_bottom;
    let mut underscore_bottom = stack_bottom;
    let mut cur = next_closer(delimiters, stack_bottom);
    while let Some(closer) = cur {
        let marker = delimiters[closer].content.chars().next().expect("run");
        let bottom = if marker == '*' {
            star_bottom
        } else {
            underscore_bottom
        };
        match nearest_opener(delimiters, closer, bottom) {
            Some(opener) => {
                let n = if delimiters[opener].content.len() >= 2
                    && delimiters[closer].content.len() >= 2
                {
                    2
                } else {
                    1
                };
                let inner_start = delimiters[opener].end;
                let inner_end = delimiters[closer].start;
                matches.push(InlineMatch {
                    start: inner_start - n,
                    end: inner_end + n,
                    inner_start,
                    inner_end,
                    parse_children: true,
                    payload: MatchPayload::LinkLike(if n == 2 {
                        LinkLike::StrongEmphasis
                    } else {
                        LinkLike::Emphasis
                    }),
                });
                delimiters.drain(opener + 1..closer);
                let mut at = opener + 1;
                if delimiters[opener].shrink(n, false) {
                    delimiters.remove(opener);
                    at -= 1;
                }
                if delimiters[at].shrink(n, true) {
                    delimiters.remove(at);
                }
                cur = if at > 0 { Some(at - 1) } else { None };
            }
            None => {
                let bottom = if closer > 1 { Some(closer - 1) } else { None };
                if marker == '*' {
                    star_bottom = bottom;
                } else {
                    underscore_bottom = bottom;
                }
                if !delimiters[closer].can_open {
                    delimiters.remove(closer);
                }
                cur = Some(closer);
            }
        }
        cur = next_closer(delimiters, cur);
    }
    let lower = stack_bottom.map_or(0, |b| b + 1);
    delimiters.truncate(lower.min(delimiters.len()));
}
