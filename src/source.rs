//! Line/column-tracked view over the input with a stack of container
//! prefixes.
//!
//! The block scanner peels container prefixes (`> `, list-item indentation)
//! off each line before examining it. A prefix that fails to match signals
//! that the container is closing, subject to the lazy-continuation rules
//! implemented by the paragraph element.

use crate::helpers::expand_tabs;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use unicode_segmentation::UnicodeSegmentation;

/// A line/column/offset triple for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

/// Metadata of the list a frame belongs to, consulted when matching
/// sibling list items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListMeta {
    /// The marker text of the first item (`-`, `*`, `+`, or e.g. `3.`).
    pub bullet: String,
    pub ordered: bool,
    pub start: u32,
}

/// The container kinds that appear on the frame stack.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameKind {
    Document,
    Quote,
    List(ListMeta),
    ListItem,
}

/// A container prefix matcher. List items match their marker on the first
/// line and plain indentation afterwards; other containers use the same
/// pattern on every line.
#[derive(Debug, Clone)]
pub struct Prefix {
    first: String,
    rest: Option<String>,
    on_rest: bool,
}

impl Prefix {
    pub fn empty() -> Self {
        Self::fixed("")
    }

    pub fn fixed(pattern: &str) -> Self {
        Prefix {
            first: pattern.to_string(),
            rest: None,
            on_rest: false,
        }
    }

    pub fn with_continuation(first: String, rest: String) -> Self {
        Prefix {
            first,
            rest: Some(rest),
            on_rest: false,
        }
    }

    fn active(&self) -> &str {
        if self.on_rest {
            self.rest.as_deref().unwrap_or(&self.first)
        } else {
            &self.first
        }
    }
}

/// One open container on the stack.
#[derive(Debug, Clone)]
pub struct Frame {
    pub kind: FrameKind,
    pub prefix: Prefix,
}

impl Frame {
    pub fn new(kind: FrameKind, prefix: Prefix) -> Self {
        Frame { kind, prefix }
    }
}

/// A successful anchored match, with absolute byte spans into the buffer.
#[derive(Debug, Clone)]
pub struct ScanMatch {
    pub start: usize,
    pub end: usize,
    text: String,
    groups: Vec<Option<(usize, usize, String)>>,
}

impl ScanMatch {
    fn from_captures(caps: &regex::Captures<'_>, base: usize) -> Self {
        let whole = caps.get(0).expect("group 0 always present");
        ScanMatch {
            start: base + whole.start(),
            end: base + whole.end(),
            text: whole.as_str().to_string(),
            groups: (1..caps.len())
                .map(|i| {
                    caps.get(i).map(|m| {
                        (base + m.start(), base + m.end(), m.as_str().to_string())
                    })
                })
                .collect(),
        }
    }

    /// Group 0 is the whole match; further groups may be absent.
    pub fn group(&self, i: usize) -> Option<&str> {
        if i == 0 {
            return Some(&self.text);
        }
        self.groups
            .get(i - 1)
            .and_then(|g| g.as_ref())
            .map(|g| g.2.as_str())
    }

    pub fn span(&self, i: usize) -> Option<(usize, usize)> {
        if i == 0 {
            return Some((self.start, self.end));
        }
        self.groups
            .get(i - 1)
            .and_then(|g| g.as_ref())
            .map(|g| (g.0, g.1))
    }
}

lazy_static! {
    static ref LINE_RE: Regex = Regex::new(r"\A[^\n]*\n?").expect("line regex");
}

/// Wrapper over the content to be parsed.
pub struct Source {
    buffer: String,
    pub pos: usize,
    anchor: usize,
    frames: Vec<Frame>,
    last_match: Option<ScanMatch>,
    prefix_cache: HashMap<String, Regex>,
}

impl Source {
    pub fn new(text: &str) -> Self {
        Source {
            buffer: text.replace("\r\n", "\n"),
            pos: 0,
            anchor: 0,
            frames: vec![Frame::new(FrameKind::Document, Prefix::empty())],
            last_match: None,
            prefix_cache: HashMap::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn exhausted(&self) -> bool {
        self.pos >= self.buffer.len()
    }

    /// The innermost open container.
    pub fn state(&self) -> &FrameKind {
        &self.frames.last().expect("frame stack never empty").kind
    }

    /// Metadata of the innermost container when it is a list.
    pub fn list_meta(&self) -> Option<&ListMeta> {
        match self.state() {
            FrameKind::List(meta) => Some(meta),
            _ => None,
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn push_frame(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn pop_frame(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    /// The assembled prefix of each line under the current container stack.
    pub fn prefix(&self) -> String {
        self.frames.iter().map(|f| f.prefix.active()).collect()
    }

    /// The prefix required by an indented code block: the usual stack
    /// prefix plus four spaces. Directly inside a quote the optional space
    /// after `>` becomes mandatory, so five spaces are needed in total.
    pub fn code_block_prefix(&self) -> String {
        let mut prefix = self.prefix();
        if matches!(self.state(), FrameKind::Quote) && prefix.ends_with('?') {
            prefix.pop();
        }
        prefix.push_str(" {4}");
        prefix
    }

    fn compiled(&mut self, pattern: &str) -> Regex {
        if let Some(re) = self.prefix_cache.get(pattern) {
            return re.clone();
        }
        let re = Regex::new(&format!(r"\A(?:{})", pattern)).expect("prefix regex");
        self.prefix_cache.insert(pattern.to_string(), re.clone());
        re
    }

    /// Check if the line starts with the given prefix and return the byte
    /// length of the matched prefix in the original (untabified) line.
    /// Tab stops are computed at 4 columns; a blank line matches any
    /// all-space prefix.
    pub fn match_prefix(&mut self, prefix: &str, line: &str) -> Option<usize> {
        let re = self.compiled(prefix);
        let expanded = expand_tabs(line);
        let end = match re.find(&expanded) {
            Some(m) => m.end(),
            None => {
                let padded = expanded.replace('\n', &format!("{}\n", " ".repeat(99)));
                if re.is_match(&padded) {
                    return Some(line.len().saturating_sub(1));
                }
                return None;
            }
        };
        if end == 0 {
            return Some(0);
        }
        let mut i = 0;
        for (idx, ch) in line.char_indices() {
            i = idx + ch.len_utf8();
            if expand_tabs(&line[..i]).len() >= end {
                return Some(i);
            }
        }
        None
    }

    /// Anchored end of a prefix pattern matched at the start of `haystack`.
    pub(crate) fn prefix_find(&mut self, pattern: &str, haystack: &str) -> Option<usize> {
        let re = self.compiled(pattern);
        re.find(haystack).map(|m| m.end())
    }

    /// End of the assembled container prefix on an already tab-expanded
    /// line, or zero when it does not match.
    pub(crate) fn prefix_end_expanded(&mut self, expanded_line: &str) -> usize {
        let prefix = self.prefix();
        self.prefix_find(&prefix, expanded_line).unwrap_or(0)
    }

    /// Jump to an absolute offset, dropping any pending match.
    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos;
        self.last_match = None;
    }

    /// Test the given `\A`-anchored expression at the current position with
    /// the container prefix stripped. Returns and remembers the match.
    pub fn expect_re(&mut self, re: &Regex) -> Option<ScanMatch> {
        let line = self.current_line()?;
        let prefix = self.prefix();
        let prefix_len = self.match_prefix(&prefix, &line)?;
        let start = self.pos + prefix_len;
        let caps = re.captures(&self.buffer[start..])?;
        let matched = ScanMatch::from_captures(&caps, start);
        self.last_match = Some(matched.clone());
        Some(matched)
    }

    /// The next line with the container prefix stripped, or None when the
    /// prefix is not matched. The returned text still includes its
    /// terminator.
    pub fn next_line(&mut self) -> Option<String> {
        let matched = self.expect_re(&LINE_RE)?;
        Some(matched.group(0).expect("group 0").to_string())
    }

    /// The whole current line, prefix included.
    pub fn current_line(&self) -> Option<String> {
        if self.exhausted() {
            return None;
        }
        let m = LINE_RE.find(&self.buffer[self.pos..])?;
        Some(m.as_str().to_string())
    }

    /// Consume the body of the last match; `pos` moves past it. Consuming
    /// a full line switches list-item prefixes to their continuation form.
    pub fn consume(&mut self) {
        if let Some(matched) = self.last_match.take() {
            self.pos = matched.end;
            if matched.text.ends_with('\n') {
                for frame in &mut self.frames {
                    if frame.prefix.rest.is_some() {
                        frame.prefix.on_rest = true;
                    }
                }
            }
        }
    }

    /// Consume the whole current line regardless of prefixes.
    pub fn consume_line(&mut self) {
        if let Some(line) = self.current_line() {
            let ends_newline = line.ends_with('\n');
            self.pos += line.len();
            self.last_match = None;
            if ends_newline {
                for frame in &mut self.frames {
                    if frame.prefix.rest.is_some() {
                        frame.prefix.on_rest = true;
                    }
                }
            }
        }
    }

    /// Pin the current parsing position.
    pub fn set_anchor(&mut self) {
        self.anchor = self.pos;
    }

    /// Reset the position to the last anchor.
    pub fn reset(&mut self) {
        self.pos = self.anchor;
    }

    /// The line/column of an absolute byte offset, counted in graphemes so
    /// multi-byte characters report sensible columns.
    pub fn position_of(&self, offset: usize) -> Position {
        let mut position = Position {
            line: 1,
            column: 1,
            offset,
        };
        for (idx, grapheme) in self.buffer.grapheme_indices(true) {
            if idx >= offset {
                break;
            }
            if grapheme == "\n" {
                position.line += 1;
                position.column = 1;
            } else {
                position.column += 1;
            }
        }
        position
    }

    pub fn position(&self) -> Position {
        self.position_of(self.pos)
    }
}
