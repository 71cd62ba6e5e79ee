//! Container blocks: quotes, lists and list items.
//!
//! Containers push a prefix frame onto the source and recurse into the
//! scanner; the frame's prefix decides which lines still belong to them.

use crate::ast::Block;
use crate::block::{leaf, DocState, Parser};
use crate::helpers::{expand_tabs, partition_by_spaces};
use crate::source::{Frame, FrameKind, ListMeta, Prefix, ScanMatch, Source};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref QUOTE_RE: Regex = Regex::new(r"\A {0,3}>").expect("quote regex");
    static ref LIST_RE: Regex =
        Regex::new(r"\A {0,3}(\d{1,9}[.)]|[*+-])[ \t\n\r]").expect("list regex");
}

const QUOTE_PREFIX: &str = r" {0,3}>[ \t]?";

// ---------------------------------------------------------------------------
// Quote
// ---------------------------------------------------------------------------

pub fn match_quote(source: &mut Source) -> Option<ScanMatch> {
    source.expect_re(&QUOTE_RE)
}

pub fn try_parse_quote(parser: &Parser, source: &mut Source, doc: &mut DocState) -> Option<Block> {
    match_quote(source)?;
    source.push_frame(Frame::new(FrameKind::Quote, Prefix::fixed(QUOTE_PREFIX)));
    let children = parser.parse_blocks(source, doc);
    source.pop_frame();
    Some(Block::Quote { children })
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ListSeed {
    pub bullet: String,
    pub ordered: bool,
    pub start: u32,
}

pub fn match_list(source: &mut Source) -> Option<ListSeed> {
    let matched = source.expect_re(&LIST_RE)?;
    let bullet = matched.group(1)?.to_string();
    let digits = &bullet[..bullet.len() - 1];
    let (ordered, start) = if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
        (true, digits.parse().unwrap_or(1))
    } else {
        (false, 1)
    };
    Some(ListSeed {
        bullet,
        ordered,
        start,
    })
}

pub fn try_parse_list(parser: &Parser, source: &mut Source, doc: &mut DocState) -> Option<Block> {
    let seed = match_list(source)?;
    let entry_pos = source.pos;
    let meta = ListMeta {
        bullet: seed.bullet.clone(),
        ordered: seed.ordered,
        start: seed.start,
    };
    source.push_frame(Frame::new(FrameKind::List(meta), Prefix::empty()));
    let mut children: Vec<Block> = Vec::new();
    let mut tight = true;
    let mut has_blank_line = false;
    while !source.exhausted() {
        if let Some(item_seed) = match_list_item(source) {
            children.push(parse_list_item(parser, source, doc, item_seed));
            source.set_anchor();
            if has_blank_line {
                tight = false;
            }
        } else if leaf::match_blank_line(source) {
            leaf::parse_blank_line(source);
            has_blank_line = true;
        } else {
            source.reset();
            break;
        }
    }
    source.pop_frame();
    // A marker line whose first item is rejected (say, a `***` run after a
    // `-` marker matched the pattern) is no list at all.
    if children.is_empty() {
        source.set_pos(entry_pos);
        return None;
    }
    // Blank lines inside any single item also make the list loose; blanks
    // before the first item and after the last do not count.
    tight = tight
        && !children.iter().any(|item| match item {
            Block::ListItem { children } => children
                .iter()
                .any(|child| matches!(child, Block::BlankLine { .. })),
            _ => false,
        });
    Some(Block::List {
        tight,
        ordered: seed.ordered,
        start: seed.start,
        bullet: seed.bullet,
        children,
    })
}

// ---------------------------------------------------------------------------
// List item
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ItemSeed {
    indent: usize,
    bullet: String,
    mid: usize,
}

/// Split a marker line into (indent, bullet, post-marker spacing, tail).
/// Spacing wider than four columns counts as one: the rest is content
/// indentation for a code block inside the item.
pub fn parse_leading(line: &str, prefix_pos: usize) -> (usize, String, usize, String) {
    let tail = &line[prefix_pos.min(line.len())..];
    let expanded = expand_tabs(tail);
    let stripped = expanded.trim_start();
    let indent = tail
        .chars()
        .count()
        .saturating_sub(stripped.chars().count());
    let (bullet, spaces, rest) = partition_by_spaces(stripped);
    let mut mid = spaces.chars().count();
    if mid > 4 {
        mid = 1;
    }
    (indent, bullet.to_string(), mid, rest.to_string())
}

pub fn match_list_item(source: &mut Source) -> Option<ItemSeed> {
    if leaf::match_thematic_break(source).is_some() {
        return None;
    }
    source.expect_re(&LIST_RE)?;
    let line = expand_tabs(&source.current_line()?);
    let prefix_pos = source.prefix_end_expanded(&line);
    let (indent, bullet, mid, _tail) = parse_leading(line.trim_end(), prefix_pos);
    let meta = source.list_meta()?;
    let digits = &bullet[..bullet.len() - 1];
    let digits_ok = !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit());
    if meta.ordered && !digits_ok {
        return None;
    }
    if bullet.chars().last() != meta.bullet.chars().last() {
        return None;
    }
    if !meta.ordered && bullet != meta.bullet {
        return None;
    }
    Some(ItemSeed {
        indent,
        bullet,
        mid,
    })
}

pub fn parse_list_item(
    parser: &Parser,
    source: &mut Source,
    doc: &mut DocState,
    seed: ItemSeed,
) -> Block {
    let first = format!(
        "{}{}{}",
        " ".repeat(seed.indent),
        regex::escape(&seed.bullet),
        " ".repeat(seed.mid)
    );
    let continuation = " ".repeat(
        seed.indent + seed.bullet.chars().count() + if seed.mid == 0 { 1 } else { seed.mid },
    );
    source.push_frame(Frame::new(
        FrameKind::ListItem,
        Prefix::with_continuation(first, continuation),
    ));

    // An item whose marker line is otherwise blank: a following blank line
    // (or nothing) means the item is empty.
    let starts_blank = source
        .next_line()
        .map_or(false, |line| line.trim().is_empty());
    if starts_blank {
        source.consume();
        let following = source.next_line();
        if following.map_or(true, |line| line.trim().is_empty()) {
            source.pop_frame();
            return Block::ListItem { children: vec![] };
        }
    }

    let mut children = parser.parse_blocks(source, doc);
    source.pop_frame();

    // A trailing blank line belongs between items, not inside this one.
    if matches!(children.last(), Some(Block::BlankLine { .. })) {
        if let Some(Block::BlankLine { anchor }) = children.pop() {
            if !children.is_empty() {
                source.set_pos(anchor);
            }
        }
    }
    Block::ListItem { children }
}
