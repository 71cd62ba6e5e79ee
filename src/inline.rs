//! The inline tokenizer.
//!
//! Phase A collects matches of every registered inline kind over the text;
//! overlaps are resolved by a pairwise relation with four outcomes. Phase B
//! (links and emphasis) contributes its matches through the `link_or_emph`
//! pseudo-kind in `emphasis`. Unmatched stretches become raw text, so the
//! tokenizer never fails.

pub mod emphasis;
pub mod patterns;
pub mod scan;

use crate::ast::{
    Block, CustomBlockChildren, CustomInline, Document, Inline, InlineContent, LinkRefDefs,
};
use crate::block::Parser;
use crate::registry::{InlineHandler, InlineRule};
use serde_json::{Map, Value};
use std::sync::Arc;

/// A span matched by an inline kind. The inner span bounds the content
/// that is re-tokenized when the kind parses children.
#[derive(Debug, Clone)]
pub struct InlineMatch {
    pub start: usize,
    pub end: usize,
    pub inner_start: usize,
    pub inner_end: usize,
    pub parse_children: bool,
    pub payload: MatchPayload,
}

#[derive(Debug, Clone)]
pub enum MatchPayload {
    Literal { text: String },
    CodeSpan { text: String },
    InlineHtml,
    AutoLink { dest: String, label: String },
    Entity,
    LineBreak { soft: bool },
    LinkLike(LinkLike),
    Custom { data: Map<String, Value> },
}

#[derive(Debug, Clone)]
pub enum LinkLike {
    Link { dest: String, title: Option<String> },
    Image { dest: String, title: Option<String> },
    Emphasis,
    StrongEmphasis,
}

#[derive(Clone)]
enum Builder {
    Builtin,
    Custom(Arc<dyn InlineRule>),
}

/// An intermediate token wrapping a match; contained tokens become its
/// children when the element is built.
struct Token {
    matched: InlineMatch,
    priority: u8,
    builder: Builder,
    children: Vec<Token>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Relation {
    Precede,
    Contain,
    Intersect,
    Shade,
}

impl Token {
    fn start(&self) -> usize {
        self.matched.start
    }

    fn end(&self) -> usize {
        self.matched.end
    }

    fn relation(&self, other: &Token) -> Relation {
        if self.end() <= other.start() {
            Relation::Precede
        } else if self.start() == other.start() && self.end() == other.end() {
            Relation::Shade
        } else if other.end() <= self.end() {
            Relation::Contain
        } else {
            Relation::Intersect
        }
    }

    /// Adopt a contained token. Only content inside the inner span is kept;
    /// a token landing in the delimiter region is dropped.
    fn append_child(&mut self, child: Token) {
        if !self.matched.parse_children {
            return;
        }
        if child.start() >= self.matched.inner_start && child.end() <= self.matched.inner_end {
            self.children.push(child);
        }
    }

    fn into_element(self, text: &str) -> Inline {
        let children = if self.matched.parse_children {
            let resolved = resolve_overlap(self.children);
            make_elements(
                resolved,
                text,
                self.matched.inner_start,
                self.matched.inner_end,
            )
        } else {
            Vec::new()
        };
        let span = &text[self.matched.start..self.matched.end];
        match &self.matched.payload {
            MatchPayload::Literal { text } => Inline::Literal { text: text.clone() },
            MatchPayload::CodeSpan { text } => Inline::CodeSpan { text: text.clone() },
            MatchPayload::InlineHtml => Inline::InlineHtml {
                text: span.to_string(),
            },
            MatchPayload::AutoLink { dest, label } => Inline::AutoLink {
                dest: dest.clone(),
                children: vec![Inline::RawText {
                    text: label.clone(),
                    escape: true,
                }],
            },
            MatchPayload::Entity => Inline::Entity {
                text: span.to_string(),
            },
            MatchPayload::LineBreak { soft } => Inline::LineBreak { soft: *soft },
            MatchPayload::LinkLike(link_like) => match link_like {
                LinkLike::Link { dest, title } => Inline::Link {
                    dest: dest.clone(),
                    title: title.clone(),
                    children,
                },
                LinkLike::Image { dest, title } => Inline::Image {
                    dest: dest.clone(),
                    title: title.clone(),
                    children,
                },
                LinkLike::Emphasis => Inline::Emphasis { children },
                LinkLike::StrongEmphasis => Inline::StrongEmphasis { children },
            },
            MatchPayload::Custom { data } => match &self.builder {
                Builder::Custom(rule) => rule.build(&self.matched, children),
                Builder::Builtin => Inline::Custom(CustomInline {
                    kind: "custom".to_string(),
                    data: data.clone(),
                    children,
                }),
            },
        }
    }
}

/// Resolve overlaps between tokens sorted by start position. PRECEDE keeps
/// both; CONTAIN nests; INTERSECT keeps the earlier token; SHADE (equal
/// spans) keeps the higher priority, ties falling to the earlier
/// declaration and registration.
fn resolve_overlap(tokens: Vec<Token>) -> Vec<Token> {
    let mut result: Vec<Token> = Vec::new();
    let mut iter = tokens.into_iter();
    let mut prev = match iter.next() {
        Some(first) => first,
        None => return result,
    };
    for cur in iter {
        match prev.relation(&cur) {
            Relation::Precede => {
                result.push(prev);
                prev = cur;
            }
            Relation::Contain => prev.append_child(cur),
            Relation::Shade => {
                if cur.priority > prev.priority {
                    prev = cur;
                }
            }
            Relation::Intersect => {}
        }
    }
    result.push(prev);
    result
}

/// Turn resolved tokens into elements, filling the holes between them with
/// raw text.
fn make_elements(tokens: Vec<Token>, text: &str, start: usize, end: usize) -> Vec<Inline> {
    let mut result = Vec::new();
    let mut prev_end = start;
    for token in tokens {
        if prev_end < token.start() {
            result.push(Inline::RawText {
                text: text[prev_end..token.start()].to_string(),
                escape: true,
            });
        }
        prev_end = token.end();
        result.push(token.into_element(text));
    }
    if prev_end < end {
        result.push(Inline::RawText {
            text: text[prev_end..end].to_string(),
            escape: true,
        });
    }
    result
}

/// Tokenize one inline body.
pub fn parse_inline(parser: &Parser, text: &str, defs: &LinkRefDefs) -> Vec<Inline> {
    let mut tokens: Vec<Token> = Vec::new();
    for entry in parser.registry.inline_scan_list() {
        let (matches, builder) = match &entry.handler {
            InlineHandler::Builtin(builtin) => {
                (scan::find_builtin(*builtin, text, defs), Builder::Builtin)
            }
            InlineHandler::Custom(rule) => (rule.find(text), Builder::Custom(rule.clone())),
            InlineHandler::Virtual => continue,
        };
        for matched in matches {
            tokens.push(Token {
                matched,
                priority: entry.spec.priority,
                builder: builder.clone(),
                children: Vec::new(),
            });
        }
    }
    tokens.sort_by_key(|t| t.start());
    let resolved = resolve_overlap(tokens);
    make_elements(resolved, text, 0, text.len())
}

/// Rewrite every raw inline body in the document into an element tree.
pub fn process_document(parser: &Parser, document: &mut Document) {
    let Document {
        children,
        link_ref_defs,
    } = document;
    process_blocks(parser, children, link_ref_defs);
}

fn process_blocks(parser: &Parser, blocks: &mut [Block], defs: &LinkRefDefs) {
    for block in blocks {
        match block {
            Block::Paragraph { body }
            | Block::Heading { body, .. }
            | Block::SetextHeading { body, .. } => finish_body(parser, body, defs),
            Block::Quote { children }
            | Block::List { children, .. }
            | Block::ListItem { children } => process_blocks(parser, children, defs),
            Block::Custom(custom) => match &mut custom.children {
                CustomBlockChildren::Inline(body) => finish_body(parser, body, defs),
                CustomBlockChildren::Blocks(children) => process_blocks(parser, children, defs),
            },
            _ => {}
        }
    }
}

fn finish_body(parser: &Parser, body: &mut InlineContent, defs: &LinkRefDefs) {
    if let InlineContent::Raw(text) = body {
        let parsed = parse_inline(parser, text, defs);
        *body = InlineContent::Parsed(parsed);
    }
}
