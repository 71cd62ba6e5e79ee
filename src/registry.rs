//! Ordered collections of block and inline element kinds.
//!
//! The registry drives the scan order of both parsing passes. Each kind
//! carries a priority (higher is tried earlier), a virtual flag (the kind is
//! only produced as a by-product of another kind and never matched
//! directly), and an override flag (the kind replaces a registered kind of
//! the same name). Registries are owned by the parser instance; nothing
//! global participates in a parse.

use crate::ast::{Block, Inline};
use crate::block::BlockContext;
use crate::error::{MarkdownError, Result};
use crate::inline::InlineMatch;
use crate::source::Source;
use std::fmt::Debug;
use std::sync::Arc;

/// Block scan priorities, descending. Blank lines terminate everything;
/// paragraphs are the universal fallback.
pub mod priority {
    pub const BLANK_LINE: u8 = 10;
    pub const HTML_BLOCK: u8 = 9;
    pub const HEADING: u8 = 8;
    pub const FENCED_CODE: u8 = 7;
    pub const THEMATIC_BREAK: u8 = 6;
    pub const LIST: u8 = 5;
    pub const QUOTE: u8 = 4;
    pub const LINK_REF_DEF: u8 = 3;
    pub const CODE_BLOCK: u8 = 2;
    pub const PARAGRAPH: u8 = 1;

    pub const INLINE_DEFAULT: u8 = 5;
    pub const LITERAL: u8 = 7;
    pub const CODE_SPAN: u8 = 7;
    pub const INLINE_HTML: u8 = 7;
    pub const AUTO_LINK: u8 = 7;
    pub const ENTITY: u8 = 7;
    pub const LINK_OR_EMPH: u8 = 5;
    pub const LINE_BREAK: u8 = 2;
}

/// The metadata every registered element kind carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementSpec {
    pub name: String,
    pub priority: u8,
    pub is_virtual: bool,
    pub override_existing: bool,
}

impl ElementSpec {
    pub fn new(name: &str, priority: u8) -> Self {
        ElementSpec {
            name: name.to_string(),
            priority,
            is_virtual: false,
            override_existing: false,
        }
    }

    pub fn virtual_kind(name: &str) -> Self {
        ElementSpec {
            name: name.to_string(),
            priority: priority::INLINE_DEFAULT,
            is_virtual: true,
            override_existing: false,
        }
    }

    pub fn overriding(mut self) -> Self {
        self.override_existing = true;
        self
    }
}

/// A block element contributed by an extension.
pub trait BlockRule: Debug + Send + Sync {
    fn spec(&self) -> ElementSpec;

    /// Attempt to parse an element at the current position. `None` means
    /// the rule declines; the source must then be left untouched.
    fn try_parse(&self, source: &mut Source, ctx: &mut BlockContext<'_>)
        -> Option<Result<Block>>;

    /// Whether a match of this rule may interrupt an open paragraph.
    fn matches_for_interrupt(&self, source: &mut Source) -> bool {
        let _ = source;
        false
    }
}

/// An inline element contributed by an extension.
pub trait InlineRule: Debug + Send + Sync {
    fn spec(&self) -> ElementSpec;

    /// All matches of this element in the text, non-overlapping, in order.
    fn find(&self, text: &str) -> Vec<InlineMatch>;

    /// Construct the element for a match. `children` holds the re-tokenized
    /// inner content when the match parses children, and is empty otherwise.
    fn build(&self, matched: &InlineMatch, children: Vec<Inline>) -> Inline;
}

/// The built-in CommonMark block kinds, dispatched by the scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinBlock {
    BlankLine,
    HtmlBlock,
    Heading,
    FencedCode,
    ThematicBreak,
    List,
    Quote,
    LinkRefDef,
    CodeBlock,
    Paragraph,
}

/// The built-in CommonMark inline kinds, dispatched by the tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinInline {
    Literal,
    CodeSpan,
    InlineHtml,
    AutoLink,
    Entity,
    LineBreak,
    LinkOrEmph,
}

#[derive(Debug, Clone)]
pub enum BlockHandler {
    Builtin(BuiltinBlock),
    /// Produced by other elements only; never scanned.
    Virtual,
    Custom(Arc<dyn BlockRule>),
}

#[derive(Debug, Clone)]
pub enum InlineHandler {
    Builtin(BuiltinInline),
    Virtual,
    Custom(Arc<dyn InlineRule>),
}

#[derive(Debug, Clone)]
pub struct BlockEntry {
    pub spec: ElementSpec,
    pub handler: BlockHandler,
    pub order: usize,
}

#[derive(Debug, Clone)]
pub struct InlineEntry {
    pub spec: ElementSpec,
    pub handler: InlineHandler,
    pub order: usize,
}

/// The element registry: two ordered kind lists with runtime override.
#[derive(Debug, Clone, Default)]
pub struct ElementRegistry {
    blocks: Vec<BlockEntry>,
    inlines: Vec<InlineEntry>,
    next_order: usize,
}

impl ElementRegistry {
    /// The CommonMark element set.
    pub fn commonmark() -> Self {
        use priority::*;
        let mut registry = ElementRegistry::default();
        let blocks = [
            ("document", 0, BlockHandler::Virtual),
            ("blank_line", BLANK_LINE, BlockHandler::Builtin(BuiltinBlock::BlankLine)),
            ("html_block", HTML_BLOCK, BlockHandler::Builtin(BuiltinBlock::HtmlBlock)),
            ("heading", HEADING, BlockHandler::Builtin(BuiltinBlock::Heading)),
            ("setext_heading", HEADING, BlockHandler::Virtual),
            ("fenced_code", FENCED_CODE, BlockHandler::Builtin(BuiltinBlock::FencedCode)),
            ("thematic_break", THEMATIC_BREAK, BlockHandler::Builtin(BuiltinBlock::ThematicBreak)),
            ("list", LIST, BlockHandler::Builtin(BuiltinBlock::List)),
            ("list_item", LIST, BlockHandler::Virtual),
            ("quote", QUOTE, BlockHandler::Builtin(BuiltinBlock::Quote)),
            ("link_ref_def", LINK_REF_DEF, BlockHandler::Builtin(BuiltinBlock::LinkRefDef)),
            ("code_block", CODE_BLOCK, BlockHandler::Builtin(BuiltinBlock::CodeBlock)),
            ("paragraph", PARAGRAPH, BlockHandler::Builtin(BuiltinBlock::Paragraph)),
        ];
        for (name, prio, handler) in blocks {
            let mut spec = ElementSpec::new(name, prio);
            spec.is_virtual = matches!(handler, BlockHandler::Virtual);
            registry
                .add_block(spec, handler)
                .expect("default set has no duplicates");
        }
        let inlines = [
            ("literal", LITERAL, InlineHandler::Builtin(BuiltinInline::Literal)),
            ("code_span", CODE_SPAN, InlineHandler::Builtin(BuiltinInline::CodeSpan)),
            ("inline_html", INLINE_HTML, InlineHandler::Builtin(BuiltinInline::InlineHtml)),
            ("auto_link", AUTO_LINK, InlineHandler::Builtin(BuiltinInline::AutoLink)),
            ("entity", ENTITY, InlineHandler::Builtin(BuiltinInline::Entity)),
            ("link_or_emph", LINK_OR_EMPH, InlineHandler::Builtin(BuiltinInline::LinkOrEmph)),
            ("line_break", LINE_BREAK, InlineHandler::Builtin(BuiltinInline::LineBreak)),
            ("raw_text", 0, InlineHandler::Virtual),
            ("emphasis", 0, InlineHandler::Virtual),
            ("strong_emphasis", 0, InlineHandler::Virtual),
            ("link", 0, InlineHandler::Virtual),
            ("image", 0, InlineHandler::Virtual),
        ];
        for (name, prio, handler) in inlines {
            let mut spec = ElementSpec::new(name, prio);
            spec.is_virtual = matches!(handler, InlineHandler::Virtual);
            registry
                .add_inline(spec, handler)
                .expect("default set has no duplicates");
        }
        registry
    }

    pub fn add_block(&mut self, spec: ElementSpec, handler: BlockHandler) -> Result<()> {
        if let Some(existing) = self.blocks.iter_mut().find(|e| e.spec.name == spec.name) {
            if !spec.override_existing {
                return Err(MarkdownError::Extension {
                    message: format!(
                        "block element '{}' is already registered",
                        spec.name
                    ),
                });
            }
            existing.spec = spec;
            existing.handler = handler;
            return Ok(());
        }
        let order = self.next_order;
        self.next_order += 1;
        self.blocks.push(BlockEntry { spec, handler, order });
        Ok(())
    }

    pub fn add_inline(&mut self, spec: ElementSpec, handler: InlineHandler) -> Result<()> {
        if let Some(existing) = self.inlines.iter_mut().find(|e| e.spec.name == spec.name) {
            if !spec.override_existing {
                return Err(MarkdownError::Extension {
                    message: format!(
                        "inline element '{}' is already registered",
                        spec.name
                    ),
                });
            }
            existing.spec = spec;
            existing.handler = handler;
            return Ok(());
        }
        let order = self.next_order;
        self.next_order += 1;
        self.inlines.push(InlineEntry { spec, handler, order });
        Ok(())
    }

    /// Non-virtual block kinds, highest priority first; ties keep
    /// registration order.
    pub fn block_scan_list(&self) -> Vec<&BlockEntry> {
        let mut entries: Vec<&BlockEntry> =
            self.blocks.iter().filter(|e| !e.spec.is_virtual).collect();
        entries.sort_by(|a, b| {
            b.spec
                .priority
                .cmp(&a.spec.priority)
                .then(a.order.cmp(&b.order))
        });
        entries
    }

    /// Non-virtual inline kinds in registration order; the overlap
    /// resolution consults priorities itself.
    pub fn inline_scan_list(&self) -> Vec<&InlineEntry> {
        self.inlines
            .iter()
            .filter(|e| !e.spec.is_virtual)
            .collect()
    }

    pub fn block_by_name(&self, name: &str) -> Option<&BlockEntry> {
        self.blocks.iter().find(|e| e.spec.name == name)
    }

    pub fn inline_by_name(&self, name: &str) -> Option<&InlineEntry> {
        self.inlines.iter().find(|e| e.spec.name == name)
    }
}
