//! Typed block and inline elements.
//!
//! Every node exposes a stable snake_case kind name used for renderer
//! dispatch and AST serialization. Elements are created by the scanner and
//! the inline tokenizer and never mutated by renderers.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use unicase::UniCase;

/// A link reference definition lifted into the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkRef {
    pub label: String,
    pub dest: String,
    pub title: Option<String>,
}

/// Case-folded label → definition. The first definition of a label wins.
pub type LinkRefDefs = HashMap<UniCase<String>, LinkRef>;

/// Root node of a parsed document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub children: Vec<Block>,
    pub link_ref_defs: LinkRefDefs,
}

/// The body of a block with inline children: raw text until the inline
/// pass rewrites it into an element tree.
#[derive(Debug, Clone, PartialEq)]
pub enum InlineContent {
    Raw(String),
    Parsed(Vec<Inline>),
}

impl InlineContent {
    pub fn is_raw(&self) -> bool {
        matches!(self, InlineContent::Raw(_))
    }

    /// The parsed children; empty when the inline pass has not run yet.
    pub fn parsed(&self) -> &[Inline] {
        match self {
            InlineContent::Parsed(children) => children,
            InlineContent::Raw(_) => &[],
        }
    }
}

/// Block-level elements.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Transient marker terminating paragraphs; pruned from the final tree.
    BlankLine { anchor: usize },
    Heading { level: u8, body: InlineContent },
    /// Produced only by a paragraph followed by a `=`/`-` underline.
    SetextHeading { level: u8, body: InlineContent },
    /// Indented code block.
    CodeBlock { children: Vec<Inline> },
    FencedCode {
        lang: Option<String>,
        extra: Option<String>,
        children: Vec<Inline>,
    },
    ThematicBreak,
    /// Raw HTML; the body is held verbatim and never inline-parsed.
    HtmlBlock { body: String },
    /// Registered with the document and pruned from the final tree.
    LinkRefDef {
        label: String,
        dest: String,
        title: Option<String>,
    },
    Paragraph { body: InlineContent },
    Quote { children: Vec<Block> },
    List {
        tight: bool,
        ordered: bool,
        start: u32,
        bullet: String,
        children: Vec<Block>,
    },
    ListItem { children: Vec<Block> },
    Custom(CustomBlock),
}

/// A block produced by an extension element.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomBlock {
    pub kind: String,
    pub data: Map<String, Value>,
    pub children: CustomBlockChildren,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CustomBlockChildren {
    Inline(InlineContent),
    Blocks(Vec<Block>),
}

/// Inline (span) elements.
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    /// Fallback for stretches that match no other element.
    RawText { text: String, escape: bool },
    /// A backslash-escaped character, preserved verbatim.
    Literal { text: String },
    LineBreak { soft: bool },
    CodeSpan { text: String },
    Emphasis { children: Vec<Inline> },
    StrongEmphasis { children: Vec<Inline> },
    Link {
        dest: String,
        title: Option<String>,
        children: Vec<Inline>,
    },
    Image {
        dest: String,
        title: Option<String>,
        children: Vec<Inline>,
    },
    AutoLink { dest: String, children: Vec<Inline> },
    InlineHtml { text: String },
    /// A character reference, held raw and decoded at render time.
    Entity { text: String },
    Custom(CustomInline),
}

/// An inline produced by an extension element.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomInline {
    pub kind: String,
    pub data: Map<String, Value>,
    pub children: Vec<Inline>,
}

impl Block {
    pub fn kind_name(&self) -> &str {
        match self {
            Block::BlankLine { .. } => "blank_line",
            Block::Heading { .. } => "heading",
            Block::SetextHeading { .. } => "setext_heading",
            Block::CodeBlock { .. } => "code_block",
            Block::FencedCode { .. } => "fenced_code",
            Block::ThematicBreak => "thematic_break",
            Block::HtmlBlock { .. } => "html_block",
            Block::LinkRefDef { .. } => "link_ref_def",
            Block::Paragraph { .. } => "paragraph",
            Block::Quote { .. } => "quote",
            Block::List { .. } => "list",
            Block::ListItem { .. } => "list_item",
            Block::Custom(custom) => &custom.kind,
        }
    }
}

impl Inline {
    pub fn kind_name(&self) -> &str {
        match self {
            Inline::RawText { .. } => "raw_text",
            Inline::Literal { .. } => "literal",
            Inline::LineBreak { .. } => "line_break",
            Inline::CodeSpan { .. } => "code_span",
            Inline::Emphasis { .. } => "emphasis",
            Inline::StrongEmphasis { .. } => "strong_emphasis",
            Inline::Link { .. } => "link",
            Inline::Image { .. } => "image",
            Inline::AutoLink { .. } => "auto_link",
            Inline::InlineHtml { .. } => "inline_html",
            Inline::Entity { .. } => "entity",
            Inline::Custom(custom) => &custom.kind,
        }
    }
}

/// A borrowed view of any element, used by renderer dispatch.
#[derive(Debug, Clone, Copy)]
pub enum ElementRef<'a> {
    Document(&'a Document),
    Block(&'a Block),
    Inline(&'a Inline),
}

impl<'a> ElementRef<'a> {
    pub fn kind_name(&self) -> &str {
        match self {
            ElementRef::Document(_) => "document",
            ElementRef::Block(block) => block.kind_name(),
            ElementRef::Inline(inline) => inline.kind_name(),
        }
    }
}

impl Document {
    pub fn new() -> Self {
        Document {
            children: Vec::new(),
            link_ref_defs: LinkRefDefs::new(),
        }
    }

    /// Drop the transient markers from the finished tree. Blank lines have
    /// served their purpose once tightness is decided, and link reference
    /// definitions live on in `link_ref_defs`.
    pub fn prune(&mut self) {
        prune_blocks(&mut self.children);
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

fn prune_blocks(blocks: &mut Vec<Block>) {
    blocks.retain(|block| {
        !matches!(block, Block::BlankLine { .. } | Block::LinkRefDef { .. })
    });
    for block in blocks.iter_mut() {
        match block {
            Block::Quote { children }
            | Block::List { children, .. }
            | Block::ListItem { children } => prune_blocks(children),
            Block::Custom(custom) => {
                if let CustomBlockChildren::Blocks(children) = &mut custom.children {
                    prune_blocks(children);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_are_snake_case() {
        assert_eq!(Block::ThematicBreak.kind_name(), "thematic_break");
        assert_eq!(
            Block::Heading {
                level: 1,
                body: InlineContent::Raw(String::new())
            }
            .kind_name(),
            "heading"
        );
        assert_eq!(
            Inline::StrongEmphasis { children: vec![] }.kind_name(),
            "strong_emphasis"
        );
    }

    #[test]
    fn prune_removes_transient_markers() {
        let mut document = Document::new();
        document.children = vec![
            Block::BlankLine { anchor: 0 },
            Block::Quote {
                children: vec![
                    Block::LinkRefDef {
                        label: "x".to_string(),
                        dest: "/u".to_string(),
                        title: None,
                    },
                    Block::Paragraph {
                        body: InlineContent::Raw("hi".to_string()),
                    },
                ],
            },
        ];
        document.prune();
        assert_eq!(document.children.len(), 1);
        match &document.children[0] {
            Block::Quote { children } => {
                assert_eq!(children.len(), 1);
                assert_eq!(children[0].kind_name(), "paragraph");
            }
            other => panic!("unexpected block: {:?}", other),
        }
    }

    #[test]
    fn first_link_ref_definition_wins() {
        let mut defs = LinkRefDefs::new();
        let key = UniCase::new("Label".to_string());
        defs.entry(key.clone()).or_insert(LinkRef {
            label: "Label".to_string(),
            dest: "/first".to_string(),
            title: None,
        });
        defs.entry(UniCase::new("LABEL".to_string())).or_insert(LinkRef {
            label: "LABEL".to_string(),
            dest: "/second".to_string(),
            title: None,
        });
        assert_eq!(defs[&key].dest, "/first");
    }
}
