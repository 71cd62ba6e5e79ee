//! The block scanner.
//!
//! A recursive, line-oriented pass driven by the element registry: for each
//! line the registered block kinds are tried in priority order; the first
//! kind whose `match` succeeds parses the element. Containers (quote, list,
//! list item) push a prefix frame and recurse. Nothing here ever fails on
//! Markdown input; any unrecognized line folds into a paragraph.

pub mod container;
pub mod html;
pub mod leaf;
pub mod link_ref_def;
pub mod paragraph;

use crate::ast::{Block, Document, LinkRefDefs};
use crate::registry::{BlockEntry, BlockHandler, BuiltinBlock, ElementRegistry};
use crate::source::Source;
use log::warn;

/// Document-wide state collected while blocks are scanned.
#[derive(Debug, Default)]
pub struct DocState {
    pub link_ref_defs: LinkRefDefs,
}

/// The context handed to extension block rules: the parser for recursive
/// parsing and the document state for reference registration.
pub struct BlockContext<'a> {
    pub parser: &'a Parser,
    pub doc: &'a mut DocState,
}

impl BlockContext<'_> {
    /// Parse child blocks under the current container stack.
    pub fn parse_blocks(&mut self, source: &mut Source) -> Vec<Block> {
        self.parser.parse_blocks(source, self.doc)
    }
}

/// The parser: an element registry plus the scan loop that drives it.
#[derive(Debug, Clone)]
pub struct Parser {
    pub registry: ElementRegistry,
}

impl Parser {
    pub fn new() -> Self {
        Parser {
            registry: ElementRegistry::commonmark(),
        }
    }

    /// Parse a whole document: block pass, tightness resolution, pruning of
    /// transient markers, then the inline pass.
    pub fn parse(&self, text: &str) -> Document {
        let mut source = Source::new(text);
        let mut doc = DocState::default();
        let children = self.parse_blocks(&mut source, &mut doc);
        let mut document = Document {
            children,
            link_ref_defs: doc.link_ref_defs,
        };
        document.prune();
        crate::inline::process_document(self, &mut document);
        document
    }

    /// Parse a document but leave inline bodies raw. Used by `render` when
    /// it receives an unfinished document, and by tests.
    pub fn parse_blocks_only(&self, text: &str) -> Document {
        let mut source = Source::new(text);
        let mut doc = DocState::default();
        let children = self.parse_blocks(&mut source, &mut doc);
        let mut document = Document {
            children,
            link_ref_defs: doc.link_ref_defs,
        };
        document.prune();
        document
    }

    /// The scan loop. Returns when the source is exhausted or no kind
    /// matches, which hands control back to the enclosing container.
    pub fn parse_blocks(&self, source: &mut Source, doc: &mut DocState) -> Vec<Block> {
        let scan = self.registry.block_scan_list();
        let mut ast: Vec<Block> = Vec::new();
        'outer: while !source.exhausted() {
            for entry in &scan {
                if let Some(block) = self.try_entry(entry, source, doc) {
                    ast.push(block);
                    continue 'outer;
                }
            }
            break;
        }
        ast
    }

    fn try_entry(
        &self,
        entry: &BlockEntry,
        source: &mut Source,
        doc: &mut DocState,
    ) -> Option<Block> {
        match &entry.handler {
            BlockHandler::Builtin(builtin) => self.try_builtin(*builtin, source, doc),
            BlockHandler::Virtual => None,
            BlockHandler::Custom(rule) => {
                let mut ctx = BlockContext { parser: self, doc };
                match rule.try_parse(source, &mut ctx) {
                    Some(Ok(block)) => Some(block),
                    Some(Err(error)) => {
                        warn!(
                            "block rule '{}' failed, falling through: {}",
                            entry.spec.name, error
                        );
                        None
                    }
                    None => None,
                }
            }
        }
    }

    fn try_builtin(
        &self,
        builtin: BuiltinBlock,
        source: &mut Source,
        doc: &mut DocState,
    ) -> Option<Block> {
        match builtin {
            BuiltinBlock::BlankLine => leaf::parse_blank_line(source),
            BuiltinBlock::HtmlBlock => html::try_parse(source),
            BuiltinBlock::Heading => leaf::try_parse_heading(source),
            BuiltinBlock::FencedCode => leaf::try_parse_fenced_code(source),
            BuiltinBlock::ThematicBreak => leaf::try_parse_thematic_break(source),
            BuiltinBlock::List => container::try_parse_list(self, source, doc),
            BuiltinBlock::Quote => container::try_parse_quote(self, source, doc),
            BuiltinBlock::LinkRefDef => link_ref_def::try_parse(source, doc),
            BuiltinBlock::CodeBlock => leaf::try_parse_code_block(source),
            BuiltinBlock::Paragraph => paragraph::try_parse(self, source),
        }
    }

    /// Whether the named block kind matches at the current position.
    /// Resolving through the registry keeps overridden kinds in play for
    /// paragraph interruption.
    pub(crate) fn kind_matches(&self, name: &str, source: &mut Source) -> bool {
        match self.registry.block_by_name(name).map(|e| &e.handler) {
            Some(BlockHandler::Builtin(builtin)) => match builtin {
                BuiltinBlock::BlankLine => leaf::match_blank_line(source),
                BuiltinBlock::Heading => leaf::match_heading(source).is_some(),
                BuiltinBlock::FencedCode => leaf::match_fenced_code(source).is_some(),
                BuiltinBlock::ThematicBreak => leaf::match_thematic_break(source).is_some(),
                BuiltinBlock::Quote => container::match_quote(source).is_some(),
                BuiltinBlock::List => container::match_list(source).is_some(),
                BuiltinBlock::HtmlBlock => html::match_html_block(source).is_some(),
                _ => false,
            },
            Some(BlockHandler::Custom(rule)) => {
                let rule = rule.clone();
                rule.matches_for_interrupt(source)
            }
            _ => false,
        }
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Block, InlineContent};

    fn blocks(text: &str) -> Vec<Block> {
        Parser::new().parse_blocks_only(text).children
    }

    fn paragraph_text(block: &Block) -> &str {
        match block {
            Block::Paragraph {
                body: InlineContent::Raw(text),
            } => text,
            other => panic!("expected paragraph, got {:?}", other),
        }
    }

    #[test]
    fn parses_atx_heading() {
        let ast = blocks("# hello world\n");
        assert_eq!(ast.len(), 1);
        match &ast[0] {
            Block::Heading { level, body } => {
                assert_eq!(*level, 1);
                assert_eq!(body, &InlineContent::Raw("hello world".to_string()));
            }
            other => panic!("expected heading, got {:?}", other),
        }
    }

    #[test]
    fn heading_closing_sequence_is_stripped() {
        let ast = blocks("## section ##\n");
        match &ast[0] {
            Block::Heading { level, body } => {
                assert_eq!(*level, 2);
                assert_eq!(body, &InlineContent::Raw("section".to_string()));
            }
            other => panic!("expected heading, got {:?}", other),
        }
    }

    #[test]
    fn unrecognized_lines_become_paragraphs() {
        let ast = blocks("just some text\nmore text\n");
        assert_eq!(ast.len(), 1);
        assert_eq!(paragraph_text(&ast[0]), "just some text\nmore text");
    }

    #[test]
    fn blank_lines_split_paragraphs() {
        let ast = blocks("one\n\ntwo\n");
        assert_eq!(ast.len(), 2);
        assert_eq!(paragraph_text(&ast[0]), "one");
        assert_eq!(paragraph_text(&ast[1]), "two");
    }

    #[test]
    fn setext_heading_from_underline() {
        let ast = blocks("hello\n===\n");
        match &ast[0] {
            Block::SetextHeading { level, body } => {
                assert_eq!(*level, 1);
                assert_eq!(body, &InlineContent::Raw("hello".to_string()));
            }
            other => panic!("expected setext heading, got {:?}", other),
        }

        let ast = blocks("hello\n---\n");
        match &ast[0] {
            Block::SetextHeading { level, .. } => assert_eq!(*level, 2),
            other => panic!("expected setext heading, got {:?}", other),
        }
    }

    #[test]
    fn thematic_break_forms() {
        for text in ["---\n", "***\n", "___\n", " - - -\n"] {
            let ast = blocks(text);
            assert!(
                matches!(ast[0], Block::ThematicBreak),
                "input {:?} gave {:?}",
                text,
                ast
            );
        }
        // Mixed marker characters do not form a break.
        let ast = blocks("-*-\n");
        assert!(matches!(ast[0], Block::Paragraph { .. }));
    }

    #[test]
    fn fenced_code_with_info_string() {
        let ast = blocks("```py extra args\nprint(1)\n```\n");
        match &ast[0] {
            Block::FencedCode {
                lang,
                extra,
                children,
            } => {
                assert_eq!(lang.as_deref(), Some("py"));
                assert_eq!(extra.as_deref(), Some("extra args"));
                match &children[0] {
                    crate::ast::Inline::RawText { text, escape } => {
                        assert_eq!(text, "print(1)\n");
                        assert!(!escape);
                    }
                    other => panic!("expected raw text, got {:?}", other),
                }
            }
            other => panic!("expected fenced code, got {:?}", other),
        }
    }

    #[test]
    fn unclosed_fence_runs_to_eof() {
        let ast = blocks("```\ncode\n");
        match &ast[0] {
            Block::FencedCode { children, .. } => match &children[0] {
                crate::ast::Inline::RawText { text, .. } => assert_eq!(text, "code\n"),
                other => panic!("unexpected {:?}", other),
            },
            other => panic!("expected fenced code, got {:?}", other),
        }
    }

    #[test]
    fn indented_code_block() {
        let ast = blocks("    code line\n");
        match &ast[0] {
            Block::CodeBlock { children } => match &children[0] {
                crate::ast::Inline::RawText { text, .. } => {
                    assert_eq!(text, "code line\n");
                }
                other => panic!("unexpected {:?}", other),
            },
            other => panic!("expected code block, got {:?}", other),
        }
    }

    #[test]
    fn indented_chunk_does_not_interrupt_paragraph() {
        let ast = blocks("para\n    still para\n");
        assert_eq!(ast.len(), 1);
        assert_eq!(paragraph_text(&ast[0]), "para\nstill para");
    }

    #[test]
    fn quote_contains_blocks() {
        let ast = blocks("> # title\n> body\n");
        match &ast[0] {
            Block::Quote { children } => {
                assert_eq!(children.len(), 2);
                assert!(matches!(children[0], Block::Heading { .. }));
                assert!(matches!(children[1], Block::Paragraph { .. }));
            }
            other => panic!("expected quote, got {:?}", other),
        }
    }

    #[test]
    fn lazy_continuation_extends_quote_paragraph() {
        let ast = blocks("> line one\nline two\n");
        match &ast[0] {
            Block::Quote { children } => {
                assert_eq!(paragraph_text(&children[0]), "line one\nline two");
            }
            other => panic!("expected quote, got {:?}", other),
        }
    }

    #[test]
    fn tight_bullet_list() {
        let ast = blocks("- a\n- b\n");
        match &ast[0] {
            Block::List {
                tight,
                ordered,
                children,
                ..
            } => {
                assert!(*tight);
                assert!(!*ordered);
                assert_eq!(children.len(), 2);
            }
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn loose_list_from_blank_between_items() {
        let ast = blocks("- a\n\n- b\n");
        match &ast[0] {
            Block::List { tight, children, .. } => {
                assert!(!*tight);
                assert_eq!(children.len(), 2);
            }
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn ordered_list_keeps_first_start() {
        let ast = blocks("3. a\n4. b\n");
        match &ast[0] {
            Block::List {
                ordered,
                start,
                children,
                ..
            } => {
                assert!(*ordered);
                assert_eq!(*start, 3);
                assert_eq!(children.len(), 2);
            }
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn different_marker_family_starts_new_list() {
        let ast = blocks("- a\n+ b\n");
        assert_eq!(ast.len(), 2);
        assert!(matches!(ast[0], Block::List { .. }));
        assert!(matches!(ast[1], Block::List { .. }));
    }

    #[test]
    fn list_item_with_nested_paragraphs() {
        let ast = blocks("- a\n\n  b\n");
        match &ast[0] {
            Block::List { tight, children, .. } => {
                assert!(!*tight);
                match &children[0] {
                    Block::ListItem { children } => {
                        assert_eq!(children.len(), 2);
                    }
                    other => panic!("expected list item, got {:?}", other),
                }
            }
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn link_ref_def_is_lifted_into_document() {
        let document = Parser::new().parse_blocks_only("[x]: /u \"t\"\n[x]\n");
        assert_eq!(document.link_ref_defs.len(), 1);
        let key = unicase::UniCase::new("x".to_string());
        let def = &document.link_ref_defs[&key];
        assert_eq!(def.dest, "/u");
        assert_eq!(def.title.as_deref(), Some("t"));
        // The definition itself is pruned; the usage paragraph remains.
        assert_eq!(document.children.len(), 1);
        assert!(matches!(document.children[0], Block::Paragraph { .. }));
    }

    #[test]
    fn link_ref_def_without_closing_newline_stays_paragraph() {
        let document = Parser::new().parse_blocks_only("[x]: /u");
        assert!(document.link_ref_defs.is_empty());
        assert_eq!(document.children.len(), 1);
        assert!(matches!(document.children[0], Block::Paragraph { .. }));
    }

    #[test]
    fn html_block_type_six_ends_on_blank_line() {
        let ast = blocks("<div>\ncontent\n\nafter\n");
        match &ast[0] {
            Block::HtmlBlock { body } => {
                assert_eq!(body, "<div>\ncontent\n");
            }
            other => panic!("expected html block, got {:?}", other),
        }
        assert!(matches!(ast.last().unwrap(), Block::Paragraph { .. }));
    }

    #[test]
    fn html_block_script_ends_on_closing_tag() {
        let ast = blocks("<script>\nvar x = 1;\n</script>\nafter\n");
        match &ast[0] {
            Block::HtmlBlock { body } => {
                assert!(body.contains("var x = 1;"));
                assert!(body.contains("</script>"));
            }
            other => panic!("expected html block, got {:?}", other),
        }
    }

    #[test]
    fn setext_underline_beats_thematic_break_after_paragraph() {
        let ast = blocks("title\n---\n");
        assert!(matches!(ast[0], Block::SetextHeading { level: 2, .. }));
    }

    #[test]
    fn ordered_list_interrupting_paragraph_must_start_at_one() {
        let ast = blocks("para\n2. item\n");
        assert_eq!(ast.len(), 1);
        assert!(matches!(ast[0], Block::Paragraph { .. }));

        let ast = blocks("para\n1. item\n");
        assert_eq!(ast.len(), 2);
        assert!(matches!(ast[1], Block::List { .. }));
    }

    #[test]
    fn quote_code_block_requires_five_spaces() {
        let ast = blocks(">     code\n");
        match &ast[0] {
            Block::Quote { children } => {
                assert!(matches!(children[0], Block::CodeBlock { .. }));
            }
            other => panic!("expected quote, got {:?}", other),
        }
    }
}
