//! vellum: a CommonMark engine with a registry-driven parser, a two-phase
//! inline tokenizer and pluggable renderers.
//!
//! The one-shot entry points build a default engine per call:
//!
//! ```
//! let html = vellum::convert("# Hello, World!\n");
//! assert_eq!(html, "<h1>Hello, World!</h1>\n");
//! ```
//!
//! For configured use, build a [`Markdown`] engine, register extensions,
//! then parse and render:
//!
//! ```
//! use vellum::{Markdown, RendererChoice};
//!
//! let mut md = Markdown::with_renderer(RendererChoice::Markdown);
//! assert_eq!(md.convert("title\n===\n").unwrap(), "# title\n");
//! ```

pub mod ast;
pub mod block;
pub mod error;
pub mod extension;
pub mod helpers;
pub mod inline;
pub mod registry;
pub mod render;
pub mod source;

pub use ast::{Block, Document, Inline, InlineContent, LinkRef};
pub use block::Parser;
pub use error::{MarkdownError, Result};
pub use extension::{Extension, ExtensionFactory, ExtensionLoader, ExtensionOptions};
pub use registry::{BlockRule, ElementRegistry, ElementSpec, InlineRule};
pub use render::ast_json::AstRenderer;
pub use render::html::HtmlRenderer;
pub use render::markdown::MarkdownRenderer;
pub use render::{DynRenderer, Overrides, RenderOverride, RendererId};
pub use source::{Position, Source};

/// The renderer driven by a [`Markdown`] engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererChoice {
    Html,
    Ast,
    Markdown,
}

/// The main engine: a parser, a renderer choice and the extension state.
pub struct Markdown {
    parser: Parser,
    renderer: RendererChoice,
    overrides: Overrides,
    loader: ExtensionLoader,
    setup_done: bool,
}

impl Markdown {
    /// A CommonMark engine rendering to HTML.
    pub fn new() -> Self {
        Self::with_renderer(RendererChoice::Html)
    }

    pub fn with_renderer(renderer: RendererChoice) -> Self {
        Markdown {
            parser: Parser::new(),
            renderer,
            overrides: Overrides::default(),
            loader: ExtensionLoader::new(),
            setup_done: false,
        }
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    /// Make a factory available to [`Markdown::use_by_name`].
    pub fn register_extension_factory(&mut self, name: &str, factory: ExtensionFactory) {
        self.loader.register(name, factory);
    }

    /// Register an extension. Fails once the first parse has run.
    pub fn use_extension(&mut self, extension: Extension) -> Result<()> {
        if self.setup_done {
            return Err(MarkdownError::Extension {
                message: "unable to register more extensions after setup is done".to_string(),
            });
        }
        for rule in extension.block_rules {
            let spec = rule.spec();
            self.parser
                .registry
                .add_block(spec, registry::BlockHandler::Custom(rule))?;
        }
        for rule in extension.inline_rules {
            let spec = rule.spec();
            self.parser
                .registry
                .add_inline(spec, registry::InlineHandler::Custom(rule))?;
        }
        self.overrides.extend(extension.render_overrides);
        Ok(())
    }

    /// Resolve an extension by logical name and register it.
    pub fn use_by_name(&mut self, name: &str, options: &ExtensionOptions) -> Result<()> {
        let extension = self.loader.load(name, options)?;
        self.use_extension(extension)
    }

    /// Run the block scanner and the inline tokenizer.
    pub fn parse(&mut self, text: &str) -> Document {
        self.setup_done = true;
        self.parser.parse(text)
    }

    /// Drive the renderer over a document. A document whose inline bodies
    /// are still raw gets the inline pass first.
    pub fn render(&self, document: &mut Document) -> Result<String> {
        inline::process_document(&self.parser, document);
        let mut renderer: Box<dyn DynRenderer> = match self.renderer {
            RendererChoice::Html => Box::new(HtmlRenderer::new()),
            RendererChoice::Ast => Box::new(AstRenderer::new()),
            RendererChoice::Markdown => Box::new(MarkdownRenderer::new()),
        };
        render::render_document(renderer.as_mut(), document, &self.overrides)
    }

    /// Parse and render in one step.
    pub fn convert(&mut self, text: &str) -> Result<String> {
        let mut document = self.parse(text);
        self.render(&mut document)
    }
}

impl Default for Markdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse and render with a fresh default engine.
pub fn convert(text: &str) -> String {
    Markdown::new().convert(text).unwrap_or_else(|_| String::new())
}

/// Parse with a fresh default engine.
pub fn parse(text: &str) -> Document {
    Parser::new().parse(text)
}

/// Render a document to HTML with a fresh default engine.
pub fn render(document: &mut Document) -> String {
    Markdown::new()
        .render(document)
        .unwrap_or_else(|_| String::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convert_produces_expected_heading() {
        assert_eq!(convert("# hello world\n"), "<h1>hello world</h1>\n");
    }

    #[test]
    fn render_runs_inline_pass_on_raw_documents() {
        let parser = Parser::new();
        let mut document = parser.parse_blocks_only("*em*\n");
        // Bodies are still raw strings at this point.
        assert!(matches!(
            &document.children[0],
            Block::Paragraph { body } if body.is_raw()
        ));
        let html = render(&mut document);
        assert_eq!(html, "<p><em>em</em></p>\n");
    }

    #[test]
    fn extensions_cannot_register_after_parse() {
        let mut md = Markdown::new();
        let _ = md.parse("x\n");
        let error = md.use_extension(Extension::new("late")).expect_err("late");
        assert!(format!("{}", error).contains("setup is done"));
    }

    #[test]
    fn renderer_choice_controls_output() {
        let mut md = Markdown::with_renderer(RendererChoice::Ast);
        let out = md.convert("# x\n").unwrap();
        assert!(out.contains("\"element\":\"heading\""));
    }
}
