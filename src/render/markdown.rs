//! The Markdown renderer: re-serializes the AST to Markdown text.
//!
//! Container prefixes mirror the parser's: the first line of a container
//! carries its marker, continuation lines carry the matching indentation.
//! The output is a fixed point after one extra parse/render round-trip.

use crate::ast::{Block, CustomBlockChildren, ElementRef, Inline, InlineContent};
use crate::error::Result;
use crate::render::{dispatch, DynRenderer, RenderCtx, RendererId};

pub struct MarkdownRenderer {
    prefix: String,
    second_prefix: String,
    /// Tightness of the list currently being rendered.
    tight: Vec<bool>,
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        MarkdownRenderer {
            prefix: String::new(),
            second_prefix: String::new(),
            tight: Vec::new(),
        }
    }

    fn enter_container(&mut self, first: &str, rest: &str) -> (String, String) {
        let saved = (self.prefix.clone(), self.second_prefix.clone());
        self.prefix.push_str(first);
        self.second_prefix.push_str(rest);
        saved
    }

    fn exit_container(&mut self, saved: (String, String)) {
        self.prefix = saved.0;
        self.second_prefix = saved.1;
    }

    /// Render sibling blocks, separating them with a blank line unless the
    /// enclosing list is tight.
    fn render_block_seq(
        &mut self,
        blocks: &[Block],
        ctx: &mut RenderCtx<'_>,
        tight: bool,
    ) -> Result<String> {
        let mut out = String::new();
        for (idx, block) in blocks.iter().enumerate() {
            if idx > 0 && !tight {
                out.push_str(&self.prefix);
                out.push('\n');
            }
            out.push_str(&dispatch(self, ElementRef::Block(block), ctx)?);
        }
        Ok(out)
    }

    fn render_inlines(&mut self, inlines: &[Inline], ctx: &mut RenderCtx<'_>) -> Result<String> {
        let mut out = String::new();
        for inline in inlines {
            out.push_str(&dispatch(self, ElementRef::Inline(inline), ctx)?);
        }
        Ok(out)
    }

    fn render_body(&mut self, body: &InlineContent, ctx: &mut RenderCtx<'_>) -> Result<String> {
        match body {
            InlineContent::Parsed(children) => self.render_inlines(children, ctx),
            InlineContent::Raw(text) => Ok(text.clone()),
        }
    }

    fn render_block(&mut self, block: &Block, ctx: &mut RenderCtx<'_>) -> Result<String> {
        match block {
            Block::Paragraph { body } => {
                let rendered_body = self.render_body(body, ctx)?;
                let line = format!("{}{}\n", self.prefix, rendered_body);
                self.prefix = self.second_prefix.clone();
                Ok(line)
            }
            Block::Heading { level, body } | Block::SetextHeading { level, body } => {
                let rendered_body = self.render_body(body, ctx)?;
                let line = format!(
                    "{}{} {}\n",
                    self.prefix,
                    "#".repeat(*level as usize),
                    rendered_body
                );
                self.prefix = self.second_prefix.clone();
                Ok(line)
            }
            Block::Quote { children } => {
                let saved = self.enter_container("> ", "> ");
                let rendered = self.render_block_seq(children, ctx, false);
                self.exit_container(saved);
                self.prefix = self.second_prefix.clone();
                rendered
            }
            Block::List {
                tight,
                ordered,
                start,
                bullet,
                children,
            } => {
                let mut out = String::new();
                self.tight.push(*tight);
                let mut number = *start;
                for (idx, child) in children.iter().enumerate() {
                    if idx > 0 && !*tight {
                        out.push_str(&self.second_prefix);
                        out.push('\n');
                    }
                    let (first, rest) = if *ordered {
                        let marker = format!("{}. ", number);
                        let pad = " ".repeat(marker.len());
                        number += 1;
                        (marker, pad)
                    } else {
                        (format!("{} ", bullet), "  ".to_string())
                    };
                    let saved = self.enter_container(&first, &rest);
                    let rendered = dispatch(self, ElementRef::Block(child), ctx);
                    self.exit_container(saved);
                    out.push_str(&rendered?);
                }
                self.tight.pop();
                self.prefix = self.second_prefix.clone();
                Ok(out)
            }
            Block::ListItem { children } => {
                let tight = self.tight.last().copied().unwrap_or(false);
                self.render_block_seq(children, ctx, tight)
            }
            Block::FencedCode {
                lang,
                extra,
                children,
            } => {
                let info = match (lang, extra) {
                    (Some(lang), Some(extra)) => format!("{} {}", lang, extra),
                    (Some(lang), None) => lang.clone(),
                    (None, _) => String::new(),
                };
                let mut lines = vec![format!("{}```{}", self.prefix, info)];
                for line in raw_body(children).lines() {
                    lines.push(format!("{}{}", self.second_prefix, line));
                }
                lines.push(format!("{}```", self.second_prefix));
                self.prefix = self.second_prefix.clone();
                Ok(lines.join("\n") + "\n")
            }
            Block::CodeBlock { children } => {
                let body = raw_body(children);
                let mut lines = Vec::new();
                for (idx, line) in body.lines().enumerate() {
                    let prefix = if idx == 0 {
                        &self.prefix
                    } else {
                        &self.second_prefix
                    };
                    lines.push(format!("{}    {}", prefix, line));
                }
                self.prefix = self.second_prefix.clone();
                Ok(lines.join("\n") + "\n")
            }
            Block::HtmlBlock { body } => {
                let mut out = format!("{}{}", self.prefix, body);
                if !out.ends_with('\n') {
                    out.push('\n');
                }
                self.prefix = self.second_prefix.clone();
                Ok(out)
            }
            Block::ThematicBreak => {
                let out = format!("{}* * *\n", self.prefix);
                self.prefix = self.second_prefix.clone();
                Ok(out)
            }
            Block::BlankLine { .. } | Block::LinkRefDef { .. } => Ok(String::new()),
            Block::Custom(custom) => {
                ctx.warn_dispatch_miss(&custom.kind);
                match &custom.children {
                    CustomBlockChildren::Inline(body) => {
                        let rendered_body = self.render_body(body, ctx)?;
                        let line = format!("{}{}\n", self.prefix, rendered_body);
                        self.prefix = self.second_prefix.clone();
                        Ok(line)
                    }
                    CustomBlockChildren::Blocks(children) => {
                        self.render_block_seq(children, ctx, false)
                    }
                }
            }
        }
    }

    fn render_inline(&mut self, inline: &Inline, ctx: &mut RenderCtx<'_>) -> Result<String> {
        match inline {
            Inline::RawText { text, .. } | Inline::Entity { text } | Inline::InlineHtml { text } => {
                Ok(text.clone())
            }
            Inline::Literal { text } => Ok(format!("\\{}", text)),
            Inline::LineBreak { soft } => Ok(if *soft {
                "\n".to_string()
            } else {
                "\\\n".to_string()
            }),
            Inline::CodeSpan { text } => {
                if text.starts_with('`') || text.ends_with('`') {
                    Ok(format!("`` {} ``", text))
                } else {
                    Ok(format!("`{}`", text))
                }
            }
            Inline::Emphasis { children } => {
                Ok(format!("*{}*", self.render_inlines(children, ctx)?))
            }
            Inline::StrongEmphasis { children } => {
                Ok(format!("**{}**", self.render_inlines(children, ctx)?))
            }
            Inline::Link {
                dest,
                title,
                children,
            } => Ok(format!(
                "[{}]({}{})",
                self.render_inlines(children, ctx)?,
                dest,
                title_suffix(title)
            )),
            Inline::Image {
                dest,
                title,
                children,
            } => Ok(format!(
                "![{}]({}{})",
                self.render_inlines(children, ctx)?,
                dest,
                title_suffix(title)
            )),
            Inline::AutoLink { dest, .. } => Ok(format!("<{}>", dest)),
            Inline::Custom(custom) => {
                ctx.warn_dispatch_miss(&custom.kind);
                self.render_inlines(&custom.children, ctx)
            }
        }
    }
}

fn title_suffix(title: &Option<String>) -> String {
    match title {
        Some(title) => format!(" \"{}\"", title.replace('"', "\\\"")),
        None => String::new(),
    }
}

fn raw_body(children: &[Inline]) -> String {
    children
        .iter()
        .map(|child| match child {
            Inline::RawText { text, .. } => text.as_str(),
            _ => "",
        })
        .collect()
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl DynRenderer for MarkdownRenderer {
    fn id(&self) -> RendererId {
        RendererId::Markdown
    }

    fn render_element(
        &mut self,
        element: ElementRef<'_>,
        ctx: &mut RenderCtx<'_>,
    ) -> Result<String> {
        match element {
            ElementRef::Document(document) => {
                self.render_block_seq(&document.children, ctx, false)
            }
            ElementRef::Block(block) => self.render_block(block, ctx),
            ElementRef::Inline(inline) => self.render_inline(inline, ctx),
        }
    }

    fn render_children(
        &mut self,
        element: ElementRef<'_>,
        ctx: &mut RenderCtx<'_>,
    ) -> Result<String> {
        match element {
            ElementRef::Document(document) => {
                self.render_block_seq(&document.children, ctx, false)
            }
            ElementRef::Block(block) => match block {
                Block::Paragraph { body }
                | Block::Heading { body, .. }
                | Block::SetextHeading { body, .. } => self.render_body(body, ctx),
                Block::Quote { children }
                | Block::List { children, .. }
                | Block::ListItem { children } => self.render_block_seq(children, ctx, false),
                Block::CodeBlock { children } | Block::FencedCode { children, .. } => {
                    Ok(raw_body(children))
                }
                Block::HtmlBlock { body } => Ok(body.clone()),
                Block::Custom(custom) => match &custom.children {
                    CustomBlockChildren::Inline(body) => self.render_body(body, ctx),
                    CustomBlockChildren::Blocks(children) => {
                        self.render_block_seq(children, ctx, false)
                    }
                },
                _ => Ok(String::new()),
            },
            ElementRef::Inline(inline) => match inline {
                Inline::Emphasis { children }
                | Inline::StrongEmphasis { children }
                | Inline::Link { children, .. }
                | Inline::Image { children, .. }
                | Inline::AutoLink { children, .. } => self.render_inlines(children, ctx),
                Inline::Custom(custom) => self.render_inlines(&custom.children, ctx),
                Inline::RawText { text, .. }
                | Inline::Literal { text }
                | Inline::CodeSpan { text }
                | Inline::Entity { text }
                | Inline::InlineHtml { text } => Ok(text.clone()),
                Inline::LineBreak { .. } => Ok(String::new()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Parser;
    use crate::render::{render_document, Overrides};

    fn roundtrip(text: &str) -> String {
        let parser = Parser::new();
        let document = parser.parse(text);
        let mut renderer = MarkdownRenderer::new();
        render_document(&mut renderer, &document, &Overrides::default()).expect("render")
    }

    #[test]
    fn renders_heading_and_paragraph() {
        assert_eq!(roundtrip("# title\n\nbody\n"), "# title\n\nbody\n");
    }

    #[test]
    fn renders_tight_list_without_blanks() {
        assert_eq!(roundtrip("- a\n- b\n"), "- a\n- b\n");
    }

    #[test]
    fn renders_loose_list_with_blanks() {
        assert_eq!(roundtrip("- a\n\n- b\n"), "- a\n\n- b\n");
    }

    #[test]
    fn renders_quote_prefix() {
        assert_eq!(roundtrip("> hello\n"), "> hello\n");
    }

    #[test]
    fn renders_ordered_numbers_in_sequence() {
        assert_eq!(roundtrip("3. a\n4. b\n"), "3. a\n4. b\n");
    }

    #[test]
    fn setext_heading_becomes_atx() {
        assert_eq!(roundtrip("title\n===\n"), "# title\n");
    }
}
