//! The HTML renderer, the default output of the engine.

use crate::ast::{Block, CustomBlockChildren, ElementRef, Inline, InlineContent};
use crate::error::Result;
use crate::helpers::decode_entities;
use crate::render::{dispatch, DynRenderer, RenderCtx, RendererId};

pub struct HtmlRenderer {
    /// Tightness of the enclosing lists, innermost last.
    tight: Vec<bool>,
}

impl HtmlRenderer {
    pub fn new() -> Self {
        HtmlRenderer { tight: Vec::new() }
    }

    /// Escape text content: decode the character references the engine
    /// knows, then escape `&`, `<`, `>` and `"`.
    pub fn escape_html(raw: &str) -> String {
        escape_raw(&decode_entities(raw))
    }

    /// Escape code content verbatim; character references inside code are
    /// not references.
    pub fn escape_code(raw: &str) -> String {
        escape_raw(raw)
    }

    /// Percent-encode a URL outside a safe set, preserving existing
    /// percent-encoded triplets, then escape it for an HTML attribute.
    pub fn escape_url(raw: &str) -> String {
        let decoded = decode_entities(raw);
        let mut quoted = String::with_capacity(decoded.len());
        for byte in decoded.bytes() {
            let c = byte as char;
            if byte.is_ascii_alphanumeric()
                || "-._~".contains(c)
                || "/#:()*?=%@+,&".contains(c)
            {
                quoted.push(c);
            } else {
                quoted.push_str(&format!("%{:02X}", byte));
            }
        }
        escape_raw(&quoted)
    }

    fn render_blocks(&mut self, blocks: &[Block], ctx: &mut RenderCtx<'_>) -> Result<String> {
        let mut out = String::new();
        for block in blocks {
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
            InlineContent::Raw(text) => Ok(Self::escape_html(text)),
        }
    }

    /// The plain-text rendition of inline content, used for image alt
    /// text: markup is dropped, text is kept.
    fn plain_text(inlines: &[Inline]) -> String {
        let mut out = String::new();
        for inline in inlines {
            match inline {
                Inline::RawText { text, escape } => {
                    if *escape {
                        out.push_str(&Self::escape_html(text));
                    } else {
                        out.push_str(text);
                    }
                }
                Inline::Literal { text }
                | Inline::CodeSpan { text }
                | Inline::Entity { text }
                | Inline::InlineHtml { text } => out.push_str(&Self::escape_html(text)),
                Inline::LineBreak { .. } => out.push('\n'),
                Inline::Emphasis { children }
                | Inline::StrongEmphasis { children }
                | Inline::Link { children, .. }
                | Inline::Image { children, .. }
                | Inline::AutoLink { children, .. } => {
                    out.push_str(&Self::plain_text(children));
                }
                Inline::Custom(custom) => out.push_str(&Self::plain_text(&custom.children)),
            }
        }
        out
    }

    fn render_list_item(
        &mut self,
        children: &[Block],
        ctx: &mut RenderCtx<'_>,
    ) -> Result<String> {
        let tight = self.tight.last().copied().unwrap_or(false);
        let mut body = String::new();
        for (idx, child) in children.iter().enumerate() {
            match child {
                Block::Paragraph { body: inline } if tight => {
                    body.push_str(&self.render_body(inline, ctx)?);
                    if idx + 1 < children.len() {
                        body.push('\n');
                    }
                }
                _ => {
                    if idx == 0 {
                        body.push('\n');
                    }
                    body.push_str(&dispatch(self, ElementRef::Block(child), ctx)?);
                }
            }
        }
        Ok(format!("<li>{}</li>\n", body))
    }

    fn render_block(&mut self, block: &Block, ctx: &mut RenderCtx<'_>) -> Result<String> {
        match block {
            Block::Heading { level, body } | Block::SetextHeading { level, body } => Ok(format!(
                "<h{level}>{}</h{level}>\n",
                self.render_body(body, ctx)?,
                level = level
            )),
            Block::Paragraph { body } => {
                Ok(format!("<p>{}</p>\n", self.render_body(body, ctx)?))
            }
            Block::Quote { children } => Ok(format!(
                "<blockquote>\n{}</blockquote>\n",
                self.render_blocks(children, ctx)?
            )),
            Block::List {
                tight,
                ordered,
                start,
                children,
                ..
            } => {
                let (tag, extra) = if *ordered {
                    let extra = if *start != 1 {
                        format!(" start=\"{}\"", start)
                    } else {
                        String::new()
                    };
                    ("ol", extra)
                } else {
                    ("ul", String::new())
                };
                self.tight.push(*tight);
                let body = self.render_blocks(children, ctx);
                self.tight.pop();
                Ok(format!("<{tag}{}>\n{}</{tag}>\n", extra, body?, tag = tag))
            }
            Block::ListItem { children } => self.render_list_item(children, ctx),
            Block::FencedCode { lang, children, .. } => {
                let class = match lang {
                    Some(lang) => format!(" class=\"language-{}\"", Self::escape_html(lang)),
                    None => String::new(),
                };
                Ok(format!(
                    "<pre><code{}>{}</code></pre>\n",
                    class,
                    Self::escape_code(&raw_body(children))
                ))
            }
            Block::CodeBlock { children } => Ok(format!(
                "<pre><code>{}</code></pre>\n",
                Self::escape_code(&raw_body(children))
            )),
            Block::HtmlBlock { body } => Ok(body.clone()),
            Block::ThematicBreak => Ok("<hr />\n".to_string()),
            Block::BlankLine { .. } | Block::LinkRefDef { .. } => Ok(String::new()),
            Block::Custom(custom) => {
                ctx.warn_dispatch_miss(&custom.kind);
                match &custom.children {
                    CustomBlockChildren::Inline(body) => self.render_body(body, ctx),
                    CustomBlockChildren::Blocks(children) => self.render_blocks(children, ctx),
                }
            }
        }
    }

    fn render_inline(&mut self, inline: &Inline, ctx: &mut RenderCtx<'_>) -> Result<String> {
        match inline {
            Inline::RawText { text, escape } => Ok(if *escape {
                Self::escape_html(text)
            } else {
                text.clone()
            }),
            Inline::Literal { text } | Inline::Entity { text } => Ok(Self::escape_html(text)),
            Inline::LineBreak { soft } => Ok(if *soft {
                "\n".to_string()
            } else {
                "<br />\n".to_string()
            }),
            Inline::CodeSpan { text } => {
                Ok(format!("<code>{}</code>", Self::escape_code(text)))
            }
            Inline::Emphasis { children } => Ok(format!(
                "<em>{}</em>",
                self.render_inlines(children, ctx)?
            )),
            Inline::StrongEmphasis { children } => Ok(format!(
                "<strong>{}</strong>",
                self.render_inlines(children, ctx)?
            )),
            Inline::Link {
                dest,
                title,
                children,
            } => {
                let title = match title {
                    Some(title) => format!(" title=\"{}\"", Self::escape_html(title)),
                    None => String::new(),
                };
                Ok(format!(
                    "<a href=\"{}\"{}>{}</a>",
                    Self::escape_url(dest),
                    title,
                    self.render_inlines(children, ctx)?
                ))
            }
            Inline::AutoLink { dest, children } => Ok(format!(
                "<a href=\"{}\">{}</a>",
                Self::escape_url(dest),
                self.render_inlines(children, ctx)?
            )),
            Inline::Image {
                dest,
                title,
                children,
            } => {
                let title = match title {
                    Some(title) => format!(" title=\"{}\"", Self::escape_html(title)),
                    None => String::new(),
                };
                Ok(format!(
                    "<img src=\"{}\" alt=\"{}\"{} />",
                    Self::escape_url(dest),
                    Self::plain_text(children),
                    title
                ))
            }
            Inline::InlineHtml { text } => Ok(text.clone()),
            Inline::Custom(custom) => {
                ctx.warn_dispatch_miss(&custom.kind);
                self.render_inlines(&custom.children, ctx)
            }
        }
    }
}

/// The concatenated raw text of a code block's children.
fn raw_body(children: &[Inline]) -> String {
    children
        .iter()
        .map(|child| match child {
            Inline::RawText { text, .. } => text.as_str(),
            _ => "",
        })
        .collect()
}

fn escape_raw(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

impl Default for HtmlRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl DynRenderer for HtmlRenderer {
    fn id(&self) -> RendererId {
        RendererId::Html
    }

    fn render_element(
        &mut self,
        element: ElementRef<'_>,
        ctx: &mut RenderCtx<'_>,
    ) -> Result<String> {
        match element {
            ElementRef::Document(document) => self.render_blocks(&document.children, ctx),
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
            ElementRef::Document(document) => self.render_blocks(&document.children, ctx),
            ElementRef::Block(block) => match block {
                Block::Heading { body, .. }
                | Block::SetextHeading { body, .. }
                | Block::Paragraph { body } => self.render_body(body, ctx),
                Block::Quote { children }
                | Block::List { children, .. }
                | Block::ListItem { children } => self.render_blocks(children, ctx),
                Block::CodeBlock { children } | Block::FencedCode { children, .. } => {
                    Ok(Self::escape_code(&raw_body(children)))
                }
                Block::HtmlBlock { body } => Ok(body.clone()),
                Block::Custom(custom) => match &custom.children {
                    CustomBlockChildren::Inline(body) => self.render_body(body, ctx),
                    CustomBlockChildren::Blocks(children) => self.render_blocks(children, ctx),
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
                | Inline::InlineHtml { text } => Ok(Self::escape_html(text)),
                Inline::LineBreak { .. } => Ok(String::new()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_text_after_entity_decoding() {
        assert_eq!(HtmlRenderer::escape_html("a < b"), "a &lt; b");
        assert_eq!(HtmlRenderer::escape_html("&amp; more"), "&amp; more");
        assert_eq!(HtmlRenderer::escape_html("&copy;"), "\u{a9}");
    }

    #[test]
    fn code_escaping_keeps_entities_verbatim() {
        assert_eq!(HtmlRenderer::escape_code("&amp;"), "&amp;amp;");
        assert_eq!(HtmlRenderer::escape_code("<x>"), "&lt;x&gt;");
    }

    #[test]
    fn url_escaping_preserves_percent_triplets() {
        assert_eq!(HtmlRenderer::escape_url("/a%20b"), "/a%20b");
        assert_eq!(HtmlRenderer::escape_url("/a b"), "/a%20b");
        assert_eq!(HtmlRenderer::escape_url("/x?a=1&b=2"), "/x?a=1&amp;b=2");
    }

    #[test]
    fn url_escaping_encodes_unicode_as_utf8() {
        assert_eq!(HtmlRenderer::escape_url("/ä"), "/%C3%A4");
    }
}
