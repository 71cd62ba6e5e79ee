//! The AST renderer: serializes a document to a JSON value.
//!
//! Every element maps to an object carrying at least `element` and
//! `children`; element-specific fields appear when defined. The renderer is
//! non-delegating: extension render overrides never apply, so new element
//! kinds serialize generically without any registration.

use crate::ast::{Block, CustomBlockChildren, Document, ElementRef, Inline, InlineContent};
use crate::error::Result;
use crate::render::{DynRenderer, RenderCtx, RendererId};
use serde_json::{json, Map, Value};

pub struct AstRenderer;

impl AstRenderer {
    pub fn new() -> Self {
        AstRenderer
    }

    /// The JSON value of a whole document.
    pub fn to_value(document: &Document) -> Value {
        let mut defs: Vec<(&str, Value)> = document
            .link_ref_defs
            .values()
            .map(|def| {
                (
                    def.label.as_str(),
                    json!({ "dest": def.dest, "title": def.title }),
                )
            })
            .collect();
        defs.sort_by_key(|(label, _)| label.to_string());
        let mut ref_map = Map::new();
        for (label, value) in defs {
            ref_map.insert(label.to_string(), value);
        }
        json!({
            "element": "document",
            "children": document.children.iter().map(block_value).collect::<Vec<_>>(),
            "link_ref_defs": Value::Object(ref_map),
        })
    }
}

fn body_value(body: &InlineContent) -> Value {
    match body {
        InlineContent::Raw(text) => Value::String(text.clone()),
        InlineContent::Parsed(children) => {
            Value::Array(children.iter().map(inline_value).collect())
        }
    }
}

fn block_value(block: &Block) -> Value {
    match block {
        Block::BlankLine { .. } => json!({ "element": "blank_line", "children": "" }),
        Block::Heading { level, body } => json!({
            "element": "heading",
            "level": level,
            "children": body_value(body),
        }),
        Block::SetextHeading { level, body } => json!({
            "element": "setext_heading",
            "level": level,
            "children": body_value(body),
        }),
        Block::CodeBlock { children } => json!({
            "element": "code_block",
            "children": children.iter().map(inline_value).collect::<Vec<_>>(),
        }),
        Block::FencedCode {
            lang,
            extra,
            children,
        } => {
            let mut map = Map::new();
            map.insert("element".to_string(), json!("fenced_code"));
            if let Some(lang) = lang {
                map.insert("lang".to_string(), json!(lang));
            }
            if let Some(extra) = extra {
                map.insert("extra".to_string(), json!(extra));
            }
            map.insert(
                "children".to_string(),
                Value::Array(children.iter().map(inline_value).collect()),
            );
            Value::Object(map)
        }
        Block::ThematicBreak => json!({ "element": "thematic_break", "children": "" }),
        Block::HtmlBlock { body } => json!({
            "element": "html_block",
            "children": body,
        }),
        Block::LinkRefDef { label, dest, title } => {
            let mut map = Map::new();
            map.insert("element".to_string(), json!("link_ref_def"));
            map.insert("label".to_string(), json!(label));
            map.insert("dest".to_string(), json!(dest));
            if let Some(title) = title {
                map.insert("title".to_string(), json!(title));
            }
            map.insert("children".to_string(), json!(""));
            Value::Object(map)
        }
        Block::Paragraph { body } => json!({
            "element": "paragraph",
            "children": body_value(body),
        }),
        Block::Quote { children } => json!({
            "element": "quote",
            "children": children.iter().map(block_value).collect::<Vec<_>>(),
        }),
        Block::List {
            tight,
            ordered,
            start,
            bullet,
            children,
        } => json!({
            "element": "list",
            "tight": tight,
            "ordered": ordered,
            "start": start,
            "bullet": bullet,
            "children": children.iter().map(block_value).collect::<Vec<_>>(),
        }),
        Block::ListItem { children } => json!({
            "element": "list_item",
            "children": children.iter().map(block_value).collect::<Vec<_>>(),
        }),
        Block::Custom(custom) => {
            let mut map = Map::new();
            map.insert("element".to_string(), json!(custom.kind));
            for (key, value) in &custom.data {
                map.insert(key.clone(), value.clone());
            }
            let children = match &custom.children {
                CustomBlockChildren::Inline(body) => body_value(body),
                CustomBlockChildren::Blocks(children) => {
                    Value::Array(children.iter().map(block_value).collect())
                }
            };
            map.insert("children".to_string(), children);
            Value::Object(map)
        }
    }
}

fn inline_value(inline: &Inline) -> Value {
    match inline {
        Inline::RawText { text, escape } => json!({
            "element": "raw_text",
            "escape": escape,
            "children": text,
        }),
        Inline::Literal { text } => json!({ "element": "literal", "children": text }),
        Inline::LineBreak { soft } => json!({
            "element": "line_break",
            "soft": soft,
            "children": "",
        }),
        Inline::CodeSpan { text } => json!({ "element": "code_span", "children": text }),
        Inline::Emphasis { children } => json!({
            "element": "emphasis",
            "children": children.iter().map(inline_value).collect::<Vec<_>>(),
        }),
        Inline::StrongEmphasis { children } => json!({
            "element": "strong_emphasis",
            "children": children.iter().map(inline_value).collect::<Vec<_>>(),
        }),
        Inline::Link {
            dest,
            title,
            children,
        } => link_value("link", dest, title, children),
        Inline::Image {
            dest,
            title,
            children,
        } => link_value("image", dest, title, children),
        Inline::AutoLink { dest, children } => json!({
            "element": "auto_link",
            "dest": dest,
            "children": children.iter().map(inline_value).collect::<Vec<_>>(),
        }),
        Inline::InlineHtml { text } => json!({ "element": "inline_html", "children": text }),
        Inline::Entity { text } => json!({ "element": "entity", "children": text }),
        Inline::Custom(custom) => {
            let mut map = Map::new();
            map.insert("element".to_string(), json!(custom.kind));
            for (key, value) in &custom.data {
                map.insert(key.clone(), value.clone());
            }
            map.insert(
                "children".to_string(),
                Value::Array(custom.children.iter().map(inline_value).collect()),
            );
            Value::Object(map)
        }
    }
}

fn link_value(kind: &str, dest: &str, title: &Option<String>, children: &[Inline]) -> Value {
    let mut map = Map::new();
    map.insert("element".to_string(), json!(kind));
    map.insert("dest".to_string(), json!(dest));
    if let Some(title) = title {
        map.insert("title".to_string(), json!(title));
    }
    map.insert(
        "children".to_string(),
        Value::Array(children.iter().map(inline_value).collect()),
    );
    Value::Object(map)
}

impl Default for AstRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl DynRenderer for AstRenderer {
    fn id(&self) -> RendererId {
        RendererId::Ast
    }

    fn delegating(&self) -> bool {
        false
    }

    fn render_element(
        &mut self,
        element: ElementRef<'_>,
        _ctx: &mut RenderCtx<'_>,
    ) -> Result<String> {
        let value = match element {
            ElementRef::Document(document) => AstRenderer::to_value(document),
            ElementRef::Block(block) => block_value(block),
            ElementRef::Inline(inline) => inline_value(inline),
        };
        Ok(value.to_string())
    }

    fn render_children(
        &mut self,
        element: ElementRef<'_>,
        ctx: &mut RenderCtx<'_>,
    ) -> Result<String> {
        self.render_element(element, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Parser;

    #[test]
    fn document_serializes_with_kind_names() {
        let parser = Parser::new();
        let document = parser.parse("# hi\n\n*em*\n");
        let value = AstRenderer::to_value(&document);
        assert_eq!(value["element"], "document");
        assert_eq!(value["children"][0]["element"], "heading");
        assert_eq!(value["children"][0]["level"], 1);
        assert_eq!(value["children"][1]["element"], "paragraph");
        assert_eq!(value["children"][1]["children"][0]["element"], "emphasis");
    }

    #[test]
    fn optional_fields_appear_only_when_defined() {
        let parser = Parser::new();
        let document = parser.parse("```py\nx\n```\n");
        let value = AstRenderer::to_value(&document);
        let fence = &value["children"][0];
        assert_eq!(fence["lang"], "py");
        assert!(fence.get("extra").is_none());
    }

    #[test]
    fn link_ref_defs_serialize_sorted() {
        let parser = Parser::new();
        let document = parser.parse("[b]: /2\n[a]: /1\n");
        let value = AstRenderer::to_value(&document);
        let keys: Vec<&String> = value["link_ref_defs"]
            .as_object()
            .expect("map")
            .keys()
            .collect();
        assert_eq!(keys, vec!["a", "b"]);
    }
}
